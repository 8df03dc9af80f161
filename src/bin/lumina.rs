//! CLI for Lumina - AI image generation.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use lumina::image::{is_known_style, GenerationSettings, Quality, STYLES};
use lumina::session::{Action, Session};
use lumina::{GeminiModel, GeminiProvider, ImageProvider};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "lumina")]
#[command(about = "Generate images from a prompt, style and reference images via Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log request details
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate images from a text prompt
    Generate(GenerateArgs),

    /// List available styles
    Styles,

    /// Check that the API key and model are accepted
    Check(ProviderArgs),
}

#[derive(Args)]
struct ProviderArgs {
    /// Model to use (gemini-2.5-flash-image, gemini-3-pro-image-preview)
    #[arg(long, env = "LUMINA_MODEL")]
    model: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 120)]
    timeout: u64,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the image
    prompt: Option<String>,

    /// Read settings from a JSON file; flags override its fields
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Style name (see `lumina styles`)
    #[arg(short, long)]
    style: Option<String>,

    /// Aspect ratio: 1:1, 16:9, 9:16, 4:3 or 3:4 (others fall back to 1:1)
    #[arg(short, long)]
    aspect_ratio: Option<String>,

    /// Quality: Standard, HD, Ultra HD or 8K
    #[arg(short, long, value_parser = parse_quality)]
    quality: Option<Quality>,

    /// Number of images to request, 1-5
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=5))]
    batch: Option<u32>,

    /// Reference image file (repeat up to 5 times)
    #[arg(short, long = "reference")]
    references: Vec<PathBuf>,

    /// Directory the images are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    #[command(flatten)]
    provider: ProviderArgs,
}

fn parse_quality(value: &str) -> Result<Quality, String> {
    Quality::parse(value).ok_or_else(|| format!("unknown quality: {value}"))
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "lumina=debug" } else { "lumina=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate(args) => generate(args, cli.json).await?,
        Commands::Styles => list_styles(cli.json)?,
        Commands::Check(args) => check(args, cli.json).await?,
    }

    Ok(())
}

fn build_provider(args: &ProviderArgs) -> anyhow::Result<GeminiProvider> {
    let mut builder = GeminiProvider::builder().timeout(Duration::from_secs(args.timeout));
    if let Some(ref model) = args.model {
        let model = GeminiModel::parse(model)
            .with_context(|| format!("unknown model: {model}"))?;
        builder = builder.model(model);
    }
    Ok(builder.build()?)
}

fn build_settings(args: &GenerateArgs) -> anyhow::Result<GenerationSettings> {
    let mut settings = match args.settings {
        Some(ref path) => GenerationSettings::load(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?,
        None => GenerationSettings::default(),
    };

    if let Some(ref prompt) = args.prompt {
        settings.prompt = prompt.clone();
    }
    if let Some(ref style) = args.style {
        settings.style = style.clone();
    }
    if let Some(ref ratio) = args.aspect_ratio {
        settings.aspect_ratio = ratio.clone();
    }
    if let Some(quality) = args.quality {
        settings.quality = quality;
    }
    if let Some(batch) = args.batch {
        settings.batch_count = batch;
    }

    if !is_known_style(&settings.style) {
        tracing::warn!(style = %settings.style, "style is not in the style list");
    }
    Ok(settings)
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let provider = build_provider(&args.provider)?;

    let mut session = Session::new();
    session.settings = build_settings(&args)?;

    if !args.references.is_empty() {
        let references = lumina::load_reference_images(&args.references)
            .await
            .context("Failed to process selected images.")?;
        session.dispatch(Action::AddReferenceImages(references));
    }

    let batch = session.submit(&provider).await?;

    std::fs::create_dir_all(&args.output_dir)?;
    let mut written = Vec::with_capacity(batch.len());
    for image in &batch {
        let path = args.output_dir.join(image.file_name());
        image.save(&path)?;
        written.push(path);
    }

    if json_output {
        let images: Vec<_> = batch
            .iter()
            .zip(&written)
            .map(|(image, path)| {
                serde_json::json!({
                    "id": image.id,
                    "output": path.display().to_string(),
                    "timestamp": image.timestamp,
                    "aspect_ratio": image.aspect_ratio,
                })
            })
            .collect();
        let result = serde_json::json!({
            "success": true,
            "prompt": session.settings.prompt,
            "provider": provider.name(),
            "model": provider.model().as_str(),
            "images": images,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if batch.is_empty() {
            println!("The model returned no images for this prompt.");
        }
        for path in &written {
            println!("Generated image: {}", path.display());
        }
    }

    Ok(())
}

async fn check(args: ProviderArgs, json_output: bool) -> anyhow::Result<()> {
    let provider = build_provider(&args)?;
    provider.health_check().await?;

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "provider": provider.name(),
            "model": provider.model().as_str(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "{} is reachable with model {}",
            provider.name(),
            provider.model().as_str()
        );
    }
    Ok(())
}

fn list_styles(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(STYLES)?);
    } else {
        println!("Available styles:\n");
        for style in STYLES {
            println!("  {}", style);
        }
    }
    Ok(())
}
