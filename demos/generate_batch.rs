//! Batch generation with a style and a reference image.
//!
//! Run with: `cargo run --example generate_batch -- [reference.png]`
//!
//! Requires `API_KEY` or `GOOGLE_API_KEY` environment variable.

use lumina::{Action, AspectRatio, GeminiProvider, Session};

#[tokio::main]
async fn main() -> lumina::Result<()> {
    let provider = GeminiProvider::builder().build()?;

    let mut session = Session::new();
    session.dispatch(Action::SetPrompt("a lighthouse on a cliff at dusk".into()));
    session.dispatch(Action::SetStyle("Oil Painting".into()));
    session.dispatch(Action::SetAspectRatio(AspectRatio::Landscape.to_string()));
    session.dispatch(Action::SetBatchCount(2));

    let references: Vec<String> = std::env::args().skip(1).collect();
    if !references.is_empty() {
        let uris = lumina::load_reference_images(&references).await?;
        session.dispatch(Action::AddReferenceImages(uris));
    }

    let batch = session.submit(&provider).await?;
    for image in &batch {
        let name = image.file_name();
        image.save(&name)?;
        println!("Saved {} ({})", name, image.aspect_ratio);
    }

    Ok(())
}
