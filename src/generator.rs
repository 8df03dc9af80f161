//! Turns generation settings into provider calls.
//!
//! [`prepare`] does all the work that needs no I/O: it validates the
//! settings, augments the prompt, resolves the aspect ratio and decodes the
//! reference images. [`PreparedRequest::run`] then sends the same request
//! `batch_count` times, one after the other.

use crate::error::Result;
use crate::image::{
    AspectRatio, ContentRequest, GenerationSettings, ImageProvider, InlineImage, RatioResolution,
    ReferenceDecode, NO_STYLE,
};
use std::time::Instant;

/// Appended to every prompt to push the model toward high-fidelity output.
pub const QUALITY_SUFFIX: &str = "ultra-high definition, masterpiece, cinematic lighting, professional composition, sharp focus, 8k resolution, professionally rendered";

/// Builds the prompt actually sent to the model.
pub fn augment_prompt(prompt: &str, style: &str) -> String {
    if style != NO_STYLE {
        format!("{prompt}. Style: {style}. {QUALITY_SUFFIX}")
    } else {
        format!("{prompt}. {QUALITY_SUFFIX}")
    }
}

/// A validated request, ready to be dispatched.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// How the requested aspect ratio was resolved.
    pub ratio: RatioResolution,
    /// Outcome for each reference image, in input order.
    pub references: Vec<ReferenceDecode>,
    /// Number of sequential calls to make.
    pub batch_count: u32,
    /// The payload sent on every call.
    pub request: ContentRequest,
}

impl PreparedRequest {
    /// The aspect ratio sent to the model.
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.request.aspect_ratio
    }

    /// The augmented prompt.
    pub fn prompt(&self) -> &str {
        self.request.prompt().unwrap_or_default()
    }

    /// Indices of the reference images that were dropped.
    pub fn skipped_references(&self) -> Vec<usize> {
        self.references
            .iter()
            .filter_map(|r| match r {
                ReferenceDecode::Skipped { index, .. } => Some(*index),
                ReferenceDecode::Inline(_) => None,
            })
            .collect()
    }

    /// Sends the request `batch_count` times and collects every image as a
    /// data URI, earliest call first.
    ///
    /// The first failing call aborts the run; images from earlier calls are
    /// dropped with it.
    pub async fn run<P>(&self, provider: &P) -> Result<Vec<String>>
    where
        P: ImageProvider + ?Sized,
    {
        let start = Instant::now();
        let mut urls = Vec::new();

        for batch in 0..self.batch_count {
            let images = provider.generate(&self.request).await.inspect_err(|e| {
                tracing::error!(
                    provider = provider.name(),
                    batch = batch + 1,
                    of = self.batch_count,
                    "batch generation error: {e}"
                );
            })?;
            tracing::debug!(
                batch = batch + 1,
                of = self.batch_count,
                images = images.len(),
                "batch element complete"
            );
            urls.extend(images.iter().map(InlineImage::to_data_uri));
        }

        tracing::info!(
            provider = provider.name(),
            calls = self.batch_count,
            images = urls.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generation finished"
        );
        Ok(urls)
    }
}

/// Validates `settings` and builds the request payload.
pub fn prepare(settings: &GenerationSettings) -> Result<PreparedRequest> {
    settings.validate()?;

    let prompt = augment_prompt(&settings.prompt, &settings.style);

    let ratio = AspectRatio::resolve(&settings.aspect_ratio);
    if let RatioResolution::Coerced { ref requested } = ratio {
        tracing::warn!(
            requested = %requested,
            fallback = %ratio.ratio(),
            "unsupported aspect ratio, using default"
        );
    }

    let references: Vec<ReferenceDecode> = settings
        .reference_images
        .iter()
        .enumerate()
        .map(|(index, uri)| ReferenceDecode::from_uri(index, uri))
        .collect();
    for reference in &references {
        if let ReferenceDecode::Skipped { index, reason } = reference {
            tracing::warn!(index, %reason, "skipping malformed reference image");
        }
    }

    tracing::debug!(
        quality = %settings.quality,
        "quality setting is not forwarded to the model"
    );

    let request = ContentRequest::new(
        references.iter().cloned().filter_map(ReferenceDecode::into_inline),
        prompt,
        ratio.ratio(),
    );

    Ok(PreparedRequest {
        ratio,
        references,
        batch_count: settings.batch_count,
        request,
    })
}

/// Generates images for `settings`, returning them as data URIs.
pub async fn generate_images<P>(provider: &P, settings: &GenerationSettings) -> Result<Vec<String>>
where
    P: ImageProvider + ?Sized,
{
    prepare(settings)?.run(provider).await
}
