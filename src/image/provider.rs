//! Image provider trait and the request it consumes.

use crate::error::Result;
use crate::image::data_uri::InlineImage;
use crate::image::types::AspectRatio;
use async_trait::async_trait;

/// One element of a multimodal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    /// An inline image used as reference input.
    InlineImage(InlineImage),
    /// The text prompt.
    Text(String),
}

/// A single call to an image-generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRequest {
    /// Parts in send order: reference images first, then the prompt.
    pub parts: Vec<ContentPart>,
    /// Target aspect ratio.
    pub aspect_ratio: AspectRatio,
}

impl ContentRequest {
    /// Builds a request from reference images and a prompt.
    pub fn new(
        references: impl IntoIterator<Item = InlineImage>,
        prompt: impl Into<String>,
        aspect_ratio: AspectRatio,
    ) -> Self {
        let mut parts: Vec<ContentPart> = references
            .into_iter()
            .map(ContentPart::InlineImage)
            .collect();
        parts.push(ContentPart::Text(prompt.into()));
        Self {
            parts,
            aspect_ratio,
        }
    }

    /// The text prompt of this request.
    pub fn prompt(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            ContentPart::Text(text) => Some(text.as_str()),
            ContentPart::InlineImage(_) => None,
        })
    }

    /// Number of reference images attached.
    pub fn reference_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, ContentPart::InlineImage(_)))
            .count()
    }
}

/// Trait for image generation providers.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Sends one request and returns every inline image in the response.
    ///
    /// An empty vector is a valid answer.
    async fn generate(&self, request: &ContentRequest) -> Result<Vec<InlineImage>>;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_orders_images_before_text() {
        let request = ContentRequest::new(
            vec![
                InlineImage::new("image/png", "AA=="),
                InlineImage::new("image/jpeg", "AQ=="),
            ],
            "a cat",
            AspectRatio::Standard,
        );

        assert_eq!(request.parts.len(), 3);
        assert!(matches!(request.parts[0], ContentPart::InlineImage(_)));
        assert!(matches!(request.parts[1], ContentPart::InlineImage(_)));
        assert_eq!(request.parts[2], ContentPart::Text("a cat".into()));
        assert_eq!(request.prompt(), Some("a cat"));
        assert_eq!(request.reference_count(), 2);
    }

    #[test]
    fn test_request_without_references() {
        let request = ContentRequest::new(Vec::new(), "a cat", AspectRatio::Square);
        assert_eq!(request.parts, vec![ContentPart::Text("a cat".into())]);
        assert_eq!(request.reference_count(), 0);
    }
}
