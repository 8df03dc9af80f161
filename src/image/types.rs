//! Core types for image generation.

use crate::error::{LuminaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest batch a single generation may request.
pub const MAX_BATCH_COUNT: u32 = 5;

/// Largest number of reference images attached to one generation.
pub const MAX_REFERENCE_IMAGES: usize = 5;

/// Style applied when the user picks none; it adds nothing to the prompt.
pub const NO_STYLE: &str = "None";

/// Style vocabulary offered to users.
pub const STYLES: &[&str] = &[
    NO_STYLE,
    "Realistic",
    "Ultra Realistic",
    "3D Pixar Style",
    "Anime",
    "Cinematic",
    "Cyberpunk",
    "Fantasy Art",
    "Dark Horror",
    "Sci-Fi",
    "Concept Art",
    "Oil Painting",
    "Watercolor",
    "Pencil Sketch",
    "Digital Painting",
    "Low Poly",
    "Isometric",
    "Pixel Art",
    "Neon Glow",
    "Vintage",
    "Retro",
    "Matte Painting",
    "Surreal",
    "Minimalist",
    "Hyper Detailed",
    "Photorealistic",
    "Indian Art Style",
    "Futuristic",
    "Fantasy Realism",
    "Portrait Photography",
];

/// Returns true if `style` is part of [`STYLES`].
pub fn is_known_style(style: &str) -> bool {
    STYLES.contains(&style)
}

/// Image formats recognised when reading or writing files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Attempts to detect format from a MIME type.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // GIF87a / GIF89a
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Aspect ratios accepted by the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square aspect ratio.
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 16:9 landscape (widescreen) aspect ratio.
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait (tall) aspect ratio.
    #[serde(rename = "9:16")]
    Portrait,
    /// 4:3 standard landscape aspect ratio.
    #[serde(rename = "4:3")]
    Standard,
    /// 3:4 standard portrait aspect ratio.
    #[serde(rename = "3:4")]
    StandardPortrait,
}

impl AspectRatio {
    /// Every supported ratio, in menu order.
    pub const ALL: [AspectRatio; 5] = [
        Self::Square,
        Self::Landscape,
        Self::Portrait,
        Self::Standard,
        Self::StandardPortrait,
    ];

    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::Standard => "4:3",
            Self::StandardPortrait => "3:4",
        }
    }

    /// Looks up a ratio by its exact string form.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == value)
    }

    /// Resolves a requested ratio against the supported list.
    ///
    /// Unknown values fall back to [`AspectRatio::Square`]; the fallback is
    /// reported in the returned value, never as an error.
    pub fn resolve(requested: &str) -> RatioResolution {
        match Self::parse(requested) {
            Some(ratio) => RatioResolution::Supported(ratio),
            None => RatioResolution::Coerced {
                requested: requested.to_string(),
            },
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of checking a requested aspect ratio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatioResolution {
    /// The requested ratio is supported and used as-is.
    Supported(AspectRatio),
    /// The requested ratio is unknown; the default is used instead.
    Coerced {
        /// The value the caller asked for.
        requested: String,
    },
}

impl RatioResolution {
    /// The ratio that will be sent to the model.
    pub fn ratio(&self) -> AspectRatio {
        match self {
            Self::Supported(ratio) => *ratio,
            Self::Coerced { .. } => AspectRatio::default(),
        }
    }

    /// Returns true if the requested value was replaced by the default.
    pub fn was_coerced(&self) -> bool {
        matches!(self, Self::Coerced { .. })
    }
}

/// Output quality tier chosen by the user.
///
/// Collected with the settings but not sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    /// Standard quality.
    #[default]
    Standard,
    /// High definition.
    #[serde(rename = "HD")]
    Hd,
    /// Ultra high definition.
    #[serde(rename = "Ultra HD")]
    UltraHd,
    /// 8K.
    #[serde(rename = "8K")]
    K8,
}

impl Quality {
    /// Every quality tier, in menu order.
    pub const ALL: [Quality; 4] = [Self::Standard, Self::Hd, Self::UltraHd, Self::K8];

    /// Returns the display label of this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Hd => "HD",
            Self::UltraHd => "Ultra HD",
            Self::K8 => "8K",
        }
    }

    /// Looks up a tier by its label, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything the user chose for one "Generate" action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    /// The text prompt describing the desired image.
    pub prompt: String,
    /// Style name from [`STYLES`]; [`NO_STYLE`] adds nothing.
    pub style: String,
    /// Requested aspect ratio, checked against [`AspectRatio`] at build time.
    pub aspect_ratio: String,
    /// Quality tier.
    pub quality: Quality,
    /// Number of sequential generation calls.
    pub batch_count: u32,
    /// Reference images as data URIs, in selection order.
    pub reference_images: Vec<String>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            style: NO_STYLE.to_string(),
            aspect_ratio: AspectRatio::default().as_str().to_string(),
            quality: Quality::default(),
            batch_count: 1,
            reference_images: Vec::new(),
        }
    }
}

impl GenerationSettings {
    /// Creates settings with the given prompt and defaults elsewhere.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Sets the style.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio.as_str().to_string();
        self
    }

    /// Sets the aspect ratio from a raw value, which may be unsupported.
    pub fn with_raw_aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = ratio.into();
        self
    }

    /// Sets the quality tier.
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Sets the batch count.
    pub fn with_batch_count(mut self, count: u32) -> Self {
        self.batch_count = count;
        self
    }

    /// Appends a reference image data URI.
    pub fn with_reference_image(mut self, data_uri: impl Into<String>) -> Self {
        self.reference_images.push(data_uri.into());
        self
    }

    /// Returns true if the prompt has no visible characters.
    pub fn has_blank_prompt(&self) -> bool {
        self.prompt.trim().is_empty()
    }

    /// Checks the form bounds, without touching the network.
    pub fn validate(&self) -> Result<()> {
        if self.has_blank_prompt() {
            return Err(LuminaError::InvalidRequest(
                "prompt must not be empty".into(),
            ));
        }
        if !(1..=MAX_BATCH_COUNT).contains(&self.batch_count) {
            return Err(LuminaError::InvalidRequest(format!(
                "batch count must be between 1 and {MAX_BATCH_COUNT}, got {}",
                self.batch_count
            )));
        }
        if self.reference_images.len() > MAX_REFERENCE_IMAGES {
            return Err(LuminaError::InvalidRequest(format!(
                "at most {MAX_REFERENCE_IMAGES} reference images are allowed, got {}",
                self.reference_images.len()
            )));
        }
        Ok(())
    }

    /// Reads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// An image in the session gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    /// Opaque unique id.
    pub id: String,
    /// The image as a data URI.
    pub url: String,
    /// The prompt the user typed (without style or quality additions).
    pub prompt: String,
    /// Milliseconds since the Unix epoch, offset by position within the batch.
    pub timestamp: i64,
    /// Aspect ratio the image was requested with.
    pub aspect_ratio: AspectRatio,
}

impl GeneratedImage {
    /// Wraps the URLs returned by one builder call into gallery entries.
    ///
    /// Entries keep call order: the `n`th URL gets `accepted_at + n`.
    pub fn batch(
        urls: Vec<String>,
        prompt: &str,
        aspect_ratio: AspectRatio,
        accepted_at: i64,
    ) -> Vec<Self> {
        urls.into_iter()
            .enumerate()
            .map(|(idx, url)| Self {
                id: uuid::Uuid::new_v4().simple().to_string(),
                url,
                prompt: prompt.to_string(),
                timestamp: accepted_at + idx as i64,
                aspect_ratio,
            })
            .collect()
    }

    /// File name used when saving this image.
    pub fn file_name(&self) -> String {
        let format = crate::image::InlineImage::parse(&self.url)
            .ok()
            .and_then(|img| ImageFormat::from_mime_type(&img.mime_type))
            .unwrap_or_default();
        format!("lumina-{}.{}", self.id, format.extension())
    }

    /// Decodes the image and writes the raw bytes to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let image = crate::image::InlineImage::parse(&self.url)
            .map_err(|reason| LuminaError::Decode(reason.to_string()))?;
        std::fs::write(path, image.decode()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"GIF89a\x01\x00"),
            Some(ImageFormat::Gif)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"hello"), None);
    }

    #[test]
    fn test_format_lookups() {
        assert_eq!(ImageFormat::from_extension("JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("bmp"), None);
        assert_eq!(
            ImageFormat::from_mime_type("image/webp"),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn test_aspect_ratio_resolve_supported() {
        for ratio in AspectRatio::ALL {
            let resolution = AspectRatio::resolve(ratio.as_str());
            assert_eq!(resolution, RatioResolution::Supported(ratio));
            assert_eq!(resolution.ratio(), ratio);
        }
    }

    #[test]
    fn test_aspect_ratio_resolve_coerces_unknown() {
        for raw in ["21:9", "2:3", "", "16x9", " 1:1"] {
            let resolution = AspectRatio::resolve(raw);
            assert!(resolution.was_coerced(), "{raw:?} should be coerced");
            assert_eq!(resolution.ratio(), AspectRatio::Square);
        }
    }

    #[test]
    fn test_quality_labels() {
        assert_eq!(Quality::parse("ultra hd"), Some(Quality::UltraHd));
        assert_eq!(Quality::parse("8K"), Some(Quality::K8));
        assert_eq!(Quality::parse("4K"), None);
        assert_eq!(
            serde_json::to_string(&Quality::UltraHd).unwrap(),
            "\"Ultra HD\""
        );
    }

    #[test]
    fn test_settings_defaults() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.style, "None");
        assert_eq!(settings.aspect_ratio, "1:1");
        assert_eq!(settings.quality, Quality::Standard);
        assert_eq!(settings.batch_count, 1);
        assert!(settings.reference_images.is_empty());
    }

    #[test]
    fn test_settings_validate() {
        assert!(GenerationSettings::new("a cat").validate().is_ok());

        for prompt in ["", "   ", "\n\t"] {
            let err = GenerationSettings::new(prompt).validate().unwrap_err();
            assert!(err.is_validation());
        }

        let err = GenerationSettings::new("a cat")
            .with_batch_count(0)
            .validate()
            .unwrap_err();
        assert!(err.is_validation());
        assert!(GenerationSettings::new("a cat")
            .with_batch_count(6)
            .validate()
            .is_err());

        let mut settings = GenerationSettings::new("a cat");
        settings.reference_images = vec!["data:image/png;base64,AA==".into(); 6];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_json_uses_camel_case() {
        let json = r#"{
            "prompt": "a red fox",
            "style": "Anime",
            "aspectRatio": "9:16",
            "quality": "Ultra HD",
            "batchCount": 2,
            "referenceImages": []
        }"#;
        let settings: GenerationSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.aspect_ratio, "9:16");
        assert_eq!(settings.quality, Quality::UltraHd);
        assert_eq!(settings.batch_count, 2);

        let partial: GenerationSettings = serde_json::from_str(r#"{"prompt": "x"}"#).unwrap();
        assert_eq!(partial.style, "None");
        assert_eq!(partial.batch_count, 1);
    }

    #[test]
    fn test_generated_batch_timestamps_ascend() {
        let urls = vec![
            "data:image/png;base64,AA==".to_string(),
            "data:image/jpeg;base64,AQ==".to_string(),
            "data:image/png;base64,Ag==".to_string(),
        ];
        let images = GeneratedImage::batch(urls, "a cat", AspectRatio::Portrait, 1_000);

        assert_eq!(images.len(), 3);
        assert_eq!(
            images.iter().map(|i| i.timestamp).collect::<Vec<_>>(),
            vec![1_000, 1_001, 1_002]
        );
        assert!(images.iter().all(|i| i.prompt == "a cat"));
        assert!(images.iter().all(|i| i.aspect_ratio == AspectRatio::Portrait));
        assert_ne!(images[0].id, images[1].id);
        assert!(images[1].file_name().ends_with(".jpg"));
    }

    #[test]
    fn test_style_vocabulary() {
        assert_eq!(STYLES.len(), 30);
        assert!(is_known_style("Anime"));
        assert!(is_known_style(NO_STYLE));
        assert!(!is_known_style("anime"));
    }
}
