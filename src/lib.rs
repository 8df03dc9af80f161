#![warn(missing_docs)]
//! Lumina - prompt-to-image generation with style, aspect-ratio and
//! reference-image conditioning.
//!
//! Settings are turned into an augmented prompt plus a multimodal request,
//! sent once per batch element to an image model, and the returned images
//! come back as data URIs.
//!
//! # Quick Start
//!
//! ```no_run
//! use lumina::{AspectRatio, GeminiProvider, GenerationSettings};
//!
//! #[tokio::main]
//! async fn main() -> lumina::Result<()> {
//!     let provider = GeminiProvider::builder().build()?;
//!     let settings = GenerationSettings::new("a red fox")
//!         .with_style("Anime")
//!         .with_aspect_ratio(AspectRatio::Portrait)
//!         .with_batch_count(2);
//!     let urls = lumina::generate_images(&provider, &settings).await?;
//!     println!("{} images", urls.len());
//!     Ok(())
//! }
//! ```
//!
//! # Sessions
//!
//! [`Session`] keeps the settings, the gallery, the loading flag and the last
//! error together. It is updated through [`session::reduce`] and
//! [`Session::submit`].
//!
//! # Features
//!
//! - `cli` (default): the `lumina` command-line binary.

mod error;
pub mod generator;
pub mod image;
pub mod reference;
pub mod session;

// Re-export error types at crate root
pub use error::{LuminaError, Result};

pub use generator::{augment_prompt, generate_images, prepare, PreparedRequest, QUALITY_SUFFIX};
pub use image::providers::{GeminiModel, GeminiProvider, GeminiProviderBuilder};
pub use image::{
    AspectRatio, ContentPart, ContentRequest, GeneratedImage, GenerationSettings, ImageFormat,
    ImageProvider, InlineImage, Quality, RatioResolution, ReferenceDecode, STYLES,
};
pub use reference::load_reference_images;
pub use session::{Action, Session};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{LuminaError, Result};
    pub use crate::generator::generate_images;
    pub use crate::image::providers::GeminiProvider;
    pub use crate::image::{
        AspectRatio, GeneratedImage, GenerationSettings, ImageProvider, Quality,
    };
    pub use crate::session::{Action, Session};
}
