//! Image generation module.

mod data_uri;
mod provider;
pub mod providers;
mod types;

pub use data_uri::{InlineImage, MalformedDataUri, ReferenceDecode};
pub use provider::{ContentPart, ContentRequest, ImageProvider};
pub use types::{
    is_known_style, AspectRatio, GeneratedImage, GenerationSettings, ImageFormat, Quality,
    RatioResolution, MAX_BATCH_COUNT, MAX_REFERENCE_IMAGES, NO_STYLE, STYLES,
};
