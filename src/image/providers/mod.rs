//! Image generation providers.

mod gemini;

pub use gemini::{
    GeminiModel, GeminiProvider, GeminiProviderBuilder, API_KEY_ENV_VARS, BASE_URL_ENV_VAR,
    DEFAULT_BASE_URL, MODEL_ENV_VAR,
};
