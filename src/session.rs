//! Settings and gallery state for one user session.
//!
//! All changes go through [`reduce`], a pure function from the current state
//! and an [`Action`] to the next state. [`Session::submit`] is the only place
//! that talks to a provider.

use crate::error::{LuminaError, Result};
use crate::generator;
use crate::image::{
    GeneratedImage, GenerationSettings, ImageProvider, Quality, MAX_BATCH_COUNT,
    MAX_REFERENCE_IMAGES,
};

/// Shown when the user tries to generate without a prompt.
pub const EMPTY_PROMPT_MESSAGE: &str = "Please describe your vision.";

/// Shown when a generation fails with an error that has no message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Engine failure.";

/// A state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replaces the prompt.
    SetPrompt(String),
    /// Replaces the style.
    SetStyle(String),
    /// Replaces the requested aspect ratio.
    SetAspectRatio(String),
    /// Replaces the quality tier.
    SetQuality(Quality),
    /// Clamped into `1..=MAX_BATCH_COUNT`.
    SetBatchCount(u32),
    /// Appended after the current references, keeping at most five in total.
    AddReferenceImages(Vec<String>),
    /// Removes the reference at an index; out of range is a no-op.
    RemoveReferenceImage(usize),
    /// Drops every reference image.
    ClearReferenceImages,
    /// Clears the error slot and sets the loading flag.
    GenerationStarted,
    /// A finished batch, prepended to the gallery.
    GenerationSucceeded(Vec<GeneratedImage>),
    /// Stores an error message and clears the loading flag.
    GenerationFailed(String),
    /// Stores an error message; the loading flag is untouched.
    ValidationFailed(String),
    /// Removes the gallery entry with this id.
    DeleteImage(String),
    /// Copies a prompt back into the settings.
    Remix(String),
}

/// Current settings, gallery, loading flag and error slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Settings for the next generation.
    pub settings: GenerationSettings,
    /// Newest batch first.
    pub results: Vec<GeneratedImage>,
    /// Set while a generation is in flight.
    pub loading: bool,
    /// Message of the last failure, if any.
    pub error: Option<String>,
    /// Timestamp of the last image this session stamped.
    last_timestamp: i64,
}

/// Applies `action` to `state`.
pub fn reduce(mut state: Session, action: Action) -> Session {
    match action {
        Action::SetPrompt(prompt) => state.settings.prompt = prompt,
        Action::SetStyle(style) => state.settings.style = style,
        Action::SetAspectRatio(ratio) => state.settings.aspect_ratio = ratio,
        Action::SetQuality(quality) => state.settings.quality = quality,
        Action::SetBatchCount(count) => {
            state.settings.batch_count = count.clamp(1, MAX_BATCH_COUNT);
        }
        Action::AddReferenceImages(images) => {
            let refs = &mut state.settings.reference_images;
            refs.extend(images);
            refs.truncate(MAX_REFERENCE_IMAGES);
        }
        Action::RemoveReferenceImage(index) => {
            if index < state.settings.reference_images.len() {
                state.settings.reference_images.remove(index);
            }
        }
        Action::ClearReferenceImages => state.settings.reference_images.clear(),
        Action::GenerationStarted => {
            state.error = None;
            state.loading = true;
        }
        Action::GenerationSucceeded(mut batch) => {
            batch.append(&mut state.results);
            state.results = batch;
            state.loading = false;
        }
        Action::GenerationFailed(message) => {
            state.error = Some(message);
            state.loading = false;
        }
        Action::ValidationFailed(message) => state.error = Some(message),
        Action::DeleteImage(id) => state.results.retain(|image| image.id != id),
        Action::Remix(prompt) => state.settings.prompt = prompt,
    }
    state
}

impl Session {
    /// Creates an empty session with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an action in place.
    pub fn dispatch(&mut self, action: Action) {
        *self = reduce(std::mem::take(self), action);
    }

    /// Looks up a gallery entry.
    pub fn image(&self, id: &str) -> Option<&GeneratedImage> {
        self.results.iter().find(|image| image.id == id)
    }

    /// Runs one generation with the current settings.
    ///
    /// On success the new images are prepended to the gallery and returned.
    /// On failure the error message is stored in [`Session::error`], the
    /// gallery is left as it was and the error is returned.
    pub async fn submit<P>(&mut self, provider: &P) -> Result<Vec<GeneratedImage>>
    where
        P: ImageProvider + ?Sized,
    {
        if self.loading {
            return Err(LuminaError::Busy);
        }
        if self.settings.has_blank_prompt() {
            self.dispatch(Action::ValidationFailed(EMPTY_PROMPT_MESSAGE.into()));
            return Err(LuminaError::InvalidRequest(EMPTY_PROMPT_MESSAGE.into()));
        }

        self.dispatch(Action::GenerationStarted);

        let settings = self.settings.clone();
        let outcome = match generator::prepare(&settings) {
            Ok(prepared) => prepared
                .run(provider)
                .await
                .map(|urls| (urls, prepared.aspect_ratio())),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((urls, aspect_ratio)) => {
                // Timestamps never repeat within a session, even across batches
                // accepted in the same millisecond
                let accepted_at = chrono::Utc::now()
                    .timestamp_millis()
                    .max(self.last_timestamp + 1);
                let batch =
                    GeneratedImage::batch(urls, &settings.prompt, aspect_ratio, accepted_at);
                if let Some(last) = batch.last() {
                    self.last_timestamp = last.timestamp;
                }
                self.dispatch(Action::GenerationSucceeded(batch.clone()));
                Ok(batch)
            }
            Err(e) => {
                let message = e.to_string();
                let message = if message.trim().is_empty() {
                    GENERIC_FAILURE_MESSAGE.to_string()
                } else {
                    message
                };
                self.dispatch(Action::GenerationFailed(message));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::testing::{Reply, ScriptedProvider};
    use crate::image::{AspectRatio, InlineImage};

    fn image(id: &str) -> GeneratedImage {
        GeneratedImage {
            id: id.into(),
            url: "data:image/png;base64,AA==".into(),
            prompt: "p".into(),
            timestamp: 0,
            aspect_ratio: AspectRatio::Square,
        }
    }

    #[test]
    fn test_batch_count_is_clamped() {
        let state = reduce(Session::new(), Action::SetBatchCount(9));
        assert_eq!(state.settings.batch_count, 5);
        let state = reduce(state, Action::SetBatchCount(0));
        assert_eq!(state.settings.batch_count, 1);
    }

    #[test]
    fn test_reference_images_capped_at_five() {
        let uris = |n: usize| -> Vec<String> {
            (0..n).map(|i| format!("data:image/png;base64,{i}")).collect()
        };
        let state = reduce(Session::new(), Action::AddReferenceImages(uris(3)));
        let state = reduce(state, Action::AddReferenceImages(uris(4)));

        assert_eq!(state.settings.reference_images.len(), 5);
        assert_eq!(state.settings.reference_images[3], "data:image/png;base64,0");

        let state = reduce(state, Action::RemoveReferenceImage(0));
        assert_eq!(state.settings.reference_images.len(), 4);
        let state = reduce(state, Action::RemoveReferenceImage(42));
        assert_eq!(state.settings.reference_images.len(), 4);
        let state = reduce(state, Action::ClearReferenceImages);
        assert!(state.settings.reference_images.is_empty());
    }

    #[test]
    fn test_results_newest_batch_first() {
        let state = reduce(
            Session::new(),
            Action::GenerationSucceeded(vec![image("a"), image("b")]),
        );
        let state = reduce(state, Action::GenerationSucceeded(vec![image("c")]));

        let ids: Vec<_> = state.results.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_delete_and_remix() {
        let mut session = Session::new();
        session.dispatch(Action::GenerationSucceeded(vec![image("a"), image("b")]));
        session.dispatch(Action::DeleteImage("a".into()));
        assert!(session.image("a").is_none());
        assert!(session.image("b").is_some());

        session.dispatch(Action::Remix("a foggy harbour".into()));
        assert_eq!(session.settings.prompt, "a foggy harbour");
    }

    #[test]
    fn test_failure_keeps_gallery_and_clears_loading() {
        let mut session = Session::new();
        session.dispatch(Action::GenerationSucceeded(vec![image("a")]));
        session.dispatch(Action::GenerationStarted);
        assert!(session.loading);

        session.dispatch(Action::GenerationFailed("boom".into()));
        assert!(!session.loading);
        assert_eq!(session.error.as_deref(), Some("boom"));
        assert_eq!(session.results.len(), 1);

        session.dispatch(Action::GenerationStarted);
        assert_eq!(session.error, None);
    }

    #[tokio::test]
    async fn test_submit_blank_prompt_skips_provider() {
        let provider = ScriptedProvider::uniform(1, 1);
        let mut session = Session::new();
        session.dispatch(Action::SetPrompt("   ".into()));

        let err = session.submit(&provider).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(provider.call_count(), 0);
        assert_eq!(session.error.as_deref(), Some(EMPTY_PROMPT_MESSAGE));
        assert!(!session.loading);
    }

    #[tokio::test]
    async fn test_submit_prepends_batch_with_ascending_timestamps() {
        let provider = ScriptedProvider::uniform(2, 1);
        let mut session = Session::new();
        session.dispatch(Action::GenerationSucceeded(vec![image("old")]));
        session.dispatch(Action::SetPrompt("a red fox".into()));
        session.dispatch(Action::SetAspectRatio("9:16".into()));
        session.dispatch(Action::SetBatchCount(2));

        let batch = session.submit(&provider).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert!(batch[0].timestamp < batch[1].timestamp);
        assert!(batch.iter().all(|i| i.prompt == "a red fox"));
        assert!(batch.iter().all(|i| i.aspect_ratio == AspectRatio::Portrait));
        assert_eq!(batch[0].url, "data:image/png;base64,call0img0");

        assert_eq!(session.results.len(), 3);
        assert_eq!(session.results[0], batch[0]);
        assert_eq!(session.results[2].id, "old");
        assert!(!session.loading);
        assert_eq!(session.error, None);
    }

    #[tokio::test]
    async fn test_back_to_back_batches_get_distinct_timestamps() {
        let provider = ScriptedProvider::uniform(10, 1);
        let mut session = Session::new();
        session.dispatch(Action::SetPrompt("a lighthouse".into()));
        session.dispatch(Action::SetBatchCount(5));

        session.submit(&provider).await.unwrap();
        session.submit(&provider).await.unwrap();

        assert_eq!(session.results.len(), 10);
        let mut stamps: Vec<_> = session.results.iter().map(|i| i.timestamp).collect();
        stamps.sort_unstable();
        stamps.dedup();
        assert_eq!(stamps.len(), 10);
        // Newer batch sits first and carries the later stamps
        assert!(session.results[0].timestamp > session.results[5].timestamp);
    }

    #[tokio::test]
    async fn test_submit_failure_reports_message() {
        let provider = ScriptedProvider::new(vec![
            Reply::Images(vec![InlineImage::new("image/png", "AA==")]),
            Reply::Fail(503),
        ]);
        let mut session = Session::new();
        session.dispatch(Action::SetPrompt("a cat".into()));
        session.dispatch(Action::SetBatchCount(2));

        let err = session.submit(&provider).await.unwrap_err();

        assert!(err.is_external());
        assert_eq!(
            session.error.as_deref(),
            Some("API error: 503 - quota exceeded")
        );
        assert!(session.results.is_empty());
        assert!(!session.loading);
    }

    #[tokio::test]
    async fn test_submit_rejected_while_loading() {
        let provider = ScriptedProvider::uniform(1, 1);
        let mut session = Session::new();
        session.dispatch(Action::SetPrompt("a cat".into()));
        session.dispatch(Action::GenerationStarted);

        let err = session.submit(&provider).await.unwrap_err();

        assert!(matches!(err, LuminaError::Busy));
        assert_eq!(provider.call_count(), 0);
    }
}
