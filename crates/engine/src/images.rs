use crate::backend::{GenerativeBackend, ImageRequest, InlineImage, Operation};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::prompts;
use crate::stats::CallCounters;

/// Image generation and editing. Errors are returned to the caller, which
/// decides whether a missing image matters.
pub struct ImageStudio<'a> {
    backend: &'a dyn GenerativeBackend,
    counters: &'a CallCounters,
    config: &'a EngineConfig,
}

impl<'a> ImageStudio<'a> {
    pub fn new(
        backend: &'a dyn GenerativeBackend,
        counters: &'a CallCounters,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            backend,
            counters,
            config,
        }
    }

    fn request(&self, operation: Operation, prompt: String) -> ImageRequest {
        self.counters.record(operation, &self.config.image_model);
        ImageRequest {
            operation,
            model: self.config.image_model.clone(),
            prompt,
        }
    }

    /// Icon-style picture for one Word Shrinker part.
    pub async fn generate_part_image(&self, part: &str) -> Result<InlineImage> {
        let request = self.request(Operation::GeneratePartImage, prompts::part_image_prompt(part));
        self.backend.generate_image(&request).await.inspect_err(|err| {
            log::warn!("Image generation for part '{part}' failed: {err}");
        })
    }

    /// Sticker-style starting picture for a Word Mashup round.
    pub async fn generate_starter_image(&self, object: &str) -> Result<InlineImage> {
        let request = self.request(
            Operation::GenerateStarterImage,
            prompts::starter_image_prompt(object),
        );
        self.backend.generate_image(&request).await.inspect_err(|err| {
            log::warn!("Starter image generation for '{object}' failed: {err}");
        })
    }

    /// Applies the player's edit instruction to the starter image. No
    /// timeout: the round clock has already stopped when this runs.
    pub async fn edit_mashup_image(
        &self,
        instruction: &str,
        starter: &InlineImage,
    ) -> Result<InlineImage> {
        let request = self.request(Operation::EditMashupImage, instruction.to_string());
        self.backend
            .edit_image(&request, starter)
            .await
            .inspect_err(|err| log::warn!("Mashup image edit failed: {err}"))
    }
}
