//! Canned backends for testing adapters and the save pipeline without a
//! live model.

use async_trait::async_trait;

use waymark_core::{
    Error, Generation, GenerationBackend, Result, Transcription, TranscriptionBackend,
};

/// Generation backend returning a fixed reply, or a fixed error.
pub struct MockBackend {
    reply: std::result::Result<String, String>,
    model: String,
}

impl MockBackend {
    /// Reply with the given text on every call.
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            model: "mock-model".to_string(),
        }
    }

    /// Fail every call with an inference error.
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            model: "mock-model".to_string(),
        }
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(&self, _prompt: &str) -> Result<Generation> {
        match &self.reply {
            Ok(text) => Ok(Generation {
                text: text.clone(),
                input_tokens: 10,
                output_tokens: 5,
                model: self.model.clone(),
            }),
            Err(message) => Err(Error::Inference(message.clone())),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TranscriptionBackend for MockBackend {
    async fn transcribe(&self, audio_data: &[u8], _mime_type: &str) -> Result<Transcription> {
        match &self.reply {
            Ok(text) => Ok(Transcription {
                text: text.clone(),
                duration_seconds: (audio_data.len() / 16_000) as i64,
                input_tokens: 10,
                output_tokens: 5,
                model: self.model.clone(),
            }),
            Err(message) => Err(Error::Inference(message.clone())),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
