//! Gemini-style generateContent backend.
//!
//! One HTTP shape serves both plain text generation and multimodal audio
//! transcription. Token counts from `usageMetadata` feed the usage ledger.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use waymark_core::{
    defaults, Error, Generation, GenerationBackend, Result, Transcription, TranscriptionBackend,
};

/// Default public endpoint for the generative-language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Instruction sent alongside inline audio data.
const TRANSCRIBE_INSTRUCTION: &str =
    "Transcribe this audio recording exactly as spoken. Return only the transcription text, nothing else.";

/// Generative backend speaking the v1beta generateContent protocol.
pub struct GeminiBackend {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }

    /// Point the backend at a different endpoint (tests use a local mock).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    async fn generate_content(&self, body: serde_json::Value) -> Result<GeminiResponse> {
        if self.api_key.is_empty() {
            return Err(Error::Config(
                "Generative API key not configured. Please add it in the admin settings."
                    .to_string(),
            ));
        }

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Request(format!("generateContent request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Generative API returned {}: {}",
                status, body
            )));
        }

        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            Error::Inference(format!("Failed to parse generateContent response: {}", e))
        })?;
        Ok(parsed)
    }
}

/// generateContent response format.
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(default, rename = "promptTokenCount")]
    prompt_token_count: i64,
    #[serde(default, rename = "candidatesTokenCount")]
    candidates_token_count: i64,
}

impl GeminiResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .unwrap_or_default()
    }

    fn tokens(&self) -> (i64, i64) {
        self.usage_metadata
            .as_ref()
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or((0, 0))
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<Generation> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.7, "maxOutputTokens": 4096 },
        });

        let response = self.generate_content(body).await?;
        let (input_tokens, output_tokens) = response.tokens();

        debug!(
            subsystem = "inference",
            component = "gemini",
            op = "generate",
            model = %self.model,
            prompt_len = prompt.len(),
            input_tokens,
            output_tokens,
            "Generation completed"
        );

        Ok(Generation {
            text: response.text(),
            input_tokens,
            output_tokens,
            model: self.model.clone(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TranscriptionBackend for GeminiBackend {
    async fn transcribe(&self, audio_data: &[u8], mime_type: &str) -> Result<Transcription> {
        let audio_base64 = base64::engine::general_purpose::STANDARD.encode(audio_data);

        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    { "inlineData": { "mimeType": mime_type, "data": audio_base64 } },
                    { "text": TRANSCRIBE_INSTRUCTION },
                ],
            }],
            "generationConfig": { "temperature": 0.1, "maxOutputTokens": 4096 },
        });

        let response = self.generate_content(body).await?;
        let (input_tokens, output_tokens) = response.tokens();

        // Rough estimate for compressed audio; treated as approximate
        // everywhere downstream.
        let duration_seconds = (audio_data.len() / defaults::AUDIO_BYTES_PER_SECOND) as i64;

        debug!(
            subsystem = "inference",
            component = "gemini",
            op = "transcribe",
            model = %self.model,
            audio_bytes = audio_data.len(),
            duration_seconds,
            "Transcription completed"
        );

        Ok(Transcription {
            text: response.text().trim().to_string(),
            duration_seconds,
            input_tokens,
            output_tokens,
            model: self.model.clone(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
