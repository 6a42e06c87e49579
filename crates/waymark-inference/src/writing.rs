//! Travel-writing generation through the generative backend.

use serde::Deserialize;
use tracing::debug;

use waymark_core::{Generation, GenerationBackend, Result};

use crate::json::parse_json_object;

#[derive(Deserialize)]
struct WritingReply {
    description: String,
}

fn build_prompt(name: &str, address: &str, transcription: &str, url_metadata: &str) -> String {
    let voice_note = if transcription.is_empty() {
        String::new()
    } else {
        format!("User's voice note: {transcription}\n")
    };
    let metadata = if url_metadata.is_empty() {
        "No website content available"
    } else {
        url_metadata
    };
    format!(
        r#"Transform this information into engaging travel writing. Write in the style of a seasoned travel writer - evocative but concise. Return only valid JSON.

Location: {name}
Address: {address}
{voice_note}
Website Information:
{metadata}

Write 2-3 paragraphs that:
- Capture the essence and atmosphere of the place
- Include practical details (address, price range, cuisine type if available)
- Incorporate highlights from reviews if provided
- Use sensory language to bring the place to life
- Include the user's personal observations if they recorded a voice note
- Mention any notable dishes, features, or must-try experiences

Keep it under 250 words.

Return JSON in this exact format:
{{
  "description": "Your polished travel writing here..."
}}"#
    )
}

/// Generate a polished description. Falls back to echoing the raw
/// transcription when the reply cannot be parsed.
pub async fn generate_travel_writing(
    backend: &dyn GenerationBackend,
    name: &str,
    address: &str,
    transcription: &str,
    url_metadata: &str,
) -> Result<(String, Generation)> {
    let prompt = build_prompt(name, address, transcription, url_metadata);
    let generation = backend.generate(&prompt).await?;

    let description = match parse_json_object::<WritingReply>(&generation.text) {
        Some(reply) => reply.description,
        None => {
            debug!(
                subsystem = "inference",
                component = "travel_writing",
                response_len = generation.text.len(),
                "Unparseable writing reply, echoing raw transcription"
            );
            transcription.to_string()
        }
    };

    Ok((description, generation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    #[tokio::test]
    async fn test_parses_description() {
        let backend =
            MockBackend::replying(r#"{"description": "A sunlit bistro with sea views."}"#);
        let (description, _) = generate_travel_writing(&backend, "Bistro", "123 Main St", "", "")
            .await
            .unwrap();
        assert_eq!(description, "A sunlit bistro with sea views.");
    }

    #[tokio::test]
    async fn test_unparseable_reply_echoes_transcription() {
        let backend = MockBackend::replying("freeform prose without structure");
        let (description, _) =
            generate_travel_writing(&backend, "Bistro", "", "loved the oysters here", "")
                .await
                .unwrap();
        assert_eq!(description, "loved the oysters here");
    }

    #[test]
    fn test_prompt_mentions_voice_note_only_when_present() {
        let with_note = build_prompt("X", "", "great coffee", "");
        assert!(with_note.contains("User's voice note: great coffee"));

        let without_note = build_prompt("X", "", "", "");
        assert!(!without_note.contains("User's voice note"));
        assert!(without_note.contains("No website content available"));
    }
}
