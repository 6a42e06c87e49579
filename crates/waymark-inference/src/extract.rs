//! Free-text location extraction for smart import.

use serde::Deserialize;
use tracing::debug;

use waymark_core::{defaults, Generation, GenerationBackend, LocationCandidate, Result};

use crate::json::parse_json_object;

#[derive(Deserialize)]
struct ExtractReply {
    #[serde(default)]
    locations: Vec<LocationCandidate>,
}

fn build_prompt(text: &str) -> String {
    let excerpt: String = text.chars().take(defaults::EXTRACT_TEXT_EXCERPT).collect();
    format!(
        r#"Extract all locations/places mentioned in this text. Return only valid JSON.

Text:
{excerpt}

Return JSON in this exact format:
{{
  "locations": [
    {{
      "name": "Place name",
      "address": "Address if mentioned, or null",
      "url": "URL if mentioned, or null",
      "notes": "Any notes or descriptions mentioned, or null"
    }}
  ]
}}

Extract all identifiable places, restaurants, hotels, attractions, etc."#
    )
}

/// Extract location candidates from pasted text. Unparseable output
/// yields an empty list.
pub async fn extract_locations_from_text(
    backend: &dyn GenerationBackend,
    text: &str,
) -> Result<(Vec<LocationCandidate>, Generation)> {
    let prompt = build_prompt(text);
    let generation = backend.generate(&prompt).await?;

    let candidates = match parse_json_object::<ExtractReply>(&generation.text) {
        Some(reply) => reply
            .locations
            .into_iter()
            .filter(|c| !c.name.trim().is_empty())
            .collect(),
        None => {
            debug!(
                subsystem = "inference",
                component = "extract_locations",
                response_len = generation.text.len(),
                "Unparseable extraction reply, returning empty list"
            );
            Vec::new()
        }
    };

    Ok((candidates, generation))
}
