//! Geocoding through the generative backend.
//!
//! The model is prompted for strict JSON; a reply that fails to parse
//! becomes a low-confidence result with no coordinates, never an error.

use serde::Deserialize;
use tracing::debug;

use waymark_core::{defaults, Confidence, Coordinates, GeocodeResult, Generation, GenerationBackend, Result};

use crate::json::parse_json_object;

/// Wire shape the prompt asks the model to produce.
#[derive(Deserialize)]
struct GeocodeReply {
    location_name: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    coordinates: Option<Coordinates>,
    confidence: Confidence,
    #[serde(default)]
    reasoning: String,
}

fn build_prompt(url: &str, title: &str, content: &str, user_notes: &str) -> String {
    let excerpt: String = content.chars().take(defaults::GEOCODE_CONTENT_EXCERPT).collect();
    format!(
        r#"Extract the geographic location from this content. Return only valid JSON, no other text.

URL: {url}
Page Title: {title}
Page Content (excerpt): {excerpt}
User Notes: {user_notes}

Return JSON in this exact format:
{{
  "location_name": "Name of the place",
  "address": "Full address if available, or null",
  "coordinates": {{ "lat": 00.0000, "lng": 00.0000 }},
  "confidence": "high|medium|low",
  "reasoning": "Brief explanation of how location was determined"
}}

If coordinates cannot be determined with reasonable confidence, set coordinates to null.
For well-known places, use your knowledge to provide coordinates."#
    )
}

/// Fallback used whenever the model's reply cannot be parsed.
pub fn fallback_result(title: &str) -> GeocodeResult {
    GeocodeResult {
        name: if title.is_empty() {
            "Unknown Location".to_string()
        } else {
            title.to_string()
        },
        address: None,
        coordinates: None,
        confidence: Confidence::Low,
        reasoning: "Failed to parse geocoding response".to_string(),
    }
}

/// Geocode assembled text context. Returns the generation (for usage
/// accounting) alongside the parsed-or-fallback result.
pub async fn geocode_from_content(
    backend: &dyn GenerationBackend,
    url: &str,
    title: &str,
    content: &str,
    user_notes: &str,
) -> Result<(GeocodeResult, Generation)> {
    let prompt = build_prompt(url, title, content, user_notes);
    let generation = backend.generate(&prompt).await?;

    let result = match parse_json_object::<GeocodeReply>(&generation.text) {
        Some(reply) => GeocodeResult {
            name: reply.location_name,
            address: reply.address,
            coordinates: reply.coordinates,
            confidence: reply.confidence,
            reasoning: reply.reasoning,
        },
        None => {
            debug!(
                subsystem = "inference",
                component = "geocode",
                response_len = generation.text.len(),
                "Unparseable geocoding reply, returning low-confidence fallback"
            );
            fallback_result(title)
        }
    };

    Ok((result, generation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    #[tokio::test]
    async fn test_parses_well_formed_reply() {
        let backend = MockBackend::replying(
            r#"{"location_name": "Example Bistro", "address": "123 Main St",
                "coordinates": {"lat": 10.0, "lng": 20.0},
                "confidence": "high", "reasoning": "address on page"}"#,
        );

        let (result, _) = geocode_from_content(&backend, "https://example.com", "Example Bistro", "", "")
            .await
            .unwrap();

        assert_eq!(result.name, "Example Bistro");
        assert_eq!(result.coordinates, Some(Coordinates { lat: 10.0, lng: 20.0 }));
        assert_eq!(result.confidence, Confidence::High);
    }

    #[tokio::test]
    async fn test_null_coordinates_are_accepted() {
        let backend = MockBackend::replying(
            r#"{"location_name": "Somewhere", "address": null,
                "coordinates": null, "confidence": "medium", "reasoning": "vague"}"#,
        );

        let (result, _) = geocode_from_content(&backend, "", "Somewhere", "", "").await.unwrap();
        assert_eq!(result.coordinates, None);
        assert_eq!(result.confidence, Confidence::Medium);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_low_confidence_null_coordinates() {
        let backend = MockBackend::replying("I could not find a location, sorry!");

        let (result, _) = geocode_from_content(&backend, "", "Page Title", "", "").await.unwrap();
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.coordinates, None);
        assert_eq!(result.name, "Page Title");
    }

    #[tokio::test]
    async fn test_fallback_name_when_title_empty() {
        let backend = MockBackend::replying("not json");
        let (result, _) = geocode_from_content(&backend, "", "", "", "").await.unwrap();
        assert_eq!(result.name, "Unknown Location");
    }

    #[test]
    fn test_prompt_excerpts_long_content() {
        let long_content = "x".repeat(10_000);
        let prompt = build_prompt("https://example.com", "t", &long_content, "");
        // Excerpt bound plus the fixed prompt scaffolding.
        assert!(prompt.len() < defaults::GEOCODE_CONTENT_EXCERPT + 1_500);
    }
}
