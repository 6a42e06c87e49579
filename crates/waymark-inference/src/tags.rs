//! Tag extraction through the generative backend.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use waymark_core::{
    normalize_tag_name, validate_tag_name, Generation, GenerationBackend, Result, Tag,
    TagCategory, TagSuggestion,
};

use crate::json::parse_json_object;

#[derive(Deserialize)]
struct TagReply {
    #[serde(default)]
    tags: Vec<TagReplyEntry>,
}

#[derive(Deserialize)]
struct TagReplyEntry {
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    existing: bool,
}

/// Group the active vocabulary by category for the prompt.
fn vocabulary_block(vocabulary: &[Tag]) -> String {
    let mut by_category: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for tag in vocabulary {
        by_category
            .entry(tag.category.as_str())
            .or_default()
            .push(&tag.name);
    }
    by_category
        .into_iter()
        .map(|(category, names)| format!("{}: {}", category, names.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(name: &str, description: &str, transcription: &str, vocabulary: &[Tag]) -> String {
    format!(
        r#"Analyze this location and extract relevant tags. Prefer using existing tags when applicable. Return only valid JSON.

Location: {name}
Description: {description}
User Notes: {transcription}

Existing tags by category:
{existing}

Categories: place_type, ambience, timing, feature, cuisine, activity

Return JSON in this exact format:
{{
  "tags": [
    {{ "name": "tag-name", "category": "category", "existing": true/false }}
  ]
}}

Guidelines:
- Use lowercase with hyphens for tag names
- Mark "existing": true if the tag already exists in the system
- Only create new tags if truly unique and useful
- Extract 3-8 relevant tags"#,
        existing = vocabulary_block(vocabulary),
    )
}

/// Suggest tags for a location. Unparseable output yields an empty list.
pub async fn extract_tags(
    backend: &dyn GenerationBackend,
    name: &str,
    description: &str,
    transcription: &str,
    vocabulary: &[Tag],
) -> Result<(Vec<TagSuggestion>, Generation)> {
    let prompt = build_prompt(name, description, transcription, vocabulary);
    let generation = backend.generate(&prompt).await?;

    let suggestions = match parse_json_object::<TagReply>(&generation.text) {
        Some(reply) => reply
            .tags
            .into_iter()
            .filter_map(|entry| {
                let normalized = normalize_tag_name(&entry.name);
                // One malformed suggestion costs one tag, not the pass.
                validate_tag_name(&normalized).ok()?;
                Some(TagSuggestion {
                    name: normalized,
                    category: TagCategory::parse_lenient(&entry.category),
                    existing: entry.existing,
                })
            })
            .collect(),
        None => {
            debug!(
                subsystem = "inference",
                component = "extract_tags",
                response_len = generation.text.len(),
                "Unparseable tag reply, returning empty list"
            );
            Vec::new()
        }
    };

    Ok((suggestions, generation))
}
