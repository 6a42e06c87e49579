//! Tag naming rules and the fixed category vocabulary.

use serde::{Deserialize, Serialize};

/// Fixed set of tag categories used across extraction and admin curation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    PlaceType,
    Ambience,
    Timing,
    Feature,
    Cuisine,
    Activity,
}

impl TagCategory {
    /// All categories in display order.
    pub const ALL: [TagCategory; 6] = [
        TagCategory::PlaceType,
        TagCategory::Ambience,
        TagCategory::Timing,
        TagCategory::Feature,
        TagCategory::Cuisine,
        TagCategory::Activity,
    ];

    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TagCategory::PlaceType => "place_type",
            TagCategory::Ambience => "ambience",
            TagCategory::Timing => "timing",
            TagCategory::Feature => "feature",
            TagCategory::Cuisine => "cuisine",
            TagCategory::Activity => "activity",
        }
    }

    /// Parse from the database/wire representation.
    ///
    /// Unknown categories (including ones a model invents) fall back to
    /// `Feature` rather than failing the tagging pass.
    pub fn parse_lenient(s: &str) -> TagCategory {
        match s {
            "place_type" => TagCategory::PlaceType,
            "ambience" => TagCategory::Ambience,
            "timing" => TagCategory::Timing,
            "feature" => TagCategory::Feature,
            "cuisine" => TagCategory::Cuisine,
            "activity" => TagCategory::Activity,
            _ => TagCategory::Feature,
        }
    }
}

impl std::fmt::Display for TagCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a tag name to its canonical stored form.
///
/// Lowercased, trimmed, internal whitespace runs collapsed to a single
/// hyphen. `"Rooftop Bar"` becomes `"rooftop-bar"`.
pub fn normalize_tag_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Validate a normalized tag name.
///
/// Rules:
/// - Length between 1-100 characters
/// - Allowed characters: alphanumeric, hyphens (-), underscores (_)
/// - No spaces or other special characters
///
/// Returns Ok(()) if valid, Err with message if invalid.
pub fn validate_tag_name(tag: &str) -> std::result::Result<(), String> {
    if tag.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if tag.len() > 100 {
        return Err("Tag name must be 100 characters or less".to_string());
    }

    let invalid_chars: Vec<char> = tag
        .chars()
        .filter(|c| !c.is_alphanumeric() && *c != '-' && *c != '_')
        .collect();

    if !invalid_chars.is_empty() {
        let chars_display: String = invalid_chars
            .iter()
            .take(5)
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(format!(
            "Tag contains invalid characters: {}. Only alphanumeric characters, hyphens, and underscores are allowed",
            chars_display
        ));
    }

    Ok(())
}
