//! # waymark-inference
//!
//! Generative-AI backend abstraction for waymark.
//!
//! This crate provides:
//! - The Gemini-style generateContent backend (text + audio)
//! - Geocoding, tag extraction, travel writing, and free-text location
//!   extraction built on any [`waymark_core::GenerationBackend`]
//! - The structured-output parser used by every adapter
//!
//! Every adapter is fallback-first: a reply that fails to parse degrades
//! to a typed default (low-confidence geocode, empty tag list, echoed
//! transcription) rather than surfacing an error. Only missing
//! credentials and transport failures propagate.

pub mod extract;
pub mod gemini;
pub mod geocode;
pub mod json;
pub mod tags;
pub mod writing;

// Canned backends for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use waymark_core::*;

pub use extract::extract_locations_from_text;
pub use gemini::{GeminiBackend, DEFAULT_BASE_URL};
pub use geocode::geocode_from_content;
pub use json::{extract_json_object, parse_json_object};
pub use tags::extract_tags;
pub use writing::generate_travel_writing;
