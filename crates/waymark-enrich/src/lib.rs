//! # waymark-enrich
//!
//! Outward-facing enrichment clients for waymark.
//!
//! This crate provides:
//! - [`ContentFetcher`]: bounded-time page fetch with heuristic
//!   selector/regex field extraction; never fails, only degrades
//! - [`PlacesClient`]: biased place text search mapped into normalized
//!   enrichment fields; absent credentials or API errors yield `None`

pub mod fetch;
pub mod places;

pub use fetch::{extract_content, format_for_prompt, ContentFetcher};
pub use places::{PlacesClient, DEFAULT_BASE_URL as PLACES_DEFAULT_BASE_URL};
