//! # waymark-core
//!
//! Core types, traits, and abstractions for the waymark travel-bookmarking
//! service.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other waymark crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod pricing;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use tags::{normalize_tag_name, validate_tag_name, TagCategory};
pub use traits::*;
