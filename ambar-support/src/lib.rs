//! # Ambar Support
//!
//! Shared utilities for the Ambar container crates.
//!
//! Currently this is text rendering for diagnostics: shortening
//! fully-qualified type names and ranking "did you mean?" suggestions.

pub mod rendering;
