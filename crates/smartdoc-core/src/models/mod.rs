//! Data model and configuration.

pub mod config;
pub mod document;
pub mod span;
