//! Shared types, error model, and configuration for docbridge.
//!
//! This crate is the foundation depended on by all other docbridge crates.
//! It provides:
//! - [`DocBridgeError`]: the unified error type
//! - Output types ([`SnippetOutcome`], [`RelatedSets`], [`LearningStep`], ...)
//! - Configuration ([`AppConfig`], [`BridgeConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, ApiSection, AppConfig, BridgeConfig, ConfigOverrides, DEFAULT_API_BASE_URL,
    DefaultsConfig, PortalSection, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{DocBridgeError, Result};
pub use types::{
    DirectLink, LearningStep, QuickLink, RelatedEntry, RelatedSets, Section, SnippetOutcome,
};
