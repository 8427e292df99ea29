//! Shared types, error model, and configuration for docingest.
//!
//! This crate is the foundation depended on by all other docingest crates.
//! It provides:
//! - [`DocIngestError`], the unified error type
//! - Domain types ([`Chunk`], [`ChunkMetadata`], [`ChunkType`], [`DocumentType`], [`SectionType`],
//!   [`TriggerCondition`], [`RflpStep`], [`KeywordGroup`])
//! - Configuration ([`AppConfig`], [`ChunkingConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ChunkingConfig, ClassifierConfig, DefaultsConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{DocIngestError, Result};
pub use types::{
    Chunk, ChunkMetadata, ChunkType, DocumentType, KeywordGroup, ParseTagError, RflpStep,
    SectionType, TriggerCondition,
};
