//! Shared types, error model, and configuration for scriptwatch.
//!
//! This crate is the foundation depended on by all other scriptwatch crates.
//! It provides:
//! - [`ScriptwatchError`] — the unified error type
//! - Domain types ([`FileRecord`], [`FileDescriptor`], [`FileId`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, ServerConfig, StorageConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{Result, ScriptwatchError};
pub use types::{FileDescriptor, FileId, FileRecord};
