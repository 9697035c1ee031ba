//! Shared types, error model, and configuration for kbsync.
//!
//! This crate is the foundation depended on by all other kbsync crates.
//! It provides:
//! - [`KbSyncError`] — the unified error type
//! - Domain types ([`VectorStoreId`], [`RemoteFile`], [`UploadedFile`])
//! - Configuration ([`AppConfig`], [`SyncSettings`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, OpenAiConfig, SyncSettings, config_dir, config_file_path, init_config, load_config,
    load_config_from, resolve_settings,
};
pub use error::{KbSyncError, Result};
pub use types::{REQUIRED_FILES, RemoteFile, UploadedFile, VectorStoreId};
