//! # Configuration
//!
//! Todoz configuration is managed by [`confique`], layering environment
//! variables over an optional TOML file over compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `TODOZ_DATA_DIR`, `TODOZ_DATABASE`, `TODOZ_KEY_VALUE`.
//! 2. **Config file**: `--config <path>`, else `todoz.toml` in the OS config
//!    directory (via `directories`). A missing file is fine.
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `data_dir` | OS data dir | Where the database file and key-value slot live |
//! | `database` | `true` | Offer the database tier to the selector |
//! | `database_file` | `todoDB.sqlite3` | Database file name inside `data_dir` |
//! | `key_value` | `true` | Offer the key-value tier to the selector |
//! | `key_value_slot` | `todos_local` | Slot name (`<slot>.json`) inside `data_dir` |
//!
//! Switching a tier off makes the selector skip it, the same way it skips a tier
//! that fails to open.

use crate::error::Result;
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "todoz.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "todoz", "todoz")
}

/// Configuration for todoz, stored in `todoz.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TodozConfig {
    /// Directory holding all persisted data. Defaults to the OS data directory.
    #[config(env = "TODOZ_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Use the embedded database tier when it can be opened.
    #[config(env = "TODOZ_DATABASE", default = true)]
    pub database: bool,

    #[config(default = "todoDB.sqlite3")]
    pub database_file: String,

    /// Use the key-value tier when the database is unavailable.
    #[config(env = "TODOZ_KEY_VALUE", default = true)]
    pub key_value: bool,

    #[config(default = "todos_local")]
    pub key_value_slot: String,
}

impl Default for TodozConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            database: true,
            database_file: "todoDB.sqlite3".to_string(),
            key_value: true,
            key_value_slot: "todos_local".to_string(),
        }
    }
}

impl TodozConfig {
    /// Load from the environment, then `explicit` or the default config file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = explicit
            .map(Path::to_path_buf)
            .or_else(Self::default_config_path);
        let mut builder = Self::builder().env();
        if let Some(path) = file {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }

    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Configured data dir, else the OS data dir. `None` if neither is known.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().to_path_buf()))
    }

    /// Database file, or `None` when the tier is off or there is nowhere to put it.
    pub fn database_path(&self) -> Option<PathBuf> {
        if !self.database {
            return None;
        }
        self.data_dir().map(|dir| dir.join(&self.database_file))
    }

    /// Key-value directory, or `None` when the tier is off.
    pub fn key_value_dir(&self) -> Option<PathBuf> {
        if !self.key_value {
            return None;
        }
        self.data_dir()
    }
}
