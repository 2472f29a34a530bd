//! # Configuration
//!
//! Settings come from three layers, highest first:
//!
//! 1. command-line flags
//! 2. `playbook.toml` (or the file given with `--config`)
//! 3. built-in defaults
//!
//! ```toml
//! database = "profile.db"
//! backend = "redb"        # or "file"
//! content = "content"
//! json_mode = false
//! ```

use playbook_core::PlaybookError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "playbook.toml";

/// Default database path.
pub const DEFAULT_DATABASE: &str = "playbook.db";

/// Default content directory.
pub const DEFAULT_CONTENT_DIR: &str = "content";

/// Maximum config file size (64 KB).
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

// =============================================================================
// BACKEND
// =============================================================================

/// Storage backend for the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Snapshot file rewritten on every save.
    File,
    /// redb database (ACID).
    #[default]
    Redb,
}

impl Backend {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Redb => "redb",
        }
    }
}

impl FromStr for Backend {
    type Err = PlaybookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "redb" => Ok(Self::Redb),
            other => Err(PlaybookError::InvalidInput(format!(
                "Unknown backend '{}'. Use: file, redb",
                other
            ))),
        }
    }
}

// =============================================================================
// FILE LAYER
// =============================================================================

/// Contents of `playbook.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<PathBuf>,
    pub backend: Option<String>,
    pub content: Option<PathBuf>,
    pub json_mode: Option<bool>,
}

impl FileConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self, PlaybookError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            PlaybookError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(PlaybookError::InvalidInput(format!(
                "Config '{}' exceeds {} bytes",
                path.display(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            PlaybookError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::parse(&text)
            .map_err(|e| PlaybookError::InvalidInput(format!("{}: {}", path.display(), e)))
    }

    /// Parse config text.
    pub fn parse(text: &str) -> Result<Self, PlaybookError> {
        toml::from_str(text).map_err(|e| PlaybookError::DeserializationError(e.to_string()))
    }
}

// =============================================================================
// RESOLVED SETTINGS
// =============================================================================

/// Flag values that can override the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub backend: Option<String>,
    pub content: Option<PathBuf>,
    pub json_mode: bool,
}

/// Effective settings after layering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: PathBuf,
    pub backend: Backend,
    pub content: PathBuf,
    pub json_mode: bool,
}

impl Settings {
    /// Layer flags over the config file over defaults.
    ///
    /// An explicit `--config` must exist; the implicit `playbook.toml` is
    /// optional.
    pub fn resolve(overrides: &Overrides) -> Result<Self, PlaybookError> {
        let file = match &overrides.config {
            Some(path) => FileConfig::load(path)?,
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    tracing::debug!(path = DEFAULT_CONFIG_FILE, "using config file");
                    FileConfig::load(implicit)?
                } else {
                    FileConfig::default()
                }
            }
        };
        Self::layer(overrides, file)
    }

    /// Combine already-parsed layers.
    pub fn layer(overrides: &Overrides, file: FileConfig) -> Result<Self, PlaybookError> {
        let backend = match overrides.backend.as_deref().or(file.backend.as_deref()) {
            Some(name) => name.parse()?,
            None => Backend::default(),
        };
        Ok(Self {
            database: overrides
                .database
                .clone()
                .or(file.database)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            backend,
            content: overrides
                .content
                .clone()
                .or(file.content)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR)),
            json_mode: overrides.json_mode || file.json_mode.unwrap_or(false),
        })
    }
}
