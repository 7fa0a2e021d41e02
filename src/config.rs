//! Build configuration: which model sources to compile and where the
//! notebook goes.
//!
//! Persisted as TOML, conventionally `modelbook.toml` next to the sources:
//!
//! ```toml
//! [model]
//! name = "shop"
//! sources = ["model/domains.mdl", "model/entities"]
//!
//! [output]
//! path = "target/notebook.json"
//! pretty = true
//! ```
//!
//! Source paths are relative to the config file. A directory source stands
//! for every `.mdl` file directly inside it, in file-name order.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extension of model DSL files picked up from directory sources.
pub const MODEL_EXTENSION: &str = "mdl";

/// Errors from build configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(modelbook::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}")]
    #[diagnostic(
        code(modelbook::config::parse),
        help("Check the TOML syntax; `[model]` needs `name` and `sources`.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(modelbook::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("model \"{name}\" has no sources")]
    #[diagnostic(
        code(modelbook::config::no_sources),
        help("List at least one `.mdl` file or directory in `[model] sources`.")
    )]
    NoSources { name: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// The `[model]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSection {
    /// Model name, used in logs and summaries.
    pub name: String,
    /// Source files or directories, relative to the config file.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
}

/// The `[output]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSection {
    /// Where to write the notebook JSON; stdout when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_pretty() -> bool {
    true
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            path: None,
            pretty: default_pretty(),
        }
    }
}

/// A whole build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: ModelSection,
    #[serde(default)]
    pub output: OutputSection,
}

impl ModelConfig {
    /// A config for `name` with the given sources and default output.
    pub fn new(name: &str, sources: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            model: ModelSection {
                name: name.to_string(),
                sources: sources.into_iter().collect(),
            },
            output: OutputSection::default(),
        }
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Expand the configured sources into concrete files under `base`.
    ///
    /// Files are kept in configuration order; directories expand to their
    /// `.mdl` files sorted by name.
    pub fn resolve_sources(&self, base: &Path) -> ConfigResult<Vec<PathBuf>> {
        if self.model.sources.is_empty() {
            return Err(ConfigError::NoSources {
                name: self.model.name.clone(),
            });
        }

        let mut files = Vec::new();
        for source in &self.model.sources {
            let path = base.join(source);
            if !path.is_dir() {
                files.push(path);
                continue;
            }
            let entries = std::fs::read_dir(&path).map_err(|e| ConfigError::Read {
                path: path.display().to_string(),
                source: e,
            })?;
            let mut found: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == MODEL_EXTENSION))
                .collect();
            if found.is_empty() {
                tracing::warn!(dir = %path.display(), "source directory has no model files");
            }
            found.sort();
            files.extend(found);
        }

        if files.is_empty() {
            return Err(ConfigError::NoSources {
                name: self.model.name.clone(),
            });
        }
        Ok(files)
    }

    /// Output path resolved against `base`, if configured.
    pub fn output_path(&self, base: &Path) -> Option<PathBuf> {
        self.output.path.as_ref().map(|p| base.join(p))
    }
}
