//! Notebook runtime configuration.
//!
//! # Responsibility
//! - Hold the note-recognition and create/select policy knobs.
//! - Load and validate configuration from a JSON file.
//!
//! # Invariants
//! - Extensions are stored lowercase without a leading dot.
//! - `default_note_extension` is always a member of `note_extensions`.

use crate::fs::FsError;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const DEFAULT_NOTE_EXTENSION: &str = "txt";

/// Errors from configuration loading and validation.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    Read(FsError),
    /// Config file is not valid JSON for `NotebookConfig`.
    Parse(String),
    /// Config parsed but violates an invariant.
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(message) => write!(f, "failed to parse config: {message}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(err) => Some(err),
            _ => None,
        }
    }
}

/// Notebook configuration. Every field has a default, so `{}` is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookConfig {
    /// File extensions recognized as notes, without the dot.
    pub note_extensions: Vec<String>,
    /// Extension appended to new notes whose name has no recognized one.
    pub default_note_extension: String,
    /// Treat creating an already existing folder as success.
    pub create_dir_exists_ok: bool,
    /// Refuse to replace a dirty active document without explicit discard.
    pub confirm_discard_unsaved: bool,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            note_extensions: vec![DEFAULT_NOTE_EXTENSION.to_string()],
            default_note_extension: DEFAULT_NOTE_EXTENSION.to_string(),
            create_dir_exists_ok: false,
            confirm_discard_unsaved: true,
        }
    }
}

impl NotebookConfig {
    /// Loads, normalizes and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Read(FsError::from_io(path, err)))?;
        let config = Self::from_json(&raw)?;
        info!(
            "event=config_load module=config status=ok path={} extensions={}",
            path.display(),
            config.note_extensions.join(",")
        );
        Ok(config)
    }

    /// Parses, normalizes and validates config JSON text.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let parsed: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let normalized = parsed.normalized();
        normalized.validate()?;
        Ok(normalized)
    }

    /// Returns a copy with extensions trimmed, lowercased, dot-stripped
    /// and deduplicated (first occurrence wins).
    pub fn normalized(&self) -> Self {
        let mut note_extensions: Vec<String> = Vec::new();
        for extension in &self.note_extensions {
            let value = normalize_extension(extension);
            if !note_extensions.contains(&value) {
                note_extensions.push(value);
            }
        }
        Self {
            note_extensions,
            default_note_extension: normalize_extension(&self.default_note_extension),
            ..self.clone()
        }
    }

    /// Checks declaration-level invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.note_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "note_extensions must not be empty".to_string(),
            ));
        }
        for extension in &self.note_extensions {
            if extension.is_empty()
                || extension.contains(['.', '/', '\\'])
                || extension.chars().any(char::is_whitespace)
            {
                return Err(ConfigError::Invalid(format!(
                    "note extension `{extension}` is not a bare extension"
                )));
            }
        }
        if !self.note_extensions.contains(&self.default_note_extension) {
            return Err(ConfigError::Invalid(format!(
                "default_note_extension `{}` is not listed in note_extensions",
                self.default_note_extension
            )));
        }
        Ok(())
    }

    /// Whether a file name carries a recognized note extension.
    pub fn is_note_name(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|value| value.to_str())
            .map(|value| {
                let value = value.to_ascii_lowercase();
                self.note_extensions.iter().any(|known| *known == value)
            })
            .unwrap_or(false)
    }
}

fn normalize_extension(value: &str) -> String {
    value.trim().trim_start_matches('.').to_ascii_lowercase()
}
