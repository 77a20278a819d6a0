//! Resolution of SQL text from either a literal string or a `.sql` file.

use crate::error::{GenDbError, Result};
use std::path::PathBuf;
use tracing::{error, info};

/// How many leading characters are sniffed for a `.sql` suffix.
const SNIFF_CHARS: usize = 255;

/// Where the SQL text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlSource {
    /// Literal SQL text.
    Text(String),
    /// A file whose contents are the SQL text.
    File(PathBuf),
}

impl SqlSource {
    /// Classifies `input`: anything with ".sql" (any case) in its first 255
    /// characters is treated as a file path, everything else as SQL text.
    pub fn classify(input: &str) -> Self {
        let head: String = input.chars().take(SNIFF_CHARS).collect();
        if head.to_lowercase().contains(".sql") {
            Self::File(PathBuf::from(input))
        } else {
            Self::Text(input.to_string())
        }
    }

    /// Returns the SQL text, reading the file if needed.
    pub fn load(&self) -> Result<String> {
        match self {
            Self::Text(text) => {
                let head: String = text.chars().take(SNIFF_CHARS).collect();
                info!("Loading SQL Code String: {head}");
                Ok(text.clone())
            }
            Self::File(path) => {
                info!("Loading SQL Code File: {}", path.display());
                std::fs::read_to_string(path).map_err(|e| {
                    error!("Failed to read SQL file {}: {e}", path.display());
                    GenDbError::config(format!(
                        "Failed to read SQL file {}: {e}",
                        path.display()
                    ))
                })
            }
        }
    }

    /// Classifies and loads in one step.
    pub fn resolve(input: &str) -> Result<String> {
        Self::classify(input).load()
    }
}
