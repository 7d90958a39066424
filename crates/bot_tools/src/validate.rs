//! Configuration validation utilities.

use std::fmt;
use std::path::{Path, PathBuf};

use bot_core::config::{BotConfig, ConfigIssue};
use serde::Serialize;
use thiserror::Error;

/// Failures that stop validation before any file is checked.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// The path could not be read.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// A directory held no `.ron` files.
    #[error("No .ron files found in '{0}'")]
    NoConfigFiles(PathBuf),
}

/// Validation outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// File that was checked.
    pub path: PathBuf,
    /// Parser message, if the file is not a well-formed configuration.
    pub parse_error: Option<String>,
    /// Consistency defects of a well-formed configuration.
    pub issues: Vec<ConfigIssue>,
}

impl FileReport {
    /// Whether the file parsed and has no defects.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.parse_error.is_none() && self.issues.is_empty()
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.parse_error {
            return write!(f, "{}: {error}", self.path.display());
        }
        if self.issues.is_empty() {
            return write!(f, "{}: ok", self.path.display());
        }
        write!(f, "{}: {} issue(s)", self.path.display(), self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

/// Parse and check configuration text.
#[must_use]
pub fn validate_text(path: &Path, text: &str) -> FileReport {
    match BotConfig::from_ron_str(text) {
        Ok(config) => FileReport {
            path: path.to_path_buf(),
            parse_error: None,
            issues: config.validate(),
        },
        Err(e) => FileReport {
            path: path.to_path_buf(),
            parse_error: Some(e.to_string()),
            issues: Vec::new(),
        },
    }
}

/// Validate one configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read. Parse failures and
/// consistency defects are reported in the [`FileReport`].
pub fn validate_file(path: &Path) -> Result<FileReport, ValidateError> {
    let text = std::fs::read_to_string(path).map_err(|source| ValidateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let report = validate_text(path, &text);
    tracing::debug!(
        path = %path.display(),
        valid = report.is_valid(),
        issues = report.issues.len(),
        "Checked configuration"
    );
    Ok(report)
}

/// Validate a configuration file, or every `.ron` file in a directory
/// (sorted by name, not recursive).
///
/// # Errors
///
/// Returns an error if the path cannot be read or a directory holds no
/// `.ron` files.
pub fn validate_path(path: &Path) -> Result<Vec<FileReport>, ValidateError> {
    if !path.is_dir() {
        return validate_file(path).map(|report| vec![report]);
    }

    let io_error = |source| ValidateError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(path).map_err(io_error)? {
        let file = entry.map_err(io_error)?.path();
        if file.extension().is_some_and(|ext| ext == "ron") {
            files.push(file);
        }
    }
    if files.is_empty() {
        return Err(ValidateError::NoConfigFiles(path.to_path_buf()));
    }
    files.sort();

    files.iter().map(|file| validate_file(file)).collect()
}

/// The built-in configuration as pretty RON, a starting point for tuning.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn default_config_ron() -> Result<String, ron::Error> {
    let pretty = ron::ser::PrettyConfig::new().struct_names(true);
    ron::ser::to_string_pretty(&BotConfig::default(), pretty)
}
