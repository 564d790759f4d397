//! Error types for mesh loading and configuration.
//!
//! Face selection and measurement never fail: degenerate input yields a
//! well-defined result instead. Only the collaborators around it (reading
//! STL bytes, reading a config file) can error.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for facepick operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading an STL file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StlError {
    /// Binary data shorter than the 80-byte header plus triangle count.
    #[error("file too small to be a valid STL ({len} bytes)")]
    TooSmall {
        /// Number of bytes received.
        len: usize,
    },

    /// The declared triangle count runs past the end of the data.
    #[error("unexpected end of file: header declares {declared} triangles, data holds {available}")]
    Truncated {
        /// Triangle count from the header.
        declared: usize,
        /// Complete triangle records actually present.
        available: usize,
    },

    /// ASCII syntax error.
    #[error("failed to parse ASCII STL near: {context:?}")]
    Syntax {
        /// A short excerpt of the input where parsing stopped.
        context: String,
    },

    /// The file could not be read.
    #[error("failed to read {path}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while loading or validating a [`MeasureConfig`](crate::MeasureConfig).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML document is malformed or has wrongly typed fields.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value outside its allowed range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Crate-level error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// STL loading failed.
    #[error(transparent)]
    Stl(#[from] StlError),

    /// Config loading failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StlError::Truncated {
            declared: 10,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "unexpected end of file: header declares 10 triangles, data holds 2"
        );

        let err: Error = ConfigError::Invalid {
            field: "palette",
            reason: "must not be empty".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid config value for `palette`: must not be empty"
        );
    }
}
