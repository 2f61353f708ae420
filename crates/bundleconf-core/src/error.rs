use std::path::PathBuf;
use thiserror::Error;

/// Core error type for configuration loading and validation.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Invalid config option `{field}`: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error(
        "Package '{package}' is assigned to both chunk '{first}' and chunk '{second}'"
    )]
    ChunkAssignmentConflict {
        package: String,
        first: String,
        second: String,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable SCREAMING_SNAKE_CASE code for JSON output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO_ERROR",
            Self::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            Self::ConfigRead { .. } => "CONFIG_READ_FAILED",
            Self::ConfigParse { .. } => "CONFIG_PARSE_FAILED",
            Self::InvalidConfig { .. } => "CONFIG_INVALID",
            Self::ChunkAssignmentConflict { .. } => "CHUNK_ASSIGNMENT_CONFLICT",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_screaming_snake_case() {
        let errors = [
            Error::other("x"),
            Error::invalid("resolve.alias", "empty"),
            Error::ChunkAssignmentConflict {
                package: "@mdi/font".into(),
                first: "a".into(),
                second: "b".into(),
            },
        ];
        for e in errors {
            let code = e.code();
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_conflict_message_names_both_chunks() {
        let e = Error::ChunkAssignmentConflict {
            package: "@mdi/font".into(),
            first: "material-icons".into(),
            second: "vendor".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("@mdi/font"));
        assert!(msg.contains("material-icons"));
        assert!(msg.contains("vendor"));
    }
}
