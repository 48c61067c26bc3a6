//! Generator error type.
//!
//! Layout defects in the tree are not errors here: they travel inside the
//! plan as per-node diagnostics. [`GenError`] covers the failures that stop a
//! run before or after planning.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Process exit code for a run that could not read its input or write its
/// output.
pub const EXIT_FAILURE: i32 = 2;

/// Failure that aborts a generator run.
#[derive(Debug, Error)]
pub enum GenError {
    /// Reading or writing a file failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The input is not a valid tree document, or the manifest could not be
    /// encoded.
    #[error("{}: {source}", path.display())]
    Json {
        /// File being decoded or encoded.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The document decoded but cannot be planned.
    #[error("invalid tree: {0}")]
    Invalid(String),
}

impl GenError {
    /// Exit code reported to the shell for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Io { .. } | Self::Json { .. } | Self::Invalid(_) => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::PathBuf;

    use super::{GenError, EXIT_FAILURE};

    #[test]
    fn messages_lead_with_the_offending_path() {
        let err = GenError::Io {
            path: PathBuf::from("tree.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "tree.json: missing");
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert_eq!(
            GenError::Invalid("root must be an address map".into()).to_string(),
            "invalid tree: root must be an address map"
        );
    }
}
