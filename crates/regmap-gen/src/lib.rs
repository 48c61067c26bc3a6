//! Register-tree planning front end.
//!
//! Loads an elaborated register tree from JSON, validates and partitions it
//! with `regmap-core`, and writes the manifest an external renderer consumes.

use std::fs;
use std::path::Path;

use regmap_core::Node;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Command-line definition and subcommand runners.
pub mod cli;
/// Generator error type and exit codes.
pub mod errors;
/// Serializable manifest built from a generation plan.
pub mod manifest;

pub use errors::GenError;
pub use manifest::Manifest;

/// Reads a tree document.
///
/// The document root must be an address map or register group.
///
/// # Errors
///
/// Returns [`GenError::Io`] if the file cannot be read, [`GenError::Json`] if
/// it does not decode as a node, and [`GenError::Invalid`] for a root that
/// cannot own registers.
pub fn load_tree(path: &Path) -> Result<Node, GenError> {
    let text = fs::read_to_string(path).map_err(|source| GenError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root = parse_tree(&text).map_err(|source| GenError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if !root.is_container() {
        return Err(GenError::Invalid(format!(
            "root '{}' is a {:?}, expected an address map or register group",
            root.name,
            root.kind()
        )));
    }
    debug!(path = %path.display(), root = %root.name, "tree loaded");
    Ok(root)
}

/// Decodes a tree document from a string.
///
/// # Errors
///
/// Returns the decoder error for malformed documents.
pub fn parse_tree(text: &str) -> Result<Node, serde_json::Error> {
    serde_json::from_str(text)
}

/// Installs the `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug` when
/// `verbose` is requested.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
use tempfile as _;
