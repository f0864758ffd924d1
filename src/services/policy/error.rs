use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or evaluating the policy rule set.
///
/// A load error at startup is fatal; during a hot reload it is logged and
/// the previous snapshot stays in effect. An evaluation error is surfaced
/// to the caller and must never be treated as an allow.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy resource {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid policy model: {0}")]
    Model(String),

    #[error("invalid policy grants: {0}")]
    Grants(String),

    #[error("policy snapshot lock poisoned: {0}")]
    Poisoned(String),
}
