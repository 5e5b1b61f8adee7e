//! Error taxonomy for the packaging pipeline.
//!
//! Every failure is fatal: the pipeline stops at the first error and leaves
//! whatever is on disk in place for inspection.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or contradictory configuration, e.g. querying setup.py
    /// metadata before the virtualenv exists.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required input file is missing (setup.py, requirements file,
    /// an extra path).
    #[error("{0}")]
    MissingArtifact(String),

    /// An external tool exited non-zero.
    #[error("`{program}` failed with exit code {code} (args: {args:?})")]
    CommandFailed {
        program: String,
        args: Vec<String>,
        code: i32,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
