//! Error taxonomy for loading, building and verifying problems.
//!
//! Load-time variants are fatal for the whole operation. Build-time variants
//! are fatal only for the solution being built. `Execution` is recorded per
//! testcase and only surfaces through the aggregate `ExpectedOutputs` and
//! `Verification` counts.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T, E = ProblemError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("schema error in {}: {detail}", path.display())]
    Schema { path: PathBuf, detail: String },

    #[error("{} is not a problem directory (missing .pbm suffix)", .0.display())]
    NotAProblemDirectory(PathBuf),

    #[error("no original statement found in {} (no language carries an author field)", .0.display())]
    NoOriginalLanguage(PathBuf),

    #[error("multiple original statements found in {}: {}", path.display(), languages.join(", "))]
    MultipleOriginalLanguages {
        path: PathBuf,
        languages: Vec<String>,
    },

    #[error("unknown handler '{0}'")]
    UnknownHandler(String),

    #[error("handler of language '{language}' is '{found}' but the original handler is '{expected}'")]
    HandlerMismatch {
        language: String,
        expected: String,
        found: String,
    },

    #[error("unknown compiler: {0}")]
    UnknownCompiler(String),

    #[error("toolchain for {compiler} is not available ({tool} not found)")]
    ToolchainUnavailable { compiler: String, tool: String },

    #[error("compilation failed for {source_path}: {detail}")]
    Compilation { source_path: String, detail: String },

    #[error("{compiler} does not implement {operation}")]
    NotImplemented {
        compiler: String,
        operation: &'static str,
    },

    #[error("compilation of {source_path} did not produce {artifact}")]
    MissingArtifact {
        source_path: String,
        artifact: String,
    },

    #[error("execution failed for {program}: {detail}")]
    Execution { program: String, detail: String },

    #[error("{failed} error(s) occurred while making expected outputs")]
    ExpectedOutputs { failed: usize },

    #[error("{failed} error(s) found while verifying solutions")]
    Verification { failed: usize },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ProblemError {
    pub fn schema(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        ProblemError::Schema {
            path: path.into(),
            detail: detail.to_string(),
        }
    }

    /// True for errors that invalidate the whole problem model.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ProblemError::Schema { .. }
                | ProblemError::NotAProblemDirectory(_)
                | ProblemError::NoOriginalLanguage(_)
                | ProblemError::MultipleOriginalLanguages { .. }
                | ProblemError::UnknownHandler(_)
                | ProblemError::HandlerMismatch { .. }
        )
    }
}

/// Attach the offending path to an `io::Error`.
pub trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::result::Result<T, io::Error> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|source| ProblemError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
