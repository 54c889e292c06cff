//! Problem model: one `Problem` per statement language, aggregated into an
//! `AbstractProblem` bundle.

pub mod bundle;
pub mod handler;
pub mod statement;

pub use bundle::{AbstractProblem, HandlerMismatchPolicy, ProblemType};
pub use handler::{CompilerSelection, GameConfig, HandlerConfig, HandlerFamily, SourceModifier};
pub use statement::{ProblemInfo, StatementMeta};

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::detector::{self, Language, HANDLER_FILE};
use crate::error::{ProblemError, Result};

pub const INPUT_SUFFIX: &str = ".inp";
pub const EXPECTED_SUFFIX: &str = ".cor";

/// One statement language of a problem, with the handler and testcases found
/// in its directory.
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    pub directory: PathBuf,
    pub language: Language,
    pub statement: StatementMeta,
    pub handler: HandlerConfig,
    /// Input-file basenames, deduplicated and sorted.
    pub testcases: Vec<String>,
}

impl Problem {
    /// Load the problem of `language` stored in `directory`.
    pub fn load(directory: &Path, language: Language) -> Result<Self> {
        let statement = StatementMeta::load(&directory.join(language.statement_file()))?;
        let handler = HandlerConfig::load(&directory.join(HANDLER_FILE))?;
        let testcases = discover_testcases(directory)?;
        debug!(
            "Loaded {} from {} ({} testcases)",
            language.statement_file(),
            directory.display(),
            testcases.len()
        );

        Ok(Self {
            directory: directory.to_path_buf(),
            language,
            statement,
            handler,
            testcases,
        })
    }

    pub fn input_file(testcase: &str) -> String {
        format!("{}{}", testcase, INPUT_SUFFIX)
    }

    pub fn expected_file(testcase: &str) -> String {
        format!("{}{}", testcase, EXPECTED_SUFFIX)
    }

    /// Files named `solution.<ext>` for every recognized extension, sorted.
    pub fn solutions(&self) -> Vec<String> {
        let mut solutions: Vec<String> = detector::proglang_extensions()
            .map(|ext| format!("solution.{}", ext))
            .filter(|name| self.directory.join(name).is_file())
            .collect();
        solutions.sort();
        solutions
    }
}

/// Testcase names derived from the `*.inp` files of `directory`.
pub fn discover_testcases(directory: &Path) -> Result<Vec<String>> {
    let escaped = glob::Pattern::escape(&directory.to_string_lossy());
    let pattern = format!("{}/*{}", escaped, INPUT_SUFFIX);
    let entries =
        glob::glob(&pattern).map_err(|e| ProblemError::schema(directory, e.to_string()))?;

    let mut names = BTreeSet::new();
    for entry in entries.flatten() {
        if !entry.is_file() {
            continue;
        }
        if let Some(name) = entry
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(INPUT_SUFFIX))
        {
            names.insert(name.to_string());
        }
    }
    Ok(names.into_iter().collect())
}

/// Free-function form of [`Problem::load`].
pub fn load_problem(directory: &Path, language: Language) -> Result<Problem> {
    Problem::load(directory, language)
}
