use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ProblemError, Result};

/// Metadata of one statement language (`problem.<lang>.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementMeta {
    pub title: String,
    /// Present only on the original statement.
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub translator: Option<String>,
    #[serde(default)]
    pub translator_email: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
}

impl StatementMeta {
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let meta: StatementMeta =
            toml::from_str(content).map_err(|e| ProblemError::schema(path, e.message()))?;
        if meta.title.trim().is_empty() {
            return Err(ProblemError::schema(path, "title must not be empty"));
        }
        Ok(meta)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ProblemError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    pub fn is_original(&self) -> bool {
        self.author.is_some()
    }
}

/// Bundle-level metadata (`problem.toml`), written once the problem is
/// published on the judge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemInfo {
    #[serde(default)]
    pub problem_nm: Option<String>,
    #[serde(default)]
    pub passcode: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl ProblemInfo {
    pub const FILE: &'static str = "problem.toml";

    /// Load `problem.toml` from `dir`, or defaults when it is absent.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(Self::FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ProblemError::Io {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ProblemError::schema(&path, e.message()))
    }
}
