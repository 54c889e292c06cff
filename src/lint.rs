use anyhow::Result;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::detector::{self, Language, Structure, HANDLER_FILE};
use crate::problem::{
    discover_testcases, HandlerConfig, HandlerFamily, ProblemInfo, StatementMeta, EXPECTED_SUFFIX,
};

#[derive(Debug, Clone)]
pub struct LintIssue {
    pub severity: Severity,
    pub category: String,
    pub message: String,
    /// File the issue is about, relative to the linted directory.
    pub file: Option<String>,
    pub suggestion: Option<String>,
}

impl LintIssue {
    fn new(severity: Severity, category: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            category: category.to_string(),
            message: message.into(),
            file: None,
            suggestion: None,
        }
    }

    fn error(category: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, category, message)
    }

    fn warning(category: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, category, message)
    }

    fn info(category: &str, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, category, message)
    }

    fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Error, // Must fix
    Warning, // Should fix
    Info,    // Nice to have
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

const TESTCASE_NAME_PATTERN: &str = r"^[A-Za-z0-9_-]+$";

/// Whether `name` uses only letters, digits, dashes and underscores.
pub fn is_valid_testcase_name(name: &str) -> bool {
    Regex::new(TESTCASE_NAME_PATTERN)
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}

/// Static checks of a problem directory. Nothing is built or run.
pub struct ProblemLinter;

impl Default for ProblemLinter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProblemLinter {
    pub fn new() -> Self {
        Self
    }

    /// Lint a bundle or a single language directory. In a shallow bundle
    /// every language subdirectory is linted and issue files are prefixed
    /// with the subdirectory name.
    pub fn lint(&self, directory: &Path) -> Result<Vec<LintIssue>> {
        if detector::detect_structure(directory) == Structure::Shallow {
            let language_dirs: Vec<Language> = Language::ALL
                .into_iter()
                .filter(|l| directory.join(l.code()).is_dir())
                .collect();
            if !language_dirs.is_empty() {
                let mut issues = self.check_bundle_info(directory);
                for language in language_dirs {
                    let sub = directory.join(language.code());
                    issues.extend(self.lint_directory(&sub)?.into_iter().map(|mut issue| {
                        issue.file = Some(match issue.file {
                            Some(file) => format!("{}/{}", language.code(), file),
                            None => language.code().to_string(),
                        });
                        issue
                    }));
                }
                return Ok(issues);
            }
        }
        let mut issues = self.check_bundle_info(directory);
        issues.extend(self.lint_directory(directory)?);
        Ok(issues)
    }

    fn lint_directory(&self, directory: &Path) -> Result<Vec<LintIssue>> {
        let mut issues = Vec::new();
        let handler = self.check_handler(directory, &mut issues);
        issues.extend(self.check_statements(directory));

        let needs_tests = matches!(
            handler.map(|h| h.family),
            Some(HandlerFamily::Std) | Some(HandlerFamily::Graphic)
        );
        if needs_tests {
            issues.extend(self.check_solutions(directory));
            issues.extend(self.check_testcases(directory)?);
        }
        Ok(issues)
    }

    fn check_bundle_info(&self, directory: &Path) -> Vec<LintIssue> {
        if !directory.join(ProblemInfo::FILE).is_file() {
            return vec![LintIssue::info(
                "PROBLEM_INFO",
                format!("No {}; it is created when the problem is uploaded", ProblemInfo::FILE),
            )];
        }
        match ProblemInfo::load_or_default(directory) {
            Ok(_) => Vec::new(),
            Err(e) => vec![LintIssue::error("PROBLEM_INFO_SCHEMA", e.to_string()).file(ProblemInfo::FILE)],
        }
    }

    fn check_handler(&self, directory: &Path, issues: &mut Vec<LintIssue>) -> Option<HandlerConfig> {
        let path = directory.join(HANDLER_FILE);
        if !path.is_file() {
            issues.push(
                LintIssue::error("MISSING_HANDLER", format!("{} is required", HANDLER_FILE))
                    .file(HANDLER_FILE)
                    .suggest("Create it with at least: handler = \"std\""),
            );
            return None;
        }
        match HandlerConfig::load(&path) {
            Ok(handler) => Some(handler),
            Err(e) => {
                issues.push(LintIssue::error("HANDLER_SCHEMA", e.to_string()).file(HANDLER_FILE));
                None
            }
        }
    }

    fn check_statements(&self, directory: &Path) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let mut found = 0;
        let mut originals = 0;

        for language in Language::ALL {
            let file = language.statement_file();
            let path = directory.join(&file);
            if !path.is_file() {
                continue;
            }
            found += 1;
            match StatementMeta::load(&path) {
                Ok(meta) => {
                    if meta.is_original() {
                        originals += 1;
                    }
                    let is_translation = meta.translator.is_some();
                    let names_original = meta
                        .original_language
                        .as_deref()
                        .is_some_and(|l| !l.trim().is_empty());
                    if is_translation && !names_original {
                        issues.push(
                            LintIssue::warning(
                                "TRANSLATION_ORIGINAL_LANGUAGE",
                                format!("{} is a translation and should set original_language", file),
                            )
                            .file(file),
                        );
                    }
                }
                Err(e) => issues.push(LintIssue::error("STATEMENT_SCHEMA", e.to_string()).file(file)),
            }
        }

        if found == 0 {
            issues.push(
                LintIssue::error("NO_STATEMENT", "At least one problem.<lang>.toml is required")
                    .suggest("e.g. problem.en.toml with title and author"),
            );
        } else if originals == 0 && issues.iter().all(|i| i.category != "STATEMENT_SCHEMA") {
            // in a shallow bundle the author may live in another language directory
            issues.push(LintIssue::info(
                "NO_ORIGINAL_LANGUAGE",
                "No statement here carries an author field",
            ));
        }
        issues
    }

    fn check_solutions(&self, directory: &Path) -> Vec<LintIssue> {
        let any = detector::proglang_extensions()
            .any(|ext| directory.join(format!("solution.{}", ext)).is_file());
        if any {
            Vec::new()
        } else {
            vec![LintIssue::error(
                "NO_SOLUTION",
                "At least one solution file (e.g. solution.cc) is required",
            )]
        }
    }

    fn check_testcases(&self, directory: &Path) -> Result<Vec<LintIssue>> {
        let mut issues = Vec::new();
        let inputs: BTreeSet<String> = discover_testcases(directory)?
            .into_iter()
            .collect();
        let expected = expected_names(directory);

        if inputs.is_empty() {
            issues.push(LintIssue::error(
                "NO_TESTCASES",
                "At least one test case (.inp file) is required",
            ));
        }

        for name in &inputs {
            if !is_valid_testcase_name(name) {
                issues.push(naming_issue(name, &format!("{}.inp", name)));
            }
            if !expected.contains(name) {
                issues.push(
                    LintIssue::warning("MISSING_COR", format!("{}.inp has no matching .cor file", name))
                        .file(format!("{}.inp", name))
                        .suggest("Run `pbmkit make` to generate the expected outputs"),
                );
            }
        }

        for name in &expected {
            if !is_valid_testcase_name(name) && !inputs.contains(name) {
                issues.push(naming_issue(name, &format!("{}.cor", name)));
            }
            if !inputs.contains(name) {
                issues.push(
                    LintIssue::warning("ORPHAN_COR", format!("{}.cor has no matching .inp file", name))
                        .file(format!("{}.cor", name)),
                );
            }
        }
        Ok(issues)
    }

    /// Print issues in a human-readable format
    pub fn print_issues(&self, issues: &[LintIssue]) {
        if issues.is_empty() {
            println!("✅ No linting issues found!");
            return;
        }

        println!("\n📋 Problem Linting Results:\n");

        let errors: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .collect();
        let warnings: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .collect();
        let infos: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == Severity::Info)
            .collect();

        for (title, group) in [("❌ Errors", &errors), ("⚠️  Warnings", &warnings), ("ℹ️  Info", &infos)] {
            if group.is_empty() {
                continue;
            }
            println!("{} ({}):", title, group.len());
            for issue in group.iter() {
                match &issue.file {
                    Some(file) => println!("   • [{}] {}: {}", issue.category, file, issue.message),
                    None => println!("   • [{}] {}", issue.category, issue.message),
                }
                if let Some(suggestion) = &issue.suggestion {
                    println!("     💡 {}", suggestion);
                }
            }
            println!();
        }

        println!(
            "Summary: {} errors, {} warnings, {} info",
            errors.len(),
            warnings.len(),
            infos.len()
        );
    }
}

fn naming_issue(name: &str, file: &str) -> LintIssue {
    LintIssue::warning(
        "TESTCASE_NAMING",
        format!(
            "Test case name \"{}\" should use only letters, digits, dashes and underscores",
            name
        ),
    )
    .file(file)
}

fn expected_names(directory: &Path) -> BTreeSet<String> {
    let Ok(entries) = std::fs::read_dir(directory) else {
        return BTreeSet::new();
    };
    entries
        .flatten()
        .filter_map(|e| {
            e.file_name()
                .to_str()
                .and_then(|n| n.strip_suffix(EXPECTED_SUFFIX))
                .map(str::to_string)
        })
        .collect()
}

/// Number of error-severity issues.
pub fn count_errors(issues: &[LintIssue]) -> usize {
    issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count()
}
