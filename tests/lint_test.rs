//! Linting problem directories through the public API
//! Tests issue severities for complete, incomplete and shallow bundles.

use anyhow::Result;
use std::fs;
use tempfile::TempDir;

use pbmkit::lint::{count_errors, is_valid_testcase_name, ProblemLinter, Severity};

#[test]
fn test_linter_passes_complete_problem() -> Result<()> {
    let tmp = TempDir::new()?;
    let dir = tmp.path();
    fs::write(dir.join("handler.toml"), "handler = \"std\"\nsolution = \"Python3\"\n")?;
    fs::write(dir.join("problem.en.toml"), "title = \"Twice\"\nauthor = \"Ada\"\n")?;
    fs::write(dir.join("problem.toml"), "problem_nm = \"P12345\"\n")?;
    fs::write(dir.join("solution.py"), "print(2 * int(input()))\n")?;
    fs::write(dir.join("sample-1.inp"), "3\n")?;
    fs::write(dir.join("sample-1.cor"), "6\n")?;

    let issues = ProblemLinter::new().lint(dir)?;
    assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
    Ok(())
}

#[test]
fn test_linter_reports_empty_directory() -> Result<()> {
    let tmp = TempDir::new()?;
    let issues = ProblemLinter::new().lint(tmp.path())?;

    assert!(count_errors(&issues) >= 1);
    assert!(issues
        .iter()
        .any(|i| i.category == "MISSING_HANDLER" && i.severity == Severity::Error));
    Ok(())
}

#[test]
fn test_linter_shallow_bundle() -> Result<()> {
    let tmp = TempDir::new()?;
    for (code, statement) in [
        ("en", "title = \"Twice\"\nauthor = \"Ada\"\n"),
        ("ca", "title = \"Doble\"\ntranslator = \"Pau\"\n"),
    ] {
        let sub = tmp.path().join(code);
        fs::create_dir(&sub)?;
        fs::write(sub.join("handler.toml"), "handler = \"quiz\"\n")?;
        fs::write(sub.join(format!("problem.{}.toml", code)), statement)?;
    }

    let issues = ProblemLinter::new().lint(tmp.path())?;
    assert_eq!(count_errors(&issues), 0);
    let translation = issues
        .iter()
        .find(|i| i.category == "TRANSLATION_ORIGINAL_LANGUAGE")
        .expect("translation warning");
    assert_eq!(translation.file.as_deref(), Some("ca/problem.ca.toml"));
    Ok(())
}

#[test]
fn test_testcase_names() {
    assert!(is_valid_testcase_name("sample-1"));
    assert!(is_valid_testcase_name("hidden_02"));
    assert!(!is_valid_testcase_name("big test"));
    assert!(!is_valid_testcase_name("a.b"));
    assert!(!is_valid_testcase_name(""));
}
