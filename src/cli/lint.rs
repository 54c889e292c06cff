use std::path::Path;

use anyhow::{bail, Result};

use crate::lint::{count_errors, ProblemLinter};

pub fn run(path: &str) -> Result<()> {
    let directory = Path::new(path);
    if !directory.exists() {
        bail!("Directory not found: {}", path);
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", path);
    }

    let linter = ProblemLinter::new();
    let issues = linter.lint(directory)?;

    linter.print_issues(&issues);

    let errors = count_errors(&issues);
    if errors > 0 {
        bail!("{} lint error(s) found", errors);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_run_directory_not_found() {
        let result = run("/tmp/nonexistent-lint-dir-xyz.pbm");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Directory not found"));
    }

    #[test]
    fn test_run_path_is_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("handler.toml");
        fs::write(&file, "").unwrap();
        let result = run(file.to_str().unwrap());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_run_valid_problem() {
        let dir = tempfile::TempDir::new().unwrap();
        let p = dir.path();
        fs::write(p.join("handler.toml"), "handler = \"std\"\n").unwrap();
        fs::write(p.join("problem.en.toml"), "title = \"Sum\"\nauthor = \"Ada\"\n").unwrap();
        fs::write(p.join("solution.cc"), "int main() {}\n").unwrap();
        fs::write(p.join("sample1.inp"), "1 2\n").unwrap();
        fs::write(p.join("sample1.cor"), "3\n").unwrap();
        fs::write(p.join("problem.toml"), "problem_nm = \"P00001\"\n").unwrap();

        assert!(run(p.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_run_with_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let p = dir.path();
        fs::write(p.join("handler.toml"), "handler = \"std\"\n").unwrap();
        fs::write(p.join("problem.en.toml"), "title = \"Sum\"\nauthor = \"Ada\"\n").unwrap();

        let result = run(p.to_str().unwrap());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("lint error(s) found"));
    }
}
