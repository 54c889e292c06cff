//! Game problems ship their own makefiles; building them means running
//! `make all` and refreshing the files published to players.

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::compilers::{run_build, CommandRunner, Invocation};
use crate::error::{IoContext, ProblemError, Result};
use crate::problem::Problem;

pub const RUNNER_DIR: &str = "Runner";
pub const DOC_DIR: &str = "Doc";
pub const PUBLIC_DIR: &str = "Public";

/// Runner files given to players.
const PUBLIC_PATTERNS: &[&str] = &["README.txt", "README.md", "Makefile", "*.cc", "*.hh", "*.cnf"];

fn make_all(runner: &dyn CommandRunner, directory: &Path) -> Result<()> {
    info!("Running make all in {}", directory.display());
    let invocation = Invocation::new("make", directory).arg("all");
    run_build(runner, &invocation, &directory.display().to_string())
}

/// Whether a `Runner/` file belongs in `Public/`.
pub fn is_public(name: &str, hide: &[String]) -> bool {
    if name.starts_with('.') || hide.iter().any(|h| h == name) {
        return false;
    }
    PUBLIC_PATTERNS.iter().any(|pattern| {
        glob::Pattern::new(pattern)
            .map(|p| p.matches(name))
            .unwrap_or(false)
    })
}

/// Recreate `Public/` from the public files of `Runner/`. Returns the copied
/// names, sorted.
pub fn rebuild_public(directory: &Path, hide: &[String]) -> Result<Vec<String>> {
    let runner_dir = directory.join(RUNNER_DIR);
    let public_dir = directory.join(PUBLIC_DIR);

    if public_dir.exists() {
        fs::remove_dir_all(&public_dir).at(&public_dir)?;
    }
    fs::create_dir_all(&public_dir).at(&public_dir)?;

    let mut copied = Vec::new();
    for entry in fs::read_dir(&runner_dir).at(&runner_dir)? {
        let entry = entry.at(&runner_dir)?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !is_public(&name, hide) {
            debug!("Not publishing {}", name);
            continue;
        }
        fs::copy(entry.path(), public_dir.join(&name)).at(&entry.path())?;
        copied.push(name);
    }
    copied.sort();
    info!("Copied {} file(s) to {}", copied.len(), public_dir.display());
    Ok(copied)
}

pub fn make_game(runner: &dyn CommandRunner, problem: &Problem) -> Result<()> {
    let directory = &problem.directory;
    let runner_dir = directory.join(RUNNER_DIR);
    if !runner_dir.is_dir() {
        return Err(ProblemError::Io {
            path: runner_dir,
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "game runner directory not found"),
        });
    }

    let doc_dir = directory.join(DOC_DIR);
    if doc_dir.is_dir() {
        make_all(runner, &doc_dir)?;
    } else {
        warn!("No {} directory in {}", DOC_DIR, directory.display());
    }
    make_all(runner, &runner_dir)?;

    let hide = problem
        .handler
        .game
        .as_ref()
        .map(|g| g.hide.clone())
        .unwrap_or_default();
    rebuild_public(directory, &hide)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compilers::testing::RecordingRunner;
    use crate::detector::Language;
    use tempfile::TempDir;

    #[test]
    fn test_is_public() {
        let hide = vec!["AIDemo.cc".to_string()];
        assert!(is_public("Board.cc", &hide));
        assert!(is_public("Makefile", &hide));
        assert!(is_public("default.cnf", &hide));
        assert!(!is_public("AIDemo.cc", &hide));
        assert!(!is_public(".Board.cc.swp", &hide));
        assert!(!is_public("Board.o", &hide));
    }

    #[test]
    fn test_make_game() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        fs::write(
            dir.join("handler.toml"),
            "handler = \"game\"\n[game]\nhide = [\"AIDemo.cc\"]\n",
        )
        .unwrap();
        fs::write(dir.join("problem.en.toml"), "title = \"G\"\nauthor = \"A\"\n").unwrap();
        fs::create_dir(dir.join("Runner")).unwrap();
        for name in ["Board.cc", "Board.hh", "AIDemo.cc", "Game.o", "Makefile"] {
            fs::write(dir.join("Runner").join(name), "").unwrap();
        }
        fs::create_dir(dir.join("Public")).unwrap();
        fs::write(dir.join("Public").join("stale.cc"), "").unwrap();

        let problem = Problem::load(dir, Language::English).unwrap();
        let runner = RecordingRunner::new(0);
        make_game(&runner, &problem).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "make");
        assert_eq!(calls[0].cwd, dir.join("Runner"));

        let mut public: Vec<String> = fs::read_dir(dir.join("Public"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        public.sort();
        assert_eq!(public, vec!["Board.cc", "Board.hh", "Makefile"]);
    }

    #[test]
    fn test_make_failure() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("Runner")).unwrap();
        let runner = RecordingRunner::new(2);
        let err = make_all(&runner, &tmp.path().join("Runner")).unwrap_err();
        assert!(matches!(err, ProblemError::Compilation { .. }));
    }
}
