//! Configuration loading from the search path
//! Tests that touch the working directory run serially.

use anyhow::Result;
use pbmkit::config::Config;
use pbmkit::problem::HandlerMismatchPolicy;
use serial_test::serial;
use std::fs;

struct CwdGuard(std::path::PathBuf);

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.0);
    }
}

fn enter(dir: &std::path::Path) -> CwdGuard {
    let guard = CwdGuard(std::env::current_dir().unwrap());
    std::env::set_current_dir(dir).unwrap();
    guard
}

#[test]
fn test_config_has_defaults() -> Result<()> {
    let config = Config::default();

    assert_eq!(config.build.work_prefix, "pbmk");
    assert_eq!(config.build.get_jobs(), 1);
    assert!(config.build.get_timeout().is_none());

    Ok(())
}

#[test]
#[serial]
fn test_config_loaded_from_current_directory() -> Result<()> {
    let tmp = tempfile::TempDir::new()?;
    fs::write(
        tmp.path().join("pbmkit.toml"),
        "[build]\nwork_prefix = \"tmpw\"\njobs = 3\n\n[lint]\nhandler_mismatch = \"error\"\n",
    )?;
    let _guard = enter(tmp.path());

    let config = Config::load_with_path(None)?;
    assert_eq!(config.build.work_prefix, "tmpw");
    assert_eq!(config.build.jobs, 3);
    assert_eq!(
        config.lint.get_handler_mismatch(),
        HandlerMismatchPolicy::Error
    );

    Ok(())
}

#[test]
#[serial]
fn test_invalid_local_config_is_not_fatal() -> Result<()> {
    let tmp = tempfile::TempDir::new()?;
    fs::write(tmp.path().join("pbmkit.toml"), "[build\njobs = ")?;
    let _guard = enter(tmp.path());

    // falls through to the user config or defaults
    let config = Config::load_with_path(None)?;
    assert!(config.build.get_jobs() >= 1);

    Ok(())
}

#[test]
fn test_explicit_config_path() -> Result<()> {
    let tmp = tempfile::TempDir::new()?;
    let path = tmp.path().join("custom.toml");
    fs::write(&path, "[build]\ntimeout = 7\n")?;

    let config = Config::load_with_path(Some(path.to_string_lossy().to_string()))?;
    assert_eq!(config.build.timeout, 7);
    assert_eq!(config.build.work_prefix, "pbmk");

    Ok(())
}

#[test]
fn test_explicit_invalid_config_is_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("bad.toml");
    fs::write(&path, "[build]\njobs = \"many\"\n").unwrap();

    assert!(Config::load_with_path(Some(path.to_string_lossy().to_string())).is_err());
}
