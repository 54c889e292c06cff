use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

use crate::cli::{load_bundle, load_config};
use crate::problem::AbstractProblem;

const BASE_PATTERNS: &[&str] = &[
    r"\.exe$",
    r"\.out$",
    r"\.pyc$",
    r"\.class$",
    r"\.o$",
    r"\.hi$",
    r"~$",
    r"^__pycache__$",
];

/// Expected outputs are only removed on request.
const EXTENDED_PATTERNS: &[&str] = &[r"\.cor$"];

pub fn run(path: String, config_path: Option<String>, all: bool, force: bool) -> Result<()> {
    let config = load_config(config_path, None, None)?;
    let bundle = load_bundle(&path, &config)?;

    let targets = collect_targets(&bundle, &config.build.work_prefix, all)?;
    if targets.is_empty() {
        println!("✅ No files to remove");
        return Ok(());
    }

    println!("🧹 The following {} file(s) match:", targets.len());
    for target in &targets {
        let shown = target.strip_prefix(&bundle.directory).unwrap_or(target);
        println!("   {}", shown.display());
    }

    if !force {
        println!("\nRun again with --force to remove them.");
        return Ok(());
    }

    let removed = remove_targets(&targets);
    println!("✅ Removed {} of {} file(s)", removed, targets.len());
    Ok(())
}

fn clean_pattern(work_prefix: &str, all: bool) -> Result<Regex> {
    let prefix = format!("^{}-", regex::escape(work_prefix));
    let mut patterns: Vec<&str> = vec![prefix.as_str()];
    patterns.extend(BASE_PATTERNS);
    if all {
        patterns.extend(EXTENDED_PATTERNS);
    }
    Regex::new(&patterns.join("|")).context("Invalid clean pattern")
}

/// Matching entries of the bundle directory and every language directory,
/// sorted and deduplicated.
pub fn collect_targets(bundle: &AbstractProblem, work_prefix: &str, all: bool) -> Result<Vec<PathBuf>> {
    let pattern = clean_pattern(work_prefix, all)?;

    let mut directories: BTreeSet<PathBuf> = bundle
        .problems
        .values()
        .map(|p| p.directory.clone())
        .collect();
    directories.insert(bundle.directory.clone());

    let mut targets = BTreeSet::new();
    for directory in directories {
        let entries = fs::read_dir(&directory)
            .with_context(|| format!("Could not read directory {}", directory.display()))?;
        for entry in entries.flatten() {
            if pattern.is_match(&entry.file_name().to_string_lossy()) {
                targets.insert(entry.path());
            }
        }
    }
    Ok(targets.into_iter().collect())
}

/// Remove every target, logging failures. Returns how many were removed.
fn remove_targets(targets: &[PathBuf]) -> usize {
    let mut removed = 0;
    for target in targets {
        let result = if target.is_dir() {
            fs::remove_dir_all(target)
        } else {
            fs::remove_file(target)
        };
        match result {
            Ok(()) => {
                info!("Removed {}", target.display());
                removed += 1;
            }
            Err(e) => error!("Could not remove {}: {}", target.display(), e),
        }
    }
    removed
}
