use anyhow::{bail, Result};
use serde_json::json;
use tracing::info;

use crate::cli::{load_bundle, load_config, system_registry};
use crate::pipeline::{make_bundle, DirectoryOutcome, MakeTask, MakerOptions};

pub fn run(
    path: String,
    config_path: Option<String>,
    tasks: Vec<MakeTask>,
    jobs: Option<usize>,
    timeout: Option<u64>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path, jobs, timeout)?;
    let bundle = load_bundle(&path, &config)?;
    let registry = system_registry(&config);
    let options = MakerOptions::from_config(&config.build).with_tasks(tasks);

    info!(
        "Making {} ({} job(s), prefix {}, tasks {})",
        bundle.directory.display(),
        options.jobs,
        options.work_prefix,
        options
            .tasks
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    );
    let outcomes = make_bundle(&bundle, &registry, &options, None);
    print_outcomes(&outcomes, json)?;
    fail_on_errors(outcomes)
}

/// Print every directory's detail, failed directories included.
pub fn print_outcomes(outcomes: &[DirectoryOutcome], json: bool) -> Result<()> {
    if json {
        let mut values = Vec::new();
        for outcome in outcomes {
            values.push(match &outcome.result {
                Ok(summary) => serde_json::to_value(summary)?,
                Err(e) => json!({
                    "directory": outcome.directory.display().to_string(),
                    "error": e.to_string(),
                }),
            });
        }
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        for outcome in outcomes {
            match &outcome.result {
                Ok(summary) => println!("{}", summary.render()),
                Err(e) => println!("❌ {}: {}\n", outcome.directory.display(), e),
            }
        }
    }
    Ok(())
}

/// Fail with the aggregate error count once every report has been shown.
fn fail_on_errors(outcomes: Vec<DirectoryOutcome>) -> Result<()> {
    let mut errors: Vec<_> = outcomes
        .into_iter()
        .filter_map(DirectoryOutcome::into_error)
        .collect();
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0).into()),
        n => bail!("make failed in {} directories", n),
    }
}
