use anyhow::{bail, Context, Result};
use std::str::FromStr;
use tracing::{info, warn};

use crate::cli::{load_bundle, load_config, system_registry};
use crate::detector::Language;
use crate::error::ProblemError;
use crate::pipeline::{CandidateOutcome, Maker, MakerOptions};
use crate::problem::Problem;

/// Verify `programs` (all non-golden solutions when empty) against the
/// expected outputs already present in the problem directory.
#[allow(clippy::too_many_arguments)]
pub fn run(
    directory: String,
    programs: Vec<String>,
    language: Option<String>,
    config_path: Option<String>,
    jobs: Option<usize>,
    timeout: Option<u64>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path, jobs, timeout)?;
    let bundle = load_bundle(&directory, &config)?;

    let language = match language {
        Some(code) => Language::from_str(&code)?,
        None => bundle.original_language,
    };
    let problem = bundle
        .problem(language)
        .with_context(|| format!("No {} statement in {}", language.name(), bundle.directory.display()))?;
    check_expected_outputs(problem);

    let registry = system_registry(&config);
    let maker = Maker::new(problem, &registry, MakerOptions::from_config(&config.build));

    let outcomes: Vec<CandidateOutcome> = if programs.is_empty() {
        let golden = maker.golden_solution()?;
        info!("Verifying every solution except {}", golden);
        maker.check_solutions(&golden)
    } else {
        programs
            .iter()
            .map(|program| {
                if !problem.directory.join(program).is_file() {
                    bail!("File not found: {}", program);
                }
                Ok(maker.verify_candidate(program))
            })
            .collect::<Result<_>>()?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        for outcome in &outcomes {
            println!("{}", outcome.render());
        }
    }

    let failed: usize = outcomes.iter().map(CandidateOutcome::errors).sum();
    if failed > 0 {
        return Err(ProblemError::Verification { failed }.into());
    }
    Ok(())
}

fn check_expected_outputs(problem: &Problem) {
    let missing = problem
        .testcases
        .iter()
        .filter(|t| !problem.directory.join(Problem::expected_file(t)).is_file())
        .count();
    if missing > 0 {
        warn!(
            "{} testcase(s) have no expected output; run `pbmkit make` first",
            missing
        );
    }
}
