//! Build & verification pipeline.
//!
//! For a `std` problem: build the golden solution, run it on every testcase
//! to produce the expected outputs, then build and judge every other
//! solution against them. Game and quiz bundles delegate to [`game`] or do
//! nothing.

pub mod game;
pub mod pool;
pub mod report;

pub use report::{
    CandidateOutcome, GenerationReport, MakeSummary, TestcaseResult, VerificationReport, Verdict,
};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::compilers::{Compiler, Registry};
use crate::config::BuildConfig;
use crate::detector;
use crate::error::{IoContext, ProblemError, Result};
use crate::problem::{AbstractProblem, HandlerFamily, Problem, ProblemType, SourceModifier};
use crate::util;

/// Image written by graphic solutions in place of standard output.
pub const GRAPHIC_OUTPUT: &str = "output.png";

/// Renders statements once the solutions are built. Typesetting lives
/// outside this crate; implementations wrap whatever tool does it.
pub trait StatementRenderer: Send + Sync {
    fn render(&self, problem: &Problem) -> anyhow::Result<Vec<PathBuf>>;
}

/// Phases of `make` that can be requested on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MakeTask {
    /// Build the golden solution.
    Exe,
    /// Build the golden solution and write the expected outputs.
    Cor,
    /// Judge the other solutions against the existing expected outputs.
    Verify,
    All,
}

impl FromStr for MakeTask {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "exe" => Ok(MakeTask::Exe),
            "cor" => Ok(MakeTask::Cor),
            "verify" => Ok(MakeTask::Verify),
            "all" => Ok(MakeTask::All),
            _ => anyhow::bail!("Unknown task: {} (expected exe, cor, verify or all)", s),
        }
    }
}

impl fmt::Display for MakeTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MakeTask::Exe => write!(f, "exe"),
            MakeTask::Cor => write!(f, "cor"),
            MakeTask::Verify => write!(f, "verify"),
            MakeTask::All => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MakerOptions {
    pub work_prefix: String,
    pub jobs: usize,
    pub tasks: Vec<MakeTask>,
}

impl Default for MakerOptions {
    fn default() -> Self {
        Self::from_config(&BuildConfig::default())
    }
}

impl MakerOptions {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            work_prefix: config.work_prefix.clone(),
            jobs: config.get_jobs(),
            tasks: vec![MakeTask::All],
        }
    }

    pub fn with_tasks(mut self, tasks: Vec<MakeTask>) -> Self {
        if !tasks.is_empty() {
            self.tasks = tasks;
        }
        self
    }

    pub fn should_make(&self, task: MakeTask) -> bool {
        self.tasks.contains(&MakeTask::All) || self.tasks.contains(&task)
    }
}

/// Drives one [`Problem`] directory through the pipeline.
pub struct Maker<'a> {
    problem: &'a Problem,
    registry: &'a Registry,
    options: MakerOptions,
    renderer: Option<&'a dyn StatementRenderer>,
}

impl<'a> Maker<'a> {
    pub fn new(problem: &'a Problem, registry: &'a Registry, options: MakerOptions) -> Self {
        Self {
            problem,
            registry,
            options,
            renderer: None,
        }
    }

    pub fn with_renderer(mut self, renderer: &'a dyn StatementRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    fn directory(&self) -> &Path {
        &self.problem.directory
    }

    /// `<prefix>-<file>`
    pub fn working_name(&self, file: &str) -> String {
        format!("{}-{}", self.options.work_prefix, file)
    }

    /// `<prefix>-<testcase>.<ext>.out`
    pub fn candidate_output(&self, testcase: &str, extension: &str) -> String {
        format!("{}-{}.{}.out", self.options.work_prefix, testcase, extension)
    }

    /// Graphic runs all write the same image name, so they cannot overlap.
    fn effective_jobs(&self) -> usize {
        if self.problem.handler.family == HandlerFamily::Graphic {
            1
        } else {
            self.options.jobs
        }
    }

    /// File name of the golden solution in the problem directory.
    pub fn golden_solution(&self) -> Result<String> {
        let handler = &self.problem.handler;
        let name = if handler.family == HandlerFamily::Circuits {
            "solution.v".to_string()
        } else if let Some(id) = handler.forced_compiler() {
            format!("solution.{}", self.registry.by_id(id)?.extension())
        } else {
            let language = handler.solution_language();
            let extension = detector::proglang_extension(language).ok_or_else(|| {
                ProblemError::UnknownCompiler(format!("no extension known for language '{}'", language))
            })?;
            format!("solution.{}", extension)
        };

        let path = self.directory().join(&name);
        if !path.is_file() {
            return Err(ProblemError::Io {
                path,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "golden solution not found"),
            });
        }
        Ok(name)
    }

    /// Copy `solution` to its working name and build it according to the
    /// source modifier. Returns the working name, which is what `execute`
    /// expects as its source path.
    pub fn build(&self, compiler: &dyn Compiler, solution: &str) -> Result<String> {
        let directory = self.directory();
        let working = self.working_name(solution);
        info!("Copying {} to {}", solution, working);
        fs::copy(directory.join(solution), directory.join(&working)).at(&directory.join(solution))?;

        let handler = &self.problem.handler;
        info!(
            "Compiling {} with {} ({})",
            working,
            compiler.name(),
            handler.source_modifier
        );
        let artifact = match handler.source_modifier {
            SourceModifier::None => compiler.compile_normal(handler, directory, &working)?,
            SourceModifier::NoMain | SourceModifier::Structs => {
                compiler.compile_with_main(handler, directory, &working)?
            }
        };

        if !directory.join(&artifact).exists() {
            return Err(ProblemError::MissingArtifact {
                source_path: working,
                artifact,
            });
        }
        info!("Compiled {} to {}", working, artifact);
        Ok(working)
    }

    /// Resolve, probe and build the golden solution. Every failure here is
    /// fatal: there is nothing to compare against without it.
    pub fn make_golden_executable(&self) -> Result<(Box<dyn Compiler>, String)> {
        let golden = self.golden_solution()?;
        let compiler = self.registry.select(&self.problem.handler, &golden)?;
        if !compiler.available() {
            return Err(ProblemError::ToolchainUnavailable {
                compiler: compiler.id().to_string(),
                tool: compiler.tool().to_string(),
            });
        }
        info!("Golden solution {} with {}", golden, compiler.name());
        let working = self.build(compiler.as_ref(), &golden)?;
        Ok((compiler, working))
    }

    /// Run one testcase into `output`. Only execution is judged here, so the
    /// verdict is either accepted or an execution error.
    pub fn run_testcase(
        &self,
        compiler: &dyn Compiler,
        source: &str,
        testcase: &str,
        output: &str,
    ) -> TestcaseResult {
        let directory = self.directory();
        let input = Problem::input_file(testcase);

        let start = Instant::now();
        let mut outcome = compiler.execute(&self.problem.handler, directory, source, &input, output);
        let time = start.elapsed();

        if outcome.is_ok() && self.problem.handler.family == HandlerFamily::Graphic {
            let image = directory.join(GRAPHIC_OUTPUT);
            if image.is_file() {
                outcome = fs::rename(&image, directory.join(output)).at(&image);
            }
        }

        let verdict = match outcome {
            Ok(()) => Verdict::Accepted,
            Err(e) => {
                error!("Execution failed for testcase '{}': {}", testcase, e);
                Verdict::ExecutionError
            }
        };

        TestcaseResult {
            testcase: testcase.to_string(),
            time,
            input_size: util::file_size(&directory.join(&input)),
            output_size: util::file_size(&directory.join(output)),
            verdict,
        }
    }

    /// Run the golden build on every testcase, writing `<testcase>.cor`.
    /// Failed testcases are recorded and the rest still run; outputs already
    /// written are left in place.
    pub fn make_expected_outputs(&self, compiler: &dyn Compiler, source: &str) -> GenerationReport {
        info!(
            "Making expected outputs for {} testcase(s) with {}",
            self.problem.testcases.len(),
            compiler.name()
        );
        let results = pool::run_bounded(&self.problem.testcases, self.effective_jobs(), |testcase| {
            self.run_testcase(compiler, source, testcase, &Problem::expected_file(testcase))
        });
        GenerationReport {
            solution: source.to_string(),
            compiler: compiler.id().to_string(),
            results,
        }
    }

    fn judge(&self, compiler: &dyn Compiler, source: &str, testcase: &str) -> TestcaseResult {
        let output = self.candidate_output(testcase, compiler.extension());
        let mut result = self.run_testcase(compiler, source, testcase, &output);
        if result.verdict == Verdict::ExecutionError {
            return result;
        }

        let expected = self.directory().join(Problem::expected_file(testcase));
        result.verdict = match util::files_are_equal(&self.directory().join(&output), &expected) {
            Ok(true) => Verdict::Accepted,
            Ok(false) => Verdict::WrongAnswer,
            Err(e) => {
                error!("Cannot compare {} with {}: {}", output, expected.display(), e);
                Verdict::WrongAnswer
            }
        };
        result
    }

    /// Build `solution` and judge it on every testcase. Never fails: an
    /// unusable toolchain yields `Skipped`, a failed build yields `Failed`.
    pub fn verify_candidate(&self, solution: &str) -> CandidateOutcome {
        let compiler = match self.registry.select_candidate(&self.problem.handler, solution) {
            Ok(compiler) => compiler,
            Err(e) => {
                warn!("Skipping {}: {}", solution, e);
                return CandidateOutcome::Skipped {
                    solution: solution.to_string(),
                    reason: e.to_string(),
                };
            }
        };
        if !compiler.available() {
            let reason = format!("{} is not available ({} not found)", compiler.id(), compiler.tool());
            warn!("Skipping {}: {}", solution, reason);
            return CandidateOutcome::Skipped {
                solution: solution.to_string(),
                reason,
            };
        }

        info!("Verifying {} with {}", solution, compiler.name());
        let source = match self.build(compiler.as_ref(), solution) {
            Ok(source) => source,
            Err(e) => {
                error!("{}", e);
                return CandidateOutcome::Failed {
                    solution: solution.to_string(),
                    error: e.to_string(),
                };
            }
        };

        let results = pool::run_bounded(&self.problem.testcases, self.effective_jobs(), |testcase| {
            self.judge(compiler.as_ref(), &source, testcase)
        });
        let report = VerificationReport {
            solution: solution.to_string(),
            compiler: compiler.id().to_string(),
            results,
        };
        if report.errors() == 0 {
            info!("{}: all {} testcase(s) passed", solution, report.results.len());
        } else {
            warn!("{}: {} testcase(s) failed", solution, report.errors());
        }
        CandidateOutcome::Verified(report)
    }

    /// Verify every solution file except `golden`, one after the other.
    pub fn check_solutions(&self, golden: &str) -> Vec<CandidateOutcome> {
        self.problem
            .solutions()
            .iter()
            .filter(|solution| solution.as_str() != golden)
            .map(|solution| self.verify_candidate(solution))
            .collect()
    }

    /// The `std` pipeline, limited to the selected tasks. Build errors of the
    /// golden solution are returned as `Err`; testcase failures are in the
    /// summary, see [`MakeSummary::check`].
    pub fn make(&self) -> Result<MakeSummary> {
        let mut summary = MakeSummary {
            directory: self.directory().display().to_string(),
            ..MakeSummary::default()
        };
        let options = &self.options;

        if options.should_make(MakeTask::Exe) || options.should_make(MakeTask::Cor) {
            let (compiler, working) = self.make_golden_executable()?;
            if options.should_make(MakeTask::Cor) {
                let generation = self.make_expected_outputs(compiler.as_ref(), &working);
                let failed = generation.errors();
                summary.generation = Some(generation);
                if failed > 0 {
                    error!("{} error(s) occurred while making expected outputs", failed);
                    return Ok(summary);
                }
            }
        }

        if options.should_make(MakeTask::Verify) {
            let golden = self.golden_solution()?;
            summary.candidates = self.check_solutions(&golden);
        }

        if !options.should_make(MakeTask::All) {
            return Ok(summary);
        }
        if let Some(renderer) = self.renderer {
            match renderer.render(self.problem) {
                Ok(files) => {
                    for file in files {
                        info!("Rendered {}", file.display());
                    }
                }
                Err(e) => warn!("Statement rendering failed: {}", e),
            }
        }

        Ok(summary)
    }
}

impl MakeSummary {
    /// Fail with the aggregate count once all detail has been shown.
    pub fn check(&self) -> Result<()> {
        if let Some(generation) = &self.generation {
            let failed = generation.errors();
            if failed > 0 {
                return Err(ProblemError::ExpectedOutputs { failed });
            }
        }
        match self.failures() {
            0 => Ok(()),
            failed => Err(ProblemError::Verification { failed }),
        }
    }
}

/// Directories of a bundle that hold something to build: the bundle itself
/// when flat, every language directory when shallow.
fn build_targets(bundle: &AbstractProblem) -> Vec<&Problem> {
    match bundle.structure {
        detector::Structure::Flat => vec![bundle.original_problem()],
        detector::Structure::Shallow => bundle.problems.values().collect(),
    }
}

/// What `make` did in one directory of a bundle. A fatal error there does
/// not stop the sibling directories.
#[derive(Debug)]
pub struct DirectoryOutcome {
    pub directory: PathBuf,
    pub result: Result<MakeSummary>,
}

impl DirectoryOutcome {
    /// The per-directory error: the fatal one, or the aggregate count.
    pub fn into_error(self) -> Option<ProblemError> {
        match self.result {
            Ok(summary) => summary.check().err(),
            Err(e) => Some(e),
        }
    }
}

fn make_directory(
    problem: &Problem,
    problem_type: ProblemType,
    registry: &Registry,
    options: &MakerOptions,
    renderer: Option<&dyn StatementRenderer>,
) -> Result<MakeSummary> {
    if problem_type == ProblemType::Game {
        if options.should_make(MakeTask::Exe) {
            game::make_game(registry.runner().as_ref(), problem)?;
        }
        return Ok(MakeSummary {
            directory: problem.directory.display().to_string(),
            ..MakeSummary::default()
        });
    }

    let mut maker = Maker::new(problem, registry, options.clone());
    if let Some(renderer) = renderer {
        maker = maker.with_renderer(renderer);
    }
    maker.make()
}

/// Make every buildable directory of a bundle according to its type. Each
/// directory gets its own outcome, in language order.
pub fn make_bundle(
    bundle: &AbstractProblem,
    registry: &Registry,
    options: &MakerOptions,
    renderer: Option<&dyn StatementRenderer>,
) -> Vec<DirectoryOutcome> {
    if bundle.problem_type == ProblemType::Quiz {
        info!("Quiz problems have nothing to build");
        return Vec::new();
    }

    build_targets(bundle)
        .into_iter()
        .map(|problem| {
            info!("Making {}", problem.directory.display());
            let result = make_directory(problem, bundle.problem_type, registry, options, renderer);
            if let Err(ref e) = result {
                error!("Making {} failed: {}", problem.directory.display(), e);
            }
            DirectoryOutcome {
                directory: problem.directory.clone(),
                result,
            }
        })
        .collect()
}
