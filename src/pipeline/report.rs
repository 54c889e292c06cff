//! Per-testcase results and the tables shown to the operator.

use serde::{Serialize, Serializer};
use std::fmt;
use std::fmt::Write as _;
use std::time::Duration;

use crate::util::{format_bytes, format_duration};

/// Outcome of one testcase run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// Ran cleanly and, when compared, matched byte for byte.
    #[serde(rename = "OK")]
    Accepted,
    /// Ran cleanly but the output differs from the expected one.
    #[serde(rename = "WA")]
    WrongAnswer,
    /// Nonzero exit, crash or timeout.
    #[serde(rename = "EE")]
    ExecutionError,
}

impl Verdict {
    pub fn code(&self) -> &'static str {
        match self {
            Verdict::Accepted => "OK",
            Verdict::WrongAnswer => "WA",
            Verdict::ExecutionError => "EE",
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == Verdict::Accepted
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestcaseResult {
    pub testcase: String,
    /// Wall-clock time of the execution.
    #[serde(rename = "time_ms", serialize_with = "as_millis")]
    pub time: Duration,
    pub input_size: u64,
    pub output_size: u64,
    pub verdict: Verdict,
}

fn render_rows(out: &mut String, results: &[TestcaseResult], with_verdict: bool) {
    let _ = write!(out, "{:<16} {:>10} {:>10} {:>10}", "testcase", "time", "input", "output");
    if with_verdict {
        let _ = write!(out, " {:>7}", "verdict");
    }
    out.push('\n');
    for result in results {
        let _ = write!(
            out,
            "{:<16} {:>10} {:>10} {:>10}",
            result.testcase,
            format_duration(result.time),
            format_bytes(result.input_size),
            format_bytes(result.output_size)
        );
        if with_verdict {
            let _ = write!(out, " {:>7}", result.verdict.code());
        }
        out.push('\n');
    }
}

/// Expected outputs produced by the golden solution.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub solution: String,
    pub compiler: String,
    pub results: Vec<TestcaseResult>,
}

impl GenerationReport {
    pub fn errors(&self) -> usize {
        self.results.iter().filter(|r| !r.verdict.is_ok()).count()
    }

    pub fn render(&self) -> String {
        let mut out = format!("Expected outputs from {} ({})\n", self.solution, self.compiler);
        render_rows(&mut out, &self.results, false);
        out
    }
}

/// One candidate checked against the expected outputs.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub solution: String,
    pub compiler: String,
    pub results: Vec<TestcaseResult>,
}

impl VerificationReport {
    pub fn errors(&self) -> usize {
        self.results.iter().filter(|r| !r.verdict.is_ok()).count()
    }

    pub fn verdict_of(&self, testcase: &str) -> Option<Verdict> {
        self.results
            .iter()
            .find(|r| r.testcase == testcase)
            .map(|r| r.verdict)
    }

    pub fn render(&self) -> String {
        let mut out = format!("Verification of {} ({})\n", self.solution, self.compiler);
        render_rows(&mut out, &self.results, true);
        let errors = self.errors();
        if errors == 0 {
            out.push_str("all testcases passed\n");
        } else {
            let _ = writeln!(out, "{} testcase(s) failed", errors);
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CandidateOutcome {
    Verified(VerificationReport),
    /// No usable toolchain for the candidate; nothing was run.
    Skipped { solution: String, reason: String },
    /// The candidate did not build.
    Failed { solution: String, error: String },
}

impl CandidateOutcome {
    pub fn solution(&self) -> &str {
        match self {
            CandidateOutcome::Verified(report) => &report.solution,
            CandidateOutcome::Skipped { solution, .. } => solution,
            CandidateOutcome::Failed { solution, .. } => solution,
        }
    }

    /// Failing testcases, or 1 for a build failure. Skips count as 0.
    pub fn errors(&self) -> usize {
        match self {
            CandidateOutcome::Verified(report) => report.errors(),
            CandidateOutcome::Skipped { .. } => 0,
            CandidateOutcome::Failed { .. } => 1,
        }
    }

    pub fn render(&self) -> String {
        match self {
            CandidateOutcome::Verified(report) => report.render(),
            CandidateOutcome::Skipped { solution, reason } => {
                format!("Skipped {}: {}\n", solution, reason)
            }
            CandidateOutcome::Failed { solution, error } => {
                format!("Failed {}: {}\n", solution, error)
            }
        }
    }
}

/// Everything `make` did for one problem directory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MakeSummary {
    pub directory: String,
    pub generation: Option<GenerationReport>,
    pub candidates: Vec<CandidateOutcome>,
}

impl MakeSummary {
    pub fn failures(&self) -> usize {
        self.candidates.iter().map(CandidateOutcome::errors).sum()
    }

    pub fn skipped(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| matches!(c, CandidateOutcome::Skipped { .. }))
            .count()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(generation) = &self.generation {
            out.push_str(&generation.render());
            out.push('\n');
        }
        for candidate in &self.candidates {
            out.push_str(&candidate.render());
            out.push('\n');
        }
        out
    }
}
