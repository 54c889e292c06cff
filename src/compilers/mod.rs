//! Compiler abstraction.
//!
//! Every toolchain (native compiler, VM, interpreter) is driven through the
//! same three operations: `compile_normal`, `compile_with_main` and
//! `execute`. The provided methods implement the native-compiler behaviour;
//! VM and interpreter variants override what differs.

pub mod clojure;
pub mod haskell;
pub mod java;
pub mod native;
pub mod process;
pub mod python;
pub mod registry;
pub mod verilog;

pub use process::{CommandRunner, Invocation, RunOutcome, StdoutTarget, SystemRunner};
pub use registry::{CompilerFactory, Registry};

use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::info;

use crate::error::{IoContext, ProblemError, Result};
use crate::problem::HandlerConfig;
use crate::util;

/// Execution model a compiler wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolchainKind {
    Compiler,
    Vm,
    Interpreter,
}

impl fmt::Display for ToolchainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolchainKind::Compiler => f.write_str("compiler"),
            ToolchainKind::Vm => f.write_str("vm"),
            ToolchainKind::Interpreter => f.write_str("interpreter"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerInfo {
    pub compiler_id: String,
    pub name: String,
    pub language: String,
    pub version: String,
    pub flags: String,
    pub extension: String,
    pub kind: ToolchainKind,
}

pub const VERSION_NOT_FOUND: &str = "not found";

pub trait Compiler: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn kind(&self) -> ToolchainKind;

    fn language(&self) -> &'static str;

    /// Program invoked to build or run.
    fn tool(&self) -> &'static str;

    fn extension(&self) -> &'static str;

    fn flags(&self) -> &'static [&'static str] {
        &[]
    }

    fn runner(&self) -> &dyn CommandRunner;

    fn version_command(&self) -> Vec<String> {
        vec![self.tool().to_string(), "--version".to_string()]
    }

    /// First line of the version command's output, or `None` when the
    /// toolchain is missing or exits with an error.
    fn version(&self) -> Option<String> {
        let command = self.version_command();
        let (program, args) = command.split_first()?;
        let invocation = Invocation::new(program.as_str(), ".")
            .args(args.iter().cloned())
            .capture();
        match self.runner().run(&invocation) {
            Ok(outcome) if outcome.success() => {
                let stdout = String::from_utf8_lossy(&outcome.stdout);
                let first = stdout.lines().next().unwrap_or("").trim();
                Some(if first.is_empty() {
                    "Unknown version".to_string()
                } else {
                    first.to_string()
                })
            }
            _ => None,
        }
    }

    fn available(&self) -> bool {
        self.version().is_some()
    }

    fn info(&self) -> CompilerInfo {
        CompilerInfo {
            compiler_id: self.id().to_string(),
            name: self.name().to_string(),
            language: self.language().to_string(),
            version: self
                .version()
                .unwrap_or_else(|| VERSION_NOT_FOUND.to_string()),
            flags: self.flags().join(" "),
            extension: self.extension().to_string(),
            kind: self.kind(),
        }
    }

    /// Artifact produced from `source_path` by a build.
    fn artifact(&self, source_path: &str) -> String {
        format!("{}.exe", source_path)
    }

    /// Build `source_path` as submitted. Returns the artifact path relative
    /// to `directory`.
    fn compile_normal(
        &self,
        _handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
    ) -> Result<String> {
        let exe_path = self.artifact(source_path);
        util::remove_if_exists(&directory.join(&exe_path)).at(&directory.join(&exe_path))?;

        let invocation = Invocation::new(self.tool(), directory)
            .args(self.flags().iter().copied())
            .arg(source_path)
            .args(["-o", exe_path.as_str()]);
        run_build(self.runner(), &invocation, source_path)?;

        Ok(exe_path)
    }

    /// Inject the `main.<ext>` template found in `directory` and build the
    /// result. The default appends the template after the submitted body.
    fn compile_with_main(
        &self,
        handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
    ) -> Result<String> {
        let template = require_template(directory, self.extension())?;
        info!("add {} to {}", template, source_path);
        util::concat_text(directory, &[source_path, template.as_str()], source_path)
            .at(&directory.join(source_path))?;
        self.compile_normal(handler, directory, source_path)
    }

    /// Run the built artifact with `input_path` on stdin and stdout written
    /// verbatim to `output_path`. Both paths are relative to `directory`.
    fn execute(
        &self,
        _handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
        input_path: &str,
        output_path: &str,
    ) -> Result<()> {
        let exe_path = std::path::absolute(directory.join(self.artifact(source_path)))
            .at(directory)?;
        let invocation = Invocation::new(exe_path.to_string_lossy(), directory)
            .stdin_from(directory.join(input_path))
            .stdout_to(directory.join(output_path));
        run_program(self.runner(), &invocation, &self.artifact(source_path), directory, output_path)
    }
}

/// Name of the entry-point template for an extension.
pub fn template_name(extension: &str) -> String {
    format!("main.{}", extension)
}

/// The template file must exist before anything is concatenated.
pub fn require_template(directory: &Path, extension: &str) -> Result<String> {
    let template = template_name(extension);
    let path = directory.join(&template);
    if !path.is_file() {
        return Err(ProblemError::Io {
            path,
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "entry-point template not found",
            ),
        });
    }
    Ok(template)
}

/// Run a build command; a nonzero exit or a failure to start is a
/// compilation error. Warnings on stderr are not.
pub fn run_build(runner: &dyn CommandRunner, invocation: &Invocation, source_path: &str) -> Result<()> {
    info!("$ {}", invocation);
    let outcome = runner.run(invocation).map_err(|e| ProblemError::Compilation {
        source_path: source_path.to_string(),
        detail: e.to_string(),
    })?;
    if !outcome.success() {
        return Err(ProblemError::Compilation {
            source_path: source_path.to_string(),
            detail: exit_detail(&outcome),
        });
    }
    Ok(())
}

/// Run a solution after clearing any stale output file.
pub fn run_program(
    runner: &dyn CommandRunner,
    invocation: &Invocation,
    program: &str,
    directory: &Path,
    output_path: &str,
) -> Result<()> {
    let output = directory.join(output_path);
    util::remove_if_exists(&output).at(&output)?;
    info!("$ {}", invocation);
    let outcome = runner.run(invocation).map_err(|e| ProblemError::Execution {
        program: program.to_string(),
        detail: e.to_string(),
    })?;
    if !outcome.success() {
        return Err(ProblemError::Execution {
            program: program.to_string(),
            detail: exit_detail(&outcome),
        });
    }
    Ok(())
}

fn exit_detail(outcome: &RunOutcome) -> String {
    match outcome.code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Write `<source stem>-<input stem>.<extension>`: the source followed by the
/// testcase input rewritten through `transform`. Used by the run-functions
/// interpreters, whose testcases are expressions rather than stdin data.
pub(crate) fn merge_script(
    directory: &Path,
    source_path: &str,
    input_path: &str,
    extension: &str,
    transform: impl Fn(&str) -> String,
) -> Result<String> {
    let merged = format!("{}-{}.{}", stem(source_path), stem(input_path), extension);
    let source = std::fs::read_to_string(directory.join(source_path)).at(&directory.join(source_path))?;
    let input = std::fs::read_to_string(directory.join(input_path)).at(&directory.join(input_path))?;

    info!("merge {} {} > {}", source_path, input_path, merged);
    let body = format!(
        "{}{}{}{}",
        source,
        util::CONCAT_SEPARATOR,
        transform(&input),
        util::CONCAT_SEPARATOR
    );
    std::fs::write(directory.join(&merged), body).at(&directory.join(&merged))?;
    Ok(merged)
}

/// Stem of a file name (`pbmk-solution.py` -> `pbmk-solution`).
pub(crate) fn stem(file: &str) -> &str {
    Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file)
}
