use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::{
    merge_script, require_template, run_build, run_program, Compiler, CommandRunner, Invocation,
    ToolchainKind,
};
use crate::error::{IoContext, ProblemError, Result};
use crate::problem::{HandlerConfig, HandlerFamily};
use crate::util;

const PYTHON: &str = "python3";

/// Graphic problems draw with turtle; the judge renders through `turtle_pil`,
/// which writes `output.png` instead of opening a window.
fn use_offscreen_turtle(source: &str) -> Option<String> {
    let mut changed = false;
    let lines: Vec<String> = source
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let indent = &line[..line.len() - trimmed.len()];
            if trimmed == "import turtle" {
                changed = true;
                format!("{}import turtle_pil as turtle", indent)
            } else if let Some(rest) = trimmed.strip_prefix("from turtle import ") {
                changed = true;
                format!("{}from turtle_pil import {}", indent, rest)
            } else {
                line.to_string()
            }
        })
        .collect();
    changed.then(|| lines.join("\n") + "\n")
}

fn syntax_check(runner: &dyn CommandRunner, directory: &Path, source_path: &str) -> Result<()> {
    let invocation = Invocation::new(PYTHON, directory).args(["-m", "py_compile", source_path]);
    run_build(runner, &invocation, source_path)
}

/// CPython reading the testcase from standard input.
pub struct Python3Compiler {
    runner: Arc<dyn CommandRunner>,
}

impl Python3Compiler {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Compiler for Python3Compiler {
    fn id(&self) -> &'static str {
        "Python3"
    }

    fn name(&self) -> &'static str {
        "Python3"
    }

    fn kind(&self) -> ToolchainKind {
        ToolchainKind::Interpreter
    }

    fn language(&self) -> &'static str {
        "Python3"
    }

    fn tool(&self) -> &'static str {
        PYTHON
    }

    fn extension(&self) -> &'static str {
        "py"
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    fn artifact(&self, source_path: &str) -> String {
        source_path.to_string()
    }

    fn compile_normal(
        &self,
        handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
    ) -> Result<String> {
        if handler.family == HandlerFamily::Graphic {
            let path = directory.join(source_path);
            let source = std::fs::read_to_string(&path).at(&path)?;
            if let Some(patched) = use_offscreen_turtle(&source) {
                debug!("Using turtle_pil in {}", source_path);
                std::fs::write(&path, patched).at(&path)?;
            }
        }
        syntax_check(self.runner(), directory, source_path)?;
        Ok(source_path.to_string())
    }

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

    fn execute(
        &self,
        _handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
        input_path: &str,
        output_path: &str,
    ) -> Result<()> {
        let invocation = Invocation::new(PYTHON, directory)
            .arg(source_path)
            .stdin_from(directory.join(input_path))
            .stdout_to(directory.join(output_path));
        run_program(self.runner(), &invocation, source_path, directory, output_path)
    }
}

/// Run-functions Python: each testcase input is Python code appended to the
/// solution and evaluated without standard input.
pub struct RunPythonCompiler {
    runner: Arc<dyn CommandRunner>,
}

impl RunPythonCompiler {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Compiler for RunPythonCompiler {
    fn id(&self) -> &'static str {
        "RunPython"
    }

    fn name(&self) -> &'static str {
        "RunPython"
    }

    fn kind(&self) -> ToolchainKind {
        ToolchainKind::Interpreter
    }

    fn language(&self) -> &'static str {
        "Python3"
    }

    fn tool(&self) -> &'static str {
        PYTHON
    }

    fn extension(&self) -> &'static str {
        "py"
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    fn artifact(&self, source_path: &str) -> String {
        source_path.to_string()
    }

    fn compile_normal(
        &self,
        _handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
    ) -> Result<String> {
        syntax_check(self.runner(), directory, source_path)?;
        Ok(source_path.to_string())
    }

    fn compile_with_main(
        &self,
        _handler: &HandlerConfig,
        _directory: &Path,
        _source_path: &str,
    ) -> Result<String> {
        Err(ProblemError::NotImplemented {
            compiler: self.id().to_string(),
            operation: "compile_with_main",
        })
    }

    fn execute(
        &self,
        _handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
        input_path: &str,
        output_path: &str,
    ) -> Result<()> {
        let merged = merge_script(directory, source_path, input_path, self.extension(), |input| {
            input.to_string()
        })?;
        let invocation = Invocation::new(PYTHON, directory)
            .arg(merged.as_str())
            .stdout_to(directory.join(output_path));
        run_program(self.runner(), &invocation, &merged, directory, output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compilers::testing::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    fn graphic() -> HandlerConfig {
        HandlerConfig {
            family: HandlerFamily::Graphic,
            ..HandlerConfig::default()
        }
    }

    #[test]
    fn test_turtle_rewrite() {
        assert_eq!(
            use_offscreen_turtle("import turtle\nturtle.forward(10)").as_deref(),
            Some("import turtle_pil as turtle\nturtle.forward(10)\n")
        );
        assert_eq!(
            use_offscreen_turtle("from turtle import *").as_deref(),
            Some("from turtle_pil import *\n")
        );
        assert_eq!(use_offscreen_turtle("import sys"), None);
    }

    #[test]
    fn test_turtle_rewrite_only_for_graphic() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.py"), "import turtle\n").unwrap();
        let runner = Arc::new(RecordingRunner::new(0));
        let compiler = Python3Compiler::new(runner.clone());

        compiler
            .compile_normal(&HandlerConfig::default(), tmp.path(), "a.py")
            .unwrap();
        assert_eq!(fs::read_to_string(tmp.path().join("a.py")).unwrap(), "import turtle\n");

        compiler.compile_normal(&graphic(), tmp.path(), "a.py").unwrap();
        assert!(fs::read_to_string(tmp.path().join("a.py"))
            .unwrap()
            .contains("turtle_pil"));

        let calls = runner.calls();
        assert_eq!(calls[0].args, vec!["-m", "py_compile", "a.py"]);
    }

    #[test]
    fn test_python3_appends_template() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("pbmk-solution.py"), "def double(n):\n    return 2*n\n").unwrap();
        fs::write(tmp.path().join("main.py"), "print(double(int(input())))\n").unwrap();
        let runner = Arc::new(RecordingRunner::new(0));
        let artifact = Python3Compiler::new(runner)
            .compile_with_main(&HandlerConfig::default(), tmp.path(), "pbmk-solution.py")
            .unwrap();
        assert_eq!(artifact, "pbmk-solution.py");
        let merged = fs::read_to_string(tmp.path().join("pbmk-solution.py")).unwrap();
        assert!(merged.find("def double").unwrap() < merged.find("print(double").unwrap());
    }

    #[test]
    fn test_python3_execute_uses_stdin() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(0));
        Python3Compiler::new(runner.clone())
            .execute(&HandlerConfig::default(), tmp.path(), "a.py", "t.inp", "t.cor")
            .unwrap();
        let calls = runner.calls();
        assert_eq!(calls[0].program, "python3");
        assert_eq!(calls[0].args, vec!["a.py"]);
        assert_eq!(calls[0].stdin, Some(tmp.path().join("t.inp")));
    }

    #[test]
    fn test_run_python_without_main() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(0));
        let err = RunPythonCompiler::new(runner.clone())
            .compile_with_main(&HandlerConfig::default(), tmp.path(), "a.py")
            .unwrap_err();
        assert!(matches!(err, ProblemError::NotImplemented { .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_run_python_merges_input() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("pbmk-solution.py"), "def f(n): return n*2\n").unwrap();
        fs::write(tmp.path().join("sample1.inp"), "print(f(3))\n").unwrap();
        let runner = Arc::new(RecordingRunner::new(0));
        RunPythonCompiler::new(runner.clone())
            .execute(
                &HandlerConfig::default(),
                tmp.path(),
                "pbmk-solution.py",
                "sample1.inp",
                "sample1.cor",
            )
            .unwrap();
        let calls = runner.calls();
        assert_eq!(calls[0].args, vec!["pbmk-solution-sample1.py"]);
        assert_eq!(calls[0].stdin, None);
        let merged = fs::read_to_string(tmp.path().join("pbmk-solution-sample1.py")).unwrap();
        assert!(merged.ends_with("print(f(3))\n\n\n\n"));
    }
}
