use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::{
    merge_script, require_template, run_program, Compiler, CommandRunner, Invocation,
    ToolchainKind,
};
use crate::error::{IoContext, ProblemError, Result};
use crate::problem::HandlerConfig;
use crate::util;

const CLJ: &str = "clj";

fn clj_invocation(directory: &Path, script: &str) -> Invocation {
    Invocation::new(CLJ, directory).args(["-M", script])
}

/// Clojure on the JVM. There is no separate build step; the source is the
/// artifact.
pub struct ClojureCompiler {
    runner: Arc<dyn CommandRunner>,
}

impl ClojureCompiler {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Compiler for ClojureCompiler {
    fn id(&self) -> &'static str {
        "Clojure"
    }

    fn name(&self) -> &'static str {
        "Clojure"
    }

    fn kind(&self) -> ToolchainKind {
        ToolchainKind::Vm
    }

    fn language(&self) -> &'static str {
        "Clojure"
    }

    fn tool(&self) -> &'static str {
        CLJ
    }

    fn extension(&self) -> &'static str {
        "clj"
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
        _directory: &Path,
        source_path: &str,
    ) -> Result<String> {
        Ok(source_path.to_string())
    }

    fn compile_with_main(
        &self,
        _handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
    ) -> Result<String> {
        let template = require_template(directory, self.extension())?;
        info!("add {} to {}", template, source_path);
        util::concat_text(directory, &[source_path, template.as_str()], source_path)
            .at(&directory.join(source_path))?;
        warn!("No compilation available for Clojure");
        Ok(source_path.to_string())
    }

    fn execute(
        &self,
        _handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
        input_path: &str,
        output_path: &str,
    ) -> Result<()> {
        let invocation = clj_invocation(directory, source_path)
            .stdin_from(directory.join(input_path))
            .stdout_to(directory.join(output_path));
        run_program(self.runner(), &invocation, source_path, directory, output_path)
    }
}

/// Wrap every expression line of a testcase in `println`.
fn to_printlns(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .map(|l| format!("(println {})\n", l))
        .collect()
}

/// Run-functions Clojure: testcase expressions are appended to the solution.
pub struct RunClojureCompiler {
    runner: Arc<dyn CommandRunner>,
}

impl RunClojureCompiler {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Compiler for RunClojureCompiler {
    fn id(&self) -> &'static str {
        "RunClojure"
    }

    fn name(&self) -> &'static str {
        "Clojure (RunFunctions)"
    }

    fn kind(&self) -> ToolchainKind {
        ToolchainKind::Interpreter
    }

    fn language(&self) -> &'static str {
        "Clojure"
    }

    fn tool(&self) -> &'static str {
        CLJ
    }

    fn extension(&self) -> &'static str {
        "clj"
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
        _directory: &Path,
        source_path: &str,
    ) -> Result<String> {
        warn!("No compilation available for Clojure");
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
        let merged = merge_script(directory, source_path, input_path, self.extension(), to_printlns)?;
        let invocation = clj_invocation(directory, &merged).stdout_to(directory.join(output_path));
        run_program(self.runner(), &invocation, &merged, directory, output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compilers::testing::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_compile_normal_is_identity() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(0));
        let artifact = ClojureCompiler::new(runner.clone())
            .compile_normal(&HandlerConfig::default(), tmp.path(), "pbmk-solution.clj")
            .unwrap();
        assert_eq!(artifact, "pbmk-solution.clj");
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_execute_with_clj() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(0));
        ClojureCompiler::new(runner.clone())
            .execute(&HandlerConfig::default(), tmp.path(), "s.clj", "t.inp", "t.cor")
            .unwrap();
        let calls = runner.calls();
        assert_eq!(calls[0].program, "clj");
        assert_eq!(calls[0].args, vec!["-M", "s.clj"]);
        assert!(calls[0].stdin.is_some());
    }

    #[test]
    fn test_to_printlns() {
        assert_eq!(to_printlns("(f 1)\n\n(f 2)\n"), "(println (f 1))\n(println (f 2))\n");
    }

    #[test]
    fn test_run_clojure_execute() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("pbmk-solution.clj"), "(defn f [n] (* 2 n))\n").unwrap();
        fs::write(tmp.path().join("sample1.inp"), "(f 3)\n").unwrap();
        let runner = Arc::new(RecordingRunner::new(0));
        RunClojureCompiler::new(runner.clone())
            .execute(
                &HandlerConfig::default(),
                tmp.path(),
                "pbmk-solution.clj",
                "sample1.inp",
                "sample1.cor",
            )
            .unwrap();
        let calls = runner.calls();
        assert_eq!(calls[0].args, vec!["-M", "pbmk-solution-sample1.clj"]);
        assert_eq!(calls[0].stdin, None);
        let merged = fs::read_to_string(tmp.path().join("pbmk-solution-sample1.clj")).unwrap();
        assert!(merged.contains("(println (f 3))"));
    }

    #[test]
    fn test_run_clojure_without_main() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(0));
        assert!(matches!(
            RunClojureCompiler::new(runner)
                .compile_with_main(&HandlerConfig::default(), tmp.path(), "a.clj"),
            Err(ProblemError::NotImplemented { .. })
        ));
    }
}
