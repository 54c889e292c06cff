//! Placeholder for circuit problems. Circuits are simulated by the judge;
//! locally a build only records that the source was accepted and every run
//! produces an empty output.

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use super::{Compiler, CommandRunner, ToolchainKind};
use crate::error::{IoContext, ProblemError, Result};
use crate::problem::HandlerConfig;
use crate::util;

pub struct VerilogCompiler {
    runner: Arc<dyn CommandRunner>,
}

impl VerilogCompiler {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Compiler for VerilogCompiler {
    fn id(&self) -> &'static str {
        "Verilog"
    }

    fn name(&self) -> &'static str {
        "Verilog (local stub)"
    }

    fn kind(&self) -> ToolchainKind {
        ToolchainKind::Compiler
    }

    fn language(&self) -> &'static str {
        "Verilog"
    }

    fn tool(&self) -> &'static str {
        "verilog"
    }

    fn extension(&self) -> &'static str {
        "v"
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    fn version(&self) -> Option<String> {
        Some("stub".to_string())
    }

    fn compile_normal(
        &self,
        _handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
    ) -> Result<String> {
        let source = directory.join(source_path);
        if !source.is_file() {
            return Err(ProblemError::Compilation {
                source_path: source_path.to_string(),
                detail: "source file not found".to_string(),
            });
        }
        warn!("Circuits are not simulated locally; {} is only checked for presence", source_path);
        let artifact = self.artifact(source_path);
        std::fs::write(directory.join(&artifact), format!("stub for {}\n", source_path))
            .at(&directory.join(&artifact))?;
        Ok(artifact)
    }

    fn execute(
        &self,
        _handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
        _input_path: &str,
        output_path: &str,
    ) -> Result<()> {
        let artifact = self.artifact(source_path);
        if !directory.join(&artifact).is_file() {
            return Err(ProblemError::Execution {
                program: artifact,
                detail: "not built".to_string(),
            });
        }
        let output = directory.join(output_path);
        util::remove_if_exists(&output).at(&output)?;
        std::fs::write(&output, b"").at(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compilers::testing::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_stub_build_and_run() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("pbmk-solution.v"), "module m; endmodule\n").unwrap();
        let runner = Arc::new(RecordingRunner::new(1));
        let compiler = VerilogCompiler::new(runner.clone());
        assert!(compiler.available());

        let artifact = compiler
            .compile_normal(&HandlerConfig::default(), tmp.path(), "pbmk-solution.v")
            .unwrap();
        assert!(tmp.path().join(&artifact).is_file());

        compiler
            .execute(&HandlerConfig::default(), tmp.path(), "pbmk-solution.v", "a.inp", "a.cor")
            .unwrap();
        assert_eq!(fs::read(tmp.path().join("a.cor")).unwrap(), b"");
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_execute_before_build() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::new(0));
        let err = VerilogCompiler::new(runner)
            .execute(&HandlerConfig::default(), tmp.path(), "x.v", "a.inp", "a.cor")
            .unwrap_err();
        assert!(matches!(err, ProblemError::Execution { .. }));
    }
}
