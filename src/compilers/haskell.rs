use std::path::Path;
use std::sync::Arc;

use super::{merge_script, run_build, run_program, Compiler, CommandRunner, Invocation, ToolchainKind};
use crate::error::{ProblemError, Result};
use crate::problem::HandlerConfig;

/// Turn testcase lines into a `main` block: `let` bindings are kept, every
/// other expression is printed and an interior blank line prints `()`, as
/// the judge's driver does.
fn to_main(input: &str) -> String {
    let mut main = String::from("main = do\n");
    for line in input.trim().split('\n').map(str::trim_end) {
        if line.trim().is_empty() {
            main.push_str("    print ()\n");
        } else if line.starts_with("let ") {
            main.push_str(&format!("    {}\n", line));
        } else {
            main.push_str(&format!("    print ({})\n", line));
        }
    }
    main
}

/// Run-functions Haskell: the solution is a set of definitions and each
/// testcase is a list of expressions to evaluate.
pub struct RunHaskellCompiler {
    runner: Arc<dyn CommandRunner>,
}

impl RunHaskellCompiler {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Compiler for RunHaskellCompiler {
    fn id(&self) -> &'static str {
        "RunHaskell"
    }

    fn name(&self) -> &'static str {
        "Glasgow Haskell Compiler (RunFunctions)"
    }

    fn kind(&self) -> ToolchainKind {
        ToolchainKind::Interpreter
    }

    fn language(&self) -> &'static str {
        "Haskell"
    }

    fn tool(&self) -> &'static str {
        "ghc"
    }

    fn extension(&self) -> &'static str {
        "hs"
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    fn artifact(&self, source_path: &str) -> String {
        source_path.to_string()
    }

    /// Load the definitions in ghci and quit; a type error fails the load.
    fn compile_normal(
        &self,
        _handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
    ) -> Result<String> {
        let invocation = Invocation::new("ghci", directory).args(["-e", ":q", source_path]);
        run_build(self.runner(), &invocation, source_path)?;
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
        let merged = merge_script(directory, source_path, input_path, self.extension(), to_main)?;
        let invocation = Invocation::new("runhaskell", directory)
            .arg(merged.as_str())
            .stdout_to(directory.join(output_path));
        run_program(self.runner(), &invocation, &merged, directory, output_path)
    }
}
