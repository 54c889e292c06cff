use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::{require_template, run_build, run_program, Compiler, CommandRunner, Invocation, ToolchainKind};
use crate::error::{IoContext, Result};
use crate::problem::HandlerConfig;
use crate::util;

pub const MAIN_CLASS: &str = "Main";

/// `javac` + `java`. Every solution defines `class Main`, so the artifact
/// name does not depend on the source name.
pub struct JavaCompiler {
    runner: Arc<dyn CommandRunner>,
}

impl JavaCompiler {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn class_file() -> String {
        format!("{}.class", MAIN_CLASS)
    }
}

impl Compiler for JavaCompiler {
    fn id(&self) -> &'static str {
        "Java"
    }

    fn name(&self) -> &'static str {
        "Java"
    }

    fn kind(&self) -> ToolchainKind {
        ToolchainKind::Vm
    }

    fn language(&self) -> &'static str {
        "Java"
    }

    fn tool(&self) -> &'static str {
        "javac"
    }

    fn extension(&self) -> &'static str {
        "java"
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    fn artifact(&self, _source_path: &str) -> String {
        Self::class_file()
    }

    fn compile_normal(
        &self,
        _handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
    ) -> Result<String> {
        let class_path = Self::class_file();
        util::remove_if_exists(&directory.join(&class_path)).at(&directory.join(&class_path))?;

        let invocation = Invocation::new(self.tool(), directory).arg(source_path);
        run_build(self.runner(), &invocation, source_path)?;

        Ok(class_path)
    }

    /// The template goes first: it carries the imports the body relies on.
    fn compile_with_main(
        &self,
        handler: &HandlerConfig,
        directory: &Path,
        source_path: &str,
    ) -> Result<String> {
        let template = require_template(directory, self.extension())?;
        info!("add {} to {}", template, source_path);
        util::concat_text(directory, &[template.as_str(), source_path], source_path)
            .at(&directory.join(source_path))?;
        self.compile_normal(handler, directory, source_path)
    }

    fn execute(
        &self,
        _handler: &HandlerConfig,
        directory: &Path,
        _source_path: &str,
        input_path: &str,
        output_path: &str,
    ) -> Result<()> {
        let invocation = Invocation::new("java", directory)
            .arg(MAIN_CLASS)
            .stdin_from(directory.join(input_path))
            .stdout_to(directory.join(output_path));
        run_program(self.runner(), &invocation, &Self::class_file(), directory, output_path)
    }
}
