use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::clojure::{ClojureCompiler, RunClojureCompiler};
use super::haskell::RunHaskellCompiler;
use super::java::JavaCompiler;
use super::native::{NativeCompiler, GCC, GHC, GXX, RUSTC};
use super::python::{Python3Compiler, RunPythonCompiler};
use super::verilog::VerilogCompiler;
use super::{Compiler, CommandRunner, CompilerInfo};
use crate::detector;
use crate::error::{ProblemError, Result};
use crate::problem::HandlerConfig;

/// Builds a compiler bound to a process runner.
pub type CompilerFactory = fn(Arc<dyn CommandRunner>) -> Box<dyn Compiler>;

fn gcc(runner: Arc<dyn CommandRunner>) -> Box<dyn Compiler> {
    Box::new(NativeCompiler::new(&GCC, runner))
}

fn gxx(runner: Arc<dyn CommandRunner>) -> Box<dyn Compiler> {
    Box::new(NativeCompiler::new(&GXX, runner))
}

fn rustc(runner: Arc<dyn CommandRunner>) -> Box<dyn Compiler> {
    Box::new(NativeCompiler::new(&RUSTC, runner))
}

fn ghc(runner: Arc<dyn CommandRunner>) -> Box<dyn Compiler> {
    Box::new(NativeCompiler::new(&GHC, runner))
}

fn java(runner: Arc<dyn CommandRunner>) -> Box<dyn Compiler> {
    Box::new(JavaCompiler::new(runner))
}

fn clojure(runner: Arc<dyn CommandRunner>) -> Box<dyn Compiler> {
    Box::new(ClojureCompiler::new(runner))
}

fn python3(runner: Arc<dyn CommandRunner>) -> Box<dyn Compiler> {
    Box::new(Python3Compiler::new(runner))
}

fn run_python(runner: Arc<dyn CommandRunner>) -> Box<dyn Compiler> {
    Box::new(RunPythonCompiler::new(runner))
}

fn run_haskell(runner: Arc<dyn CommandRunner>) -> Box<dyn Compiler> {
    Box::new(RunHaskellCompiler::new(runner))
}

fn run_clojure(runner: Arc<dyn CommandRunner>) -> Box<dyn Compiler> {
    Box::new(RunClojureCompiler::new(runner))
}

fn verilog(runner: Arc<dyn CommandRunner>) -> Box<dyn Compiler> {
    Box::new(VerilogCompiler::new(runner))
}

/// Two lookup tables (by compiler id, by source extension) plus the runner
/// every constructed compiler shares. Built once and passed to the pipeline.
pub struct Registry {
    runner: Arc<dyn CommandRunner>,
    by_id: BTreeMap<String, CompilerFactory>,
    by_extension: BTreeMap<String, CompilerFactory>,
}

impl Registry {
    pub fn empty(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            by_id: BTreeMap::new(),
            by_extension: BTreeMap::new(),
        }
    }

    pub fn standard(runner: Arc<dyn CommandRunner>) -> Self {
        Self::empty(runner)
            .register("GCC", gcc)
            .register("GXX", gxx)
            .register("Rust", rustc)
            .register("GHC", ghc)
            .register("Java", java)
            .register("Clojure", clojure)
            .register("Python3", python3)
            .register("RunPython", run_python)
            .register("RunHaskell", run_haskell)
            .register("RunClojure", run_clojure)
            .register("Verilog", verilog)
            .register_extension("c", gcc)
            .register_extension("cc", gxx)
            .register_extension("rs", rustc)
            .register_extension("hs", ghc)
            .register_extension("java", java)
            .register_extension("clj", clojure)
            .register_extension("py", python3)
            .register_extension("v", verilog)
    }

    pub fn register(mut self, id: &str, factory: CompilerFactory) -> Self {
        self.by_id.insert(id.to_string(), factory);
        self
    }

    pub fn register_extension(mut self, extension: &str, factory: CompilerFactory) -> Self {
        self.by_extension.insert(extension.to_string(), factory);
        self
    }

    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        self.runner.clone()
    }

    pub fn by_id(&self, id: &str) -> Result<Box<dyn Compiler>> {
        let factory = self
            .by_id
            .get(id)
            .ok_or_else(|| ProblemError::UnknownCompiler(format!("'{}' is not defined", id)))?;
        Ok(factory(self.runner.clone()))
    }

    pub fn by_extension(&self, extension: &str) -> Result<Box<dyn Compiler>> {
        let factory = self.by_extension.get(extension).ok_or_else(|| {
            ProblemError::UnknownCompiler(format!("no compiler defined for extension '.{}'", extension))
        })?;
        Ok(factory(self.runner.clone()))
    }

    fn by_file(&self, file: &str) -> Result<Box<dyn Compiler>> {
        let extension = detector::extension_of(file)
            .ok_or_else(|| ProblemError::UnknownCompiler(format!("{} has no extension", file)))?;
        self.by_extension(extension)
    }

    /// Compiler for the golden solution: a forced id wins over the file's
    /// extension.
    pub fn select(&self, handler: &HandlerConfig, file: &str) -> Result<Box<dyn Compiler>> {
        let compiler = match handler.forced_compiler() {
            Some(id) => self.by_id(id)?,
            None => self.by_file(file)?,
        };
        debug!("Selected {} for {}", compiler.id(), file);
        Ok(compiler)
    }

    /// Compiler for a candidate: the forced compiler when it handles the
    /// candidate's extension, otherwise the extension table.
    pub fn select_candidate(&self, handler: &HandlerConfig, file: &str) -> Result<Box<dyn Compiler>> {
        if let Some(id) = handler.forced_compiler() {
            let forced = self.by_id(id)?;
            if detector::extension_of(file) == Some(forced.extension()) {
                return Ok(forced);
            }
        }
        self.by_file(file)
    }

    pub fn defined_ids(&self) -> Vec<String> {
        self.by_id.keys().cloned().collect()
    }

    /// Ids whose toolchain answers its version probe.
    pub fn available_ids(&self) -> Vec<String> {
        self.by_id
            .iter()
            .filter(|(_, factory)| factory(self.runner.clone()).available())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn infos(&self) -> Vec<CompilerInfo> {
        self.by_id
            .values()
            .map(|factory| factory(self.runner.clone()).info())
            .collect()
    }

    /// Whether the compiler for `extension` is installed. Unknown extensions
    /// count as unavailable.
    pub fn extension_available(&self, extension: &str) -> bool {
        self.by_extension(extension)
            .map(|compiler| compiler.available())
            .unwrap_or(false)
    }
}
