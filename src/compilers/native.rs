//! Ahead-of-time compilers producing `<source>.exe`.

use std::sync::Arc;

use super::{Compiler, CommandRunner, ToolchainKind};

/// Static description of a native toolchain.
#[derive(Debug)]
pub struct NativeSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub language: &'static str,
    pub tool: &'static str,
    pub extension: &'static str,
    pub flags: &'static [&'static str],
}

pub const GCC: NativeSpec = NativeSpec {
    id: "GCC",
    name: "GNU C Compiler",
    language: "C",
    tool: "gcc",
    extension: "c",
    flags: &["-D_JUDGE_", "-O2", "-DNDEBUG", "-Wall", "-Wextra", "-Wno-sign-compare"],
};

pub const GXX: NativeSpec = NativeSpec {
    id: "GXX",
    name: "GNU C++ Compiler",
    language: "C++",
    tool: "g++",
    extension: "cc",
    flags: &[
        "-std=c++17",
        "-D_JUDGE_",
        "-O2",
        "-DNDEBUG",
        "-Wall",
        "-Wextra",
        "-Wno-sign-compare",
        "-Wshadow",
    ],
};

pub const RUSTC: NativeSpec = NativeSpec {
    id: "Rust",
    name: "Rust Compiler",
    language: "Rust",
    tool: "rustc",
    extension: "rs",
    flags: &["-C", "opt-level=2", "-D", "warnings"],
};

pub const GHC: NativeSpec = NativeSpec {
    id: "GHC",
    name: "GHC",
    language: "Haskell",
    tool: "ghc",
    extension: "hs",
    flags: &["-O3"],
};

pub struct NativeCompiler {
    spec: &'static NativeSpec,
    runner: Arc<dyn CommandRunner>,
}

impl NativeCompiler {
    pub fn new(spec: &'static NativeSpec, runner: Arc<dyn CommandRunner>) -> Self {
        Self { spec, runner }
    }
}

impl Compiler for NativeCompiler {
    fn id(&self) -> &'static str {
        self.spec.id
    }

    fn name(&self) -> &'static str {
        self.spec.name
    }

    fn kind(&self) -> ToolchainKind {
        ToolchainKind::Compiler
    }

    fn language(&self) -> &'static str {
        self.spec.language
    }

    fn tool(&self) -> &'static str {
        self.spec.tool
    }

    fn extension(&self) -> &'static str {
        self.spec.extension
    }

    fn flags(&self) -> &'static [&'static str] {
        self.spec.flags
    }

    fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }
}
