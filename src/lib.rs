//! pbmkit - build and verify programming-judge problem bundles
//!
//! Loads a `.pbm` problem bundle (statements, handler, testcases), compiles
//! the golden solution with the toolchain its handler selects, generates the
//! expected outputs and checks every alternative solution against them.

pub mod cli;
pub mod compilers;
pub mod config;
pub mod detector;
pub mod error;
pub mod lint;
pub mod pipeline;
pub mod problem;
pub mod util;
