use anyhow::Result;
use std::fmt::Write as _;

use crate::cli::{load_bundle, load_config};
use crate::problem::AbstractProblem;

/// Show what the loader sees in a bundle without building anything.
pub fn run(path: String, config_path: Option<String>, json: bool) -> Result<()> {
    let config = load_config(config_path, None, None)?;
    let bundle = load_bundle(&path, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    } else {
        print!("{}", render(&bundle));
    }
    Ok(())
}

fn render(bundle: &AbstractProblem) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📦 {}", bundle.directory.display());
    let _ = writeln!(out, "   structure: {:?}", bundle.structure);
    let _ = writeln!(out, "   type:      {:?}", bundle.problem_type);
    let _ = writeln!(
        out,
        "   original:  {} ({})",
        bundle.original_language.name(),
        bundle.original_language
    );
    if let Some(ref nm) = bundle.info.problem_nm {
        let _ = writeln!(out, "   judge id:  {}", nm);
    }

    for problem in bundle.problems.values() {
        let handler = &problem.handler;
        let _ = writeln!(out, "\n   [{}] {}", problem.language, problem.statement.title);
        let _ = writeln!(out, "      directory:  {}", problem.directory.display());
        let _ = writeln!(
            out,
            "      handler:    {} (source modifier {})",
            handler.family, handler.source_modifier
        );
        if let Some(id) = handler.forced_compiler() {
            let _ = writeln!(out, "      compiler:   {}", id);
        }
        let _ = writeln!(out, "      solution:   {}", handler.solution_language());
        let _ = writeln!(out, "      solutions:  {}", problem.solutions().join(" "));
        let _ = writeln!(out, "      testcases:  {}", problem.testcases.len());
    }
    out
}
