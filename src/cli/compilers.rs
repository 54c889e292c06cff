use anyhow::Result;

use crate::cli::{load_config, system_registry};
use crate::compilers::{CompilerInfo, VERSION_NOT_FOUND};

/// List the registered compilers with their probed versions.
pub fn run(config_path: Option<String>, available_only: bool, json: bool) -> Result<()> {
    let config = load_config(config_path, None, None)?;
    let registry = system_registry(&config);

    let mut infos = registry.infos();
    if available_only {
        infos.retain(|info| info.version != VERSION_NOT_FOUND);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
    } else {
        print!("{}", render_table(&infos));
    }
    Ok(())
}

fn render_table(infos: &[CompilerInfo]) -> String {
    if infos.is_empty() {
        return "No compilers found\n".to_string();
    }

    let id_width = infos.iter().map(|i| i.compiler_id.len()).max().unwrap_or(0).max(2);
    let lang_width = infos.iter().map(|i| i.language.len()).max().unwrap_or(0).max(8);

    let mut out = format!(
        "{:<id_width$}  {:<lang_width$}  {:<11}  {:<4}  VERSION\n",
        "ID", "LANGUAGE", "KIND", "EXT"
    );
    for info in infos {
        let mark = if info.version == VERSION_NOT_FOUND { "❌" } else { "✅" };
        out.push_str(&format!(
            "{:<id_width$}  {:<lang_width$}  {:<11}  {:<4}  {} {}\n",
            info.compiler_id,
            info.language,
            info.kind.to_string(),
            info.extension,
            mark,
            info.version
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compilers::ToolchainKind;

    fn info(id: &str, version: &str) -> CompilerInfo {
        CompilerInfo {
            compiler_id: id.to_string(),
            name: id.to_string(),
            language: "C++".to_string(),
            version: version.to_string(),
            flags: String::new(),
            extension: "cc".to_string(),
            kind: ToolchainKind::Compiler,
        }
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&[info("GXX", "13.2.0"), info("Clang", VERSION_NOT_FOUND)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].contains("GXX") && lines[1].contains("✅ 13.2.0"));
        assert!(lines[2].contains("❌ not found"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_table(&[]), "No compilers found\n");
    }
}
