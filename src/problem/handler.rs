//! `handler.toml`: how solutions of a problem are built and judged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::warn;

use crate::error::{ProblemError, Result};

/// Behavioral family declared by the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerFamily {
    Std,
    Graphic,
    Circuits,
    Game,
    Quiz,
}

impl HandlerFamily {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "std" => Ok(HandlerFamily::Std),
            "graphic" => Ok(HandlerFamily::Graphic),
            "circuits" => Ok(HandlerFamily::Circuits),
            "game" => Ok(HandlerFamily::Game),
            "quiz" => Ok(HandlerFamily::Quiz),
            other => Err(ProblemError::UnknownHandler(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerFamily::Std => "std",
            HandlerFamily::Graphic => "graphic",
            HandlerFamily::Circuits => "circuits",
            HandlerFamily::Game => "game",
            HandlerFamily::Quiz => "quiz",
        }
    }
}

impl fmt::Display for HandlerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a submitted file is a complete program or a body that needs an
/// injected entry point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceModifier {
    #[default]
    None,
    NoMain,
    /// Deprecated spelling of `no_main`; normalized away on load.
    Structs,
}

impl fmt::Display for SourceModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceModifier::None => f.write_str("none"),
            SourceModifier::NoMain => f.write_str("no_main"),
            SourceModifier::Structs => f.write_str("structs"),
        }
    }
}

/// Compiler-selection policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "policy", content = "id")]
pub enum CompilerSelection {
    /// Pick the compiler from the solution's file extension.
    Auto,
    /// Always use the compiler registered under this id.
    Forced(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Runner files kept out of the published bundle.
    #[serde(default)]
    pub hide: Vec<String>,
}

/// On-disk shape of `handler.toml` before validation.
#[derive(Debug, Deserialize)]
struct RawHandler {
    #[serde(default = "default_handler")]
    handler: String,
    #[serde(default)]
    solution: Option<String>,
    #[serde(default)]
    source_modifier: SourceModifier,
    #[serde(default)]
    compilers: Option<String>,
    #[serde(default)]
    game: Option<GameConfig>,
}

fn default_handler() -> String {
    "std".to_string()
}

/// Validated handler configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerConfig {
    pub family: HandlerFamily,
    pub compilers: CompilerSelection,
    /// Declared programming language of the golden solution, if any.
    pub solution: Option<String>,
    pub source_modifier: SourceModifier,
    pub game: Option<GameConfig>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            family: HandlerFamily::Std,
            compilers: CompilerSelection::Auto,
            solution: None,
            source_modifier: SourceModifier::None,
            game: None,
        }
    }
}

impl HandlerConfig {
    pub const DEFAULT_SOLUTION_LANGUAGE: &'static str = "C++";

    /// Parse and validate the text of a handler file. `path` only labels errors.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawHandler =
            toml::from_str(content).map_err(|e| ProblemError::schema(path, e.message()))?;

        let family = HandlerFamily::parse(raw.handler.trim())?;

        let mut source_modifier = raw.source_modifier;
        if source_modifier == SourceModifier::Structs {
            warn!(
                "source_modifier \"structs\" is deprecated, using \"no_main\" instead. please update {}",
                path.display()
            );
            source_modifier = SourceModifier::NoMain;
        }

        let compilers = match raw.compilers.as_deref().map(str::trim) {
            None | Some("") => CompilerSelection::Auto,
            Some(id) if id.eq_ignore_ascii_case("auto") => CompilerSelection::Auto,
            Some(id) => CompilerSelection::Forced(id.to_string()),
        };

        let solution = if family == HandlerFamily::Circuits {
            Some("Verilog".to_string())
        } else {
            raw.solution
        };

        Ok(Self {
            family,
            compilers,
            solution,
            source_modifier,
            game: raw.game,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ProblemError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Declared solution language, defaulting to C++.
    pub fn solution_language(&self) -> &str {
        self.solution
            .as_deref()
            .unwrap_or(Self::DEFAULT_SOLUTION_LANGUAGE)
    }

    pub fn forced_compiler(&self) -> Option<&str> {
        match &self.compilers {
            CompilerSelection::Forced(id) => Some(id),
            CompilerSelection::Auto => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<HandlerConfig> {
        HandlerConfig::parse(s, Path::new("handler.toml"))
    }

    #[test]
    fn test_defaults() {
        let handler = parse("").unwrap();
        assert_eq!(handler, HandlerConfig::default());
        assert_eq!(handler.solution_language(), "C++");
        assert_eq!(handler.forced_compiler(), None);
    }

    #[test]
    fn test_full_handler() {
        let handler = parse(
            r#"
handler = "graphic"
solution = "Python3"
source_modifier = "no_main"
compilers = "RunPython"
"#,
        )
        .unwrap();
        assert_eq!(handler.family, HandlerFamily::Graphic);
        assert_eq!(handler.solution_language(), "Python3");
        assert_eq!(handler.source_modifier, SourceModifier::NoMain);
        assert_eq!(handler.forced_compiler(), Some("RunPython"));
    }

    #[test]
    fn test_auto_compilers() {
        let handler = parse("compilers = \"auto\"").unwrap();
        assert_eq!(handler.compilers, CompilerSelection::Auto);
    }

    #[test]
    fn test_structs_normalized_to_no_main() {
        let handler = parse("source_modifier = \"structs\"").unwrap();
        assert_eq!(handler.source_modifier, SourceModifier::NoMain);
    }

    #[test]
    fn test_circuits_forces_verilog() {
        let handler = parse("handler = \"circuits\"\nsolution = \"C++\"").unwrap();
        assert_eq!(handler.solution_language(), "Verilog");
    }

    #[test]
    fn test_unknown_family() {
        let err = parse("handler = \"interactive\"").unwrap_err();
        assert!(matches!(err, ProblemError::UnknownHandler(ref h) if h == "interactive"));
    }

    #[test]
    fn test_unknown_source_modifier_is_schema_error() {
        let err = parse("source_modifier = \"wrap\"").unwrap_err();
        assert!(matches!(err, ProblemError::Schema { .. }));
    }

    #[test]
    fn test_malformed_toml_is_schema_error() {
        let err = parse("handler = ").unwrap_err();
        assert!(matches!(err, ProblemError::Schema { .. }));
        assert!(err.to_string().contains("handler.toml"));
    }

    #[test]
    fn test_game_hide_list() {
        let handler = parse("handler = \"game\"\n[game]\nhide = [\"AIDummy.cc\"]\n").unwrap();
        assert_eq!(handler.family, HandlerFamily::Game);
        assert_eq!(handler.game.unwrap().hide, vec!["AIDummy.cc".to_string()]);
    }
}
