use anyhow::bail;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Suffix every problem bundle directory carries.
pub const PROBLEM_DIR_SUFFIX: &str = ".pbm";

/// Name of the declarative handler file.
pub const HANDLER_FILE: &str = "handler.toml";

/// Statement languages a bundle may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Language {
    English,
    Catalan,
    Spanish,
    French,
    German,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::English,
        Language::Catalan,
        Language::Spanish,
        Language::French,
        Language::German,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Catalan => "ca",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Catalan => "Catalan",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
        }
    }

    /// Statement file name for this language, e.g. `problem.en.toml`.
    pub fn statement_file(&self) -> String {
        format!("problem.{}.toml", self.code())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "ca" | "catalan" => Ok(Language::Catalan),
            "es" | "spanish" => Ok(Language::Spanish),
            "fr" | "french" => Ok(Language::French),
            "de" | "german" => Ok(Language::German),
            _ => bail!("Unknown language: {}", s),
        }
    }
}

/// Programming languages accepted for solutions, keyed by file extension.
const PROGLANGS: &[(&str, &str)] = &[
    ("c", "C"),
    ("cc", "C++"),
    ("py", "Python3"),
    ("hs", "Haskell"),
    ("clj", "Clojure"),
    ("java", "Java"),
    ("rs", "Rust"),
    ("v", "Verilog"),
];

/// All recognized solution extensions.
pub fn proglang_extensions() -> impl Iterator<Item = &'static str> {
    PROGLANGS.iter().map(|(ext, _)| *ext)
}

/// Programming language name for an extension (`cc` -> `C++`).
pub fn proglang_name(extension: &str) -> Option<&'static str> {
    PROGLANGS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, name)| *name)
}

/// Extension for a programming language name (`C++` -> `cc`).
pub fn proglang_extension(name: &str) -> Option<&'static str> {
    PROGLANGS
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(ext, _)| *ext)
}

/// Extension of a file name (`solution.cc` -> `cc`).
pub fn extension_of(file: &str) -> Option<&str> {
    Path::new(file).extension().and_then(|e| e.to_str())
}

/// How the languages of a bundle are laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    /// All languages share the bundle directory and one handler file.
    Flat,
    /// Each language lives in its own subdirectory.
    Shallow,
}

impl Structure {
    /// Directory holding the files of `language` inside `bundle`.
    pub fn language_dir(&self, bundle: &Path, language: Language) -> std::path::PathBuf {
        match self {
            Structure::Flat => bundle.to_path_buf(),
            Structure::Shallow => bundle.join(language.code()),
        }
    }
}

pub fn is_problem_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(PROBLEM_DIR_SUFFIX))
        .unwrap_or(false)
}

pub fn detect_structure(path: &Path) -> Structure {
    if path.join(HANDLER_FILE).is_file() {
        Structure::Flat
    } else {
        Structure::Shallow
    }
}
