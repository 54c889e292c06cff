use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::handler::HandlerFamily;
use super::statement::ProblemInfo;
use super::Problem;
use crate::detector::{self, Language, Structure};
use crate::error::{IoContext, ProblemError, Result};

/// Behavioral type of a whole bundle, derived from the original handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemType {
    Std,
    Game,
    Quiz,
}

impl ProblemType {
    pub fn from_family(family: HandlerFamily) -> Self {
        match family {
            HandlerFamily::Game => ProblemType::Game,
            HandlerFamily::Quiz => ProblemType::Quiz,
            HandlerFamily::Std | HandlerFamily::Graphic | HandlerFamily::Circuits => {
                ProblemType::Std
            }
        }
    }
}

/// What to do when a translation's handler disagrees with the original's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HandlerMismatchPolicy {
    Ignore,
    #[default]
    Warn,
    Error,
}

/// A problem bundle: one [`Problem`] per statement language.
#[derive(Debug, Clone, Serialize)]
pub struct AbstractProblem {
    pub directory: PathBuf,
    pub structure: Structure,
    pub info: ProblemInfo,
    pub problems: BTreeMap<Language, Problem>,
    pub languages: Vec<Language>,
    pub original_language: Language,
    pub problem_type: ProblemType,
}

impl AbstractProblem {
    pub fn load(directory: &Path) -> Result<Self> {
        Self::load_with_policy(directory, HandlerMismatchPolicy::default())
    }

    pub fn load_with_policy(directory: &Path, policy: HandlerMismatchPolicy) -> Result<Self> {
        // `..` must be resolved before the `.pbm` name check.
        let directory = directory.canonicalize().at(directory)?;

        if !detector::is_problem_dir(&directory) {
            return Err(ProblemError::NotAProblemDirectory(directory));
        }

        let structure = detector::detect_structure(&directory);
        debug!("Structure of {}: {:?}", directory.display(), structure);

        let info = ProblemInfo::load_or_default(&directory)?;

        let mut problems = BTreeMap::new();
        for language in Language::ALL {
            let language_dir = structure.language_dir(&directory, language);
            if language_dir.join(language.statement_file()).is_file() {
                problems.insert(language, Problem::load(&language_dir, language)?);
            }
        }
        let languages: Vec<Language> = problems.keys().copied().collect();

        let originals: Vec<Language> = problems
            .values()
            .filter(|p| p.statement.is_original())
            .map(|p| p.language)
            .collect();
        let original_language = match originals.as_slice() {
            [] => return Err(ProblemError::NoOriginalLanguage(directory)),
            [only] => *only,
            many => {
                return Err(ProblemError::MultipleOriginalLanguages {
                    path: directory,
                    languages: many.iter().map(|l| l.code().to_string()).collect(),
                })
            }
        };

        let original_family = problems[&original_language].handler.family;
        let problem_type = ProblemType::from_family(original_family);

        check_handler_agreement(&problems, original_language, policy)?;

        info!(
            "Loaded {} ({:?}, original language {}, languages {})",
            directory.display(),
            problem_type,
            original_language,
            languages
                .iter()
                .map(|l| l.code())
                .collect::<Vec<_>>()
                .join(" ")
        );

        Ok(Self {
            directory,
            structure,
            info,
            problems,
            languages,
            original_language,
            problem_type,
        })
    }

    pub fn original_problem(&self) -> &Problem {
        // original_language is always one of the loaded keys
        &self.problems[&self.original_language]
    }

    pub fn problem(&self, language: Language) -> Option<&Problem> {
        self.problems.get(&language)
    }
}

fn check_handler_agreement(
    problems: &BTreeMap<Language, Problem>,
    original: Language,
    policy: HandlerMismatchPolicy,
) -> Result<()> {
    if policy == HandlerMismatchPolicy::Ignore {
        return Ok(());
    }
    let expected = problems[&original].handler.family;
    for problem in problems.values() {
        let found = problem.handler.family;
        if ProblemType::from_family(found) == ProblemType::from_family(expected) {
            continue;
        }
        match policy {
            HandlerMismatchPolicy::Error => {
                return Err(ProblemError::HandlerMismatch {
                    language: problem.language.code().to_string(),
                    expected: expected.to_string(),
                    found: found.to_string(),
                })
            }
            _ => warn!(
                "Handler of {} is '{}' but the original ({}) is '{}'",
                problem.language, found, original, expected
            ),
        }
    }
    Ok(())
}

/// Free-function form of [`AbstractProblem::load`].
pub fn load_abstract_problem(directory: &Path) -> Result<AbstractProblem> {
    AbstractProblem::load(directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn bundle(tmp: &TempDir) -> PathBuf {
        let dir = tmp.path().join("double.pbm");
        fs::create_dir(&dir).unwrap();
        dir
    }

    #[test]
    fn test_problem_type_mapping() {
        assert_eq!(ProblemType::from_family(HandlerFamily::Graphic), ProblemType::Std);
        assert_eq!(ProblemType::from_family(HandlerFamily::Circuits), ProblemType::Std);
        assert_eq!(ProblemType::from_family(HandlerFamily::Game), ProblemType::Game);
        assert_eq!(ProblemType::from_family(HandlerFamily::Quiz), ProblemType::Quiz);
    }

    #[test]
    fn test_flat_bundle() {
        let tmp = TempDir::new().unwrap();
        let dir = bundle(&tmp);
        fs::write(dir.join("handler.toml"), "").unwrap();
        fs::write(dir.join("problem.en.toml"), "title = \"Double\"\nauthor = \"Ada\"").unwrap();
        fs::write(dir.join("problem.ca.toml"), "title = \"Doble\"").unwrap();

        let ap = AbstractProblem::load(&dir).unwrap();
        assert_eq!(ap.structure, Structure::Flat);
        assert_eq!(ap.languages, vec![Language::English, Language::Catalan]);
        assert_eq!(ap.original_language, Language::English);
        assert_eq!(ap.problem_type, ProblemType::Std);
        assert_eq!(ap.original_problem().statement.title, "Double");
    }

    #[test]
    fn test_shallow_bundle() {
        let tmp = TempDir::new().unwrap();
        let dir = bundle(&tmp);
        for (code, body) in [("en", "title = \"Game\""), ("es", "title = \"Juego\"\nauthor = \"Eva\"")] {
            let sub = dir.join(code);
            fs::create_dir(&sub).unwrap();
            fs::write(sub.join("handler.toml"), "handler = \"game\"").unwrap();
            fs::write(sub.join(format!("problem.{}.toml", code)), body).unwrap();
        }

        let ap = AbstractProblem::load(&dir).unwrap();
        assert_eq!(ap.structure, Structure::Shallow);
        assert_eq!(ap.original_language, Language::Spanish);
        assert_eq!(ap.problem_type, ProblemType::Game);
        assert_eq!(
            ap.problems[&Language::English].directory,
            dir.canonicalize().unwrap().join("en")
        );
    }

    #[test]
    fn test_not_a_problem_directory() {
        let tmp = TempDir::new().unwrap();
        let err = AbstractProblem::load(tmp.path()).unwrap_err();
        assert!(matches!(err, ProblemError::NotAProblemDirectory(_)));
    }

    #[test]
    fn test_parent_components_are_resolved() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("sum.pbm");
        fs::create_dir_all(dir.join("en")).unwrap();
        fs::write(dir.join("en").join("handler.toml"), "").unwrap();
        fs::write(
            dir.join("en").join("problem.en.toml"),
            "title = \"Sum\"\nauthor = \"Ada\"\n",
        )
        .unwrap();

        let ap = AbstractProblem::load(&dir.join("en").join("..")).unwrap();
        assert_eq!(ap.directory.file_name().unwrap(), "sum.pbm");
        assert_eq!(ap.structure, Structure::Shallow);
    }

    #[test]
    fn test_handler_mismatch_policies() {
        let tmp = TempDir::new().unwrap();
        let dir = bundle(&tmp);
        for (code, handler, body) in [
            ("en", "handler = \"std\"", "title = \"A\"\nauthor = \"Ada\""),
            ("ca", "handler = \"quiz\"", "title = \"B\""),
        ] {
            let sub = dir.join(code);
            fs::create_dir(&sub).unwrap();
            fs::write(sub.join("handler.toml"), handler).unwrap();
            fs::write(sub.join(format!("problem.{}.toml", code)), body).unwrap();
        }

        assert!(AbstractProblem::load_with_policy(&dir, HandlerMismatchPolicy::Ignore).is_ok());
        assert!(AbstractProblem::load_with_policy(&dir, HandlerMismatchPolicy::Warn).is_ok());
        let err = AbstractProblem::load_with_policy(&dir, HandlerMismatchPolicy::Error).unwrap_err();
        assert!(matches!(err, ProblemError::HandlerMismatch { ref language, .. } if language == "ca"));
    }

    #[test]
    fn test_graphic_and_std_translations_agree() {
        let tmp = TempDir::new().unwrap();
        let dir = bundle(&tmp);
        for (code, handler, body) in [
            ("en", "handler = \"std\"", "title = \"A\"\nauthor = \"Ada\""),
            ("ca", "handler = \"graphic\"", "title = \"B\""),
        ] {
            let sub = dir.join(code);
            fs::create_dir(&sub).unwrap();
            fs::write(sub.join("handler.toml"), handler).unwrap();
            fs::write(sub.join(format!("problem.{}.toml", code)), body).unwrap();
        }
        assert!(AbstractProblem::load_with_policy(&dir, HandlerMismatchPolicy::Error).is_ok());
    }
}
