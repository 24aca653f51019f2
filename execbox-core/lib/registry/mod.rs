//! Language profile registry.
//!
//! The registry is a closed, immutable lookup table from a language identifier to its
//! [`ExecutionProfile`]. It is built once at startup from a YAML document, either the built-in
//! table shipped with this crate or an operator-supplied file, so adding a language is a data
//! change rather than a code change.
//!
//! Lookups are pure: resolving an unknown identifier returns `None` and never touches the
//! container runtime.

mod profile;

use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

use serde::Deserialize;

use crate::{ExecboxError, ExecboxResult};

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use profile::*;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The built-in language table
pub const BUILTIN_LANGUAGES_YAML: &str = include_str!("languages.yaml");

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The on-disk shape of a language profile document.
#[derive(Debug, Deserialize)]
struct ProfileDocument {
    languages: Vec<ExecutionProfile>,
}

/// Immutable mapping from language identifiers (and their aliases) to execution profiles.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    profiles: BTreeMap<String, ExecutionProfile>,
    aliases: HashMap<String, String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl LanguageRegistry {
    /// Builds the registry from the built-in language table.
    pub fn builtin() -> ExecboxResult<Self> {
        Self::from_yaml_str(BUILTIN_LANGUAGES_YAML)
    }

    /// Builds the registry from a YAML document with a top-level `languages` list.
    pub fn from_yaml_str(document: &str) -> ExecboxResult<Self> {
        let document: ProfileDocument = serde_yaml::from_str(document)?;
        Self::from_profiles(document.languages)
    }

    /// Builds the registry from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> ExecboxResult<Self> {
        let document = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&document)
    }

    /// Builds the registry from a list of profiles, validating each one.
    pub fn from_profiles(profiles: Vec<ExecutionProfile>) -> ExecboxResult<Self> {
        let mut by_id = BTreeMap::new();
        let mut aliases = HashMap::new();

        for profile in profiles {
            profile.validate()?;
            let language_id = profile.get_language_id().clone();

            for alias in profile.get_aliases() {
                if aliases.insert(alias.clone(), language_id.clone()).is_some() {
                    return Err(ExecboxError::DuplicateLanguage(alias.clone()));
                }
            }

            if by_id.insert(language_id.clone(), profile).is_some() {
                return Err(ExecboxError::DuplicateLanguage(language_id));
            }
        }

        if let Some(alias) = aliases.keys().find(|alias| by_id.contains_key(*alias)) {
            return Err(ExecboxError::DuplicateLanguage(alias.clone()));
        }

        Ok(Self {
            profiles: by_id,
            aliases,
        })
    }

    /// Resolves a language identifier or alias to its profile.
    ///
    /// Returns `None` when the language is not supported.
    pub fn resolve(&self, language_id: &str) -> Option<&ExecutionProfile> {
        let language_id = language_id.trim();
        self.profiles.get(language_id).or_else(|| {
            self.aliases
                .get(language_id)
                .and_then(|canonical| self.profiles.get(canonical))
        })
    }

    /// Checks whether a language identifier or alias is supported.
    pub fn is_supported(&self, language_id: &str) -> bool {
        self.resolve(language_id).is_some()
    }

    /// Returns the canonical identifiers of every supported language, sorted.
    pub fn languages(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    /// Returns every profile, sorted by language identifier.
    pub fn profiles(&self) -> impl Iterator<Item = &ExecutionProfile> {
        self.profiles.values()
    }

    /// Returns the number of supported languages, not counting aliases.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Checks whether the registry has no languages.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_builtin_registry_has_original_languages() {
        let registry = LanguageRegistry::builtin().unwrap();
        assert_eq!(
            registry.languages(),
            vec!["c", "cpp", "go", "java", "javascript", "python", "ruby", "typescript"]
        );
    }

    #[test]
    fn test_every_builtin_command_references_its_entry_file() {
        let registry = LanguageRegistry::builtin().unwrap();
        for profile in registry.profiles() {
            let command = profile.render_command();
            assert!(
                command.iter().any(|arg| arg.contains(profile.get_entry_filename())),
                "{} does not reference {}",
                profile.get_language_id(),
                profile.get_entry_filename()
            );
            assert!(
                !command.iter().any(|arg| arg.contains("{entry}")),
                "{} left a placeholder unrendered",
                profile.get_language_id()
            );
        }
    }

    #[test]
    fn test_builtin_commands_read_code_from_env_only() {
        let registry = LanguageRegistry::builtin().unwrap();
        for profile in registry.profiles() {
            let script = profile.render_command().join(" ");
            assert!(script.contains("\"$CODE\""), "{}", profile.get_language_id());
        }
    }

    #[test]
    fn test_resolve_known_language_and_alias() {
        let registry = LanguageRegistry::builtin().unwrap();

        let python = registry.resolve("python").unwrap();
        assert_eq!(python.get_image_reference(), "python:3.12-slim");
        assert_eq!(python.get_entry_filename(), "main.py");

        let by_alias = registry.resolve("py").unwrap();
        assert_eq!(by_alias, python);

        let java = registry.resolve(" java ").unwrap();
        assert_eq!(java.get_entry_filename(), "Main.java");
    }

    #[test]
    fn test_resolve_unsupported_language() {
        let registry = LanguageRegistry::builtin().unwrap();
        for language in ["cobol", "", "PYTHON", "brainfuck"] {
            assert!(registry.resolve(language).is_none(), "{}", language);
            assert!(!registry.is_supported(language));
        }
    }

    #[test]
    fn test_duplicate_identifiers_are_rejected() {
        let document = r#"
languages:
  - language: python
    image: python:3.12-slim
    entry: main.py
    command: ["sh", "-c", "python {entry}"]
  - language: python
    image: python:3.11-slim
    entry: main.py
    command: ["sh", "-c", "python {entry}"]
"#;
        assert!(matches!(
            LanguageRegistry::from_yaml_str(document),
            Err(ExecboxError::DuplicateLanguage(id)) if id == "python"
        ));
    }

    #[test]
    fn test_alias_shadowing_a_language_is_rejected() {
        let document = r#"
languages:
  - language: python
    aliases: [ruby]
    image: python:3.12-slim
    entry: main.py
    command: ["sh", "-c", "python {entry}"]
  - language: ruby
    image: ruby:3.2-slim
    entry: script.rb
    command: ["sh", "-c", "ruby {entry}"]
"#;
        assert!(matches!(
            LanguageRegistry::from_yaml_str(document),
            Err(ExecboxError::DuplicateLanguage(_))
        ));
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        assert!(matches!(
            LanguageRegistry::from_yaml_str("languages: nope"),
            Err(ExecboxError::ProfileParse(_))
        ));
    }

    #[test]
    fn test_registry_from_file_replaces_builtin_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
languages:
  - language: lua
    image: nickblah/lua:5.4
    entry: main.lua
    command: ["sh", "-c", "printf '%s\n' \"$CODE\" > {{entry}} && lua {{entry}}"]
"#
        )
        .unwrap();

        let registry = LanguageRegistry::from_file(file.path()).unwrap();
        assert_eq!(registry.languages(), vec!["lua"]);
        assert!(registry.resolve("python").is_none());
        assert_eq!(registry.len(), 1);
    }
}
