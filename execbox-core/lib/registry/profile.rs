//! The execution profile of a single language.

use execbox_utils::ENTRY_PLACEHOLDER;
use getset::Getters;
use serde::{Deserialize, Serialize};

use crate::{ExecboxError, ExecboxResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// How snippets of one language are run: which image, which file the snippet is written to and
/// which command writes and runs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[getset(get = "pub with_prefix")]
pub struct ExecutionProfile {
    /// The language identifier requests use
    #[serde(rename = "language")]
    language_id: String,

    /// Other identifiers that resolve to this profile
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    aliases: Vec<String>,

    /// The image the execution unit is created from
    #[serde(rename = "image")]
    image_reference: String,

    /// The file the snippet is written to inside the unit
    #[serde(rename = "entry")]
    entry_filename: String,

    /// The entry command; arguments may contain the `{entry}` placeholder
    #[serde(rename = "command")]
    run_command: Vec<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ExecutionProfile {
    /// Creates a new execution profile.
    pub fn new(
        language_id: impl Into<String>,
        image_reference: impl Into<String>,
        entry_filename: impl Into<String>,
        run_command: Vec<String>,
    ) -> Self {
        Self {
            language_id: language_id.into(),
            aliases: Vec::new(),
            image_reference: image_reference.into(),
            entry_filename: entry_filename.into(),
            run_command,
        }
    }

    /// Returns the run command with every `{entry}` placeholder replaced by the entry filename.
    pub fn render_command(&self) -> Vec<String> {
        self.run_command
            .iter()
            .map(|arg| arg.replace(ENTRY_PLACEHOLDER, &self.entry_filename))
            .collect()
    }

    /// Checks that the profile can be provisioned.
    ///
    /// The rendered command must mention the entry file, otherwise the snippet is never run.
    pub fn validate(&self) -> ExecboxResult<()> {
        let invalid = |reason: &str| ExecboxError::InvalidProfile {
            language: self.language_id.clone(),
            reason: reason.to_string(),
        };

        if self.language_id.trim().is_empty() {
            return Err(invalid("language identifier cannot be empty"));
        }

        if self.image_reference.trim().is_empty() {
            return Err(invalid("image reference cannot be empty"));
        }

        if self.entry_filename.is_empty()
            || self.entry_filename.contains('/')
            || self.entry_filename.contains('\\')
            || self.entry_filename.starts_with('.')
        {
            return Err(invalid("entry filename must be a plain file name"));
        }

        if self.run_command.is_empty() {
            return Err(invalid("run command cannot be empty"));
        }

        if !self
            .render_command()
            .iter()
            .any(|arg| arg.contains(&self.entry_filename))
        {
            return Err(invalid("run command never references the entry filename"));
        }

        if self.aliases.iter().any(|alias| alias.trim().is_empty()) {
            return Err(invalid("aliases cannot be empty"));
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_render_command_substitutes_entry() {
        let profile = ExecutionProfile::new(
            "python",
            "python:3.12-slim",
            "main.py",
            sh("printf '%s\\n' \"$CODE\" > {entry} && python {entry}"),
        );

        let command = profile.render_command();
        assert_eq!(command[0], "sh");
        assert_eq!(
            command[2],
            "printf '%s\\n' \"$CODE\" > main.py && python main.py"
        );
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_command_without_entry() {
        let profile =
            ExecutionProfile::new("python", "python:3.12-slim", "main.py", sh("python -V"));
        assert!(matches!(
            profile.validate(),
            Err(ExecboxError::InvalidProfile { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_path_like_entry() {
        let profile = ExecutionProfile::new(
            "python",
            "python:3.12-slim",
            "../main.py",
            sh("python {entry}"),
        );
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        assert!(ExecutionProfile::new("", "img", "a.py", sh("{entry}"))
            .validate()
            .is_err());
        assert!(ExecutionProfile::new("py", " ", "a.py", sh("{entry}"))
            .validate()
            .is_err());
        assert!(ExecutionProfile::new("py", "img", "a.py", vec![])
            .validate()
            .is_err());
    }
}
