// Command Spec Domain Model

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{DomainError, Result};

/// Immutable description of one launchable service
///
/// The command is an opaque shell invocation; the working directory is not
/// checked here because the OS reports a missing directory at spawn time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    name: String,
    command: String,
    working_dir: PathBuf,
    url: Option<String>,
}

impl CommandSpec {
    /// Create a new command spec
    ///
    /// # Errors
    /// - DomainError::EmptyName if `name` is blank
    /// - DomainError::EmptyCommand if `command` is blank
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        working_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let name = name.into();
        let command = command.into();

        if name.trim().is_empty() {
            return Err(DomainError::EmptyName);
        }
        if command.trim().is_empty() {
            return Err(DomainError::EmptyCommand(name));
        }

        Ok(Self {
            name,
            command,
            working_dir: working_dir.into(),
            url: None,
        })
    }

    /// Attach the address the service announces once started
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} in {})",
            self.name,
            self.command,
            self.working_dir.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid_spec() {
        let spec = CommandSpec::new("Slides", "npx slidev --open", "/srv/slides").unwrap();

        assert_eq!(spec.name(), "Slides");
        assert_eq!(spec.command(), "npx slidev --open");
        assert_eq!(spec.working_dir(), Path::new("/srv/slides"));
        assert_eq!(spec.url(), None);
    }

    #[test]
    fn test_empty_command_rejected() {
        let err = CommandSpec::new("Convex", "   ", "/tmp").unwrap_err();
        assert_eq!(err, DomainError::EmptyCommand("Convex".to_string()));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = CommandSpec::new("", "sleep 1", "/tmp").unwrap_err();
        assert_eq!(err, DomainError::EmptyName);
    }

    #[test]
    fn test_missing_dir_is_not_validated() {
        // The spawn call is responsible for reporting this
        let spec = CommandSpec::new("A", "true", "/definitely/not/here");
        assert!(spec.is_ok());
    }

    #[test]
    fn test_with_url() {
        let spec = CommandSpec::new("Next.js", "npm run dev", "/srv/app")
            .unwrap()
            .with_url("http://localhost:3001");

        assert_eq!(spec.url(), Some("http://localhost:3001"));
        assert_eq!(spec.to_string(), "Next.js (npm run dev in /srv/app)");
    }
}
