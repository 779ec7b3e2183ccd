// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Service name must not be empty")]
    EmptyName,

    #[error("Command for service '{0}' must not be empty")]
    EmptyCommand(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
