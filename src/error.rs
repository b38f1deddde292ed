//! Error types for the page shell.

use crate::page::{PageId, PageSide};
use crate::scope::{ScopeId, TypeToken};
use thiserror::Error;

/// Resolution-scope errors
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("No registration for {0}")]
    NotRegistered(TypeToken),

    #[error("Scope {0} has been disposed")]
    Disposed(ScopeId),

    #[error("Circular dependency while resolving {0}")]
    Cycle(TypeToken),

    #[error("{token} resolved as {actual}, expected {expected}")]
    RoleMismatch {
        token: TypeToken,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Instance registered for {0} has a different concrete type")]
    Downcast(TypeToken),

    #[error("Factory for {token} failed: {message}")]
    Factory { token: TypeToken, message: String },
}

/// Errors surfaced by navigation and dialog operations
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Cannot determine the {missing} type for the page (paired from {from:?})")]
    Pairing {
        missing: PageSide,
        from: Option<TypeToken>,
    },

    #[error("Page context {0} used after disposal")]
    UseAfterDispose(PageId),

    #[error("View model {0} is already shown by an open dialog")]
    DialogAlreadyOpen(TypeToken),

    #[error("Dialog nesting exceeds the configured maximum of {0}")]
    NestingTooDeep(usize),

    #[error("Unknown type name: {0}")]
    UnknownType(String),

    #[error("A service provider already exists for key {0}")]
    DuplicateProvider(String),

    #[error("No service provider registered for key {0}")]
    UnknownProvider(String),

    #[error("Dialog presentation failed: {0}")]
    Presentation(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Scope error: {0}")]
    Scope(#[from] ScopeError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for ShellError {
    fn from(err: config::ConfigError) -> Self {
        ShellError::ConfigError(err.to_string())
    }
}

