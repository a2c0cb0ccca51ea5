//! Error types for temporal-resolver operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("Invalid reference instant: {0}")]
    InvalidReference(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Conflicting payload: {0}")]
    ConflictingPayload(String),

    #[error("Invalid fragment: {0}")]
    InvalidFragment(String),

    #[error("Nesting too deep: {0}")]
    NestingTooDeep(String),
}

pub type Result<T> = std::result::Result<T, ResolverError>;
