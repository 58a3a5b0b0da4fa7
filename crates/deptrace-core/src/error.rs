//! Error types shared across the crate

use crate::model::MethodRef;
use thiserror::Error;

/// Failure to parse a textual descriptor or reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid type descriptor: {0}")]
    InvalidTypeDescriptor(String),
    #[error("invalid method descriptor: {0}")]
    InvalidMethodDescriptor(String),
    #[error("invalid method reference: {0}")]
    InvalidMethodReference(String),
    #[error("invalid field reference: {0}")]
    InvalidFieldReference(String),
}

/// Errors surfaced by the analysis API.
///
/// The fixpoint itself never fails; these only guard misuse of the session
/// from the outside.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("entry point {0} cannot be resolved")]
    EntryPointNotFound(MethodRef),
    #[error("analysis has pending work; call process_dependencies() before reading results")]
    NotSettled,
    #[error("method {0} was never linked")]
    UnknownMethod(MethodRef),
    #[error("method {method} has no parameter slot {index}")]
    InvalidParameter { method: MethodRef, index: usize },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
