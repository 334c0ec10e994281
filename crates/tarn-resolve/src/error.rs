//! Resolution error types.

use tarn_syntax::Span;
use thiserror::Error;

/// A name resolution or sort inference error.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("duplicate declaration: {name}")]
    Duplicate { name: String, span: Span },

    #[error("undeclared sort: {name}")]
    UndeclaredSort { name: String, span: Span },

    #[error("unknown identifier: {name}")]
    Unresolved { name: String, span: Span },

    #[error("wrong number of arguments to {name}: expected {expected}, found {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("{name} takes arguments and cannot be used as a plain value")]
    NeedsArguments { name: String, span: Span },

    #[error("{name} cannot be applied to arguments")]
    NotApplicable { name: String, span: Span },

    #[error("cannot infer a sort for bound variable {name}")]
    UnresolvedSort { name: String, span: Span },

    #[error("assignment target {name} is not a mutable state component")]
    NotAssignable { name: String, span: Span },
}

impl ResolveError {
    /// Get the source span of this error.
    pub fn span(&self) -> Span {
        match self {
            ResolveError::Duplicate { span, .. }
            | ResolveError::UndeclaredSort { span, .. }
            | ResolveError::Unresolved { span, .. }
            | ResolveError::ArityMismatch { span, .. }
            | ResolveError::NeedsArguments { span, .. }
            | ResolveError::NotApplicable { span, .. }
            | ResolveError::UnresolvedSort { span, .. }
            | ResolveError::NotAssignable { span, .. } => *span,
        }
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;
