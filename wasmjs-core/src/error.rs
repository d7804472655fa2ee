use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::types::ValueType;

/// Pipeline phase that can reject a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Resolve,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Parse => f.write_str("parsing"),
            Phase::Resolve => f.write_str("resolution"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source: {0}")]
    SourceIo(#[from] std::io::Error),
    #[error("standard library directory was not found at {0}")]
    MissingStdlib(PathBuf),
    #[error("{phase} failed with {} error(s)", .diagnostics.iter().filter(|d| d.is_error()).count())]
    Rejected {
        phase: Phase,
        diagnostics: Vec<Diagnostic>,
    },
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl CoreError {
    /// Diagnostics attached to a rejected phase, if any.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CoreError::Rejected { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

/// A fatal resolution or type error. The first one aborts the module.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("unresolved name `{name}`")]
    UnresolvedName { name: String, span: Span },
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: ValueType,
        found: ValueType,
        span: Span,
    },
    #[error("`{callee}` expects {expected} argument(s) but {found} were supplied")]
    ArityMismatch {
        callee: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    #[error("called expression is not a function or extern")]
    InvalidCallee { span: Span },
    #[error("`{name}` is a function and cannot be used as a value")]
    NotAValue { name: String, span: Span },
    #[error("`{name}` is defined more than once")]
    DuplicateDefinition { name: String, span: Span },
    #[error("function index {index} is out of range")]
    UnknownFunction { index: u32, span: Span },
    #[error("extern index {index} is out of range")]
    UnknownExtern { index: u32, span: Span },
    #[error("local slot {slot} is out of range")]
    UnknownLocal { slot: u32, span: Span },
    #[error("`{name}` cannot have type void")]
    InvalidLocalType { name: String, span: Span },
}

impl ResolveError {
    pub fn span(&self) -> Span {
        match self {
            ResolveError::UnresolvedName { span, .. }
            | ResolveError::TypeMismatch { span, .. }
            | ResolveError::ArityMismatch { span, .. }
            | ResolveError::InvalidCallee { span }
            | ResolveError::NotAValue { span, .. }
            | ResolveError::DuplicateDefinition { span, .. }
            | ResolveError::UnknownFunction { span, .. }
            | ResolveError::UnknownExtern { span, .. }
            | ResolveError::UnknownLocal { span, .. }
            | ResolveError::InvalidLocalType { span, .. } => *span,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::UnresolvedName { .. } => "E0200",
            ResolveError::TypeMismatch { .. } => "E0201",
            ResolveError::ArityMismatch { .. } => "E0202",
            ResolveError::InvalidCallee { .. } => "E0203",
            ResolveError::NotAValue { .. } => "E0204",
            ResolveError::DuplicateDefinition { .. } => "E0205",
            ResolveError::UnknownFunction { .. } => "E0206",
            ResolveError::UnknownExtern { .. } => "E0207",
            ResolveError::UnknownLocal { .. } => "E0208",
            ResolveError::InvalidLocalType { .. } => "E0209",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string(), self.span()).with_code(self.code())
    }
}

/// The emitter met a resolved reference with no target. This is a broken
/// pipeline contract rather than a user error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("internal codegen error: function `{function}` has no local slot {slot}")]
    UnknownLocal { function: String, slot: u32 },
    #[error("internal codegen error: no function at index {0}")]
    UnknownFunction(u32),
    #[error("internal codegen error: no extern at index {0}")]
    UnknownExtern(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_resolve_error_to_diagnostic() {
        let err = ResolveError::ArityMismatch {
            callee: "zero".into(),
            expected: 0,
            found: 1,
            span: Span::dummy(),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, Some("E0202"));
        assert_eq!(
            diag.message,
            "`zero` expects 0 argument(s) but 1 were supplied"
        );
    }

    #[test]
    fn rejected_error_counts_errors() {
        let err = CoreError::Rejected {
            phase: Phase::Resolve,
            diagnostics: vec![Diagnostic::error("x", Span::dummy())],
        };
        assert_eq!(err.to_string(), "resolution failed with 1 error(s)");
    }
}
