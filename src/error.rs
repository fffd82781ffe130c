//! Error taxonomy for the code intelligence engine.
//!
//! Mirrors the kinds spec'd in the design, not implementation accidents:
//! `InputError`, `NotFound`, `AmbiguousTarget`, `IoError`, `NotInitialized`,
//! `Cancelled`. `ParseFailure` is deliberately absent here — parse problems
//! are surfaced as data on `SymbolTree::errors`, never as a hard error at
//! the component boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Machine-readable error kind, stable across error message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputError,
    NotFound,
    AmbiguousTarget,
    IoError,
    NotInitialized,
    Cancelled,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("unknown language for file '{path}'")]
    UnknownLanguage { path: PathBuf },

    #[error("file not found in index: '{path}'")]
    FileNotFound { path: PathBuf },

    #[error("symbol not found: '{name}'")]
    SymbolNotFound { name: String },

    #[error("qualified name not found in '{path}': '{name}'")]
    QualifiedNameNotFound { path: PathBuf, name: String },

    #[error("'{target}' is ambiguous: {} candidates", candidates.len())]
    AmbiguousTarget {
        target: String,
        candidates: Vec<String>,
    },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} requires the index to be built first; call indexProject()")]
    NotInitialized { operation: &'static str },

    #[error("operation cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidRegex { .. } | EngineError::UnknownLanguage { .. } => {
                ErrorKind::InputError
            }
            EngineError::FileNotFound { .. }
            | EngineError::SymbolNotFound { .. }
            | EngineError::QualifiedNameNotFound { .. } => ErrorKind::NotFound,
            EngineError::AmbiguousTarget { .. } => ErrorKind::AmbiguousTarget,
            EngineError::Io { .. } => ErrorKind::IoError,
            EngineError::NotInitialized { .. } => ErrorKind::NotInitialized,
            EngineError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Short, actionable next step. Not exhaustive by design — unmapped
    /// variants simply have nothing to suggest.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            EngineError::NotInitialized { .. } => Some("call indexProject(root) first"),
            EngineError::AmbiguousTarget { .. } => {
                Some("disambiguate by qualified name or file path")
            }
            EngineError::InvalidRegex { .. } => Some("check the pattern is valid regex"),
            _ => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_correctly() {
        assert_eq!(
            EngineError::SymbolNotFound { name: "x".into() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::AmbiguousTarget {
                target: "x".into(),
                candidates: vec!["a".into(), "b".into()]
            }
            .kind(),
            ErrorKind::AmbiguousTarget
        );
        assert_eq!(
            EngineError::NotInitialized {
                operation: "searchSymbols"
            }
            .kind(),
            ErrorKind::NotInitialized
        );
    }
}
