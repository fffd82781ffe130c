//! Multi-language code intelligence: parses a source workspace into symbol
//! trees, then answers questions about symbols, references, call graphs,
//! import dependencies, and composed insights over files, directories, and
//! symbols.
//!
//! `index::ProjectIndex` is the entry point most callers want; the other
//! modules are its building blocks and can be used standalone (e.g.
//! `parsing::Parser` alone, without ever building a `ProjectIndex`).

pub mod analysis;
pub mod cache;
pub mod config;
pub mod deps;
pub mod error;
pub mod fs;
pub mod git;
pub mod index;
pub mod insight;
pub mod language;
pub mod logging;
pub mod model;
pub mod parsing;
pub mod scanner;
pub mod watcher;

pub use error::{EngineError, EngineResult, ErrorKind};
pub use index::{IndexState, ProjectIndex, SearchResults};
pub use insight::{Insight, InsightOptions};
pub use model::{
    CallSite, Cycle, DependencyAnalysis, ExportInfo, FileId, ImportInfo, IndexStats,
    IndexedSymbol, Position, Span, Symbol, SymbolId, SymbolKind, SymbolReference, SymbolTree,
};
