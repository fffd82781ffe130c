//! Core data model: positions, spans, symbols, symbol trees, and the flat
//! cross-file records the index exposes to callers.
//!
//! Everything here is plain data — no behavior lives on these types beyond
//! small invariant-preserving constructors. The components in `index`,
//! `analysis`, and `deps` own the logic that produces and consumes them.

use std::num::NonZeroU32;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Opaque per-file identifier assigned by the Project Index on first sight
/// of a path. Never reused after a file is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(NonZeroU32);

impl FileId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

/// Opaque per-symbol identifier, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolId(NonZeroU32);

impl SymbolId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

/// A 1-indexed line/column position plus the 0-indexed byte offset that
/// uniquely identifies it. `line`/`column` are derivable from `offset` and
/// the file content; both are carried so callers never need the source to
/// display a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

/// Inclusive-start, exclusive-end character span within a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start.offset <= end.offset);
        Self { start, end }
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }
}

/// Closed enumeration of recognized symbol kinds. New kinds are added here,
/// never modeled as a catch-all "other" variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Module,
    Namespace,
    Class,
    Interface,
    TypeAlias,
    Enum,
    EnumMember,
    Function,
    Method,
    Constructor,
    Property,
    Field,
    Variable,
    Constant,
    Parameter,
    Import,
}

impl SymbolKind {
    /// Container kinds may hold children; spec §4.3 recurses into these
    /// node types only, never into function/method bodies.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            SymbolKind::Class
                | SymbolKind::Interface
                | SymbolKind::Namespace
                | SymbolKind::Enum
                | SymbolKind::Module
        )
    }
}

/// A named declaration plus its hierarchy of children.
///
/// Invariant: a child's span is contained within its parent's body span
/// (`Span::contains`). Invariant: children are non-empty only for
/// `SymbolKind::is_container` kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub declaration_span: Span,
    pub body_span: Option<Span>,
    pub doc: Option<String>,
    pub children: Vec<Symbol>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, declaration_span: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            declaration_span,
            body_span: None,
            doc: None,
            children: Vec::new(),
        }
    }
}

/// A single syntax problem surfaced by the parser. Parse errors are always
/// data, never a hard failure at the component boundary (spec §7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
}

/// A file's full symbol hierarchy plus any parse errors. Always produced by
/// `parse`, even for unparseable input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolTree {
    pub path: PathBuf,
    pub language: String,
    pub symbols: Vec<Symbol>,
    pub errors: Vec<SyntaxError>,
}

impl SymbolTree {
    /// Top-level symbols with `import`-kind entries filtered out, for
    /// visual listing (spec §3: imports live in the tree but not the
    /// listing).
    pub fn visible_symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.kind != SymbolKind::Import)
    }
}

/// Flattened cross-file record held by the Project Index's symbol table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedSymbol {
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub file_path: PathBuf,
    pub start_line: u32,
    pub end_line: u32,
}

/// How a binding was imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportType {
    Default,
    Named,
    Namespace,
    SideEffect,
    Type,
    Require,
}

/// A single name brought into scope by an import statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBinding {
    pub exported_name: String,
    pub local_alias: Option<String>,
    pub is_type_only: bool,
}

/// One import statement/declaration, common across languages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportInfo {
    pub source: String,
    pub import_type: ImportType,
    pub bindings: Vec<ImportBinding>,
    pub line: u32,
    pub raw_text: String,
}

/// How a binding was exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportType {
    Named,
    Default,
    Declaration,
    Reexport,
    Namespace,
}

/// One name exported from a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBinding {
    pub exported_name: String,
    pub local_name: Option<String>,
    pub kind: Option<SymbolKind>,
    pub is_type_only: bool,
}

/// One export statement/declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportInfo {
    pub export_type: ExportType,
    pub bindings: Vec<ExportBinding>,
    pub source: Option<String>,
    pub line: u32,
    pub raw_text: String,
}

/// A source position at which one symbol invokes another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSite {
    pub file_path: PathBuf,
    pub line: u32,
    pub column: u32,
    pub caller_qualified_name: String,
    pub line_text: String,
}

/// An occurrence of a symbol's name in source, definition or use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReference {
    pub file_path: PathBuf,
    pub symbol_name: String,
    pub line: u32,
    pub column: u32,
    pub line_text: String,
    pub is_definition: bool,
}

/// One closed walk in the import graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub files: Vec<PathBuf>,
    pub closing_import: ClosingImport,
}

/// The import edge that closes a cycle back to its start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingImport {
    pub from_file: PathBuf,
    pub to_file: PathBuf,
    pub line: u32,
}

/// A file ranked by how many other files it imports (out-degree) or is
/// imported by (in-degree).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeRank {
    pub file_path: PathBuf,
    pub degree: usize,
}

/// Result of `analyzeDependencies()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyAnalysis {
    pub total_files: usize,
    pub total_imports: usize,
    pub top_out_degree: Vec<DegreeRank>,
    pub top_in_degree: Vec<DegreeRank>,
    pub cycles: Vec<Cycle>,
}

/// Stats returned by `indexProject` / `getStats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub files_indexed: usize,
    pub symbols_indexed: usize,
    pub parse_errors: usize,
    pub language_histogram: std::collections::BTreeMap<String, usize>,
    pub last_indexed_unix_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32, column: u32, offset: usize) -> Position {
        Position::new(line, column, offset)
    }

    #[test]
    fn span_contains_respects_offsets() {
        let outer = Span::new(pos(1, 1, 0), pos(10, 1, 100));
        let inner = Span::new(pos(2, 1, 5), pos(3, 1, 20));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn container_kinds_are_closed() {
        assert!(SymbolKind::Class.is_container());
        assert!(SymbolKind::Module.is_container());
        assert!(!SymbolKind::Function.is_container());
        assert!(!SymbolKind::Import.is_container());
    }

    #[test]
    fn visible_symbols_excludes_imports() {
        let tree = SymbolTree {
            path: PathBuf::from("a.ts"),
            language: "typescript".into(),
            symbols: vec![
                Symbol::new("foo", SymbolKind::Import, Span::new(pos(1, 1, 0), pos(1, 10, 10))),
                Symbol::new(
                    "greet",
                    SymbolKind::Function,
                    Span::new(pos(2, 1, 11), pos(2, 20, 30)),
                ),
            ],
            errors: vec![],
        };
        let visible: Vec<_> = tree.visible_symbols().collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "greet");
    }
}
