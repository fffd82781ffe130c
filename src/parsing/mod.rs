//! The Parser (spec §4.3): drives tree-sitter per language and produces the
//! common `SymbolTree` plus the call/import/export extractors.
//!
//! Dispatch is a per-language function table keyed by `LanguageId` (spec
//! §9: "do NOT model this with deep inheritance"), not a class hierarchy.

pub mod common;
pub mod lang_go;
pub mod lang_java;
pub mod lang_javascript;
pub mod lang_python;
pub mod lang_rust;
pub mod lang_typescript;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::language::LanguageId;
use crate::model::{CallSite, ExportInfo, ImportInfo, SymbolTree};

/// Per-language capability set. Each language's extractor is one variant of
/// this trait, registered once in `Parser::with_default_languages`.
pub trait LanguageExtractor: Send + Sync {
    fn language_id(&self) -> LanguageId;

    /// Always produces a tree; `errors` is non-empty when the CST contains
    /// error/missing nodes (spec §4.3).
    fn parse(&self, source: &str, path: &Path) -> SymbolTree;

    fn extract_calls(&self, source: &str, path: &Path) -> Vec<CallSite>;

    fn extract_imports(&self, source: &str, path: &Path) -> Vec<ImportInfo>;

    fn extract_exports(&self, source: &str, path: &Path) -> Vec<ExportInfo>;
}

/// Dispatches to the registered extractor for a file's detected language.
#[derive(Clone)]
pub struct Parser {
    extractors: HashMap<LanguageId, Arc<dyn LanguageExtractor>>,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    pub fn register(&mut self, extractor: Arc<dyn LanguageExtractor>) {
        self.extractors.insert(extractor.language_id(), extractor);
    }

    pub fn with_default_languages() -> Self {
        let mut parser = Self::new();
        parser.register(Arc::new(lang_rust::RustExtractor::new()));
        parser.register(Arc::new(lang_python::PythonExtractor::new()));
        parser.register(Arc::new(lang_javascript::JavaScriptExtractor::new()));
        parser.register(Arc::new(lang_typescript::TypeScriptExtractor::new()));
        parser.register(Arc::new(lang_go::GoExtractor::new()));
        parser.register(Arc::new(lang_java::JavaExtractor::new()));
        parser
    }

    pub fn extractor_for(&self, language: LanguageId) -> Option<&Arc<dyn LanguageExtractor>> {
        self.extractors.get(&language)
    }

    pub fn parse(&self, language: LanguageId, source: &str, path: &Path) -> Option<SymbolTree> {
        self.extractor_for(language).map(|e| e.parse(source, path))
    }

    pub fn extract_calls(&self, language: LanguageId, source: &str, path: &Path) -> Vec<CallSite> {
        self.extractor_for(language)
            .map(|e| e.extract_calls(source, path))
            .unwrap_or_default()
    }

    pub fn extract_imports(
        &self,
        language: LanguageId,
        source: &str,
        path: &Path,
    ) -> Vec<ImportInfo> {
        self.extractor_for(language)
            .map(|e| e.extract_imports(source, path))
            .unwrap_or_default()
    }

    pub fn extract_exports(
        &self,
        language: LanguageId,
        source: &str,
        path: &Path,
    ) -> Vec<ExportInfo> {
        self.extractor_for(language)
            .map(|e| e.extract_exports(source, path))
            .unwrap_or_default()
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::with_default_languages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn dispatches_to_the_registered_language() {
        let parser = Parser::with_default_languages();
        let path = PathBuf::from("a.rs");
        let tree = parser
            .parse(LanguageId("rust"), "fn greet() {}", &path)
            .expect("rust is registered");
        assert_eq!(tree.language, "rust");
    }

    #[test]
    fn unregistered_language_yields_nothing() {
        let parser = Parser::new();
        let path = PathBuf::from("a.rs");
        assert!(parser.parse(LanguageId("rust"), "fn x() {}", &path).is_none());
    }
}