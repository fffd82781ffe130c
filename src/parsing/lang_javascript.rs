//! JavaScript symbol/call/import/export extraction.
//!
//! Shares its CST shape (and most node kinds) with the TypeScript grammar;
//! `lang_typescript.rs` reuses the call/import helpers here and adds the
//! type-only surface TypeScript layers on top.

use std::path::Path;
use std::sync::Mutex;

use tree_sitter::{Node, Parser as TsParser};

use crate::language::LanguageId;
use crate::model::{
    CallSite, ExportBinding, ExportInfo, ExportType, ImportBinding, ImportInfo, ImportType, Span,
    Symbol, SymbolKind, SymbolTree, SyntaxError,
};
use crate::parsing::common::{
    check_recursion_depth, line_at, span_of, strip_comment_delimiters, text_of, trimmed_line_text,
    DocCarry,
};
use crate::parsing::LanguageExtractor;

pub struct JavaScriptExtractor {
    parser: Mutex<TsParser>,
}

impl JavaScriptExtractor {
    pub fn new() -> Self {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .expect("tree-sitter-javascript grammar must load");
        Self {
            parser: Mutex::new(parser),
        }
    }

    fn parse_tree(&self, source: &str) -> Option<tree_sitter::Tree> {
        self.parser.lock().unwrap().parse(source, None)
    }
}

impl Default for JavaScriptExtractor {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn collect_errors(node: Node, source: &str, out: &mut Vec<SyntaxError>) {
    if node.is_error() || node.is_missing() {
        out.push(SyntaxError {
            message: if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                format!("syntax error near '{}'", text_of(&node, source))
            },
            span: span_of(&node),
        });
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_errors(child, source, out);
    }
}

fn is_function_value(node: &Node) -> bool {
    matches!(
        node.kind(),
        "function" | "function_expression" | "arrow_function" | "generator_function"
    )
}

/// Walk one block of statements (a `program` or `statement_block`),
/// emitting symbols. `in_class` governs whether bare function-like
/// declarations should surface as `Method`.
pub(super) fn walk_container(
    node: Node,
    source: &str,
    depth: usize,
    symbols: &mut Vec<Symbol>,
    doc: &mut DocCarry,
) {
    if !check_recursion_depth(depth) {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "comment" => {
                let text = text_of(&child, source);
                doc.see_comment(strip_comment_delimiters(text, &["//"], Some(("/**", "*/"))));
            }
            "function_declaration" | "generator_function_declaration" => {
                emit_function(&child, source, SymbolKind::Function, symbols, doc);
            }
            "class_declaration" => emit_class(&child, source, depth, symbols, doc),
            "lexical_declaration" | "variable_declaration" => {
                emit_declarators(&child, source, symbols, doc);
            }
            "export_statement" => {
                if let Some(decl) = child.child_by_field_name("declaration") {
                    match decl.kind() {
                        "function_declaration" | "generator_function_declaration" => {
                            emit_function(&decl, source, SymbolKind::Function, symbols, doc)
                        }
                        "class_declaration" => emit_class(&decl, source, depth, symbols, doc),
                        "lexical_declaration" | "variable_declaration" => {
                            emit_declarators(&decl, source, symbols, doc)
                        }
                        _ => doc.reset(),
                    }
                } else {
                    doc.reset();
                }
            }
            "import_statement" => doc.reset(),
            _ => doc.reset(),
        }
    }
}

fn emit_function(
    node: &Node,
    source: &str,
    kind: SymbolKind,
    symbols: &mut Vec<Symbol>,
    doc: &mut DocCarry,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        doc.reset();
        return;
    };
    let mut symbol = Symbol::new(text_of(&name_node, source), kind, span_of(node));
    symbol.doc = doc.take();
    if let Some(body) = node.child_by_field_name("body") {
        symbol.body_span = Some(span_of(&body));
    }
    symbols.push(symbol);
}

fn emit_declarators(node: &Node, source: &str, symbols: &mut Vec<Symbol>, doc: &mut DocCarry) {
    let pending_doc = doc.take();
    let mut cursor = node.walk();
    let mut first = true;
    for declarator in node.children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name_node) = declarator.child_by_field_name("name") else {
            continue;
        };
        if name_node.kind() != "identifier" {
            continue; // destructuring targets aren't modeled as symbols
        }
        let name = text_of(&name_node, source);
        let value = declarator.child_by_field_name("value");
        let kind = if value.as_ref().is_some_and(is_function_value) {
            SymbolKind::Function
        } else if node.kind() == "lexical_declaration" && text_of(node, source).trim_start().starts_with("const") {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };
        let mut symbol = Symbol::new(name, kind, span_of(&declarator));
        if first {
            symbol.doc = pending_doc.clone();
            first = false;
        }
        if let Some(value) = &value {
            if is_function_value(value) {
                if let Some(body) = value.child_by_field_name("body") {
                    symbol.body_span = Some(span_of(&body));
                }
            }
        }
        symbols.push(symbol);
    }
}

fn emit_class(node: &Node, source: &str, depth: usize, symbols: &mut Vec<Symbol>, doc: &mut DocCarry) {
    let Some(name_node) = node.child_by_field_name("name") else {
        doc.reset();
        return;
    };
    let mut symbol = Symbol::new(text_of(&name_node, source), SymbolKind::Class, span_of(node));
    symbol.doc = doc.take();
    if let Some(body) = node.child_by_field_name("body") {
        symbol.body_span = Some(span_of(&body));
        if check_recursion_depth(depth + 1) {
            walk_class_body(body, source, &mut symbol.children);
        }
    }
    symbols.push(symbol);
}

fn walk_class_body(node: Node, source: &str, out: &mut Vec<Symbol>) {
    let mut doc = DocCarry::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "comment" => {
                let text = text_of(&child, source);
                doc.see_comment(strip_comment_delimiters(text, &["//"], Some(("/**", "*/"))));
            }
            "method_definition" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    doc.reset();
                    continue;
                };
                let name = text_of(&name_node, source);
                let kind = if name == "constructor" {
                    SymbolKind::Constructor
                } else {
                    SymbolKind::Method
                };
                let mut symbol = Symbol::new(name, kind, span_of(&child));
                symbol.doc = doc.take();
                if let Some(body) = child.child_by_field_name("body") {
                    symbol.body_span = Some(span_of(&body));
                }
                out.push(symbol);
            }
            "field_definition" | "public_field_definition" => {
                if let Some(name_node) = child.child_by_field_name("property") {
                    let mut symbol =
                        Symbol::new(text_of(&name_node, source), SymbolKind::Field, span_of(&child));
                    symbol.doc = doc.take();
                    out.push(symbol);
                } else {
                    doc.reset();
                }
            }
            _ => doc.reset(),
        }
    }
}

pub(super) fn callee_name<'a>(call: &Node, source: &'a str) -> Option<&'a str> {
    let function = call.child_by_field_name("function")?;
    match function.kind() {
        "identifier" => Some(text_of(&function, source)),
        "member_expression" => function
            .child_by_field_name("property")
            .map(|p| text_of(&p, source)),
        _ => None,
    }
}

pub(super) fn collect_calls(
    node: Node,
    source: &str,
    path: &Path,
    enclosing: &str,
    depth: usize,
    out: &mut Vec<CallSite>,
) {
    if !check_recursion_depth(depth) {
        return;
    }
    let mut next_enclosing = enclosing.to_string();
    match node.kind() {
        "function_declaration" | "generator_function_declaration" | "method_definition" => {
            if let Some(name) = node.child_by_field_name("name") {
                next_enclosing = text_of(&name, source).to_string();
            }
        }
        "variable_declarator" => {
            if let (Some(name_node), Some(value)) = (
                node.child_by_field_name("name"),
                node.child_by_field_name("value"),
            ) {
                if is_function_value(&value) && name_node.kind() == "identifier" {
                    next_enclosing = text_of(&name_node, source).to_string();
                }
            }
        }
        "call_expression" => {
            if callee_name(&node, source).is_some() {
                let start = node.start_position();
                out.push(CallSite {
                    file_path: path.to_path_buf(),
                    line: start.row as u32 + 1,
                    column: start.column as u32 + 1,
                    caller_qualified_name: enclosing.to_string(),
                    line_text: trimmed_line_text(source, start.row as u32 + 1),
                });
            }
        }
        _ => {}
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls(child, source, path, &next_enclosing, depth + 1, out);
    }
}

pub(super) fn js_imports(tree: &tree_sitter::Tree, source: &str) -> Vec<ImportInfo> {
    fn walk(node: Node, source: &str, out: &mut Vec<ImportInfo>) {
        if node.kind() == "import_statement" {
            let line = line_at(source, node.start_byte());
            let raw_text = text_of(&node, source).trim().to_string();
            let source_text = node
                .child_by_field_name("source")
                .map(|s| text_of(&s, source).trim_matches(|c| c == '"' || c == '\'').to_string())
                .unwrap_or_default();
            let mut bindings = Vec::new();
            let mut import_type = ImportType::SideEffect;
            if let Some(clause) = node.children(&mut node.walk()).find(|n| n.kind() == "import_clause") {
                let mut cursor = clause.walk();
                for part in clause.children(&mut cursor) {
                    match part.kind() {
                        "identifier" => {
                            import_type = ImportType::Default;
                            bindings.push(ImportBinding {
                                exported_name: "default".to_string(),
                                local_alias: Some(text_of(&part, source).to_string()),
                                is_type_only: false,
                            });
                        }
                        "namespace_import" => {
                            import_type = ImportType::Namespace;
                            if let Some(ident) = part.children(&mut part.walk()).find(|n| n.kind() == "identifier") {
                                bindings.push(ImportBinding {
                                    exported_name: "*".to_string(),
                                    local_alias: Some(text_of(&ident, source).to_string()),
                                    is_type_only: false,
                                });
                            }
                        }
                        "named_imports" => {
                            import_type = ImportType::Named;
                            let mut spec_cursor = part.walk();
                            for spec in part.children(&mut spec_cursor) {
                                if spec.kind() != "import_specifier" {
                                    continue;
                                }
                                let name_node = spec.child_by_field_name("name");
                                let alias_node = spec.child_by_field_name("alias");
                                if let Some(name_node) = name_node {
                                    bindings.push(ImportBinding {
                                        exported_name: text_of(&name_node, source).to_string(),
                                        local_alias: alias_node.map(|a| text_of(&a, source).to_string()),
                                        is_type_only: false,
                                    });
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            out.push(ImportInfo {
                source: source_text,
                import_type,
                bindings,
                line,
                raw_text,
            });
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            walk(child, source, out);
        }
    }
    let mut out = Vec::new();
    walk(tree.root_node(), source, &mut out);
    out
}

pub(super) fn js_exports(tree: &tree_sitter::Tree, source: &str) -> Vec<ExportInfo> {
    fn walk(node: Node, source: &str, out: &mut Vec<ExportInfo>) {
        if node.kind() == "export_statement" {
            let line = line_at(source, node.start_byte());
            let raw_text = text_of(&node, source).lines().next().unwrap_or("").to_string();
            let is_default = node
                .children(&mut node.walk())
                .any(|n| n.kind() == "default");
            if let Some(decl) = node.child_by_field_name("declaration") {
                let name = match decl.kind() {
                    "function_declaration" | "class_declaration" | "generator_function_declaration" => {
                        decl.child_by_field_name("name").map(|n| text_of(&n, source).to_string())
                    }
                    "lexical_declaration" | "variable_declaration" => decl
                        .children(&mut decl.walk())
                        .find(|n| n.kind() == "variable_declarator")
                        .and_then(|d| d.child_by_field_name("name"))
                        .map(|n| text_of(&n, source).to_string()),
                    _ => None,
                };
                if let Some(name) = name {
                    out.push(ExportInfo {
                        export_type: if is_default {
                            ExportType::Default
                        } else {
                            ExportType::Declaration
                        },
                        bindings: vec![ExportBinding {
                            exported_name: if is_default { "default".into() } else { name.clone() },
                            local_name: Some(name),
                            kind: None,
                            is_type_only: false,
                        }],
                        source: None,
                        line,
                        raw_text,
                    });
                }
                return;
            }
            if let Some(source_node) = node.child_by_field_name("source") {
                let source_text = text_of(&source_node, source)
                    .trim_matches(|c| c == '"' || c == '\'')
                    .to_string();
                out.push(ExportInfo {
                    export_type: ExportType::Reexport,
                    bindings: Vec::new(),
                    source: Some(source_text),
                    line,
                    raw_text,
                });
                return;
            }
            if let Some(clause) = node.children(&mut node.walk()).find(|n| n.kind() == "export_clause") {
                let mut bindings = Vec::new();
                let mut cursor = clause.walk();
                for spec in clause.children(&mut cursor) {
                    if spec.kind() != "export_specifier" {
                        continue;
                    }
                    if let Some(name_node) = spec.child_by_field_name("name") {
                        let alias = spec.child_by_field_name("alias");
                        bindings.push(ExportBinding {
                            exported_name: alias
                                .map(|a| text_of(&a, source).to_string())
                                .unwrap_or_else(|| text_of(&name_node, source).to_string()),
                            local_name: Some(text_of(&name_node, source).to_string()),
                            kind: None,
                            is_type_only: false,
                        });
                    }
                }
                out.push(ExportInfo {
                    export_type: ExportType::Named,
                    bindings,
                    source: None,
                    line,
                    raw_text,
                });
            }
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            walk(child, source, out);
        }
    }
    let mut out = Vec::new();
    walk(tree.root_node(), source, &mut out);
    out
}

impl LanguageExtractor for JavaScriptExtractor {
    fn language_id(&self) -> LanguageId {
        LanguageId("javascript")
    }

    fn parse(&self, source: &str, path: &Path) -> SymbolTree {
        let Some(tree) = self.parse_tree(source) else {
            return SymbolTree {
                path: path.to_path_buf(),
                language: "javascript".to_string(),
                symbols: Vec::new(),
                errors: vec![SyntaxError {
                    message: "tree-sitter failed to produce a tree".into(),
                    span: Span::new(crate::model::Position::new(1, 1, 0), crate::model::Position::new(1, 1, 0)),
                }],
            };
        };
        let mut errors = Vec::new();
        collect_errors(tree.root_node(), source, &mut errors);
        let mut symbols = Vec::new();
        let mut doc = DocCarry::new();
        walk_container(tree.root_node(), source, 0, &mut symbols, &mut doc);
        SymbolTree {
            path: path.to_path_buf(),
            language: "javascript".to_string(),
            symbols,
            errors,
        }
    }

    fn extract_calls(&self, source: &str, path: &Path) -> Vec<CallSite> {
        let Some(tree) = self.parse_tree(source) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        collect_calls(tree.root_node(), source, path, "", 0, &mut out);
        out
    }

    fn extract_imports(&self, source: &str, _path: &Path) -> Vec<ImportInfo> {
        let Some(tree) = self.parse_tree(source) else {
            return Vec::new();
        };
        js_imports(&tree, source)
    }

    fn extract_exports(&self, source: &str, _path: &Path) -> Vec<ExportInfo> {
        let Some(tree) = self.parse_tree(source) else {
            return Vec::new();
        };
        js_exports(&tree, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_declaration_with_jsdoc() {
        let extractor = JavaScriptExtractor::new();
        let source = "/** Greets the caller. */\nfunction greet(name) {\n  console.log(name);\n}\n";
        let tree = extractor.parse(source, Path::new("a.js"));
        let greet = tree.visible_symbols().find(|s| s.name == "greet").unwrap();
        assert_eq!(greet.doc.as_deref(), Some("Greets the caller."));
    }

    #[test]
    fn arrow_function_assigned_to_const_is_a_function_symbol() {
        let extractor = JavaScriptExtractor::new();
        let source = "const add = (a, b) => a + b;\n";
        let tree = extractor.parse(source, Path::new("a.js"));
        let add = tree.visible_symbols().find(|s| s.name == "add").unwrap();
        assert_eq!(add.kind, SymbolKind::Function);
    }

    #[test]
    fn class_methods_nest_under_class() {
        let extractor = JavaScriptExtractor::new();
        let source = "class Greeter {\n  constructor() {}\n  hello() {}\n}\n";
        let tree = extractor.parse(source, Path::new("a.js"));
        let class = tree.visible_symbols().find(|s| s.name == "Greeter").unwrap();
        assert_eq!(class.children.len(), 2);
        assert!(class.children.iter().any(|c| c.kind == SymbolKind::Constructor));
    }

    #[test]
    fn extracts_named_and_default_exports() {
        let extractor = JavaScriptExtractor::new();
        let source = "export function greet() {}\nexport default class Widget {}\n";
        let exports = extractor.extract_exports(source, Path::new("a.js"));
        assert_eq!(exports.len(), 2);
        assert!(exports.iter().any(|e| e.export_type == ExportType::Default));
    }

    #[test]
    fn extracts_named_import_bindings() {
        let extractor = JavaScriptExtractor::new();
        let source = "import { readFile, writeFile as wf } from 'fs';\n";
        let imports = extractor.extract_imports(source, Path::new("a.js"));
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].source, "fs");
        assert_eq!(imports[0].bindings.len(), 2);
        assert_eq!(imports[0].bindings[1].local_alias.as_deref(), Some("wf"));
    }
}
