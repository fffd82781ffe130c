//! TypeScript symbol/call/import/export extraction.
//!
//! Builds on `lang_javascript`'s call-site, import, and export walkers —
//! the TypeScript grammar keeps the same node kinds for those constructs —
//! and adds the declarations only TypeScript has: `interface`, `type`
//! aliases, and `enum`.

use std::path::Path;
use std::sync::Mutex;

use tree_sitter::{Node, Parser as TsParser};

use crate::language::LanguageId;
use crate::model::{
    CallSite, ExportInfo, ImportInfo, Span, Symbol, SymbolKind, SymbolTree, SyntaxError,
};
use crate::parsing::common::{
    check_recursion_depth, span_of, strip_comment_delimiters, text_of, DocCarry,
};
use crate::parsing::lang_javascript::{self, collect_calls, collect_errors, js_exports, js_imports};
use crate::parsing::LanguageExtractor;

pub struct TypeScriptExtractor {
    parser: Mutex<TsParser>,
}

impl TypeScriptExtractor {
    pub fn new() -> Self {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .expect("tree-sitter-typescript grammar must load");
        Self {
            parser: Mutex::new(parser),
        }
    }

    fn parse_tree(&self, source: &str) -> Option<tree_sitter::Tree> {
        self.parser.lock().unwrap().parse(source, None)
    }
}

impl Default for TypeScriptExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn walk_container(node: Node, source: &str, depth: usize, symbols: &mut Vec<Symbol>, doc: &mut DocCarry) {
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
            "interface_declaration" => emit_interface(&child, source, depth, symbols, doc),
            "type_alias_declaration" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    let mut symbol =
                        Symbol::new(text_of(&name_node, source), SymbolKind::TypeAlias, span_of(&child));
                    symbol.doc = doc.take();
                    symbols.push(symbol);
                } else {
                    doc.reset();
                }
            }
            "enum_declaration" => emit_enum(&child, source, depth, symbols, doc),
            "export_statement" => {
                if let Some(decl) = child.child_by_field_name("declaration") {
                    match decl.kind() {
                        "interface_declaration" => emit_interface(&decl, source, depth, symbols, doc),
                        "type_alias_declaration" => {
                            if let Some(name_node) = decl.child_by_field_name("name") {
                                let mut symbol = Symbol::new(
                                    text_of(&name_node, source),
                                    SymbolKind::TypeAlias,
                                    span_of(&decl),
                                );
                                symbol.doc = doc.take();
                                symbols.push(symbol);
                            }
                        }
                        "enum_declaration" => emit_enum(&decl, source, depth, symbols, doc),
                        // function/class/variable exports are collected by the
                        // separate merged pass through `lang_javascript::walk_container`
                        // in `parse`, so nothing to do here.
                        _ => doc.reset(),
                    }
                } else {
                    doc.reset();
                }
            }
            _ => doc.reset(),
        }
    }
}

fn emit_interface(node: &Node, source: &str, depth: usize, symbols: &mut Vec<Symbol>, doc: &mut DocCarry) {
    let Some(name_node) = node.child_by_field_name("name") else {
        doc.reset();
        return;
    };
    let mut symbol = Symbol::new(text_of(&name_node, source), SymbolKind::Interface, span_of(node));
    symbol.doc = doc.take();
    if let Some(body) = node.child_by_field_name("body") {
        symbol.body_span = Some(span_of(&body));
        let mut member_doc = DocCarry::new();
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "comment" => {
                    let text = text_of(&member, source);
                    member_doc.see_comment(strip_comment_delimiters(text, &["//"], Some(("/**", "*/"))));
                }
                "method_signature" => {
                    if let Some(mname) = member.child_by_field_name("name") {
                        if !check_recursion_depth(depth + 1) {
                            continue;
                        }
                        let mut msym =
                            Symbol::new(text_of(&mname, source), SymbolKind::Method, span_of(&member));
                        msym.doc = member_doc.take();
                        symbol.children.push(msym);
                    }
                }
                "property_signature" => {
                    if let Some(pname) = member.child_by_field_name("name") {
                        let mut psym =
                            Symbol::new(text_of(&pname, source), SymbolKind::Property, span_of(&member));
                        psym.doc = member_doc.take();
                        symbol.children.push(psym);
                    }
                }
                _ => member_doc.reset(),
            }
        }
    }
    symbols.push(symbol);
}

fn emit_enum(node: &Node, source: &str, depth: usize, symbols: &mut Vec<Symbol>, doc: &mut DocCarry) {
    let Some(name_node) = node.child_by_field_name("name") else {
        doc.reset();
        return;
    };
    let mut symbol = Symbol::new(text_of(&name_node, source), SymbolKind::Enum, span_of(node));
    symbol.doc = doc.take();
    if let Some(body) = node.child_by_field_name("body") {
        symbol.body_span = Some(span_of(&body));
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if member.kind() == "property_identifier" || member.kind() == "enum_assignment" {
                let name_node = if member.kind() == "enum_assignment" {
                    member.child_by_field_name("name")
                } else {
                    Some(member)
                };
                if let Some(name_node) = name_node {
                    if !check_recursion_depth(depth + 1) {
                        continue;
                    }
                    symbol.children.push(Symbol::new(
                        text_of(&name_node, source),
                        SymbolKind::EnumMember,
                        span_of(&member),
                    ));
                }
            }
        }
    }
    symbols.push(symbol);
}

impl LanguageExtractor for TypeScriptExtractor {
    fn language_id(&self) -> LanguageId {
        LanguageId("typescript")
    }

    fn parse(&self, source: &str, path: &Path) -> SymbolTree {
        let Some(tree) = self.parse_tree(source) else {
            return SymbolTree {
                path: path.to_path_buf(),
                language: "typescript".to_string(),
                symbols: Vec::new(),
                errors: vec![SyntaxError {
                    message: "tree-sitter failed to produce a tree".into(),
                    span: Span::new(crate::model::Position::new(1, 1, 0), crate::model::Position::new(1, 1, 0)),
                }],
            };
        };
        let mut errors = Vec::new();
        collect_errors(tree.root_node(), source, &mut errors);

        // TypeScript-only declarations first...
        let mut symbols = Vec::new();
        let mut doc = DocCarry::new();
        walk_container(tree.root_node(), source, 0, &mut symbols, &mut doc);
        // ...then functions/classes/variables/imports via the shared JS walker,
        // merged in declaration order by span start.
        let mut js_symbols = Vec::new();
        let mut js_doc = DocCarry::new();
        lang_javascript::walk_container(tree.root_node(), source, 0, &mut js_symbols, &mut js_doc);
        symbols.extend(js_symbols);
        symbols.sort_by_key(|s| s.declaration_span.start.offset);

        SymbolTree {
            path: path.to_path_buf(),
            language: "typescript".to_string(),
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
    fn extracts_interface_with_members() {
        let extractor = TypeScriptExtractor::new();
        let source = "interface Greeter {\n  name: string;\n  greet(): void;\n}\n";
        let tree = extractor.parse(source, Path::new("a.ts"));
        let iface = tree.visible_symbols().find(|s| s.name == "Greeter").unwrap();
        assert_eq!(iface.kind, SymbolKind::Interface);
        assert_eq!(iface.children.len(), 2);
    }

    #[test]
    fn extracts_type_alias_and_enum() {
        let extractor = TypeScriptExtractor::new();
        let source = "type Id = string;\nenum Color { Red, Green, Blue }\n";
        let tree = extractor.parse(source, Path::new("a.ts"));
        assert!(tree.visible_symbols().any(|s| s.kind == SymbolKind::TypeAlias));
        let color = tree.visible_symbols().find(|s| s.name == "Color").unwrap();
        assert_eq!(color.children.len(), 3);
    }

    #[test]
    fn functions_still_extracted_via_shared_js_walker() {
        let extractor = TypeScriptExtractor::new();
        let source = "function greet(name: string): void {}\n";
        let tree = extractor.parse(source, Path::new("a.ts"));
        assert!(tree.visible_symbols().any(|s| s.name == "greet" && s.kind == SymbolKind::Function));
    }
}
