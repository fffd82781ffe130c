//! Go symbol/call/import extraction.
//!
//! Go methods (`func (r Receiver) Name()`) have no enclosing type node in
//! the grammar — like Rust's `impl` blocks, they're top-level declarations
//! distinguished only by their receiver — so they surface as top-level
//! `Method` symbols, same choice as `lang_rust.rs` makes for `impl`.

use std::path::Path;
use std::sync::Mutex;

use tree_sitter::{Node, Parser as TsParser};

use crate::language::LanguageId;
use crate::model::{
    CallSite, ExportInfo, ImportBinding, ImportInfo, ImportType, Span, Symbol, SymbolKind,
    SymbolTree, SyntaxError,
};
use crate::parsing::common::{
    check_recursion_depth, line_at, span_of, strip_comment_delimiters, text_of, trimmed_line_text,
    DocCarry,
};
use crate::parsing::LanguageExtractor;

pub struct GoExtractor {
    parser: Mutex<TsParser>,
}

impl GoExtractor {
    pub fn new() -> Self {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .expect("tree-sitter-go grammar must load");
        Self {
            parser: Mutex::new(parser),
        }
    }

    fn parse_tree(&self, source: &str) -> Option<tree_sitter::Tree> {
        self.parser.lock().unwrap().parse(source, None)
    }
}

impl Default for GoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_errors(node: Node, source: &str, out: &mut Vec<SyntaxError>) {
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

fn walk_container(node: Node, source: &str, depth: usize, symbols: &mut Vec<Symbol>, doc: &mut DocCarry) {
    if !check_recursion_depth(depth) {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "comment" => {
                let text = text_of(&child, source);
                doc.see_comment(strip_comment_delimiters(text, &["//"], Some(("/*", "*/"))));
            }
            "function_declaration" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    doc.reset();
                    continue;
                };
                let mut symbol =
                    Symbol::new(text_of(&name_node, source), SymbolKind::Function, span_of(&child));
                symbol.doc = doc.take();
                if let Some(body) = child.child_by_field_name("body") {
                    symbol.body_span = Some(span_of(&body));
                }
                symbols.push(symbol);
            }
            "method_declaration" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    doc.reset();
                    continue;
                };
                let mut symbol =
                    Symbol::new(text_of(&name_node, source), SymbolKind::Method, span_of(&child));
                symbol.doc = doc.take();
                if let Some(body) = child.child_by_field_name("body") {
                    symbol.body_span = Some(span_of(&body));
                }
                symbols.push(symbol);
            }
            "type_declaration" => emit_type_decl(&child, source, depth, symbols, doc),
            "const_declaration" => emit_value_decl(&child, source, SymbolKind::Constant, symbols, doc),
            "var_declaration" => emit_value_decl(&child, source, SymbolKind::Variable, symbols, doc),
            "import_declaration" => doc.reset(),
            "package_clause" => {}
            _ => doc.reset(),
        }
    }
}

fn emit_type_decl(node: &Node, source: &str, depth: usize, symbols: &mut Vec<Symbol>, doc: &mut DocCarry) {
    let pending_doc = doc.take();
    let mut cursor = node.walk();
    let mut first = true;
    for spec in node.children(&mut cursor) {
        if spec.kind() != "type_spec" {
            continue;
        }
        let Some(name_node) = spec.child_by_field_name("name") else {
            continue;
        };
        let Some(type_node) = spec.child_by_field_name("type") else {
            continue;
        };
        let kind = match type_node.kind() {
            "struct_type" => SymbolKind::Class,
            "interface_type" => SymbolKind::Interface,
            _ => SymbolKind::TypeAlias,
        };
        let mut symbol = Symbol::new(text_of(&name_node, source), kind, span_of(&spec));
        if first {
            symbol.doc = pending_doc.clone();
            first = false;
        }
        symbol.body_span = Some(span_of(&type_node));
        match type_node.kind() {
            "struct_type" if check_recursion_depth(depth + 1) => {
                if let Some(fields) = type_node.children(&mut type_node.walk()).find(|n| n.kind() == "field_declaration_list") {
                    let mut fcursor = fields.walk();
                    for field in fields.children(&mut fcursor) {
                        if field.kind() != "field_declaration" {
                            continue;
                        }
                        let mut name_cursor = field.walk();
                        for ident in field.children(&mut name_cursor) {
                            if ident.kind() == "field_identifier" {
                                symbol.children.push(Symbol::new(
                                    text_of(&ident, source),
                                    SymbolKind::Field,
                                    span_of(&field),
                                ));
                            }
                        }
                    }
                }
            }
            "interface_type" if check_recursion_depth(depth + 1) => {
                let mut mcursor = type_node.walk();
                for member in type_node.children(&mut mcursor) {
                    if member.kind() == "method_elem" {
                        if let Some(mname) = member.child_by_field_name("name") {
                            symbol.children.push(Symbol::new(
                                text_of(&mname, source),
                                SymbolKind::Method,
                                span_of(&member),
                            ));
                        }
                    }
                }
            }
            _ => {}
        }
        symbols.push(symbol);
    }
}

fn emit_value_decl(node: &Node, source: &str, kind: SymbolKind, symbols: &mut Vec<Symbol>, doc: &mut DocCarry) {
    let pending_doc = doc.take();
    let mut cursor = node.walk();
    let mut first = true;
    for spec in node.children(&mut cursor) {
        if spec.kind() != "const_spec" && spec.kind() != "var_spec" {
            continue;
        }
        let mut name_cursor = spec.walk();
        for child in spec.children(&mut name_cursor) {
            if child.kind() == "identifier" {
                let mut symbol = Symbol::new(text_of(&child, source), kind, span_of(&spec));
                if first {
                    symbol.doc = pending_doc.clone();
                    first = false;
                }
                symbols.push(symbol);
            }
        }
    }
}

fn go_imports(tree: &tree_sitter::Tree, source: &str) -> Vec<ImportInfo> {
    fn spec_to_import(spec: Node, source: &str, raw_text: String) -> Option<ImportInfo> {
        let path_node = spec.child_by_field_name("path")?;
        let path = text_of(&path_node, source).trim_matches('"').to_string();
        let alias = spec.child_by_field_name("name").map(|n| text_of(&n, source).to_string());
        let import_type = match alias.as_deref() {
            Some(".") => ImportType::Namespace,
            Some("_") => ImportType::SideEffect,
            _ => ImportType::Named,
        };
        let local_name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Some(ImportInfo {
            source: path,
            import_type,
            bindings: vec![ImportBinding {
                exported_name: local_name,
                local_alias: alias,
                is_type_only: false,
            }],
            line: line_at(source, spec.start_byte()),
            raw_text,
        })
    }

    let mut out = Vec::new();
    let mut cursor = tree.root_node().walk();
    for child in tree.root_node().children(&mut cursor) {
        if child.kind() != "import_declaration" {
            continue;
        }
        let raw_text = text_of(&child, source).trim().to_string();
        let mut inner = child.walk();
        for part in child.children(&mut inner) {
            match part.kind() {
                "import_spec" => {
                    if let Some(info) = spec_to_import(part, source, raw_text.clone()) {
                        out.push(info);
                    }
                }
                "import_spec_list" => {
                    let mut spec_cursor = part.walk();
                    for spec in part.children(&mut spec_cursor) {
                        if spec.kind() == "import_spec" {
                            if let Some(info) = spec_to_import(spec, source, raw_text.clone()) {
                                out.push(info);
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }
    out
}

fn callee_name<'a>(call: &Node, source: &'a str) -> Option<&'a str> {
    let function = call.child_by_field_name("function")?;
    match function.kind() {
        "identifier" => Some(text_of(&function, source)),
        "selector_expression" => function
            .child_by_field_name("field")
            .map(|f| text_of(&f, source)),
        _ => None,
    }
}

fn collect_calls(node: Node, source: &str, path: &Path, enclosing: &str, depth: usize, out: &mut Vec<CallSite>) {
    if !check_recursion_depth(depth) {
        return;
    }
    let mut next_enclosing = enclosing.to_string();
    if matches!(node.kind(), "function_declaration" | "method_declaration") {
        if let Some(name) = node.child_by_field_name("name") {
            next_enclosing = text_of(&name, source).to_string();
        }
    }
    if node.kind() == "call_expression" {
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
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls(child, source, path, &next_enclosing, depth + 1, out);
    }
}

impl LanguageExtractor for GoExtractor {
    fn language_id(&self) -> LanguageId {
        LanguageId("go")
    }

    fn parse(&self, source: &str, path: &Path) -> SymbolTree {
        let Some(tree) = self.parse_tree(source) else {
            return SymbolTree {
                path: path.to_path_buf(),
                language: "go".to_string(),
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
            language: "go".to_string(),
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
        go_imports(&tree, source)
    }

    fn extract_exports(&self, _source: &str, _path: &Path) -> Vec<ExportInfo> {
        // Go has no export statement; a name starting with an uppercase
        // letter is exported. That's a naming convention over already-
        // emitted symbols, not a separate CST construct to extract.
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_and_struct_with_fields() {
        let extractor = GoExtractor::new();
        let source = "package main\n\n// Greeter greets people.\ntype Greeter struct {\n\tName string\n}\n\nfunc Greet() {}\n";
        let tree = extractor.parse(source, Path::new("a.go"));
        let greeter = tree.visible_symbols().find(|s| s.name == "Greeter").unwrap();
        assert_eq!(greeter.kind, SymbolKind::Class);
        assert_eq!(greeter.children.len(), 1);
        assert_eq!(greeter.doc.as_deref(), Some("Greeter greets people."));
        assert!(tree.visible_symbols().any(|s| s.name == "Greet" && s.kind == SymbolKind::Function));
    }

    #[test]
    fn methods_with_receivers_are_top_level() {
        let extractor = GoExtractor::new();
        let source = "package main\n\ntype Counter struct{ n int }\n\nfunc (c *Counter) Increment() { c.n++ }\n";
        let tree = extractor.parse(source, Path::new("a.go"));
        let method = tree.visible_symbols().find(|s| s.name == "Increment").unwrap();
        assert_eq!(method.kind, SymbolKind::Method);
    }

    #[test]
    fn extracts_grouped_imports() {
        let extractor = GoExtractor::new();
        let source = "package main\n\nimport (\n\t\"fmt\"\n\tfoo \"example.com/foo\"\n)\n";
        let imports = extractor.extract_imports(source, Path::new("a.go"));
        assert_eq!(imports.len(), 2);
        assert!(imports.iter().any(|i| i.source == "fmt"));
        assert!(imports
            .iter()
            .any(|i| i.bindings[0].local_alias.as_deref() == Some("foo")));
    }
}
