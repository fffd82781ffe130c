//! Rust symbol/call/import/export extraction.
//!
//! Grounded in the teacher's `src/parsing/rust.rs` tree-sitter walker, with
//! symbol emission redirected at the spec's `SymbolKind` closed enum:
//! structs become `Class` (spec has no `struct` kind), `impl` blocks are
//! transparent (their methods surface as top-level `Method` symbols, Rust
//! has no notion of nesting them under the type declaration), and
//! `attribute_item` (`#[derive(..)]`) is treated as transparent rather than
//! resetting the pending doc comment — `#[derive]` conventionally sits
//! *between* a doc comment and its item, and resetting there would silently
//! drop nearly every derived type's documentation.

use std::path::Path;
use std::sync::Mutex;

use tree_sitter::{Node, Parser as TsParser};

use crate::language::LanguageId;
use crate::model::{
    CallSite, ExportBinding, ExportInfo, ExportType, ImportBinding, ImportInfo, ImportType,
    Span, Symbol, SymbolKind, SymbolTree, SyntaxError,
};
use crate::parsing::common::{
    check_recursion_depth, line_at, span_of, strip_comment_delimiters, text_of, trimmed_line_text,
    DocCarry,
};
use crate::parsing::LanguageExtractor;

pub struct RustExtractor {
    parser: Mutex<TsParser>,
}

impl RustExtractor {
    pub fn new() -> Self {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .expect("tree-sitter-rust grammar must load");
        Self {
            parser: Mutex::new(parser),
        }
    }

    fn parse_tree(&self, source: &str) -> Option<tree_sitter::Tree> {
        self.parser.lock().unwrap().parse(source, None)
    }
}

impl Default for RustExtractor {
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

fn is_doc_comment(text: &str) -> bool {
    text.starts_with("///") || text.starts_with("//!") || text.starts_with("/**")
}

fn strip_rust_doc(raw: &str) -> String {
    strip_comment_delimiters(raw, &["///", "//!", "//"], Some(("/**", "*/")))
}

/// Walk the top level of a module body (or the whole file), emitting
/// symbols. `method_context` is `Some(kind)` when we're inside an `impl` or
/// `trait` body and plain functions there should surface as `Method`
/// instead of `Function`.
fn walk_container(
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
            "line_comment" | "block_comment" => {
                let text = text_of(&child, source);
                if is_doc_comment(text) {
                    doc.see_comment(strip_rust_doc(text));
                }
                // non-doc comments don't reset: a `//` comment between a
                // doc comment and its item is common and shouldn't drop it.
            }
            "attribute_item" | "inner_attribute_item" => {
                // transparent, see module doc above
            }
            "function_item" => {
                emit_function(&child, source, SymbolKind::Function, symbols, doc);
            }
            "struct_item" => emit_struct(&child, source, depth, symbols, doc),
            "enum_item" => emit_enum(&child, source, depth, symbols, doc),
            "trait_item" => emit_trait(&child, source, depth, symbols, doc),
            "impl_item" => emit_impl_methods(&child, source, depth, symbols, doc),
            "mod_item" => emit_mod(&child, source, depth, symbols, doc),
            "const_item" => emit_simple(&child, source, SymbolKind::Constant, "name", symbols, doc),
            "static_item" => emit_simple(&child, source, SymbolKind::Constant, "name", symbols, doc),
            "type_item" => emit_simple(&child, source, SymbolKind::TypeAlias, "name", symbols, doc),
            "use_declaration" => emit_use(&child, source, symbols),
            _ => {
                doc.reset();
            }
        }
    }
}

fn emit_simple(
    node: &Node,
    source: &str,
    kind: SymbolKind,
    name_field: &str,
    symbols: &mut Vec<Symbol>,
    doc: &mut DocCarry,
) {
    let Some(name_node) = node.child_by_field_name(name_field) else {
        doc.reset();
        return;
    };
    let mut symbol = Symbol::new(text_of(&name_node, source), kind, span_of(node));
    symbol.doc = doc.take();
    symbols.push(symbol);
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

fn emit_struct(node: &Node, source: &str, depth: usize, symbols: &mut Vec<Symbol>, doc: &mut DocCarry) {
    let Some(name_node) = node.child_by_field_name("name") else {
        doc.reset();
        return;
    };
    let mut symbol = Symbol::new(text_of(&name_node, source), SymbolKind::Class, span_of(node));
    symbol.doc = doc.take();
    if let Some(body) = node.child_by_field_name("body") {
        symbol.body_span = Some(span_of(&body));
        let mut field_doc = DocCarry::new();
        let mut cursor = body.walk();
        for field in body.children(&mut cursor) {
            match field.kind() {
                "line_comment" | "block_comment" => {
                    let text = text_of(&field, source);
                    if is_doc_comment(text) {
                        field_doc.see_comment(strip_rust_doc(text));
                    }
                }
                "field_declaration" => {
                    if let Some(fname) = field.child_by_field_name("name") {
                        if !check_recursion_depth(depth + 1) {
                            continue;
                        }
                        let mut fsym =
                            Symbol::new(text_of(&fname, source), SymbolKind::Field, span_of(&field));
                        fsym.doc = field_doc.take();
                        symbol.children.push(fsym);
                    }
                }
                _ => field_doc.reset(),
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
        let mut variant_doc = DocCarry::new();
        let mut cursor = body.walk();
        for variant in body.children(&mut cursor) {
            match variant.kind() {
                "line_comment" | "block_comment" => {
                    let text = text_of(&variant, source);
                    if is_doc_comment(text) {
                        variant_doc.see_comment(strip_rust_doc(text));
                    }
                }
                "enum_variant" => {
                    if let Some(vname) = variant.child_by_field_name("name") {
                        if !check_recursion_depth(depth + 1) {
                            continue;
                        }
                        let mut vsym = Symbol::new(
                            text_of(&vname, source),
                            SymbolKind::EnumMember,
                            span_of(&variant),
                        );
                        vsym.doc = variant_doc.take();
                        symbol.children.push(vsym);
                    }
                }
                _ => variant_doc.reset(),
            }
        }
    }
    symbols.push(symbol);
}

fn emit_trait(node: &Node, source: &str, depth: usize, symbols: &mut Vec<Symbol>, doc: &mut DocCarry) {
    let Some(name_node) = node.child_by_field_name("name") else {
        doc.reset();
        return;
    };
    let mut symbol = Symbol::new(text_of(&name_node, source), SymbolKind::Interface, span_of(node));
    symbol.doc = doc.take();
    if let Some(body) = node.child_by_field_name("body") {
        symbol.body_span = Some(span_of(&body));
        let mut method_doc = DocCarry::new();
        let mut cursor = body.walk();
        for item in body.children(&mut cursor) {
            match item.kind() {
                "line_comment" | "block_comment" => {
                    let text = text_of(&item, source);
                    if is_doc_comment(text) {
                        method_doc.see_comment(strip_rust_doc(text));
                    }
                }
                "function_item" | "function_signature_item" => {
                    if let Some(mname) = item.child_by_field_name("name") {
                        if !check_recursion_depth(depth + 1) {
                            continue;
                        }
                        let mut msym = Symbol::new(
                            text_of(&mname, source),
                            SymbolKind::Method,
                            span_of(&item),
                        );
                        msym.doc = method_doc.take();
                        symbol.children.push(msym);
                    }
                }
                _ => method_doc.reset(),
            }
        }
    }
    symbols.push(symbol);
}

/// `impl` blocks are transparent: their associated functions surface as
/// top-level `Method` symbols, since the spec's model has no concept of
/// Rust's separate-impl-from-type-declaration shape.
fn emit_impl_methods(
    node: &Node,
    source: &str,
    depth: usize,
    symbols: &mut Vec<Symbol>,
    doc: &mut DocCarry,
) {
    doc.reset();
    let Some(body) = node.child_by_field_name("body") else {
        return;
    };
    let mut method_doc = DocCarry::new();
    let mut cursor = body.walk();
    for item in body.children(&mut cursor) {
        match item.kind() {
            "line_comment" | "block_comment" => {
                let text = text_of(&item, source);
                if is_doc_comment(text) {
                    method_doc.see_comment(strip_rust_doc(text));
                }
            }
            "attribute_item" => {}
            "function_item" => {
                if !check_recursion_depth(depth + 1) {
                    continue;
                }
                emit_function(&item, source, SymbolKind::Method, symbols, &mut method_doc);
            }
            "const_item" => {
                emit_simple(&item, source, SymbolKind::Constant, "name", symbols, &mut method_doc)
            }
            _ => method_doc.reset(),
        }
    }
}

fn emit_mod(node: &Node, source: &str, depth: usize, symbols: &mut Vec<Symbol>, doc: &mut DocCarry) {
    let Some(name_node) = node.child_by_field_name("name") else {
        doc.reset();
        return;
    };
    let mut symbol = Symbol::new(text_of(&name_node, source), SymbolKind::Module, span_of(node));
    symbol.doc = doc.take();
    if let Some(body) = node.child_by_field_name("body") {
        symbol.body_span = Some(span_of(&body));
        walk_container(body, source, depth + 1, &mut symbol.children, &mut DocCarry::new());
    }
    symbols.push(symbol);
}

fn use_path_text(node: &Node, source: &str, prefix: &str) -> Vec<(String, Option<String>)> {
    match node.kind() {
        "use_tree" => {
            let mut path = prefix.to_string();
            let mut out = Vec::new();
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "identifier" | "scoped_identifier" | "crate" | "self" | "super" => {
                        let seg = text_of(&child, source);
                        if !path.is_empty() {
                            path.push_str("::");
                        }
                        path.push_str(seg);
                    }
                    "use_as_clause" => {
                        if let Some(alias) = child.child_by_field_name("alias") {
                            out.push((path.clone(), Some(text_of(&alias, source).to_string())));
                            return out;
                        }
                    }
                    "use_wildcard" => {
                        out.push((format!("{path}::*"), None));
                        return out;
                    }
                    "use_list" => {
                        let mut inner = child.walk();
                        for item in child.children(&mut inner) {
                            if item.kind() == "use_tree" {
                                out.extend(use_path_text(&item, source, &path));
                            }
                        }
                        return out;
                    }
                    _ => {}
                }
            }
            if !path.is_empty() && path != prefix {
                out.push((path, None));
            }
            out
        }
        _ => Vec::new(),
    }
}

fn emit_use(node: &Node, source: &str, symbols: &mut Vec<Symbol>) {
    let Some(tree_node) = node
        .children(&mut node.walk())
        .find(|n| n.kind() == "use_tree")
    else {
        return;
    };
    for (path, alias) in use_path_text(&tree_node, source, "") {
        let display = alias.as_deref().unwrap_or(&path).to_string();
        let mut symbol = Symbol::new(display, SymbolKind::Import, span_of(node));
        symbol.doc = Some(path);
        symbols.push(symbol);
    }
}

fn rust_imports(source: &str, tree: &tree_sitter::Tree) -> Vec<ImportInfo> {
    fn walk(node: Node, source: &str, out: &mut Vec<ImportInfo>) {
        if node.kind() == "use_declaration" {
            let line = line_at(source, node.start_byte());
            if let Some(tree_node) = node.children(&mut node.walk()).find(|n| n.kind() == "use_tree")
            {
                for (path, alias) in use_path_text(&tree_node, source, "") {
                    out.push(ImportInfo {
                        source: path.trim_end_matches("::*").to_string(),
                        import_type: if path.ends_with("::*") {
                            ImportType::Namespace
                        } else {
                            ImportType::Named
                        },
                        bindings: vec![ImportBinding {
                            exported_name: path
                                .rsplit("::")
                                .next()
                                .unwrap_or(&path)
                                .trim_end_matches('*')
                                .to_string(),
                            local_alias: alias,
                            is_type_only: false,
                        }],
                        line,
                        raw_text: text_of(&node, source).trim().to_string(),
                    });
                }
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

fn callee_name<'a>(call: &Node, source: &'a str) -> Option<&'a str> {
    let function = call.child_by_field_name("function")?;
    match function.kind() {
        "identifier" => Some(text_of(&function, source)),
        "field_expression" => function
            .child_by_field_name("field")
            .map(|f| text_of(&f, source)),
        "scoped_identifier" => function
            .child_by_field_name("name")
            .map(|n| text_of(&n, source)),
        _ => None,
    }
}

fn collect_calls(
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
    if node.kind() == "function_item" {
        if let Some(name) = node.child_by_field_name("name") {
            next_enclosing = text_of(&name, source).to_string();
        }
    }
    if node.kind() == "call_expression" {
        if let Some(callee) = callee_name(&node, source) {
            let start = node.start_position();
            out.push(CallSite {
                file_path: path.to_path_buf(),
                line: start.row as u32 + 1,
                column: start.column as u32 + 1,
                caller_qualified_name: enclosing.to_string(),
                line_text: trimmed_line_text(source, start.row as u32 + 1),
            });
            let _ = callee; // callee retained implicitly via line text; name not stored separately here
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls(child, source, path, &next_enclosing, depth + 1, out);
    }
}

impl LanguageExtractor for RustExtractor {
    fn language_id(&self) -> LanguageId {
        LanguageId("rust")
    }

    fn parse(&self, source: &str, path: &Path) -> SymbolTree {
        let Some(tree) = self.parse_tree(source) else {
            return SymbolTree {
                path: path.to_path_buf(),
                language: "rust".to_string(),
                symbols: Vec::new(),
                errors: vec![SyntaxError {
                    message: "tree-sitter failed to produce a tree".into(),
                    span: Span::new(
                        crate::model::Position::new(1, 1, 0),
                        crate::model::Position::new(1, 1, 0),
                    ),
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
            language: "rust".to_string(),
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
        rust_imports(source, &tree)
    }

    fn extract_exports(&self, source: &str, _path: &Path) -> Vec<ExportInfo> {
        // Rust has no export statement distinct from `pub`; a complete
        // implementation would walk `pub` visibility modifiers, but that's
        // a different mechanism than the import/export-statement languages
        // this field models. Reports `pub` top-level items as declarations.
        let Some(tree) = self.parse_tree(source) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut cursor = tree.root_node().walk();
        for child in tree.root_node().children(&mut cursor) {
            let has_pub = child
                .children(&mut child.walk())
                .any(|n| n.kind() == "visibility_modifier");
            if !has_pub {
                continue;
            }
            let name_node = child.child_by_field_name("name");
            if let Some(name_node) = name_node {
                out.push(ExportInfo {
                    export_type: ExportType::Declaration,
                    bindings: vec![ExportBinding {
                        exported_name: text_of(&name_node, source).to_string(),
                        local_name: None,
                        kind: None,
                        is_type_only: false,
                    }],
                    source: None,
                    line: line_at(source, child.start_byte()),
                    raw_text: text_of(&child, source).lines().next().unwrap_or("").to_string(),
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_top_level_function_and_struct() {
        let extractor = RustExtractor::new();
        let source = "/// Greets.\npub fn greet(name: &str) {\n    println!(\"{}\", name);\n}\n\nstruct Point { x: i32, y: i32 }\n";
        let tree = extractor.parse(source, Path::new("a.rs"));
        assert!(tree.errors.is_empty());
        let names: Vec<_> = tree.visible_symbols().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"greet"));
        assert!(names.contains(&"Point"));
        let greet = tree.visible_symbols().find(|s| s.name == "greet").unwrap();
        assert_eq!(greet.kind, SymbolKind::Function);
        assert_eq!(greet.doc.as_deref(), Some("Greets."));
    }

    #[test]
    fn impl_methods_surface_as_top_level_methods() {
        let extractor = RustExtractor::new();
        let source = "struct Counter;\nimpl Counter {\n    fn increment(&mut self) {}\n}\n";
        let tree = extractor.parse(source, Path::new("a.rs"));
        let method = tree.visible_symbols().find(|s| s.name == "increment").unwrap();
        assert_eq!(method.kind, SymbolKind::Method);
    }

    #[test]
    fn imports_are_symbols_but_excluded_from_visible_listing() {
        let extractor = RustExtractor::new();
        let source = "use std::collections::HashMap;\nfn main() {}\n";
        let tree = extractor.parse(source, Path::new("a.rs"));
        assert!(tree.symbols.iter().any(|s| s.kind == SymbolKind::Import));
        assert!(tree.visible_symbols().all(|s| s.kind != SymbolKind::Import));

        let imports = extractor.extract_imports(source, Path::new("a.rs"));
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].source, "std::collections::HashMap");
    }

    #[test]
    fn extracts_calls_with_enclosing_function() {
        let extractor = RustExtractor::new();
        let source = "fn outer() {\n    helper();\n}\n\nfn helper() {}\n";
        let calls = extractor.extract_calls(source, Path::new("a.rs"));
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].caller_qualified_name, "outer");
        assert_eq!(calls[0].line, 2);
    }

    #[test]
    fn syntax_errors_are_reported_but_tree_still_produced() {
        let extractor = RustExtractor::new();
        let source = "fn broken( {\n";
        let tree = extractor.parse(source, Path::new("a.rs"));
        assert!(!tree.errors.is_empty());
    }
}
