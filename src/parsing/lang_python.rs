//! Python symbol/call/import extraction.
//!
//! Python has no `//`-style doc comment; a definition's doc is its
//! docstring — the first statement in its body when that statement is a
//! bare string literal. `decorated_definition` nodes are unwrapped
//! transparently so a decorated function/class is treated exactly like an
//! undecorated one, just with decorators ignored (spec has no notion of
//! decorators).

use std::path::Path;
use std::sync::Mutex;

use tree_sitter::{Node, Parser as TsParser};

use crate::language::LanguageId;
use crate::model::{
    CallSite, ExportInfo, ImportBinding, ImportInfo, ImportType, Span, Symbol, SymbolKind,
    SymbolTree, SyntaxError,
};
use crate::parsing::common::{
    check_recursion_depth, line_at, span_of, text_of, trimmed_line_text, DocCarry,
};
use crate::parsing::LanguageExtractor;

pub struct PythonExtractor {
    parser: Mutex<TsParser>,
}

impl PythonExtractor {
    pub fn new() -> Self {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .expect("tree-sitter-python grammar must load");
        Self {
            parser: Mutex::new(parser),
        }
    }

    fn parse_tree(&self, source: &str) -> Option<tree_sitter::Tree> {
        self.parser.lock().unwrap().parse(source, None)
    }
}

impl Default for PythonExtractor {
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

fn docstring_of(body: &Node, source: &str) -> Option<String> {
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string_node = first.named_child(0)?;
    if string_node.kind() != "string" {
        return None;
    }
    let raw = text_of(&string_node, source);
    let trimmed = raw
        .trim_start_matches(['r', 'R', 'b', 'B', 'f', 'F'])
        .trim_matches('"')
        .trim_matches('\'');
    Some(trimmed.trim().to_string())
}

fn unwrap_decorated<'a>(node: Node<'a>) -> Node<'a> {
    if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition").unwrap_or(node)
    } else {
        node
    }
}

fn walk_container(
    node: Node,
    source: &str,
    depth: usize,
    in_class: bool,
    symbols: &mut Vec<Symbol>,
    doc: &mut DocCarry,
) {
    if !check_recursion_depth(depth) {
        return;
    }
    let mut cursor = node.walk();
    for raw_child in node.children(&mut cursor) {
        let child = unwrap_decorated(raw_child);
        match child.kind() {
            "comment" => {
                let text = text_of(&child, source).trim_start_matches('#').trim();
                doc.see_comment(text.to_string());
            }
            "function_definition" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    doc.reset();
                    continue;
                };
                let kind = if in_class {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                };
                let mut symbol = Symbol::new(text_of(&name_node, source), kind, span_of(&raw_child));
                if let Some(body) = child.child_by_field_name("body") {
                    symbol.body_span = Some(span_of(&body));
                    symbol.doc = docstring_of(&body, source).or_else(|| doc.take());
                } else {
                    symbol.doc = doc.take();
                }
                doc.reset();
                symbols.push(symbol);
            }
            "class_definition" => {
                let Some(name_node) = child.child_by_field_name("name") else {
                    doc.reset();
                    continue;
                };
                let mut symbol =
                    Symbol::new(text_of(&name_node, source), SymbolKind::Class, span_of(&raw_child));
                if let Some(body) = child.child_by_field_name("body") {
                    symbol.body_span = Some(span_of(&body));
                    symbol.doc = docstring_of(&body, source).or_else(|| doc.take());
                    if check_recursion_depth(depth + 1) {
                        walk_container(body, source, depth + 1, true, &mut symbol.children, &mut DocCarry::new());
                    }
                } else {
                    symbol.doc = doc.take();
                }
                doc.reset();
                symbols.push(symbol);
            }
            "import_statement" | "import_from_statement" => {
                doc.reset();
                // handled separately in `python_imports`; not modeled as symbols
            }
            "expression_statement" if !in_class => {
                doc.reset();
            }
            "assignment" if in_class => {
                if let Some(left) = child.child_by_field_name("left") {
                    if left.kind() == "identifier" {
                        let name = text_of(&left, source);
                        let kind = if name.chars().all(|c| c.is_uppercase() || c == '_' || c.is_ascii_digit()) {
                            SymbolKind::Constant
                        } else {
                            SymbolKind::Field
                        };
                        let mut symbol = Symbol::new(name, kind, span_of(&child));
                        symbol.doc = doc.take();
                        symbols.push(symbol);
                    }
                }
                doc.reset();
            }
            _ => doc.reset(),
        }
    }
}

fn dotted_name_text(node: &Node, source: &str) -> String {
    text_of(node, source).to_string()
}

fn python_imports(tree: &tree_sitter::Tree, source: &str) -> Vec<ImportInfo> {
    fn walk(node: Node, source: &str, out: &mut Vec<ImportInfo>) {
        match node.kind() {
            "import_statement" => {
                let line = line_at(source, node.start_byte());
                let raw_text = text_of(&node, source).trim().to_string();
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    match child.kind() {
                        "dotted_name" => {
                            let name = dotted_name_text(&child, source);
                            out.push(ImportInfo {
                                source: name.clone(),
                                import_type: ImportType::Namespace,
                                bindings: vec![ImportBinding {
                                    exported_name: name,
                                    local_alias: None,
                                    is_type_only: false,
                                }],
                                line,
                                raw_text: raw_text.clone(),
                            });
                        }
                        "aliased_import" => {
                            if let (Some(name_node), Some(alias_node)) = (
                                child.child_by_field_name("name"),
                                child.child_by_field_name("alias"),
                            ) {
                                let name = dotted_name_text(&name_node, source);
                                out.push(ImportInfo {
                                    source: name.clone(),
                                    import_type: ImportType::Namespace,
                                    bindings: vec![ImportBinding {
                                        exported_name: name,
                                        local_alias: Some(text_of(&alias_node, source).to_string()),
                                        is_type_only: false,
                                    }],
                                    line,
                                    raw_text: raw_text.clone(),
                                });
                            }
                        }
                        _ => {}
                    }
                }
            }
            "import_from_statement" => {
                let line = line_at(source, node.start_byte());
                let raw_text = text_of(&node, source).trim().to_string();
                let Some(module) = node.child_by_field_name("module_name") else {
                    return;
                };
                let module_name = dotted_name_text(&module, source);
                let mut bindings = Vec::new();
                let mut cursor = node.walk();
                let mut wildcard = false;
                for child in node.children(&mut cursor) {
                    match child.kind() {
                        "wildcard_import" => wildcard = true,
                        "dotted_name" if child.id() != module.id() => {
                            bindings.push(ImportBinding {
                                exported_name: dotted_name_text(&child, source),
                                local_alias: None,
                                is_type_only: false,
                            });
                        }
                        "aliased_import" => {
                            if let (Some(name_node), Some(alias_node)) = (
                                child.child_by_field_name("name"),
                                child.child_by_field_name("alias"),
                            ) {
                                bindings.push(ImportBinding {
                                    exported_name: dotted_name_text(&name_node, source),
                                    local_alias: Some(text_of(&alias_node, source).to_string()),
                                    is_type_only: false,
                                });
                            }
                        }
                        _ => {}
                    }
                }
                out.push(ImportInfo {
                    source: module_name,
                    import_type: if wildcard {
                        ImportType::Namespace
                    } else {
                        ImportType::Named
                    },
                    bindings,
                    line,
                    raw_text,
                });
            }
            _ => {
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    walk(child, source, out);
                }
            }
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
        "attribute" => function
            .child_by_field_name("attribute")
            .map(|a| text_of(&a, source)),
        _ => None,
    }
}

fn collect_calls(node: Node, source: &str, path: &Path, enclosing: &str, depth: usize, out: &mut Vec<CallSite>) {
    if !check_recursion_depth(depth) {
        return;
    }
    let mut next_enclosing = enclosing.to_string();
    if node.kind() == "function_definition" {
        if let Some(name) = node.child_by_field_name("name") {
            next_enclosing = text_of(&name, source).to_string();
        }
    }
    if node.kind() == "call" {
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

impl LanguageExtractor for PythonExtractor {
    fn language_id(&self) -> LanguageId {
        LanguageId("python")
    }

    fn parse(&self, source: &str, path: &Path) -> SymbolTree {
        let Some(tree) = self.parse_tree(source) else {
            return SymbolTree {
                path: path.to_path_buf(),
                language: "python".to_string(),
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
        walk_container(tree.root_node(), source, 0, false, &mut symbols, &mut doc);
        SymbolTree {
            path: path.to_path_buf(),
            language: "python".to_string(),
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
        python_imports(&tree, source)
    }

    fn extract_exports(&self, _source: &str, _path: &Path) -> Vec<ExportInfo> {
        // Python has no export statement; visibility is convention
        // (leading underscore, `__all__`), not syntax the CST models.
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_with_docstring() {
        let extractor = PythonExtractor::new();
        let source = "def greet(name):\n    \"\"\"Greets the caller.\"\"\"\n    print(name)\n";
        let tree = extractor.parse(source, Path::new("a.py"));
        let greet = tree.visible_symbols().find(|s| s.name == "greet").unwrap();
        assert_eq!(greet.kind, SymbolKind::Function);
        assert_eq!(greet.doc.as_deref(), Some("Greets the caller."));
    }

    #[test]
    fn class_methods_are_nested_children() {
        let extractor = PythonExtractor::new();
        let source = "class Greeter:\n    def hello(self):\n        pass\n";
        let tree = extractor.parse(source, Path::new("a.py"));
        let class = tree.visible_symbols().find(|s| s.name == "Greeter").unwrap();
        assert_eq!(class.children.len(), 1);
        assert_eq!(class.children[0].kind, SymbolKind::Method);
    }

    #[test]
    fn extracts_from_import_bindings() {
        let extractor = PythonExtractor::new();
        let source = "from collections import OrderedDict, defaultdict as dd\n";
        let imports = extractor.extract_imports(source, Path::new("a.py"));
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].source, "collections");
        assert_eq!(imports[0].bindings.len(), 2);
        assert_eq!(imports[0].bindings[1].local_alias.as_deref(), Some("dd"));
    }

    #[test]
    fn decorated_function_is_unwrapped() {
        let extractor = PythonExtractor::new();
        let source = "@staticmethod\ndef helper():\n    pass\n";
        let tree = extractor.parse(source, Path::new("a.py"));
        assert!(tree.visible_symbols().any(|s| s.name == "helper"));
    }
}
