//! Reference & Call Search (spec §4.8): whole-word text search scoped by
//! symbol spans, layered on top of what the Parser already extracted. This
//! is deliberately simpler than the Parser's tree-based `extractCalls` —
//! spec §4.8 specifies a text-plus-symbol-span algorithm, not another CST
//! walk, so a second tree traversal isn't warranted here.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::model::{CallSite, Span, SymbolReference};

const DECLARATION_KEYWORDS: &[&str] = &[
    "fn", "function", "def", "class", "struct", "interface", "trait", "impl", "enum", "type",
    "const", "let", "var", "static", "public", "private", "protected", "func", "package",
    "import", "export", "use", "from",
];

/// The fixed reject set for `getCallees` (spec §4.8) — distinct from
/// `DECLARATION_KEYWORDS` above, which `getCallers`/`findReferences` use for
/// their own, differently-scoped declaration-line heuristic.
const CALLEE_REJECT_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "function", "return", "async", "await", "new",
    "typeof", "instanceof", "class", "interface", "type", "const", "let", "var", "export",
    "import",
];

fn whole_word_regex(name: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b{}\b", regex::escape(name))).ok()
}

fn line_starts_with_declaration_keyword(line: &str) -> bool {
    let trimmed = line.trim_start();
    DECLARATION_KEYWORDS
        .iter()
        .any(|kw| trimmed.starts_with(kw) && trimmed[kw.len()..].starts_with(char::is_whitespace))
}

/// `findReferences`: every whole-word occurrence of `symbol_name` across
/// `sources`, sorted definitions-first, then by file, then by line.
pub fn find_references(symbol_name: &str, sources: &[(PathBuf, String)]) -> Vec<SymbolReference> {
    let Some(re) = whole_word_regex(symbol_name) else {
        return Vec::new();
    };
    let mut refs = Vec::new();
    for (path, source) in sources {
        for (line_index, line) in source.lines().enumerate() {
            for m in re.find_iter(line) {
                let is_definition = line_starts_with_declaration_keyword(line)
                    || line.trim_start().contains(&format!("{symbol_name}("))
                        && line_starts_with_declaration_keyword(line);
                refs.push(SymbolReference {
                    file_path: path.clone(),
                    symbol_name: symbol_name.to_string(),
                    line: line_index as u32 + 1,
                    column: m.start() as u32 + 1,
                    line_text: line.trim().to_string(),
                    is_definition,
                });
            }
        }
    }
    refs.sort_by(|a, b| {
        b.is_definition
            .cmp(&a.is_definition)
            .then_with(|| a.file_path.cmp(&b.file_path))
            .then_with(|| a.line.cmp(&b.line))
    });
    refs
}

/// A named symbol's location and body extent, as held by the Project Index.
pub struct SymbolLocation<'a> {
    pub file_path: &'a Path,
    pub qualified_name: &'a str,
    pub declaration_line: u32,
    pub body_span: Option<Span>,
}

fn looks_like_call(line: &str, name: &str) -> bool {
    let Some(idx) = line.find(name) else { return false };
    let after = &line[idx + name.len()..];
    after.trim_start().starts_with('(')
}

/// `getCallers`: every symbol whose body text contains a whole-word call to
/// `symbol_name`, sorted by file then line. The declaration line itself is
/// always excluded so a symbol never appears as its own caller merely by
/// being declared. Self-matches, where the enclosing symbol's own name
/// equals the target, are skipped (spec §4.8).
pub fn get_callers(
    symbol_name: &str,
    sources: &[(PathBuf, String)],
    symbols: &[SymbolLocation],
) -> Vec<CallSite> {
    let Some(re) = whole_word_regex(symbol_name) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for symbol in symbols {
        if symbol.qualified_name == symbol_name {
            continue;
        }
        let Some(source) = sources
            .iter()
            .find(|(p, _)| p == symbol.file_path)
            .map(|(_, s)| s.as_str())
        else {
            continue;
        };
        let Some(span) = symbol.body_span else { continue };
        for (line_index, line) in source.lines().enumerate() {
            let line_number = line_index as u32 + 1;
            if line_number < span.start.line || line_number > span.end.line {
                continue;
            }
            if line_number == symbol.declaration_line {
                continue;
            }
            if line_starts_with_declaration_keyword(line) {
                continue;
            }
            if !re.is_match(line) || !looks_like_call(line, symbol_name) {
                continue;
            }
            out.push(CallSite {
                file_path: symbol.file_path.to_path_buf(),
                line: line_number,
                column: line.find(symbol_name).unwrap_or(0) as u32 + 1,
                caller_qualified_name: symbol.qualified_name.to_string(),
                line_text: line.trim().to_string(),
            });
        }
    }
    out.sort_by(|a, b| a.file_path.cmp(&b.file_path).then_with(|| a.line.cmp(&b.line)));
    out
}

/// `getCallees`: identifiers called from within `qualified_name`'s body,
/// excluding its own declaration line and the fixed keyword set spec §4.8
/// names for this operation, deduplicated by `(identifier, line)`.
pub fn get_callees(
    file_path: &Path,
    qualified_name: &str,
    source: &str,
    declaration_line: u32,
    body_span: Span,
) -> Vec<CallSite> {
    let call_re = Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap();
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for (line_index, line) in source.lines().enumerate() {
        let line_number = line_index as u32 + 1;
        if line_number < body_span.start.line || line_number > body_span.end.line {
            continue;
        }
        if line_number == declaration_line {
            continue;
        }
        for caps in call_re.captures_iter(line) {
            let name = caps.get(1).unwrap().as_str();
            if CALLEE_REJECT_KEYWORDS.contains(&name) {
                continue;
            }
            if !seen.insert((name.to_string(), line_number)) {
                continue;
            }
            out.push(CallSite {
                file_path: file_path.to_path_buf(),
                line: line_number,
                column: line.find(name).unwrap_or(0) as u32 + 1,
                caller_qualified_name: qualified_name.to_string(),
                line_text: line.trim().to_string(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;

    #[test]
    fn find_references_sorts_definitions_first() {
        let sources = vec![
            (PathBuf::from("a.rs"), "helper();\n".to_string()),
            (PathBuf::from("a.rs"), "fn helper() {}\n".to_string()),
        ];
        let refs = find_references("helper", &sources);
        assert!(refs[0].is_definition);
    }

    #[test]
    fn get_callers_finds_call_inside_body_span() {
        let sources = vec![(
            PathBuf::from("a.rs"),
            "fn outer() {\n    helper();\n}\n\nfn helper() {}\n".to_string(),
        )];
        let pos = |line, col, offset| Position::new(line, col, offset);
        let outer_span = Span::new(pos(1, 1, 0), pos(3, 2, 30));
        let symbols = vec![SymbolLocation {
            file_path: Path::new("a.rs"),
            qualified_name: "outer",
            declaration_line: 1,
            body_span: Some(outer_span),
        }];
        let callers = get_callers("helper", &sources, &symbols);
        assert_eq!(callers.len(), 1);
        assert_eq!(callers[0].caller_qualified_name, "outer");
    }

    #[test]
    fn get_callers_skips_self_matches() {
        let sources = vec![(
            PathBuf::from("a.rs"),
            "fn recurse() {\n    recurse();\n}\n".to_string(),
        )];
        let pos = |line, col, offset| Position::new(line, col, offset);
        let span = Span::new(pos(1, 1, 0), pos(3, 2, 30));
        let symbols = vec![SymbolLocation {
            file_path: Path::new("a.rs"),
            qualified_name: "recurse",
            declaration_line: 1,
            body_span: Some(span),
        }];
        let callers = get_callers("recurse", &sources, &symbols);
        assert!(callers.is_empty());
    }

    #[test]
    fn get_callees_excludes_reject_keywords_and_declaration_line() {
        let source = "fn outer() {\n    if check() {\n        helper();\n        typeof(x);\n        await(p);\n    }\n}\n";
        let pos = |line, col, offset| Position::new(line, col, offset);
        let span = Span::new(pos(1, 1, 0), pos(7, 2, 70));
        let callees = get_callees(Path::new("a.rs"), "outer", source, 1, span);
        let names: Vec<_> = callees.iter().map(|c| c.caller_qualified_name.as_str()).collect();
        assert!(names.iter().all(|n| *n == "outer"));
        let called_lines: Vec<_> = callees.iter().map(|c| c.line_text.as_str()).collect();
        assert!(called_lines.iter().any(|t| t.contains("check(")));
        assert!(called_lines.iter().any(|t| t.contains("helper(")));
        assert!(!called_lines.iter().any(|t| t.starts_with("if (")));
        assert_eq!(callees.len(), 2);
    }
}
