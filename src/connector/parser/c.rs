//! C adapter. `#include` paths lose their delimiters; `#define` becomes a
//! constant (function-like ones become functions); everything top-level
//! and non-static is exported.

use std::collections::HashSet;

use tree_sitter::Node;

use super::{children, named_children, strip_delimiters, symbol_at, text};
use crate::domain::{ParsedExport, ParsedFile, ParsedImport, SymbolKind};

pub(crate) fn extract(root: Node<'_>, source: &str) -> ParsedFile {
    let mut out = ParsedFile::empty();
    let mut statics: HashSet<String> = HashSet::new();

    for node in named_children(root) {
        top_level(node, source, &mut out, &mut statics);
    }

    out.exports = out
        .symbols
        .iter()
        .filter(|s| !statics.contains(&s.name))
        .map(|s| ParsedExport::new(s.name.clone()))
        .collect();

    out
}

fn is_static(node: Node<'_>, source: &str) -> bool {
    children(node)
        .filter(|c| c.kind() == "storage_class_specifier")
        .any(|c| text(c, source) == "static")
}

pub(crate) fn top_level(
    node: Node<'_>,
    source: &str,
    out: &mut ParsedFile,
    statics: &mut HashSet<String>,
) {
    match node.kind() {
        "preproc_include" => {
            if let Some(path) = node.child_by_field_name("path") {
                out.imports
                    .push(ParsedImport::new(strip_delimiters(text(path, source))));
            }
        }
        "preproc_def" => {
            if let Some(name) = node.child_by_field_name("name") {
                out.symbols.push(symbol_at(
                    SymbolKind::Constant,
                    text(name, source),
                    node,
                    source,
                ));
            }
        }
        "preproc_function_def" => {
            if let Some(name) = node.child_by_field_name("name") {
                out.symbols.push(symbol_at(
                    SymbolKind::Function,
                    text(name, source),
                    node,
                    source,
                ));
            }
        }
        "preproc_ifdef" | "preproc_if" | "preproc_else" => {
            for child in named_children(node) {
                top_level(child, source, out, statics);
            }
        }
        "function_definition" => {
            if let Some(name) = declarator_identifier(node, source) {
                if is_static(node, source) {
                    statics.insert(name.clone());
                }
                out.symbols
                    .push(symbol_at(SymbolKind::Function, name, node, source));
            }
        }
        "declaration" => declaration(node, source, out, statics),
        "struct_specifier" => named_type(node, source, out, SymbolKind::Struct),
        "union_specifier" => named_type(node, source, out, SymbolKind::Struct),
        "enum_specifier" => named_type(node, source, out, SymbolKind::Enum),
        "type_definition" => {
            for decl in named_children(node).filter(|c| c.kind() == "type_identifier") {
                out.symbols
                    .push(symbol_at(SymbolKind::Type, text(decl, source), node, source));
            }
        }
        _ => {}
    }
}

fn declaration(
    node: Node<'_>,
    source: &str,
    out: &mut ParsedFile,
    statics: &mut HashSet<String>,
) {
    let static_decl = is_static(node, source);
    for child in named_children(node) {
        let (target, kind) = match child.kind() {
            "init_declarator" => {
                let Some(inner) = child.child_by_field_name("declarator") else {
                    continue;
                };
                (inner, SymbolKind::Variable)
            }
            "function_declarator" => (child, SymbolKind::Function),
            "identifier" => (child, SymbolKind::Variable),
            "pointer_declarator" | "array_declarator" => (child, SymbolKind::Variable),
            _ => continue,
        };
        let Some(name) = node_identifier(target, source) else {
            continue;
        };
        if static_decl {
            statics.insert(name.clone());
        }
        out.symbols.push(symbol_at(kind, name, node, source));
    }
}

fn named_type(node: Node<'_>, source: &str, out: &mut ParsedFile, kind: SymbolKind) {
    // A bare `struct X;` reference carries no body and is not a declaration.
    if node.child_by_field_name("body").is_none() {
        return;
    }
    if let Some(name) = node.child_by_field_name("name") {
        out.symbols
            .push(symbol_at(kind, text(name, source), node, source));
    }
}

/// Follows declarator fields down to the declared identifier.
pub(crate) fn declarator_identifier(node: Node<'_>, source: &str) -> Option<String> {
    let declarator = node.child_by_field_name("declarator")?;
    node_identifier(declarator, source)
}

pub(crate) fn node_identifier(node: Node<'_>, source: &str) -> Option<String> {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" | "operator_name"
        | "destructor_name" => Some(text(node, source).to_string()),
        "qualified_identifier" => Some(text(node, source).to_string()),
        "parenthesized_declarator" => {
            let inner = named_children(node).next()?;
            node_identifier(inner, source)
        }
        _ => {
            let inner = node.child_by_field_name("declarator")?;
            node_identifier(inner, source)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::application::ParserService;
    use crate::connector::parser::TreeSitterParserService;
    use crate::domain::{Language, ParsedFile, SymbolKind};

    fn parse(source: &str) -> ParsedFile {
        TreeSitterParserService::new().parse(source, "util.c", Language::C)
    }

    #[test]
    fn test_includes_lose_delimiters() {
        let parsed = parse(
            r#"
#include <stdio.h>
#include "util.h"
"#,
        );
        let sources: Vec<&str> = parsed.imports.iter().map(|i| i.source.as_str()).collect();
        assert_eq!(sources, vec!["stdio.h", "util.h"]);
    }

    #[test]
    fn test_defines() {
        let parsed = parse(
            r#"
#define MAX_SIZE 128
#define SQUARE(x) ((x) * (x))
"#,
        );
        let kind_of = |name: &str| {
            parsed
                .symbols
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.kind)
        };
        assert_eq!(kind_of("MAX_SIZE"), Some(SymbolKind::Constant));
        assert_eq!(kind_of("SQUARE"), Some(SymbolKind::Function));
    }

    #[test]
    fn test_static_symbols_not_exported() {
        let parsed = parse(
            r#"
static int counter = 0;
int shared = 1;

static void helper(void) {}
void api(void) {}
"#,
        );

        let exports: Vec<&str> = parsed.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(exports.contains(&"shared"));
        assert!(exports.contains(&"api"));
        assert!(!exports.contains(&"counter"));
        assert!(!exports.contains(&"helper"));
    }

    #[test]
    fn test_struct_enum_typedef() {
        let parsed = parse(
            r#"
struct point { int x; int y; };
enum color { RED, GREEN };
typedef struct point point_t;
"#,
        );
        let kind_of = |name: &str| {
            parsed
                .symbols
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.kind)
        };
        assert_eq!(kind_of("point"), Some(SymbolKind::Struct));
        assert_eq!(kind_of("color"), Some(SymbolKind::Enum));
        assert_eq!(kind_of("point_t"), Some(SymbolKind::Type));
    }
}
