//! Python adapter. Exports follow `__all__` when declared, otherwise every
//! non-underscore top-level name; class methods are `Class.method`.

use tree_sitter::Node;

use super::{named_children, strip_delimiters, symbol_at, text};
use crate::domain::{ParsedExport, ParsedFile, ParsedImport, SymbolKind};

pub(crate) fn extract(root: Node<'_>, source: &str) -> ParsedFile {
    let mut out = ParsedFile::empty();
    let mut dunder_all: Option<Vec<String>> = None;

    for node in named_children(root) {
        statement(node, source, &mut out, &mut dunder_all);
    }

    match dunder_all {
        Some(names) => {
            out.exports = names.into_iter().map(ParsedExport::new).collect();
        }
        None => {
            out.exports = out
                .symbols
                .iter()
                .filter(|s| !s.name.contains('.') && !s.name.starts_with('_'))
                .map(|s| ParsedExport::new(s.name.clone()))
                .collect();
        }
    }

    out
}

fn statement(
    node: Node<'_>,
    source: &str,
    out: &mut ParsedFile,
    dunder_all: &mut Option<Vec<String>>,
) {
    match node.kind() {
        "import_statement" => import_statement(node, source, out),
        "import_from_statement" => import_from_statement(node, source, out),
        "function_definition" => {
            if let Some(name) = node.child_by_field_name("name") {
                out.symbols.push(symbol_at(
                    SymbolKind::Function,
                    text(name, source),
                    node,
                    source,
                ));
            }
        }
        "class_definition" => class_definition(node, source, out),
        "decorated_definition" => {
            if let Some(inner) = node.child_by_field_name("definition") {
                statement(inner, source, out, dunder_all);
            }
        }
        "expression_statement" => {
            if let Some(expr) = node.named_child(0) {
                if expr.kind() == "assignment" {
                    assignment(expr, source, out, dunder_all);
                }
            }
        }
        _ => {}
    }
}

/// `import x`, `import x as y`, `import a.b`.
fn import_statement(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    for child in named_children(node) {
        match child.kind() {
            "dotted_name" => {
                let module = text(child, source).to_string();
                out.imports
                    .push(ParsedImport::new(module.clone()).with_names(vec![module]));
            }
            "aliased_import" => {
                let module = child
                    .child_by_field_name("name")
                    .map(|n| text(n, source).to_string())
                    .unwrap_or_default();
                let alias = child
                    .child_by_field_name("alias")
                    .map(|n| text(n, source).to_string());
                let names = alias.into_iter().collect();
                out.imports.push(ParsedImport::new(module).with_names(names));
            }
            _ => {}
        }
    }
}

/// `from x import a, b`, `from . import x`, `from x import *`.
fn import_from_statement(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let source_module = node
        .child_by_field_name("module_name")
        .map(|n| text(n, source).to_string())
        .unwrap_or_default();
    let mut imp = ParsedImport::new(source_module);

    let module_node = node.child_by_field_name("module_name");
    for child in named_children(node) {
        // The module itself also matches dotted_name; skip that occurrence.
        if Some(child.id()) == module_node.map(|n| n.id()) {
            continue;
        }
        match child.kind() {
            "dotted_name" => imp.names.push(text(child, source).to_string()),
            "aliased_import" => {
                if let Some(alias) = child.child_by_field_name("alias") {
                    imp.names.push(text(alias, source).to_string());
                }
            }
            "wildcard_import" => imp.is_namespace = true,
            _ => {}
        }
    }

    out.imports.push(imp);
}

fn class_definition(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let class_name = text(name_node, source).to_string();
    let mut sym = symbol_at(SymbolKind::Class, class_name.clone(), node, source);

    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        let mut bases = named_children(superclasses)
            .filter(|n| matches!(n.kind(), "identifier" | "attribute"))
            .map(|n| text(n, source).to_string());
        sym.extends = bases.next();
        sym.implements = bases.collect();
    }
    out.symbols.push(sym);

    if let Some(body) = node.child_by_field_name("body") {
        for member in named_children(body) {
            let member = if member.kind() == "decorated_definition" {
                member.child_by_field_name("definition").unwrap_or(member)
            } else {
                member
            };
            if member.kind() == "function_definition" {
                if let Some(name) = member.child_by_field_name("name") {
                    out.symbols.push(symbol_at(
                        SymbolKind::Method,
                        format!("{}.{}", class_name, text(name, source)),
                        member,
                        source,
                    ));
                }
            }
        }
    }
}

fn assignment(
    node: Node<'_>,
    source: &str,
    out: &mut ParsedFile,
    dunder_all: &mut Option<Vec<String>>,
) {
    let Some(left) = node.child_by_field_name("left") else {
        return;
    };
    if left.kind() != "identifier" {
        return;
    }
    let name = text(left, source);

    if name == "__all__" {
        if let Some(right) = node.child_by_field_name("right") {
            let names = named_children(right)
                .filter(|n| n.kind() == "string")
                .map(|n| strip_delimiters(text(n, source)))
                .collect();
            *dunder_all = Some(names);
        }
        return;
    }

    out.symbols
        .push(symbol_at(SymbolKind::Variable, name, node, source));
}
