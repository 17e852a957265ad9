//! C++ adapter. Methods are `Owner::name`; the first base-clause entry is
//! `extends` and the rest are `implements`; `extern "C"` bodies and
//! template declarations are unwrapped.

use std::collections::HashSet;

use tree_sitter::Node;

use super::c::{declarator_identifier, node_identifier};
use super::{children, named_children, strip_delimiters, strip_type_args, symbol_at, text};
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

fn top_level(
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
        "import_declaration" => {
            // C++20 `import mod;` / `import <header>;`
            if let Some(arg) = named_children(node).next() {
                out.imports
                    .push(ParsedImport::new(strip_delimiters(text(arg, source))));
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
        "namespace_definition" => {
            if let Some(name) = node.child_by_field_name("name") {
                out.symbols.push(symbol_at(
                    SymbolKind::Namespace,
                    text(name, source),
                    node,
                    source,
                ));
            }
            if let Some(body) = node.child_by_field_name("body") {
                for child in named_children(body) {
                    top_level(child, source, out, statics);
                }
            }
        }
        "linkage_specification" => {
            // `extern "C" { … }` adds nothing to names; unwrap the body.
            if let Some(body) = node.child_by_field_name("body") {
                for child in named_children(body) {
                    top_level(child, source, out, statics);
                }
            }
        }
        "template_declaration" => {
            for child in named_children(node) {
                top_level(child, source, out, statics);
            }
        }
        "class_specifier" => record_type(node, source, out, SymbolKind::Class),
        "struct_specifier" => record_type(node, source, out, SymbolKind::Struct),
        "union_specifier" => record_type(node, source, out, SymbolKind::Struct),
        "enum_specifier" => {
            if node.child_by_field_name("body").is_some() {
                if let Some(name) = node.child_by_field_name("name") {
                    out.symbols
                        .push(symbol_at(SymbolKind::Enum, text(name, source), node, source));
                }
            }
        }
        "alias_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                out.symbols
                    .push(symbol_at(SymbolKind::Type, text(name, source), node, source));
            }
        }
        "type_definition" => {
            for decl in named_children(node).filter(|c| c.kind() == "type_identifier") {
                out.symbols
                    .push(symbol_at(SymbolKind::Type, text(decl, source), node, source));
            }
        }
        "function_definition" => {
            if let Some(name) = declarator_identifier(node, source) {
                if is_static(node, source) {
                    statics.insert(name.clone());
                }
                // An out-of-class definition keeps its qualified name.
                let kind = if name.contains("::") {
                    SymbolKind::Method
                } else {
                    SymbolKind::Function
                };
                out.symbols.push(symbol_at(kind, name, node, source));
            }
        }
        "declaration" => {
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
        _ => {}
    }
}

fn record_type(node: Node<'_>, source: &str, out: &mut ParsedFile, kind: SymbolKind) {
    if node.child_by_field_name("body").is_none() {
        return;
    }
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let type_name = strip_type_args(text(name_node, source));
    let mut sym = symbol_at(kind, type_name.clone(), node, source);

    if let Some(bases) = children(node).find(|c| c.kind() == "base_class_clause") {
        let mut names = named_children(bases)
            .filter(|n| {
                matches!(
                    n.kind(),
                    "type_identifier" | "qualified_identifier" | "template_type"
                )
            })
            .map(|n| strip_type_args(text(n, source)));
        sym.extends = names.next();
        sym.implements = names.collect();
    }
    out.symbols.push(sym);

    if let Some(body) = node.child_by_field_name("body") {
        for member in named_children(body) {
            member_declaration(member, &type_name, source, out);
        }
    }
}

fn member_declaration(member: Node<'_>, owner: &str, source: &str, out: &mut ParsedFile) {
    match member.kind() {
        "function_definition" => {
            if let Some(name) = declarator_identifier(member, source) {
                out.symbols.push(symbol_at(
                    SymbolKind::Method,
                    format!("{}::{}", owner, name),
                    member,
                    source,
                ));
            }
        }
        "field_declaration" => {
            let Some(declarator) = member.child_by_field_name("declarator") else {
                return;
            };
            let is_method = declarator.kind() == "function_declarator";
            if let Some(name) = node_identifier(declarator, source) {
                let kind = if is_method {
                    SymbolKind::Method
                } else {
                    SymbolKind::Property
                };
                out.symbols.push(symbol_at(
                    kind,
                    format!("{}::{}", owner, name),
                    member,
                    source,
                ));
            }
        }
        "template_declaration" => {
            for child in named_children(member) {
                member_declaration(child, owner, source, out);
            }
        }
        _ => {}
    }
}
