//! Rust adapter. `use` trees are flattened into one import per leaf;
//! `pub` items are exported; impl blocks yield `Type.method` symbols and
//! `impl Trait for T` contributes `Trait` to T's implements list.

use tree_sitter::Node;

use super::{children, named_children, strip_type_args, symbol_at, text};
use crate::domain::{ParsedExport, ParsedFile, ParsedImport, SymbolKind};

pub(crate) fn extract(root: Node<'_>, source: &str) -> ParsedFile {
    let mut out = ParsedFile::empty();

    for node in named_children(root) {
        item(node, source, &mut out);
    }

    out
}

fn is_pub(node: Node<'_>) -> bool {
    children(node).any(|c| c.kind() == "visibility_modifier")
}

fn export_if_pub(node: Node<'_>, name: &str, out: &mut ParsedFile) {
    if is_pub(node) {
        out.exports.push(ParsedExport::new(name));
    }
}

fn item(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    match node.kind() {
        "use_declaration" => {
            if let Some(argument) = node.child_by_field_name("argument") {
                use_tree(argument, "", source, out);
            }
        }
        "function_item" => {
            if let Some(name) = node.child_by_field_name("name") {
                let name = text(name, source);
                out.symbols
                    .push(symbol_at(SymbolKind::Function, name, node, source));
                export_if_pub(node, name, out);
            }
        }
        "struct_item" | "union_item" => {
            named_item(node, source, out, SymbolKind::Struct);
        }
        "enum_item" => named_item(node, source, out, SymbolKind::Enum),
        "trait_item" => named_item(node, source, out, SymbolKind::Trait),
        "type_item" => named_item(node, source, out, SymbolKind::Type),
        "mod_item" => {
            named_item(node, source, out, SymbolKind::Module);
            if let Some(body) = node.child_by_field_name("body") {
                for child in named_children(body) {
                    item(child, source, out);
                }
            }
        }
        "const_item" | "static_item" => named_item(node, source, out, SymbolKind::Constant),
        "impl_item" => impl_item(node, source, out),
        _ => {}
    }
}

fn named_item(node: Node<'_>, source: &str, out: &mut ParsedFile, kind: SymbolKind) {
    if let Some(name) = node.child_by_field_name("name") {
        let name = text(name, source);
        out.symbols.push(symbol_at(kind, name, node, source));
        export_if_pub(node, name, out);
    }
}

fn impl_item(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let type_name = node
        .child_by_field_name("type")
        .map(|t| strip_type_args(text(t, source)));
    let trait_name = node
        .child_by_field_name("trait")
        .map(|t| strip_type_args(text(t, source)));

    let Some(type_name) = type_name else { return };

    // `impl Trait for T` records Trait on T's declaration when T lives in
    // this file.
    if let Some(trait_name) = &trait_name {
        if let Some(target) = out.symbols.iter_mut().find(|s| s.name == type_name) {
            if !target.implements.contains(trait_name) {
                target.implements.push(trait_name.clone());
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        for member in named_children(body) {
            if member.kind() == "function_item" {
                if let Some(name) = member.child_by_field_name("name") {
                    let full = format!("{}.{}", type_name, text(name, source));
                    out.symbols
                        .push(symbol_at(SymbolKind::Method, full.clone(), member, source));
                    export_if_pub(member, &full, out);
                }
            }
        }
    }
}

/// Flattens a `use` tree: one import per leaf binding; wildcards become
/// namespace imports of their prefix.
fn use_tree(node: Node<'_>, prefix: &str, source: &str, out: &mut ParsedFile) {
    match node.kind() {
        "identifier" => {
            let name = text(node, source);
            let path = join_path(prefix, name);
            out.imports
                .push(ParsedImport::new(path).with_names(vec![name.to_string()]));
        }
        "self" | "crate" | "super" => {
            let name = text(node, source);
            let path = join_path(prefix, name);
            out.imports
                .push(ParsedImport::new(path).with_names(vec![name.to_string()]));
        }
        "scoped_identifier" => {
            let path = join_path(prefix, text(node, source));
            let leaf = node
                .child_by_field_name("name")
                .map(|n| text(n, source).to_string())
                .unwrap_or_default();
            out.imports
                .push(ParsedImport::new(path).with_names(vec![leaf]));
        }
        "use_as_clause" => {
            let path = node
                .child_by_field_name("path")
                .map(|p| join_path(prefix, text(p, source)))
                .unwrap_or_else(|| prefix.to_string());
            let alias = node
                .child_by_field_name("alias")
                .map(|a| text(a, source).to_string())
                .unwrap_or_default();
            out.imports
                .push(ParsedImport::new(path).with_names(vec![alias]));
        }
        "use_wildcard" => {
            let path = named_children(node)
                .next()
                .map(|p| join_path(prefix, text(p, source)))
                .unwrap_or_else(|| prefix.to_string());
            out.imports.push(ParsedImport::new(path).namespace());
        }
        "scoped_use_list" => {
            let path = node
                .child_by_field_name("path")
                .map(|p| join_path(prefix, text(p, source)))
                .unwrap_or_else(|| prefix.to_string());
            if let Some(list) = node.child_by_field_name("list") {
                for child in named_children(list) {
                    use_tree(child, &path, source, out);
                }
            }
        }
        "use_list" => {
            for child in named_children(node) {
                use_tree(child, prefix, source, out);
            }
        }
        _ => {}
    }
}

fn join_path(prefix: &str, rest: &str) -> String {
    if prefix.is_empty() {
        rest.to_string()
    } else {
        format!("{}::{}", prefix, rest)
    }
}
