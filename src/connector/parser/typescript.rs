//! TypeScript / TSX adapter: ESM imports (incl. `import type` and dynamic
//! `import()`), explicit exports and re-exports, and declaration symbols
//! with class members as `Class.member`.

use tree_sitter::Node;

use super::{
    children, has_child_kind, named_children, strip_delimiters, strip_type_args, symbol_at, text,
};
use crate::domain::{ParsedExport, ParsedFile, ParsedImport, SymbolKind};

pub(crate) fn extract(root: Node<'_>, source: &str) -> ParsedFile {
    let mut out = ParsedFile::empty();
    for node in named_children(root) {
        top_level(node, source, &mut out);
    }
    collect_dynamic_imports(root, source, &mut out.imports);
    out
}

fn top_level(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    match node.kind() {
        "import_statement" => import_statement(node, source, out),
        "export_statement" => export_statement(node, source, out),
        "ambient_declaration" => {
            for child in named_children(node) {
                top_level(child, source, out);
            }
        }
        _ => declaration(node, source, out),
    }
}

fn import_statement(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let Some(src_node) = node.child_by_field_name("source") else {
        return;
    };
    let mut imp = ParsedImport::new(strip_delimiters(text(src_node, source)));
    imp.is_type_only = has_child_kind(node, "type");

    if let Some(clause) = children(node).find(|c| c.kind() == "import_clause") {
        for child in named_children(clause) {
            match child.kind() {
                "identifier" => {
                    imp.is_default = true;
                    imp.names.push(text(child, source).to_string());
                }
                "namespace_import" => {
                    imp.is_namespace = true;
                    if let Some(ident) =
                        named_children(child).find(|c| c.kind() == "identifier")
                    {
                        imp.names.push(text(ident, source).to_string());
                    }
                }
                "named_imports" => {
                    for spec in named_children(child).filter(|c| c.kind() == "import_specifier") {
                        let local = spec
                            .child_by_field_name("alias")
                            .or_else(|| spec.child_by_field_name("name"));
                        if let Some(local) = local {
                            imp.names.push(text(local, source).to_string());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    out.imports.push(imp);
}

fn export_statement(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let module = node
        .child_by_field_name("source")
        .map(|s| strip_delimiters(text(s, source)));

    if let Some(decl) = node.child_by_field_name("declaration") {
        let is_default = has_child_kind(node, "default");
        let before = out.symbols.len();
        declaration(decl, source, out);
        for sym in &out.symbols[before..] {
            // Members come along with an exported class; only the
            // declaration's own names are exported.
            if !sym.name.contains('.') {
                let mut export = ParsedExport::new(sym.name.clone());
                export.is_default = is_default;
                out.exports.push(export);
            }
        }
        return;
    }

    if let Some(value) = node.child_by_field_name("value") {
        // `export default <expression>`
        let name = if value.kind() == "identifier" {
            text(value, source).to_string()
        } else {
            "default".to_string()
        };
        out.exports.push(ParsedExport::new(name).default_export());
        return;
    }

    for child in children(node) {
        match child.kind() {
            "export_clause" => {
                for spec in named_children(child).filter(|c| c.kind() == "export_specifier") {
                    let exported = spec
                        .child_by_field_name("alias")
                        .or_else(|| spec.child_by_field_name("name"));
                    let Some(exported) = exported else { continue };
                    let mut export = ParsedExport::new(text(exported, source));
                    export.is_default = export.name == "default";
                    if let Some(module) = &module {
                        export = export.re_export(module.clone());
                        export.is_default = false;
                    }
                    out.exports.push(export);
                }
            }
            "namespace_export" => {
                // `export * as ns from "./x"`
                if let Some(ident) = named_children(child).next() {
                    let mut export = ParsedExport::new(text(ident, source));
                    if let Some(module) = &module {
                        export = export.re_export(module.clone());
                    }
                    out.exports.push(export);
                }
            }
            "*" => {
                let mut export = ParsedExport::new("*");
                if let Some(module) = &module {
                    export = export.re_export(module.clone());
                }
                out.exports.push(export);
            }
            _ => {}
        }
    }
}

pub(crate) fn declaration(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" | "function_signature" => {
            if let Some(name) = node.child_by_field_name("name") {
                out.symbols.push(symbol_at(
                    SymbolKind::Function,
                    text(name, source),
                    node,
                    source,
                ));
            }
        }
        "class_declaration" | "abstract_class_declaration" => class_declaration(node, source, out),
        "interface_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                let mut sym =
                    symbol_at(SymbolKind::Interface, text(name, source), node, source);
                sym.extends = interface_extends(node, source);
                out.symbols.push(sym);
            }
        }
        "type_alias_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                out.symbols
                    .push(symbol_at(SymbolKind::Type, text(name, source), node, source));
            }
        }
        "enum_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                out.symbols
                    .push(symbol_at(SymbolKind::Enum, text(name, source), node, source));
            }
        }
        "lexical_declaration" | "variable_declaration" => declarators(node, source, out),
        "internal_module" | "module" => {
            let kind = if node.kind() == "internal_module" {
                SymbolKind::Namespace
            } else {
                SymbolKind::Module
            };
            if let Some(name) = node.child_by_field_name("name") {
                out.symbols
                    .push(symbol_at(kind, text(name, source), node, source));
            }
            if let Some(body) = node.child_by_field_name("body") {
                for child in named_children(body) {
                    top_level(child, source, out);
                }
            }
        }
        _ => {}
    }
}

fn class_declaration(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let class_name = text(name_node, source).to_string();
    let mut sym = symbol_at(SymbolKind::Class, class_name.clone(), node, source);

    if let Some(heritage) = children(node).find(|c| c.kind() == "class_heritage") {
        let mut saw_clause = false;
        for clause in children(heritage) {
            match clause.kind() {
                "extends_clause" => {
                    saw_clause = true;
                    sym.extends = named_children(clause)
                        .next()
                        .map(|n| strip_type_args(text(n, source)));
                }
                "implements_clause" => {
                    saw_clause = true;
                    sym.implements = named_children(clause)
                        .map(|n| strip_type_args(text(n, source)))
                        .collect();
                }
                _ => {}
            }
        }
        // The JavaScript grammar puts the superclass expression directly
        // under class_heritage, without clause nodes.
        if !saw_clause {
            sym.extends = named_children(heritage)
                .next()
                .map(|n| strip_type_args(text(n, source)));
        }
    }
    out.symbols.push(sym);

    if let Some(body) = node.child_by_field_name("body") {
        for member in named_children(body) {
            class_member(member, &class_name, source, out);
        }
    }
}

fn class_member(member: Node<'_>, class_name: &str, source: &str, out: &mut ParsedFile) {
    match member.kind() {
        "method_definition" => {
            if let Some(name) = member.child_by_field_name("name") {
                out.symbols.push(symbol_at(
                    SymbolKind::Method,
                    format!("{}.{}", class_name, text(name, source)),
                    member,
                    source,
                ));
            }
        }
        "public_field_definition" | "field_definition" => {
            let Some(name) = member.child_by_field_name("name") else {
                return;
            };
            let kind = match member.child_by_field_name("value").map(|v| v.kind()) {
                Some("arrow_function") | Some("function_expression") | Some("function") => {
                    SymbolKind::Method
                }
                _ => SymbolKind::Property,
            };
            out.symbols.push(symbol_at(
                kind,
                format!("{}.{}", class_name, text(name, source)),
                member,
                source,
            ));
        }
        _ => {}
    }
}

fn interface_extends(node: Node<'_>, source: &str) -> Option<String> {
    let clause = children(node)
        .find(|c| c.kind() == "extends_type_clause" || c.kind() == "extends_clause")?;
    named_children(clause)
        .next()
        .map(|n| strip_type_args(text(n, source)))
}

fn declarators(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let is_const = has_child_kind(node, "const");
    for decl in named_children(node).filter(|c| c.kind() == "variable_declarator") {
        let Some(name_node) = decl.child_by_field_name("name") else {
            continue;
        };
        if name_node.kind() != "identifier" {
            continue;
        }
        let kind = match decl.child_by_field_name("value").map(|v| v.kind()) {
            Some("arrow_function") | Some("function_expression") | Some("function") => {
                SymbolKind::Function
            }
            _ if is_const => SymbolKind::Constant,
            _ => SymbolKind::Variable,
        };
        out.symbols
            .push(symbol_at(kind, text(name_node, source), decl, source));
    }
}

/// Dynamic `import("...")` can appear anywhere in the tree.
pub(crate) fn collect_dynamic_imports(
    node: Node<'_>,
    source: &str,
    imports: &mut Vec<ParsedImport>,
) {
    if node.kind() == "call_expression" {
        let callee = node.child_by_field_name("function");
        if callee.map(|c| c.kind()) == Some("import") {
            if let Some(args) = node.child_by_field_name("arguments") {
                if let Some(arg) = named_children(args).next() {
                    if arg.kind() == "string" {
                        imports.push(
                            ParsedImport::new(strip_delimiters(text(arg, source))).dynamic(),
                        );
                    }
                }
            }
        }
    }
    for child in named_children(node) {
        collect_dynamic_imports(child, source, imports);
    }
}

/// Shared with the JavaScript adapter, which handles the same ESM nodes.
pub(crate) fn esm_top_level(node: Node<'_>, source: &str, out: &mut ParsedFile) -> bool {
    match node.kind() {
        "import_statement" => {
            import_statement(node, source, out);
            true
        }
        "export_statement" => {
            export_statement(node, source, out);
            true
        }
        _ => false,
    }
}
