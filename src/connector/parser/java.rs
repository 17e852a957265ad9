//! Java adapter. `public` declarations are exported; a single field
//! declaration may introduce several names; records map to class and
//! annotation types to interface.

use tree_sitter::Node;

use super::{children, has_child_kind, named_children, strip_type_args, symbol_at, text};
use crate::domain::{ParsedExport, ParsedFile, ParsedImport, SymbolKind};

pub(crate) fn extract(root: Node<'_>, source: &str) -> ParsedFile {
    let mut out = ParsedFile::empty();

    for node in named_children(root) {
        match node.kind() {
            "import_declaration" => import_declaration(node, source, &mut out),
            _ => type_declaration(node, source, &mut out),
        }
    }

    out.exports = out
        .symbols
        .iter()
        .filter(|s| !s.name.contains('.'))
        .filter(|s| s.signature.as_deref().map(is_public).unwrap_or(false))
        .map(|s| ParsedExport::new(s.name.clone()))
        .collect();

    out
}

fn is_public(signature: &str) -> bool {
    signature.split_whitespace().any(|word| word == "public")
}

/// `import p.Q;`, `import p.*;`, `import static p.Q.X;`
fn import_declaration(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let Some(path_node) =
        named_children(node).find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
    else {
        return;
    };
    let path = text(path_node, source).to_string();
    let mut imp = ParsedImport::new(path.clone());

    if has_child_kind(node, "asterisk") {
        imp.is_namespace = true;
    } else if let Some(last) = path.rsplit('.').next() {
        imp.names.push(last.to_string());
    }
    out.imports.push(imp);
}

fn type_declaration(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let kind = match node.kind() {
        "class_declaration" | "record_declaration" => SymbolKind::Class,
        "interface_declaration" | "annotation_type_declaration" => SymbolKind::Interface,
        "enum_declaration" => SymbolKind::Enum,
        _ => return,
    };

    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let type_name = text(name_node, source).to_string();
    let mut sym = symbol_at(kind, type_name.clone(), node, source);

    if let Some(superclass) = children(node).find(|c| c.kind() == "superclass") {
        sym.extends = named_children(superclass)
            .next()
            .map(|n| strip_type_args(text(n, source)));
    }
    if let Some(interfaces) = children(node)
        .find(|c| c.kind() == "super_interfaces" || c.kind() == "extends_interfaces")
    {
        let types: Vec<String> = interfaces
            .named_child(0)
            .map(|list| {
                named_children(list)
                    .map(|n| strip_type_args(text(n, source)))
                    .collect()
            })
            .unwrap_or_default();
        if kind == SymbolKind::Interface && sym.extends.is_none() {
            let mut types = types.into_iter();
            sym.extends = types.next();
            sym.implements = types.collect();
        } else {
            sym.implements = types;
        }
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
        "method_declaration" | "constructor_declaration" => {
            if let Some(name) = member.child_by_field_name("name") {
                out.symbols.push(symbol_at(
                    SymbolKind::Method,
                    format!("{}.{}", owner, text(name, source)),
                    member,
                    source,
                ));
            }
        }
        "field_declaration" | "constant_declaration" => {
            // One declaration can carry several declarators.
            for declarator in
                named_children(member).filter(|c| c.kind() == "variable_declarator")
            {
                if let Some(name) = declarator.child_by_field_name("name") {
                    out.symbols.push(symbol_at(
                        SymbolKind::Property,
                        format!("{}.{}", owner, text(name, source)),
                        member,
                        source,
                    ));
                }
            }
        }
        // Nested types keep their own simple names.
        "class_declaration" | "interface_declaration" | "enum_declaration"
        | "record_declaration" | "annotation_type_declaration" => {
            type_declaration(member, source, out);
        }
        _ => {}
    }
}
