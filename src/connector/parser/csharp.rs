//! C# adapter. `public` declarations are exported; records map to class;
//! base-list types lose their generic arguments.

use tree_sitter::Node;

use super::{children, named_children, strip_type_args, symbol_at, text};
use crate::domain::{ParsedExport, ParsedFile, ParsedImport, SymbolKind};

pub(crate) fn extract(root: Node<'_>, source: &str) -> ParsedFile {
    let mut out = ParsedFile::empty();
    let mut public: Vec<String> = Vec::new();

    for node in named_children(root) {
        statement(node, source, &mut out, &mut public);
    }

    out.exports = public.into_iter().map(ParsedExport::new).collect();
    out
}

fn is_public(node: Node<'_>, source: &str) -> bool {
    children(node)
        .filter(|c| c.kind() == "modifier")
        .any(|c| text(c, source) == "public")
}

fn statement(node: Node<'_>, source: &str, out: &mut ParsedFile, public: &mut Vec<String>) {
    match node.kind() {
        "using_directive" => using_directive(node, source, out),
        "namespace_declaration" | "file_scoped_namespace_declaration" => {
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
                    statement(child, source, out, public);
                }
            } else {
                // File-scoped namespaces keep their members as siblings.
                for child in named_children(node) {
                    statement(child, source, out, public);
                }
            }
        }
        "global_statement" => {
            for child in named_children(node) {
                statement(child, source, out, public);
            }
        }
        _ => type_declaration(node, source, out, public),
    }
}

/// `using X;`, `using static X;`, `using Alias = X;`
fn using_directive(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let Some(path_node) = named_children(node)
        .filter(|c| c.kind() != "name_equals")
        .find(|c| matches!(c.kind(), "qualified_name" | "identifier" | "generic_name"))
    else {
        return;
    };
    let path = text(path_node, source).to_string();
    let mut imp = ParsedImport::new(path.clone());

    let alias = children(node)
        .find(|c| c.kind() == "name_equals")
        .and_then(|n| named_children(n).next())
        .map(|n| text(n, source).to_string());

    match alias {
        Some(alias) => imp.names.push(alias),
        None => {
            if let Some(last) = path.rsplit('.').next() {
                imp.names.push(strip_type_args(last));
            }
        }
    }
    out.imports.push(imp);
}

fn type_declaration(
    node: Node<'_>,
    source: &str,
    out: &mut ParsedFile,
    public: &mut Vec<String>,
) {
    let kind = match node.kind() {
        "class_declaration" | "record_declaration" => SymbolKind::Class,
        "struct_declaration" => SymbolKind::Struct,
        "interface_declaration" => SymbolKind::Interface,
        "enum_declaration" => SymbolKind::Enum,
        "delegate_declaration" => SymbolKind::Type,
        _ => return,
    };

    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let type_name = text(name_node, source).to_string();
    let mut sym = symbol_at(kind, type_name.clone(), node, source);

    if let Some(bases) = children(node).find(|c| c.kind() == "base_list") {
        let mut names = named_children(bases)
            .filter(|n| matches!(n.kind(), "identifier" | "qualified_name" | "generic_name"))
            .map(|n| strip_type_args(text(n, source)));
        sym.extends = names.next();
        sym.implements = names.collect();
    }
    out.symbols.push(sym);
    if is_public(node, source) {
        public.push(type_name.clone());
    }

    if let Some(body) = node.child_by_field_name("body") {
        for member in named_children(body) {
            member_declaration(member, &type_name, source, out, public);
        }
    }
}

fn member_declaration(
    member: Node<'_>,
    owner: &str,
    source: &str,
    out: &mut ParsedFile,
    public: &mut Vec<String>,
) {
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
        "property_declaration" => {
            if let Some(name) = member.child_by_field_name("name") {
                out.symbols.push(symbol_at(
                    SymbolKind::Property,
                    format!("{}.{}", owner, text(name, source)),
                    member,
                    source,
                ));
            }
        }
        "field_declaration" => {
            for declaration in
                named_children(member).filter(|c| c.kind() == "variable_declaration")
            {
                for declarator in
                    named_children(declaration).filter(|c| c.kind() == "variable_declarator")
                {
                    if let Some(name) = named_children(declarator)
                        .find(|c| c.kind() == "identifier")
                    {
                        out.symbols.push(symbol_at(
                            SymbolKind::Property,
                            format!("{}.{}", owner, text(name, source)),
                            member,
                            source,
                        ));
                    }
                }
            }
        }
        // Nested types.
        "class_declaration" | "struct_declaration" | "interface_declaration"
        | "enum_declaration" | "record_declaration" => {
            type_declaration(member, source, out, public);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::application::ParserService;
    use crate::connector::parser::TreeSitterParserService;
    use crate::domain::{Language, ParsedFile, SymbolKind};

    fn parse(source: &str) -> ParsedFile {
        TreeSitterParserService::new().parse(source, "Program.cs", Language::CSharp)
    }

    #[test]
    fn test_using_forms() {
        let parsed = parse(
            r#"
using System;
using System.Collections.Generic;
using static System.Math;
using Col = System.Collections;

public class Program {}
"#,
        );

        assert_eq!(parsed.imports.len(), 4);
        assert_eq!(parsed.imports[0].source, "System");
        assert_eq!(parsed.imports[0].names, vec!["System"]);

        assert_eq!(parsed.imports[1].source, "System.Collections.Generic");
        assert_eq!(parsed.imports[1].names, vec!["Generic"]);

        assert_eq!(parsed.imports[2].source, "System.Math");
        assert_eq!(parsed.imports[2].names, vec!["Math"]);

        let aliased = &parsed.imports[3];
        assert_eq!(aliased.source, "System.Collections");
        assert_eq!(aliased.names, vec!["Col"]);
    }

    #[test]
    fn test_base_list_strips_generics() {
        let parsed = parse(
            r#"
public class UserRepository : RepositoryBase<User>, IRepository<User>, IDisposable
{
    public void Save(User user) {}
    public int Count { get; set; }
}
"#,
        );

        let class = parsed
            .symbols
            .iter()
            .find(|s| s.name == "UserRepository")
            .unwrap();
        assert_eq!(class.extends.as_deref(), Some("RepositoryBase"));
        assert_eq!(class.implements, vec!["IRepository", "IDisposable"]);

        assert!(parsed
            .symbols
            .iter()
            .any(|s| s.name == "UserRepository.Save" && s.kind == SymbolKind::Method));
        assert!(parsed
            .symbols
            .iter()
            .any(|s| s.name == "UserRepository.Count" && s.kind == SymbolKind::Property));
    }

    #[test]
    fn test_record_maps_to_class_and_public_exports() {
        let parsed = parse(
            r#"
namespace Domain;

public record Point(int X, int Y);

internal class Hidden {}
"#,
        );

        let point = parsed.symbols.iter().find(|s| s.name == "Point").unwrap();
        assert_eq!(point.kind, SymbolKind::Class);

        let exports: Vec<&str> = parsed.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(exports.contains(&"Point"));
        assert!(!exports.contains(&"Hidden"));
    }
}
