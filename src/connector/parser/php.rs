//! PHP adapter. `use` statements keep their backslash separators;
//! `include`/`require` count as dynamic imports; every top-level
//! declaration is exported.

use tree_sitter::Node;

use super::{children, named_children, strip_delimiters, symbol_at, text};
use crate::domain::{ParsedExport, ParsedFile, ParsedImport, SymbolKind};

pub(crate) fn extract(root: Node<'_>, source: &str) -> ParsedFile {
    let mut out = ParsedFile::empty();

    for node in named_children(root) {
        statement(node, source, &mut out);
    }
    collect_includes(root, source, &mut out.imports);

    out.exports = out
        .symbols
        .iter()
        .filter(|s| !s.name.contains('.'))
        .map(|s| ParsedExport::new(s.name.clone()))
        .collect();

    out
}

fn statement(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    match node.kind() {
        "namespace_use_declaration" => use_declaration(node, source, out),
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
                    statement(child, source, out);
                }
            }
        }
        "class_declaration" => class_declaration(node, source, out),
        "interface_declaration" => type_with_members(node, source, out, SymbolKind::Interface),
        "trait_declaration" => type_with_members(node, source, out, SymbolKind::Trait),
        "enum_declaration" => type_with_members(node, source, out, SymbolKind::Enum),
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
        "const_declaration" => {
            for element in named_children(node).filter(|c| c.kind() == "const_element") {
                if let Some(name) = named_children(element).next() {
                    out.symbols.push(symbol_at(
                        SymbolKind::Constant,
                        text(name, source),
                        element,
                        source,
                    ));
                }
            }
        }
        _ => {}
    }
}

/// `use A\B\C;`, `use A\{B, C};`, `use A\B as D;`
fn use_declaration(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let group_prefix = named_children(node)
        .find(|c| c.kind() == "namespace_name" || c.kind() == "qualified_name")
        .map(|n| text(n, source).to_string());

    let mut saw_group = false;
    for child in named_children(node) {
        match child.kind() {
            "namespace_use_clause" => {
                let Some(path_node) = named_children(child)
                    .find(|c| matches!(c.kind(), "qualified_name" | "name" | "namespace_name"))
                else {
                    continue;
                };
                let path = text(path_node, source).to_string();
                push_use(out, path, alias_of(child, source));
            }
            "namespace_use_group" => {
                saw_group = true;
                for clause in named_children(child) {
                    let Some(path_node) = named_children(clause).find(|c| {
                        matches!(c.kind(), "qualified_name" | "name" | "namespace_name")
                    }) else {
                        continue;
                    };
                    let sub = text(path_node, source);
                    let path = match &group_prefix {
                        Some(prefix) => format!("{}\\{}", prefix, sub),
                        None => sub.to_string(),
                    };
                    push_use(out, path, alias_of(clause, source));
                }
            }
            _ => {}
        }
    }

    // Some grammar revisions put a lone clause's path directly under the
    // declaration node.
    if !saw_group && out_has_no_clause(node) {
        if let Some(path) = group_prefix {
            push_use(out, path, None);
        }
    }
}

fn out_has_no_clause(node: Node<'_>) -> bool {
    !named_children(node)
        .any(|c| c.kind() == "namespace_use_clause" || c.kind() == "namespace_use_group")
}

fn alias_of(clause: Node<'_>, source: &str) -> Option<String> {
    children(clause)
        .find(|c| c.kind() == "namespace_aliasing_clause")
        .and_then(|a| named_children(a).next())
        .map(|n| text(n, source).to_string())
}

fn push_use(out: &mut ParsedFile, path: String, alias: Option<String>) {
    let binding = alias.unwrap_or_else(|| {
        path.rsplit('\\')
            .next()
            .unwrap_or(path.as_str())
            .to_string()
    });
    out.imports
        .push(ParsedImport::new(path).with_names(vec![binding]));
}

/// `include`/`require` and their `_once` variants, anywhere in the tree.
fn collect_includes(node: Node<'_>, source: &str, imports: &mut Vec<ParsedImport>) {
    if matches!(
        node.kind(),
        "include_expression"
            | "include_once_expression"
            | "require_expression"
            | "require_once_expression"
    ) {
        if let Some(arg) = named_children(node).next() {
            let raw = match arg.kind() {
                "string" | "encapsed_string" => strip_delimiters(text(arg, source)),
                _ => text(arg, source).to_string(),
            };
            imports.push(ParsedImport::new(raw).dynamic());
        }
    }
    for child in named_children(node) {
        collect_includes(child, source, imports);
    }
}

fn class_declaration(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let class_name = text(name_node, source).to_string();
    let mut sym = symbol_at(SymbolKind::Class, class_name.clone(), node, source);

    if let Some(base) = children(node).find(|c| c.kind() == "base_clause") {
        sym.extends = named_children(base)
            .next()
            .map(|n| text(n, source).to_string());
    }
    if let Some(ifaces) = children(node).find(|c| c.kind() == "class_interface_clause") {
        sym.implements = named_children(ifaces)
            .map(|n| text(n, source).to_string())
            .collect();
    }
    out.symbols.push(sym);

    members(node, &class_name, source, out);
}

fn type_with_members(node: Node<'_>, source: &str, out: &mut ParsedFile, kind: SymbolKind) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let type_name = text(name_node, source).to_string();
    let mut sym = symbol_at(kind, type_name.clone(), node, source);
    if let Some(base) = children(node).find(|c| c.kind() == "base_clause") {
        sym.extends = named_children(base)
            .next()
            .map(|n| text(n, source).to_string());
    }
    out.symbols.push(sym);

    members(node, &type_name, source, out);
}

fn members(node: Node<'_>, owner: &str, source: &str, out: &mut ParsedFile) {
    let Some(body) = node.child_by_field_name("body") else {
        return;
    };
    for member in named_children(body) {
        match member.kind() {
            "method_declaration" => {
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
                for element in
                    named_children(member).filter(|c| c.kind() == "property_element")
                {
                    let name = text(element, source).trim_start_matches('$').to_string();
                    let name = name.split('=').next().unwrap_or(&name).trim().to_string();
                    if !name.is_empty() {
                        out.symbols.push(symbol_at(
                            SymbolKind::Property,
                            format!("{}.{}", owner, name),
                            member,
                            source,
                        ));
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::application::ParserService;
    use crate::connector::parser::TreeSitterParserService;
    use crate::domain::{Language, ParsedFile, SymbolKind};

    fn parse(source: &str) -> ParsedFile {
        TreeSitterParserService::new().parse(source, "app.php", Language::Php)
    }

    #[test]
    fn test_use_declarations_keep_backslashes() {
        let parsed = parse(
            r#"<?php
use App\Services\AuthService;
use App\Models\{User, Role};
use Vendor\LongName as Short;
"#,
        );

        let sources: Vec<&str> = parsed.imports.iter().map(|i| i.source.as_str()).collect();
        assert!(sources.contains(&"App\\Services\\AuthService"));
        assert!(sources.contains(&"App\\Models\\User"));
        assert!(sources.contains(&"App\\Models\\Role"));

        let aliased = parsed
            .imports
            .iter()
            .find(|i| i.source == "Vendor\\LongName")
            .unwrap();
        assert_eq!(aliased.names, vec!["Short"]);
    }

    #[test]
    fn test_includes_are_dynamic_imports() {
        let parsed = parse(
            r#"<?php
require_once 'bootstrap.php';
include './helpers.php';
"#,
        );

        let dynamic: Vec<&str> = parsed
            .imports
            .iter()
            .filter(|i| i.is_dynamic)
            .map(|i| i.source.as_str())
            .collect();
        assert!(dynamic.contains(&"bootstrap.php"));
        assert!(dynamic.contains(&"./helpers.php"));
    }

    #[test]
    fn test_class_with_members_and_exports() {
        let parsed = parse(
            r#"<?php
class AuthService extends BaseService implements Loggable {
    private $tokens;

    public function login($user) {
        return true;
    }
}

function helper() {}
const VERSION = '1.0';
"#,
        );

        let class = parsed
            .symbols
            .iter()
            .find(|s| s.name == "AuthService")
            .unwrap();
        assert_eq!(class.kind, SymbolKind::Class);
        assert_eq!(class.extends.as_deref(), Some("BaseService"));
        assert_eq!(class.implements, vec!["Loggable"]);

        assert!(parsed
            .symbols
            .iter()
            .any(|s| s.name == "AuthService.login" && s.kind == SymbolKind::Method));
        assert!(parsed.symbols.iter().any(|s| s.name == "AuthService.tokens"));

        let exports: Vec<&str> = parsed.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(exports.contains(&"AuthService"));
        assert!(exports.contains(&"helper"));
        assert!(exports.contains(&"VERSION"));
        assert!(!exports.iter().any(|n| n.contains('.')));
    }
}
