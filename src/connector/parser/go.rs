//! Go adapter. Exported symbols are the ones whose name starts uppercase;
//! methods are `Receiver.Name` with any pointer stripped.

use tree_sitter::Node;

use super::{named_children, strip_delimiters, symbol_at, text};
use crate::domain::{ParsedExport, ParsedFile, ParsedImport, SymbolKind};

pub(crate) fn extract(root: Node<'_>, source: &str) -> ParsedFile {
    let mut out = ParsedFile::empty();

    for node in named_children(root) {
        match node.kind() {
            "import_declaration" => import_declaration(node, source, &mut out),
            "function_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    out.symbols.push(symbol_at(
                        SymbolKind::Function,
                        text(name, source),
                        node,
                        source,
                    ));
                }
            }
            "method_declaration" => method_declaration(node, source, &mut out),
            "type_declaration" => type_declaration(node, source, &mut out),
            "const_declaration" => value_specs(node, source, &mut out, SymbolKind::Constant),
            "var_declaration" => value_specs(node, source, &mut out, SymbolKind::Variable),
            _ => {}
        }
    }

    out.exports = out
        .symbols
        .iter()
        .filter(|s| exported_name(&s.name))
        .map(|s| ParsedExport::new(s.name.clone()))
        .collect();

    out
}

/// Go's visibility rule: the name's first letter is uppercase. For
/// methods, the method name itself decides.
fn exported_name(name: &str) -> bool {
    let short = name.rsplit('.').next().unwrap_or(name);
    short.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

fn import_declaration(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let mut specs = Vec::new();
    for child in named_children(node) {
        match child.kind() {
            "import_spec" => specs.push(child),
            "import_spec_list" => {
                specs.extend(named_children(child).filter(|c| c.kind() == "import_spec"));
            }
            _ => {}
        }
    }

    for spec in specs {
        let Some(path_node) = spec.child_by_field_name("path") else {
            continue;
        };
        let path = strip_delimiters(text(path_node, source));
        let mut imp = ParsedImport::new(path.clone());

        match spec.child_by_field_name("name") {
            Some(name) => match name.kind() {
                "dot" => imp.is_namespace = true,
                "blank_identifier" => {}
                _ => imp.names.push(text(name, source).to_string()),
            },
            None => {
                if let Some(last) = path.rsplit('/').next() {
                    imp.names.push(last.to_string());
                }
            }
        }
        out.imports.push(imp);
    }
}

fn method_declaration(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    let Some(name) = node.child_by_field_name("name") else {
        return;
    };
    let receiver = node
        .child_by_field_name("receiver")
        .and_then(|r| named_children(r).find(|c| c.kind() == "parameter_declaration"))
        .and_then(|p| p.child_by_field_name("type"))
        .map(|t| text(t, source).trim_start_matches('*').to_string());

    let full_name = match receiver {
        Some(recv) => format!("{}.{}", recv, text(name, source)),
        None => text(name, source).to_string(),
    };
    out.symbols
        .push(symbol_at(SymbolKind::Method, full_name, node, source));
}

fn type_declaration(node: Node<'_>, source: &str, out: &mut ParsedFile) {
    for spec in named_children(node).filter(|c| c.kind() == "type_spec") {
        let Some(name) = spec.child_by_field_name("name") else {
            continue;
        };
        let kind = match spec.child_by_field_name("type").map(|t| t.kind()) {
            Some("struct_type") => SymbolKind::Struct,
            Some("interface_type") => SymbolKind::Interface,
            _ => SymbolKind::Type,
        };
        out.symbols
            .push(symbol_at(kind, text(name, source), spec, source));
    }
}

fn value_specs(node: Node<'_>, source: &str, out: &mut ParsedFile, kind: SymbolKind) {
    for spec in named_children(node)
        .filter(|c| c.kind() == "const_spec" || c.kind() == "var_spec")
    {
        for name in named_children(spec).filter(|c| c.kind() == "identifier") {
            out.symbols
                .push(symbol_at(kind, text(name, source), spec, source));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::application::ParserService;
    use crate::connector::parser::TreeSitterParserService;
    use crate::domain::{Language, ParsedFile, SymbolKind};

    fn parse(source: &str) -> ParsedFile {
        TreeSitterParserService::new().parse(source, "main.go", Language::Go)
    }

    #[test]
    fn test_import_forms() {
        let parsed = parse(
            r#"
package main

import "fmt"

import (
    "net/http"
    alias "strings"
    . "math"
    _ "embed"
)
"#,
        );

        assert_eq!(parsed.imports.len(), 5);
        assert_eq!(parsed.imports[0].source, "fmt");
        assert_eq!(parsed.imports[0].names, vec!["fmt"]);

        assert_eq!(parsed.imports[1].source, "net/http");
        assert_eq!(parsed.imports[1].names, vec!["http"]);

        assert_eq!(parsed.imports[2].names, vec!["alias"]);

        assert!(parsed.imports[3].is_namespace);
        assert!(parsed.imports[3].names.is_empty());

        assert_eq!(parsed.imports[4].source, "embed");
        assert!(parsed.imports[4].names.is_empty());
    }

    #[test]
    fn test_uppercase_exports() {
        let parsed = parse(
            r#"
package server

func Public() {}
func private() {}

type Handler struct{}
type config struct{}

const MaxSize = 10
var counter = 0
"#,
        );

        let names: Vec<&str> = parsed.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"Public"));
        assert!(names.contains(&"Handler"));
        assert!(names.contains(&"MaxSize"));
        assert!(!names.contains(&"private"));
        assert!(!names.contains(&"config"));
        assert!(!names.contains(&"counter"));
    }

    #[test]
    fn test_method_receiver_strips_pointer() {
        let parsed = parse(
            r#"
package server

type Server struct{}

func (s *Server) Start() error { return nil }
func (s Server) Name() string { return "" }
"#,
        );

        let start = parsed
            .symbols
            .iter()
            .find(|s| s.name == "Server.Start")
            .unwrap();
        assert_eq!(start.kind, SymbolKind::Method);
        assert!(parsed.symbols.iter().any(|s| s.name == "Server.Name"));
    }

    #[test]
    fn test_struct_and_interface_kinds() {
        let parsed = parse(
            r#"
package x

type Store struct{}
type Reader interface{}
type ID int
"#,
        );
        let kind_of = |name: &str| {
            parsed
                .symbols
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.kind)
        };
        assert_eq!(kind_of("Store"), Some(SymbolKind::Struct));
        assert_eq!(kind_of("Reader"), Some(SymbolKind::Interface));
        assert_eq!(kind_of("ID"), Some(SymbolKind::Type));
    }
}
