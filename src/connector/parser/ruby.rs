//! Ruby adapter. `require_relative` sources gain a leading `./`; `load`
//! is dynamic; `attr_*` calls turn into property symbols on the class.

use tree_sitter::Node;

use super::{named_children, strip_delimiters, symbol_at, text};
use crate::domain::{ParsedExport, ParsedFile, ParsedImport, SymbolKind};

pub(crate) fn extract(root: Node<'_>, source: &str) -> ParsedFile {
    let mut out = ParsedFile::empty();

    for node in named_children(root) {
        statement(node, source, &mut out, None);
    }

    out.exports = out
        .symbols
        .iter()
        .filter(|s| !s.name.contains('.'))
        .map(|s| ParsedExport::new(s.name.clone()))
        .collect();

    out
}

fn statement(node: Node<'_>, source: &str, out: &mut ParsedFile, owner: Option<&str>) {
    match node.kind() {
        "call" => call(node, source, out, owner),
        "class" => class_like(node, source, out, SymbolKind::Class),
        "module" => class_like(node, source, out, SymbolKind::Module),
        "method" => {
            if let Some(name) = node.child_by_field_name("name") {
                let (kind, full) = match owner {
                    Some(owner) => (
                        SymbolKind::Method,
                        format!("{}.{}", owner, text(name, source)),
                    ),
                    None => (SymbolKind::Function, text(name, source).to_string()),
                };
                out.symbols.push(symbol_at(kind, full, node, source));
            }
        }
        "singleton_method" => {
            if let Some(name) = node.child_by_field_name("name") {
                let full = match owner {
                    Some(owner) => format!("{}.{}", owner, text(name, source)),
                    None => text(name, source).to_string(),
                };
                out.symbols
                    .push(symbol_at(SymbolKind::Method, full, node, source));
            }
        }
        "body_statement" => {
            for child in named_children(node) {
                statement(child, source, out, owner);
            }
        }
        _ => {}
    }
}

fn call(node: Node<'_>, source: &str, out: &mut ParsedFile, owner: Option<&str>) {
    let Some(method) = node.child_by_field_name("method") else {
        return;
    };
    let method_name = text(method, source);

    match method_name {
        "require" | "require_relative" | "load" => {
            let Some(raw) = first_string_argument(node, source) else {
                return;
            };
            let source_path = if method_name == "require_relative" && !raw.starts_with('.') {
                format!("./{}", raw)
            } else {
                raw
            };
            let mut imp = ParsedImport::new(source_path);
            imp.is_dynamic = method_name == "load";
            out.imports.push(imp);
        }
        "attr_accessor" | "attr_reader" | "attr_writer" => {
            let Some(owner) = owner else { return };
            let Some(args) = node.child_by_field_name("arguments") else {
                return;
            };
            for arg in named_children(args).filter(|a| a.kind() == "simple_symbol") {
                let name = text(arg, source).trim_start_matches(':').to_string();
                out.symbols.push(symbol_at(
                    SymbolKind::Property,
                    format!("{}.{}", owner, name),
                    node,
                    source,
                ));
            }
        }
        _ => {}
    }
}

fn first_string_argument(node: Node<'_>, source: &str) -> Option<String> {
    let args = node.child_by_field_name("arguments")?;
    let arg = named_children(args).find(|a| a.kind() == "string")?;
    Some(strip_delimiters(text(arg, source)))
}

fn class_like(node: Node<'_>, source: &str, out: &mut ParsedFile, kind: SymbolKind) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let type_name = text(name_node, source).to_string();
    let mut sym = symbol_at(kind, type_name.clone(), node, source);

    if let Some(superclass) = node.child_by_field_name("superclass") {
        sym.extends = named_children(superclass)
            .next()
            .map(|n| text(n, source).to_string());
    }
    out.symbols.push(sym);

    for child in named_children(node) {
        statement(child, source, out, Some(&type_name));
    }
}

#[cfg(test)]
mod tests {
    use crate::application::ParserService;
    use crate::connector::parser::TreeSitterParserService;
    use crate::domain::{Language, ParsedFile, SymbolKind};

    fn parse(source: &str) -> ParsedFile {
        TreeSitterParserService::new().parse(source, "app.rb", Language::Ruby)
    }

    #[test]
    fn test_require_forms() {
        let parsed = parse(
            r#"
require 'json'
require_relative 'models/user'
load 'legacy.rb'
"#,
        );

        assert_eq!(parsed.imports.len(), 3);
        assert_eq!(parsed.imports[0].source, "json");

        // require_relative gains an explicit leading ./
        assert_eq!(parsed.imports[1].source, "./models/user");

        assert_eq!(parsed.imports[2].source, "legacy.rb");
        assert!(parsed.imports[2].is_dynamic);
    }

    #[test]
    fn test_class_with_attr_accessors() {
        let parsed = parse(
            r#"
class User < Base
  attr_accessor :name, :email
  attr_reader :id

  def save
    true
  end
end
"#,
        );

        let class = parsed.symbols.iter().find(|s| s.name == "User").unwrap();
        assert_eq!(class.kind, SymbolKind::Class);
        assert_eq!(class.extends.as_deref(), Some("Base"));

        let props: Vec<&str> = parsed
            .symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Property)
            .map(|s| s.name.as_str())
            .collect();
        assert!(props.contains(&"User.name"));
        assert!(props.contains(&"User.email"));
        assert!(props.contains(&"User.id"));

        assert!(parsed
            .symbols
            .iter()
            .any(|s| s.name == "User.save" && s.kind == SymbolKind::Method));
    }

    #[test]
    fn test_top_level_exports() {
        let parsed = parse(
            r#"
module Billing
end

def helper
end
"#,
        );
        let names: Vec<&str> = parsed.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"Billing"));
        assert!(names.contains(&"helper"));
    }
}
