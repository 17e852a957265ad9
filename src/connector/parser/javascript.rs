//! JavaScript adapter: ESM handling shared with TypeScript, plus CommonJS
//! `require()` imports and `module.exports` / `exports.X` exports. ESM
//! wins when the same name is exported both ways.

use tree_sitter::Node;

use super::typescript;
use super::{named_children, strip_delimiters, text};
use crate::domain::{ParsedExport, ParsedFile, ParsedImport};

pub(crate) fn extract(root: Node<'_>, source: &str) -> ParsedFile {
    let mut out = ParsedFile::empty();
    let mut cjs_exports: Vec<ParsedExport> = Vec::new();

    for node in named_children(root) {
        if typescript::esm_top_level(node, source, &mut out) {
            continue;
        }
        if node.kind() == "expression_statement" {
            if let Some(expr) = node.named_child(0) {
                if expr.kind() == "assignment_expression" {
                    collect_cjs_exports(expr, source, &mut cjs_exports);
                }
            }
        }
        typescript::declaration(node, source, &mut out);
    }

    collect_require_imports(root, source, &mut out.imports);
    typescript::collect_dynamic_imports(root, source, &mut out.imports);

    // CJS exports fill in behind ESM ones of the same name.
    for export in cjs_exports {
        if !out.exports.iter().any(|e| e.name == export.name) {
            out.exports.push(export);
        }
    }

    out
}

/// The string argument of a `require("...")` call, when `node` is one.
fn require_source(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() != "call_expression" {
        return None;
    }
    let callee = node.child_by_field_name("function")?;
    if callee.kind() != "identifier" || text(callee, source) != "require" {
        return None;
    }
    let args = node.child_by_field_name("arguments")?;
    let arg = named_children(args).next()?;
    if arg.kind() != "string" {
        return None;
    }
    Some(strip_delimiters(text(arg, source)))
}

fn collect_require_imports(node: Node<'_>, source: &str, imports: &mut Vec<ParsedImport>) {
    match node.kind() {
        "variable_declarator" => {
            if let Some(value) = node.child_by_field_name("value") {
                if let Some(module) = require_source(value, source) {
                    let mut imp = ParsedImport::new(module);
                    if let Some(name) = node.child_by_field_name("name") {
                        match name.kind() {
                            "identifier" => {
                                // `const X = require('./x')` binds the module.
                                imp.is_default = true;
                                imp.names.push(text(name, source).to_string());
                            }
                            "object_pattern" => {
                                // Destructured requires become named imports.
                                imp.names = pattern_bindings(name, source);
                            }
                            _ => {}
                        }
                    }
                    imports.push(imp);
                    return;
                }
            }
        }
        "call_expression" => {
            if let Some(module) = require_source(node, source) {
                // A bare require() outside a declarator: side-effect import.
                let in_declarator = node
                    .parent()
                    .map(|p| p.kind() == "variable_declarator")
                    .unwrap_or(false);
                if !in_declarator {
                    imports.push(ParsedImport::new(module));
                }
                return;
            }
        }
        _ => {}
    }

    for child in named_children(node) {
        collect_require_imports(child, source, imports);
    }
}

fn pattern_bindings(pattern: Node<'_>, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    for child in named_children(pattern) {
        match child.kind() {
            "shorthand_property_identifier_pattern" => {
                names.push(text(child, source).to_string());
            }
            "pair_pattern" => {
                if let Some(value) = child.child_by_field_name("value") {
                    names.push(text(value, source).to_string());
                }
            }
            "object_assignment_pattern" => {
                if let Some(left) = child.child_by_field_name("left") {
                    names.push(text(left, source).to_string());
                }
            }
            _ => {}
        }
    }
    names
}

fn collect_cjs_exports(assignment: Node<'_>, source: &str, exports: &mut Vec<ParsedExport>) {
    let Some(left) = assignment.child_by_field_name("left") else {
        return;
    };
    if left.kind() != "member_expression" {
        return;
    }
    let left_text = text(left, source);

    if left_text == "module.exports" {
        let Some(right) = assignment.child_by_field_name("right") else {
            return;
        };
        match right.kind() {
            "identifier" => {
                exports.push(ParsedExport::new(text(right, source)).default_export());
            }
            "object" => {
                // `module.exports = { a, b }` exports each property.
                for prop in named_children(right) {
                    match prop.kind() {
                        "shorthand_property_identifier" => {
                            exports.push(ParsedExport::new(text(prop, source)));
                        }
                        "pair" => {
                            if let Some(key) = prop.child_by_field_name("key") {
                                exports.push(ParsedExport::new(text(key, source)));
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {
                exports.push(ParsedExport::new("default").default_export());
            }
        }
        return;
    }

    // `exports.X = …` and `module.exports.X = …`
    let object = left.child_by_field_name("object");
    let property = left.child_by_field_name("property");
    if let (Some(object), Some(property)) = (object, property) {
        let object_text = text(object, source);
        if object_text == "exports" || object_text == "module.exports" {
            exports.push(ParsedExport::new(text(property, source)));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::application::ParserService;
    use crate::connector::parser::TreeSitterParserService;
    use crate::domain::{Language, ParsedFile, SymbolKind};

    fn parse(source: &str) -> ParsedFile {
        TreeSitterParserService::new().parse(source, "test.js", Language::JavaScript)
    }

    #[test]
    fn test_require_forms() {
        let parsed = parse(
            r#"
const express = require('express');
const { readFile, writeFile: write } = require('fs');
require('./register');
"#,
        );

        assert_eq!(parsed.imports.len(), 3);

        let default = &parsed.imports[0];
        assert_eq!(default.source, "express");
        assert!(default.is_default);
        assert_eq!(default.names, vec!["express"]);

        let named = &parsed.imports[1];
        assert_eq!(named.source, "fs");
        assert!(!named.is_default);
        assert_eq!(named.names, vec!["readFile", "write"]);

        let bare = &parsed.imports[2];
        assert_eq!(bare.source, "./register");
        assert!(bare.names.is_empty());
    }

    #[test]
    fn test_esm_imports_work_in_js() {
        let parsed = parse("import { join } from './path-utils';");
        assert_eq!(parsed.imports.len(), 1);
        assert_eq!(parsed.imports[0].names, vec!["join"]);
    }

    #[test]
    fn test_cjs_export_patterns() {
        let parsed = parse(
            r#"
function start() {}
const stop = () => {};

module.exports = { start, stop };
exports.restart = function () {};
module.exports.status = () => {};
"#,
        );

        let names: Vec<&str> = parsed.exports.iter().map(|e| e.name.as_str()).collect();
        assert!(names.contains(&"start"));
        assert!(names.contains(&"stop"));
        assert!(names.contains(&"restart"));
        assert!(names.contains(&"status"));
    }

    #[test]
    fn test_module_exports_identifier_is_default() {
        let parsed = parse("class Server {}\nmodule.exports = Server;\n");
        let export = parsed.exports.iter().find(|e| e.name == "Server").unwrap();
        assert!(export.is_default);
    }

    #[test]
    fn test_esm_priority_over_cjs_on_duplicates() {
        let parsed = parse(
            r#"
export function run() {}
module.exports.run = somethingElse;
"#,
        );
        let runs: Vec<_> = parsed.exports.iter().filter(|e| e.name == "run").collect();
        assert_eq!(runs.len(), 1);
    }

    #[test]
    fn test_js_class_and_methods() {
        let parsed = parse(
            r#"
class Controller extends Base {
    handle(req) {}
}
"#,
        );
        let class = parsed
            .symbols
            .iter()
            .find(|s| s.name == "Controller")
            .unwrap();
        assert_eq!(class.kind, SymbolKind::Class);
        assert_eq!(class.extends.as_deref(), Some("Base"));
        assert!(parsed.symbols.iter().any(|s| s.name == "Controller.handle"));
    }
}
