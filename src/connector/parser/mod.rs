//! Tree-sitter parsing: grammar dispatch plus one adapter per language.
//!
//! Every adapter walks the concrete tree and produces the same
//! `ParsedFile` shape. Grammar or parse failures degrade to an empty
//! result; the indexer reports them as warnings and moves on.

mod c;
mod cpp;
mod csharp;
mod go;
mod java;
mod javascript;
mod php;
mod python;
mod ruby;
mod rust;
mod typescript;

use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::application::ParserService;
use crate::domain::{Language, ParsedFile, ParsedSymbol, SymbolKind};

pub struct TreeSitterParserService;

impl TreeSitterParserService {
    pub fn new() -> Self {
        Self
    }

    fn grammar_for(lang: Language, path: &str) -> Option<tree_sitter::Language> {
        match lang {
            Language::TypeScript => {
                if path.ends_with(".tsx") {
                    Some(tree_sitter_typescript::LANGUAGE_TSX.into())
                } else {
                    Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
                }
            }
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::Php => Some(tree_sitter_php::LANGUAGE_PHP.into()),
            Language::Java => Some(tree_sitter_java::LANGUAGE.into()),
            Language::Ruby => Some(tree_sitter_ruby::LANGUAGE.into()),
            Language::C => Some(tree_sitter_c::LANGUAGE.into()),
            Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
            Language::CSharp => Some(tree_sitter_c_sharp::LANGUAGE.into()),
            Language::Unknown => None,
        }
    }
}

impl Default for TreeSitterParserService {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserService for TreeSitterParserService {
    fn parse(&self, source: &str, path: &str, lang: Language) -> ParsedFile {
        let Some(grammar) = Self::grammar_for(lang, path) else {
            return ParsedFile::empty();
        };

        let mut parser = Parser::new();
        if parser.set_language(&grammar).is_err() {
            debug!("Failed to load grammar for {:?}", lang);
            return ParsedFile::empty();
        }

        let Some(tree) = parser.parse(source, None) else {
            debug!("Tree-sitter returned no tree for {}", path);
            return ParsedFile::empty();
        };

        let root = tree.root_node();
        match lang {
            Language::TypeScript => typescript::extract(root, source),
            Language::JavaScript => javascript::extract(root, source),
            Language::Python => python::extract(root, source),
            Language::Go => go::extract(root, source),
            Language::Rust => rust::extract(root, source),
            Language::Php => php::extract(root, source),
            Language::Java => java::extract(root, source),
            Language::Ruby => ruby::extract(root, source),
            Language::C => c::extract(root, source),
            Language::Cpp => cpp::extract(root, source),
            Language::CSharp => csharp::extract(root, source),
            Language::Unknown => ParsedFile::empty(),
        }
    }

    fn supports(&self, lang: Language) -> bool {
        lang.is_known()
    }
}

// ── Helpers shared by the language adapters ──────────────────────────

/// Node text, or empty on a byte-range mishap.
pub(crate) fn text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Strip surrounding quotes or angle brackets from a module specifier.
pub(crate) fn strip_delimiters(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.len() < 2 {
        return trimmed.to_string();
    }
    if (trimmed.starts_with('"') && trimmed.ends_with('"'))
        || (trimmed.starts_with('\'') && trimmed.ends_with('\''))
        || (trimmed.starts_with('<') && trimmed.ends_with('>'))
        || (trimmed.starts_with('`') && trimmed.ends_with('`'))
    {
        return trimmed[1..trimmed.len() - 1].to_string();
    }
    trimmed.to_string()
}

/// Builds a symbol at the node's position with a first-line signature.
pub(crate) fn symbol_at(
    kind: SymbolKind,
    name: impl Into<String>,
    node: Node<'_>,
    source: &str,
) -> ParsedSymbol {
    let mut sym = ParsedSymbol::new(kind, name);
    let start = node.start_position();
    let end = node.end_position();
    sym.start_line = start.row as u32 + 1;
    sym.start_col = start.column as u32 + 1;
    sym.end_line = end.row as u32 + 1;
    sym.end_col = (end.column as u32).max(1);
    sym.signature = signature_of(node, source);
    sym
}

/// The declaration's first line, capped at 200 characters. Display only.
pub(crate) fn signature_of(node: Node<'_>, source: &str) -> Option<String> {
    let line = text(node, source).lines().next()?.trim_end();
    if line.is_empty() {
        return None;
    }
    Some(line.chars().take(200).collect())
}

/// Generic-argument stripping: `Base<T>` → `Base`.
pub(crate) fn strip_type_args(name: &str) -> String {
    match name.find('<') {
        Some(idx) => name[..idx].trim_end().to_string(),
        None => name.trim().to_string(),
    }
}

/// Iterates all children (named and anonymous) of a node.
pub(crate) fn children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    (0..node.child_count() as u32).filter_map(move |i| node.child(i))
}

/// Iterates named children of a node.
pub(crate) fn named_children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    (0..node.named_child_count() as u32).filter_map(move |i| node.named_child(i))
}

/// True when any child token matches `kind` exactly.
pub(crate) fn has_child_kind(node: Node<'_>, kind: &str) -> bool {
    children(node).any(|c| c.kind() == kind)
}
