use serde::{Deserialize, Serialize};

/// The closed set of symbol kinds the language adapters may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    Type,
    Variable,
    Enum,
    Method,
    Property,
    Struct,
    Trait,
    Module,
    Namespace,
    Constant,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Type => "type",
            SymbolKind::Variable => "variable",
            SymbolKind::Enum => "enum",
            SymbolKind::Method => "method",
            SymbolKind::Property => "property",
            SymbolKind::Struct => "struct",
            SymbolKind::Trait => "trait",
            SymbolKind::Module => "module",
            SymbolKind::Namespace => "namespace",
            SymbolKind::Constant => "constant",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "function" => SymbolKind::Function,
            "class" => SymbolKind::Class,
            "interface" => SymbolKind::Interface,
            "type" => SymbolKind::Type,
            "enum" => SymbolKind::Enum,
            "method" => SymbolKind::Method,
            "property" => SymbolKind::Property,
            "struct" => SymbolKind::Struct,
            "trait" => SymbolKind::Trait,
            "module" => SymbolKind::Module,
            "namespace" => SymbolKind::Namespace,
            "constant" => SymbolKind::Constant,
            _ => SymbolKind::Variable,
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A declaration extracted from one file. Positions are 1-based, endpoints
/// inclusive. `fq_name` is `"<file_path>:<name>"` and stays stable across
/// re-indexings of the same declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub id: i64,
    pub repo_id: i64,
    pub file_id: i64,
    pub kind: SymbolKind,
    pub name: String,
    pub fq_name: String,
    pub signature: Option<String>,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Symbol {
    /// The text indexed for this symbol in the search index.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.name, self.fq_name)
    }
}
