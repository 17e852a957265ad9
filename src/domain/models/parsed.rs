use super::SymbolKind;

/// One import site as written in the source, after delimiter stripping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedImport {
    /// Module specifier as written, quotes stripped (`./models/user`, `fmt`).
    pub source: String,
    /// Local binding names introduced at this site.
    pub names: Vec<String>,
    pub is_default: bool,
    pub is_namespace: bool,
    pub is_type_only: bool,
    pub is_dynamic: bool,
}

impl ParsedImport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    pub fn default_import(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn namespace(mut self) -> Self {
        self.is_namespace = true;
        self
    }

    pub fn type_only(mut self) -> Self {
        self.is_type_only = true;
        self
    }

    pub fn dynamic(mut self) -> Self {
        self.is_dynamic = true;
        self
    }
}

/// One exported name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedExport {
    pub name: String,
    pub is_default: bool,
    pub is_re_export: bool,
    /// Module specifier for re-exports (`export { X } from "./y"`).
    pub source: Option<String>,
}

impl ParsedExport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn default_export(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn re_export(mut self, source: impl Into<String>) -> Self {
        self.is_re_export = true;
        self.source = Some(source.into());
        self
    }
}

/// One declaration. Positions are 1-based with inclusive endpoints; the
/// signature is the declaration's first line, display-only.
#[derive(Debug, Clone)]
pub struct ParsedSymbol {
    pub kind: SymbolKind,
    pub name: String,
    pub signature: Option<String>,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub extends: Option<String>,
    pub implements: Vec<String>,
}

impl ParsedSymbol {
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            signature: None,
            start_line: 1,
            start_col: 1,
            end_line: 1,
            end_col: 1,
            extends: None,
            implements: Vec::new(),
        }
    }
}

/// Uniform adapter output. Any parse failure yields `ParsedFile::empty()`;
/// adapters never error.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub imports: Vec<ParsedImport>,
    pub exports: Vec<ParsedExport>,
    pub symbols: Vec<ParsedSymbol>,
}

impl ParsedFile {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.exports.is_empty() && self.symbols.is_empty()
    }
}
