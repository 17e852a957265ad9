use serde::{Deserialize, Serialize};

/// Endpoint kind tag for the single heterogeneous edges relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Symbol,
    Module,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Symbol => "symbol",
            NodeKind::Module => "module",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "symbol" => NodeKind::Symbol,
            "module" => NodeKind::Module,
            _ => NodeKind::File,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeRel {
    #[serde(rename = "IMPORTS")]
    Imports,
    #[serde(rename = "EXPORTS")]
    Exports,
    #[serde(rename = "DEFINES")]
    Defines,
    #[serde(rename = "REFERENCES")]
    References,
    #[serde(rename = "EXTENDS")]
    Extends,
    #[serde(rename = "IMPLEMENTS")]
    Implements,
    #[serde(rename = "TESTS")]
    Tests,
}

impl EdgeRel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeRel::Imports => "IMPORTS",
            EdgeRel::Exports => "EXPORTS",
            EdgeRel::Defines => "DEFINES",
            EdgeRel::References => "REFERENCES",
            EdgeRel::Extends => "EXTENDS",
            EdgeRel::Implements => "IMPLEMENTS",
            EdgeRel::Tests => "TESTS",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "IMPORTS" => EdgeRel::Imports,
            "EXPORTS" => EdgeRel::Exports,
            "REFERENCES" => EdgeRel::References,
            "EXTENDS" => EdgeRel::Extends,
            "IMPLEMENTS" => EdgeRel::Implements,
            "TESTS" => EdgeRel::Tests,
            _ => EdgeRel::Defines,
        }
    }

    /// Per-relation edge weight.
    pub fn weight(&self) -> f64 {
        match self {
            EdgeRel::Defines => 1.0,
            EdgeRel::Imports => 1.0,
            EdgeRel::Exports => 0.8,
            EdgeRel::Extends => 1.0,
            EdgeRel::Implements => 0.8,
            _ => 1.0,
        }
    }
}

impl std::fmt::Display for EdgeRel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed graph edge. Edges are never mutated; re-indexing a file deletes
/// and re-creates every edge it sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: i64,
    pub repo_id: i64,
    pub src_type: NodeKind,
    pub src_id: i64,
    pub rel: EdgeRel,
    pub dst_type: NodeKind,
    pub dst_id: i64,
    pub meta_json: Option<String>,
    pub weight: f64,
    pub created_at: i64,
}

/// `meta_json` payload carried on IMPORTS edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportEdgeMeta {
    pub names: Vec<String>,
    #[serde(rename = "isTypeOnly")]
    pub is_type_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_rel_roundtrip() {
        let rels = [
            EdgeRel::Imports,
            EdgeRel::Exports,
            EdgeRel::Defines,
            EdgeRel::References,
            EdgeRel::Extends,
            EdgeRel::Implements,
            EdgeRel::Tests,
        ];
        for rel in rels {
            assert_eq!(EdgeRel::parse(rel.as_str()), rel);
        }
    }

    #[test]
    fn test_edge_weights() {
        assert_eq!(EdgeRel::Defines.weight(), 1.0);
        assert_eq!(EdgeRel::Imports.weight(), 1.0);
        assert_eq!(EdgeRel::Exports.weight(), 0.8);
        assert_eq!(EdgeRel::Extends.weight(), 1.0);
        assert_eq!(EdgeRel::Implements.weight(), 0.8);
    }

    #[test]
    fn test_import_meta_serialization() {
        let meta = ImportEdgeMeta {
            names: vec!["User".into()],
            is_type_only: true,
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"isTypeOnly\":true"));
        assert!(json.contains("\"names\":[\"User\"]"));
    }
}
