use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;

use crate::application::{Direction, EdgeRepository, Neighbourhood};
use crate::domain::{DomainError, Edge, EdgeRel, NodeKind};

const EDGE_COLUMNS: &str =
    "id, repo_id, src_type, src_id, rel, dst_type, dst_id, meta_json, weight, created_at";

pub struct SqliteEdgeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEdgeRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub(crate) fn row_to_edge(row: &rusqlite::Row<'_>) -> rusqlite::Result<Edge> {
        Ok(Edge {
            id: row.get(0)?,
            repo_id: row.get(1)?,
            src_type: NodeKind::parse(&row.get::<_, String>(2)?),
            src_id: row.get(3)?,
            rel: EdgeRel::parse(&row.get::<_, String>(4)?),
            dst_type: NodeKind::parse(&row.get::<_, String>(5)?),
            dst_id: row.get(6)?,
            meta_json: row.get(7)?,
            weight: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn query_edges(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Edge>, DomainError> {
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DomainError::storage(format!("Failed to prepare statement: {}", e)))?;

        let rows = stmt
            .query_map(params, Self::row_to_edge)
            .map_err(|e| DomainError::storage(format!("Failed to query edges: {}", e)))?;

        let mut edges = Vec::new();
        for row in rows {
            edges.push(row.map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?);
        }
        Ok(edges)
    }

    fn edges_touching(
        conn: &Connection,
        repo_id: i64,
        node: (NodeKind, i64),
        direction: Direction,
    ) -> Result<Vec<Edge>, DomainError> {
        let (kind, id) = node;
        let mut edges = Vec::new();

        if matches!(direction, Direction::Outgoing | Direction::Both) {
            let sql = format!(
                "SELECT {} FROM edges WHERE repo_id = ?1 AND src_type = ?2 AND src_id = ?3",
                EDGE_COLUMNS
            );
            edges.extend(Self::query_edges(
                conn,
                &sql,
                params![repo_id, kind.as_str(), id],
            )?);
        }
        if matches!(direction, Direction::Incoming | Direction::Both) {
            let sql = format!(
                "SELECT {} FROM edges WHERE repo_id = ?1 AND dst_type = ?2 AND dst_id = ?3",
                EDGE_COLUMNS
            );
            edges.extend(Self::query_edges(
                conn,
                &sql,
                params![repo_id, kind.as_str(), id],
            )?);
        }
        Ok(edges)
    }
}

#[async_trait]
impl EdgeRepository for SqliteEdgeRepository {
    async fn neighbours(
        &self,
        repo_id: i64,
        start: (NodeKind, i64),
        depth: u32,
        direction: Direction,
    ) -> Result<Neighbourhood, DomainError> {
        let conn = self.conn.lock().await;

        let mut visited: HashSet<(NodeKind, i64)> = HashSet::new();
        let mut seen_edges: HashSet<i64> = HashSet::new();
        let mut result = Neighbourhood::default();

        visited.insert(start);
        result.nodes.push(start);

        let mut frontier = vec![start];
        for _ in 0..depth {
            let mut next = Vec::new();
            for node in frontier {
                for edge in Self::edges_touching(&conn, repo_id, node, direction)? {
                    if seen_edges.insert(edge.id) {
                        result.edges.push(edge.clone());
                    }
                    let far = if (edge.src_type, edge.src_id) == node {
                        (edge.dst_type, edge.dst_id)
                    } else {
                        (edge.src_type, edge.src_id)
                    };
                    if visited.insert(far) {
                        result.nodes.push(far);
                        next.push(far);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        Ok(result)
    }

    async fn expansion_edges(&self, repo_id: i64, file_id: i64) -> Result<Vec<Edge>, DomainError> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {} FROM edges \
             WHERE repo_id = ?1 \
               AND rel IN ('IMPORTS', 'REFERENCES') \
               AND ((src_type = 'file' AND src_id = ?2) \
                 OR (src_type = 'symbol' AND src_id IN \
                     (SELECT id FROM symbols WHERE file_id = ?2)))",
            EDGE_COLUMNS
        );
        Self::query_edges(&conn, &sql, params![repo_id, file_id])
    }

    async fn count(&self, repo_id: i64) -> Result<u64, DomainError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM edges WHERE repo_id = ?1",
                params![repo_id],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::storage(format!("Failed to count edges: {}", e)))?;
        Ok(count as u64)
    }
}
