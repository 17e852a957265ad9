//! SQLite persistence: the store itself plus one adapter per port.

mod edge_repository;
mod file_repository;
mod index_writer;
mod repo_repository;
mod search_index;
mod sqlite;
mod symbol_repository;

pub use edge_repository::*;
pub use file_repository::*;
pub use index_writer::*;
pub use repo_repository::*;
pub use search_index::*;
pub use sqlite::*;
pub use symbol_repository::*;

#[cfg(test)]
mod tests {
    use crate::application::{
        EdgeRepository, FileRepository, FileToWrite, ImportLink, IndexWriter, RepoRepository,
        SearchIndex, SymbolRepository,
    };
    use crate::domain::{
        compute_sha256, ImportEdgeMeta, Language, ParsedFile, ParsedSymbol, SeenFile, SymbolKind,
    };

    use super::*;

    struct Fixture {
        repos: SqliteRepoRepository,
        files: SqliteFileRepository,
        symbols: SqliteSymbolRepository,
        edges: SqliteEdgeRepository,
        search: SqliteSearchIndex,
        writer: SqliteIndexWriter,
    }

    fn fixture() -> Fixture {
        let store = SqliteStore::in_memory().unwrap();
        Fixture {
            repos: SqliteRepoRepository::new(store.connection()),
            files: SqliteFileRepository::new(store.connection()),
            symbols: SqliteSymbolRepository::new(store.connection()),
            edges: SqliteEdgeRepository::new(store.connection()),
            search: SqliteSearchIndex::new(store.connection()),
            writer: SqliteIndexWriter::new(store.connection()),
        }
    }

    fn file_to_write(path: &str, source: &str, symbols: Vec<ParsedSymbol>) -> FileToWrite {
        FileToWrite {
            path: path.to_string(),
            lang: Language::TypeScript,
            sha256: compute_sha256(source),
            mtime: 100,
            size_bytes: source.len() as i64,
            parsed: ParsedFile {
                imports: Vec::new(),
                exports: Vec::new(),
                symbols,
            },
        }
    }

    #[tokio::test]
    async fn test_upsert_repo_is_stable() {
        let fx = fixture();
        let a = fx.repos.upsert("/tmp/repo").await.unwrap();
        let b = fx.repos.upsert("/tmp/repo").await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.created_at, b.created_at);
    }

    #[tokio::test]
    async fn test_find_changed_buckets() {
        let fx = fixture();
        let repo = fx.repos.upsert("/tmp/repo").await.unwrap();

        fx.writer
            .write_batch(repo.id, &[file_to_write("src/a.ts", "const a = 1;", vec![])])
            .await
            .unwrap();

        let seen = vec![
            SeenFile {
                path: "src/a.ts".into(),
                sha256: compute_sha256("const a = 2;"),
                mtime: 100,
            },
            SeenFile {
                path: "src/b.ts".into(),
                sha256: compute_sha256("const b = 1;"),
                mtime: 100,
            },
        ];
        let changes = fx.files.find_changed(repo.id, &seen).await.unwrap();
        assert_eq!(changes.new, vec!["src/b.ts".to_string()]);
        assert_eq!(changes.changed, vec!["src/a.ts".to_string()]);
        assert!(changes.deleted.is_empty());

        // Same content, same mtime: nothing changes.
        let seen = vec![SeenFile {
            path: "src/a.ts".into(),
            sha256: compute_sha256("const a = 1;"),
            mtime: 100,
        }];
        let changes = fx.files.find_changed(repo.id, &seen).await.unwrap();
        assert!(changes.new.is_empty());
        assert!(changes.changed.is_empty());
        assert!(changes.deleted.is_empty());

        // mtime alone differing still counts as changed.
        let seen = vec![SeenFile {
            path: "src/a.ts".into(),
            sha256: compute_sha256("const a = 1;"),
            mtime: 200,
        }];
        let changes = fx.files.find_changed(repo.id, &seen).await.unwrap();
        assert_eq!(changes.changed, vec!["src/a.ts".to_string()]);

        // Nothing seen: the stored file shows up as deleted.
        let changes = fx.files.find_changed(repo.id, &[]).await.unwrap();
        assert_eq!(changes.deleted.len(), 1);
        assert_eq!(changes.deleted[0].path, "src/a.ts");
    }

    #[tokio::test]
    async fn test_write_batch_inserts_symbols_and_defines() {
        let fx = fixture();
        let repo = fx.repos.upsert("/tmp/repo").await.unwrap();

        let mut sym = ParsedSymbol::new(SymbolKind::Class, "AuthService");
        sym.start_line = 2;
        sym.end_line = 10;
        fx.writer
            .write_batch(
                repo.id,
                &[file_to_write("src/auth.ts", "class AuthService {}", vec![sym])],
            )
            .await
            .unwrap();

        let found = fx.symbols.find_by_name(repo.id, "AuthService").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].fq_name, "src/auth.ts:AuthService");
        assert_eq!(fx.edges.count(repo.id).await.unwrap(), 1); // DEFINES
    }

    #[tokio::test]
    async fn test_reindex_replaces_symbols_without_duplicates() {
        let fx = fixture();
        let repo = fx.repos.upsert("/tmp/repo").await.unwrap();

        let write = |name: &str| {
            vec![file_to_write(
                "src/auth.ts",
                "class X {}",
                vec![ParsedSymbol::new(SymbolKind::Class, name)],
            )]
        };
        fx.writer.write_batch(repo.id, &write("Old")).await.unwrap();
        fx.writer.write_batch(repo.id, &write("New")).await.unwrap();

        assert!(fx
            .symbols
            .find_by_name(repo.id, "Old")
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            fx.symbols.find_by_name(repo.id, "New").await.unwrap().len(),
            1
        );
        assert_eq!(fx.symbols.count(repo.id).await.unwrap(), 1);
        assert_eq!(fx.edges.count(repo.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_import_edges_skip_self_and_unknown() {
        let fx = fixture();
        let repo = fx.repos.upsert("/tmp/repo").await.unwrap();

        fx.writer
            .write_batch(
                repo.id,
                &[
                    file_to_write("src/a.ts", "import './b';", vec![]),
                    file_to_write("src/b.ts", "export const b = 1;", vec![]),
                ],
            )
            .await
            .unwrap();

        let meta = ImportEdgeMeta {
            names: vec!["b".into()],
            is_type_only: false,
        };
        let written = fx
            .writer
            .write_import_edges(
                repo.id,
                &[
                    ImportLink {
                        src_path: "src/a.ts".into(),
                        dst_path: "src/b.ts".into(),
                        meta: meta.clone(),
                    },
                    ImportLink {
                        src_path: "src/a.ts".into(),
                        dst_path: "src/a.ts".into(),
                        meta: meta.clone(),
                    },
                    ImportLink {
                        src_path: "src/a.ts".into(),
                        dst_path: "src/missing.ts".into(),
                        meta,
                    },
                ],
            )
            .await
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(fx.edges.count(repo.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_files_cascades_edges_and_search() {
        let fx = fixture();
        let repo = fx.repos.upsert("/tmp/repo").await.unwrap();

        fx.writer
            .write_batch(
                repo.id,
                &[
                    file_to_write(
                        "src/a.ts",
                        "import './b';",
                        vec![ParsedSymbol::new(SymbolKind::Function, "run")],
                    ),
                    file_to_write(
                        "src/b.ts",
                        "export const b = 1;",
                        vec![ParsedSymbol::new(SymbolKind::Constant, "b")],
                    ),
                ],
            )
            .await
            .unwrap();
        fx.writer
            .write_import_edges(
                repo.id,
                &[ImportLink {
                    src_path: "src/a.ts".into(),
                    dst_path: "src/b.ts".into(),
                    meta: ImportEdgeMeta {
                        names: vec!["b".into()],
                        is_type_only: false,
                    },
                }],
            )
            .await
            .unwrap();

        let target = fx
            .files
            .find_by_path(repo.id, "src/b.ts")
            .await
            .unwrap()
            .unwrap();
        fx.writer.delete_files(repo.id, &[target]).await.unwrap();

        assert!(fx
            .files
            .find_by_path(repo.id, "src/b.ts")
            .await
            .unwrap()
            .is_none());
        assert!(fx.symbols.find_by_name(repo.id, "b").await.unwrap().is_empty());
        // The IMPORTS edge into the deleted file and its DEFINES are gone;
        // src/a.ts keeps its own DEFINES edge.
        assert_eq!(fx.edges.count(repo.id).await.unwrap(), 1);
        assert!(fx.search.search(repo.id, "b.ts", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_neighbours_bfs_visits_over_defines() {
        let fx = fixture();
        let repo = fx.repos.upsert("/tmp/repo").await.unwrap();

        fx.writer
            .write_batch(
                repo.id,
                &[file_to_write(
                    "src/a.ts",
                    "export function run() {}",
                    vec![ParsedSymbol::new(SymbolKind::Function, "run")],
                )],
            )
            .await
            .unwrap();

        let file = fx
            .files
            .find_by_path(repo.id, "src/a.ts")
            .await
            .unwrap()
            .unwrap();

        use crate::application::{Direction, EdgeRepository};
        use crate::domain::NodeKind;
        let hood = fx
            .edges
            .neighbours(repo.id, (NodeKind::File, file.id), 1, Direction::Outgoing)
            .await
            .unwrap();
        assert_eq!(hood.edges.len(), 1);
        assert!(hood.nodes.iter().any(|(kind, _)| *kind == NodeKind::Symbol));

        // Zero depth visits nothing beyond the start node.
        let hood = fx
            .edges
            .neighbours(repo.id, (NodeKind::File, file.id), 0, Direction::Both)
            .await
            .unwrap();
        assert_eq!(hood.nodes.len(), 1);
        assert!(hood.edges.is_empty());
    }

    #[tokio::test]
    async fn test_search_finds_symbol_rows() {
        let fx = fixture();
        let repo = fx.repos.upsert("/tmp/repo").await.unwrap();

        fx.writer
            .write_batch(
                repo.id,
                &[file_to_write(
                    "src/auth.ts",
                    "class AuthService {}",
                    vec![ParsedSymbol::new(SymbolKind::Class, "AuthService")],
                )],
            )
            .await
            .unwrap();

        let hits = fx.search.search(repo.id, "AuthService", 10).await.unwrap();
        assert!(!hits.is_empty());
        assert!(hits[0].text.contains("AuthService"));

        // Hostile input must come back as a (possibly empty) result set.
        fx.search
            .search(repo.id, "\"unbalanced (NEAR *", 10)
            .await
            .unwrap();
    }
}
