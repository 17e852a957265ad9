//! End-to-end scenarios for the five tool operations against a small
//! TypeScript fixture service.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use cindex::{
    CandidateDiscovery, ContextBundleUseCase, EdgeRepository, FileRepository, FileSnippetUseCase,
    GraphExpansion, IndexMode, IndexRepositoryUseCase, Ranker, RepoRepository, RepoStatus,
    RepoStatusUseCase, SearchCodeUseCase, SnippetExtractor, SqliteEdgeRepository,
    SqliteFileRepository, SqliteIndexWriter, SqliteRepoRepository, SqliteSearchIndex, SqliteStore,
    SqliteSymbolRepository, SymbolRepository, TreeSitterParserService,
};
use cindex::{NodeKind, RetrievalHints};

struct Stack {
    repos: Arc<SqliteRepoRepository>,
    files: Arc<SqliteFileRepository>,
    symbols: Arc<SqliteSymbolRepository>,
    edges: Arc<SqliteEdgeRepository>,
    index: IndexRepositoryUseCase,
    status: RepoStatusUseCase,
    search: SearchCodeUseCase,
    snippet: FileSnippetUseCase,
    context: ContextBundleUseCase,
}

fn stack() -> Stack {
    let store = SqliteStore::in_memory().unwrap();
    let repos = Arc::new(SqliteRepoRepository::new(store.connection()));
    let files = Arc::new(SqliteFileRepository::new(store.connection()));
    let symbols = Arc::new(SqliteSymbolRepository::new(store.connection()));
    let edges = Arc::new(SqliteEdgeRepository::new(store.connection()));
    let search_index = Arc::new(SqliteSearchIndex::new(store.connection()));
    let writer = Arc::new(SqliteIndexWriter::new(store.connection()));
    let parser = Arc::new(TreeSitterParserService::new());

    let index = IndexRepositoryUseCase::new(
        repos.clone(),
        files.clone(),
        symbols.clone(),
        edges.clone(),
        writer,
        parser,
    );
    let status = RepoStatusUseCase::new(
        repos.clone(),
        files.clone(),
        symbols.clone(),
        edges.clone(),
    );
    let search = SearchCodeUseCase::new(
        repos.clone(),
        files.clone(),
        symbols.clone(),
        search_index.clone(),
    );
    let context = ContextBundleUseCase::new(
        repos.clone(),
        symbols.clone(),
        CandidateDiscovery::new(files.clone(), symbols.clone(), search_index),
        GraphExpansion::new(edges.clone(), symbols.clone()),
        Ranker::new(files.clone(), symbols.clone()),
        SnippetExtractor::new(),
    );

    Stack {
        repos,
        files,
        symbols,
        edges,
        index,
        status,
        search,
        snippet: FileSnippetUseCase::new(),
        context,
    }
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Twelve TypeScript files forming a small auth service.
fn fixture_repo() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(
        root,
        "src/models/user.ts",
        r#"export interface User {
    id: string;
    email: string;
    passwordHash: string;
}

export class UserModel {
    find(id: string): User | undefined {
        return undefined;
    }

    create(email: string): User {
        return { id: "1", email, passwordHash: "" };
    }
}
"#,
    );
    write(
        root,
        "src/models/session.ts",
        r#"import { User } from './user';

export interface Session {
    token: string;
    user: User;
    expiresAt: number;
}
"#,
    );
    write(
        root,
        "src/services/auth.ts",
        r#"import { User, UserModel } from '../models/user';
import { Session } from '../models/session';
import { hashPassword, verifyPassword } from '../utils/crypto';
import { logger } from '../utils/logger';

export class AuthService {
    private users = new UserModel();

    login(email: string, password: string): Session | null {
        const user = this.users.find(email);
        if (!user) {
            logger.warn('unknown user');
            return null;
        }
        if (!verifyPassword(password, user.passwordHash)) {
            return null;
        }
        return { token: 'tok', user, expiresAt: Date.now() + 3600 };
    }

    register(email: string, password: string): User {
        const hash = hashPassword(password);
        logger.info('registered ' + email);
        return this.users.create(email);
    }

    logout(session: Session): void {
        logger.info('logout ' + session.user.email);
    }
}
"#,
    );
    write(
        root,
        "src/services/token.ts",
        r#"import { Session } from '../models/session';

export function issueToken(session: Session): string {
    return session.token;
}

export function revokeToken(token: string): boolean {
    return token.length > 0;
}
"#,
    );
    write(
        root,
        "src/controllers/auth_controller.ts",
        r#"import { AuthService } from '../services/auth';
import { issueToken } from '../services/token';

export class AuthController {
    private service = new AuthService();

    handleLogin(email: string, password: string): string | null {
        const session = this.service.login(email, password);
        return session ? issueToken(session) : null;
    }
}
"#,
    );
    write(
        root,
        "src/routes/auth_routes.ts",
        r#"import { AuthController } from '../controllers/auth_controller';

export const routes = {
    'POST /login': new AuthController(),
};
"#,
    );
    write(
        root,
        "src/utils/crypto.ts",
        r#"export function hashPassword(password: string): string {
    return 'hashed:' + password;
}

export function verifyPassword(password: string, hash: string): boolean {
    return hash === 'hashed:' + password;
}
"#,
    );
    write(
        root,
        "src/utils/logger.ts",
        r#"export const logger = {
    info(message: string): void {},
    warn(message: string): void {},
};
"#,
    );
    write(
        root,
        "src/middleware/authentication.ts",
        r#"import { AuthService } from '../services/auth';

export function authenticationMiddleware(): AuthService {
    return new AuthService();
}
"#,
    );
    write(
        root,
        "src/config.ts",
        r#"export const config = {
    tokenTtlSeconds: 3600,
    maxSessions: 10,
};
"#,
    );
    write(
        root,
        "src/app.ts",
        r#"import { routes } from './routes/auth_routes';
import { config } from './config';

export function createApp() {
    return { routes, config };
}
"#,
    );
    write(
        root,
        "src/index.ts",
        r#"import { createApp } from './app';

createApp();
"#,
    );

    dir
}

#[tokio::test]
async fn s1_status_on_fresh_store_is_not_indexed() {
    let stack = stack();
    let repo = fixture_repo();

    let status = stack.status.execute(repo.path()).await.unwrap();
    assert!(matches!(status, RepoStatus::NotIndexed));
}

#[tokio::test]
async fn s2_full_index_reports_counts() {
    let stack = stack();
    let repo = fixture_repo();

    let summary = stack.index.execute(repo.path(), None, 0).await.unwrap();
    assert_eq!(summary.mode, IndexMode::Full);
    assert!(
        (10..=12).contains(&summary.files_indexed),
        "files_indexed = {}",
        summary.files_indexed
    );
    assert!(
        summary.symbol_count >= 20,
        "symbol_count = {}",
        summary.symbol_count
    );
    assert!(summary.edge_count > 0);
    assert_eq!(summary.files_deleted, 0);
    assert!(summary.warnings.is_empty());
}

#[tokio::test]
async fn s3_imports_edge_auth_to_user() {
    let stack = stack();
    let repo = fixture_repo();
    stack.index.execute(repo.path(), None, 0).await.unwrap();

    let root_str = repo.path().canonicalize().unwrap();
    let repo_row = stack
        .repos
        .find_by_path(&root_str.to_string_lossy())
        .await
        .unwrap()
        .unwrap();

    let auth = stack
        .files
        .find_by_path(repo_row.id, "src/services/auth.ts")
        .await
        .unwrap()
        .unwrap();
    let user = stack
        .files
        .find_by_path(repo_row.id, "src/models/user.ts")
        .await
        .unwrap()
        .unwrap();

    let outgoing = stack.edges.expansion_edges(repo_row.id, auth.id).await.unwrap();
    assert!(
        outgoing
            .iter()
            .any(|e| e.dst_type == NodeKind::File && e.dst_id == user.id),
        "expected IMPORTS edge from auth.ts to user.ts"
    );
}

#[tokio::test]
async fn s4_search_finds_auth_service() {
    let stack = stack();
    let repo = fixture_repo();
    stack.index.execute(repo.path(), None, 0).await.unwrap();

    let results = stack
        .search
        .execute(repo.path(), "AuthService", Some(10))
        .await
        .unwrap();
    assert!(!results.is_empty());
    assert!(results
        .iter()
        .any(|hit| hit.excerpt.to_lowercase().contains("authservice")));
}

#[tokio::test]
async fn s5_snippet_reads_import_lines() {
    let stack = stack();
    let repo = fixture_repo();
    stack.index.execute(repo.path(), None, 0).await.unwrap();

    let snippet = stack
        .snippet
        .execute(repo.path(), "src/services/auth.ts", Some(1), Some(10))
        .await
        .unwrap();
    assert_eq!(snippet.start_line, 1);
    assert_eq!(snippet.end_line, 10);
    assert!(snippet.text.contains("import"));
}

#[tokio::test]
async fn s6_context_bundle_for_auth_task() {
    let stack = stack();
    let repo = fixture_repo();
    stack.index.execute(repo.path(), None, 0).await.unwrap();

    let bundle = stack
        .context
        .execute(
            repo.path(),
            "How does authentication work?",
            Some(5000),
            &RetrievalHints::default(),
        )
        .await
        .unwrap();

    assert!(!bundle.focus.is_empty(), "focus should not be empty");
    assert!(!bundle.snippets.is_empty(), "snippets should not be empty");
    assert!(
        !bundle.subgraph.nodes.is_empty(),
        "subgraph should not be empty"
    );
    assert!(bundle.limits.used_estimate <= 5000);
    assert_eq!(bundle.limits.budget, 5000);
    assert_eq!(bundle.intent, "How does authentication work?");
}

#[tokio::test]
async fn s7_immediate_reindex_is_incremental_noop() {
    let stack = stack();
    let repo = fixture_repo();
    stack.index.execute(repo.path(), None, 0).await.unwrap();

    let summary = stack.index.execute(repo.path(), None, 0).await.unwrap();
    assert_eq!(summary.mode, IndexMode::Incremental);
    assert_eq!(summary.files_indexed, 0);
    assert_eq!(summary.files_skipped, 0);
    assert_eq!(summary.files_deleted, 0);
}

#[tokio::test]
async fn idempotent_reindex_keeps_row_counts() {
    let stack = stack();
    let repo = fixture_repo();
    let first = stack.index.execute(repo.path(), None, 0).await.unwrap();

    let root_str = repo.path().canonicalize().unwrap();
    let repo_row = stack
        .repos
        .find_by_path(&root_str.to_string_lossy())
        .await
        .unwrap()
        .unwrap();
    let files_before = stack.files.count(repo_row.id).await.unwrap();

    let second = stack.index.execute(repo.path(), None, 0).await.unwrap();
    assert_eq!(second.symbol_count, first.symbol_count);
    assert_eq!(second.edge_count, first.edge_count);
    assert_eq!(stack.files.count(repo_row.id).await.unwrap(), files_before);
}

#[tokio::test]
async fn change_detection_on_content_edit() {
    let stack = stack();
    let repo = fixture_repo();
    stack.index.execute(repo.path(), None, 0).await.unwrap();

    write(
        repo.path(),
        "src/config.ts",
        "export const config = { tokenTtlSeconds: 7200 };\n",
    );

    let summary = stack.index.execute(repo.path(), None, 0).await.unwrap();
    assert_eq!(summary.mode, IndexMode::Incremental);
    assert_eq!(summary.files_indexed, 1);
    assert_eq!(summary.files_deleted, 0);
}

#[tokio::test]
async fn change_detection_on_mtime_only() {
    let stack = stack();
    let repo = fixture_repo();
    stack.index.execute(repo.path(), None, 0).await.unwrap();

    let target = repo.path().join("src/config.ts");
    let file = fs::File::options().write(true).open(&target).unwrap();
    file.set_modified(std::time::SystemTime::now() + std::time::Duration::from_secs(30))
        .unwrap();
    drop(file);

    let summary = stack.index.execute(repo.path(), None, 0).await.unwrap();
    assert_eq!(summary.files_indexed, 1);
    assert_eq!(summary.files_deleted, 0);
}

#[tokio::test]
async fn change_detection_on_rename() {
    let stack = stack();
    let repo = fixture_repo();
    stack.index.execute(repo.path(), None, 0).await.unwrap();

    fs::rename(
        repo.path().join("src/utils/crypto.ts"),
        repo.path().join("src/utils/crypto2.ts"),
    )
    .unwrap();

    let summary = stack.index.execute(repo.path(), None, 0).await.unwrap();
    assert_eq!(summary.files_indexed, 1, "one new file");
    assert_eq!(summary.files_deleted, 1, "one deleted file");
}

#[tokio::test]
async fn deleted_file_cascades_symbols() {
    let stack = stack();
    let repo = fixture_repo();
    stack.index.execute(repo.path(), None, 0).await.unwrap();

    let root_str = repo.path().canonicalize().unwrap();
    let repo_row = stack
        .repos
        .find_by_path(&root_str.to_string_lossy())
        .await
        .unwrap()
        .unwrap();
    assert!(!stack
        .symbols
        .find_by_name(repo_row.id, "AuthService")
        .await
        .unwrap()
        .is_empty());

    fs::remove_file(repo.path().join("src/services/auth.ts")).unwrap();
    stack.index.execute(repo.path(), None, 0).await.unwrap();

    assert!(stack
        .symbols
        .find_by_name(repo_row.id, "AuthService")
        .await
        .unwrap()
        .is_empty());
    assert!(stack
        .files
        .find_by_path(repo_row.id, "src/services/auth.ts")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn snippet_refuses_path_traversal() {
    let stack = stack();
    let repo = fixture_repo();

    let err = stack
        .snippet
        .execute(repo.path(), "../../etc/passwd", None, None)
        .await
        .unwrap_err();
    assert!(err.is_invalid_input() || err.is_not_found());

    let err = stack
        .snippet
        .execute(repo.path(), "/etc/passwd", None, None)
        .await
        .unwrap_err();
    assert!(err.is_invalid_input() || err.is_not_found());
}

#[tokio::test]
async fn context_get_on_unindexed_repo_suggests_indexing() {
    let stack = stack();
    let repo = fixture_repo();

    let err = stack
        .context
        .execute(repo.path(), "anything", None, &RetrievalHints::default())
        .await
        .unwrap_err();
    assert!(err.is_not_indexed());
    assert_eq!(err.suggestion(), Some("repo_index"));
}

#[tokio::test]
async fn incremental_index_on_unknown_repo_fails_recoverably() {
    let stack = stack();
    let repo = fixture_repo();

    let err = stack
        .index
        .execute(repo.path(), Some(IndexMode::Incremental), 0)
        .await
        .unwrap_err();
    assert!(err.is_not_indexed());
}

#[tokio::test]
async fn hostile_search_input_returns_results_not_errors() {
    let stack = stack();
    let repo = fixture_repo();
    stack.index.execute(repo.path(), None, 0).await.unwrap();

    for query in [
        "\"unbalanced",
        "a AND (b OR",
        "auth* NEAR token^2",
        "{}<>|@#\\",
    ] {
        stack
            .search
            .execute(repo.path(), query, Some(10))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn hint_paths_drive_candidates() {
    let stack = stack();
    let repo = fixture_repo();
    stack.index.execute(repo.path(), None, 0).await.unwrap();

    let hints = RetrievalHints {
        paths: Some(vec!["src/utils/crypto.ts".to_string()]),
        symbols: None,
        lang: None,
    };
    let bundle = stack
        .context
        .execute(repo.path(), "password hashing", None, &hints)
        .await
        .unwrap();

    let hinted = bundle
        .focus
        .iter()
        .find(|f| f.path == "src/utils/crypto.ts")
        .expect("hinted file should be in focus");
    assert!(hinted.reason.contains("hint:path"));
}

#[tokio::test]
async fn level_is_recorded_but_inert() {
    let stack1 = stack();
    let repo = fixture_repo();

    let l0 = stack1.index.execute(repo.path(), None, 0).await.unwrap();
    assert_eq!(l0.level, 0);

    let stack2 = stack();
    let l1 = stack2
        .index
        .execute(repo.path(), Some(IndexMode::Full), 1)
        .await
        .unwrap();
    assert_eq!(l1.level, 1);
    assert_eq!(l1.symbol_count, l0.symbol_count);
    assert_eq!(l1.edge_count, l0.edge_count);
}
