use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::application::{
    EdgeRepository, FileRepository, FileToWrite, ImportLink, IndexWriter, ParserService,
    RepoRepository, SymbolRepository,
};
use crate::connector::walker::Walker;
use crate::domain::services::import_resolver;
use crate::domain::{
    compute_sha256, DiscoveredFile, DomainError, ImportEdgeMeta, IndexMode, IndexSummary,
    SeenFile,
};

/// Files written per store transaction.
const BATCH_SIZE: usize = 50;

pub struct IndexRepositoryUseCase {
    repos: Arc<dyn RepoRepository>,
    files: Arc<dyn FileRepository>,
    symbols: Arc<dyn SymbolRepository>,
    edges: Arc<dyn EdgeRepository>,
    writer: Arc<dyn IndexWriter>,
    parser: Arc<dyn ParserService>,
}

impl IndexRepositoryUseCase {
    pub fn new(
        repos: Arc<dyn RepoRepository>,
        files: Arc<dyn FileRepository>,
        symbols: Arc<dyn SymbolRepository>,
        edges: Arc<dyn EdgeRepository>,
        writer: Arc<dyn IndexWriter>,
        parser: Arc<dyn ParserService>,
    ) -> Self {
        Self {
            repos,
            files,
            symbols,
            edges,
            writer,
            parser,
        }
    }

    /// Runs an index pass. `mode` auto-detects when absent: incremental if
    /// the repo is already known, full otherwise. `level` is recorded but
    /// changes nothing between 0 and 1.
    pub async fn execute(
        &self,
        root: &Path,
        mode: Option<IndexMode>,
        level: u8,
    ) -> Result<IndexSummary, DomainError> {
        let root = root
            .canonicalize()
            .map_err(|e| DomainError::invalid_input(format!("Invalid path: {}", e)))?;
        if !root.is_dir() {
            return Err(DomainError::invalid_input(format!(
                "Not a directory: {}",
                root.display()
            )));
        }
        let root_str = root.to_string_lossy().to_string();
        let level = level.min(1);

        let existing = self.repos.find_by_path(&root_str).await?;
        let mode = mode.unwrap_or(match existing {
            Some(_) => IndexMode::Incremental,
            None => IndexMode::Full,
        });

        match mode {
            IndexMode::Full => self.full(&root, &root_str, level).await,
            IndexMode::Incremental => self.incremental(&root, &root_str, level).await,
        }
    }

    async fn full(
        &self,
        root: &Path,
        root_str: &str,
        level: u8,
    ) -> Result<IndexSummary, DomainError> {
        let start_time = Instant::now();
        let repo = self.repos.upsert(root_str).await?;
        info!("Full indexing repository: {}", root_str);

        let discovered = Walker::discover(root);
        let mut warnings = Vec::new();
        let prepared = self.read_and_parse(&discovered, &mut warnings).await;
        let skipped = discovered.len() as u64 - prepared.len() as u64;

        self.write_batches(repo.id, &prepared).await?;
        let import_count = self.link_imports(repo.id, &prepared).await?;
        debug!("Linked {} imports", import_count);

        self.summary(
            repo.id,
            IndexMode::Full,
            level,
            prepared.len() as u64,
            skipped,
            0,
            warnings,
            start_time,
        )
        .await
    }

    async fn incremental(
        &self,
        root: &Path,
        root_str: &str,
        level: u8,
    ) -> Result<IndexSummary, DomainError> {
        let start_time = Instant::now();
        self.repos
            .find_by_path(root_str)
            .await?
            .ok_or_else(|| DomainError::not_indexed(root_str.to_string()))?;
        // Re-upserting bumps updated_at, which status reports as the last
        // index time.
        let repo = self.repos.upsert(root_str).await?;
        info!("Incremental indexing repository: {}", root_str);

        // Hash everything up front; all reads happen before any transaction.
        let discovered = Walker::discover(root);
        let mut warnings = Vec::new();
        let mut seen = Vec::new();
        let mut contents: Vec<(usize, String)> = Vec::new();
        let mut unreadable: HashSet<String> = HashSet::new();

        for (idx, file) in discovered.iter().enumerate() {
            match tokio::fs::read_to_string(&file.absolute_path).await {
                Ok(content) => {
                    seen.push(SeenFile {
                        path: file.path.clone(),
                        sha256: compute_sha256(&content),
                        mtime: file.mtime,
                    });
                    contents.push((idx, content));
                }
                Err(e) => {
                    warn!("Failed to read file {}: {}", file.path, e);
                    warnings.push(format!("Failed to read {}: {}", file.path, e));
                    unreadable.insert(file.path.clone());
                }
            }
        }

        let mut changes = self.files.find_changed(repo.id, &seen).await?;
        // An unreadable file is a skip, not a deletion.
        changes.deleted.retain(|f| !unreadable.contains(&f.path));
        info!(
            "Detected changes: {} new, {} changed, {} deleted",
            changes.new.len(),
            changes.changed.len(),
            changes.deleted.len()
        );

        let to_process: HashSet<&String> =
            changes.new.iter().chain(changes.changed.iter()).collect();
        let prepared: Vec<FileToWrite> = contents
            .into_iter()
            .filter(|(idx, _)| to_process.contains(&discovered[*idx].path))
            .map(|(idx, content)| self.prepare(&discovered[idx], content))
            .collect();

        self.write_batches(repo.id, &prepared).await?;

        let deleted = self.writer.delete_files(repo.id, &changes.deleted).await?;

        // Imports are re-resolved only for the new and changed files; their
        // old edges went away with their old state.
        let import_count = self.link_imports(repo.id, &prepared).await?;
        debug!("Re-linked {} imports", import_count);

        self.summary(
            repo.id,
            IndexMode::Incremental,
            level,
            prepared.len() as u64,
            unreadable.len() as u64,
            deleted,
            warnings,
            start_time,
        )
        .await
    }

    /// Reads and parses every discovered file, outside any transaction.
    /// Read failures warn, count as skipped, and drop the file.
    async fn read_and_parse(
        &self,
        discovered: &[DiscoveredFile],
        warnings: &mut Vec<String>,
    ) -> Vec<FileToWrite> {
        let progress = ProgressBar::new(discovered.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} {bar:40.green/dim} {pos}/{len} {msg:.dim}")
                .expect("Invalid progress bar template")
                .progress_chars("━━─"),
        );

        let mut prepared = Vec::with_capacity(discovered.len());
        for file in discovered {
            progress.set_message(file.path.clone());
            match tokio::fs::read_to_string(&file.absolute_path).await {
                Ok(content) => prepared.push(self.prepare(file, content)),
                Err(e) => {
                    warn!("Failed to read file {}: {}", file.path, e);
                    warnings.push(format!("Failed to read {}: {}", file.path, e));
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();
        prepared
    }

    fn prepare(&self, file: &DiscoveredFile, content: String) -> FileToWrite {
        let parsed = self.parser.parse(&content, &file.path, file.lang);
        debug!(
            "Parsed {}: {} imports, {} exports, {} symbols",
            file.path,
            parsed.imports.len(),
            parsed.exports.len(),
            parsed.symbols.len()
        );
        FileToWrite {
            path: file.path.clone(),
            lang: file.lang,
            sha256: compute_sha256(&content),
            mtime: file.mtime,
            size_bytes: file.size as i64,
            parsed,
        }
    }

    async fn write_batches(
        &self,
        repo_id: i64,
        prepared: &[FileToWrite],
    ) -> Result<(), DomainError> {
        for chunk in prepared.chunks(BATCH_SIZE) {
            self.writer.write_batch(repo_id, chunk).await?;
        }
        Ok(())
    }

    /// Second pass: every file row exists by now, so resolver lookups can
    /// only miss for genuinely external targets. Unresolved and
    /// self-targeting imports are skipped silently.
    async fn link_imports(
        &self,
        repo_id: i64,
        prepared: &[FileToWrite],
    ) -> Result<u64, DomainError> {
        let known: HashSet<String> = self.files.list_paths(repo_id).await?.into_iter().collect();

        let mut links = Vec::new();
        for file in prepared {
            for import in &file.parsed.imports {
                let Some(dst) = import_resolver::resolve(&import.source, &file.path, &known)
                else {
                    continue;
                };
                if dst == file.path {
                    continue;
                }
                links.push(ImportLink {
                    src_path: file.path.clone(),
                    dst_path: dst,
                    meta: ImportEdgeMeta {
                        names: import.names.clone(),
                        is_type_only: import.is_type_only,
                    },
                });
            }
        }

        self.writer.write_import_edges(repo_id, &links).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn summary(
        &self,
        repo_id: i64,
        mode: IndexMode,
        level: u8,
        files_indexed: u64,
        files_skipped: u64,
        files_deleted: u64,
        warnings: Vec<String>,
        start_time: Instant,
    ) -> Result<IndexSummary, DomainError> {
        let symbol_count = self.symbols.count(repo_id).await?;
        let edge_count = self.edges.count(repo_id).await?;
        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Indexing complete: {} files in {}ms ({} symbols, {} edges)",
            files_indexed, duration_ms, symbol_count, edge_count
        );

        Ok(IndexSummary {
            repo_id,
            mode,
            level,
            files_indexed,
            files_skipped,
            files_deleted,
            symbol_count,
            edge_count,
            duration_ms,
            warnings,
        })
    }
}
