//! Indexing orchestrator: acquire → enumerate → normalize → chunk → embed → append.
//!
//! The pipeline is the only mutator of a [`VectorIndex`]. Per-file and
//! per-source failures are logged and counted without stopping the run; a
//! dimensionality mismatch is a configuration error and aborts it. The
//! index is persisted exactly once, after every source has been processed.

use std::path::{Path, PathBuf};
use std::time::Instant;

use plagiscan_core::{ChunkRecord, IndexConfig, PlagiscanError, Result};
use serde::Serialize;

use crate::chunker::{chunk_text, ChunkerConfig};
use crate::corpus::{enumerate_files, Corpus, CorpusSource};
use crate::embedding::{probe_dimension, Embedder};
use crate::language::Language;
use crate::normalize::normalize;
use crate::store::VectorIndex;

/// Pipeline options.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// Chunking bounds.
    pub chunker: ChunkerConfig,
    /// Draw a progress bar per source on stderr.
    pub show_progress: bool,
}

impl From<&IndexConfig> for IndexOptions {
    fn from(config: &IndexConfig) -> Self {
        Self {
            chunker: ChunkerConfig::from(config),
            show_progress: false,
        }
    }
}

/// Summary of an indexing run.
///
/// # Examples
///
/// ```
/// use plagiscan_index::pipeline::IndexReport;
///
/// let report = IndexReport::default();
/// assert_eq!(report.files_indexed, 0);
/// assert!(report.errors.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    pub sources_indexed: usize,
    pub sources_failed: usize,
    pub files_scanned: usize,
    pub files_indexed: usize,
    /// Blank files, or files with nothing left after normalization.
    pub files_skipped: usize,
    pub files_failed: usize,
    /// Failed files whose embedding collaborator could not be reached.
    pub files_unreachable: usize,
    pub chunks_indexed: usize,
    /// One line per failed source or file.
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

enum FileOutcome {
    Indexed(usize),
    Skipped,
}

/// Builds a [`VectorIndex`] from a [`Corpus`].
pub struct IndexingPipeline<'a, E: Embedder> {
    index: &'a mut VectorIndex,
    embedder: &'a E,
    options: IndexOptions,
}

impl<'a, E: Embedder> IndexingPipeline<'a, E> {
    pub fn new(index: &'a mut VectorIndex, embedder: &'a E, options: IndexOptions) -> Self {
        Self {
            index,
            embedder,
            options,
        }
    }

    /// Index every source in `corpus`, then persist the index.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimension probe fails, if an embedding does
    /// not match the index dimensionality, or if persisting fails. Isolated
    /// source and file failures are reported in [`IndexReport`] instead.
    pub async fn run(
        &mut self,
        corpus: &Corpus,
        vector_path: &Path,
        metadata_path: &Path,
    ) -> Result<IndexReport> {
        let start = Instant::now();
        let mut report = IndexReport::default();

        if self.index.dimension().is_none() {
            let dimension = probe_dimension(self.embedder).await?;
            self.index.set_dimension(dimension)?;
            tracing::info!(dimension, "using embedding dimension");
        }

        for source in &corpus.sources {
            let name = source.name();
            let (root, files) = match materialize(source, corpus) {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(source = %name, error = %e, "skipping source");
                    report.sources_failed += 1;
                    report.errors.push(format!("{name}: {e}"));
                    continue;
                }
            };

            tracing::info!(source = %name, files = files.len(), "indexing source");
            let progress = self.progress_bar(name, files.len() as u64);

            for file in &files {
                report.files_scanned += 1;
                let id = source_file_id(name, &root, file);

                match self.index_file(&id, file).await {
                    Ok(FileOutcome::Indexed(chunks)) => {
                        report.files_indexed += 1;
                        report.chunks_indexed += chunks;
                        tracing::debug!(file = %id, chunks, "indexed file");
                    }
                    Ok(FileOutcome::Skipped) => {
                        report.files_skipped += 1;
                        tracing::debug!(file = %id, "skipped empty file");
                    }
                    Err(e @ PlagiscanError::DimensionMismatch { .. }) => {
                        progress.abandon();
                        return Err(e);
                    }
                    Err(e) => {
                        report.files_failed += 1;
                        let transport = e.is_transport();
                        if transport {
                            report.files_unreachable += 1;
                        }
                        tracing::warn!(file = %id, error = %e, transport, "failed to index file");
                        report.errors.push(format!("{id}: {e}"));
                    }
                }
                progress.inc(1);
            }

            progress.finish_and_clear();
            report.sources_indexed += 1;
        }

        self.index.persist(vector_path, metadata_path)?;

        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        tracing::info!(
            sources = report.sources_indexed,
            files = report.files_indexed,
            chunks = report.chunks_indexed,
            failed = report.files_failed,
            duration_ms = report.duration_ms,
            "indexing finished"
        );
        Ok(report)
    }

    async fn index_file(&mut self, id: &str, path: &Path) -> Result<FileOutcome> {
        let bytes = tokio::fs::read(path).await?;
        let text = String::from_utf8_lossy(&bytes);
        if text.trim().is_empty() {
            return Ok(FileOutcome::Skipped);
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let normalized = normalize(&text, &extension);
        let language = Language::detect(&extension, &text);

        let chunks = chunk_text(&normalized, &self.options.chunker);
        if chunks.is_empty() {
            return Ok(FileOutcome::Skipped);
        }

        // Embed the whole file before touching the index so a failure
        // leaves no partial file behind.
        let mut items = Vec::with_capacity(chunks.len());
        for (sequence_index, text) in chunks.into_iter().enumerate() {
            let vector = self.embedder.embed(&text).await?;
            items.push((
                vector,
                ChunkRecord {
                    source_file: id.to_string(),
                    extension: extension.clone(),
                    detected_language: language.as_str().to_string(),
                    sequence_index,
                    text,
                },
            ));
        }

        let added = self.index.add_batch(items)?;
        Ok(FileOutcome::Indexed(added))
    }

    fn progress_bar(&self, source: &str, len: u64) -> indicatif::ProgressBar {
        if !self.options.show_progress {
            return indicatif::ProgressBar::hidden();
        }
        let pb = indicatif::ProgressBar::new(len);
        if let Ok(style) =
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} [{bar:30}] {pos}/{len} ({elapsed})")
        {
            pb.set_style(style);
        }
        pb.set_message(source.to_string());
        pb
    }
}

fn materialize(source: &CorpusSource, corpus: &Corpus) -> Result<(PathBuf, Vec<PathBuf>)> {
    let root = source.acquire()?;
    let files = enumerate_files(&root, &corpus.extensions, &corpus.exclude_dirs)?;
    Ok((root, files))
}

/// `<source>/<path relative to the source root>` with `/` separators.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use plagiscan_index::pipeline::source_file_id;
///
/// let id = source_file_id("algos", Path::new("/tmp/algos"), Path::new("/tmp/algos/sort/quick.py"));
/// assert_eq!(id, "algos/sort/quick.py");
/// ```
pub fn source_file_id(source: &str, root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("{source}/{}", parts.join("/"))
}
