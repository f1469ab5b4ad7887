//! Exact nearest-neighbor index over chunk embeddings.
//!
//! Vectors and chunk metadata live in memory as parallel arrays: the vector
//! at position `i` and the record at position `i` always describe the same
//! chunk. On disk they are two artifacts, a SQLite database of
//! little-endian `f32` blobs keyed by position and a JSON array of
//! [`ChunkRecord`]s. The index is append-only; rebuilding means writing a
//! new pair of artifacts.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use plagiscan_core::{ChunkRecord, PlagiscanError, Result};
use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};

/// One neighbor returned by [`VectorIndex::search`].
///
/// # Examples
///
/// ```
/// use plagiscan_core::ChunkRecord;
/// use plagiscan_index::store::SearchHit;
///
/// let hit = SearchHit {
///     position: 0,
///     distance: 0.0,
///     record: ChunkRecord {
///         source_file: "algos/sort.py".into(),
///         extension: "py".into(),
///         detected_language: "python".into(),
///         sequence_index: 0,
///         text: "def sort(xs): return sorted(xs)".into(),
///     },
/// };
/// assert_eq!(hit.record.source_file, "algos/sort.py");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Position of the chunk in the index.
    pub position: usize,
    /// Squared Euclidean distance from the query.
    pub distance: f32,
    /// Metadata of the matched chunk.
    pub record: ChunkRecord,
}

/// Index statistics.
///
/// # Examples
///
/// ```
/// use plagiscan_index::store::IndexStats;
///
/// let stats = IndexStats {
///     total_chunks: 100,
///     total_files: 10,
///     dimension: Some(768),
/// };
/// assert_eq!(stats.total_chunks, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Number of indexed chunks.
    pub total_chunks: usize,
    /// Number of distinct source files.
    pub total_files: usize,
    /// Embedding dimensionality, once established.
    pub dimension: Option<usize>,
}

/// In-memory vector index with parallel chunk metadata.
///
/// # Examples
///
/// ```
/// use plagiscan_core::ChunkRecord;
/// use plagiscan_index::store::VectorIndex;
///
/// let mut index = VectorIndex::new(2);
/// let record = |name: &str| ChunkRecord {
///     source_file: name.into(),
///     extension: "c".into(),
///     detected_language: "c".into(),
///     sequence_index: 0,
///     text: String::new(),
/// };
/// index.add(vec![0.0, 0.0], record("a.c")).unwrap();
/// index.add(vec![3.0, 4.0], record("b.c")).unwrap();
///
/// let hits = index.search(&[3.0, 3.0], 5).unwrap();
/// assert_eq!(hits[0].record.source_file, "b.c");
/// assert_eq!(hits[0].distance, 1.0);
/// assert_eq!(hits.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    dimension: Option<usize>,
    vectors: Vec<Vec<f32>>,
    records: Vec<ChunkRecord>,
}

impl VectorIndex {
    /// An empty index whose dimensionality is not yet known.
    pub fn empty() -> Self {
        Self::default()
    }

    /// An empty index fixed to `dimension`.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            ..Self::default()
        }
    }

    /// Load a persisted index.
    ///
    /// The database is opened read-only; only [`VectorIndex::persist`] writes.
    /// Neither artifact present is a cold start and yields [`VectorIndex::empty`].
    /// If the two artifacts disagree in length, both are truncated to the
    /// shorter one and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::CorruptIndex`] if only one artifact exists or
    /// either cannot be decoded, [`PlagiscanError::DimensionMismatch`] if a
    /// stored vector disagrees with the recorded dimension, and
    /// [`PlagiscanError::Database`] on SQLite failures.
    ///
    /// # Examples
    ///
    /// ```
    /// use plagiscan_index::store::VectorIndex;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let index = VectorIndex::open(
    ///     &dir.path().join("index.db"),
    ///     &dir.path().join("metadata.json"),
    /// )
    /// .unwrap();
    /// assert!(index.is_empty());
    /// assert_eq!(index.dimension(), None);
    /// ```
    pub fn open(vector_path: &Path, metadata_path: &Path) -> Result<Self> {
        match (vector_path.exists(), metadata_path.exists()) {
            (false, false) => return Ok(Self::empty()),
            (true, false) => {
                return Err(PlagiscanError::CorruptIndex(format!(
                    "vector store {} exists but metadata {} is missing",
                    vector_path.display(),
                    metadata_path.display()
                )))
            }
            (false, true) => {
                return Err(PlagiscanError::CorruptIndex(format!(
                    "metadata {} exists but vector store {} is missing",
                    metadata_path.display(),
                    vector_path.display()
                )))
            }
            (true, true) => {}
        }

        let conn = Connection::open_with_flags(vector_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| PlagiscanError::Database(format!("failed to open database: {e}")))?;
        let recorded = get_meta(&conn, "dimension")?
            .map(|v| {
                v.parse::<usize>().map_err(|_| {
                    PlagiscanError::CorruptIndex(format!("invalid dimension metadata: '{v}'"))
                })
            })
            .transpose()?;
        let mut vectors = load_vectors(&conn)?;

        let content = std::fs::read_to_string(metadata_path)?;
        let mut records: Vec<ChunkRecord> = serde_json::from_str(&content).map_err(|e| {
            PlagiscanError::CorruptIndex(format!(
                "failed to parse metadata {}: {e}",
                metadata_path.display()
            ))
        })?;

        if vectors.len() != records.len() {
            let common = vectors.len().min(records.len());
            tracing::warn!(
                vectors = vectors.len(),
                records = records.len(),
                kept = common,
                "index artifacts disagree in length, truncating to common prefix"
            );
            vectors.truncate(common);
            records.truncate(common);
        }

        let dimension = recorded.or_else(|| vectors.first().map(Vec::len));
        if let Some(expected) = dimension {
            if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
                return Err(PlagiscanError::DimensionMismatch {
                    expected,
                    actual: bad.len(),
                });
            }
        }

        tracing::debug!(
            chunks = vectors.len(),
            dimension = ?dimension,
            path = %vector_path.display(),
            "loaded vector index"
        );

        Ok(Self {
            dimension,
            vectors,
            records,
        })
    }

    /// Dimensionality, once established.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Fix the dimensionality of an index that has none yet.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::DimensionMismatch`] if a different
    /// dimensionality is already established.
    pub fn set_dimension(&mut self, dimension: usize) -> Result<()> {
        match self.dimension {
            None => {
                self.dimension = Some(dimension);
                Ok(())
            }
            Some(expected) if expected == dimension => Ok(()),
            Some(expected) => Err(PlagiscanError::DimensionMismatch {
                expected,
                actual: dimension,
            }),
        }
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Chunk metadata in position order.
    pub fn records(&self) -> &[ChunkRecord] {
        &self.records
    }

    /// Stored vector at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        self.vectors.get(position).map(Vec::as_slice)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        let expected = self.dimension.ok_or_else(|| {
            PlagiscanError::Config("index dimension has not been established".into())
        })?;
        if vector.len() != expected {
            return Err(PlagiscanError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Append one chunk.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::DimensionMismatch`] if `vector` has the wrong
    /// length, or [`PlagiscanError::Config`] if no dimensionality has been
    /// established. Nothing is appended on error.
    pub fn add(&mut self, vector: Vec<f32>, record: ChunkRecord) -> Result<()> {
        self.check_dimension(&vector)?;
        self.vectors.push(vector);
        self.records.push(record);
        Ok(())
    }

    /// Append several chunks, all or none.
    ///
    /// Returns the number of chunks appended.
    ///
    /// # Errors
    ///
    /// Same as [`VectorIndex::add`]; every vector is checked before anything
    /// is appended.
    pub fn add_batch(&mut self, items: Vec<(Vec<f32>, ChunkRecord)>) -> Result<usize> {
        for (vector, _) in &items {
            self.check_dimension(vector)?;
        }
        let count = items.len();
        self.vectors.reserve(count);
        self.records.reserve(count);
        for (vector, record) in items {
            self.vectors.push(vector);
            self.records.push(record);
        }
        Ok(count)
    }

    /// Up to `top_k` nearest chunks by squared Euclidean distance, closest
    /// first, ties broken by position.
    ///
    /// An empty index returns no hits.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::DimensionMismatch`] if `query` has the wrong
    /// length for a non-empty index.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if self.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        self.check_dimension(query)?;

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, v)| (position, squared_l2(query, v)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        Ok(scored
            .into_iter()
            .filter_map(|(position, distance)| {
                self.records.get(position).map(|record| SearchHit {
                    position,
                    distance,
                    record: record.clone(),
                })
            })
            .take(top_k)
            .collect())
    }

    /// Chunk and file totals.
    pub fn stats(&self) -> IndexStats {
        let files: HashSet<&str> = self
            .records
            .iter()
            .map(|r| r.source_file.as_str())
            .collect();
        IndexStats {
            total_chunks: self.records.len(),
            total_files: files.len(),
            dimension: self.dimension,
        }
    }

    /// Write both artifacts.
    ///
    /// The vector store is rewritten in a single transaction, then the
    /// metadata is written to a sibling temporary file and renamed into place.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::Database`] on SQLite failures and
    /// [`PlagiscanError::Io`] on filesystem failures.
    pub fn persist(&self, vector_path: &Path, metadata_path: &Path) -> Result<()> {
        for path in [vector_path, metadata_path] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = open_database(vector_path)?;
        let tx = conn
            .transaction()
            .map_err(|e| PlagiscanError::Database(format!("failed to begin transaction: {e}")))?;
        tx.execute("DELETE FROM vectors", [])
            .map_err(|e| PlagiscanError::Database(format!("failed to clear vectors: {e}")))?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO vectors (position, embedding) VALUES (?1, ?2)")
                .map_err(|e| PlagiscanError::Database(format!("failed to prepare insert: {e}")))?;
            for (position, vector) in self.vectors.iter().enumerate() {
                stmt.execute(params![position as i64, floats_to_bytes(vector)])
                    .map_err(|e| {
                        PlagiscanError::Database(format!(
                            "failed to insert vector {position}: {e}"
                        ))
                    })?;
            }
        }
        match self.dimension {
            Some(dimension) => set_meta(&tx, "dimension", &dimension.to_string())?,
            None => {
                tx.execute("DELETE FROM meta WHERE key = 'dimension'", [])
                    .map_err(|e| PlagiscanError::Database(format!("failed to clear dimension: {e}")))?;
            }
        }
        set_meta(&tx, "persisted_at", &chrono::Utc::now().to_rfc3339())?;
        tx.commit()
            .map_err(|e| PlagiscanError::Database(format!("failed to commit index: {e}")))?;

        let json = serde_json::to_string_pretty(&self.records)?;
        let tmp = tmp_path(metadata_path);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, metadata_path)?;

        tracing::info!(
            chunks = self.records.len(),
            path = %vector_path.display(),
            "persisted vector index"
        );
        Ok(())
    }
}

/// Exclusive writer lock on an index, held for the lifetime of the value.
///
/// The lock is a `<vector_path>.lock` file created with create-new
/// semantics and removed on drop. Readers never take it.
///
/// # Examples
///
/// ```
/// use plagiscan_index::store::IndexLock;
///
/// let dir = tempfile::tempdir().unwrap();
/// let db = dir.path().join("index.db");
/// let lock = IndexLock::acquire(&db).unwrap();
/// assert!(IndexLock::acquire(&db).is_err());
/// drop(lock);
/// assert!(IndexLock::acquire(&db).is_ok());
/// ```
#[derive(Debug)]
pub struct IndexLock {
    path: PathBuf,
}

impl IndexLock {
    /// Take the writer lock for the index stored at `vector_path`.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::IndexLocked`] if another writer holds it.
    pub fn acquire(vector_path: &Path) -> Result<Self> {
        let mut name = OsString::from(vector_path.as_os_str());
        name.push(".lock");
        let path = PathBuf::from(name);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // The pid is informational only.
                let _ = writeln!(file, "{}", std::process::id());
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(PlagiscanError::IndexLocked(path))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .map_err(|e| PlagiscanError::Database(format!("failed to open database: {e}")))?;
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS vectors (
            position INTEGER PRIMARY KEY,
            embedding BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| PlagiscanError::Database(format!("failed to create schema: {e}")))?;
    Ok(conn)
}

fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let result = conn.query_row(
        "SELECT value FROM meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    );

    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(PlagiscanError::Database(format!(
            "failed to get metadata '{key}': {e}"
        ))),
    }
}

fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
        params![key, value],
    )
    .map_err(|e| PlagiscanError::Database(format!("failed to set metadata '{key}': {e}")))?;
    Ok(())
}

fn load_vectors(conn: &Connection) -> Result<Vec<Vec<f32>>> {
    let mut stmt = conn
        .prepare("SELECT position, embedding FROM vectors ORDER BY position")
        .map_err(|e| PlagiscanError::Database(format!("failed to prepare query: {e}")))?;
    let rows = stmt
        .query_map([], |row| {
            let position: i64 = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((position, blob))
        })
        .map_err(|e| PlagiscanError::Database(format!("failed to read vectors: {e}")))?;

    let mut vectors = Vec::new();
    for row in rows {
        let (position, blob) =
            row.map_err(|e| PlagiscanError::Database(format!("failed to read row: {e}")))?;
        if position != vectors.len() as i64 {
            return Err(PlagiscanError::CorruptIndex(format!(
                "vector positions are not contiguous at {position}"
            )));
        }
        if blob.len() % 4 != 0 {
            return Err(PlagiscanError::CorruptIndex(format!(
                "vector {position} has a truncated blob of {} bytes",
                blob.len()
            )));
        }
        vectors.push(bytes_to_floats(&blob));
    }
    Ok(vectors)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn floats_to_bytes(floats: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(floats.len() * 4);
    for f in floats {
        bytes.extend_from_slice(&f.to_le_bytes());
    }
    bytes
}

fn bytes_to_floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity of two vectors; zero when either is all zeros or the
/// lengths differ.
///
/// # Examples
///
/// ```
/// use plagiscan_index::store::cosine_similarity;
///
/// assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    dot / denom
}
