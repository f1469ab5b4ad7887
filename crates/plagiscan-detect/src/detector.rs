//! Retrieval-augmented verdict engine.
//!
//! `evaluate` embeds a snippet, retrieves its nearest indexed chunks, hands
//! them to a [`Judge`] as evidence and parses the answer. It never fails:
//! embedding or search failures become [`Verdict::Error`], judge failures
//! become [`Verdict::NotPlagiarized`] with `judge_degraded` set.

use std::collections::BTreeSet;
use std::sync::Arc;

use plagiscan_core::{CheckReport, DetectConfig, Result, Verdict};
use plagiscan_index::embedding::Embedder;
use plagiscan_index::store::{SearchHit, VectorIndex};

use crate::llm::Judge;
use crate::prompt::{parse_verdict, NO_EVIDENCE};

/// Detector options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectOptions {
    /// Neighbors retrieved per snippet.
    pub top_k: usize,
    /// Upper bound on the evidence handed to the judge, in characters.
    pub max_evidence_chars: usize,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self::from(&DetectConfig::default())
    }
}

impl From<&DetectConfig> for DetectOptions {
    fn from(config: &DetectConfig) -> Self {
        Self {
            top_k: config.top_k,
            max_evidence_chars: config.max_evidence_chars,
        }
    }
}

/// Query embedding plus the neighbors it retrieved.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub query: Vec<f32>,
    pub hits: Vec<SearchHit>,
}

impl Retrieval {
    /// Sorted, distinct source files of the retrieved chunks.
    pub fn references(&self) -> Vec<String> {
        self.hits
            .iter()
            .map(|hit| hit.record.source_file.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Plagiarism detector over a read-only index snapshot.
///
/// The index is shared through an [`Arc`]; an indexing run works on its own
/// copy and readers pick up the result by reopening after it persists.
pub struct Detector<E: Embedder, J: Judge> {
    index: Arc<VectorIndex>,
    embedder: E,
    judge: J,
    options: DetectOptions,
}

impl<E: Embedder, J: Judge> Detector<E, J> {
    pub fn new(index: Arc<VectorIndex>, embedder: E, judge: J, options: DetectOptions) -> Self {
        Self {
            index,
            embedder,
            judge,
            options,
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn judge(&self) -> &J {
        &self.judge
    }

    pub fn options(&self) -> DetectOptions {
        self.options
    }

    /// Embed `snippet` and fetch its `top_k` nearest chunks.
    ///
    /// # Errors
    ///
    /// Returns the embedding error, or a dimension mismatch from the search.
    pub async fn retrieve(&self, snippet: &str) -> Result<Retrieval> {
        let query = self.embedder.embed(snippet).await?;
        let hits = self.index.search(&query, self.options.top_k)?;
        Ok(Retrieval { query, hits })
    }

    /// Check one snippet.
    pub async fn evaluate(&self, snippet: &str) -> CheckReport {
        let retrieval = match self.retrieve(snippet).await {
            Ok(retrieval) => retrieval,
            Err(e) => {
                tracing::error!(error = %e, "retrieval failed");
                return CheckReport::error();
            }
        };
        tracing::debug!(hits = retrieval.hits.len(), "retrieved neighbors");

        let evidence = build_evidence(&retrieval.hits, self.options.max_evidence_chars);
        let (verdict, judge_degraded) = match self.judge.judge(snippet, &evidence).await {
            Ok(raw) => (parse_verdict(&raw), false),
            Err(e) => {
                tracing::warn!(error = %e, "judge failed, defaulting to NotPlagiarized");
                (Verdict::NotPlagiarized, true)
            }
        };

        CheckReport {
            verdict,
            references: retrieval.references(),
            judge_degraded,
        }
    }
}

/// Join the retrieved chunk texts with blank lines, capped at `max_chars`.
///
/// # Examples
///
/// ```
/// use plagiscan_detect::detector::build_evidence;
/// use plagiscan_detect::prompt::NO_EVIDENCE;
///
/// assert_eq!(build_evidence(&[], 1000), NO_EVIDENCE);
/// ```
pub fn build_evidence(hits: &[SearchHit], max_chars: usize) -> String {
    if hits.is_empty() {
        return NO_EVIDENCE.to_string();
    }
    let joined = hits
        .iter()
        .map(|hit| hit.record.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    match joined.char_indices().nth(max_chars) {
        Some((cut, _)) => joined[..cut].to_string(),
        None => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plagiscan_core::{ChunkRecord, PlagiscanError};
    use std::sync::Mutex;

    fn hit(position: usize, file: &str, text: &str) -> SearchHit {
        SearchHit {
            position,
            distance: position as f32,
            record: ChunkRecord {
                source_file: file.into(),
                extension: "py".into(),
                detected_language: "python".into(),
                sequence_index: 0,
                text: text.into(),
            },
        }
    }

    struct Fixed(Vec<f32>);

    impl Embedder for Fixed {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    /// Records the evidence it was given and answers with a fixed reply.
    struct Recording {
        reply: &'static str,
        seen: Mutex<Vec<String>>,
    }

    impl Recording {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Judge for Recording {
        async fn judge(&self, _snippet: &str, evidence: &str) -> Result<String> {
            self.seen.lock().unwrap().push(evidence.to_string());
            Ok(self.reply.to_string())
        }
    }

    fn index_with(entries: &[(&str, &str, [f32; 2])]) -> Arc<VectorIndex> {
        let mut index = VectorIndex::new(2);
        for (file, text, v) in entries {
            index
                .add(
                    v.to_vec(),
                    ChunkRecord {
                        source_file: (*file).into(),
                        extension: "py".into(),
                        detected_language: "python".into(),
                        sequence_index: 0,
                        text: (*text).into(),
                    },
                )
                .unwrap();
        }
        Arc::new(index)
    }

    #[test]
    fn evidence_joins_with_blank_lines() {
        let hits = vec![hit(0, "a.py", "x = 1"), hit(1, "b.py", "y = 2")];
        assert_eq!(build_evidence(&hits, 1000), "x = 1\n\ny = 2");
    }

    #[test]
    fn evidence_is_bounded_on_char_boundary() {
        let hits = vec![hit(0, "a.py", "héllo wörld")];
        assert_eq!(build_evidence(&hits, 4), "héll");
        assert_eq!(build_evidence(&hits, 0), "");
    }

    #[test]
    fn options_follow_detect_config() {
        let config = DetectConfig {
            top_k: 9,
            max_evidence_chars: 100,
        };
        let options = DetectOptions::from(&config);
        assert_eq!(options.top_k, 9);
        assert_eq!(options.max_evidence_chars, 100);
    }

    #[test]
    fn references_are_sorted_and_distinct() {
        let retrieval = Retrieval {
            query: vec![],
            hits: vec![
                hit(0, "z.py", "a"),
                hit(1, "a.py", "b"),
                hit(2, "z.py", "c"),
            ],
        };
        assert_eq!(retrieval.references(), vec!["a.py", "z.py"]);
    }

    #[tokio::test]
    async fn evidence_reaches_the_judge_in_distance_order() {
        let index = index_with(&[
            ("far.py", "far", [9.0, 9.0]),
            ("near.py", "near", [0.0, 0.0]),
        ]);
        let judge = Recording::new("Plagiarized");
        let detector = Detector::new(index, Fixed(vec![0.0, 0.0]), &judge, DetectOptions::default());

        let report = detector.evaluate("snippet").await;
        assert_eq!(report.verdict, Verdict::Plagiarized);
        assert_eq!(report.references, vec!["far.py", "near.py"]);
        assert_eq!(judge.seen.lock().unwrap()[0], "near\n\nfar");
    }

    #[tokio::test]
    async fn top_k_limits_references() {
        let index = index_with(&[
            ("a.py", "a", [0.0, 0.0]),
            ("b.py", "b", [1.0, 0.0]),
            ("c.py", "c", [5.0, 5.0]),
        ]);
        let options = DetectOptions {
            top_k: 2,
            ..DetectOptions::default()
        };
        let detector = Detector::new(index, Fixed(vec![0.0, 0.0]), Recording::new("x"), options);
        let report = detector.evaluate("snippet").await;
        assert_eq!(report.references, vec!["a.py", "b.py"]);
    }

    #[tokio::test]
    async fn empty_index_sends_placeholder() {
        let judge = Recording::new("NotPlagiarized");
        let detector = Detector::new(
            Arc::new(VectorIndex::new(2)),
            Fixed(vec![0.0, 0.0]),
            &judge,
            DetectOptions::default(),
        );
        let report = detector.evaluate("anything").await;
        assert_eq!(report.verdict, Verdict::NotPlagiarized);
        assert!(report.references.is_empty());
        assert_eq!(judge.seen.lock().unwrap()[0], NO_EVIDENCE);
    }

    #[tokio::test]
    async fn wrong_query_dimension_is_error_verdict() {
        let index = index_with(&[("a.py", "a", [0.0, 0.0])]);
        let detector = Detector::new(
            index,
            Fixed(vec![0.0, 0.0, 0.0]),
            Recording::new("Plagiarized"),
            DetectOptions::default(),
        );
        assert_eq!(detector.evaluate("x").await, CheckReport::error());
    }

    #[tokio::test]
    async fn retrieve_propagates_search_errors() {
        let index = index_with(&[("a.py", "a", [0.0, 0.0])]);
        let detector = Detector::new(
            index,
            Fixed(vec![1.0]),
            Recording::new("x"),
            DetectOptions::default(),
        );
        let err = detector.retrieve("x").await.unwrap_err();
        assert!(matches!(err, PlagiscanError::DimensionMismatch { .. }));
    }
}
