//! Evaluation harness comparing retrieval-only, judge-only and full detection
//! against labelled test cases.

use std::path::Path;

use plagiscan_core::{PlagiscanError, Result, Verdict};
use plagiscan_index::embedding::Embedder;
use plagiscan_index::store::cosine_similarity;
use serde::{Deserialize, Serialize};

use crate::detector::Detector;
use crate::llm::Judge;
use crate::prompt::{parse_verdict, NO_EVIDENCE};

/// Cosine similarity at or above which the retrieval-only detector says `Plagiarized`.
pub const RETRIEVAL_THRESHOLD: f64 = 0.8;

/// One labelled snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub code: String,
    pub label: Verdict,
}

/// Load test cases from a JSON array.
///
/// # Errors
///
/// Returns [`PlagiscanError::FileNotFound`] if `path` does not exist and
/// [`PlagiscanError::Serialization`] if it is not a valid case list.
pub fn load_cases(path: &Path) -> Result<Vec<TestCase>> {
    if !path.exists() {
        return Err(PlagiscanError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let cases: Vec<TestCase> = serde_json::from_str(&content)?;
    Ok(cases)
}

/// Verdicts of the three detectors for one case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalRow {
    pub code: String,
    pub label: Verdict,
    pub retrieval_only: Verdict,
    /// Best cosine similarity seen by the retrieval-only detector.
    pub similarity: Option<f64>,
    pub judge_only: Verdict,
    pub full: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorScore {
    pub name: String,
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
}

impl DetectorScore {
    fn tally(name: &str, pairs: impl Iterator<Item = (Verdict, Verdict)>) -> Self {
        let (mut correct, mut total) = (0, 0);
        for (label, predicted) in pairs {
            total += 1;
            if label == predicted {
                correct += 1;
            }
        }
        let accuracy = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        };
        Self {
            name: name.to_string(),
            correct,
            total,
            accuracy,
        }
    }
}

/// Per-case rows plus per-detector accuracy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalReport {
    pub rows: Vec<EvalRow>,
    pub scores: Vec<DetectorScore>,
}

impl EvalReport {
    fn from_rows(rows: Vec<EvalRow>) -> Self {
        let scores = vec![
            DetectorScore::tally("retrieval-only", rows.iter().map(|r| (r.label, r.retrieval_only))),
            DetectorScore::tally("judge-only", rows.iter().map(|r| (r.label, r.judge_only))),
            DetectorScore::tally("full", rows.iter().map(|r| (r.label, r.full))),
        ];
        Self { rows, scores }
    }

    /// Write the report as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an I/O or serialization error.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Run every case through the three detectors.
pub async fn run_evaluation<E: Embedder, J: Judge>(
    detector: &Detector<E, J>,
    cases: &[TestCase],
) -> EvalReport {
    let mut rows = Vec::with_capacity(cases.len());
    for (i, case) in cases.iter().enumerate() {
        let (retrieval_only, similarity) = retrieval_only(detector, &case.code).await;
        let judge_only = judge_only(detector, &case.code).await;
        let full = detector.evaluate(&case.code).await.verdict;
        tracing::info!(
            case = i,
            label = %case.label,
            %retrieval_only,
            %judge_only,
            %full,
            "evaluated case"
        );
        rows.push(EvalRow {
            code: case.code.clone(),
            label: case.label,
            retrieval_only,
            similarity,
            judge_only,
            full,
        });
    }
    EvalReport::from_rows(rows)
}

async fn retrieval_only<E: Embedder, J: Judge>(
    detector: &Detector<E, J>,
    code: &str,
) -> (Verdict, Option<f64>) {
    let retrieval = match detector.retrieve(code).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "retrieval-only detector failed");
            return (Verdict::Error, None);
        }
    };
    let Some(top) = retrieval.hits.first() else {
        return (Verdict::NotPlagiarized, None);
    };
    let Some(stored) = detector.index().vector(top.position) else {
        return (Verdict::Error, None);
    };
    let similarity = cosine_similarity(&retrieval.query, stored);
    (retrieval_verdict(similarity), Some(similarity))
}

/// Verdict of the retrieval-only detector for the best cosine similarity.
///
/// # Examples
///
/// ```
/// use plagiscan_core::Verdict;
/// use plagiscan_detect::eval::{retrieval_verdict, RETRIEVAL_THRESHOLD};
///
/// assert_eq!(retrieval_verdict(RETRIEVAL_THRESHOLD), Verdict::Plagiarized);
/// assert_eq!(retrieval_verdict(0.5), Verdict::NotPlagiarized);
/// ```
pub fn retrieval_verdict(similarity: f64) -> Verdict {
    if similarity >= RETRIEVAL_THRESHOLD {
        Verdict::Plagiarized
    } else {
        Verdict::NotPlagiarized
    }
}

async fn judge_only<E: Embedder, J: Judge>(detector: &Detector<E, J>, code: &str) -> Verdict {
    match detector.judge().judge(code, NO_EVIDENCE).await {
        Ok(raw) => parse_verdict(&raw),
        Err(e) => {
            tracing::warn!(
                error = %e,
                "judge-only detector failed, defaulting to NotPlagiarized"
            );
            Verdict::NotPlagiarized
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectOptions;
    use plagiscan_core::ChunkRecord;
    use plagiscan_index::store::VectorIndex;
    use std::sync::Arc;

    /// Embeds "dup" close to the indexed vector and anything else orthogonal.
    struct Keyword;

    impl Embedder for Keyword {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.contains("broken") {
                return Err(PlagiscanError::Transport("down".into()));
            }
            if text.contains("dup") {
                Ok(vec![1.0, 0.1])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }
    }

    /// Says `Plagiarized` only when it has real evidence.
    struct EvidenceJudge;

    impl Judge for EvidenceJudge {
        async fn judge(&self, _snippet: &str, evidence: &str) -> Result<String> {
            if evidence == NO_EVIDENCE {
                Ok("NotPlagiarized".into())
            } else {
                Ok("Plagiarized".into())
            }
        }
    }

    /// Judge whose service is down.
    struct Down;

    impl Judge for Down {
        async fn judge(&self, _snippet: &str, _evidence: &str) -> Result<String> {
            Err(PlagiscanError::Transport("connection refused".into()))
        }
    }

    fn detector() -> Detector<Keyword, EvidenceJudge> {
        detector_with(EvidenceJudge)
    }

    fn detector_with<J: Judge>(judge: J) -> Detector<Keyword, J> {
        let mut index = VectorIndex::new(2);
        index
            .add(
                vec![1.0, 0.0],
                ChunkRecord {
                    source_file: "repo/dup.py".into(),
                    extension: "py".into(),
                    detected_language: "python".into(),
                    sequence_index: 0,
                    text: "dup".into(),
                },
            )
            .unwrap();
        Detector::new(Arc::new(index), Keyword, judge, DetectOptions::default())
    }

    fn case(code: &str, label: Verdict) -> TestCase {
        TestCase {
            code: code.into(),
            label,
        }
    }

    #[test]
    fn load_cases_reads_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.json");
        std::fs::write(
            &path,
            r#"[{"code": "x = 1", "label": "Plagiarized"}, {"code": "y", "label": "NotPlagiarized"}]"#,
        )
        .unwrap();
        let cases = load_cases(&path).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].label, Verdict::Plagiarized);
        assert_eq!(cases[1].code, "y");
    }

    #[test]
    fn load_cases_missing_file() {
        let err = load_cases(Path::new("/nonexistent/cases.json")).unwrap_err();
        assert!(matches!(err, PlagiscanError::FileNotFound(_)));
    }

    #[test]
    fn load_cases_rejects_unknown_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.json");
        std::fs::write(&path, r#"[{"code": "x", "label": "Maybe"}]"#).unwrap();
        assert!(matches!(
            load_cases(&path).unwrap_err(),
            PlagiscanError::Serialization(_)
        ));
    }

    #[tokio::test]
    async fn three_detectors_per_case() {
        let cases = vec![
            case("dup", Verdict::Plagiarized),
            case("fresh", Verdict::NotPlagiarized),
        ];
        let report = run_evaluation(&detector(), &cases).await;

        let dup = &report.rows[0];
        assert_eq!(dup.retrieval_only, Verdict::Plagiarized);
        assert!(dup.similarity.unwrap() > RETRIEVAL_THRESHOLD);
        assert_eq!(dup.judge_only, Verdict::NotPlagiarized);
        assert_eq!(dup.full, Verdict::Plagiarized);

        let fresh = &report.rows[1];
        assert_eq!(fresh.retrieval_only, Verdict::NotPlagiarized);
        assert!(fresh.similarity.unwrap().abs() < 1e-9);
        // The full detector always has the single indexed chunk as evidence.
        assert_eq!(fresh.full, Verdict::Plagiarized);

        let scores: Vec<(&str, usize)> = report
            .scores
            .iter()
            .map(|s| (s.name.as_str(), s.correct))
            .collect();
        assert_eq!(
            scores,
            vec![("retrieval-only", 2), ("judge-only", 1), ("full", 1)]
        );
        assert!((report.scores[0].accuracy - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn embedding_failure_is_error_for_retrieval_detectors() {
        let report = run_evaluation(&detector(), &[case("broken", Verdict::NotPlagiarized)]).await;
        let row = &report.rows[0];
        assert_eq!(row.retrieval_only, Verdict::Error);
        assert_eq!(row.similarity, None);
        assert_eq!(row.full, Verdict::Error);
        assert_eq!(row.judge_only, Verdict::NotPlagiarized);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(retrieval_verdict(RETRIEVAL_THRESHOLD), Verdict::Plagiarized);
        assert_eq!(retrieval_verdict(1.0), Verdict::Plagiarized);
        assert_eq!(retrieval_verdict(0.799_999), Verdict::NotPlagiarized);
        assert_eq!(retrieval_verdict(-1.0), Verdict::NotPlagiarized);
    }

    #[tokio::test]
    async fn judge_outage_is_not_plagiarized_for_judge_only() {
        let report =
            run_evaluation(&detector_with(Down), &[case("fresh", Verdict::NotPlagiarized)]).await;
        let row = &report.rows[0];
        assert_eq!(row.judge_only, Verdict::NotPlagiarized);
        assert_eq!(row.full, Verdict::NotPlagiarized);
        assert_eq!(row.retrieval_only, Verdict::NotPlagiarized);
        assert_eq!(report.scores[1].correct, 1);
    }

    #[tokio::test]
    async fn report_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/results.json");
        let report = run_evaluation(&detector(), &[case("dup", Verdict::Plagiarized)]).await;
        report.write_json(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["rows"][0]["retrievalOnly"], "Plagiarized");
        assert_eq!(json["scores"][2]["name"], "full");
    }

    #[test]
    fn empty_tally_has_zero_accuracy() {
        let score = DetectorScore::tally("x", std::iter::empty());
        assert_eq!(score.total, 0);
        assert_eq!(score.accuracy, 0.0);
    }
}
