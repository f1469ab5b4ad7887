use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The outcome of a plagiarism check.
///
/// `Error` is reserved for pipeline-level failures (the snippet could not be
/// embedded or the index could not be searched). A failing judgment
/// collaborator degrades to `NotPlagiarized` instead.
///
/// # Examples
///
/// ```
/// use plagiscan_core::Verdict;
///
/// let v: Verdict = "not_plagiarized".parse().unwrap();
/// assert_eq!(v, Verdict::NotPlagiarized);
/// assert_eq!(serde_json::to_string(&Verdict::Plagiarized).unwrap(), "\"Plagiarized\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The snippet matches indexed code closely enough to be plagiarized.
    Plagiarized,
    /// No convincing match, or the judgment was ambiguous.
    NotPlagiarized,
    /// The check itself could not be carried out.
    Error,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Plagiarized => write!(f, "Plagiarized"),
            Verdict::NotPlagiarized => write!(f, "NotPlagiarized"),
            Verdict::Error => write!(f, "Error"),
        }
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match compact.as_str() {
            "plagiarized" => Ok(Verdict::Plagiarized),
            "notplagiarized" => Ok(Verdict::NotPlagiarized),
            "error" => Ok(Verdict::Error),
            _ => Err(format!("unknown verdict: {s}")),
        }
    }
}

/// Result of checking one snippet: a verdict plus the distinct source files
/// whose chunks were retrieved as evidence.
///
/// # Examples
///
/// ```
/// use plagiscan_core::{CheckReport, Verdict};
///
/// let report = CheckReport::error();
/// assert_eq!(report.verdict, Verdict::Error);
/// assert!(report.references.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    /// Final decision.
    pub verdict: Verdict,
    /// Sorted, de-duplicated source file identifiers from the retrieved chunks.
    pub references: Vec<String>,
    /// Set when the judgment collaborator failed and the verdict fell back to
    /// [`Verdict::NotPlagiarized`].
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub judge_degraded: bool,
}

impl CheckReport {
    /// A pipeline-level failure: `Error` verdict with no references.
    pub fn error() -> Self {
        Self {
            verdict: Verdict::Error,
            references: Vec::new(),
            judge_degraded: false,
        }
    }
}

/// Metadata for one indexed chunk, stored positionally alongside its vector.
///
/// # Examples
///
/// ```
/// use plagiscan_core::ChunkRecord;
///
/// let record = ChunkRecord {
///     source_file: "algos/sort.py".into(),
///     extension: "py".into(),
///     detected_language: "python".into(),
///     sequence_index: 0,
///     text: "def sort(xs):\n    return sorted(xs)".into(),
/// };
/// let json = serde_json::to_value(&record).unwrap();
/// assert_eq!(json["sourceFile"], "algos/sort.py");
/// assert_eq!(json["sequenceIndex"], 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    /// Identifier of the originating file (`<source>/<relative path>`).
    pub source_file: String,
    /// File extension without the leading dot.
    pub extension: String,
    /// Advisory language guess.
    pub detected_language: String,
    /// Zero-based position of the chunk within its file.
    pub sequence_index: usize,
    /// Normalized chunk text.
    pub text: String,
}

/// Output format for CLI results.
///
/// # Examples
///
/// ```
/// use plagiscan_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
