use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PlagiscanError;

/// Top-level configuration loaded from `.plagiscan.toml`.
///
/// Every section and field has a default, so an empty file is valid.
///
/// # Examples
///
/// ```
/// use plagiscan_core::PlagiscanConfig;
///
/// let config = PlagiscanConfig::default();
/// assert_eq!(config.detect.top_k, 5);
/// assert_eq!(config.index.max_tokens, 512);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlagiscanConfig {
    /// Embedding collaborator settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Judgment collaborator settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Index artifact locations and chunking bounds.
    #[serde(default)]
    pub index: IndexConfig,
    /// Which repositories and files make up the corpus.
    #[serde(default)]
    pub corpus: CorpusConfig,
    /// Retrieval settings for plagiarism checks.
    #[serde(default)]
    pub detect: DetectConfig,
}

impl PlagiscanConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::Io`] if the file cannot be read, or
    /// [`PlagiscanError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use plagiscan_core::PlagiscanConfig;
    /// use std::path::Path;
    ///
    /// let config = PlagiscanConfig::from_file(Path::new(".plagiscan.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, PlagiscanError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use plagiscan_core::PlagiscanConfig;
    ///
    /// let toml = r#"
    /// [detect]
    /// top_k = 10
    /// "#;
    /// let config = PlagiscanConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.detect.top_k, 10);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PlagiscanError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Reject settings that would make chunking or retrieval degenerate.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::Config`] naming the offending field.
    ///
    /// # Examples
    ///
    /// ```
    /// use plagiscan_core::PlagiscanConfig;
    ///
    /// let mut config = PlagiscanConfig::default();
    /// assert!(config.validate().is_ok());
    /// config.index.overlap = config.index.window;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), PlagiscanError> {
        if self.index.max_tokens == 0 {
            return Err(PlagiscanError::Config(
                "index.max_tokens must be at least 1".into(),
            ));
        }
        if self.index.window == 0 {
            return Err(PlagiscanError::Config(
                "index.window must be at least 1".into(),
            ));
        }
        if self.index.overlap >= self.index.window {
            return Err(PlagiscanError::Config(format!(
                "index.overlap ({}) must be smaller than index.window ({})",
                self.index.overlap, self.index.window
            )));
        }
        if self.detect.top_k == 0 {
            return Err(PlagiscanError::Config(
                "detect.top_k must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Embedding collaborator configuration.
///
/// # Examples
///
/// ```
/// use plagiscan_core::EmbeddingConfig;
///
/// let config = EmbeddingConfig::default();
/// assert_eq!(config.provider, "service");
/// assert_eq!(config.base_url, "http://localhost:8000");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Wire protocol: `"service"` (`POST /embed`) or `"openai"` (`POST /embeddings`).
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    /// Base URL of the embedding endpoint.
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    /// Model name, sent only by the `openai` protocol.
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// API key for the embedding provider.
    pub api_key: Option<String>,
    /// Request timeout in seconds (default: 60).
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_provider() -> String {
    "service".into()
}

fn default_embedding_base_url() -> String {
    "http://localhost:8000".into()
}

fn default_embedding_model() -> String {
    "microsoft/codebert-base".into()
}

fn default_embedding_timeout() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            api_key: None,
            timeout_secs: default_embedding_timeout(),
        }
    }
}

/// Judgment collaborator (LLM) configuration.
///
/// # Examples
///
/// ```
/// use plagiscan_core::LlmConfig;
///
/// let config = LlmConfig::default();
/// assert_eq!(config.model, "gpt-3.5-turbo");
/// assert_eq!(config.max_tokens, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name (only OpenAI-compatible endpoints are spoken).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
    /// Completion budget; the answer is a single token (default: 5).
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature (default: 0.0).
    #[serde(default)]
    pub temperature: f32,
    /// Request timeout in seconds (default: 120).
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "openai".into()
}

fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

fn default_llm_max_tokens() -> u32 {
    5
}

fn default_llm_timeout() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
            max_tokens: default_llm_max_tokens(),
            temperature: 0.0,
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Index artifact locations and chunking bounds.
///
/// # Examples
///
/// ```
/// use plagiscan_core::IndexConfig;
///
/// let config = IndexConfig::default();
/// assert_eq!(config.window, 256);
/// assert_eq!(config.overlap, 64);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Vector store database.
    #[serde(default = "default_vector_path")]
    pub vector_path: PathBuf,
    /// Parallel chunk metadata (JSON array).
    #[serde(default = "default_metadata_path")]
    pub metadata_path: PathBuf,
    /// Token bound for logical chunks (default: 512).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Fallback window size in tokens (default: 256).
    #[serde(default = "default_window")]
    pub window: usize,
    /// Tokens repeated between consecutive fallback windows (default: 64).
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_vector_path() -> PathBuf {
    PathBuf::from("data/index.db")
}

fn default_metadata_path() -> PathBuf {
    PathBuf::from("data/metadata.json")
}

fn default_max_tokens() -> usize {
    512
}

fn default_window() -> usize {
    256
}

fn default_overlap() -> usize {
    64
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            vector_path: default_vector_path(),
            metadata_path: default_metadata_path(),
            max_tokens: default_max_tokens(),
            window: default_window(),
            overlap: default_overlap(),
        }
    }
}

/// Corpus description: sources to index and which files to take from them.
///
/// # Examples
///
/// ```
/// use plagiscan_core::CorpusConfig;
///
/// let config = CorpusConfig::default();
/// assert!(config.extensions.contains(&"py".to_string()));
/// assert!(config.exclude_dirs.contains(&"node_modules".to_string()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Repository URLs or local directories.
    #[serde(default)]
    pub repos: Vec<String>,
    /// Optional file listing one source per line.
    pub repo_list: Option<PathBuf>,
    /// Where remote repositories are cloned.
    #[serde(default = "default_clone_dir")]
    pub clone_dir: PathBuf,
    /// Allowed file extensions (leading dots are accepted).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Directory-name substrings that exclude a file.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

fn default_clone_dir() -> PathBuf {
    PathBuf::from("repos")
}

fn default_extensions() -> Vec<String> {
    ["py", "js", "ts", "java", "c", "cpp", "h", "hpp"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_exclude_dirs() -> Vec<String> {
    [
        "__pycache__",
        "node_modules",
        ".git",
        "test",
        "build",
        "dist",
        "target",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            repos: Vec::new(),
            repo_list: None,
            clone_dir: default_clone_dir(),
            extensions: default_extensions(),
            exclude_dirs: default_exclude_dirs(),
        }
    }
}

/// Retrieval settings for plagiarism checks.
///
/// # Examples
///
/// ```
/// use plagiscan_core::DetectConfig;
///
/// let config = DetectConfig::default();
/// assert_eq!(config.top_k, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectConfig {
    /// Nearest chunks retrieved per check (default: 5).
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Upper bound on the evidence context handed to the judge (default: 16000).
    #[serde(default = "default_max_evidence_chars")]
    pub max_evidence_chars: usize,
}

fn default_top_k() -> usize {
    5
}

fn default_max_evidence_chars() -> usize {
    16_000
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_evidence_chars: default_max_evidence_chars(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = PlagiscanConfig::default();
        assert_eq!(config.embedding.provider, "service");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.index.vector_path, PathBuf::from("data/index.db"));
        assert_eq!(
            config.index.metadata_path,
            PathBuf::from("data/metadata.json")
        );
        assert_eq!(config.index.max_tokens, 512);
        assert_eq!(config.corpus.clone_dir, PathBuf::from("repos"));
        assert!(config.corpus.repos.is_empty());
        assert_eq!(config.detect.max_evidence_chars, 16_000);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[embedding]
provider = "openai"
base_url = "https://api.openai.com/v1"
model = "text-embedding-3-small"

[llm]
model = "gpt-4o-mini"
max_tokens = 8

[index]
vector_path = "out/vectors.db"
metadata_path = "out/meta.json"
window = 128
overlap = 32

[corpus]
repos = ["https://github.com/example/algos.git"]
repo_list = "repos.txt"
extensions = [".py", ".rs"]

[detect]
top_k = 3
"#;
        let config = PlagiscanConfig::from_toml(toml).unwrap();
        assert_eq!(config.embedding.provider, "openai");
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 8);
        assert_eq!(config.index.vector_path, PathBuf::from("out/vectors.db"));
        assert_eq!(config.index.window, 128);
        assert_eq!(config.index.overlap, 32);
        assert_eq!(config.index.max_tokens, 512);
        assert_eq!(config.corpus.repos.len(), 1);
        assert_eq!(config.corpus.repo_list, Some(PathBuf::from("repos.txt")));
        assert_eq!(config.corpus.extensions, vec![".py", ".rs"]);
        assert_eq!(config.detect.top_k, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PlagiscanConfig::from_toml("").unwrap();
        assert_eq!(config.detect.top_k, 5);
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = PlagiscanConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_degenerate_settings() {
        let mut config = PlagiscanConfig::default();
        config.detect.top_k = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("top_k"), "{err}");

        let mut config = PlagiscanConfig::default();
        config.index.window = 0;
        config.index.overlap = 0;
        assert!(config.validate().is_err());

        let mut config = PlagiscanConfig::default();
        config.index.overlap = 300;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("overlap"), "{err}");

        let mut config = PlagiscanConfig::default();
        config.index.max_tokens = 0;
        assert!(config.validate().is_err());
    }
}
