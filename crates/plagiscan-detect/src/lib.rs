//! Plagiarism verdicts from retrieved evidence.
//!
//! A snippet is embedded, its nearest indexed chunks are retrieved, and a
//! judgment collaborator (an LLM behind an OpenAI-compatible API) decides
//! whether the snippet is plagiarized from them. Ambiguous or failed
//! judgments resolve to `NotPlagiarized`.

pub mod detector;
pub mod eval;
pub mod llm;
pub mod prompt;
