use std::io::IsTerminal;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};

use plagiscan_core::{CheckReport, OutputFormat, PlagiscanConfig};
use plagiscan_detect::detector::{DetectOptions, Detector};
use plagiscan_detect::eval::{load_cases, run_evaluation, EvalReport};
use plagiscan_detect::llm::{LlmClient, LlmJudge};
use plagiscan_index::corpus::{read_repo_list, Corpus};
use plagiscan_index::embedding::EmbeddingClient;
use plagiscan_index::pipeline::{IndexOptions, IndexReport, IndexingPipeline};
use plagiscan_index::store::{IndexLock, IndexStats, VectorIndex};

const CONFIG_FILE: &str = ".plagiscan.toml";

#[derive(Parser)]
#[command(
    name = "plagiscan",
    version,
    about = "Retrieval-augmented source code plagiarism detection",
    long_about = "Plagiscan indexes a corpus of source repositories into a vector index and\n\
                   checks code snippets against it: the nearest indexed chunks are handed to an\n\
                   LLM as evidence, and its answer becomes the verdict.\n\n\
                   Examples:\n  \
                     plagiscan index --source https://github.com/org/repo  Index a repository\n  \
                     plagiscan check --file submission.py                  Check one file\n  \
                     cat snippet.c | plagiscan check --format json         Check stdin\n  \
                     plagiscan evaluate --cases cases.json                 Score the detectors\n  \
                     plagiscan doctor                                      Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .plagiscan.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Build or extend the vector index from a corpus of repositories
    #[command(long_about = "Build or extend the vector index from a corpus of repositories.\n\n\
        Sources are git URLs (cloned into [corpus].clone_dir) or local directories.\n\
        Without --source or --repo-list the [corpus] section of the config is used.\n\
        Only one indexing run may write to an index at a time.\n\n\
        Examples:\n  plagiscan index --source ../algorithms\n  plagiscan index --repo-list repos.txt")]
    Index {
        /// Repository URL or local directory (repeatable)
        #[arg(long)]
        source: Vec<String>,

        /// File listing one source per line
        #[arg(long)]
        repo_list: Option<PathBuf>,

        /// Do not draw progress bars
        #[arg(long)]
        no_progress: bool,
    },
    /// Check a code snippet for plagiarism
    #[command(long_about = "Check a code snippet for plagiarism.\n\n\
        Reads the snippet from --file or stdin and prints the verdict with the\n\
        indexed files that were retrieved as evidence. The exit code is 0 for\n\
        every verdict, including Error.\n\n\
        Examples:\n  plagiscan check --file submission.py\n  pbpaste | plagiscan check --format json")]
    Check {
        /// Read the snippet from a file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Compare retrieval-only, judge-only and full detection on labelled cases
    #[command(long_about = "Compare retrieval-only, judge-only and full detection on labelled cases.\n\n\
        Cases are a JSON array of {\"code\": ..., \"label\": \"Plagiarized\" | \"NotPlagiarized\"}.\n\n\
        Examples:\n  plagiscan evaluate --cases cases.json --output results.json")]
    Evaluate {
        /// JSON file with labelled test cases
        #[arg(long)]
        cases: PathBuf,

        /// Write per-case results as JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show index statistics
    Stats,
    /// Create a default .plagiscan.toml configuration file
    #[command(long_about = "Create a default .plagiscan.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .plagiscan.toml already exists.")]
    Init,
    /// Check your plagiscan setup and environment
    #[command(long_about = "Check your plagiscan setup and environment.\n\n\
        Runs diagnostics for the config file, embedding and LLM settings, API keys,\n\
        the index artifacts and the configured corpus. Use --format json for\n\
        machine-readable output.")]
    Doctor,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mplagiscan\x1b[0m v{version} - retrieval-augmented plagiarism detection\n");

        println!("Quick start:");
        println!("  \x1b[36mplagiscan init\x1b[0m                     Create a .plagiscan.toml config file");
        println!("  \x1b[36mplagiscan index --source <repo>\x1b[0m    Index a corpus repository");
        println!("  \x1b[36mplagiscan check --file <path>\x1b[0m      Check a snippet against the index\n");

        println!("All commands:");
        println!("  \x1b[32mindex\x1b[0m     Build or extend the vector index");
        println!("  \x1b[32mcheck\x1b[0m     Plagiarism verdict for one snippet");
        println!("  \x1b[32mevaluate\x1b[0m  Score the detectors on labelled cases");
        println!("  \x1b[32mstats\x1b[0m     Index statistics");
        println!("  \x1b[32mdoctor\x1b[0m    Check your setup and environment");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("plagiscan v{version} - retrieval-augmented plagiarism detection\n");

        println!("Quick start:");
        println!("  plagiscan init                     Create a .plagiscan.toml config file");
        println!("  plagiscan index --source <repo>    Index a corpus repository");
        println!("  plagiscan check --file <path>      Check a snippet against the index\n");

        println!("All commands:");
        println!("  index     Build or extend the vector index");
        println!("  check     Plagiarism verdict for one snippet");
        println!("  evaluate  Score the detectors on labelled cases");
        println!("  stats     Index statistics");
        println!("  doctor    Check your setup and environment");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'plagiscan <command> --help' for details.");
}

fn init_tracing(verbose: bool, ansi: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    // A second init (e.g. from a test harness) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<PlagiscanConfig> {
    let config = match path {
        Some(path) => PlagiscanConfig::from_file(path)
            .wrap_err(format!("loading {}", path.display()))?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                PlagiscanConfig::from_file(default_path).wrap_err("loading .plagiscan.toml")?
            } else {
                PlagiscanConfig::default()
            }
        }
    };
    config.validate()?;
    Ok(config)
}

fn read_snippet(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .into_diagnostic()
                .wrap_err("reading stdin")?;
            Ok(input)
        }
    }
}

/// Open the persisted index for reading. A load failure leaves the checker
/// usable with an empty index.
fn open_snapshot(config: &PlagiscanConfig) -> Arc<VectorIndex> {
    match VectorIndex::open(&config.index.vector_path, &config.index.metadata_path) {
        Ok(index) => {
            if index.is_empty() {
                tracing::warn!("index is empty, run 'plagiscan index' first");
            }
            Arc::new(index)
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load index, continuing with an empty one");
            Arc::new(VectorIndex::empty())
        }
    }
}

fn build_detector(config: &PlagiscanConfig) -> Result<Detector<EmbeddingClient, LlmJudge>> {
    let index = open_snapshot(config);
    let embedder = EmbeddingClient::from_config(&config.embedding)?;
    let judge = LlmJudge::new(LlmClient::new(&config.llm)?);
    Ok(Detector::new(
        index,
        embedder,
        judge,
        DetectOptions::from(&config.detect),
    ))
}

fn print_check_report(report: &CheckReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("## Plagiarism check\n");
            println!("**Verdict:** {}\n", report.verdict);
            if report.judge_degraded {
                println!("> The LLM judge was unavailable; the verdict is a fallback.\n");
            }
            if report.references.is_empty() {
                println!("No similar indexed files.");
            } else {
                println!("**References:**\n");
                for reference in &report.references {
                    println!("- `{reference}`");
                }
            }
        }
        OutputFormat::Text => {
            println!("Verdict: {}", report.verdict);
            if report.judge_degraded {
                println!("(judge unavailable, verdict defaulted)");
            }
            if report.references.is_empty() {
                println!("References: none");
            } else {
                println!("References:");
                for reference in &report.references {
                    println!("  {reference}");
                }
            }
        }
    }
    Ok(())
}

fn print_index_report(report: &IndexReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("## Indexing report\n");
            println!("| Metric | Count |");
            println!("|---|---|");
            println!("| Sources indexed | {} |", report.sources_indexed);
            println!("| Sources failed | {} |", report.sources_failed);
            println!("| Files scanned | {} |", report.files_scanned);
            println!("| Files indexed | {} |", report.files_indexed);
            println!("| Files skipped | {} |", report.files_skipped);
            println!("| Files failed | {} |", report.files_failed);
            println!("| Files unreachable | {} |", report.files_unreachable);
            println!("| Chunks indexed | {} |", report.chunks_indexed);
            if !report.errors.is_empty() {
                println!("\n### Errors\n");
                for error in &report.errors {
                    println!("- {error}");
                }
            }
        }
        OutputFormat::Text => {
            println!(
                "Indexed {} files ({} chunks) from {} sources in {:.1}s",
                report.files_indexed,
                report.chunks_indexed,
                report.sources_indexed,
                report.duration_ms as f64 / 1000.0,
            );
            println!(
                "  scanned {}, skipped {}, failed {} ({} unreachable), sources failed {}",
                report.files_scanned,
                report.files_skipped,
                report.files_failed,
                report.files_unreachable,
                report.sources_failed,
            );
            for error in &report.errors {
                println!("  error: {error}");
            }
        }
    }
    Ok(())
}

fn print_stats(stats: &IndexStats, format: OutputFormat) -> Result<()> {
    let dimension = stats
        .dimension
        .map_or_else(|| "unset".to_string(), |d| d.to_string());
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(stats).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("## Index statistics\n");
            println!("| Metric | Value |");
            println!("|---|---|");
            println!("| Chunks | {} |", stats.total_chunks);
            println!("| Files | {} |", stats.total_files);
            println!("| Dimension | {dimension} |");
        }
        OutputFormat::Text => {
            println!("Chunks:    {}", stats.total_chunks);
            println!("Files:     {}", stats.total_files);
            println!("Dimension: {dimension}");
        }
    }
    Ok(())
}

fn print_eval_report(report: &EvalReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("## Evaluation ({} cases)\n", report.rows.len());
            println!("| Detector | Correct | Accuracy |");
            println!("|---|---|---|");
            for score in &report.scores {
                println!(
                    "| {} | {}/{} | {:.1}% |",
                    score.name,
                    score.correct,
                    score.total,
                    score.accuracy * 100.0
                );
            }
        }
        OutputFormat::Text => {
            println!("Evaluated {} cases", report.rows.len());
            for score in &report.scores {
                println!(
                    "  {:<15} {}/{} ({:.1}%)",
                    score.name,
                    score.correct,
                    score.total,
                    score.accuracy * 100.0
                );
            }
        }
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn run_doctor(
    config: &PlagiscanConfig,
    config_path: &Path,
    format: OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut checks: Vec<CheckResult> = Vec::new();

    // 1. Config file
    if config_path.exists() {
        checks.push(CheckResult::pass(
            "config_file",
            format!("{} found", config_path.display()),
        ));
    } else {
        checks.push(CheckResult::fail(
            "config_file",
            format!("{} not found", config_path.display()),
            "run 'plagiscan init' to create a default config",
        ));
    }

    // 2. Embedding collaborator
    match EmbeddingClient::from_config(&config.embedding) {
        Ok(client) => {
            checks.push(CheckResult::pass(
                "embedding_service",
                format!("{} ({})", client.endpoint(), config.embedding.provider),
            ));
            let env_var = match config.embedding.provider.as_str() {
                "openai" => "OPENAI_API_KEY",
                _ => "PLAGISCAN_EMBEDDING_API_KEY",
            };
            if config.embedding.api_key.is_some() || std::env::var(env_var).is_ok() {
                checks.push(CheckResult::pass("embedding_api_key", format!("{env_var} set")));
            } else if config.embedding.provider == "openai" {
                checks.push(CheckResult::fail(
                    "embedding_api_key",
                    format!("{env_var} not set"),
                    format!("export {env_var}=... or set api_key in {CONFIG_FILE} [embedding]"),
                ));
            } else {
                checks.push(CheckResult::info(
                    "embedding_api_key",
                    format!("{env_var} not set (optional for the embedding service)"),
                ));
            }
        }
        Err(e) => checks.push(CheckResult::fail(
            "embedding_service",
            e.to_string(),
            "set [embedding].provider to \"service\" or \"openai\"",
        )),
    }

    // 3. LLM judge
    let llm_base = config
        .llm
        .base_url
        .as_deref()
        .unwrap_or("https://api.openai.com");
    checks.push(CheckResult::pass(
        "llm_provider",
        format!("{} (model: {}, {llm_base})", config.llm.provider, config.llm.model),
    ));
    if config.llm.api_key.is_some() || std::env::var("OPENAI_API_KEY").is_ok() {
        checks.push(CheckResult::pass("llm_api_key", "OPENAI_API_KEY set"));
    } else {
        checks.push(CheckResult::fail(
            "llm_api_key",
            "OPENAI_API_KEY not set",
            format!("export OPENAI_API_KEY=... or set api_key in {CONFIG_FILE} [llm]"),
        ));
    }

    // 4. Index artifacts
    let vector_path = &config.index.vector_path;
    let metadata_path = &config.index.metadata_path;
    if vector_path.exists() || metadata_path.exists() {
        match VectorIndex::open(vector_path, metadata_path) {
            Ok(index) => {
                let stats = index.stats();
                checks.push(CheckResult::pass(
                    "index",
                    format!(
                        "{} chunks from {} files",
                        stats.total_chunks, stats.total_files
                    ),
                ));
            }
            Err(e) => checks.push(CheckResult::fail(
                "index",
                e.to_string(),
                "rebuild the index with 'plagiscan index'",
            )),
        }
    } else {
        checks.push(CheckResult::info(
            "index",
            "not found (run 'plagiscan index' to create)",
        ));
    }
    let mut lock_name = vector_path.as_os_str().to_os_string();
    lock_name.push(".lock");
    if Path::new(&lock_name).exists() {
        checks.push(CheckResult::info(
            "index_lock",
            format!("{} present (indexing in progress?)", PathBuf::from(&lock_name).display()),
        ));
    }

    // 5. Corpus
    match Corpus::from_config(&config.corpus) {
        Ok(corpus) if corpus.sources.is_empty() => checks.push(CheckResult::info(
            "corpus",
            "no sources configured (set [corpus].repos or pass --source)",
        )),
        Ok(corpus) => checks.push(CheckResult::pass(
            "corpus",
            format!(
                "{} sources, extensions: {}",
                corpus.sources.len(),
                corpus.extensions.join(" ")
            ),
        )),
        Err(e) => checks.push(CheckResult::fail(
            "corpus",
            e.to_string(),
            "check [corpus].repos and [corpus].repo_list",
        )),
    }

    // Output
    match format {
        OutputFormat::Json => {
            let version = env!("CARGO_PKG_VERSION");
            let json = serde_json::json!({
                "version": version,
                "checks": checks,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        _ => {
            let version = env!("CARGO_PKG_VERSION");
            println!("plagiscan v{version} - Environment Check\n");

            for check in &checks {
                let sym = if use_color {
                    check.colored_symbol()
                } else {
                    check.symbol().to_string()
                };
                let label = check.name.replace('_', " ");
                println!("  {sym} {label:<20} {}", check.detail);
                if let Some(hint) = &check.hint {
                    println!("    hint: {hint}");
                }
            }

            let passed = checks.iter().filter(|c| c.status == "pass").count();
            let failed = checks.iter().filter(|c| c.status == "fail").count();
            let info = checks.iter().filter(|c| c.status == "info").count();
            println!("\n{passed} checks passed, {failed} failed, {info} info");
        }
    }

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# plagiscan configuration

[embedding]
# provider = "service"              # "service" (POST <base_url>/embed) or "openai" (POST <base_url>/embeddings)
# base_url = "http://localhost:8000"
# model = "microsoft/codebert-base"
# timeout_secs = 60

[llm]
# provider = "openai"
# model = "gpt-3.5-turbo"
# base_url = "https://api.openai.com"
# max_tokens = 5
# temperature = 0.0
# timeout_secs = 120

[index]
# vector_path = "data/index.db"
# metadata_path = "data/metadata.json"
# max_tokens = 512
# window = 256
# overlap = 64

[corpus]
# repos = ["https://github.com/TheAlgorithms/Python"]
# repo_list = "repos.txt"
# clone_dir = "repos"
# extensions = ["py", "js", "ts", "java", "c", "cpp", "h", "hpp"]
# exclude_dirs = ["__pycache__", "node_modules", ".git", "test", "build", "dist", "target"]

[detect]
# top_k = 5
# max_evidence_chars = 16000
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };
    let stderr_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };
    init_tracing(cli.verbose, stderr_color);

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(format = %cli.format, "configuration loaded");

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Index {
            ref source,
            ref repo_list,
            no_progress,
        }) => {
            let corpus = if source.is_empty() && repo_list.is_none() {
                Corpus::from_config(&config.corpus)?
            } else {
                let mut specs = source.clone();
                if let Some(list) = repo_list {
                    specs.extend(
                        read_repo_list(list).wrap_err(format!("reading {}", list.display()))?,
                    );
                }
                Corpus::from_specs(&specs, &config.corpus)?
            };
            if corpus.sources.is_empty() {
                miette::bail!(
                    "no corpus sources: pass --source or --repo-list, or set [corpus].repos in {CONFIG_FILE}"
                );
            }

            let vector_path = &config.index.vector_path;
            let metadata_path = &config.index.metadata_path;
            let _lock = IndexLock::acquire(vector_path)?;
            let mut index = VectorIndex::open(vector_path, metadata_path)?;
            if !index.is_empty() {
                tracing::info!(chunks = index.len(), "appending to existing index");
            }

            let embedder = EmbeddingClient::from_config(&config.embedding)?;
            let options = IndexOptions {
                show_progress: !no_progress && std::io::stderr().is_terminal(),
                ..IndexOptions::from(&config.index)
            };
            let report = IndexingPipeline::new(&mut index, &embedder, options)
                .run(&corpus, vector_path, metadata_path)
                .await?;
            print_index_report(&report, cli.format)?;
        }
        Some(Command::Check { ref file }) => {
            let snippet = read_snippet(file.as_deref())?;
            if snippet.trim().is_empty() {
                tracing::warn!("snippet is empty");
            }
            let detector = build_detector(&config)?;
            let report = detector.evaluate(&snippet).await;
            print_check_report(&report, cli.format)?;
        }
        Some(Command::Evaluate {
            ref cases,
            ref output,
        }) => {
            let cases = load_cases(cases).wrap_err(format!("loading {}", cases.display()))?;
            let detector = build_detector(&config)?;
            let report = run_evaluation(&detector, &cases).await;
            if let Some(path) = output {
                report.write_json(path)?;
                eprintln!("Wrote {} results to {}", report.rows.len(), path.display());
            }
            print_eval_report(&report, cli.format)?;
        }
        Some(Command::Stats) => {
            let index = VectorIndex::open(&config.index.vector_path, &config.index.metadata_path)?;
            print_stats(&index.stats(), cli.format)?;
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Some(Command::Doctor) => {
            let config_path = cli
                .config
                .clone()
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
            run_doctor(&config, &config_path, cli.format, use_color)?;
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "plagiscan", &mut std::io::stdout());
        }
    }

    Ok(())
}
