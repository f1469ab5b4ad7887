//! Corpus acquisition: resolving sources to directories and listing files.
//!
//! A source is either a local directory, indexed in place, or a git URL
//! cloned with git2 under the configured clone directory. Cloning is
//! idempotent: an existing destination is reused without fetching.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use plagiscan_core::{CorpusConfig, PlagiscanError, Result};

/// One repository in the corpus.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use plagiscan_index::corpus::CorpusSource;
///
/// let source = CorpusSource::parse("https://github.com/acme/algos.git", Path::new("repos")).unwrap();
/// assert_eq!(source.name(), "algos");
/// assert_eq!(source.root(), Path::new("repos/algos"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusSource {
    /// A directory indexed where it lies.
    Local {
        /// Display name, used as the `sourceFile` prefix.
        name: String,
        /// Directory to walk.
        path: PathBuf,
    },
    /// A repository cloned on first use.
    Remote {
        /// Last URL segment without `.git`.
        name: String,
        /// Clone URL.
        url: String,
        /// Clone destination.
        dest: PathBuf,
    },
}

impl CorpusSource {
    /// Interpret `spec` as an existing local directory or, failing that, a
    /// git URL cloned into `clone_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::Config`] if `spec` is blank or no repository
    /// name can be derived from it.
    pub fn parse(spec: &str, clone_dir: &Path) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(PlagiscanError::Config("empty corpus source".into()));
        }

        let path = Path::new(spec);
        if path.is_dir() {
            let name = path
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| spec.trim_end_matches('/').to_string());
            return Ok(CorpusSource::Local {
                name,
                path: path.to_path_buf(),
            });
        }

        let last = spec
            .trim_end_matches('/')
            .rsplit(|c: char| c == '/' || c == ':')
            .next()
            .unwrap_or_default();
        let name = last.strip_suffix(".git").unwrap_or(last);
        if name.is_empty() {
            return Err(PlagiscanError::Config(format!(
                "cannot derive a repository name from '{spec}'"
            )));
        }

        Ok(CorpusSource::Remote {
            name: name.to_string(),
            url: spec.to_string(),
            dest: clone_dir.join(name),
        })
    }

    /// Name used as the `sourceFile` prefix.
    pub fn name(&self) -> &str {
        match self {
            CorpusSource::Local { name, .. } | CorpusSource::Remote { name, .. } => name,
        }
    }

    /// Directory the source's files live in once acquired.
    pub fn root(&self) -> &Path {
        match self {
            CorpusSource::Local { path, .. } => path,
            CorpusSource::Remote { dest, .. } => dest,
        }
    }

    /// Make the source tree available on disk and return its root.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::FileNotFound`] if a local directory has
    /// vanished, or [`PlagiscanError::Git`] if cloning fails.
    pub fn acquire(&self) -> Result<PathBuf> {
        match self {
            CorpusSource::Local { path, .. } => {
                if !path.is_dir() {
                    return Err(PlagiscanError::FileNotFound(path.clone()));
                }
                Ok(path.clone())
            }
            CorpusSource::Remote { name, url, dest } => {
                if dest.exists() {
                    tracing::info!(repo = %name, "repository already cloned");
                    return Ok(dest.clone());
                }
                if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                tracing::info!(repo = %name, url = %url, "cloning repository");
                git2::Repository::clone(url, dest)
                    .map_err(|e| PlagiscanError::Git(format!("failed to clone {url}: {e}")))?;
                Ok(dest.clone())
            }
        }
    }
}

/// The set of sources to index plus the file filters applied to each.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    /// Sources, deduplicated by root directory.
    pub sources: Vec<CorpusSource>,
    /// Allowed extensions, lowercase without the leading dot.
    pub extensions: Vec<String>,
    /// Directory substrings that exclude a file.
    pub exclude_dirs: Vec<String>,
}

impl Corpus {
    /// Build a corpus from `[corpus]` settings: inline `repos` followed by
    /// the entries of `repo_list`.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::Io`] if `repo_list` cannot be read, or
    /// [`PlagiscanError::Config`] for an unusable entry.
    pub fn from_config(config: &CorpusConfig) -> Result<Self> {
        let mut specs = config.repos.clone();
        if let Some(list) = &config.repo_list {
            specs.extend(read_repo_list(list)?);
        }
        Self::from_specs(&specs, config)
    }

    /// Build a corpus from explicit source strings, taking filters and the
    /// clone directory from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PlagiscanError::Config`] for an unusable entry.
    pub fn from_specs(specs: &[String], config: &CorpusConfig) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut sources = Vec::new();
        for spec in specs {
            let source = CorpusSource::parse(spec, &config.clone_dir)?;
            if seen.insert(source.root().to_path_buf()) {
                sources.push(source);
            } else {
                tracing::debug!(source = %spec, "skipping duplicate corpus source");
            }
        }

        Ok(Self {
            sources,
            extensions: config
                .extensions
                .iter()
                .map(|e| normalize_extension(e))
                .collect(),
            exclude_dirs: config.exclude_dirs.clone(),
        })
    }
}

/// Read a repository list file: one source per line, blank lines and `#`
/// comments ignored.
///
/// # Errors
///
/// Returns [`PlagiscanError::Io`] if the file cannot be read.
pub fn read_repo_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect())
}

/// Lowercase an extension and drop its leading dot.
///
/// # Examples
///
/// ```
/// use plagiscan_index::corpus::normalize_extension;
///
/// assert_eq!(normalize_extension(".PY"), "py");
/// assert_eq!(normalize_extension("cpp"), "cpp");
/// ```
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// List the files under `root` worth indexing, sorted.
///
/// Keeps files whose extension is in `extensions` and drops files whose
/// directory path relative to `root` contains any of `exclude_dirs` as a
/// substring. Hidden and git-ignored files are not special.
///
/// # Errors
///
/// Returns [`PlagiscanError::FileNotFound`] if `root` is not a directory.
///
/// # Examples
///
/// ```
/// use plagiscan_index::corpus::enumerate_files;
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("main.py"), "print(1)").unwrap();
/// std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
///
/// let files = enumerate_files(dir.path(), &["py".into()], &[]).unwrap();
/// assert_eq!(files.len(), 1);
/// assert!(files[0].ends_with("main.py"));
/// ```
pub fn enumerate_files(
    root: &Path,
    extensions: &[String],
    exclude_dirs: &[String],
) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(PlagiscanError::FileNotFound(root.to_path_buf()));
    }

    let allowed: HashSet<String> = extensions.iter().map(|e| normalize_extension(e)).collect();
    let walker = ignore::WalkBuilder::new(root).standard_filters(false).build();
    let mut files = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !allowed.contains(&ext.to_ascii_lowercase()) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let dir = relative
            .parent()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        if exclude_dirs.iter().any(|x| dir.contains(x.as_str())) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x = 1\n").unwrap();
    }

    #[test]
    fn parse_local_directory() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().to_string_lossy().into_owned();
        let source = CorpusSource::parse(&spec, Path::new("repos")).unwrap();
        assert!(matches!(source, CorpusSource::Local { .. }));
        assert_eq!(source.root(), dir.path());
    }

    #[test]
    fn parse_remote_urls() {
        let clone_dir = Path::new("/tmp/clones");
        let https = CorpusSource::parse("https://github.com/acme/sorting/", clone_dir).unwrap();
        assert_eq!(https.name(), "sorting");
        assert_eq!(https.root(), clone_dir.join("sorting"));

        let ssh = CorpusSource::parse("git@github.com:acme/graphs.git", clone_dir).unwrap();
        assert_eq!(ssh.name(), "graphs");
    }

    #[test]
    fn parse_rejects_blank_and_nameless() {
        assert!(CorpusSource::parse("   ", Path::new("repos")).is_err());
        assert!(CorpusSource::parse("https://host/.git", Path::new("repos")).is_err());
    }

    #[test]
    fn from_config_merges_list_and_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("repos.txt");
        std::fs::write(
            &list,
            "https://github.com/acme/algos.git\n\n# comment\nhttps://github.com/acme/web\n",
        )
        .unwrap();

        let config = CorpusConfig {
            repos: vec!["https://github.com/acme/algos".into()],
            repo_list: Some(list),
            clone_dir: dir.path().join("clones"),
            extensions: vec![".PY".into(), "js".into()],
            ..CorpusConfig::default()
        };
        let corpus = Corpus::from_config(&config).unwrap();
        let names: Vec<&str> = corpus.sources.iter().map(CorpusSource::name).collect();
        assert_eq!(names, vec!["algos", "web"]);
        assert_eq!(corpus.extensions, vec!["py", "js"]);
    }

    #[test]
    fn missing_repo_list_is_io_error() {
        let config = CorpusConfig {
            repo_list: Some(PathBuf::from("/definitely/not/here.txt")),
            ..CorpusConfig::default()
        };
        assert!(matches!(
            Corpus::from_config(&config),
            Err(PlagiscanError::Io(_))
        ));
    }

    #[test]
    fn enumerate_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/z.py");
        touch(root, "src/a.py");
        touch(root, "src/readme.md");
        touch(root, "lib/util.JS");
        touch(root, "node_modules/pkg/index.js");
        touch(root, "tests/test_a.py");
        touch(root, "pkg/build/gen.py");
        touch(root, ".hidden/secret.py");
        touch(root, "top.py");

        let exts = vec!["py".to_string(), "js".to_string()];
        let excludes: Vec<String> = ["node_modules", "test", "build"]
            .into_iter()
            .map(String::from)
            .collect();
        let files = enumerate_files(root, &exts, &excludes).unwrap();
        let rel: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(
            rel,
            vec![".hidden/secret.py", "lib/util.JS", "src/a.py", "src/z.py", "top.py"]
        );
    }

    #[test]
    fn enumerate_missing_root_fails() {
        let err = enumerate_files(Path::new("/no/such/root"), &[], &[]).unwrap_err();
        assert!(matches!(err, PlagiscanError::FileNotFound(_)));
    }

    #[test]
    fn acquire_reuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("algos")).unwrap();
        let source =
            CorpusSource::parse("https://invalid.example/acme/algos.git", dir.path()).unwrap();
        assert_eq!(source.acquire().unwrap(), dir.path().join("algos"));
    }

    #[test]
    fn acquire_clones_missing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let origin = dir.path().join("origin");
        let repo = git2::Repository::init(&origin).unwrap();
        std::fs::write(origin.join("main.py"), "print('hi')\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("main.py")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("tester", "tester@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
            .unwrap();

        let url = format!("file://{}", origin.display());
        let clones = dir.path().join("clones");
        let source = CorpusSource::parse(&url, &clones).unwrap();
        assert_eq!(source.name(), "origin");

        let root = source.acquire().unwrap();
        assert!(root.join("main.py").exists());
    }

    #[test]
    fn unreachable_remote_is_git_error() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("file://{}/missing-repo", dir.path().display());
        let source = CorpusSource::parse(&url, &dir.path().join("clones")).unwrap();
        assert!(matches!(source.acquire(), Err(PlagiscanError::Git(_))));
    }
}
