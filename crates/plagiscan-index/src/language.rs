use std::fmt;

/// Advisory programming-language guess recorded with each chunk.
///
/// Nothing branches on this value; comment stripping is keyed on the raw
/// extension instead.
///
/// # Examples
///
/// ```
/// use plagiscan_index::language::Language;
///
/// assert_eq!(Language::from_extension("py"), Language::Python);
/// assert_eq!(Language::from_extension(".HPP"), Language::Cpp);
/// assert_eq!(Language::from_extension("txt"), Language::Unknown);
/// assert_eq!(Language::Cpp.as_str(), "cpp");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    C,
    Cpp,
    CSharp,
    Go,
    Rust,
    Ruby,
    Php,
    Kotlin,
    Swift,
    Scala,
    Shell,
    Perl,
    R,
    Html,
    Xml,
    Unknown,
}

impl Language {
    /// Guess the language from a file extension (with or without the dot).
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "py" | "pyw" => Language::Python,
            "js" | "jsx" | "mjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            "kt" | "kts" => Language::Kotlin,
            "swift" => Language::Swift,
            "scala" => Language::Scala,
            "sh" | "bash" => Language::Shell,
            "pl" => Language::Perl,
            "r" => Language::R,
            "html" | "htm" | "vue" | "svelte" => Language::Html,
            "xml" => Language::Xml,
            _ => Language::Unknown,
        }
    }

    /// Guess from the extension, falling back to the shebang line when the
    /// extension says nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use plagiscan_index::language::Language;
    ///
    /// assert_eq!(Language::detect("", "#!/usr/bin/env python3\nprint(1)"), Language::Python);
    /// assert_eq!(Language::detect("js", "#!/bin/sh\n"), Language::JavaScript);
    /// assert_eq!(Language::detect("", "plain text"), Language::Unknown);
    /// ```
    pub fn detect(ext: &str, text: &str) -> Self {
        match Self::from_extension(ext) {
            Language::Unknown => Self::from_shebang(text),
            known => known,
        }
    }

    fn from_shebang(text: &str) -> Self {
        let Some(first) = text.lines().next() else {
            return Language::Unknown;
        };
        let Some(command) = first.strip_prefix("#!") else {
            return Language::Unknown;
        };

        // `#!/usr/bin/env python3 -u` names the interpreter in its second word.
        let mut words = command.split_whitespace();
        let program = match words.next() {
            Some(p) if p.ends_with("/env") => words.find(|w| !w.starts_with('-')),
            other => other,
        };
        let Some(program) = program else {
            return Language::Unknown;
        };
        let name = program.rsplit('/').next().unwrap_or(program);
        let name = name.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');

        match name {
            "python" => Language::Python,
            "node" | "nodejs" => Language::JavaScript,
            "ruby" => Language::Ruby,
            "perl" => Language::Perl,
            "php" => Language::Php,
            "Rscript" => Language::R,
            "sh" | "bash" | "zsh" | "dash" | "ksh" => Language::Shell,
            _ => Language::Unknown,
        }
    }

    /// Lowercase name stored in chunk metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
            Language::Scala => "scala",
            Language::Shell => "shell",
            Language::Perl => "perl",
            Language::R => "r",
            Language::Html => "html",
            Language::Xml => "xml",
            Language::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
