//! Lexer-free comment and docstring scrubbing.
//!
//! Removes comment and triple-quoted string bodies before chunking so that
//! retrieval compares code rather than prose. Removed spans are replaced by
//! as many newlines as they contained, so the output always has the same
//! number of lines as the input. This is a best-effort lexical scrub: it
//! never fails, and anything it cannot pair up is left as-is.

/// Comment syntax applied for one file extension.
///
/// # Examples
///
/// ```
/// use plagiscan_index::normalize::CommentRules;
///
/// let rules = CommentRules::for_extension(".py");
/// assert_eq!(rules.line_marker, Some("#"));
/// assert!(rules.triple_quotes);
///
/// let rules = CommentRules::for_extension("java");
/// assert_eq!(rules.block, Some(("/*", "*/")));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentRules {
    /// Marker that turns a whole line into a comment when it is the first
    /// non-whitespace token.
    pub line_marker: Option<&'static str>,
    /// Paired block-comment delimiters.
    pub block: Option<(&'static str, &'static str)>,
    /// Strip `"""` and `'''` string bodies.
    pub triple_quotes: bool,
}

impl CommentRules {
    /// Look up the rules for an extension (with or without the leading dot).
    pub fn for_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "py" | "pyw" => Self {
                line_marker: Some("#"),
                block: None,
                triple_quotes: true,
            },
            "rb" | "sh" | "bash" | "pl" | "r" => Self {
                line_marker: Some("#"),
                ..Self::default()
            },
            "js" | "jsx" | "mjs" | "ts" | "tsx" | "java" | "c" | "cpp" | "cc" | "cxx" | "h"
            | "hpp" | "hh" | "cs" | "go" | "rs" | "kt" | "kts" | "swift" | "scala" | "php" => {
                Self {
                    line_marker: Some("//"),
                    block: Some(("/*", "*/")),
                    triple_quotes: false,
                }
            }
            "html" | "htm" | "xml" | "vue" | "svelte" => Self {
                line_marker: None,
                block: Some(("<!--", "-->")),
                triple_quotes: false,
            },
            _ => Self::default(),
        }
    }

    fn is_empty(&self) -> bool {
        self.line_marker.is_none() && self.block.is_none() && !self.triple_quotes
    }
}

/// Strip comments and docstrings from `text` according to its extension.
///
/// The result has exactly as many `\n` characters as the input, and
/// normalizing it again returns it unchanged.
///
/// # Examples
///
/// ```
/// use plagiscan_index::normalize::normalize;
///
/// let src = "# header\ndef f():\n    \"\"\"Doc\n    string.\"\"\"\n    return 1\n";
/// let out = normalize(src, "py");
/// assert_eq!(out, "\ndef f():\n    \n\n    return 1\n");
/// assert_eq!(out.lines().count(), src.lines().count());
/// ```
pub fn normalize(text: &str, extension: &str) -> String {
    let rules = CommentRules::for_extension(extension);
    if rules.is_empty() {
        return text.to_string();
    }

    // Every pass that changes the text makes it strictly shorter, so this
    // reaches a fixed point.
    let mut current = scrub_once(text, rules);
    loop {
        let next = scrub_once(&current, rules);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn scrub_once(text: &str, rules: CommentRules) -> String {
    let mut out = match rules.line_marker {
        Some(marker) => blank_line_comments(text, marker),
        None => text.to_string(),
    };
    if let Some((open, close)) = rules.block {
        out = strip_block_comments(&out, open, close);
    }
    if rules.triple_quotes {
        out = strip_triple_quoted(&out, "\"\"\"");
        out = strip_triple_quoted(&out, "'''");
    }
    out
}

/// Empty every line whose first non-whitespace token is `marker`.
fn blank_line_comments(text: &str, marker: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.trim_start().starts_with(marker) {
                ""
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    InCode,
    /// Inside a block comment whose opener starts at this byte offset.
    InBlockComment { start: usize },
}

/// Replace `open ... close` spans with their newlines.
///
/// An opener without a matching closer leaves the rest of the text verbatim.
fn strip_block_comments(text: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = ScanState::InCode;
    let mut copied_to = 0;
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        match state {
            ScanState::InCode if rest.starts_with(open) => {
                out.push_str(&text[copied_to..i]);
                copied_to = i;
                state = ScanState::InBlockComment { start: i };
                i += open.len();
            }
            ScanState::InBlockComment { start } if rest.starts_with(close) => {
                let end = i + close.len();
                push_newlines(&mut out, &text[start..end]);
                state = ScanState::InCode;
                copied_to = end;
                i = end;
            }
            _ => {
                i += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    // An unmatched opener leaves `copied_to` at the opener.
    out.push_str(&text[copied_to..]);
    out
}

/// Replace `delim ... delim` spans with their newlines, scanning left to right.
///
/// An unterminated literal leaves the rest of the text verbatim.
fn strip_triple_quoted(text: &str, delim: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(delim) {
        let body_start = start + delim.len();
        let Some(body_len) = rest[body_start..].find(delim) else {
            break;
        };
        let end = body_start + body_len + delim.len();
        out.push_str(&rest[..start]);
        push_newlines(&mut out, &rest[start..end]);
        rest = &rest[end..];
    }

    out.push_str(rest);
    out
}

fn push_newlines(out: &mut String, removed: &str) {
    let count = removed.matches('\n').count();
    out.extend(std::iter::repeat('\n').take(count));
}
