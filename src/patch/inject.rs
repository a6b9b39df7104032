//! Detect-or-insert of text fragments at resolved anchors.
//!
//! Presence is a literal substring test on trimmed text, either across the
//! whole buffer or inside one enclosing scope. That is deliberately weaker
//! than semantic equality: a fragment reformatted by hand is not recognized.

use regex::Regex;
use tracing::debug;

use super::anchor::{self, Anchor, Recognizer, Scope};

/// A logically atomic unit of text the engine ensures is present once.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub name: String,
    pub text: String,
    /// Substrings that count as "already present". Defaults to the trimmed
    /// text itself.
    markers: Vec<String>,
    /// Limit the presence check to this scope when it exists.
    scope: Option<Regex>,
    /// Separate the inserted text from what precedes it with a blank line.
    blank_line_before: bool,
}

impl Fragment {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            name: name.into(),
            markers: vec![text.trim().to_owned()],
            text,
            scope: None,
            blank_line_before: false,
        }
    }

    /// Replace the presence markers. Any one of them present means the
    /// fragment is present.
    #[must_use]
    pub fn with_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers = markers
            .into_iter()
            .map(|m| m.into().trim().to_owned())
            .filter(|m| !m.is_empty())
            .collect();
        self
    }

    #[must_use]
    pub fn within(mut self, scope: Regex) -> Self {
        self.scope = Some(scope);
        self
    }

    #[must_use]
    pub const fn with_blank_line_before(mut self) -> Self {
        self.blank_line_before = true;
        self
    }

    /// Whether the fragment already occurs in `buffer`.
    pub fn is_present(&self, buffer: &str) -> bool {
        let haystack = self
            .scope
            .as_ref()
            .and_then(|re| anchor::find_scope(buffer, re))
            .map_or(buffer, |scope| &buffer[scope.inner()]);
        self.markers.iter().any(|m| haystack.contains(m.as_str()))
    }
}

/// What happened to a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Inserted { recognizer: &'static str },
    Replaced,
    AlreadyPresent,
    /// Neither the anchor nor the scope-end fallback was found. The buffer
    /// is unchanged and the caller records a diagnostic.
    AnchorNotFound,
}

impl Outcome {
    pub const fn changed(&self) -> bool {
        matches!(self, Self::Inserted { .. } | Self::Replaced)
    }
}

/// Result of one injection: the (possibly) new buffer and what happened.
#[derive(Debug)]
pub struct Injection {
    pub buffer: String,
    pub outcome: Outcome,
}

impl Injection {
    const fn unchanged(buffer: String, outcome: Outcome) -> Self {
        Self { buffer, outcome }
    }
}

/// Ensure `fragment` is present, inserting it at `anchor` when it is not.
///
/// With no anchor, `scope_end` is tried as the fallback placement. When that
/// is absent too the buffer is returned untouched with
/// [`Outcome::AnchorNotFound`].
pub fn inject(
    buffer: String,
    fragment: &Fragment,
    anchor: Option<Anchor>,
    scope_end: Option<&Recognizer>,
) -> Injection {
    if fragment.is_present(&buffer) {
        debug!(fragment = %fragment.name, "fragment already present");
        return Injection::unchanged(buffer, Outcome::AlreadyPresent);
    }

    let Some(anchor) = anchor.or_else(|| scope_end.and_then(|r| r.recognize(&buffer))) else {
        debug!(fragment = %fragment.name, "no anchor for fragment");
        return Injection::unchanged(buffer, Outcome::AnchorNotFound);
    };

    debug!(
        fragment = %fragment.name,
        recognizer = anchor.recognizer,
        "inserting fragment"
    );
    let buffer = splice(
        &buffer,
        anchor.insert_at,
        &fragment.text,
        &anchor.captured_indent,
        fragment.blank_line_before,
    );
    Injection {
        buffer,
        outcome: Outcome::Inserted {
            recognizer: anchor.recognizer,
        },
    }
}

/// Insert `text` at `at`, re-indented to `indent`, as whole lines.
pub fn splice(buffer: &str, at: usize, text: &str, indent: &str, blank_line_before: bool) -> String {
    let at = at.min(buffer.len());
    let body = reindent(text, indent);

    let mut result = String::with_capacity(buffer.len() + body.len() + 2);
    result.push_str(&buffer[..at]);
    if at > 0 && !buffer[..at].ends_with('\n') {
        result.push('\n');
    }
    if blank_line_before && at > 0 && !buffer[..at].ends_with("\n\n") {
        result.push('\n');
    }
    result.push_str(&body);
    result.push('\n');
    result.push_str(&buffer[at..]);
    result
}

/// Strip the common indentation of `text` and prefix every non-blank line
/// with `indent`. Leading and trailing blank lines are dropped.
pub fn reindent(text: &str, indent: &str) -> String {
    let lines: Vec<&str> = text.trim_matches('\n').lines().collect();
    let first = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
    let last = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(first, |i| i + 1);
    let lines = &lines[first..last];

    let min_indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else if line.is_char_boundary(min_indent) {
                format!("{indent}{}", line[min_indent..].trim_end())
            } else {
                format!("{indent}{}", line.trim())
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ensure each of `lines` exists as a whole (trimmed) line of `buffer`.
///
/// Missing lines are inserted together, in the given order, at the first
/// anchor `chain` resolves. `alternates` are extra substrings that make the
/// whole group count as present.
pub fn ensure_lines(
    buffer: String,
    name: &str,
    lines: &[String],
    alternates: &[String],
    chain: &[Recognizer],
) -> Injection {
    if alternates.iter().any(|a| !a.is_empty() && buffer.contains(a.as_str())) {
        return Injection::unchanged(buffer, Outcome::AlreadyPresent);
    }

    let mut seen: std::collections::HashSet<&str> = buffer.lines().map(str::trim).collect();
    let missing: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && seen.insert(l))
        .collect();

    if missing.is_empty() {
        return Injection::unchanged(buffer, Outcome::AlreadyPresent);
    }

    let fragment = Fragment::new(name, missing.join("\n")).with_markers(Vec::<String>::new());
    let anchor = anchor::resolve(&buffer, chain);
    inject(buffer, &fragment, anchor, None)
}

/// Replace the whole scope opened by `header` (header line through closing
/// brace) with `replacement`, re-indented to the header line.
///
/// A scope whose lines already equal `replacement` (ignoring indentation) is
/// left alone. A scope that cannot be located yields
/// [`Outcome::AnchorNotFound`].
pub fn replace_scope(buffer: String, header: &Regex, replacement: &str) -> Injection {
    let Some(Scope {
        header_start,
        close,
        ..
    }) = anchor::find_scope(&buffer, header)
    else {
        return Injection::unchanged(buffer, Outcome::AnchorNotFound);
    };
    let start = anchor::line_start(&buffer, header_start);
    let indent = anchor::indent_at(&buffer, start).to_owned();

    if same_lines(&buffer[start..=close], replacement) {
        return Injection::unchanged(buffer, Outcome::AlreadyPresent);
    }

    let mut result = String::with_capacity(buffer.len() + replacement.len());
    result.push_str(&buffer[..start]);
    result.push_str(&reindent(replacement, &indent));
    result.push_str(&buffer[close + 1..]);
    Injection {
        buffer: result,
        outcome: Outcome::Replaced,
    }
}

/// Replace the first match of `pattern` with `replacement` unless
/// `replacement` is already present.
pub fn replace_statement(buffer: String, pattern: &Regex, replacement: &str) -> Injection {
    if buffer.contains(replacement) {
        return Injection::unchanged(buffer, Outcome::AlreadyPresent);
    }
    let Some(m) = pattern.find(&buffer) else {
        return Injection::unchanged(buffer, Outcome::AnchorNotFound);
    };
    let mut result = String::with_capacity(buffer.len() + replacement.len());
    result.push_str(&buffer[..m.start()]);
    result.push_str(replacement);
    result.push_str(&buffer[m.end()..]);
    Injection {
        buffer: result,
        outcome: Outcome::Replaced,
    }
}

fn same_lines(a: &str, b: &str) -> bool {
    let norm = |s: &str| -> Vec<String> {
        s.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect()
    };
    norm(a) == norm(b)
}
