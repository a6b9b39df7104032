//! Anchor recognizers and the priority-ordered resolver.
//!
//! A [`Recognizer`] knows one kind of surrounding construct (the last import
//! line, a statement line, the end of a named scope, ...) and reports where a
//! fragment would go relative to it. [`resolve`] walks an ordered chain of
//! recognizers and returns the first hit; the order of a chain is part of its
//! behavior.
//!
//! Every returned [`Anchor`] has `insert_at` on a line boundary (or on a lone
//! closing brace when the scope is written on one line), together with the
//! indentation inserted lines should carry.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::brace;
use crate::error::PatchResult;

/// Indentation unit used when a scope gives no better evidence.
pub const INDENT_UNIT: &str = "    ";

/// Closed set of anchor kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorKind {
    FileStart,
    LastImportLine,
    PackageDeclaration,
    StatementLine,
    SuperCallLine,
    MethodHeader,
    MemberDeclaration,
    ScopeEnd,
    ClosingMarker,
}

/// A located insertion point. Computed fresh for every step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub kind: AnchorKind,
    /// Name of the recognizer that produced this anchor.
    pub recognizer: &'static str,
    pub match_start: usize,
    pub match_end: usize,
    /// Byte offset where the fragment is spliced.
    pub insert_at: usize,
    pub captured_indent: String,
}

/// A brace-delimited scope located by its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub header_start: usize,
    pub open: usize,
    pub close: usize,
}

impl Scope {
    /// Byte range strictly between the braces.
    pub const fn inner(&self) -> std::ops::Range<usize> {
        self.open + 1..self.close
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    FileStart,
    /// After the last line whose trimmed text starts with one of the prefixes.
    LastLineWithPrefix(Vec<String>),
    /// After the first line whose trimmed text starts with one of the prefixes.
    FirstLineWithPrefix(Vec<String>),
    /// After the line holding the first match.
    AfterLine(Regex),
    /// Before the line holding the first match.
    BeforeLine(Regex),
    /// Directly after the opening brace line of the first matching scope.
    ScopeStart(Regex),
    /// After the closing brace line of the first matching scope.
    AfterScope(Regex),
    /// Before the closing brace of the first matching scope.
    ScopeEnd(Regex),
    /// Before the last closing brace in the buffer.
    LastClosingBrace,
    /// Run the inner matcher only inside the first matching scope.
    Within(Regex, Box<Matcher>),
}

/// One entry of an anchor chain.
#[derive(Debug, Clone)]
pub struct Recognizer {
    name: &'static str,
    kind: AnchorKind,
    matcher: Matcher,
}

fn compile(pattern: &str) -> PatchResult<Regex> {
    Ok(RegexBuilder::new(pattern).multi_line(true).build()?)
}

impl Recognizer {
    fn new(name: &'static str, kind: AnchorKind, matcher: Matcher) -> Self {
        Self {
            name,
            kind,
            matcher,
        }
    }

    pub fn file_start(name: &'static str) -> Self {
        Self::new(name, AnchorKind::FileStart, Matcher::FileStart)
    }

    pub fn last_line_with_prefix(name: &'static str, kind: AnchorKind, prefixes: &[&str]) -> Self {
        let prefixes = prefixes.iter().map(|p| (*p).to_owned()).collect();
        Self::new(name, kind, Matcher::LastLineWithPrefix(prefixes))
    }

    pub fn first_line_with_prefix(name: &'static str, kind: AnchorKind, prefixes: &[&str]) -> Self {
        let prefixes = prefixes.iter().map(|p| (*p).to_owned()).collect();
        Self::new(name, kind, Matcher::FirstLineWithPrefix(prefixes))
    }

    pub fn after_line(name: &'static str, kind: AnchorKind, pattern: &str) -> PatchResult<Self> {
        Ok(Self::new(name, kind, Matcher::AfterLine(compile(pattern)?)))
    }

    pub fn before_line(name: &'static str, kind: AnchorKind, pattern: &str) -> PatchResult<Self> {
        Ok(Self::new(name, kind, Matcher::BeforeLine(compile(pattern)?)))
    }

    pub fn scope_start(name: &'static str, header: &str) -> PatchResult<Self> {
        Ok(Self::new(
            name,
            AnchorKind::MethodHeader,
            Matcher::ScopeStart(compile(header)?),
        ))
    }

    pub fn after_scope(name: &'static str, header: &str) -> PatchResult<Self> {
        Ok(Self::new(
            name,
            AnchorKind::ScopeEnd,
            Matcher::AfterScope(compile(header)?),
        ))
    }

    pub fn scope_end(name: &'static str, header: &str) -> PatchResult<Self> {
        Ok(Self::new(
            name,
            AnchorKind::ScopeEnd,
            Matcher::ScopeEnd(compile(header)?),
        ))
    }

    pub fn last_closing_brace(name: &'static str) -> Self {
        Self::new(name, AnchorKind::ScopeEnd, Matcher::LastClosingBrace)
    }

    /// Restrict this recognizer to the inside of the scope opened by `header`.
    pub fn within(self, header: &str) -> PatchResult<Self> {
        Ok(Self {
            matcher: Matcher::Within(compile(header)?, Box::new(self.matcher)),
            ..self
        })
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn kind(&self) -> AnchorKind {
        self.kind
    }

    /// Test this recognizer alone against `buffer`.
    pub fn recognize(&self, buffer: &str) -> Option<Anchor> {
        let hit = self.matcher.find(buffer)?;
        Some(Anchor {
            kind: self.kind,
            recognizer: self.name,
            match_start: hit.match_start,
            match_end: hit.match_end,
            insert_at: hit.insert_at,
            captured_indent: hit.indent,
        })
    }
}

/// Return the anchor of the first recognizer in `chain` that matches.
///
/// Later recognizers are never consulted once an earlier one matches.
pub fn resolve(buffer: &str, chain: &[Recognizer]) -> Option<Anchor> {
    for recognizer in chain {
        if let Some(anchor) = recognizer.recognize(buffer) {
            debug!(recognizer = recognizer.name, insert_at = anchor.insert_at, "anchor resolved");
            return Some(anchor);
        }
        debug!(recognizer = recognizer.name, "anchor not present");
    }
    None
}

/// Locate the first scope whose header matches `header`.
///
/// The opening brace is the first `{` at or after the header match start.
pub fn find_scope(buffer: &str, header: &Regex) -> Option<Scope> {
    let m = header.find(buffer)?;
    let open = m.start() + buffer[m.start()..].find('{')?;
    let close = brace::match_brace(buffer, open)?;
    Some(Scope {
        header_start: m.start(),
        open,
        close,
    })
}

struct Hit {
    match_start: usize,
    match_end: usize,
    insert_at: usize,
    indent: String,
}

impl Matcher {
    fn find(&self, buffer: &str) -> Option<Hit> {
        match self {
            Self::FileStart => Some(Hit {
                match_start: 0,
                match_end: 0,
                insert_at: 0,
                indent: String::new(),
            }),
            Self::LastLineWithPrefix(prefixes) => line_with_prefix(buffer, prefixes, true),
            Self::FirstLineWithPrefix(prefixes) => line_with_prefix(buffer, prefixes, false),
            Self::AfterLine(re) => {
                let m = re.find(buffer)?;
                let start = line_start(buffer, m.start());
                Some(Hit {
                    match_start: m.start(),
                    match_end: m.end(),
                    insert_at: if m.as_str().ends_with('\n') {
                        m.end()
                    } else {
                        next_line_start(buffer, m.end())
                    },
                    indent: indent_at(buffer, start).to_owned(),
                })
            }
            Self::BeforeLine(re) => {
                let m = re.find(buffer)?;
                let start = line_start(buffer, m.start());
                Some(Hit {
                    match_start: m.start(),
                    match_end: m.end(),
                    insert_at: start,
                    indent: indent_at(buffer, start).to_owned(),
                })
            }
            Self::ScopeStart(re) => {
                let scope = find_scope(buffer, re)?;
                Some(Hit {
                    match_start: scope.header_start,
                    match_end: scope.open + 1,
                    insert_at: next_line_start(buffer, scope.open),
                    indent: scope_member_indent(buffer, &scope),
                })
            }
            Self::AfterScope(re) => {
                let scope = find_scope(buffer, re)?;
                let header_line = line_start(buffer, scope.header_start);
                Some(Hit {
                    match_start: scope.header_start,
                    match_end: scope.close + 1,
                    insert_at: next_line_start(buffer, scope.close),
                    indent: indent_at(buffer, header_line).to_owned(),
                })
            }
            Self::ScopeEnd(re) => {
                let scope = find_scope(buffer, re)?;
                Some(scope_end_hit(buffer, &scope))
            }
            Self::LastClosingBrace => {
                let close = buffer.rfind('}')?;
                let open = matching_open(buffer, close)?;
                let scope = Scope {
                    header_start: line_start(buffer, open),
                    open,
                    close,
                };
                Some(scope_end_hit(buffer, &scope))
            }
            Self::Within(re, inner) => {
                let scope = find_scope(buffer, re)?;
                let range = scope.inner();
                let hit = inner.find(&buffer[range.clone()])?;
                Some(Hit {
                    match_start: hit.match_start + range.start,
                    match_end: hit.match_end + range.start,
                    insert_at: hit.insert_at + range.start,
                    indent: hit.indent,
                })
            }
        }
    }
}

fn line_with_prefix(buffer: &str, prefixes: &[String], last: bool) -> Option<Hit> {
    let mut found: Option<(usize, &str)> = None;
    let mut offset = 0;
    for line in buffer.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if prefixes.iter().any(|p| trimmed.starts_with(p.as_str())) {
            found = Some((offset, line));
            if !last {
                break;
            }
        }
        offset += line.len();
    }

    let (start, line) = found?;
    let content_end = start + line.trim_end_matches(['\n', '\r']).len();
    Some(Hit {
        match_start: start,
        match_end: content_end,
        insert_at: start + line.len(),
        indent: indent_at(buffer, start).to_owned(),
    })
}

fn scope_end_hit(buffer: &str, scope: &Scope) -> Hit {
    let close_line = line_start(buffer, scope.close);
    let brace_on_own_line = buffer[close_line..scope.close].trim().is_empty();
    Hit {
        match_start: scope.header_start,
        match_end: scope.close + 1,
        insert_at: if brace_on_own_line { close_line } else { scope.close },
        indent: scope_member_indent(buffer, scope),
    }
}

/// Indentation of the last non-blank line inside `scope`, or the closing
/// brace line's indentation plus one unit.
fn scope_member_indent(buffer: &str, scope: &Scope) -> String {
    let inner = &buffer[scope.inner()];
    if let Some(line) = inner.lines().rev().find(|l| !l.trim().is_empty()) {
        // A member written on the header line carries no useful indentation.
        if inner.contains('\n') && !inner.trim_start_matches([' ', '\t']).starts_with(line.trim()) {
            return leading_ws(line).to_owned();
        }
    }
    let close_line = line_start(buffer, scope.close);
    let header_line = line_start(buffer, scope.header_start);
    let base = if buffer[close_line..scope.close].trim().is_empty() {
        indent_at(buffer, close_line)
    } else {
        indent_at(buffer, header_line)
    };
    format!("{base}{INDENT_UNIT}")
}

fn matching_open(buffer: &str, close: usize) -> Option<usize> {
    let bytes = buffer.as_bytes();
    let mut depth = 0usize;
    for index in (0..=close).rev() {
        match bytes[index] {
            b'}' => depth += 1,
            b'{' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Byte offset of the start of the line containing `index`.
pub fn line_start(buffer: &str, index: usize) -> usize {
    buffer[..char_floor(buffer, index)]
        .rfind('\n')
        .map_or(0, |nl| nl + 1)
}

/// Byte offset just past the newline ending the line containing `index`.
pub fn next_line_start(buffer: &str, index: usize) -> usize {
    let index = char_floor(buffer, index);
    buffer[index..]
        .find('\n')
        .map_or(buffer.len(), |nl| index + nl + 1)
}

/// Largest char boundary at or below `index`, clamped to the buffer.
fn char_floor(buffer: &str, index: usize) -> usize {
    let mut index = index.min(buffer.len());
    while !buffer.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Leading whitespace of the line starting at `start`.
pub fn indent_at(buffer: &str, start: usize) -> &str {
    leading_ws(&buffer[start..])
}

fn leading_ws(text: &str) -> &str {
    let end = text
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(text.len());
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    const KOTLIN: &str = "package com.example\n\nimport a.B\nimport c.D\n\nclass App {\n    override fun onCreate() {\n        super.onCreate()\n        SoLoader.init(this, false)\n    }\n}\n";

    #[test]
    fn test_last_import_line() {
        let r = Recognizer::last_line_with_prefix("imports", AnchorKind::LastImportLine, &["import "]);
        let anchor = r.recognize(KOTLIN).expect("should match");
        assert_eq!(&KOTLIN[anchor.match_start..anchor.match_end], "import c.D");
        assert!(KOTLIN[anchor.insert_at..].starts_with("\nclass App"));
        assert_eq!(anchor.captured_indent, "");
    }

    #[test]
    fn test_first_line_with_prefix() {
        let r = Recognizer::first_line_with_prefix("package", AnchorKind::PackageDeclaration, &["package "]);
        let anchor = r.recognize(KOTLIN).expect("should match");
        assert_eq!(anchor.match_start, 0);
        assert_eq!(&KOTLIN[..anchor.insert_at], "package com.example\n");
    }

    #[test]
    fn test_after_line_captures_indent() {
        let r = Recognizer::after_line("super", AnchorKind::SuperCallLine, r"super\.onCreate\(\)")
            .expect("valid pattern");
        let anchor = r.recognize(KOTLIN).expect("should match");
        assert_eq!(anchor.captured_indent, "        ");
        assert!(KOTLIN[anchor.insert_at..].starts_with("        SoLoader"));
    }

    #[test]
    fn test_after_line_ending_in_multibyte_char() {
        let buffer = "val hermes = true // activé\nval next = 1\n";
        let r = Recognizer::after_line("hermes", AnchorKind::StatementLine, r"hermes\s*=.*$").expect("valid pattern");
        let anchor = r.recognize(buffer).expect("should match");
        assert_eq!(&buffer[anchor.insert_at..], "val next = 1\n");
    }

    #[test]
    fn test_after_line_match_including_newline() {
        let buffer = "a\nb\nc\n";
        let r = Recognizer::after_line("b", AnchorKind::StatementLine, r"^b\n").expect("valid pattern");
        let anchor = r.recognize(buffer).expect("should match");
        assert_eq!(&buffer[anchor.insert_at..], "c\n");
    }

    #[test]
    fn test_line_offsets_inside_multibyte_char() {
        let buffer = "é\nx";
        assert_eq!(line_start(buffer, 1), 0);
        assert_eq!(next_line_start(buffer, 1), 3);
    }

    #[test]
    fn test_before_line() {
        let r = Recognizer::before_line("soloader", AnchorKind::StatementLine, r"SoLoader\.init")
            .expect("valid pattern");
        let anchor = r.recognize(KOTLIN).expect("should match");
        assert!(KOTLIN[anchor.insert_at..].starts_with("        SoLoader"));
    }

    #[test]
    fn test_scope_end_uses_member_indent() {
        let r = Recognizer::scope_end("on-create-end", r"override fun onCreate\(\)").expect("valid pattern");
        let anchor = r.recognize(KOTLIN).expect("should match");
        assert_eq!(anchor.captured_indent, "        ");
        assert!(KOTLIN[anchor.insert_at..].starts_with("    }\n}"));
    }

    #[test]
    fn test_scope_end_of_empty_block() {
        let text = "android {\n}\n";
        let r = Recognizer::scope_end("android-end", r"^android\s*\{").expect("valid pattern");
        let anchor = r.recognize(text).expect("should match");
        assert_eq!(anchor.captured_indent, INDENT_UNIT);
        assert_eq!(&text[anchor.insert_at..], "}\n");
    }

    #[test]
    fn test_after_scope() {
        let r = Recognizer::after_scope("on-create", r"override fun onCreate\(\)").expect("valid pattern");
        let anchor = r.recognize(KOTLIN).expect("should match");
        assert_eq!(&KOTLIN[anchor.insert_at..], "}\n");
        assert_eq!(anchor.captured_indent, "    ");
    }

    #[test]
    fn test_last_closing_brace() {
        let text = "class A {\n  func f() {\n  }\n}\n";
        let anchor = Recognizer::last_closing_brace("eof").recognize(text).expect("should match");
        assert_eq!(&text[anchor.insert_at..], "}\n");
        assert_eq!(anchor.captured_indent, "  ");
    }

    #[test]
    fn test_within_restricts_search() {
        let text = "fun a() {\n    return x\n}\nfun b() {\n    return y\n}\n";
        let r = Recognizer::before_line("ret", AnchorKind::StatementLine, r"return")
            .and_then(|r| r.within(r"fun b\(\)"))
            .expect("valid pattern");
        let anchor = r.recognize(text).expect("should match");
        assert!(text[anchor.insert_at..].starts_with("    return y"));
    }

    #[test]
    fn test_resolve_prefers_earlier_recognizer() {
        let chain = vec![
            Recognizer::after_line("soloader", AnchorKind::StatementLine, r"SoLoader\.init\(this,.*\)")
                .expect("valid pattern"),
            Recognizer::after_line("super", AnchorKind::SuperCallLine, r"super\.onCreate\(\)")
                .expect("valid pattern"),
        ];
        let anchor = resolve(KOTLIN, &chain).expect("should resolve");
        assert_eq!(anchor.recognizer, "soloader");
    }

    #[test]
    fn test_resolve_none() {
        let chain = vec![
            Recognizer::after_line("missing", AnchorKind::StatementLine, "nothing-here").expect("valid pattern"),
        ];
        assert_eq!(resolve(KOTLIN, &chain), None);
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        assert!(Recognizer::after_line("bad", AnchorKind::StatementLine, "(").is_err());
    }
}
