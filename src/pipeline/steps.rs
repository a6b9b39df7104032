//! Reusable step kinds. File-class modules configure these with their own
//! fragments and anchor chains.

use regex::Regex;
use tracing::{debug, info};

use super::Step;
use crate::diagnostics::{DiagnosticKind, DiagnosticSink, Platform};
use crate::patch::anchor::{self, Recognizer};
use crate::patch::block::{self, BlockOutcome, BlockSpec, SimpleBlockField};
use crate::patch::inject::{self, Fragment, Outcome};
use crate::patch::resources::{self, MarkupEdit, ResourceEntry};

/// Ensure a group of whole lines (imports) is present.
#[derive(Debug)]
pub struct ImportStep {
    pub platform: Platform,
    pub code: &'static str,
    pub lines: Vec<String>,
    /// Substrings that mean the imports are already satisfied.
    pub alternates: Vec<String>,
    /// Lines used instead of `lines` when the buffer contains the marker.
    pub dialect_lines: Option<(&'static str, Vec<String>)>,
    pub chain: Vec<Recognizer>,
}

impl Step for ImportStep {
    fn name(&self) -> &'static str {
        self.code
    }

    fn apply(&self, buffer: String, sink: &mut DiagnosticSink) -> String {
        let lines = match &self.dialect_lines {
            Some((marker, lines)) if buffer.contains(marker) => lines,
            _ => &self.lines,
        };
        let result = inject::ensure_lines(buffer, self.code, lines, &self.alternates, &self.chain);
        if result.outcome == Outcome::AnchorNotFound {
            sink.not_found(self.platform, self.code, "no import anchor found; imports not added");
        }
        result.buffer
    }
}

/// Insert a fragment at the first anchor of a chain, optionally requiring an
/// enclosing scope to exist first.
#[derive(Debug)]
pub struct InsertStep {
    pub platform: Platform,
    pub code: &'static str,
    pub fragment: Fragment,
    /// Header of a scope that must exist, with a human name for the message.
    pub required_scope: Option<(Regex, &'static str)>,
    pub chain: Vec<Recognizer>,
    pub scope_end: Option<Recognizer>,
    /// Recognizers whose placement is a guess and should be reviewed.
    pub low_confidence: Vec<&'static str>,
    /// Diagnostic code for low-confidence placements; defaults to `code`.
    pub fallback_code: Option<&'static str>,
}

impl Step for InsertStep {
    fn name(&self) -> &'static str {
        self.code
    }

    fn apply(&self, buffer: String, sink: &mut DiagnosticSink) -> String {
        if self.fragment.is_present(&buffer) {
            debug!(step = self.code, "fragment already present");
            return buffer;
        }

        if let Some((header, what)) = &self.required_scope {
            if anchor::find_scope(&buffer, header).is_none() {
                sink.not_found(
                    self.platform,
                    self.code,
                    format!("{what} not found; {} skipped", self.fragment.name),
                );
                return buffer;
            }
        }

        let anchor = anchor::resolve(&buffer, &self.chain);
        let result = inject::inject(buffer, &self.fragment, anchor, self.scope_end.as_ref());
        match result.outcome {
            Outcome::AnchorNotFound => sink.not_found(
                self.platform,
                self.code,
                format!("no anchor found for {}; not inserted", self.fragment.name),
            ),
            Outcome::Inserted { recognizer } if self.low_confidence.contains(&recognizer) => sink.push(
                self.platform,
                DiagnosticKind::Fallback,
                self.fallback_code.unwrap_or(self.code),
                format!(
                    "{} inserted using fallback anchor '{recognizer}'; review placement",
                    self.fragment.name
                ),
            ),
            Outcome::Inserted { recognizer } => {
                info!(step = self.code, recognizer, "fragment inserted");
            }
            Outcome::Replaced | Outcome::AlreadyPresent => {}
        }
        result.buffer
    }
}

/// One known shape of a method and the body that replaces it.
#[derive(Debug)]
pub struct MethodVariant {
    pub header: Regex,
    pub body: String,
    /// Content marker selecting this variant's body when inserting.
    pub dialect_marker: Option<&'static str>,
}

/// Replace an existing method with the configured body, or insert it when
/// no known variant exists.
#[derive(Debug)]
pub struct MethodStep {
    pub platform: Platform,
    pub code: &'static str,
    pub method: &'static str,
    /// Tried in order; the first located scope is replaced.
    pub variants: Vec<MethodVariant>,
    pub chain: Vec<Recognizer>,
}

impl MethodStep {
    fn insertion_body(&self, buffer: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.dialect_marker.is_some_and(|m| buffer.contains(m)))
            .or_else(|| self.variants.iter().find(|v| v.dialect_marker.is_none()))
            .map(|v| v.body.as_str())
    }
}

impl Step for MethodStep {
    fn name(&self) -> &'static str {
        self.code
    }

    fn apply(&self, buffer: String, sink: &mut DiagnosticSink) -> String {
        for variant in &self.variants {
            if anchor::find_scope(&buffer, &variant.header).is_some() {
                let result = inject::replace_scope(buffer, &variant.header, &variant.body);
                debug!(step = self.code, outcome = ?result.outcome, "method variant located");
                return result.buffer;
            }
        }

        let Some(body) = self.insertion_body(&buffer) else {
            sink.not_found(
                self.platform,
                self.code,
                format!("no {} body applies to this file", self.method),
            );
            return buffer;
        };
        let fragment = Fragment::new(self.method, body).with_blank_line_before();
        let anchor = anchor::resolve(&buffer, &self.chain);
        let result = inject::inject(buffer, &fragment, anchor, None);
        if result.outcome == Outcome::AnchorNotFound {
            sink.not_found(
                self.platform,
                self.code,
                format!("could not find a place to insert {}", self.method),
            );
        }
        result.buffer
    }
}

/// Append a line at the end of the file when absent.
#[derive(Debug)]
pub struct AppendLineStep {
    pub code: &'static str,
    pub line: String,
}

impl Step for AppendLineStep {
    fn name(&self) -> &'static str {
        self.code
    }

    fn apply(&self, buffer: String, _sink: &mut DiagnosticSink) -> String {
        let line = self.line.trim();
        if line.is_empty() || buffer.contains(line) {
            return buffer;
        }
        let head = buffer.trim_end();
        if head.is_empty() {
            format!("{line}\n")
        } else {
            format!("{head}\n\n{line}\n")
        }
    }
}

/// Ensure `scope { parent { child { field } } }` for each `(child, field)`,
/// where `scope` must already exist.
#[derive(Debug)]
pub struct NestedFieldStep {
    pub platform: Platform,
    pub code: &'static str,
    pub scope: String,
    pub parent: String,
    pub fields: Vec<(String, String)>,
}

impl Step for NestedFieldStep {
    fn name(&self) -> &'static str {
        self.code
    }

    fn apply(&self, buffer: String, sink: &mut DiagnosticSink) -> String {
        if block::find_block_header(&buffer, &self.scope).is_none() {
            sink.not_found(
                self.platform,
                self.code,
                format!("'{}' block not found; '{}' fields skipped", self.scope, self.parent),
            );
            return buffer;
        }

        let mut buffer = buffer;
        for (child, field) in &self.fields {
            // Re-located every round: the previous edit moved the offsets.
            let Some(header) = block::find_block_header(&buffer, &self.scope) else {
                break;
            };
            let spec = BlockSpec::nested(&self.parent, child, field, &header.indent);
            let edit = block::edit_block_inner(&buffer, &header, |inner| block::ensure_nested_field(inner, &spec));
            match edit.outcome {
                BlockOutcome::BraceNotFound => {
                    sink.not_found(
                        self.platform,
                        self.code,
                        format!(
                            "unbalanced braces around '{}'/'{}'; '{child}' field skipped",
                            self.scope, self.parent
                        ),
                    );
                    return buffer;
                }
                BlockOutcome::AlreadyPresent => {}
                outcome => {
                    info!(step = self.code, block = %child, ?outcome, "block field ensured");
                    buffer = edit.content;
                }
            }
        }
        buffer
    }
}

/// Ensure a single assignment inside a simple top-level block.
#[derive(Debug)]
pub struct SimpleFieldStep {
    pub platform: Platform,
    pub code: &'static str,
    pub field: SimpleBlockField,
    /// Block after which a missing block is created.
    pub after: Option<String>,
}

impl Step for SimpleFieldStep {
    fn name(&self) -> &'static str {
        self.code
    }

    fn apply(&self, buffer: String, sink: &mut DiagnosticSink) -> String {
        let edit = self.field.ensure(&buffer, self.after.as_deref());
        match edit.outcome {
            BlockOutcome::BraceNotFound => {
                sink.not_found(
                    self.platform,
                    self.code,
                    format!("unbalanced braces in '{}' block; field skipped", self.field.block),
                );
                buffer
            }
            BlockOutcome::AlreadyPresent => buffer,
            _ => edit.content,
        }
    }
}

/// Markup dialect of a resource file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    StringsXml,
    PropertyList,
}

/// Upsert key/value entries into a resource file.
#[derive(Debug)]
pub struct ResourceStep {
    pub platform: Platform,
    pub code: &'static str,
    pub markup: Markup,
    pub entries: Vec<ResourceEntry>,
}

impl Step for ResourceStep {
    fn name(&self) -> &'static str {
        self.code
    }

    fn apply(&self, buffer: String, sink: &mut DiagnosticSink) -> String {
        let edit = match self.markup {
            Markup::StringsXml => resources::apply_to_strings_xml(&buffer, &self.entries),
            Markup::PropertyList => resources::apply_to_plist(&buffer, &self.entries),
        };
        match edit {
            MarkupEdit::Edited(out) => out,
            MarkupEdit::Unsupported => {
                sink.push(
                    self.platform,
                    DiagnosticKind::UnsupportedFileDialect,
                    self.code,
                    "resource file has no recognizable container; entries not written",
                );
                buffer
            }
        }
    }
}
