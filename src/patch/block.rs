//! Find-or-create of named declarative blocks.
//!
//! Headers are located by a plain line scan (`name {` at the start of a
//! line), then the body is delimited with [`brace::match_brace`]. Only the
//! text of the target block changes; everything around it is copied
//! byte-for-byte.

use regex::Regex;
use tracing::{debug, info};

use super::anchor::{self, INDENT_UNIT};
use super::brace;
use crate::error::PatchResult;

/// Describes "inside block `parent_name`, ensure block `child_name` exists
/// and contains `field`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpec {
    pub parent_name: String,
    pub child_name: String,
    pub field: String,
    pub field_indent: String,
    pub header_indent: String,
    /// Header indentation used when the parent itself must be created.
    pub parent_indent: String,
}

impl BlockSpec {
    /// Block description whose indentation is derived from the indentation of the scope
    /// the parent lives in.
    pub fn nested(
        parent_name: impl Into<String>,
        child_name: impl Into<String>,
        field: impl Into<String>,
        base_indent: &str,
    ) -> Self {
        let parent_indent = format!("{base_indent}{INDENT_UNIT}");
        let header_indent = format!("{parent_indent}{INDENT_UNIT}");
        let field_indent = format!("{header_indent}{INDENT_UNIT}");
        Self {
            parent_name: parent_name.into(),
            child_name: child_name.into(),
            field: field.into(),
            field_indent,
            header_indent,
            parent_indent,
        }
    }
}

/// What a block edit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    AlreadyPresent,
    FieldAdded,
    FieldReplaced,
    BlockCreated,
    /// The parent was absent and was created together with child and field.
    ParentCreated,
    /// A header was found but its braces do not balance.
    BraceNotFound,
}

impl BlockOutcome {
    pub const fn changed(self) -> bool {
        !matches!(self, Self::AlreadyPresent | Self::BraceNotFound)
    }
}

#[derive(Debug)]
pub struct BlockEdit {
    pub content: String,
    pub outcome: BlockOutcome,
}

impl BlockEdit {
    fn unchanged(content: &str, outcome: BlockOutcome) -> Self {
        Self {
            content: content.to_owned(),
            outcome,
        }
    }
}

/// A located `name {` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub line_start: usize,
    pub indent: String,
    pub open: usize,
}

/// Locate the header `name {`.
///
/// A header at brace depth zero (relative to `content`) wins; otherwise the
/// first one at any depth is returned.
pub fn find_block_header(content: &str, name: &str) -> Option<BlockHeader> {
    let mut first_any: Option<BlockHeader> = None;
    let mut depth = 0i64;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        if let Some(header) = header_on_line(line, offset, name) {
            if depth == 0 {
                return Some(header);
            }
            if first_any.is_none() {
                first_any = Some(header);
            }
        }
        depth += brace::depth_at(line, line.len());
        offset += line.len();
    }

    first_any
}

fn header_on_line(line: &str, offset: usize, name: &str) -> Option<BlockHeader> {
    let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
    let rest = line[indent_len..].strip_prefix(name)?;
    let gap = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    if !rest[gap..].starts_with('{') {
        return None;
    }
    Some(BlockHeader {
        line_start: offset,
        indent: line[..indent_len].to_owned(),
        open: offset + indent_len + name.len() + gap,
    })
}

/// Ensure `block_name { ... }` exists in `parent_content` and contains
/// `field`.
///
/// An existing block gets the field appended before its closing brace; a
/// missing block is appended after the parent's trimmed content as
/// `{header_indent}{block_name} {\n{field_indent}{field}\n{header_indent}}\n`.
pub fn ensure_block_with_field(
    parent_content: &str,
    block_name: &str,
    field: &str,
    field_indent: &str,
    header_indent: &str,
) -> BlockEdit {
    let field = field.trim();

    let Some(header) = find_block_header(parent_content, block_name) else {
        info!(block = block_name, "block not found, creating it");
        let block = format!(
            "{header_indent}{block_name} {{\n{field_indent}{field}\n{header_indent}}}\n"
        );
        return BlockEdit {
            content: append_block(parent_content, &block),
            outcome: BlockOutcome::BlockCreated,
        };
    };

    let Some(close) = brace::match_brace(parent_content, header.open) else {
        debug!(block = block_name, "closing brace not found");
        return BlockEdit::unchanged(parent_content, BlockOutcome::BraceNotFound);
    };

    let inner = &parent_content[header.open + 1..close];
    if inner.contains(field) {
        return BlockEdit::unchanged(parent_content, BlockOutcome::AlreadyPresent);
    }

    // Follow the indentation of existing members when there are any.
    let line_indent = inner
        .split_once('\n')
        .and_then(|(_, rest)| rest.lines().rev().find(|l| !l.trim().is_empty()))
        .map_or(field_indent, |l| anchor::indent_at(l, 0));
    let new_inner = if inner.trim().is_empty() {
        format!("\n{line_indent}{field}\n{}", header.indent)
    } else {
        format!("{}\n{line_indent}{field}\n{}", inner.trim_end(), header.indent)
    };

    BlockEdit {
        content: format!(
            "{}{new_inner}{}",
            &parent_content[..=header.open],
            &parent_content[close..]
        ),
        outcome: BlockOutcome::FieldAdded,
    }
}

/// Ensure `spec.parent_name { spec.child_name { spec.field } }` within
/// `content`. A missing parent is created with child and field in one step.
pub fn ensure_nested_field(content: &str, spec: &BlockSpec) -> BlockEdit {
    let Some(header) = find_block_header(content, &spec.parent_name) else {
        info!(block = %spec.parent_name, "parent block not found, creating it");
        let block = format!(
            "{pi}{parent} {{\n{hi}{child} {{\n{fi}{field}\n{hi}}}\n{pi}}}\n",
            pi = spec.parent_indent,
            parent = spec.parent_name,
            hi = spec.header_indent,
            child = spec.child_name,
            fi = spec.field_indent,
            field = spec.field.trim(),
        );
        return BlockEdit {
            content: append_block(content, &block),
            outcome: BlockOutcome::ParentCreated,
        };
    };

    let child_header_indent = format!("{}{INDENT_UNIT}", header.indent);
    edit_block_inner(content, &header, |inner| {
        ensure_block_with_field(
            inner,
            &spec.child_name,
            &spec.field,
            &spec.field_indent,
            &child_header_indent,
        )
    })
}

/// Apply `edit` to the inner content of the block opened at `header`.
pub fn edit_block_inner<F>(content: &str, header: &BlockHeader, edit: F) -> BlockEdit
where
    F: FnOnce(&str) -> BlockEdit,
{
    let Some(close) = brace::match_brace(content, header.open) else {
        return BlockEdit::unchanged(content, BlockOutcome::BraceNotFound);
    };

    let inner = &content[header.open + 1..close];
    // `{}` written on one line: give created children a line of their own.
    let normalized;
    let inner = if inner.trim().is_empty() && !inner.contains('\n') {
        normalized = format!("\n{}", header.indent);
        normalized.as_str()
    } else {
        inner
    };

    let result = edit(inner);
    if !result.outcome.changed() {
        return BlockEdit::unchanged(content, result.outcome);
    }

    BlockEdit {
        content: format!(
            "{}{}{}",
            &content[..=header.open],
            result.content,
            &content[close..]
        ),
        outcome: result.outcome,
    }
}

/// Append `block` after the trimmed content of `parent`, keeping the
/// indentation that preceded the parent's closing brace.
fn append_block(parent: &str, block: &str) -> String {
    let head = parent.trim_end();
    let trailing = &parent[head.len()..];
    let tail = trailing.rfind('\n').map_or("", |nl| &trailing[nl + 1..]);
    let separator = if !head.is_empty() || parent.contains('\n') {
        "\n"
    } else {
        ""
    };
    format!("{head}{separator}{block}{tail}")
}

/// A `key = value` field kept inside a named top-level block, replacing a
/// commented-out or differing assignment of the same key.
#[derive(Debug, Clone)]
pub struct SimpleBlockField {
    pub block: String,
    pub field: String,
    assignment: Regex,
    commented: Regex,
}

impl SimpleBlockField {
    pub fn new(block: impl Into<String>, key: &str, field: impl Into<String>) -> PatchResult<Self> {
        let key = regex::escape(key);
        Ok(Self {
            block: block.into(),
            field: field.into().trim().to_owned(),
            assignment: Regex::new(&format!(r"(?m)^([ \t]*){key}\s*=.*$"))?,
            commented: Regex::new(&format!(r"(?m)^([ \t]*)//\s*{key}\s*=.*$"))?,
        })
    }

    /// Ensure the field in `content`. A missing block is created after the
    /// block named `after` when that exists, otherwise at the end.
    pub fn ensure(&self, content: &str, after: Option<&str>) -> BlockEdit {
        let Some(header) = find_block_header(content, &self.block) else {
            info!(block = %self.block, "block not found, creating it");
            return BlockEdit {
                content: self.create(content, after),
                outcome: BlockOutcome::BlockCreated,
            };
        };

        let field_indent = format!("{}{INDENT_UNIT}", header.indent);
        edit_block_inner(content, &header, |inner| self.ensure_in(inner, &field_indent))
    }

    fn ensure_in(&self, inner: &str, field_indent: &str) -> BlockEdit {
        if self
            .assignment
            .find_iter(inner)
            .any(|m| m.as_str().trim() == self.field)
        {
            return BlockEdit::unchanged(inner, BlockOutcome::AlreadyPresent);
        }

        let target = self
            .commented
            .captures(inner)
            .or_else(|| self.assignment.captures(inner));
        if let Some(caps) = target {
            if let (Some(line), Some(indent)) = (caps.get(0), caps.get(1)) {
                let content = format!(
                    "{}{}{}{}",
                    &inner[..line.start()],
                    indent.as_str(),
                    self.field,
                    &inner[line.end()..]
                );
                return BlockEdit {
                    content,
                    outcome: BlockOutcome::FieldReplaced,
                };
            }
        }

        let header_indent = field_indent
            .strip_suffix(INDENT_UNIT)
            .unwrap_or_default()
            .to_owned();
        let mut content = inner.trim_end().to_owned();
        content.push('\n');
        content.push_str(field_indent);
        content.push_str(&self.field);
        content.push('\n');
        content.push_str(&header_indent);
        BlockEdit {
            content,
            outcome: BlockOutcome::FieldAdded,
        }
    }

    fn create(&self, content: &str, after: Option<&str>) -> String {
        let block = format!("{} {{\n{INDENT_UNIT}{}\n}}\n", self.block, self.field);

        let insert_at = after
            .and_then(|name| find_block_header(content, name))
            .and_then(|h| brace::match_brace(content, h.open))
            .map(|close| anchor::next_line_start(content, close));

        match insert_at {
            Some(at) => {
                let head = &content[..at];
                let newline = if head.ends_with('\n') { "" } else { "\n" };
                format!("{head}{newline}\n{block}{}", &content[at..])
            }
            None => {
                let head = content.trim_end();
                if head.is_empty() {
                    block
                } else {
                    format!("{head}\n\n{block}")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FIELD: &str = r#"buildConfigField "boolean", "X", "true""#;

    #[test]
    fn test_adds_field_to_empty_nested_block() {
        let input = "android {\n    buildTypes {\n        debug {\n        }\n    }\n}";
        let edit = ensure_block_with_field(input, "debug", FIELD, "            ", "        ");
        assert_eq!(edit.outcome, BlockOutcome::FieldAdded);
        assert_eq!(
            edit.content,
            "android {\n    buildTypes {\n        debug {\n            buildConfigField \"boolean\", \"X\", \"true\"\n        }\n    }\n}"
        );
        assert_eq!(edit.content.matches(FIELD).count(), 1);
        assert!(brace::is_balanced(&edit.content));
    }

    #[test]
    fn test_field_already_present() {
        let input = "debug {\n    buildConfigField \"boolean\", \"X\", \"true\"\n}\n";
        let edit = ensure_block_with_field(input, "debug", FIELD, "    ", "");
        assert_eq!(edit.outcome, BlockOutcome::AlreadyPresent);
        assert_eq!(edit.content, input);
    }

    #[test]
    fn test_appends_after_existing_members() {
        let input = "debug {\n    signingConfig signingConfigs.debug\n}\n";
        let edit = ensure_block_with_field(input, "debug", FIELD, "        ", "");
        assert_eq!(
            edit.content,
            "debug {\n    signingConfig signingConfigs.debug\n    buildConfigField \"boolean\", \"X\", \"true\"\n}\n"
        );
    }

    #[test]
    fn test_field_follows_last_member_indent() {
        let input = "debug { // local\n  minifyEnabled false\n\t\tshrinkResources false\n\n}\n";
        let edit = ensure_block_with_field(input, "debug", FIELD, "        ", "");
        assert_eq!(edit.outcome, BlockOutcome::FieldAdded);
        assert_eq!(
            edit.content,
            "debug { // local\n  minifyEnabled false\n\t\tshrinkResources false\n\t\tbuildConfigField \"boolean\", \"X\", \"true\"\n}\n"
        );
    }

    #[test]
    fn test_one_line_block_uses_default_indent() {
        let input = "debug { minifyEnabled false }\n";
        let edit = ensure_block_with_field(input, "debug", FIELD, "    ", "");
        assert_eq!(
            edit.content,
            "debug { minifyEnabled false\n    buildConfigField \"boolean\", \"X\", \"true\"\n}\n"
        );
    }

    #[test]
    fn test_creates_missing_block() {
        let input = "\n        debug {\n        }\n    ";
        let edit = ensure_block_with_field(input, "release", FIELD, "            ", "        ");
        assert_eq!(edit.outcome, BlockOutcome::BlockCreated);
        assert_eq!(
            edit.content,
            "\n        debug {\n        }\n        release {\n            buildConfigField \"boolean\", \"X\", \"true\"\n        }\n    "
        );
    }

    #[test]
    fn test_sibling_blocks_untouched() {
        let sibling = "    signingConfigs {\n        debug {\n            storeFile file('debug.keystore')\n        }\n    }\n";
        let input = format!("android {{\n{sibling}    buildTypes {{\n        debug {{\n        }}\n    }}\n}}\n");
        let spec = BlockSpec::nested("buildTypes", "debug", FIELD, "");
        let header = find_block_header(&input, "android").expect("android block");
        let edit = edit_block_inner(&input, &header, |inner| ensure_nested_field(inner, &spec));
        assert_eq!(edit.outcome, BlockOutcome::FieldAdded);
        assert!(edit.content.contains(sibling));
        let build_types = edit.content.find("buildTypes").expect("buildTypes");
        assert!(edit.content[build_types..].contains(FIELD));
        assert!(!edit.content[..build_types].contains(FIELD));
    }

    #[test]
    fn test_top_level_header_preferred() {
        let input = "outer {\n    debug {\n    }\n}\ndebug {\n}\n";
        let header = find_block_header(input, "debug").expect("header");
        assert_eq!(header.indent, "");
        assert_eq!(&input[header.line_start..header.open], "debug ");
    }

    #[test]
    fn test_header_requires_whole_name() {
        assert!(find_block_header("debugger {\n}\n", "debug").is_none());
        assert!(find_block_header("debug{\n}\n", "debug").is_some());
    }

    #[test]
    fn test_brace_not_found() {
        let input = "debug {\n    x\n";
        let edit = ensure_block_with_field(input, "debug", FIELD, "    ", "");
        assert_eq!(edit.outcome, BlockOutcome::BraceNotFound);
        assert_eq!(edit.content, input);
    }

    #[test]
    fn test_nested_creates_parent_in_one_step() {
        let inner = "\n    defaultConfig {\n    }\n";
        let spec = BlockSpec::nested("buildTypes", "debug", FIELD, "");
        let edit = ensure_nested_field(inner, &spec);
        assert_eq!(edit.outcome, BlockOutcome::ParentCreated);
        assert!(edit.content.contains(
            "    buildTypes {\n        debug {\n            buildConfigField \"boolean\", \"X\", \"true\"\n        }\n    }\n"
        ));
        assert!(brace::is_balanced(&edit.content));
    }

    #[test]
    fn test_nested_one_line_parent() {
        let input = "android {\n    buildTypes {}\n}\n";
        let header = find_block_header(input, "android").expect("android");
        let spec = BlockSpec::nested("buildTypes", "release", FIELD, "");
        let edit = edit_block_inner(input, &header, |inner| ensure_nested_field(inner, &spec));
        assert_eq!(
            edit.content,
            "android {\n    buildTypes {\n        release {\n            buildConfigField \"boolean\", \"X\", \"true\"\n        }\n    }\n}\n"
        );
    }

    fn bundle_field() -> SimpleBlockField {
        SimpleBlockField::new("react", "bundleAssetName", r#"bundleAssetName = "main.jsbundle""#)
            .expect("valid key")
    }

    #[test]
    fn test_simple_field_uncomments() {
        let input = "react {\n    // bundleAssetName = \"MyApp.android.bundle\"\n    autolinkLibrariesWithApp()\n}\n";
        let edit = bundle_field().ensure(input, None);
        assert_eq!(edit.outcome, BlockOutcome::FieldReplaced);
        assert_eq!(
            edit.content,
            "react {\n    bundleAssetName = \"main.jsbundle\"\n    autolinkLibrariesWithApp()\n}\n"
        );
        let again = bundle_field().ensure(&edit.content, None);
        assert_eq!(again.outcome, BlockOutcome::AlreadyPresent);
    }

    #[test]
    fn test_simple_field_replaces_other_value() {
        let input = "react {\n  bundleAssetName = \"old.bundle\"\n}\n";
        let edit = bundle_field().ensure(input, None);
        assert_eq!(edit.content, "react {\n  bundleAssetName = \"main.jsbundle\"\n}\n");
    }

    #[test]
    fn test_simple_field_appends() {
        let input = "react {\n    autolinkLibrariesWithApp()\n}\n";
        let edit = bundle_field().ensure(input, None);
        assert_eq!(
            edit.content,
            "react {\n    autolinkLibrariesWithApp()\n    bundleAssetName = \"main.jsbundle\"\n}\n"
        );
    }

    #[test]
    fn test_simple_block_created_after_named_block() {
        let input = "android {\n}\n\ndependencies {\n}\n";
        let edit = bundle_field().ensure(input, Some("android"));
        assert_eq!(edit.outcome, BlockOutcome::BlockCreated);
        assert_eq!(
            edit.content,
            "android {\n}\n\nreact {\n    bundleAssetName = \"main.jsbundle\"\n}\n\ndependencies {\n}\n"
        );
    }

    #[test]
    fn test_simple_block_created_at_end() {
        let edit = bundle_field().ensure("apply plugin: 'x'\n", Some("android"));
        assert_eq!(
            edit.content,
            "apply plugin: 'x'\n\nreact {\n    bundleAssetName = \"main.jsbundle\"\n}\n"
        );
    }
}
