//! Upsert-by-name for key/value resource files.
//!
//! The list-level [`upsert`] is pure and total. The markup adapters apply a
//! list of entries to an Android `strings.xml` or an iOS property list by
//! editing only the affected lines.

use std::sync::LazyLock;

use regex::Regex;

/// One `name → value` resource entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub name: String,
    pub value: String,
    pub translatable: bool,
}

impl ResourceEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            translatable: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Updated,
    Inserted,
    Unchanged,
}

/// Overwrite the value of the entry named `entry.name`, or append `entry`.
pub fn upsert(entries: &mut Vec<ResourceEntry>, entry: ResourceEntry) -> Upsert {
    match entries.iter_mut().find(|e| e.name == entry.name) {
        Some(existing) if existing.value == entry.value => Upsert::Unchanged,
        Some(existing) => {
            existing.value = entry.value;
            Upsert::Updated
        }
        None => {
            entries.push(entry);
            Upsert::Inserted
        }
    }
}

/// Result of applying entries to a markup document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEdit {
    Edited(String),
    /// The closing container tag was not found; nothing was changed.
    Unsupported,
}

static STRING_ENTRY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(?s)<string\s+name="([^"]+)"([^>]*?)(?:/>|>(.*?)</string>)"#).ok()
});

static PLIST_ENTRY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?s)<key>([^<]+)</key>(\s*)<string>(.*?)</string>").ok()
});

/// Apply `entries` to an Android string resource document.
pub fn apply_to_strings_xml(document: &str, entries: &[ResourceEntry]) -> MarkupEdit {
    if !document.contains("</resources>") {
        return MarkupEdit::Unsupported;
    }
    let Some(re) = STRING_ENTRY.as_ref() else {
        return MarkupEdit::Unsupported;
    };

    let mut result = document.to_owned();
    for entry in entries {
        let value = escape_xml(&entry.value);
        let existing = re
            .captures_iter(&result)
            .find(|c| c.get(1).is_some_and(|n| n.as_str() == entry.name))
            .and_then(|c| match c.get(3) {
                Some(inner) => Some((inner.range(), None)),
                // Self-closing element: rewrite it with the value as content.
                None => {
                    let attrs = c.get(2).map_or("", |a| a.as_str().trim_end()).to_owned();
                    c.get(0).map(|whole| (whole.range(), Some(attrs)))
                }
            });

        if let Some((range, self_closing)) = existing {
            match self_closing {
                Some(attrs) => {
                    let element = format!("<string name=\"{}\"{attrs}>{value}</string>", entry.name);
                    result.replace_range(range, &element);
                }
                None if result[range.clone()] != value => result.replace_range(range, &value),
                None => {}
            }
            continue;
        }

        let translatable = if entry.translatable {
            String::new()
        } else {
            r#" translatable="false""#.to_owned()
        };
        let line = format!(
            "  <string name=\"{}\"{translatable}>{value}</string>\n",
            entry.name
        );
        let at = closing_tag_line(&result, "</resources>");
        result.insert_str(at, &on_own_line(&result, at, line));
    }

    MarkupEdit::Edited(result)
}

/// Apply `entries` as `<key>`/`<string>` pairs to the top-level dictionary
/// of a property list.
pub fn apply_to_plist(document: &str, entries: &[ResourceEntry]) -> MarkupEdit {
    if !document.contains("</dict>") {
        return MarkupEdit::Unsupported;
    }
    let Some(re) = PLIST_ENTRY.as_ref() else {
        return MarkupEdit::Unsupported;
    };

    let mut result = document.to_owned();
    for entry in entries {
        let value = escape_xml(&entry.value);
        let existing = re
            .captures_iter(&result)
            .find(|c| c.get(1).is_some_and(|k| k.as_str().trim() == entry.name))
            .and_then(|c| c.get(3).map(|v| v.range()));

        if let Some(range) = existing {
            if result[range.clone()] != value {
                result.replace_range(range, &value);
            }
            continue;
        }

        let at = closing_tag_line(&result, "</dict>");
        let indent = super::anchor::indent_at(&result, at);
        let member = format!("{indent}\t");
        let pair = format!(
            "{member}<key>{}</key>\n{member}<string>{value}</string>\n",
            entry.name
        );
        result.insert_str(at, &on_own_line(&result, at, pair));
    }

    MarkupEdit::Edited(result)
}

/// Start of the line holding the last `tag` when only whitespace precedes
/// it there, otherwise the tag offset itself.
fn closing_tag_line(document: &str, tag: &str) -> usize {
    let close = document.rfind(tag).unwrap_or(document.len());
    let start = super::anchor::line_start(document, close);
    if document[start..close].trim().is_empty() {
        start
    } else {
        close
    }
}

fn on_own_line(document: &str, at: usize, text: String) -> String {
    if at > 0 && !document[..at].ends_with('\n') {
        format!("\n{text}")
    } else {
        text
    }
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
