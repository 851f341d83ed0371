//! Metadata headers prepended to the Markdown output.

use crate::model::Metadata;

/// Serializes document metadata into a front-matter block.
pub trait FrontMatter: Send + Sync + std::fmt::Debug {
    /// The complete block, fences included, followed by a blank line.
    fn render(&self, metadata: &Metadata) -> String;
}

/// YAML front matter with a fixed key order.
///
/// Empty values are left out; strings are always double-quoted.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFrontMatter;

impl FrontMatter for YamlFrontMatter {
    fn render(&self, metadata: &Metadata) -> String {
        let mut fields: Vec<(&'static str, String)> = Vec::new();
        let mut text = |key: &'static str, value: Option<&str>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                fields.push((key, yaml_string(value)));
            }
        };

        text("title", Some(metadata.title.as_str()));
        text("author", Some(metadata.author.as_str()));
        text("subject", metadata.subject.as_deref());
        text("creator", metadata.creator.as_deref());
        text("creation_date", metadata.creation_date.as_deref());
        text("modified_date", metadata.modified_date.as_deref());
        fields.push(("pages", metadata.pages.to_string()));
        fields.push(("encrypted", metadata.encrypted.to_string()));

        let mut output = String::from("---\n");
        for (key, value) in fields {
            output.push_str(key);
            output.push_str(": ");
            output.push_str(&value);
            output.push('\n');
        }
        output.push_str("---\n\n");
        output
    }
}

/// Double-quoted YAML scalar.
fn yaml_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// JSON front matter inside `---` fences.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFrontMatter;

impl FrontMatter for JsonFrontMatter {
    fn render(&self, metadata: &Metadata) -> String {
        match serde_json::to_string_pretty(metadata) {
            Ok(json) => format!("---\n{}\n---\n\n", json),
            Err(e) => {
                log::warn!("cannot serialize metadata: {}", e);
                String::new()
            }
        }
    }
}
