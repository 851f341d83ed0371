//! Bullet and numbered list normalization.

use regex::Regex;
use std::sync::LazyLock;

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[•●○◦▪▸‣⁃\-*+]\s+").expect("valid bullet regex"));
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+|[a-zA-Z])[.)]\s+").expect("valid numbered item regex")
});

/// Rewrite a list line to canonical Markdown.
///
/// Any bullet glyph becomes `- `; ordinals keep their number or letter and
/// end in `.`. Returns `None` when the line is not a list item.
pub fn normalize_list_item(line: &str) -> Option<String> {
    if let Some(m) = BULLET.find(line) {
        return Some(format!("- {}", &line[m.end()..]));
    }

    let caps = NUMBERED.captures(line)?;
    let whole = caps.get(0)?;
    let ordinal = caps.get(1)?.as_str();
    Some(format!("{}. {}", ordinal, &line[whole.end()..]))
}
