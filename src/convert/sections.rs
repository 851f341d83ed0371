//! Document-level Markdown sections around the page blocks.

use crate::model::{Bookmark, EmbeddedFile, Permissions};

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;

fn page_title(number: u32) -> String {
    format!("📄 Page {}", number)
}

/// Heading that opens each page's block.
pub fn page_heading(number: u32) -> String {
    format!("\n## {}\n", page_title(number))
}

/// Fragment that GitHub-flavored renderers assign to a heading.
///
/// Letters are lowercased, spaces become hyphens and everything other
/// than letters, digits, `-` and `_` is dropped.
pub fn heading_anchor(title: &str) -> String {
    let mut anchor = String::with_capacity(title.len());
    for c in title.chars() {
        match c {
            ' ' => anchor.push('-'),
            '-' | '_' => anchor.push(c),
            c if c.is_alphanumeric() => anchor.extend(c.to_lowercase()),
            _ => {}
        }
    }
    anchor
}

/// Size with binary units: `512 B`, `1.5 KB`, `2.0 MB`.
pub fn human_size(bytes: u64) -> String {
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Listing of attached files, or `None` when there are none.
pub fn embedded_files_section(files: &[EmbeddedFile]) -> Option<String> {
    if files.is_empty() {
        return None;
    }

    let mut lines = vec!["\n## 📎 Embedded Files\n".to_string()];
    for file in files {
        lines.push(format!("- **{}** ({})", file.name, human_size(file.size)));
    }
    lines.push(String::new());
    Some(lines.join("\n"))
}

/// Permission summary, only for encrypted documents.
pub fn security_section(encrypted: bool, permissions: Permissions) -> Option<String> {
    if !encrypted {
        return None;
    }

    let yes_no = |allowed: bool| if allowed { "Yes" } else { "No" };
    let lines = [
        "\n## 🔐 Security Info\n".to_string(),
        "- **Encrypted:** Yes".to_string(),
        format!("- **Can Print:** {}", yes_no(permissions.print)),
        format!("- **Can Copy:** {}", yes_no(permissions.copy)),
        format!("- **Can Modify:** {}", yes_no(permissions.modify)),
        String::new(),
    ];
    Some(lines.join("\n"))
}

/// Nested list of outline entries linking to page anchors.
pub fn table_of_contents(bookmarks: &[Bookmark]) -> Option<String> {
    if bookmarks.is_empty() {
        return None;
    }

    let mut lines = vec!["## 📑 Table of Contents\n".to_string()];
    for bookmark in bookmarks {
        let indent = "  ".repeat(bookmark.level.saturating_sub(1) as usize);
        let entry = match bookmark.page {
            Some(page) => format!(
                "{}- [{}](#{})",
                indent,
                bookmark.title,
                heading_anchor(&page_title(page))
            ),
            None => format!("{}- {}", indent, bookmark.title),
        };
        lines.push(entry);
    }
    lines.push(String::new());
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn test_embedded_files_section() {
        assert_eq!(embedded_files_section(&[]), None);
        let files = vec![
            EmbeddedFile {
                name: "data.csv".to_string(),
                size: 2048,
            },
            EmbeddedFile {
                name: "notes.txt".to_string(),
                size: 12,
            },
        ];
        assert_eq!(
            embedded_files_section(&files).unwrap(),
            "\n## 📎 Embedded Files\n\n- **data.csv** (2.0 KB)\n- **notes.txt** (12 B)\n"
        );
    }

    #[test]
    fn test_security_section() {
        assert_eq!(security_section(false, Permissions::default()), None);
        let perms = Permissions {
            print: true,
            copy: false,
            modify: false,
        };
        let section = security_section(true, perms).unwrap();
        assert!(section.starts_with("\n## 🔐 Security Info\n\n- **Encrypted:** Yes\n"));
        assert!(section.contains("- **Can Print:** Yes"));
        assert!(section.contains("- **Can Copy:** No"));
        assert!(section.contains("- **Can Modify:** No"));
    }

    #[test]
    fn test_table_of_contents() {
        let bookmarks = vec![
            Bookmark::new(1, "Intro", Some(1)),
            Bookmark::new(2, "Background", Some(2)),
            Bookmark::new(1, "Appendix", None),
        ];
        assert_eq!(
            table_of_contents(&bookmarks).unwrap(),
            "## 📑 Table of Contents\n\n- [Intro](#-page-1)\n  - [Background](#-page-2)\n- Appendix\n"
        );
        assert_eq!(table_of_contents(&[]), None);
    }

    #[test]
    fn test_page_heading() {
        assert_eq!(page_heading(3), "\n## 📄 Page 3\n");
    }

    #[test]
    fn test_toc_links_match_page_heading_anchor() {
        assert_eq!(heading_anchor("📄 Page 12"), "-page-12");
        assert_eq!(heading_anchor("Q3 Results_final - Draft!"), "q3-results_final---draft");

        let toc = table_of_contents(&[Bookmark::new(1, "Summary", Some(12))]).unwrap();
        let heading = page_heading(12);
        let title = heading.trim().trim_start_matches("## ");
        assert!(toc.contains(&format!("(#{})", heading_anchor(title))));
        assert!(toc.contains("- [Summary](#-page-12)"));
    }
}
