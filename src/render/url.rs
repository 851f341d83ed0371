//! Bare URL linking and link-annotation reconciliation.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::backend::PdfPage;
use crate::error::ExtractError;
use crate::model::{Element, ElementKind};

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s)\]>]+").expect("valid URL regex"));

/// Format a Markdown inline link.
pub fn markdown_link(text: &str, url: &str) -> String {
    format!("[{}]({})", text, url)
}

/// Links already emitted on one page.
///
/// Filled by the bare-URL pass over text lines and consulted before a link
/// annotation becomes its own element.
#[derive(Debug, Default)]
pub struct UrlLinker {
    seen: HashSet<String>,
}

impl UrlLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every bare `http(s)://` URL with `[url](url)` and remember it.
    ///
    /// Meant to run once per raw line; running it on its own output would
    /// wrap the links again.
    pub fn link_bare_urls(&mut self, text: &str) -> String {
        if !text.contains("http://") && !text.contains("https://") {
            return text.to_string();
        }

        BARE_URL
            .replace_all(text, |caps: &regex::Captures| {
                let url = &caps[0];
                self.seen.insert(url.to_string());
                markdown_link(url, url)
            })
            .into_owned()
    }

    /// Record a URL; returns false when it was already emitted.
    pub fn claim(&mut self, url: &str) -> bool {
        self.seen.insert(url.to_string())
    }

    /// Elements for the page's link annotations whose target is still new.
    ///
    /// The display text is whatever page text lies under the link, or the
    /// URL itself when nothing is there.
    pub fn link_elements(&mut self, page: &dyn PdfPage) -> Result<Vec<Element>, ExtractError> {
        let mut elements = Vec::new();
        for link in page.links()? {
            if link.uri.is_empty() || !self.claim(&link.uri) {
                continue;
            }
            let text = page.text_in_rect(&link.rect);
            let display = if text.trim().is_empty() {
                link.uri.as_str()
            } else {
                text.trim()
            };
            elements.push(
                Element::new(ElementKind::Link, link.rect.y0, markdown_link(display, &link.uri))
                    .with_bbox(Some(link.rect)),
            );
        }
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryPage;
    use crate::model::{FontFlags, Rect};

    #[test]
    fn test_link_bare_url() {
        let mut linker = UrlLinker::new();
        assert_eq!(
            linker.link_bare_urls("http://example.com/a"),
            "[http://example.com/a](http://example.com/a)"
        );
        assert!(!linker.claim("http://example.com/a"));
    }

    #[test]
    fn test_url_terminators() {
        let mut linker = UrlLinker::new();
        assert_eq!(
            linker.link_bare_urls("see (https://a.org/x) and <http://b.net>"),
            "see ([https://a.org/x](https://a.org/x)) and <[http://b.net](http://b.net)>"
        );
        assert_eq!(
            linker.link_bare_urls("[https://c.io] text"),
            "[[https://c.io](https://c.io)] text"
        );
    }

    #[test]
    fn test_text_without_urls_is_untouched() {
        let mut linker = UrlLinker::new();
        assert_eq!(linker.link_bare_urls("ftp://nope and www.x.com"), "ftp://nope and www.x.com");
        assert!(linker.claim("ftp://nope"));
    }

    #[test]
    fn test_link_elements_reports_unreadable_links() {
        let page = MemoryPage::letter(1).with_failing_links("bad /Annots");
        let mut linker = UrlLinker::new();
        assert!(matches!(
            linker.link_elements(&page),
            Err(ExtractError::Pdf(_))
        ));
    }

    #[test]
    fn test_link_elements_dedup_against_text() {
        let page = MemoryPage::letter(1)
            .with_text("Visit http://x now", 10.0, FontFlags::NONE, 72.0, 100.0)
            .with_text("Docs", 10.0, FontFlags::NONE, 72.0, 200.0)
            .with_link("http://x", Rect::new(72.0, 100.0, 200.0, 110.0))
            .with_link("https://docs.rs", Rect::new(70.0, 198.0, 100.0, 212.0))
            .with_link("https://docs.rs", Rect::new(70.0, 300.0, 100.0, 310.0))
            .with_link("https://empty.org", Rect::new(400.0, 500.0, 450.0, 510.0));

        let mut linker = UrlLinker::new();
        linker.link_bare_urls("Visit http://x now");
        let elements = linker.link_elements(&page).unwrap();

        let contents: Vec<&str> = elements.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "[Docs](https://docs.rs)",
                "[https://empty.org](https://empty.org)",
            ]
        );
        assert_eq!(elements[0].y, 198.0);
        assert!(elements.iter().all(|e| e.kind == ElementKind::Link));
    }
}
