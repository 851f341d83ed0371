//! The page reconstruction engine.
//!
//! Every extractor produces positioned [`Element`]s; the engine gathers them
//! in a fixed order (tables, text, images, annotations, links, rules),
//! stable-sorts them by their top edge and joins the rendered pieces.

use super::annotation::render_annotation;
use super::heading::{average_font_size, HeadingClassifier};
use super::image::ImageHandler;
use super::list::normalize_list_item;
use super::rule::detect_rules;
use super::span::format_line;
use super::table::render_tables;
use super::url::UrlLinker;
use super::{ImageMode, PageOutput, PageStats, RenderOptions};
use crate::backend::PdfPage;
use crate::error::ExtractError;
use crate::model::{Element, ElementKind, Rect, TextBlock};

/// Stable sort by vertical position, top of the page first.
pub fn order_elements(elements: &mut [Element]) {
    elements.sort_by(|a, b| a.y.total_cmp(&b.y));
}

/// Join rendered elements, one entry per output line.
pub fn render_elements(elements: &[Element]) -> String {
    elements
        .iter()
        .map(Element::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turns one page into Markdown.
pub struct PageReconstructor<'a> {
    options: &'a RenderOptions,
    headings: HeadingClassifier,
}

impl<'a> PageReconstructor<'a> {
    pub fn new(options: &'a RenderOptions) -> Self {
        Self {
            options,
            headings: HeadingClassifier::new(options.headings),
        }
    }

    /// Reconstruct a page. Element failures are logged and skipped.
    pub fn reconstruct(&self, page: &dyn PdfPage) -> PageOutput {
        let mut stats = PageStats::default();
        let mut elements = self.collect_elements(page, &mut stats);
        order_elements(&mut elements);

        log::debug!(
            "page {}: {} elements, {} skipped",
            page.number(),
            elements.len(),
            stats.skipped
        );

        PageOutput {
            number: page.number(),
            markdown: render_elements(&elements),
            stats,
        }
    }

    /// All elements of a page in extractor order, before sorting.
    pub fn collect_elements(&self, page: &dyn PdfPage, stats: &mut PageStats) -> Vec<Element> {
        let mut elements = Vec::new();
        let mut linker = UrlLinker::new();

        let regions = self.table_elements(page, &mut elements, stats);
        self.text_elements(page, &regions, &mut linker, &mut elements, stats);
        self.image_elements(page, &mut elements, stats);

        if self.options.include_annotations {
            for annotation in page.annotations() {
                let result = annotation.map(|a| render_annotation(&a, page));
                if accept(page, "annotation", result, &mut elements, stats) {
                    stats.annotations += 1;
                }
            }
        }

        if self.options.include_links {
            match linker.link_elements(page) {
                Ok(links) => {
                    stats.links += links.len() as u32;
                    elements.extend(links);
                }
                Err(e) => {
                    log::warn!("page {}: cannot read links: {}", page.number(), e);
                    stats.skipped += 1;
                }
            }
        }

        self.rule_elements(page, &mut elements, stats);
        elements
    }

    /// Render detected tables; returns the regions that suppress text.
    fn table_elements(
        &self,
        page: &dyn PdfPage,
        elements: &mut Vec<Element>,
        stats: &mut PageStats,
    ) -> Vec<Rect> {
        let grids = match page.tables() {
            Ok(grids) => grids,
            Err(e) => {
                log::warn!("page {}: table detection failed: {}", page.number(), e);
                stats.skipped += 1;
                return Vec::new();
            }
        };

        let mut regions = Vec::new();
        for table in render_tables(&grids) {
            regions.extend(table.region);
            elements.push(table.element);
            stats.tables += 1;
        }
        regions
    }

    fn text_elements(
        &self,
        page: &dyn PdfPage,
        regions: &[Rect],
        linker: &mut UrlLinker,
        elements: &mut Vec<Element>,
        stats: &mut PageStats,
    ) {
        let blocks = page.text_blocks();
        let average = average_font_size(blocks, self.options.default_font_size);

        for block in blocks {
            if regions.iter().any(|r| block.bbox.intersects(r)) {
                log::debug!(
                    "page {}: block at {:.1} lies in a table",
                    page.number(),
                    block.bbox.y0
                );
                stats.suppressed_blocks += 1;
                continue;
            }
            self.block_lines(block, average, linker, elements, stats);
        }
    }

    /// Each non-empty line of a block becomes a text element at the block's top.
    fn block_lines(
        &self,
        block: &TextBlock,
        average: f32,
        linker: &mut UrlLinker,
        elements: &mut Vec<Element>,
        stats: &mut PageStats,
    ) {
        for line in &block.lines {
            if line.spans.is_empty() {
                continue;
            }
            let formatted = format_line(&line.spans);
            if formatted.text.trim().is_empty() {
                continue;
            }

            let heading = self
                .headings
                .classify(formatted.max_size, average, formatted.bold);
            let text = match heading {
                Some(_) => {
                    stats.headings += 1;
                    formatted.text
                }
                None => match normalize_list_item(&formatted.text) {
                    Some(item) => {
                        stats.list_items += 1;
                        item
                    }
                    None => formatted.text,
                },
            };

            let text = linker.link_bare_urls(&text);
            let prefix = heading.map(|h| h.prefix()).unwrap_or("");
            elements.push(Element::new(
                ElementKind::Text,
                block.bbox.y0,
                format!("{}{}", prefix, text),
            ));
            stats.text_lines += 1;
        }
    }

    fn image_elements(
        &self,
        page: &dyn PdfPage,
        elements: &mut Vec<Element>,
        stats: &mut PageStats,
    ) {
        if self.options.images.mode == ImageMode::Omit {
            return;
        }

        let handler = ImageHandler::new(&self.options.images);
        for image in page.images() {
            let result = image.and_then(|img| handler.render(&img, page.number()));
            if accept(page, "image", result, elements, stats) {
                stats.images += 1;
            }
        }
    }

    fn rule_elements(&self, page: &dyn PdfPage, elements: &mut Vec<Element>, stats: &mut PageStats) {
        match page.drawings() {
            Ok(paths) => {
                let rules = detect_rules(&paths, page.bounds(), &self.options.rules);
                stats.rules += rules.len() as u32;
                elements.extend(rules);
            }
            Err(e) => {
                log::warn!("page {}: cannot enumerate drawings: {}", page.number(), e);
                stats.skipped += 1;
            }
        }
    }
}

/// Push a produced element; errors and empty results are dropped alike.
///
/// Returns true when an element was added.
fn accept(
    page: &dyn PdfPage,
    what: &str,
    result: Result<Option<Element>, ExtractError>,
    elements: &mut Vec<Element>,
    stats: &mut PageStats,
) -> bool {
    match result {
        Ok(Some(element)) => {
            elements.push(element);
            true
        }
        Ok(None) => false,
        Err(e) => {
            log::debug!("page {}: skipping {}: {}", page.number(), what, e);
            stats.skipped += 1;
            false
        }
    }
}
