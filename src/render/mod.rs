//! Markdown rendering: element classifiers and the page reconstruction engine.

mod annotation;
mod frontmatter;
mod heading;
mod image;
mod list;
mod options;
mod page;
mod result;
mod rule;
mod span;
mod table;
mod url;

pub use annotation::{annotation_label, render_annotation};
pub use frontmatter::{FrontMatter, JsonFrontMatter, YamlFrontMatter};
pub use heading::{average_font_size, HeadingClassifier, HeadingLevel};
pub use image::{image_file_name, EncodedImage, ImageEncoding, ImageHandler};
pub use list::normalize_list_item;
pub use options::{
    HeadingThresholds, ImageMode, ImageOptions, PageSelection, RenderOptions, RuleConfig,
};
pub use page::{order_elements, render_elements, PageReconstructor};
pub use result::{ConversionStats, PageOutput, PageStats};
pub use rule::{detect_rules, is_rule};
pub use span::{format_line, format_span, FormattedLine};
pub use table::{render_table, render_tables, RenderedTable};
pub use url::{markdown_link, UrlLinker};
