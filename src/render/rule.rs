//! Thematic breaks from wide, flat vector strokes.

use super::RuleConfig;
use crate::model::{Element, ElementKind, Rect, VectorPath};

/// Whether a path is drawn as a horizontal rule on a page of `page_width`.
pub fn is_rule(path: &VectorPath, page_width: f32, config: &RuleConfig) -> bool {
    if page_width <= 0.0 || !path.rect.is_finite() {
        return false;
    }
    path.rect.width() / page_width > config.min_width_ratio && path.rect.height() < config.max_height
}

/// One `---` element per qualifying path.
pub fn detect_rules(paths: &[VectorPath], page: Rect, config: &RuleConfig) -> Vec<Element> {
    paths
        .iter()
        .filter(|p| is_rule(p, page.width(), config))
        .map(|p| Element::new(ElementKind::Rule, p.rect.y0, "---").with_bbox(Some(p.rect)))
        .collect()
}
