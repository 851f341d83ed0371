//! Page annotations and URI links.

use lopdf::{Dictionary, Document};

use super::content::PageSpace;
use super::objects::{get_array, get_dict, get_name, get_string, rect_array, resolve_dict};
use crate::error::ExtractError;
use crate::model::{Annotation, AnnotationKind, PageLink, Rect};

/// Resolved `/Annots` dictionaries of a page.
fn annotation_dicts<'a>(doc: &'a Document, page: &'a Dictionary) -> Vec<Option<&'a Dictionary>> {
    get_array(doc, page, b"Annots")
        .map(|items| items.iter().map(|o| resolve_dict(doc, o)).collect())
        .unwrap_or_default()
}

fn annotation_rect(doc: &Document, dict: &Dictionary, space: PageSpace) -> Option<Rect> {
    let [x0, y0, x1, y1] = dict.get(b"Rect").ok().and_then(|r| rect_array(doc, r))?;
    space.bounding(&[(x0, y0), (x1, y1)])
}

/// All annotations on the page, one entry per `/Annots` item.
pub(super) fn extract_annotations(
    doc: &Document,
    page: &Dictionary,
    space: PageSpace,
) -> Vec<Result<Annotation, ExtractError>> {
    annotation_dicts(doc, page)
        .into_iter()
        .map(|dict| {
            let dict = dict.ok_or_else(|| ExtractError::Pdf("annotation is not a dictionary".into()))?;
            let subtype = get_name(doc, dict, b"Subtype").unwrap_or("");
            let rect = annotation_rect(doc, dict, space).ok_or_else(|| {
                ExtractError::Geometry(format!("{} annotation without a usable /Rect", subtype))
            })?;
            Ok(Annotation {
                kind: AnnotationKind::from_subtype(subtype),
                content: get_string(doc, dict, b"Contents"),
                rect,
            })
        })
        .collect()
}

/// Link annotations whose action is a URI.
pub(super) fn extract_links(
    doc: &Document,
    page: &Dictionary,
    space: PageSpace,
) -> Result<Vec<PageLink>, ExtractError> {
    let mut links = Vec::new();
    for dict in annotation_dicts(doc, page).into_iter().flatten() {
        if get_name(doc, dict, b"Subtype") != Some("Link") {
            continue;
        }
        let Some(action) = get_dict(doc, dict, b"A") else {
            continue;
        };
        if get_name(doc, action, b"S") != Some("URI") {
            continue;
        }
        let Some(uri) = get_string(doc, action, b"URI") else {
            continue;
        };
        match annotation_rect(doc, dict, space) {
            Some(rect) => links.push(PageLink { uri, rect }),
            None => log::debug!("skipping link to {} without a usable /Rect", uri),
        }
    }
    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object};

    fn space() -> PageSpace {
        PageSpace {
            llx: 0.0,
            ury: 792.0,
        }
    }

    fn rect(x0: i64, y0: i64, x1: i64, y1: i64) -> Object {
        Object::Array(vec![
            Object::Integer(x0),
            Object::Integer(y0),
            Object::Integer(x1),
            Object::Integer(y1),
        ])
    }

    #[test]
    fn test_annotations_and_links() {
        let mut doc = Document::with_version("1.5");
        let note = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Text",
            "Rect" => rect(100, 700, 120, 720),
            "Contents" => Object::string_literal("Check this"),
        });
        let link = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => rect(72, 600, 200, 612),
            "A" => dictionary! {
                "S" => "URI",
                "URI" => Object::string_literal("https://example.com"),
            },
        });
        let broken = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Highlight",
        });
        let page = dictionary! {
            "Annots" => vec![
                Object::Reference(note),
                Object::Reference(link),
                Object::Reference(broken),
            ],
        };

        let annots = extract_annotations(&doc, &page, space());
        assert_eq!(annots.len(), 3);
        let first = annots[0].as_ref().unwrap();
        assert_eq!(first.kind, AnnotationKind::Text);
        assert_eq!(first.content.as_deref(), Some("Check this"));
        assert_eq!(first.rect, Rect::new(100.0, 72.0, 120.0, 92.0));
        assert_eq!(annots[1].as_ref().unwrap().kind, AnnotationKind::Link);
        assert!(matches!(annots[2], Err(ExtractError::Geometry(_))));

        let links = extract_links(&doc, &page, space()).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].uri, "https://example.com");
        assert_eq!(links[0].rect.y0, 180.0);
    }

    #[test]
    fn test_page_without_annotations() {
        let doc = Document::with_version("1.5");
        let page = dictionary! {};
        assert!(extract_annotations(&doc, &page, space()).is_empty());
        assert!(extract_links(&doc, &page, space()).unwrap().is_empty());
    }
}
