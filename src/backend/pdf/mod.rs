//! lopdf-backed document access.

mod annots;
mod content;
mod images;
mod layout;
mod objects;
mod security;
mod tables;

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};

use self::content::{Interpreter, Matrix, PageSpace};
use self::objects::{
    get_dict, get_resolved, get_string, rect_array, resolve, resolve_dict, resolve_stream,
    stream_bytes,
};
use self::security::StandardSecurity;
use self::tables::TableDetector;
use super::{PdfDocument, PdfPage};
use crate::detect::{detect_format_from_bytes, detect_format_from_path};
use crate::error::{Error, ExtractError, Result};
use crate::model::{
    Annotation, Bookmark, DocumentInfo, EmbeddedFile, PageImage, PageLink, Permissions, Rect,
    TableGrid, TextBlock, VectorPath,
};

/// Parent chains and outline trees longer than this are treated as cyclic.
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when a page has no usable `/MediaBox`.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// A PDF file opened with lopdf.
pub struct PdfFile {
    doc: Document,
    encrypted: bool,
    needs_password: bool,
    security: Option<StandardSecurity>,
    permissions: Permissions,
}

impl PdfFile {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Verify it's a PDF
        detect_format_from_path(path)?;

        let doc = Document::load(path)?;
        Ok(Self::from_document(doc))
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        detect_format_from_bytes(data)?;
        let doc = Document::load_mem(data)?;
        Ok(Self::from_document(doc))
    }

    /// Parse a PDF from a reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Wrap an already loaded document.
    ///
    /// Encrypted documents are tried with the empty user password first;
    /// if that fails the document stays locked until [`PdfDocument::authenticate`].
    pub fn from_document(mut doc: Document) -> Self {
        let encrypted = doc.is_encrypted();
        let security = StandardSecurity::capture(&doc);

        // /P must be read before decryption rewrites the object table.
        let permissions = doc
            .get_encrypted()
            .ok()
            .and_then(|dict| dict.get(b"P").ok())
            .and_then(|p| p.as_i64().ok())
            .map(Permissions::from_p)
            .unwrap_or_default();

        let needs_password = encrypted
            && match doc.decrypt("") {
                Ok(()) => false,
                Err(e) => {
                    log::debug!("empty user password rejected: {}", e);
                    true
                }
            };

        Self {
            doc,
            encrypted,
            needs_password,
            security,
            permissions,
        }
    }

    /// The underlying lopdf document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    fn page_numbers(&self) -> HashMap<ObjectId, u32> {
        self.doc
            .get_pages()
            .into_iter()
            .map(|(number, id)| (id, number))
            .collect()
    }

    /// Resolve an outline destination to a page number.
    fn resolve_destination(&self, dest: &Object, pages: &HashMap<ObjectId, u32>) -> Option<u32> {
        match resolve(&self.doc, dest)? {
            Object::Array(items) => items
                .first()
                .and_then(|o| o.as_reference().ok())
                .and_then(|id| pages.get(&id).copied()),
            Object::Dictionary(d) => d.get(b"D").ok().and_then(|d| self.resolve_destination(d, pages)),
            Object::Name(name) | Object::String(name, _) => {
                let target = self.named_destination(name)?;
                match resolve(&self.doc, target)? {
                    Object::Name(_) | Object::String(..) => None,
                    _ => self.resolve_destination(target, pages),
                }
            }
            _ => None,
        }
    }

    /// Look up a named destination in `/Dests` or the `/Names` tree.
    fn named_destination(&self, name: &[u8]) -> Option<&Object> {
        let catalog = self.doc.catalog().ok()?;
        if let Some(dests) = get_dict(&self.doc, catalog, b"Dests") {
            if let Ok(target) = dests.get(name) {
                return Some(target);
            }
        }
        let tree = get_dict(&self.doc, catalog, b"Names").and_then(|n| get_dict(&self.doc, n, b"Dests"))?;
        let key = String::from_utf8_lossy(name);
        name_tree_entries(&self.doc, tree)
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    fn collect_outline(
        &self,
        first: Option<ObjectId>,
        level: u32,
        pages: &HashMap<ObjectId, u32>,
        visited: &mut HashSet<ObjectId>,
        items: &mut Vec<Bookmark>,
    ) {
        if level as usize > MAX_TREE_DEPTH {
            return;
        }

        let mut next = first;
        while let Some(id) = next {
            if !visited.insert(id) {
                log::debug!("outline cycle at {:?}", id);
                break;
            }
            let Ok(item) = self.doc.get_dictionary(id) else {
                break;
            };

            let title = get_string(&self.doc, item, b"Title").unwrap_or_default();
            let page = item
                .get(b"Dest")
                .ok()
                .and_then(|d| self.resolve_destination(d, pages))
                .or_else(|| {
                    get_dict(&self.doc, item, b"A")
                        .and_then(|a| a.get(b"D").ok())
                        .and_then(|d| self.resolve_destination(d, pages))
                });
            items.push(Bookmark::new(level, title.trim(), page));

            let child = item.get(b"First").ok().and_then(|o| o.as_reference().ok());
            self.collect_outline(child, level + 1, pages, visited, items);

            next = item.get(b"Next").ok().and_then(|o| o.as_reference().ok());
        }
    }
}

impl PdfDocument for PdfFile {
    fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    fn page(&self, number: u32) -> Result<Box<dyn PdfPage + '_>> {
        if self.needs_password {
            return Err(Error::PasswordRequired);
        }
        let pages = self.doc.get_pages();
        let id = pages
            .get(&number)
            .ok_or(Error::PageOutOfRange(number, pages.len() as u32))?;
        Ok(Box::new(PdfFilePage::load(&self.doc, *id, number)?))
    }

    fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    fn needs_password(&self) -> bool {
        self.needs_password
    }

    fn authenticate(&mut self, password: &str) -> bool {
        if !self.encrypted {
            return true;
        }
        let Some(user_password) = self
            .security
            .as_ref()
            .and_then(|s| s.user_password(password.as_bytes()))
        else {
            log::debug!("password rejected");
            return false;
        };

        if self.needs_password {
            if let Err(e) = self.doc.decrypt(&user_password) {
                log::debug!("decryption failed: {}", e);
                return false;
            }
            self.needs_password = false;
        }
        true
    }

    fn info(&self) -> DocumentInfo {
        let mut info = DocumentInfo {
            pdf_version: self.doc.version.to_string(),
            ..Default::default()
        };

        if let Some(dict) = get_dict(&self.doc, &self.doc.trailer, b"Info") {
            info.title = get_string(&self.doc, dict, b"Title");
            info.author = get_string(&self.doc, dict, b"Author");
            info.subject = get_string(&self.doc, dict, b"Subject");
            info.creator = get_string(&self.doc, dict, b"Creator");
            info.producer = get_string(&self.doc, dict, b"Producer");
            info.creation_date = get_string(&self.doc, dict, b"CreationDate");
            info.modified_date = get_string(&self.doc, dict, b"ModDate");
        }

        info
    }

    fn outline(&self) -> Vec<Bookmark> {
        let Ok(catalog) = self.doc.catalog() else {
            return Vec::new();
        };
        let Some(outlines) = get_dict(&self.doc, catalog, b"Outlines") else {
            return Vec::new();
        };

        let first = outlines.get(b"First").ok().and_then(|o| o.as_reference().ok());
        let pages = self.page_numbers();
        let mut items = Vec::new();
        self.collect_outline(first, 1, &pages, &mut HashSet::new(), &mut items);
        items
    }

    fn embedded_files(&self) -> Vec<EmbeddedFile> {
        let Ok(catalog) = self.doc.catalog() else {
            return Vec::new();
        };
        let Some(tree) = get_dict(&self.doc, catalog, b"Names")
            .and_then(|names| get_dict(&self.doc, names, b"EmbeddedFiles"))
        else {
            return Vec::new();
        };

        name_tree_entries(&self.doc, tree)
            .into_iter()
            .filter_map(|(key, value)| {
                let spec = resolve_dict(&self.doc, value)?;
                let name = get_string(&self.doc, spec, b"UF")
                    .or_else(|| get_string(&self.doc, spec, b"F"))
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(key);
                let size = embedded_size(&self.doc, spec);
                Some(EmbeddedFile { name, size })
            })
            .collect()
    }

    fn permissions(&self) -> Permissions {
        self.permissions
    }
}

/// Declared or measured size of a file specification's embedded stream.
fn embedded_size(doc: &Document, spec: &Dictionary) -> u64 {
    let Some(stream) = get_dict(doc, spec, b"EF")
        .and_then(|ef| ef.get(b"F").ok())
        .and_then(|f| resolve_stream(doc, f))
    else {
        return 0;
    };

    let declared = get_dict(doc, &stream.dict, b"Params")
        .and_then(|p| get_resolved(doc, p, b"Size"))
        .and_then(|s| s.as_i64().ok())
        .filter(|s| *s >= 0);

    match declared {
        Some(size) => size as u64,
        None => stream_bytes(stream)
            .map(|d| d.len())
            .unwrap_or(stream.content.len()) as u64,
    }
}

/// Flatten a name tree into `(key, value)` pairs in tree order.
fn name_tree_entries<'a>(doc: &'a Document, root: &'a Dictionary) -> Vec<(String, &'a Object)> {
    fn walk<'a>(
        doc: &'a Document,
        node: &'a Dictionary,
        depth: usize,
        out: &mut Vec<(String, &'a Object)>,
    ) {
        if depth > MAX_TREE_DEPTH {
            return;
        }
        if let Some(Object::Array(pairs)) = get_resolved(doc, node, b"Names") {
            for pair in pairs.chunks(2) {
                if let [key, value] = pair {
                    let key = match resolve(doc, key) {
                        Some(Object::String(bytes, _)) => objects::decode_text_simple(bytes),
                        _ => continue,
                    };
                    out.push((key, value));
                }
            }
        }
        if let Some(Object::Array(kids)) = get_resolved(doc, node, b"Kids") {
            for kid in kids {
                if let Some(kid) = resolve_dict(doc, kid) {
                    walk(doc, kid, depth + 1, out);
                }
            }
        }
    }

    let mut out = Vec::new();
    walk(doc, root, 0, &mut out);
    out
}

/// Look up a page attribute, following `/Parent` for inheritable keys.
fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_TREE_DEPTH {
        if let Some(value) = get_resolved(doc, node, key) {
            return Some(value);
        }
        node = get_dict(doc, node, b"Parent")?;
    }
    None
}

/// Concatenated content streams of a page.
fn page_content(doc: &Document, page: &Dictionary) -> std::result::Result<Vec<u8>, lopdf::Error> {
    let Ok(contents) = page.get(b"Contents") else {
        return Ok(Vec::new());
    };

    match resolve(doc, contents) {
        Some(Object::Stream(s)) => stream_bytes(s),
        Some(Object::Array(parts)) => {
            let mut content = Vec::new();
            for part in parts {
                if let Some(s) = resolve_stream(doc, part) {
                    match stream_bytes(s) {
                        Ok(data) => {
                            content.extend_from_slice(&data);
                            content.push(b'\n');
                        }
                        Err(e) => log::debug!("skipping unreadable content part: {}", e),
                    }
                }
            }
            Ok(content)
        }
        _ => Ok(Vec::new()),
    }
}

/// One page of a [`PdfFile`], interpreted once at load time.
pub struct PdfFilePage<'a> {
    doc: &'a Document,
    dict: &'a Dictionary,
    resources: Option<&'a Dictionary>,
    number: u32,
    bounds: Rect,
    space: PageSpace,
    blocks: Vec<TextBlock>,
    paths: std::result::Result<Vec<VectorPath>, String>,
    image_placements: HashMap<ObjectId, Rect>,
}

impl<'a> PdfFilePage<'a> {
    fn load(doc: &'a Document, id: ObjectId, number: u32) -> Result<Self> {
        let dict = doc.get_dictionary(id)?;

        let [llx, lly, urx, ury] = inherited(doc, dict, b"CropBox")
            .or_else(|| inherited(doc, dict, b"MediaBox"))
            .and_then(|b| rect_array(doc, b))
            .unwrap_or(DEFAULT_MEDIA_BOX);
        let (llx, urx) = (llx.min(urx), llx.max(urx));
        let (lly, ury) = (lly.min(ury), lly.max(ury));
        let bounds = Rect::new(0.0, 0.0, urx - llx, ury - lly);
        let space = PageSpace { llx, ury };

        let resources = inherited(doc, dict, b"Resources").and_then(|r| match r {
            Object::Dictionary(d) => Some(d),
            _ => None,
        });

        let mut interpreter = Interpreter::new(doc, space);
        let outcome = page_content(doc, dict)
            .and_then(|data| interpreter.run(&data, resources, Matrix::IDENTITY, 0));
        let capture = interpreter.finish();

        let paths = match outcome {
            Ok(()) => Ok(capture.paths),
            Err(e) => {
                log::warn!("page {}: cannot decode content stream: {}", number, e);
                Err(e.to_string())
            }
        };

        log::debug!(
            "page {}: {} spans, {} image placements",
            number,
            capture.spans.len(),
            capture.image_placements.len()
        );

        Ok(Self {
            doc,
            dict,
            resources,
            number,
            bounds,
            space,
            blocks: layout::build_blocks(capture.spans),
            paths,
            image_placements: capture.image_placements,
        })
    }
}

impl PdfPage for PdfFilePage<'_> {
    fn number(&self) -> u32 {
        self.number
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn text_blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    fn tables(&self) -> std::result::Result<Vec<TableGrid>, ExtractError> {
        Ok(TableDetector::new().detect(&self.blocks))
    }

    fn images(&self) -> Vec<std::result::Result<PageImage, ExtractError>> {
        images::extract_images(self.doc, self.resources, &self.image_placements)
    }

    fn annotations(&self) -> Vec<std::result::Result<Annotation, ExtractError>> {
        annots::extract_annotations(self.doc, self.dict, self.space)
    }

    fn links(&self) -> std::result::Result<Vec<PageLink>, ExtractError> {
        annots::extract_links(self.doc, self.dict, self.space)
    }

    fn drawings(&self) -> std::result::Result<Vec<VectorPath>, ExtractError> {
        self.paths.clone().map_err(ExtractError::Geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn build(content: &[u8]) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_page_inherits_media_box_and_resources() {
        let file = PdfFile::from_document(build(b"BT /F1 12 Tf 72 720 Td (Hello) Tj ET"));
        assert_eq!(file.page_count(), 1);
        assert!(!file.is_encrypted());

        let page = file.page(1).unwrap();
        assert_eq!(page.bounds(), Rect::new(0.0, 0.0, 612.0, 792.0));
        assert_eq!(page.text_blocks().len(), 1);
        assert_eq!(page.text_blocks()[0].lines[0].spans[0].text, "Hello");
        assert!(page.drawings().unwrap().is_empty());
    }

    #[test]
    fn test_page_out_of_range() {
        let file = PdfFile::from_document(build(b""));
        assert!(matches!(file.page(2), Err(Error::PageOutOfRange(2, 1))));
    }

    #[test]
    fn test_name_tree_walks_kids() {
        let mut doc = Document::with_version("1.5");
        let leaf = doc.add_object(dictionary! {
            "Names" => vec![
                Object::string_literal("b.txt"),
                Object::Integer(2),
            ],
        });
        let root = dictionary! {
            "Names" => vec![
                Object::string_literal("a.txt"),
                Object::Integer(1),
            ],
            "Kids" => vec![Object::Reference(leaf)],
        };

        let entries = name_tree_entries(&doc, &root);
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_owner_only_file_checks_supplied_password() {
        let data = include_bytes!("../../../tests/fixtures/owner_only.pdf");

        let mut file = PdfFile::from_bytes(data).unwrap();
        assert!(file.is_encrypted());
        assert!(!file.needs_password());
        assert!(!file.authenticate("nope"));
        assert!(file.authenticate("owner"));

        let page = file.page(1).unwrap();
        assert!(page
            .text_blocks()
            .iter()
            .flat_map(|b| b.spans())
            .any(|s| s.text.contains("Secret")));
        assert!(file.permissions().print);
        assert!(!file.permissions().copy);
    }

    #[test]
    fn test_locked_file_unlocks_with_owner_password() {
        let data = include_bytes!("../../../tests/fixtures/locked.pdf");

        let mut file = PdfFile::from_bytes(data).unwrap();
        assert!(file.needs_password());
        assert!(!file.authenticate("nope"));
        assert!(file.needs_password());
        assert!(file.authenticate("owner"));
        assert!(!file.needs_password());
        assert!(file.page(1).is_ok());
    }
}
