//! Content stream interpreter.
//!
//! Walks a page's operators once and captures what the reconstruction
//! engine needs: positioned text spans, painted path boxes, and the
//! rectangles image XObjects are drawn into. Positions are converted to
//! top-left-origin page space on the way out.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use unicode_normalization::UnicodeNormalization;

use super::objects::{
    decode_text_simple, get_array, get_dict, get_name, get_number, number, resolve,
    resolve_stream, stream_bytes,
};
use crate::model::{FontFlags, Rect, TextSpan, VectorPath};

/// Nested form XObjects deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 8;

/// TJ adjustments beyond this (in thousandths of an em) read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A PDF transformation matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    pub(super) const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub(super) fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Read six numeric operands.
    pub(super) fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        Some(Self::new(
            number(&operands[0])?,
            number(&operands[1])?,
            number(&operands[2])?,
            number(&operands[3])?,
            number(&operands[4])?,
            number(&operands[5])?,
        ))
    }

    /// `self × other`: apply `self` first, then `other`.
    pub(super) fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub(super) fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

/// Maps PDF user space (bottom-left origin) to top-left page space.
#[derive(Debug, Clone, Copy)]
pub(super) struct PageSpace {
    pub(super) llx: f32,
    pub(super) ury: f32,
}

impl PageSpace {
    pub(super) fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (x - self.llx, self.ury - y)
    }

    /// Bounding box of user-space points, in page space.
    pub(super) fn bounding(&self, points: &[(f32, f32)]) -> Option<Rect> {
        let mut iter = points.iter().map(|&(x, y)| self.point(x, y));
        let (x, y) = iter.next()?;
        let (mut x0, mut y0, mut x1, mut y1) = (x, y, x, y);
        for (x, y) in iter {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        let rect = Rect::new(x0, y0, x1, y1);
        rect.is_finite().then_some(rect)
    }
}

/// Everything captured from one page's content.
#[derive(Debug, Default)]
pub(super) struct Capture {
    pub(super) spans: Vec<TextSpan>,
    pub(super) paths: Vec<VectorPath>,
    /// First placement of each image XObject
    pub(super) image_placements: HashMap<ObjectId, Rect>,
}

/// Font data needed to decode and measure strings.
struct FontInfo<'a> {
    dict: Option<&'a Dictionary>,
    flags: FontFlags,
    two_byte: bool,
    first_char: u32,
    widths: Vec<f32>,
    default_width: f32,
}

impl<'a> FontInfo<'a> {
    fn load(doc: &'a Document, dict: &'a Dictionary) -> Self {
        let base_font = get_name(doc, dict, b"BaseFont").unwrap_or("Unknown");
        let two_byte = get_name(doc, dict, b"Subtype") == Some("Type0");
        let first_char = get_number(doc, dict, b"FirstChar").unwrap_or(0.0).max(0.0) as u32;
        let widths = get_array(doc, dict, b"Widths")
            .map(|arr| {
                arr.iter()
                    .map(|w| resolve(doc, w).and_then(number).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            dict: Some(dict),
            flags: FontFlags::from_font_name(base_font),
            two_byte,
            first_char,
            widths,
            default_width: if two_byte { 1000.0 } else { 500.0 },
        }
    }

    fn fallback() -> Self {
        Self {
            dict: None,
            flags: FontFlags::NONE,
            two_byte: false,
            first_char: 0,
            widths: Vec::new(),
            default_width: 500.0,
        }
    }

    fn decode(&self, doc: &Document, bytes: &[u8]) -> String {
        if let Some(dict) = self.dict {
            if let Ok(enc) = dict.get_font_encoding(doc) {
                if let Ok(text) = Document::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn glyph_width(&self, code: u32) -> f32 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }

    /// Horizontal advance of a string in unscaled text space.
    fn advance(&self, bytes: &[u8], text: &TextState) -> f32 {
        let mut total = 0.0;
        if self.two_byte {
            for _ in bytes.chunks(2) {
                total += self.default_width / 1000.0 * text.size + text.char_spacing;
            }
        } else {
            for &b in bytes {
                total += self.glyph_width(b as u32) / 1000.0 * text.size + text.char_spacing;
                if b == b' ' {
                    total += text.word_spacing;
                }
            }
        }
        total * text.horizontal_scaling
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    line_width: f32,
}

struct TextState<'a> {
    tm: Matrix,
    tlm: Matrix,
    font: Option<FontInfo<'a>>,
    size: f32,
    leading: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scaling: f32,
}

impl Default for TextState<'_> {
    fn default() -> Self {
        Self {
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            font: None,
            size: 12.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
        }
    }
}

impl TextState<'_> {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translation(tx, ty).multiply(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }
}

/// Interprets content streams against one document.
pub(super) struct Interpreter<'a> {
    doc: &'a Document,
    space: PageSpace,
    capture: Capture,
}

impl<'a> Interpreter<'a> {
    pub(super) fn new(doc: &'a Document, space: PageSpace) -> Self {
        Self {
            doc,
            space,
            capture: Capture::default(),
        }
    }

    pub(super) fn finish(self) -> Capture {
        self.capture
    }

    /// Interpret one content stream with the given resources and base CTM.
    pub(super) fn run(
        &mut self,
        data: &[u8],
        resources: Option<&'a Dictionary>,
        ctm: Matrix,
        depth: usize,
    ) -> Result<(), lopdf::Error> {
        let content = Content::decode(data)?;

        let mut gs = GraphicsState {
            ctm,
            line_width: 1.0,
        };
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut text = TextState::default();
        let mut path: Vec<(f32, f32)> = Vec::new();

        for op in &content.operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                "q" => stack.push(gs.clone()),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        gs = saved;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        gs.ctm = m.multiply(&gs.ctm);
                    }
                }
                "w" => {
                    if let Some(w) = operands.first().and_then(number) {
                        gs.line_width = w;
                    }
                }

                // Text objects and state
                "BT" => {
                    text.tm = Matrix::IDENTITY;
                    text.tlm = Matrix::IDENTITY;
                }
                "ET" => {}
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Object::Name(name) = &operands[0] {
                            text.font = Some(self.load_font(resources, name));
                        }
                        text.size = number(&operands[1]).unwrap_or(12.0);
                    }
                }
                "TL" => text.leading = first_number(operands).unwrap_or(0.0),
                "Tc" => text.char_spacing = first_number(operands).unwrap_or(0.0),
                "Tw" => text.word_spacing = first_number(operands).unwrap_or(0.0),
                "Tz" => text.horizontal_scaling = first_number(operands).unwrap_or(100.0) / 100.0,
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = number(&operands[0]).unwrap_or(0.0);
                        let ty = number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            text.leading = -ty;
                        }
                        text.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        text.tm = m;
                        text.tlm = m;
                    }
                }
                "T*" => text.next_line(),
                "Tj" => {
                    if let Some(s @ Object::String(..)) = operands.first() {
                        self.show_text(&gs, &mut text, std::slice::from_ref(s));
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        self.show_text(&gs, &mut text, items);
                    }
                }
                "'" => {
                    text.next_line();
                    if let Some(s @ Object::String(..)) = operands.first() {
                        self.show_text(&gs, &mut text, std::slice::from_ref(s));
                    }
                }
                "\"" => {
                    if operands.len() >= 3 {
                        text.word_spacing = number(&operands[0]).unwrap_or(0.0);
                        text.char_spacing = number(&operands[1]).unwrap_or(0.0);
                        text.next_line();
                        self.show_text(&gs, &mut text, &operands[2..3]);
                    }
                }

                // Path construction
                "m" | "l" => {
                    if operands.len() >= 2 {
                        push_points(&mut path, &gs.ctm, &operands[..2]);
                    }
                }
                "c" => {
                    if operands.len() >= 6 {
                        push_points(&mut path, &gs.ctm, &operands[..6]);
                    }
                }
                "v" | "y" => {
                    if operands.len() >= 4 {
                        push_points(&mut path, &gs.ctm, &operands[..4]);
                    }
                }
                "re" => {
                    if let [x, y, w, h, ..] = operands {
                        if let (Some(x), Some(y), Some(w), Some(h)) =
                            (number(x), number(y), number(w), number(h))
                        {
                            for (px, py) in [(x, y), (x + w, y), (x + w, y + h), (x, y + h)] {
                                path.push(gs.ctm.apply(px, py));
                            }
                        }
                    }
                }
                "h" => {}

                // Path painting
                "S" | "s" | "B" | "B*" | "b" | "b*" => self.paint_path(&gs, &mut path, true),
                "f" | "F" | "f*" => self.paint_path(&gs, &mut path, false),
                "n" => path.clear(),

                "Do" => {
                    if let Some(Object::Name(name)) = operands.first() {
                        self.draw_xobject(resources, name, &gs, depth);
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn load_font(&self, resources: Option<&'a Dictionary>, name: &[u8]) -> FontInfo<'a> {
        resources
            .and_then(|res| get_dict(self.doc, res, b"Font"))
            .and_then(|fonts| get_dict(self.doc, fonts, name))
            .map(|dict| FontInfo::load(self.doc, dict))
            .unwrap_or_else(|| {
                log::debug!("font {} not found in resources", String::from_utf8_lossy(name));
                FontInfo::fallback()
            })
    }

    /// Show a Tj string or a TJ array and advance the text matrix.
    fn show_text(&mut self, gs: &GraphicsState, text: &mut TextState<'a>, items: &[Object]) {
        let fallback = FontInfo::fallback();
        let font = text.font.as_ref().unwrap_or(&fallback);
        let start = text.tm.multiply(&gs.ctm);

        let mut combined = String::new();
        let mut advance = 0.0;
        for item in items {
            match item {
                Object::String(bytes, _) => {
                    combined.push_str(&font.decode(self.doc, bytes));
                    advance += font.advance(bytes, text);
                }
                Object::Integer(_) | Object::Real(_) => {
                    let adjustment = -number(item).unwrap_or(0.0);
                    advance += adjustment / 1000.0 * text.size * text.horizontal_scaling;
                    if adjustment > TJ_SPACE_THRESHOLD
                        && !combined.is_empty()
                        && !combined.ends_with(' ')
                        && !combined.ends_with('\u{00A0}')
                        && !combined.chars().last().is_some_and(is_spaceless_script_char)
                    {
                        combined.push(' ');
                    }
                }
                _ => {}
            }
        }

        let flags = font.flags;
        text.tm = Matrix::translation(advance, 0.0).multiply(&text.tm);
        if combined.trim().is_empty() {
            return;
        }

        let end = text.tm.multiply(&gs.ctm);
        let size = text.size * start.vertical_scale();
        let (sx, sy) = start.apply(0.0, 0.0);
        let (ex, _) = end.apply(0.0, 0.0);
        let (x0, baseline) = self.space.point(sx, sy);
        let (x1, _) = self.space.point(ex, sy);

        let bbox = Rect::new(
            x0.min(x1),
            baseline - size * 0.8,
            x0.max(x1),
            baseline + size * 0.2,
        );
        if !bbox.is_finite() {
            return;
        }

        let text: String = combined.nfc().collect();
        self.capture
            .spans
            .push(TextSpan::new(text, size, flags, bbox));
    }

    fn paint_path(&mut self, gs: &GraphicsState, path: &mut Vec<(f32, f32)>, stroke: bool) {
        if path.len() >= 2 {
            if let Some(rect) = self.space.bounding(path) {
                let stroke_width = stroke.then(|| gs.line_width * gs.ctm.horizontal_scale());
                self.capture.paths.push(VectorPath { rect, stroke_width });
            }
        }
        path.clear();
    }

    fn draw_xobject(
        &mut self,
        resources: Option<&'a Dictionary>,
        name: &[u8],
        gs: &GraphicsState,
        depth: usize,
    ) {
        let Some(xobjects) = resources.and_then(|res| get_dict(self.doc, res, b"XObject")) else {
            return;
        };
        let Ok(entry) = xobjects.get(name) else {
            return;
        };
        let id = entry.as_reference().ok();
        let Some(stream) = resolve_stream(self.doc, entry) else {
            return;
        };

        match get_name(self.doc, &stream.dict, b"Subtype") {
            Some("Image") => {
                let corners = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
                    .map(|(x, y)| gs.ctm.apply(x, y));
                if let (Some(id), Some(rect)) = (id, self.space.bounding(&corners)) {
                    self.capture.image_placements.entry(id).or_insert(rect);
                }
            }
            Some("Form") if depth < MAX_FORM_DEPTH => {
                let matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|m| resolve(self.doc, m))
                    .and_then(|m| m.as_array().ok())
                    .and_then(|arr| Matrix::from_operands(arr))
                    .unwrap_or(Matrix::IDENTITY);
                let form_resources = get_dict(self.doc, &stream.dict, b"Resources").or(resources);
                let ctm = matrix.multiply(&gs.ctm);

                match stream_bytes(stream) {
                    Ok(data) => {
                        if let Err(e) = self.run(&data, form_resources, ctm, depth + 1) {
                            log::debug!("skipping unreadable form XObject: {}", e);
                        }
                    }
                    Err(e) => log::debug!("cannot decompress form XObject: {}", e),
                }
            }
            _ => {}
        }
    }
}

fn first_number(operands: &[Object]) -> Option<f32> {
    operands.first().and_then(number)
}

fn push_points(path: &mut Vec<(f32, f32)>, ctm: &Matrix, coords: &[Object]) {
    for pair in coords.chunks(2) {
        if let (Some(x), Some(y)) = (number(&pair[0]), pair.get(1).and_then(number)) {
            path.push(ctm.apply(x, y));
        }
    }
}

/// Check if character is from a script that doesn't use word spaces.
///
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub(super) fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}
