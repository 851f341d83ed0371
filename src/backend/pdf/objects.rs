//! Helpers for reading lopdf objects.

use lopdf::{Dictionary, Document, Object, Stream};

/// Follow references until a direct object is reached.
pub(super) fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> Option<&'a Object> {
    // Reference chains longer than this are treated as broken.
    for _ in 0..16 {
        match obj {
            Object::Reference(id) => obj = doc.get_object(*id).ok()?,
            _ => return Some(obj),
        }
    }
    None
}

/// Resolve an object to a dictionary, looking through streams.
pub(super) fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

/// Resolve an object to a stream.
pub(super) fn resolve_stream<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Stream> {
    match resolve(doc, obj)? {
        Object::Stream(s) => Some(s),
        _ => None,
    }
}

/// Look up `key` in `dict` and resolve it.
pub(super) fn get_resolved<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|o| resolve(doc, o))
}

/// Look up `key` in `dict` and resolve it to a dictionary.
pub(super) fn get_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    dict.get(key).ok().and_then(|o| resolve_dict(doc, o))
}

/// Look up `key` in `dict` and resolve it to an array.
pub(super) fn get_array<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Vec<Object>> {
    get_resolved(doc, dict, key).and_then(|o| o.as_array().ok())
}

/// Look up a name value as UTF-8.
pub(super) fn get_name<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a str> {
    get_resolved(doc, dict, key).and_then(|o| o.as_name_str().ok())
}

/// Look up a numeric value.
pub(super) fn get_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f32> {
    get_resolved(doc, dict, key).and_then(number)
}

/// Extract a number from a PDF object.
pub(super) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Read a four-number rectangle array as `[x0, y0, x1, y1]`.
pub(super) fn rect_array(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let array = resolve(doc, obj)?.as_array().ok()?;
    if array.len() < 4 {
        return None;
    }
    let mut out = [0.0f32; 4];
    for (slot, item) in out.iter_mut().zip(array.iter()) {
        *slot = resolve(doc, item).and_then(number)?;
    }
    Some(out)
}

/// Read a text string (PDFDocEncoding or UTF-16BE) from a dictionary.
pub(super) fn get_string(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match get_resolved(doc, dict, key)? {
        Object::String(bytes, _) => Some(decode_text_simple(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Stream bytes with filters applied, or the raw bytes when unfiltered.
pub(super) fn stream_bytes(stream: &Stream) -> Result<Vec<u8>, lopdf::Error> {
    if stream.dict.get(b"Filter").is_err() {
        return Ok(stream.content.clone());
    }
    stream.decompressed_content()
}

/// Simple text decoding fallback when no font encoding is available.
pub(super) fn decode_text_simple(bytes: &[u8]) -> String {
    // Try UTF-16BE first (BOM marker)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Fallback: Latin-1
    bytes.iter().map(|&b| b as char).collect()
}
