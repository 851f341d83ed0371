//! Image XObject decoding.

use std::collections::{HashMap, HashSet};

use image::ImageFormat;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::objects::{get_dict, get_name, get_number, resolve, resolve_stream, stream_bytes};
use crate::error::ExtractError;
use crate::model::{PageImage, PixelBuffer, Rect};

/// Color model of an image's samples.
#[derive(Debug, Clone, PartialEq)]
enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
    Indexed {
        base: Box<ColorModel>,
        lookup: Vec<u8>,
    },
}

impl ColorModel {
    fn components(&self) -> u8 {
        match self {
            ColorModel::Gray => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
            ColorModel::Indexed { base, .. } => base.components(),
        }
    }
}

/// Decode every image XObject in `resources`, in dictionary order.
///
/// Each image gets its position as index; a failed decode still consumes
/// an index so file names stay stable.
pub(super) fn extract_images(
    doc: &Document,
    resources: Option<&Dictionary>,
    placements: &HashMap<ObjectId, Rect>,
) -> Vec<Result<PageImage, ExtractError>> {
    let Some(xobjects) = resources.and_then(|res| get_dict(doc, res, b"XObject")) else {
        return Vec::new();
    };

    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut images = Vec::new();

    for (_, entry) in xobjects.iter() {
        let id = entry.as_reference().ok();
        if let Some(id) = id {
            if !seen.insert(id) {
                continue;
            }
        }
        let Some(stream) = resolve_stream(doc, entry) else {
            continue;
        };
        if get_name(doc, &stream.dict, b"Subtype") != Some("Image") {
            continue;
        }

        let index = images.len();
        let placement = id.and_then(|id| placements.get(&id).copied());
        images.push(decode_image(doc, stream).map(|pixels| PageImage {
            index,
            placement,
            pixels,
        }));
    }

    images
}

/// Decode one image stream into 8-bit pixels.
fn decode_image(doc: &Document, stream: &Stream) -> Result<PixelBuffer, ExtractError> {
    let dict = &stream.dict;
    let width = get_number(doc, dict, b"Width").unwrap_or(0.0) as u32;
    let height = get_number(doc, dict, b"Height").unwrap_or(0.0) as u32;
    if width == 0 || height == 0 {
        return Err(ExtractError::UnsupportedImage(
            "missing image dimensions".to_string(),
        ));
    }

    if resolve_bool(doc, dict, b"ImageMask") == Some(true) {
        return Err(ExtractError::UnsupportedImage("stencil mask".to_string()));
    }

    let filters = filter_names(doc, dict);
    let mut pixels = if filters.iter().any(|f| f == "DCTDecode") {
        if filters.len() != 1 {
            return Err(ExtractError::UnsupportedImage(format!(
                "filter chain {:?}",
                filters
            )));
        }
        decode_jpeg(&stream.content)?
    } else if let Some(f) = filters
        .iter()
        .find(|f| matches!(f.as_str(), "JPXDecode" | "JBIG2Decode" | "CCITTFaxDecode"))
    {
        return Err(ExtractError::UnsupportedImage(f.clone()));
    } else {
        decode_raw(doc, stream, width, height)?
    };

    if let Some(alpha) = soft_mask(doc, dict, pixels.width, pixels.height) {
        pixels = with_alpha(pixels, &alpha);
    }

    Ok(pixels)
}

fn resolve_bool(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<bool> {
    dict.get(key)
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_bool().ok())
}

fn filter_names(doc: &Document, dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter").ok().and_then(|o| resolve(doc, o)) {
        Some(Object::Name(name)) => vec![String::from_utf8_lossy(name).into_owned()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|o| resolve(doc, o))
            .filter_map(|o| o.as_name_str().ok())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_jpeg(data: &[u8]) -> Result<PixelBuffer, ExtractError> {
    let decoded = image::load_from_memory_with_format(data, ImageFormat::Jpeg)?;
    let (width, height) = (decoded.width(), decoded.height());
    let (components, samples) = if decoded.color().channel_count() == 1 {
        (1, decoded.into_luma8().into_raw())
    } else {
        (3, decoded.into_rgb8().into_raw())
    };

    Ok(PixelBuffer {
        width,
        height,
        components,
        has_alpha: false,
        samples,
    })
}

fn decode_raw(
    doc: &Document,
    stream: &Stream,
    width: u32,
    height: u32,
) -> Result<PixelBuffer, ExtractError> {
    let dict = &stream.dict;
    let bpc = get_number(doc, dict, b"BitsPerComponent").unwrap_or(8.0) as u32;
    if !matches!(bpc, 1 | 2 | 4 | 8) {
        return Err(ExtractError::UnsupportedImage(format!(
            "{} bits per component",
            bpc
        )));
    }

    let model = match dict.get(b"ColorSpace") {
        Ok(cs) => color_model(doc, cs)?,
        Err(_) => ColorModel::Gray,
    };
    let data = stream_bytes(stream)?;

    let samples = match &model {
        ColorModel::Indexed { base, lookup } => {
            let indices = unpack_samples(&data, width, height, 1, bpc)?;
            let n = base.components() as usize;
            let mut out = Vec::with_capacity(indices.len() * n);
            for i in indices {
                let start = i as usize * n;
                match lookup.get(start..start + n) {
                    Some(color) => out.extend_from_slice(color),
                    None => out.extend(std::iter::repeat(0).take(n)),
                }
            }
            out
        }
        other => {
            let mut samples =
                unpack_samples(&data, width, height, other.components() as u32, bpc)?;
            if bpc < 8 {
                let max = (1u32 << bpc) - 1;
                for s in &mut samples {
                    *s = (*s as u32 * 255 / max) as u8;
                }
            }
            samples
        }
    };

    Ok(PixelBuffer {
        width,
        height,
        components: model.components(),
        has_alpha: false,
        samples,
    })
}

/// Resolve a `/ColorSpace` entry.
fn color_model(doc: &Document, obj: &Object) -> Result<ColorModel, ExtractError> {
    let unsupported = |what: &str| ExtractError::UnsupportedImage(format!("color space {}", what));

    match resolve(doc, obj) {
        Some(Object::Name(name)) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(ColorModel::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ColorModel::Rgb),
            b"DeviceCMYK" | b"CMYK" => Ok(ColorModel::Cmyk),
            other => Err(unsupported(&String::from_utf8_lossy(other))),
        },
        Some(Object::Array(items)) => {
            let family = items
                .first()
                .and_then(|o| resolve(doc, o))
                .and_then(|o| o.as_name_str().ok())
                .unwrap_or("");
            match family {
                "ICCBased" => {
                    let n = items
                        .get(1)
                        .and_then(|o| resolve_stream(doc, o))
                        .and_then(|s| get_number(doc, &s.dict, b"N"))
                        .unwrap_or(3.0) as u32;
                    match n {
                        1 => Ok(ColorModel::Gray),
                        3 => Ok(ColorModel::Rgb),
                        4 => Ok(ColorModel::Cmyk),
                        _ => Err(unsupported(&format!("ICCBased N={}", n))),
                    }
                }
                "CalGray" => Ok(ColorModel::Gray),
                "CalRGB" => Ok(ColorModel::Rgb),
                "Indexed" | "I" => {
                    let base = items
                        .get(1)
                        .ok_or_else(|| unsupported("Indexed without base"))
                        .and_then(|b| color_model(doc, b))?;
                    let lookup = match items.get(3).and_then(|o| resolve(doc, o)) {
                        Some(Object::String(bytes, _)) => bytes.clone(),
                        Some(Object::Stream(s)) => stream_bytes(s)?,
                        _ => return Err(unsupported("Indexed without lookup")),
                    };
                    Ok(ColorModel::Indexed {
                        base: Box::new(base),
                        lookup,
                    })
                }
                other => Err(unsupported(other)),
            }
        }
        _ => Err(unsupported("missing")),
    }
}

/// Expand packed samples to one byte each; rows are byte-aligned.
fn unpack_samples(
    data: &[u8],
    width: u32,
    height: u32,
    channels: u32,
    bpc: u32,
) -> Result<Vec<u8>, ExtractError> {
    let overflow = || ExtractError::UnsupportedImage(format!("image too large ({}x{})", width, height));
    let per_row = (width as usize)
        .checked_mul(channels as usize)
        .ok_or_else(overflow)?;
    let row_bytes = per_row
        .checked_mul(bpc as usize)
        .ok_or_else(overflow)?
        .div_ceil(8);
    let needed = row_bytes.checked_mul(height as usize).ok_or_else(overflow)?;
    if data.len() < needed {
        return Err(ExtractError::UnsupportedImage(format!(
            "truncated image data ({} of {} bytes)",
            data.len(),
            needed
        )));
    }

    if bpc == 8 {
        return Ok(data[..needed].to_vec());
    }

    let mask = (1u16 << bpc) - 1;
    let mut out = Vec::with_capacity(needed);
    for row in data[..needed].chunks(row_bytes) {
        for i in 0..per_row {
            let bit = i * bpc as usize;
            let byte = row[bit / 8] as u16;
            let shift = 8 - bpc as usize - bit % 8;
            out.push(((byte >> shift) & mask) as u8);
        }
    }
    Ok(out)
}

/// 8-bit gray soft mask matching the image size, when present.
fn soft_mask(doc: &Document, dict: &Dictionary, width: u32, height: u32) -> Option<Vec<u8>> {
    let mask = dict.get(b"SMask").ok().and_then(|o| resolve_stream(doc, o))?;
    let mask_width = get_number(doc, &mask.dict, b"Width")? as u32;
    let mask_height = get_number(doc, &mask.dict, b"Height")? as u32;
    let bpc = get_number(doc, &mask.dict, b"BitsPerComponent").unwrap_or(8.0) as u32;
    if mask_width != width || mask_height != height || bpc != 8 {
        log::debug!("ignoring soft mask that does not match its image");
        return None;
    }

    let data = match stream_bytes(mask) {
        Ok(data) => data,
        Err(e) => {
            log::debug!("ignoring unreadable soft mask: {}", e);
            return None;
        }
    };
    let needed = (width as usize).checked_mul(height as usize)?;
    (data.len() >= needed).then(|| data[..needed].to_vec())
}

fn with_alpha(pixels: PixelBuffer, alpha: &[u8]) -> PixelBuffer {
    let n = pixels.components as usize;
    let mut samples = Vec::with_capacity(pixels.samples.len() + alpha.len());
    for (color, a) in pixels.samples.chunks(n).zip(alpha) {
        samples.extend_from_slice(color);
        samples.push(*a);
    }
    PixelBuffer {
        has_alpha: true,
        samples,
        ..pixels
    }
}
