//! Image conversion: color normalization, downsampling and encoding.

use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, RgbImage, RgbaImage};

use super::{ImageMode, ImageOptions};
use crate::error::ExtractError;
use crate::model::{Element, ElementKind, PageImage, PixelBuffer};

const JPEG_QUALITY: u8 = 85;

/// Output encoding chosen for an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    Png,
    Jpeg,
}

impl ImageEncoding {
    pub fn extension(self) -> &'static str {
        match self {
            ImageEncoding::Png => "png",
            ImageEncoding::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageEncoding::Png => "image/png",
            ImageEncoding::Jpeg => "image/jpeg",
        }
    }
}

/// An image ready to be referenced from Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub encoding: ImageEncoding,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// File name of the `index`-th image of a page.
pub fn image_file_name(page: u32, index: usize, encoding: ImageEncoding) -> String {
    format!("page_{}_img_{}.{}", page, index, encoding.extension())
}

/// Turns decoded page images into Markdown image references.
#[derive(Debug, Clone)]
pub struct ImageHandler<'a> {
    options: &'a ImageOptions,
}

impl<'a> ImageHandler<'a> {
    pub fn new(options: &'a ImageOptions) -> Self {
        Self { options }
    }

    /// Convert and encode one image.
    ///
    /// More than three color channels are folded to RGB. Images with alpha
    /// are written as PNG, everything else as JPEG.
    pub fn encode(&self, pixels: &PixelBuffer) -> Result<EncodedImage, ExtractError> {
        let image = to_dynamic_image(pixels)?;
        let image = self.downsample(image);
        let encoding = if pixels.has_alpha {
            ImageEncoding::Png
        } else {
            ImageEncoding::Jpeg
        };

        let mut bytes = Vec::new();
        match encoding {
            ImageEncoding::Png => image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?,
            ImageEncoding::Jpeg => {
                image.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY))?
            }
        }

        Ok(EncodedImage {
            encoding,
            width: image.width(),
            height: image.height(),
            bytes,
        })
    }

    /// Shrink to fit the configured bounds, keeping the aspect ratio.
    fn downsample(&self, image: DynamicImage) -> DynamicImage {
        let (max_w, max_h) = (self.options.max_width, self.options.max_height);
        if !self.options.downsample || max_w == 0 || max_h == 0 {
            return image;
        }
        if image.width() <= max_w && image.height() <= max_h {
            return image;
        }
        log::debug!(
            "downsampling {}x{} image to fit {}x{}",
            image.width(),
            image.height(),
            max_w,
            max_h
        );
        image.resize(max_w, max_h, FilterType::Lanczos3)
    }

    /// Markdown element for one image, or `None` when images are omitted.
    ///
    /// In file mode the encoded bytes are written to the configured
    /// directory, which must already exist.
    pub fn render(
        &self,
        image: &PageImage,
        page_number: u32,
    ) -> Result<Option<Element>, ExtractError> {
        if self.options.mode == ImageMode::Omit {
            return Ok(None);
        }

        let encoded = self.encode(&image.pixels)?;
        let target = match &self.options.mode {
            ImageMode::Files { dir, link_prefix } => {
                let name = image_file_name(page_number, image.index, encoded.encoding);
                std::fs::write(dir.join(&name), &encoded.bytes)?;
                format!("{}{}", link_prefix, name)
            }
            _ => format!(
                "data:{};base64,{}",
                encoded.encoding.mime_type(),
                general_purpose::STANDARD.encode(&encoded.bytes)
            ),
        };

        let y = image.placement.map(|r| r.y0).unwrap_or(0.0);
        let markdown = format!("![Image page {}]({})", page_number, target);
        Ok(Some(
            Element::new(ElementKind::Image, y, markdown).with_bbox(image.placement),
        ))
    }
}

/// Build an `image` buffer from 8-bit samples, folding CMYK to RGB.
fn to_dynamic_image(pixels: &PixelBuffer) -> Result<DynamicImage, ExtractError> {
    if !pixels.is_consistent() {
        return Err(ExtractError::UnsupportedImage(format!(
            "{}x{} image with {} samples",
            pixels.width,
            pixels.height,
            pixels.samples.len()
        )));
    }

    let (w, h) = (pixels.width, pixels.height);
    let samples = pixels.samples.clone();
    let image = match (pixels.components, pixels.has_alpha) {
        (1, false) => GrayImage::from_raw(w, h, samples).map(DynamicImage::ImageLuma8),
        (1, true) => GrayAlphaImage::from_raw(w, h, samples).map(DynamicImage::ImageLumaA8),
        (3, false) => RgbImage::from_raw(w, h, samples).map(DynamicImage::ImageRgb8),
        (3, true) => RgbaImage::from_raw(w, h, samples).map(DynamicImage::ImageRgba8),
        (4, false) => RgbImage::from_raw(w, h, cmyk_to_rgb(&samples, false))
            .map(DynamicImage::ImageRgb8),
        (4, true) => RgbaImage::from_raw(w, h, cmyk_to_rgb(&samples, true))
            .map(DynamicImage::ImageRgba8),
        (n, _) => {
            return Err(ExtractError::UnsupportedImage(format!(
                "{} color components",
                n
            )))
        }
    };

    image.ok_or_else(|| ExtractError::UnsupportedImage("sample buffer too small".to_string()))
}

/// Naive CMYK to RGB; an alpha sample after K is carried over.
fn cmyk_to_rgb(samples: &[u8], has_alpha: bool) -> Vec<u8> {
    let stride = if has_alpha { 5 } else { 4 };
    let out_stride = if has_alpha { 4 } else { 3 };
    let mut rgb = Vec::with_capacity(samples.len() / stride * out_stride);

    for px in samples.chunks_exact(stride) {
        let k = 255 - u16::from(px[3]);
        for &c in &px[..3] {
            rgb.push(((255 - u16::from(c)) * k / 255) as u8);
        }
        if has_alpha {
            rgb.push(px[4]);
        }
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rect;

    fn pixels(width: u32, height: u32, components: u8, has_alpha: bool) -> PixelBuffer {
        let channels = components as usize + usize::from(has_alpha);
        PixelBuffer {
            width,
            height,
            components,
            has_alpha,
            samples: vec![128; width as usize * height as usize * channels],
        }
    }

    fn page_image(pixels: PixelBuffer, placement: Option<Rect>) -> PageImage {
        PageImage {
            index: 0,
            placement,
            pixels,
        }
    }

    #[test]
    fn test_cmyk_to_rgb() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0], false), vec![255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255], false), vec![0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 0, 0, 77], true), vec![0, 255, 255, 77]);
    }

    #[test]
    fn test_encoding_follows_alpha() {
        let options = ImageOptions::default();
        let handler = ImageHandler::new(&options);

        let jpeg = handler.encode(&pixels(4, 4, 3, false)).unwrap();
        assert_eq!(jpeg.encoding, ImageEncoding::Jpeg);
        assert_eq!(&jpeg.bytes[..2], &[0xFFu8, 0xD8]);

        let png = handler.encode(&pixels(4, 4, 1, true)).unwrap();
        assert_eq!(png.encoding, ImageEncoding::Png);
        assert_eq!(&png.bytes[1..4], b"PNG");

        let cmyk = handler.encode(&pixels(2, 2, 4, false)).unwrap();
        assert_eq!(cmyk.encoding, ImageEncoding::Jpeg);
    }

    #[test]
    fn test_downsample_keeps_aspect_ratio() {
        let options = ImageOptions::default();
        let handler = ImageHandler::new(&options);
        let encoded = handler.encode(&pixels(1600, 400, 3, false)).unwrap();
        assert_eq!((encoded.width, encoded.height), (800, 200));

        let small = handler.encode(&pixels(100, 50, 3, false)).unwrap();
        assert_eq!((small.width, small.height), (100, 50));
    }

    #[test]
    fn test_downsample_disabled() {
        let options = ImageOptions {
            downsample: false,
            ..Default::default()
        };
        let encoded = ImageHandler::new(&options)
            .encode(&pixels(900, 10, 1, false))
            .unwrap();
        assert_eq!(encoded.width, 900);
    }

    #[test]
    fn test_inconsistent_buffer_is_an_error() {
        let mut bad = pixels(4, 4, 3, false);
        bad.samples.truncate(10);
        let options = ImageOptions::default();
        assert!(ImageHandler::new(&options).encode(&bad).is_err());

        let two = pixels(2, 2, 2, false);
        assert!(matches!(
            ImageHandler::new(&options).encode(&two),
            Err(ExtractError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn test_render_embedded() {
        let options = ImageOptions::default();
        let image = page_image(pixels(3, 3, 3, false), Some(Rect::new(0.0, 150.0, 50.0, 200.0)));
        let element = ImageHandler::new(&options)
            .render(&image, 2)
            .unwrap()
            .unwrap();
        assert_eq!(element.kind, ElementKind::Image);
        assert_eq!(element.y, 150.0);
        assert!(element
            .content
            .starts_with("![Image page 2](data:image/jpeg;base64,"));
    }

    #[test]
    fn test_render_to_files() {
        let temp = tempfile::tempdir().unwrap();
        let options = ImageOptions {
            mode: ImageMode::Files {
                dir: temp.path().to_path_buf(),
                link_prefix: "images/".to_string(),
            },
            ..Default::default()
        };
        let mut image = page_image(pixels(3, 3, 3, true), None);
        image.index = 4;

        let element = ImageHandler::new(&options)
            .render(&image, 7)
            .unwrap()
            .unwrap();
        assert_eq!(element.content, "![Image page 7](images/page_7_img_4.png)");
        assert_eq!(element.y, 0.0);
        assert!(temp.path().join("page_7_img_4.png").is_file());
    }

    #[test]
    fn test_render_omitted() {
        let options = ImageOptions {
            mode: ImageMode::Omit,
            ..Default::default()
        };
        let image = page_image(pixels(3, 3, 3, false), None);
        assert_eq!(ImageHandler::new(&options).render(&image, 1).unwrap(), None);
    }
}
