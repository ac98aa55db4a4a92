//! Image sources: loading, the decode barrier before drawing, and filters.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures_util::future::join_all;
use image::RgbaImage;
use postercraft_core::canvas::Document;
use postercraft_core::shapes::{Element, ImageFilters};
use postercraft_core::storage::BoxFuture;
use std::collections::{BTreeSet, HashMap};

/// Turns an image element's `src` into pixels.
///
/// Loading never fails the batch: an unusable source resolves to `None`.
pub trait ImageLoader {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Option<RgbaImage>>;
}

/// Decodes `data:` URIs (base64 or raw payload) with the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriLoader;

impl DataUriLoader {
    /// Payload bytes of a `data:[<mime>][;base64],<payload>` URI.
    pub fn payload(src: &str) -> Option<Vec<u8>> {
        let rest = src.trim().strip_prefix("data:")?;
        let (meta, data) = rest.split_once(',')?;
        if meta.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
            let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD.decode(cleaned).ok()
        } else {
            Some(data.as_bytes().to_vec())
        }
    }

    pub fn decode(src: &str) -> Option<RgbaImage> {
        let Some(bytes) = Self::payload(src) else {
            log::warn!("image source is not a usable data URI");
            return None;
        };
        match image::load_from_memory(&bytes) {
            Ok(decoded) => Some(decoded.to_rgba8()),
            Err(e) => {
                log::warn!("failed to decode image: {e}");
                None
            }
        }
    }
}

impl ImageLoader for DataUriLoader {
    fn load<'a>(&'a self, src: &'a str) -> BoxFuture<'a, Option<RgbaImage>> {
        Box::pin(async move { Self::decode(src) })
    }
}

/// Decoded images keyed by source. Sources that failed to load are absent.
#[derive(Debug, Default, Clone)]
pub struct ImageCache {
    images: HashMap<String, RgbaImage>,
}

impl ImageCache {
    pub fn get(&self, src: &str) -> Option<&RgbaImage> {
        self.images.get(src)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn insert(&mut self, src: impl Into<String>, image: RgbaImage) {
        self.images.insert(src.into(), image);
    }
}

/// Every distinct image source in the document, groups included.
pub fn collect_image_sources(doc: &Document) -> Vec<String> {
    doc.elements
        .iter()
        .filter_map(|e| match e.as_ref() {
            Element::Image(image) => Some(image.src.clone()),
            _ => None,
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Start every decode at once and wait for all of them to settle.
pub async fn load_images<L: ImageLoader + ?Sized>(loader: &L, doc: &Document) -> ImageCache {
    let sources = collect_image_sources(doc);
    let results = join_all(sources.iter().map(|src| loader.load(src))).await;

    let mut cache = ImageCache::default();
    let mut failed = 0;
    for (src, result) in sources.into_iter().zip(results) {
        match result {
            Some(image) => cache.insert(src, image),
            None => failed += 1,
        }
    }
    if failed > 0 {
        log::warn!("{failed} image(s) could not be loaded and will be skipped");
    }
    cache
}

/// Apply grayscale, brightness and contrast (CSS filter semantics, in that
/// order) and then a gaussian blur with `blur_sigma` in source pixels.
pub fn apply_filters(image: &RgbaImage, filters: &ImageFilters, blur_sigma: f64) -> RgbaImage {
    let mut out = image.clone();
    if !filters.is_identity() {
        let matrix = color_matrix(filters);
        for pixel in out.pixels_mut() {
            let [r, g, b, a] = pixel.0;
            let rgb = [r as f64, g as f64, b as f64];
            let mut mapped = [0u8; 3];
            for (channel, row) in mapped.iter_mut().zip(matrix.iter()) {
                let v = row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2] + row[3] * 255.0;
                *channel = v.round().clamp(0.0, 255.0) as u8;
            }
            pixel.0 = [mapped[0], mapped[1], mapped[2], a];
        }
    }
    if blur_sigma > 0.0 {
        out = image::imageops::blur(&out, blur_sigma as f32);
    }
    out
}

/// 3x4 affine color matrix (last column is an offset in unit range).
type ColorMatrix = [[f64; 4]; 3];

fn multiply(a: &ColorMatrix, b: &ColorMatrix) -> ColorMatrix {
    let mut out = [[0.0; 4]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum::<f64>();
            if j == 3 {
                *cell += a[i][3];
            }
        }
    }
    out
}

/// Combined matrix for grayscale, then brightness, then contrast.
fn color_matrix(filters: &ImageFilters) -> ColorMatrix {
    let g = (filters.grayscale / 100.0).clamp(0.0, 1.0);
    let inv = 1.0 - g;
    let grayscale = [
        [0.2126 + 0.7874 * inv, 0.7152 - 0.7152 * inv, 0.0722 - 0.0722 * inv, 0.0],
        [0.2126 - 0.2126 * inv, 0.7152 + 0.2848 * inv, 0.0722 - 0.0722 * inv, 0.0],
        [0.2126 - 0.2126 * inv, 0.7152 - 0.7152 * inv, 0.0722 + 0.9278 * inv, 0.0],
    ];
    let b = (filters.brightness / 100.0).max(0.0);
    let brightness = [[b, 0.0, 0.0, 0.0], [0.0, b, 0.0, 0.0], [0.0, 0.0, b, 0.0]];
    let c = (filters.contrast / 100.0).max(0.0);
    let offset = 0.5 - 0.5 * c;
    let contrast = [[c, 0.0, 0.0, offset], [0.0, c, 0.0, offset], [0.0, 0.0, c, offset]];

    multiply(&contrast, &multiply(&brightness, &grayscale))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pollster::block_on;
    use postercraft_core::id::{IdGenerator, SeededIds};
    use postercraft_core::shapes::{Group, Image};
    use kurbo::{Point, Size};
    use std::io::Cursor;

    fn png_data_uri(width: u32, height: u32, color: [u8; 4]) -> String {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(bytes))
    }

    #[test]
    fn test_decode_data_uri() {
        let uri = png_data_uri(3, 2, [255, 0, 0, 255]);
        let img = DataUriLoader::decode(&uri).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_bad_sources_resolve_to_none() {
        assert!(DataUriLoader::decode("https://example.com/a.png").is_none());
        assert!(DataUriLoader::decode("data:image/png;base64,!!!").is_none());
        assert!(DataUriLoader::decode("data:image/png;base64,AAAA").is_none());
    }

    #[test]
    fn test_load_images_gathers_all_sources() {
        let mut ids = SeededIds::new(2);
        let good = png_data_uri(1, 1, [0, 0, 255, 255]);
        let mut doc = Document::new();
        let a = ids.next_id();
        let size = Size::new(10.0, 10.0);
        doc.push(Element::Image(Image::new(a, Point::ZERO, size, good.clone(), "a".into())));
        let b = ids.next_id();
        let broken = "data:,broken".to_string();
        doc.push(Element::Image(Image::new(b, Point::ZERO, size, broken, "b".into())));
        // Same source inside a group is decoded once.
        let c = ids.next_id();
        doc.push(Element::Image(Image::new(c, Point::ZERO, size, good.clone(), "c".into())));
        doc.push(Element::Group(Group::new(ids.next_id(), Point::ZERO, size, vec![c])));

        assert_eq!(collect_image_sources(&doc).len(), 2);
        let cache = block_on(load_images(&DataUriLoader, &doc));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&good).is_some());
        assert!(cache.get("data:,broken").is_none());
    }

    fn filtered(color: [u8; 4], filters: ImageFilters) -> [u8; 4] {
        let img = RgbaImage::from_pixel(1, 1, Rgba(color));
        apply_filters(&img, &filters, 0.0).get_pixel(0, 0).0
    }

    #[test]
    fn test_identity_filters_keep_pixels() {
        assert_eq!(filtered([10, 200, 30, 128], ImageFilters::default()), [10, 200, 30, 128]);
    }

    #[test]
    fn test_grayscale_equalizes_channels() {
        let [r, g, b, a] = filtered(
            [255, 0, 0, 255],
            ImageFilters {
                grayscale: 100.0,
                ..Default::default()
            },
        );
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(r, 54);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_brightness_and_contrast() {
        let dark = filtered(
            [200, 100, 50, 255],
            ImageFilters {
                brightness: 0.0,
                ..Default::default()
            },
        );
        assert_eq!(dark, [0, 0, 0, 255]);

        let flat = filtered(
            [200, 100, 50, 255],
            ImageFilters {
                contrast: 0.0,
                ..Default::default()
            },
        );
        assert_eq!(flat, [128, 128, 128, 255]);
    }

    #[test]
    fn test_blur_spreads_pixels() {
        let mut img = RgbaImage::from_pixel(9, 9, Rgba([0, 0, 0, 255]));
        img.put_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let blurred = apply_filters(&img, &ImageFilters::default(), 1.5);
        assert!(blurred.get_pixel(4, 4).0[0] < 255);
        assert!(blurred.get_pixel(5, 4).0[0] > 0);
    }
}
