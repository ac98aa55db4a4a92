//! Two-phase export: decode every image, then draw and encode.

use crate::error::{RenderError, RenderResult};
use crate::fonts::FontBook;
use crate::images::{ImageLoader, load_images};
use crate::raster::{output_size, rasterize};
use postercraft_core::canvas::Document;
use tiny_skia::Pixmap;

/// Result of exporting a document to PNG.
#[derive(Debug, Clone)]
pub struct PngExport {
    pub png_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Suggested download name, e.g. `Summer_Sale_1600x1200.png`.
    pub file_name: String,
}

/// Decode all images referenced by `doc`, then rasterize it.
///
/// Drawing only starts once every decode has settled.
pub async fn render<L: ImageLoader + ?Sized>(
    doc: &Document,
    fonts: &FontBook,
    loader: &L,
    scale: f64,
) -> RenderResult<Pixmap> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RenderError::InvalidScale(scale));
    }
    let images = load_images(loader, doc).await;
    rasterize(doc, fonts, &images, scale)
}

/// Render and encode as PNG.
pub async fn export_png<L: ImageLoader + ?Sized>(
    doc: &Document,
    fonts: &FontBook,
    loader: &L,
    scale: f64,
    project_name: &str,
) -> RenderResult<PngExport> {
    let pixmap = render(doc, fonts, loader, scale).await?;
    let png_data = encode_png(&pixmap)?;
    let (width, height) = (pixmap.width(), pixmap.height());
    let file_name = export_file_name(project_name, scale, width, height);
    log::info!("Exported {file_name} ({width}x{height}, {} bytes)", png_data.len());
    Ok(PngExport {
        png_data,
        width,
        height,
        file_name,
    })
}

/// [`render`] driven to completion on the current thread.
pub fn render_blocking<L: ImageLoader + ?Sized>(
    doc: &Document,
    fonts: &FontBook,
    loader: &L,
    scale: f64,
) -> RenderResult<Pixmap> {
    pollster::block_on(render(doc, fonts, loader, scale))
}

/// [`export_png`] driven to completion on the current thread.
pub fn export_png_blocking<L: ImageLoader + ?Sized>(
    doc: &Document,
    fonts: &FontBook,
    loader: &L,
    scale: f64,
    project_name: &str,
) -> RenderResult<PngExport> {
    pollster::block_on(export_png(doc, fonts, loader, scale, project_name))
}

/// Encode a pixmap as 8-bit RGBA PNG (straight alpha).
pub fn encode_png(pixmap: &Pixmap) -> RenderResult<Vec<u8>> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encode(format!("Failed to write PNG header: {e}")))?;
        writer
            .write_image_data(&rgba)
            .map_err(|e| RenderError::Encode(format!("Failed to write PNG data: {e}")))?;
        writer
            .finish()
            .map_err(|e| RenderError::Encode(format!("Failed to finish PNG: {e}")))?;
    }
    Ok(png_data)
}

/// File name for an export: the project name with every non-alphanumeric
/// character replaced by `_`, plus `_{width}x{height}` when not exported at 1x.
pub fn export_file_name(project_name: &str, scale: f64, width: u32, height: u32) -> String {
    let mut stem: String = project_name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if stem.is_empty() {
        stem.push_str("untitled");
    }
    if (scale - 1.0).abs() > f64::EPSILON {
        stem.push_str(&format!("_{width}x{height}"));
    }
    format!("{stem}.png")
}

/// Output dimensions `doc` would have at `scale`, for naming before rendering.
pub fn export_dimensions(doc: &Document, scale: f64) -> (u32, u32) {
    output_size(doc, scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::DataUriLoader;
    use postercraft_core::canvas::{Background, CanvasSettings, CanvasSize};
    use kurbo::Point;
    use postercraft_core::id::{IdGenerator, SeededIds};
    use postercraft_core::shapes::{Element, SerializableColor, Text, TextShadow};

    fn small_doc() -> Document {
        Document::with_settings(CanvasSettings {
            background: Background::Solid {
                color: SerializableColor::new(10, 20, 30, 255),
            },
            canvas_size: CanvasSize::custom(120.0, 80.0),
            ..Default::default()
        })
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name("Summer Sale!", 1.0, 800, 600), "Summer_Sale_.png");
        assert_eq!(export_file_name("Summer Sale", 2.0, 1600, 1200), "Summer_Sale_1600x1200.png");
        assert_eq!(export_file_name("", 1.0, 10, 10), "untitled.png");
        assert_eq!(export_file_name("café/2024", 1.0, 10, 10), "caf__2024.png");
    }

    #[test]
    fn test_encode_png_roundtrips_pixels() {
        let pixmap = rasterize(&small_doc(), &FontBook::new(), &Default::default(), 1.0).unwrap();
        let data = encode_png(&pixmap).unwrap();
        assert_eq!(&data[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&data).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (120, 80));
        assert_eq!(decoded.get_pixel(5, 5).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_export_png_names_and_sizes_output() {
        let fonts = FontBook::new();
        let export =
            export_png_blocking(&small_doc(), &fonts, &DataUriLoader, 2.0, "My Poster").unwrap();
        assert_eq!((export.width, export.height), (240, 160));
        assert_eq!(export.file_name, "My_Poster_240x160.png");
        assert_eq!(export_dimensions(&small_doc(), 2.0), (240, 160));
    }

    #[test]
    fn test_exports_with_text_are_byte_identical() {
        let mut doc = small_doc();
        let mut ids = SeededIds::new(5);
        let mut text = Text::new(ids.next_id(), Point::new(4.0, 4.0), "Big Summer Sale".into());
        text.font_size = 18.0;
        text.width = 110.0;
        text.rotation = 12.0;
        text.color = SerializableColor::white();
        text.shadow = Some(TextShadow::default());
        text.z_index = 1;
        doc.push(Element::Text(text));

        let a = export_png_blocking(&doc, &FontBook::new(), &DataUriLoader, 1.0, "p").unwrap();
        let b = export_png_blocking(&doc, &FontBook::new(), &DataUriLoader, 1.0, "p").unwrap();
        assert_eq!(a.png_data, b.png_data);

        // The text actually reached the image.
        let blank =
            export_png_blocking(&small_doc(), &FontBook::new(), &DataUriLoader, 1.0, "p").unwrap();
        assert_ne!(a.png_data, blank.png_data);
    }

    #[test]
    fn test_render_rejects_bad_scale() {
        let err = render_blocking(&small_doc(), &FontBook::new(), &DataUriLoader, 0.0).unwrap_err();
        assert!(matches!(err, RenderError::InvalidScale(s) if s == 0.0));
    }
}
