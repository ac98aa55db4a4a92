//! CPU rasterization of a document with tiny-skia.
//!
//! Geometry is built in canvas coordinates as kurbo paths and drawn through
//! the element's center transform composed with the export scale.

use crate::error::{RenderError, RenderResult};
use crate::fonts::FontBook;
use crate::images::{ImageCache, apply_filters};
use image::RgbaImage;
use kurbo::{Affine, BezPath, Circle, Ellipse, PathEl, Point, Rect, RoundedRect, Shape as _};
use postercraft_core::canvas::{Background, Document, GradientDirection};
use postercraft_core::geometry::element_affine;
use postercraft_core::id::ElementId;
use postercraft_core::layout::{FontSpec, layout_text};
use postercraft_core::shapes::{Element, Image, SerializableColor, Shape, ShapeType, Text};
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, GradientStop, LineCap, LineJoin, LinearGradient, Paint, Path,
    PathBuilder, Pixmap, PixmapPaint, SpreadMode, Stroke, Transform,
};

/// Curve flattening tolerance for kurbo shapes, in canvas pixels.
const TOLERANCE: f64 = 0.1;

/// Render `doc` at `scale` device pixels per canvas pixel.
///
/// Images must already be decoded into `images`; sources missing from the
/// cache are skipped. Text is re-wrapped with `fonts` first, so each text
/// box rotates about the center of the lines actually drawn.
pub fn rasterize(
    doc: &Document,
    fonts: &FontBook,
    images: &ImageCache,
    scale: f64,
) -> RenderResult<Pixmap> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RenderError::InvalidScale(scale));
    }
    if fonts.is_empty() && doc.elements.iter().any(|e| e.as_text().is_some()) {
        return Err(RenderError::Font("no font faces registered to draw text".into()));
    }
    let (width, height) = output_size(doc, scale);
    let mut pixmap =
        Pixmap::new(width, height).ok_or(RenderError::SurfaceAllocation { width, height })?;

    let mut doc = doc.clone();
    let relaid = doc.relayout_text(fonts);
    if relaid > 0 {
        log::debug!("re-wrapped {relaid} text element(s) with the export fonts");
    }

    let painter = Painter {
        doc: &doc,
        fonts,
        images,
        scale,
        base: Affine::scale(scale),
    };
    painter.background(&mut pixmap);

    let mut visiting = Vec::new();
    for element in doc.top_level() {
        painter.element(&mut pixmap, element, element.position(), Affine::IDENTITY, &mut visiting);
    }
    Ok(pixmap)
}

/// Pixel dimensions of the output surface.
pub fn output_size(doc: &Document, scale: f64) -> (u32, u32) {
    let px = |v: f64| (v * scale).round().max(1.0) as u32;
    (px(doc.canvas_width()), px(doc.canvas_height()))
}

struct Painter<'a> {
    doc: &'a Document,
    fonts: &'a FontBook,
    images: &'a ImageCache,
    scale: f64,
    base: Affine,
}

impl Painter<'_> {
    fn background(&self, pixmap: &mut Pixmap) {
        match &self.doc.canvas_settings.background {
            Background::Solid { color } => pixmap.fill(skia_color(color, 1.0)),
            Background::Gradient { direction, start, end } => {
                let (w, h) = (self.doc.canvas_width() as f32, self.doc.canvas_height() as f32);
                let to = match direction {
                    GradientDirection::Horizontal => tiny_skia::Point::from_xy(w, 0.0),
                    GradientDirection::Vertical => tiny_skia::Point::from_xy(0.0, h),
                    GradientDirection::Diagonal => tiny_skia::Point::from_xy(w, h),
                };
                let shader = LinearGradient::new(
                    tiny_skia::Point::from_xy(0.0, 0.0),
                    to,
                    vec![
                        GradientStop::new(0.0, skia_color(start, 1.0)),
                        GradientStop::new(1.0, skia_color(end, 1.0)),
                    ],
                    SpreadMode::Pad,
                    to_transform(self.base),
                );
                let rect = tiny_skia::Rect::from_xywh(0.0, 0.0, w, h);
                let (Some(shader), Some(rect)) = (shader, rect) else {
                    pixmap.fill(skia_color(start, 1.0));
                    return;
                };
                let paint = Paint {
                    shader,
                    anti_alias: true,
                    ..Default::default()
                };
                pixmap.fill_rect(rect, &paint, to_transform(self.base), None);
            }
        }
    }

    /// Draw one element whose top-left sits at `origin` in canvas space,
    /// inside the accumulated transform of its ancestor groups.
    fn element(
        &self,
        pixmap: &mut Pixmap,
        element: &Element,
        origin: Point,
        parent: Affine,
        visiting: &mut Vec<ElementId>,
    ) {
        let own = element_affine(origin, element.size(), element.rotation(), element.scale());
        let affine = parent * own;
        let device = self.base * affine;
        match element {
            Element::Shape(shape) => self.shape(pixmap, shape, origin, device),
            Element::Text(text) => self.text(pixmap, text, origin, device),
            Element::Image(image) => self.image(pixmap, image, origin, device),
            Element::Group(group) => {
                let id = element.id();
                if visiting.contains(&id) {
                    log::warn!("group cycle at {id}, skipping");
                    return;
                }
                visiting.push(id);
                let mut children: Vec<&Element> = group
                    .child_ids
                    .iter()
                    .filter_map(|child| self.doc.get(*child))
                    .collect();
                children.sort_by_key(|c| c.z_index());
                for child in children {
                    let child_origin = origin + child.position().to_vec2();
                    self.element(pixmap, child, child_origin, affine, visiting);
                }
                visiting.pop();
            }
        }
    }

    fn shape(&self, pixmap: &mut Pixmap, shape: &Shape, origin: Point, device: Affine) {
        let Some(path) = shape_path(shape, origin).and_then(|p| to_skia_path(&p)) else {
            return;
        };
        let transform = to_transform(device);

        let fill = shape.fill_color.with_opacity(shape.opacity).to_rgba8();
        if shape.shape_type != ShapeType::Line && fill.a > 0 {
            let paint = solid_paint(&shape.fill_color, shape.opacity);
            pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
        }
        if shape.stroke_width > 0.0 {
            let stroke = Stroke {
                width: shape.stroke_width as f32,
                line_cap: if shape.shape_type == ShapeType::Line {
                    LineCap::Round
                } else {
                    LineCap::Butt
                },
                line_join: LineJoin::Miter,
                ..Default::default()
            };
            let paint = solid_paint(&shape.stroke_color, shape.opacity);
            pixmap.stroke_path(&path, &paint, &stroke, transform, None);
        }
    }

    fn text(&self, pixmap: &mut Pixmap, text: &Text, origin: Point, device: Affine) {
        let spec = FontSpec::of(text);
        let layout = layout_text(text, self.fonts);
        let ascent = self.fonts.ascent(&spec);

        let mut glyphs = BezPath::new();
        let mut synthetic_bold = false;
        for line in &layout.lines {
            let baseline = Point::new(origin.x + line.x, origin.y + line.top + ascent);
            let Some((path, face)) = self.fonts.text_path(&line.text, &spec, baseline) else {
                log::warn!("no font face for family '{}'", text.font_family);
                return;
            };
            synthetic_bold |= face.synthetic_bold;
            glyphs.extend(path.elements().iter().copied());
        }
        let Some(path) = to_skia_path(&glyphs) else {
            return;
        };
        let embolden = synthetic_bold.then(|| Stroke {
            width: (text.font_size / 24.0) as f32,
            line_join: LineJoin::Round,
            ..Default::default()
        });

        if let Some(shadow) = text.active_shadow() {
            let offset =
                Affine::translate((shadow.offset_x * self.scale, shadow.offset_y * self.scale));
            match Pixmap::new(pixmap.width(), pixmap.height()) {
                Some(mut layer) => {
                    let paint = solid_paint(&shadow.color, text.opacity);
                    let transform = to_transform(offset * device);
                    layer.fill_path(&path, &paint, FillRule::Winding, transform, None);
                    if let Some(stroke) = &embolden {
                        layer.stroke_path(&path, &paint, stroke, transform, None);
                    }
                    blur_premultiplied(&mut layer, (shadow.blur / 2.0 * self.scale) as f32);
                    pixmap.draw_pixmap(
                        0,
                        0,
                        layer.as_ref(),
                        &PixmapPaint::default(),
                        Transform::identity(),
                        None,
                    );
                }
                None => log::warn!("could not allocate a shadow layer, drawing text without it"),
            }
        }

        let paint = solid_paint(&text.color, text.opacity);
        let transform = to_transform(device);
        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
        if let Some(stroke) = &embolden {
            pixmap.stroke_path(&path, &paint, stroke, transform, None);
        }
    }

    fn image(&self, pixmap: &mut Pixmap, image: &Image, origin: Point, device: Affine) {
        let Some(source) = self.images.get(&image.src) else {
            log::debug!("image '{}' has no decoded source, skipping", image.name);
            return;
        };
        let (src_w, src_h) = source.dimensions();
        if src_w == 0 || src_h == 0 || image.size.width <= 0.0 || image.size.height <= 0.0 {
            return;
        }
        // Blur is given in canvas pixels; express it in source pixels so the
        // result does not depend on the export scale.
        let sigma = image.filters.blur.max(0.0) * src_w as f64 / image.size.width;
        let filtered = apply_filters(source, &image.filters, sigma);
        let Some(layer) = to_pixmap(&filtered) else {
            return;
        };
        let placement = device
            * Affine::translate(origin.to_vec2())
            * Affine::scale_non_uniform(
                image.size.width / src_w as f64,
                image.size.height / src_h as f64,
            );
        let paint = PixmapPaint {
            opacity: image.opacity.clamp(0.0, 1.0) as f32,
            quality: FilterQuality::Bicubic,
            ..Default::default()
        };
        pixmap.draw_pixmap(0, 0, layer.as_ref(), &paint, to_transform(placement), None);
    }
}

/// Outline of a shape in canvas coordinates.
fn shape_path(shape: &Shape, origin: Point) -> Option<BezPath> {
    let rect = Rect::from_origin_size(origin, shape.size);
    let path = match shape.shape_type {
        ShapeType::Rectangle => {
            let radius = shape.effective_border_radius();
            if radius > 0.0 {
                RoundedRect::from_rect(rect, radius).to_path(TOLERANCE)
            } else {
                rect.to_path(TOLERANCE)
            }
        }
        ShapeType::Circle => {
            Circle::new(rect.center(), rect.width().min(rect.height()) / 2.0).to_path(TOLERANCE)
        }
        ShapeType::Ellipse => Ellipse::from_rect(rect).to_path(TOLERANCE),
        ShapeType::Line | ShapeType::Triangle | ShapeType::Polygon => {
            let mut points = shape.resolved_points().into_iter().map(|p| origin + p.to_vec2());
            let mut path = BezPath::new();
            path.move_to(points.next()?);
            for p in points {
                path.line_to(p);
            }
            if shape.shape_type != ShapeType::Line {
                path.close_path();
            }
            path
        }
    };
    Some(path)
}

fn skia_color(color: &SerializableColor, opacity: f64) -> tiny_skia::Color {
    let c = color.with_opacity(opacity).to_rgba8();
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn solid_paint(color: &SerializableColor, opacity: f64) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color, opacity));
    paint.anti_alias = true;
    paint
}

pub(crate) fn to_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

pub(crate) fn to_skia_path(path: &BezPath) -> Option<Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => {
                builder.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32)
            }
            PathEl::CurveTo(p1, p2, p3) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

/// Straight-alpha RGBA into a premultiplied pixmap.
fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Gaussian blur over premultiplied pixels, keeping every channel <= alpha.
fn blur_premultiplied(pixmap: &mut Pixmap, sigma: f32) {
    if sigma <= 0.0 {
        return;
    }
    let (width, height) = (pixmap.width(), pixmap.height());
    let Some(buffer) = RgbaImage::from_raw(width, height, pixmap.data().to_vec()) else {
        return;
    };
    let blurred = image::imageops::blur(&buffer, sigma);
    for (dst, src) in pixmap.data_mut().chunks_exact_mut(4).zip(blurred.pixels()) {
        let [r, g, b, a] = src.0;
        dst.copy_from_slice(&[r.min(a), g.min(a), b.min(a), a]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use postercraft_core::canvas::{CanvasSettings, CanvasSize};
    use postercraft_core::id::{IdGenerator, SeededIds};
    use postercraft_core::shapes::{
        ElementTrait, FontStyle, FontWeight, Group, ImageFilters, TextShadow,
    };
    use kurbo::Size;

    const RED: SerializableColor = SerializableColor::new(255, 0, 0, 255);
    const BLUE: SerializableColor = SerializableColor::new(0, 0, 255, 255);

    fn doc(background: Background) -> Document {
        Document::with_settings(CanvasSettings {
            background,
            canvas_size: CanvasSize::custom(200.0, 200.0),
            ..Default::default()
        })
    }

    fn white() -> Document {
        doc(Background::Solid {
            color: SerializableColor::white(),
        })
    }

    fn rgba(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let c = pixmap.pixel(x, y).unwrap().demultiply();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    fn rect(
        ids: &mut SeededIds,
        position: Point,
        size: Size,
        color: SerializableColor,
        z: u32,
    ) -> Shape {
        let mut shape = Shape::new(ids.next_id(), ShapeType::Rectangle, position);
        shape.size = size;
        shape.fill_color = color;
        shape.stroke_width = 0.0;
        shape.z_index = z;
        shape
    }

    fn image_at(ids: &mut SeededIds, position: Point, size: Size, src: &str) -> Image {
        Image::new(ids.next_id(), position, size, src.into(), src.into())
    }

    fn render(doc: &Document) -> Pixmap {
        rasterize(doc, &FontBook::new(), &ImageCache::default(), 1.0).unwrap()
    }

    #[test]
    fn test_solid_background() {
        let pixmap = render(&doc(Background::Solid { color: RED }));
        assert_eq!((pixmap.width(), pixmap.height()), (200, 200));
        assert_eq!(rgba(&pixmap, 0, 0), [255, 0, 0, 255]);
        assert_eq!(rgba(&pixmap, 199, 199), [255, 0, 0, 255]);
    }

    #[test]
    fn test_gradient_directions() {
        let black = SerializableColor::black();
        let white = SerializableColor::white();
        let horizontal = render(&doc(Background::Gradient {
            direction: GradientDirection::Horizontal,
            start: black,
            end: white,
        }));
        assert!(rgba(&horizontal, 0, 100)[0] < 5);
        assert!(rgba(&horizontal, 199, 100)[0] > 250);
        assert_eq!(rgba(&horizontal, 50, 0), rgba(&horizontal, 50, 199));

        let vertical = render(&doc(Background::Gradient {
            direction: GradientDirection::Vertical,
            start: black,
            end: white,
        }));
        assert!(rgba(&vertical, 100, 0)[0] < 5);
        assert!(rgba(&vertical, 100, 199)[0] > 250);

        let diagonal = render(&doc(Background::Gradient {
            direction: GradientDirection::Diagonal,
            start: black,
            end: white,
        }));
        assert!(rgba(&diagonal, 0, 0)[0] < 5);
        assert!(rgba(&diagonal, 199, 199)[0] > 250);
        let mid = rgba(&diagonal, 100, 100)[0];
        assert!((100..156).contains(&mid), "{mid}");
    }

    #[test]
    fn test_rectangle_fill() {
        let mut ids = SeededIds::new(1);
        let mut d = white();
        let square = Size::new(40.0, 40.0);
        d.push(Element::Shape(rect(&mut ids, Point::new(50.0, 50.0), square, BLUE, 1)));
        let pixmap = render(&d);
        assert_eq!(rgba(&pixmap, 70, 70), [0, 0, 255, 255]);
        assert_eq!(rgba(&pixmap, 45, 45), [255, 255, 255, 255]);
    }

    #[test]
    fn test_paint_order_follows_z_index() {
        let mut ids = SeededIds::new(2);
        let mut d = white();
        // Stored first but painted last.
        let square = Size::new(40.0, 40.0);
        d.push(Element::Shape(rect(&mut ids, Point::new(50.0, 50.0), square, RED, 2)));
        d.push(Element::Shape(rect(&mut ids, Point::new(50.0, 50.0), square, BLUE, 1)));
        assert_eq!(rgba(&render(&d), 70, 70), [255, 0, 0, 255]);
    }

    #[test]
    fn test_rotation_is_about_the_center() {
        let mut ids = SeededIds::new(3);
        let mut d = white();
        let mut bar = rect(&mut ids, Point::new(50.0, 90.0), Size::new(100.0, 20.0), BLUE, 1);
        bar.rotation = 90.0;
        d.push(Element::Shape(bar));
        let pixmap = render(&d);
        // A horizontal bar centered at (100,100) becomes a vertical one.
        assert_eq!(rgba(&pixmap, 100, 60), [0, 0, 255, 255]);
        assert_eq!(rgba(&pixmap, 100, 140), [0, 0, 255, 255]);
        assert_eq!(rgba(&pixmap, 60, 100), [255, 255, 255, 255]);
    }

    #[test]
    fn test_group_children_use_relative_positions() {
        let mut ids = SeededIds::new(4);
        let mut d = white();
        let child = rect(&mut ids, Point::new(10.0, 10.0), Size::new(20.0, 20.0), BLUE, 1);
        let child_id = child.id();
        d.push(Element::Shape(child));
        let size = Size::new(40.0, 40.0);
        let mut group = Group::new(ids.next_id(), Point::new(100.0, 100.0), size, vec![child_id]);
        group.z_index = 2;
        d.push(Element::Group(group));

        let pixmap = render(&d);
        assert_eq!(rgba(&pixmap, 120, 120), [0, 0, 255, 255]);
        assert_eq!(rgba(&pixmap, 20, 20), [255, 255, 255, 255]);
    }

    #[test]
    fn test_group_rotation_wraps_children() {
        let mut ids = SeededIds::new(5);
        let mut d = white();
        // Child fills the left half of a 100x100 group centered at (100,100).
        let child = rect(&mut ids, Point::new(0.0, 0.0), Size::new(50.0, 100.0), BLUE, 1);
        let child_id = child.id();
        d.push(Element::Shape(child));
        let size = Size::new(100.0, 100.0);
        let mut group = Group::new(ids.next_id(), Point::new(50.0, 50.0), size, vec![child_id]);
        group.rotation = 90.0;
        group.z_index = 2;
        d.push(Element::Group(group));

        let pixmap = render(&d);
        // Rotated clockwise, the left half now covers the top half.
        assert_eq!(rgba(&pixmap, 100, 70), [0, 0, 255, 255]);
        assert_eq!(rgba(&pixmap, 100, 130), [255, 255, 255, 255]);
    }

    #[test]
    fn test_scale_multiplies_output() {
        let mut ids = SeededIds::new(6);
        let mut d = white();
        let square = Size::new(40.0, 40.0);
        d.push(Element::Shape(rect(&mut ids, Point::new(50.0, 50.0), square, BLUE, 1)));
        let pixmap = rasterize(&d, &FontBook::new(), &ImageCache::default(), 2.0).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (400, 400));
        assert_eq!(rgba(&pixmap, 140, 140), [0, 0, 255, 255]);
        assert_eq!(rgba(&pixmap, 90, 90), [255, 255, 255, 255]);
    }

    #[test]
    fn test_invalid_scale_is_rejected() {
        let d = white();
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = rasterize(&d, &FontBook::new(), &ImageCache::default(), scale).unwrap_err();
            assert!(matches!(err, RenderError::InvalidScale(_)));
        }
    }

    #[test]
    fn test_images_draw_and_missing_ones_are_skipped() {
        let mut ids = SeededIds::new(7);
        let mut d = white();
        let mut img = image_at(&mut ids, Point::new(20.0, 20.0), Size::new(60.0, 60.0), "green");
        img.z_index = 1;
        d.push(Element::Image(img));
        let mut missing =
            image_at(&mut ids, Point::new(120.0, 120.0), Size::new(60.0, 60.0), "gone");
        missing.z_index = 2;
        d.push(Element::Image(missing));

        let mut cache = ImageCache::default();
        cache.insert("green", RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255])));
        let pixmap = rasterize(&d, &FontBook::new(), &cache, 1.0).unwrap();
        assert_eq!(rgba(&pixmap, 50, 50), [0, 255, 0, 255]);
        assert_eq!(rgba(&pixmap, 150, 150), [255, 255, 255, 255]);
    }

    #[test]
    fn test_image_filters_are_applied() {
        let mut ids = SeededIds::new(8);
        let mut d = white();
        let mut img = image_at(&mut ids, Point::ZERO, Size::new(100.0, 100.0), "red");
        img.filters = ImageFilters {
            grayscale: 100.0,
            ..Default::default()
        };
        img.z_index = 1;
        d.push(Element::Image(img));
        let mut cache = ImageCache::default();
        cache.insert("red", RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255])));
        let [r, g, b, _] = rgba(&rasterize(&d, &FontBook::new(), &cache, 1.0).unwrap(), 50, 50);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn test_line_is_stroked_not_filled() {
        let mut ids = SeededIds::new(9);
        let mut d = white();
        let mut line = Shape::new(ids.next_id(), ShapeType::Line, Point::new(20.0, 80.0));
        line.size = Size::new(160.0, 40.0);
        line.stroke_color = RED;
        line.stroke_width = 6.0;
        line.fill_color = BLUE;
        line.z_index = 1;
        d.push(Element::Shape(line));
        let pixmap = render(&d);
        // Default endpoints run through the vertical middle of the box.
        assert_eq!(rgba(&pixmap, 100, 100), [255, 0, 0, 255]);
        assert_eq!(rgba(&pixmap, 100, 85), [255, 255, 255, 255]);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let mut ids = SeededIds::new(10);
        let mut d = doc(Background::Gradient {
            direction: GradientDirection::Diagonal,
            start: RED,
            end: BLUE,
        });
        let mut tri = Shape::new(ids.next_id(), ShapeType::Triangle, Point::new(30.0, 30.0));
        tri.rotation = 33.0;
        tri.opacity = 0.6;
        tri.z_index = 1;
        d.push(Element::Shape(tri));
        let mut text = Text::new(ids.next_id(), Point::new(10.0, 120.0), "Hello poster".into());
        text.shadow = Some(TextShadow::default());
        text.z_index = 2;
        d.push(Element::Text(text));
        let mut img = image_at(&mut ids, Point::new(100.0, 20.0), Size::new(50.0, 30.0), "img");
        img.filters.blur = 2.0;
        img.rotation = 15.0;
        img.z_index = 3;
        d.push(Element::Image(img));

        let mut cache = ImageCache::default();
        let source =
            RgbaImage::from_fn(8, 5, |x, y| Rgba([(x * 30) as u8, (y * 50) as u8, 90, 255]));
        cache.insert("img", source);
        let a = rasterize(&d, &FontBook::new(), &cache, 1.5).unwrap();
        let b = rasterize(&d, &FontBook::new(), &cache, 1.5).unwrap();
        assert_eq!(a.data(), b.data());
    }

    /// First and last rows holding a mostly dark pixel.
    fn ink_rows(pixmap: &Pixmap) -> Option<(u32, u32)> {
        let rows: Vec<u32> = (0..pixmap.height())
            .filter(|&y| (0..pixmap.width()).any(|x| rgba(pixmap, x, y)[0] < 128))
            .collect();
        Some((*rows.first()?, *rows.last()?))
    }

    /// Top-most, then left-most, mostly dark pixel.
    fn first_ink(pixmap: &Pixmap) -> Option<(u32, u32)> {
        (0..pixmap.height())
            .flat_map(|y| (0..pixmap.width()).map(move |x| (x, y)))
            .find(|&(x, y)| rgba(pixmap, x, y)[0] < 128)
    }

    fn ink_count(pixmap: &Pixmap) -> usize {
        pixmap.pixels().iter().filter(|p| p.demultiply().red() < 128).count()
    }

    fn text_at(ids: &mut SeededIds, content: &str, position: Point, size: f64, width: f64) -> Text {
        let mut text = Text::new(ids.next_id(), position, content.into());
        text.font_size = size;
        text.width = width;
        text.color = SerializableColor::black();
        text.z_index = 1;
        text
    }

    #[test]
    fn test_text_without_faces_is_an_error() {
        let mut ids = SeededIds::new(11);
        let mut d = white();
        d.push(Element::Text(text_at(&mut ids, "Hi", Point::ZERO, 20.0, 100.0)));
        let err = rasterize(&d, &FontBook::empty(), &ImageCache::default(), 1.0).unwrap_err();
        assert!(matches!(err, RenderError::Font(_)));
        // Without text an empty book is fine.
        assert!(rasterize(&white(), &FontBook::empty(), &ImageCache::default(), 1.0).is_ok());
    }

    #[test]
    fn test_glyphs_hang_from_the_ascent() {
        let mut ids = SeededIds::new(12);
        let mut d = white();
        d.push(Element::Text(text_at(&mut ids, "H", Point::new(20.0, 20.0), 40.0, 200.0)));
        let pixmap = render(&d);
        // Baseline = 20 + 8 padding + 1901/2048 * 40 ascent = 65.1,
        // cap height = 1493/2048 * 40 = 29.2, left bearing = 3.9.
        let (top, bottom) = ink_rows(&pixmap).unwrap();
        assert!((34..=38).contains(&top), "{top}");
        assert!((63..=66).contains(&bottom), "{bottom}");
        let (x, _) = first_ink(&pixmap).unwrap();
        assert!((35..=37).contains(&x), "{x}");
    }

    #[test]
    fn test_wrapped_text_rotates_about_its_own_center() {
        let mut ids = SeededIds::new(13);
        let text = text_at(&mut ids, "AAAA BBBB CCCC", Point::new(50.0, 50.0), 20.0, 100.0);
        let fonts = FontBook::new();
        let layout = layout_text(&text, &fonts);
        assert_eq!(layout.lines.len(), 3);
        let (box_top, box_bottom) = (50.0, 50.0 + layout.height());

        let mut upright = white();
        upright.push(Element::Text(text.clone()));
        let (top, bottom) = ink_rows(&render(&upright)).unwrap();

        let mut turned = text;
        turned.rotation = 180.0;
        let mut rotated = white();
        rotated.push(Element::Text(turned));
        let (r_top, r_bottom) = ink_rows(&render(&rotated)).unwrap();

        // A half turn mirrors the ink about the middle of the wrapped box.
        let mirror = box_top + box_bottom;
        let expected_top = mirror - bottom as f64 - 1.0;
        let expected_bottom = mirror - top as f64 - 1.0;
        assert!((r_top as f64 - expected_top).abs() <= 2.0, "{r_top} vs {expected_top}");
        assert!(
            (r_bottom as f64 - expected_bottom).abs() <= 2.0,
            "{r_bottom} vs {expected_bottom}"
        );
        assert!(r_top as f64 >= box_top && (r_bottom as f64) < box_bottom);
    }

    #[test]
    fn test_shadow_is_offset_in_device_pixels() {
        for scale in [1.0, 2.0] {
            let mut ids = SeededIds::new(14);
            let plain = text_at(&mut ids, "H", Point::new(20.0, 20.0), 40.0, 200.0);
            let mut shadowed = plain.clone();
            shadowed.shadow = Some(TextShadow {
                enabled: true,
                color: BLUE,
                blur: 0.0,
                offset_x: 10.0,
                offset_y: 10.0,
            });

            let mut d = white();
            d.push(Element::Text(plain));
            let without = rasterize(&d, &FontBook::new(), &ImageCache::default(), scale).unwrap();
            let mut d = white();
            d.push(Element::Text(shadowed));
            let with = rasterize(&d, &FontBook::new(), &ImageCache::default(), scale).unwrap();

            let (x, y) = first_ink(&without).unwrap();
            let offset = (10.0 * scale) as u32;
            let (sx, sy) = (x + offset, y + offset);
            assert_eq!(rgba(&without, sx, sy), [255, 255, 255, 255]);
            let [r, _, b, _] = rgba(&with, sx, sy);
            assert!(b > 200 && r < 128, "scale {scale}: {:?}", rgba(&with, sx, sy));
            // The glyph itself is drawn over its shadow.
            let [r, _, b, _] = rgba(&with, x, y);
            assert!(r < 128 && b < 128);
        }
    }

    #[test]
    fn test_missing_bold_face_is_synthesized() {
        let mut fonts = FontBook::empty();
        fonts
            .register(
                "Solo",
                FontWeight::Normal,
                FontStyle::Normal,
                include_bytes!("../assets/DejaVuSans.ttf").to_vec(),
            )
            .unwrap();
        let mut ids = SeededIds::new(15);
        let mut regular = text_at(&mut ids, "Poster", Point::new(10.0, 10.0), 40.0, 190.0);
        regular.font_family = "Solo".into();
        let mut bold = regular.clone();
        bold.font_weight = FontWeight::Bold;

        let count = |text: Text| {
            let mut d = white();
            d.push(Element::Text(text));
            ink_count(&rasterize(&d, &fonts, &ImageCache::default(), 1.0).unwrap())
        };
        let (thin, thick) = (count(regular), count(bold));
        assert!(thick as f64 > thin as f64 * 1.1, "{thin} vs {thick}");
    }

    #[test]
    fn test_blur_keeps_premultiplied_invariant() {
        let mut layer = Pixmap::new(9, 9).unwrap();
        layer.fill_rect(
            tiny_skia::Rect::from_xywh(3.0, 3.0, 3.0, 3.0).unwrap(),
            &solid_paint(&RED, 0.5),
            Transform::identity(),
            None,
        );
        blur_premultiplied(&mut layer, 1.0);
        for px in layer.data().chunks_exact(4) {
            assert!(px[0] <= px[3] && px[1] <= px[3] && px[2] <= px[3]);
        }
        assert!(layer.pixel(2, 4).unwrap().alpha() > 0);
    }
}
