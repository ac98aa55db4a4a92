//! Font faces, text measurement and glyph outlines.

use crate::error::{RenderError, RenderResult};
use ab_glyph::{Font, FontArc, GlyphId, OutlineCurve};
use kurbo::{BezPath, Point};
use postercraft_core::layout::{FallbackMetrics, FontSpec, TextMeasurer};
use postercraft_core::shapes::{FontStyle, FontWeight};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Family name of the faces bundled with the crate.
pub const DEFAULT_FAMILY: &str = "DejaVu Sans";

static DEJAVU_SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
static DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");

/// Ascent, in em, used when no face can be resolved.
pub const FALLBACK_ASCENT_EM: f64 = 0.8;
/// Horizontal shear applied to synthesized italics.
const ITALIC_SKEW: f64 = 0.21;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FaceKey {
    family: String,
    weight: FontWeight,
    style: FontStyle,
}

impl FaceKey {
    fn new(family: &str, weight: FontWeight, style: FontStyle) -> Self {
        Self {
            family: family.trim().to_lowercase(),
            weight,
            style,
        }
    }
}

/// A face picked for a [`FontSpec`], possibly standing in for a missing
/// bold or italic variant.
#[derive(Clone, Copy)]
pub struct ResolvedFace<'a> {
    pub font: &'a FontArc,
    pub synthetic_bold: bool,
    pub synthetic_italic: bool,
}

/// Registered font faces keyed by family, weight and style.
pub struct FontBook {
    faces: HashMap<FaceKey, FontArc>,
    /// First registered family, used when a requested family is unknown.
    fallback_family: Option<String>,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

impl FontBook {
    /// Book holding the bundled DejaVu Sans faces, which also serve as the
    /// fallback for unknown families.
    pub fn new() -> Self {
        let mut book = Self::empty();
        let bundled = [
            (FontWeight::Normal, DEJAVU_SANS),
            (FontWeight::Bold, DEJAVU_SANS_BOLD),
        ];
        for (weight, bytes) in bundled {
            match FontArc::try_from_slice(bytes) {
                Ok(font) => book.insert(DEFAULT_FAMILY, weight, FontStyle::Normal, font),
                Err(e) => log::error!("bundled font {DEFAULT_FAMILY} {weight:?} is invalid: {e}"),
            }
        }
        book
    }

    /// Book without any faces. Text measures with fallback metrics and
    /// cannot be drawn until faces are registered.
    pub fn empty() -> Self {
        Self {
            faces: HashMap::new(),
            fallback_family: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Register a face from TrueType/OpenType bytes.
    pub fn register(
        &mut self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
        bytes: Vec<u8>,
    ) -> RenderResult<()> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| RenderError::Font(format!("{family}: {e}")))?;
        self.insert(family, weight, style, font);
        Ok(())
    }

    fn insert(&mut self, family: &str, weight: FontWeight, style: FontStyle, font: FontArc) {
        let key = FaceKey::new(family, weight, style);
        if self.fallback_family.is_none() {
            self.fallback_family = Some(key.family.clone());
        }
        log::debug!("registered font face {} {:?} {:?}", key.family, weight, style);
        self.faces.insert(key, font);
    }

    /// Register every `.ttf`/`.otf` file in a directory.
    ///
    /// File stems name the face: `Family-Bold.ttf`, `Family-Italic.otf`,
    /// `Family-BoldItalic.ttf`, anything else is the regular face of the stem.
    /// Unreadable files are skipped. Returns how many faces were added.
    pub fn load_dir(&mut self, dir: &Path) -> RenderResult<usize> {
        let entries = fs::read_dir(dir)
            .map_err(|e| RenderError::Font(format!("Failed to read {}: {}", dir.display(), e)))?;
        let mut paths: Vec<_> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
            })
            .collect();
        // Stable registration order keeps the fallback family deterministic.
        paths.sort();

        let mut added = 0;
        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let (family, weight, style) = parse_face_name(stem);
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("skipping font {}: {e}", path.display());
                    continue;
                }
            };
            match self.register(family, weight, style, bytes) {
                Ok(()) => added += 1,
                Err(e) => log::warn!("skipping font {}: {e}", path.display()),
            }
        }
        Ok(added)
    }

    /// Best face for a spec: exact match, then the family's regular faces
    /// (flagging what must be synthesized), then the fallback family.
    pub fn resolve(&self, spec: &FontSpec<'_>) -> Option<ResolvedFace<'_>> {
        let family = spec.family.trim().to_lowercase();
        self.resolve_in(&family, spec.weight, spec.style).or_else(|| {
            let fallback = self.fallback_family.as_deref()?;
            if fallback == family {
                return None;
            }
            self.resolve_in(fallback, spec.weight, spec.style)
        })
    }

    fn resolve_in(
        &self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
    ) -> Option<ResolvedFace<'_>> {
        let candidates = [
            (weight, style),
            (FontWeight::Normal, style),
            (weight, FontStyle::Normal),
            (FontWeight::Normal, FontStyle::Normal),
        ];
        candidates.into_iter().find_map(|(w, s)| {
            let font = self.faces.get(&FaceKey::new(family, w, s))?;
            Some(ResolvedFace {
                font,
                synthetic_bold: weight == FontWeight::Bold && w == FontWeight::Normal,
                synthetic_italic: style == FontStyle::Italic && s == FontStyle::Normal,
            })
        })
    }

    /// Distance from the top of a line box to its baseline.
    pub fn ascent(&self, spec: &FontSpec<'_>) -> f64 {
        match self.resolve(spec) {
            Some(face) => face.font.ascent_unscaled() as f64 * units_to_px(face.font, spec.size),
            None => FALLBACK_ASCENT_EM * spec.size,
        }
    }

    /// Glyph outlines for one line of text, with `origin` on the baseline at
    /// the start of the line. `None` when no face can be resolved.
    pub fn text_path(
        &self,
        text: &str,
        spec: &FontSpec<'_>,
        origin: Point,
    ) -> Option<(BezPath, ResolvedFace<'_>)> {
        let face = self.resolve(spec)?;
        let font = face.font;
        let scale = units_to_px(font, spec.size);
        let skew = if face.synthetic_italic { ITALIC_SKEW } else { 0.0 };

        let mut path = BezPath::new();
        let mut pen_x = origin.x;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = previous {
                pen_x += font.kern_unscaled(prev, id) as f64 * scale;
            }
            if let Some(outline) = font.outline(id) {
                let map = |p: ab_glyph::Point| {
                    let (x, y) = (p.x as f64, p.y as f64);
                    Point::new(pen_x + (x + y * skew) * scale, origin.y - y * scale)
                };
                append_outline(&mut path, &outline.curves, map);
            }
            pen_x += font.h_advance_unscaled(id) as f64 * scale;
            previous = Some(id);
        }
        Some((path, face))
    }
}

impl TextMeasurer for FontBook {
    fn measure(&self, text: &str, spec: &FontSpec<'_>) -> f64 {
        let Some(face) = self.resolve(spec) else {
            return FallbackMetrics.measure(text, spec);
        };
        let font = face.font;
        let mut width = 0.0f64;
        let mut previous: Option<GlyphId> = None;
        for ch in text.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = previous {
                width += font.kern_unscaled(prev, id) as f64;
            }
            width += font.h_advance_unscaled(id) as f64;
            previous = Some(id);
        }
        width * units_to_px(font, spec.size)
    }
}

/// Pixels per font unit at an em size.
fn units_to_px(font: &FontArc, size: f64) -> f64 {
    let units = font.units_per_em().unwrap_or(1000.0) as f64;
    size / units
}

/// Append glyph curves, starting a new contour whenever a curve does not
/// continue from the previous one.
fn append_outline(
    path: &mut BezPath,
    curves: &[OutlineCurve],
    map: impl Fn(ab_glyph::Point) -> Point,
) {
    let mut last: Option<ab_glyph::Point> = None;
    for curve in curves {
        let start = match curve {
            OutlineCurve::Line(p0, _)
            | OutlineCurve::Quad(p0, _, _)
            | OutlineCurve::Cubic(p0, _, _, _) => *p0,
        };
        if last != Some(start) {
            if last.is_some() {
                path.close_path();
            }
            path.move_to(map(start));
        }
        let end = match *curve {
            OutlineCurve::Line(_, p1) => {
                path.line_to(map(p1));
                p1
            }
            OutlineCurve::Quad(_, p1, p2) => {
                path.quad_to(map(p1), map(p2));
                p2
            }
            OutlineCurve::Cubic(_, p1, p2, p3) => {
                path.curve_to(map(p1), map(p2), map(p3));
                p3
            }
        };
        last = Some(end);
    }
    if last.is_some() {
        path.close_path();
    }
}

fn parse_face_name(stem: &str) -> (&str, FontWeight, FontStyle) {
    let Some((family, variant)) = stem.rsplit_once('-') else {
        return (stem, FontWeight::Normal, FontStyle::Normal);
    };
    match variant.to_ascii_lowercase().as_str() {
        "regular" => (family, FontWeight::Normal, FontStyle::Normal),
        "bold" => (family, FontWeight::Bold, FontStyle::Normal),
        "italic" => (family, FontWeight::Normal, FontStyle::Italic),
        "bolditalic" => (family, FontWeight::Bold, FontStyle::Italic),
        _ => (stem, FontWeight::Normal, FontStyle::Normal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(size: f64) -> FontSpec<'static> {
        FontSpec {
            family: "Inter",
            weight: FontWeight::Bold,
            style: FontStyle::Italic,
            size,
        }
    }

    fn regular(size: f64) -> FontSpec<'static> {
        FontSpec {
            family: DEFAULT_FAMILY,
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
            size,
        }
    }

    #[test]
    fn test_empty_book_uses_fallback_metrics() {
        let book = FontBook::empty();
        assert!(book.is_empty());
        assert!(book.resolve(&spec(20.0)).is_none());
        assert!((book.measure("abcd", &spec(20.0)) - 48.0).abs() < 1e-9);
        assert!((book.ascent(&spec(10.0)) - 8.0).abs() < 1e-9);
        assert!(book.text_path("abcd", &spec(20.0), Point::ZERO).is_none());
    }

    #[test]
    fn test_invalid_font_bytes_are_rejected() {
        let mut book = FontBook::empty();
        let bytes = vec![0, 1, 2, 3];
        let result = book.register("Broken", FontWeight::Normal, FontStyle::Normal, bytes);
        assert!(matches!(result, Err(RenderError::Font(_))));
        assert!(book.is_empty());
    }

    #[test]
    fn test_bundled_faces_resolve_unknown_families() {
        let book = FontBook::new();
        assert_eq!(book.len(), 2);
        // "Inter" is not registered: DejaVu Sans Bold stands in, with only
        // the italic synthesized.
        let face = book.resolve(&spec(20.0)).unwrap();
        assert!(!face.synthetic_bold);
        assert!(face.synthetic_italic);
    }

    #[test]
    fn test_measures_with_glyph_advances() {
        let book = FontBook::new();
        // DejaVu Sans 'A' advances 1401 of 2048 units.
        let width = book.measure("AAAA", &regular(20.0));
        assert!((width - 4.0 * 1401.0 / 2048.0 * 20.0).abs() < 0.5, "{width}");
        assert!((book.ascent(&regular(2048.0)) - 1901.0).abs() < 1e-6);
    }

    #[test]
    fn test_glyph_outlines_sit_on_the_baseline() {
        let book = FontBook::new();
        // At 2048px one font unit is one pixel.
        let (path, face) = book
            .text_path("H", &regular(2048.0), Point::new(0.0, 3000.0))
            .unwrap();
        assert!(!face.synthetic_bold && !face.synthetic_italic);
        let bbox = kurbo::Shape::bounding_box(&path);
        assert!((bbox.x0 - 201.0).abs() < 1.0, "{bbox:?}");
        assert!((bbox.x1 - 1339.0).abs() < 1.0, "{bbox:?}");
        // Font y points up; canvas y points down.
        assert!((bbox.y1 - 3000.0).abs() < 1.0, "{bbox:?}");
        assert!((bbox.y0 - (3000.0 - 1493.0)).abs() < 1.0, "{bbox:?}");
    }

    #[test]
    fn test_synthetic_italic_leans_right() {
        let book = FontBook::new();
        let italic = FontSpec {
            style: FontStyle::Italic,
            ..regular(2048.0)
        };
        let (upright, _) = book.text_path("l", &regular(2048.0), Point::ZERO).unwrap();
        let (slanted, face) = book.text_path("l", &italic, Point::ZERO).unwrap();
        assert!(face.synthetic_italic);
        let upright = kurbo::Shape::bounding_box(&upright);
        let slanted = kurbo::Shape::bounding_box(&slanted);
        // The stem foot stays put while its top shifts by height * skew.
        assert!((slanted.x0 - upright.x0).abs() < 1.0);
        assert!((slanted.x1 - upright.x1 - 1556.0 * ITALIC_SKEW).abs() < 1.0);
    }

    #[test]
    fn test_parse_face_name() {
        assert_eq!(parse_face_name("Inter-Bold"), ("Inter", FontWeight::Bold, FontStyle::Normal));
        assert_eq!(
            parse_face_name("Open-Sans-BoldItalic"),
            ("Open-Sans", FontWeight::Bold, FontStyle::Italic)
        );
        assert_eq!(parse_face_name("Roboto"), ("Roboto", FontWeight::Normal, FontStyle::Normal));
        assert_eq!(
            parse_face_name("Noto-Light"),
            ("Noto-Light", FontWeight::Normal, FontStyle::Normal)
        );
    }

    #[test]
    fn test_append_outline_splits_contours() {
        let p = |x: f32, y: f32| ab_glyph::point(x, y);
        let curves = vec![
            OutlineCurve::Line(p(0.0, 0.0), p(10.0, 0.0)),
            OutlineCurve::Line(p(10.0, 0.0), p(0.0, 10.0)),
            OutlineCurve::Line(p(20.0, 0.0), p(30.0, 0.0)),
        ];
        let mut path = BezPath::new();
        append_outline(&mut path, &curves, |q| Point::new(q.x as f64, q.y as f64));
        let moves = path
            .elements()
            .iter()
            .filter(|el| matches!(el, kurbo::PathEl::MoveTo(_)))
            .count();
        assert_eq!(moves, 2);
    }
}
