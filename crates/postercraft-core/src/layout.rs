//! Text layout: explicit line breaks, greedy word wrap, alignment.
//!
//! Layout lives next to the element model so that a text element's height,
//! and with it the center it rotates and scales about, comes from the same
//! wrapped lines the renderer draws.

use crate::shapes::{FontStyle, FontWeight, Text, TextAlign};

/// Advance per character, in em, used when no real metrics are available.
pub const FALLBACK_ADVANCE_EM: f64 = 0.6;

/// What a run of text asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec<'a> {
    pub family: &'a str,
    pub weight: FontWeight,
    pub style: FontStyle,
    /// Em size in canvas pixels.
    pub size: f64,
}

impl<'a> FontSpec<'a> {
    pub fn of(text: &'a Text) -> Self {
        Self {
            family: &text.font_family,
            weight: text.font_weight,
            style: text.font_style,
            size: text.font_size,
        }
    }
}

/// Width of a run of text in canvas pixels.
///
/// Layout only depends on this, so tests can substitute fixed metrics.
pub trait TextMeasurer {
    fn measure(&self, text: &str, font: &FontSpec<'_>) -> f64;
}

/// Fixed advance of [`FALLBACK_ADVANCE_EM`] per character.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackMetrics;

impl TextMeasurer for FallbackMetrics {
    fn measure(&self, text: &str, font: &FontSpec<'_>) -> f64 {
        text.chars().count() as f64 * FALLBACK_ADVANCE_EM * font.size
    }
}

/// One laid-out line, positioned relative to the text box's top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub text: String,
    /// Left edge of the line.
    pub x: f64,
    /// Top of the line box.
    pub top: f64,
    pub width: f64,
}

/// Lines of a text element in the order they are drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<LayoutLine>,
    pub line_height: f64,
}

impl TextLayout {
    /// Height of the laid-out block including vertical padding.
    pub fn height(&self) -> f64 {
        self.lines.len() as f64 * self.line_height + 2.0 * Text::PADDING_Y
    }
}

/// Lay out a text element: split on `\n`, wrap each paragraph to the padded
/// width, then align each line within the box.
pub fn layout_text(text: &Text, measurer: &dyn TextMeasurer) -> TextLayout {
    let spec = FontSpec::of(text);
    let max_width = text.wrap_width();
    let line_height = text.line_height();

    let lines = text
        .content
        .split('\n')
        .flat_map(|paragraph| wrap_paragraph(paragraph, max_width, &spec, measurer))
        .enumerate()
        .map(|(i, line)| {
            let width = measurer.measure(&line, &spec);
            let x = match text.text_align {
                TextAlign::Left => Text::PADDING_X,
                TextAlign::Center => (text.width - width) / 2.0,
                TextAlign::Right => text.width - Text::PADDING_X - width,
            };
            LayoutLine {
                text: line,
                x,
                top: Text::PADDING_Y + i as f64 * line_height,
                width,
            }
        })
        .collect();

    TextLayout { lines, line_height }
}

/// Greedy wrap on spaces. A single word wider than `max_width` gets a line
/// of its own and is not broken.
pub fn wrap_paragraph(
    paragraph: &str,
    max_width: f64,
    spec: &FontSpec<'_>,
    measurer: &dyn TextMeasurer,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in paragraph.split(' ') {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if !current.is_empty() && measurer.measure(&candidate, spec) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    lines.push(current);
    lines
}
