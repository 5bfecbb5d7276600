use log::trace;
use tiny_skia::{PathBuilder, Transform};
use ttf_parser::OutlineBuilder;

use crate::geometry::Vector2;
use crate::text_metrics::FontFace;
use crate::theme::Rgba;

use super::canvas::Canvas;

/// Converts font-unit outlines (y up) into a pixel-space path (y down).
struct GlyphPath<'a> {
    builder: &'a mut PathBuilder,
    origin_x: f32,
    baseline: f32,
    scale: f32,
}

impl GlyphPath<'_> {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.baseline - y * self.scale)
    }
}

impl OutlineBuilder for GlyphPath<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Pixel extent of a possibly multi-line label.
pub fn measure(face: &FontFace, text: &str, font_size: f32) -> Vector2 {
    let lines: Vec<&str> = text.lines().collect();
    let width = lines
        .iter()
        .map(|line| face.measure_width(line, font_size))
        .fold(0.0f32, f32::max);
    let height = face.line_height(font_size) * lines.len().max(1) as f32;
    Vector2::new(width.ceil() as f64, height.ceil() as f64)
}

/// Rasterizes `text` with its bounding box's top-left corner at `top_left`.
/// Lines are centered within the widest line.
pub fn draw_text(
    canvas: &mut Canvas,
    face: &FontFace,
    text: &str,
    font_size: f32,
    top_left: Vector2,
    color: Rgba,
) {
    let Some(parsed) = face.face() else {
        return;
    };
    let extent = measure(face, text, font_size);
    let scale = face.scale(font_size);
    let line_height = face.line_height(font_size);

    let mut builder = PathBuilder::new();
    for (row, line) in text.lines().enumerate() {
        let line_width = face.measure_width(line, font_size);
        let left = (extent.x as f32 - line_width) / 2.0;
        let baseline = face.ascent(font_size) + line_height * row as f32;
        for (glyph, _) in face.layout_line(line, font_size) {
            let mut outline = GlyphPath {
                builder: &mut builder,
                origin_x: left + glyph.x,
                baseline,
                scale,
            };
            parsed.outline_glyph(glyph.id, &mut outline);
        }
    }
    let origin = Transform::from_translate(top_left.x.round() as f32, top_left.y.round() as f32);
    let Some(path) = builder.finish().and_then(|path| path.transform(origin)) else {
        return;
    };
    canvas.fill_path(&path, color);
    trace!("text {text:?} at {top_left:?} ({}x{})", extent.x, extent.y);
}
