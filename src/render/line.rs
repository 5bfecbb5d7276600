use std::collections::HashMap;

use tiny_skia::PathBuilder;

use crate::geometry::Vector2;
use crate::theme::Rgba;

use super::canvas::Canvas;

/// Per-pixel coverage accumulated for one primitive, then blended once.
#[derive(Debug, Default)]
pub struct Coverage {
    cells: HashMap<(i32, i32), f32>,
}

impl Coverage {
    fn add(&mut self, x: i32, y: i32, value: f32) {
        if value <= 0.0 {
            return;
        }
        let cell = self.cells.entry((x, y)).or_insert(0.0);
        *cell = cell.max(value.min(1.0));
    }

    /// Spreads a fractional point over its four integer neighbours by
    /// bilinear weight.
    pub fn stamp_dot(&mut self, p: Vector2) {
        let x0 = p.x.floor();
        let y0 = p.y.floor();
        let tx = (p.x - x0) as f32;
        let ty = (p.y - y0) as f32;
        let (x0, y0) = (x0 as i32, y0 as i32);
        self.add(x0, y0, (1.0 - tx) * (1.0 - ty));
        self.add(x0 + 1, y0, tx * (1.0 - ty));
        self.add(x0, y0 + 1, (1.0 - tx) * ty);
        self.add(x0 + 1, y0 + 1, tx * ty);
    }

    /// Stamps dots across a `width`-wide band centred on `p`, along `normal`.
    fn stamp_across(&mut self, p: Vector2, normal: Vector2, width: f64) {
        let half = (width / 2.0 - 0.5).max(0.0);
        let mut k = -half;
        while k <= half + 1e-9 {
            self.stamp_dot(p + normal * k);
            k += 0.5;
        }
    }

    pub fn stroke_segment(&mut self, a: Vector2, b: Vector2, width: f64) {
        let along = b - a;
        let len = along.length();
        let dir = along.normalize();
        let normal = dir.perpendicular();
        let steps = (len * 2.0).ceil() as usize;
        for step in 0..=steps {
            let t = (step as f64 * 0.5).min(len);
            self.stamp_across(a + dir * t, normal, width);
        }
    }

    /// Round-ish cap: dots across the width on both axes.
    pub fn stamp_joint(&mut self, p: Vector2, width: f64) {
        self.stamp_across(p, Vector2::new(1.0, 0.0), width);
        self.stamp_across(p, Vector2::new(0.0, 1.0), width);
    }

    pub fn value(&self, x: i32, y: i32) -> f32 {
        self.cells.get(&(x, y)).copied().unwrap_or(0.0)
    }

    pub fn apply(self, canvas: &mut Canvas, color: Rgba) {
        for ((x, y), coverage) in self.cells {
            canvas.blend_coverage(x, y, color, coverage);
        }
    }
}

/// Antialiased polyline of `width` pixels.
pub fn stroke_polyline(canvas: &mut Canvas, points: &[Vector2], width: i32, color: Rgba) {
    let width = width.max(1) as f64;
    let mut coverage = Coverage::default();
    for seg in points.windows(2) {
        coverage.stroke_segment(seg[0], seg[1], width);
    }
    for p in points {
        coverage.stamp_joint(*p, width);
    }
    coverage.apply(canvas, color);
}

pub fn fill_triangle(canvas: &mut Canvas, [a, b, c]: [Vector2; 3], color: Rgba) {
    let mut builder = PathBuilder::new();
    builder.move_to(a.x as f32, a.y as f32);
    builder.line_to(b.x as f32, b.y as f32);
    builder.line_to(c.x as f32, c.y as f32);
    builder.close();
    if let Some(path) = builder.finish() {
        canvas.fill_path(&path, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_dot_covers_one_pixel() {
        let mut coverage = Coverage::default();
        coverage.stamp_dot(Vector2::new(3.0, 4.0));
        assert_eq!(coverage.value(3, 4), 1.0);
        assert_eq!(coverage.value(4, 4), 0.0);
    }

    #[test]
    fn fractional_dot_splits_bilinearly() {
        let mut coverage = Coverage::default();
        coverage.stamp_dot(Vector2::new(3.5, 4.25));
        assert!((coverage.value(3, 4) - 0.375).abs() < 1e-6);
        assert!((coverage.value(4, 4) - 0.375).abs() < 1e-6);
        assert!((coverage.value(3, 5) - 0.125).abs() < 1e-6);
        assert!((coverage.value(4, 5) - 0.125).abs() < 1e-6);
    }

    #[test]
    fn two_pixel_horizontal_line() {
        let mut canvas = Canvas::new(20, 10, Rgba::WHITE);
        stroke_polyline(
            &mut canvas,
            &[Vector2::new(2.0, 5.0), Vector2::new(17.0, 5.0)],
            2,
            Rgba::BLACK,
        );
        assert_eq!(canvas.get(10, 5), Some(Rgba::BLACK));
        let half = canvas.get(10, 4).unwrap();
        assert!(half.r > 100 && half.r < 160, "{half:?}");
        assert_eq!(canvas.get(10, 8), Some(Rgba::WHITE));
    }

    #[test]
    fn triangle_interior_is_solid() {
        let mut canvas = Canvas::new(20, 20, Rgba::WHITE);
        let tri = [Vector2::new(2.0, 2.0), Vector2::new(18.0, 2.0), Vector2::new(2.0, 18.0)];
        fill_triangle(&mut canvas, tri, Rgba::BLACK);
        assert_eq!(canvas.get(4, 4), Some(Rgba::BLACK));
        assert_eq!(canvas.get(17, 17), Some(Rgba::WHITE));
        // the hypotenuse pixel is partially covered
        let edge = canvas.get(9, 10).unwrap();
        assert!(edge.r > 0 && edge.r < 255, "{edge:?}");
    }

    #[test]
    fn degenerate_triangle_leaves_canvas_untouched() {
        let mut canvas = Canvas::new(10, 10, Rgba::WHITE);
        let p = Vector2::new(4.0, 4.0);
        fill_triangle(&mut canvas, [p, p, p], Rgba::BLACK);
        assert!((0..10).all(|y| (0..10).all(|x| canvas.get(x, y) == Some(Rgba::WHITE))));
    }
}
