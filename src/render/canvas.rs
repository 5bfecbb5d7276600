use image::{Rgba as Pixel, RgbaImage};
use tiny_skia::{FillRule, Paint, Path, Pixmap, Transform};

use crate::geometry::{Point, Rect};
use crate::theme::Rgba;

/// Overlay-wins compositing: channels mix by the overlay's alpha, the
/// result keeps the larger of the two alphas.
///
/// `out = (src * (255 - a) + overlay * a) / 255`, `out_a = max(src_a, overlay_a)`
pub fn blend(src: Rgba, overlay: Rgba) -> Rgba {
    let a = overlay.a as u32;
    let mix = |s: u8, o: u8| ((s as u32 * (255 - a) + o as u32 * a) / 255) as u8;
    Rgba::new(
        mix(src.r, overlay.r),
        mix(src.g, overlay.g),
        mix(src.b, overlay.b),
        src.a.max(overlay.a),
    )
}

/// Porter-Duff source-over for straight alpha, used when blitting icons.
pub fn over(dst: Rgba, src: Rgba) -> Rgba {
    let sa = src.a as f32 / 255.0;
    let da = dst.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba::TRANSPARENT;
    }
    let mix = |s: u8, d: u8| {
        let value = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgba::new(
        mix(src.r, dst.r),
        mix(src.g, dst.g),
        mix(src.b, dst.b),
        (out_a * 255.0).round() as u8,
    )
}

/// Pixel buffer addressed with signed coordinates; writes outside are dropped.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgba) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Pixel(background.to_array())),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    fn index(&self, x: i32, y: i32) -> Option<(u32, u32)> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as u32, y as u32);
        (x < self.image.width() && y < self.image.height()).then_some((x, y))
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Rgba> {
        let (x, y) = self.index(x, y)?;
        let [r, g, b, a] = self.image.get_pixel(x, y).0;
        Some(Rgba::new(r, g, b, a))
    }

    pub fn set(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some((x, y)) = self.index(x, y) {
            self.image.put_pixel(x, y, Pixel(color.to_array()));
        }
    }

    pub fn blend_pixel(&mut self, x: i32, y: i32, overlay: Rgba) {
        if let Some(current) = self.get(x, y) {
            self.set(x, y, blend(current, overlay));
        }
    }

    /// Blends `overlay` with its alpha scaled by `coverage` in `[0, 1]`.
    pub fn blend_coverage(&mut self, x: i32, y: i32, overlay: Rgba, coverage: f32) {
        let alpha = (overlay.a as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
        if alpha > 0 {
            self.blend_pixel(x, y, overlay.with_alpha(alpha));
        }
    }

    /// Composites an image with its top-left corner at `at`.
    pub fn blit_over(&mut self, image: &RgbaImage, at: Point) {
        for (x, y, pixel) in image.enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            if a == 0 {
                continue;
            }
            let (cx, cy) = (at.x + x as i32, at.y + y as i32);
            if let Some(current) = self.get(cx, cy) {
                self.set(cx, cy, over(current, Rgba::new(r, g, b, a)));
            }
        }
    }

    /// Fills `path`, given in canvas coordinates, through an antialiased
    /// alpha mask blended with the overlay rule.
    pub fn fill_path(&mut self, path: &Path, color: Rgba) {
        let bounds = path.bounds();
        // one pixel of slack on each side for antialiasing
        let origin_x = bounds.left().floor() as i32 - 1;
        let origin_y = bounds.top().floor() as i32 - 1;
        let width = (bounds.right().ceil() as i32 - origin_x + 1).max(1) as u32;
        let height = (bounds.bottom().ceil() as i32 - origin_y + 1).max(1) as u32;
        let Some(mut mask) = Pixmap::new(width, height) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        paint.anti_alias = true;
        mask.fill_path(
            path,
            &paint,
            FillRule::Winding,
            Transform::from_translate(-origin_x as f32, -origin_y as f32),
            None,
        );

        for (idx, pixel) in mask.pixels().iter().enumerate() {
            let coverage = pixel.alpha();
            if coverage == 0 {
                continue;
            }
            let x = origin_x + (idx as u32 % width) as i32;
            let y = origin_y + (idx as u32 / width) as i32;
            self.blend_coverage(x, y, color, coverage as f32 / 255.0);
        }
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Paints a node frame: a border band `width` pixels wide straddling the
/// rectangle edge, and the fill inside it.
pub fn draw_frame(canvas: &mut Canvas, rect: &Rect, border: Option<Rgba>, fill: Rgba, width: i32) {
    let w = width.max(1);
    for x in (rect.min.x - w + 1)..(rect.max.x + w - 1) {
        for y in (rect.min.y - w + 1)..(rect.max.y + w - 1) {
            let on_border = x < rect.min.x + w - 1
                || x >= rect.max.x - w + 1
                || y < rect.min.y + w - 1
                || y >= rect.max.y - w + 1;
            match (on_border, border) {
                (true, Some(color)) => canvas.blend_pixel(x, y, color),
                (true, None) => {
                    if x >= rect.min.x && x < rect.max.x && y >= rect.min.y && y < rect.max.y {
                        canvas.blend_pixel(x, y, fill);
                    }
                }
                (false, _) => canvas.blend_pixel(x, y, fill),
            }
        }
    }
}
