mod canvas;
mod line;
mod text;

pub use canvas::{blend, draw_frame, over, Canvas};
pub use line::{fill_triangle, stroke_polyline};
pub use text::{draw_text, measure as measure_text};

use std::path::Path;

use image::RgbaImage;
use log::{debug, warn};

use crate::assets::AssetError;
use crate::config::Config;
use crate::geometry::{Point, Vector2};
use crate::layout::label_placement::{segment_anchor, side_normal, LabelSide};
use crate::layout::{
    arrowhead_points, compute_layout, label_offset, route, Diagram, LayoutError, Link, LinkId, NodeId,
};
use crate::text_metrics::FontBook;
use crate::theme::Rgba;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("diagram has no root node")]
    EmptyDiagram,

    #[error("canvas {width}x{height} exceeds the {limit}px side limit")]
    CanvasTooLarge { width: u32, height: u32, limit: u32 },

    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Label font and color handed down from the nearest ancestor that sets them.
#[derive(Debug, Clone, Default)]
pub struct InheritedStyle {
    pub font: Option<String>,
    pub color: Option<Rgba>,
}

impl InheritedStyle {
    fn merge(&self, font: Option<&String>, color: Option<Rgba>) -> Self {
        Self {
            font: font.cloned().or_else(|| self.font.clone()),
            color: color.or(self.color),
        }
    }
}

struct Painter<'a> {
    canvas: Canvas,
    fonts: &'a FontBook,
    config: &'a Config,
}

/// Lays out the diagram, then draws it.
pub fn layout_and_render(diagram: &mut Diagram, fonts: &FontBook, config: &Config) -> Result<RgbaImage> {
    compute_layout(diagram, &config.layout)?;
    render_diagram(diagram, fonts, config)
}

/// Draws an already laid-out diagram into a fresh RGBA buffer.
///
/// Nodes are painted depth first; a connector is painted as soon as both of
/// its endpoints have been, so it always lands above the shapes it joins.
pub fn render_diagram(diagram: &mut Diagram, fonts: &FontBook, config: &Config) -> Result<RgbaImage> {
    let root = diagram.root().ok_or(RenderError::EmptyDiagram)?;
    let (width, height) = diagram.canvas_size().ok_or(RenderError::EmptyDiagram)?;
    let limit = config.render.max_canvas_side;
    if width > limit || height > limit {
        return Err(RenderError::CanvasTooLarge { width, height, limit });
    }
    debug!("rendering {width}x{height} canvas");
    if fonts.is_empty() {
        warn!("no font loaded; labels will not be drawn");
    }

    let mut painter = Painter {
        canvas: Canvas::new(width, height, config.theme.background),
        fonts,
        config,
    };
    painter.draw_node(diagram, root, &InheritedStyle::default())?;

    let pending = diagram.links().filter(|(_, link)| !link.is_drawn()).count();
    if pending > 0 {
        warn!("{pending} connector(s) reference nodes outside the drawn tree and were skipped");
    }
    Ok(painter.canvas.into_image())
}

pub fn write_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

impl Painter<'_> {
    fn draw_node(&mut self, diagram: &mut Diagram, id: NodeId, inherited: &InheritedStyle) -> Result<()> {
        if diagram.is_drawn(id) {
            return Ok(());
        }
        let node = diagram.node(id);
        let style = inherited.merge(node.label_font.as_ref(), node.label_color);
        let bindings = node.bindings;

        if node.border_color.is_some() || node.fill_color.a > 0 {
            draw_frame(
                &mut self.canvas,
                &bindings,
                node.border_color,
                node.fill_color,
                self.config.render.frame_width,
            );
        }

        let icon_rect = node.icon_rect();
        if let Some(icon) = &node.icon {
            if !icon_rect.is_empty() {
                let scaled = icon.resampled(icon_rect.width() as u32, icon_rect.height() as u32);
                self.canvas.blit_over(&scaled, icon_rect.min);
            }
        }

        if let Some(label) = node.label.as_deref().filter(|label| !label.is_empty()) {
            let composite = node.has_children();
            let size = if composite {
                self.config.render.group_font_size
            } else {
                self.config.render.leaf_font_size
            };
            let color = style.color.unwrap_or(self.config.theme.label_color);
            match self.fonts.get(style.font.as_deref()) {
                Some(face) => {
                    let extent = measure_text(face, label, size);
                    let gap = self.config.render.label_gap as f64;
                    let top_left = if composite {
                        // beside the corner icon, vertically centered on it
                        let icon_mid = (icon_rect.min.y + icon_rect.max.y) as f64 / 2.0;
                        Vector2::new(icon_rect.max.x as f64 + gap, icon_mid - extent.y / 2.0)
                    } else {
                        let icon_mid = (icon_rect.min.x + icon_rect.max.x) as f64 / 2.0;
                        Vector2::new(icon_mid - extent.x / 2.0, icon_rect.max.y as f64 + gap)
                    };
                    draw_text(&mut self.canvas, face, label, size, top_left, color);
                }
                None => warn!("label of `{}` skipped: no font available", node.name),
            }
        }

        let children = node.children().to_vec();
        let border_children: Vec<NodeId> = node.border_children().iter().map(|bc| bc.node).collect();
        let links = node.links().to_vec();
        diagram.mark_drawn(id);

        for child in children.into_iter().chain(border_children) {
            self.draw_node(diagram, child, &style)?;
        }
        for link in links {
            self.try_draw_link(diagram, link)?;
        }
        Ok(())
    }

    fn try_draw_link(&mut self, diagram: &mut Diagram, id: LinkId) -> Result<()> {
        let link = diagram.link(id);
        if !(diagram.is_drawn(link.source) && diagram.is_drawn(link.target)) {
            return Ok(());
        }
        if !diagram.mark_link_drawn(id) {
            return Ok(());
        }
        let link = diagram.link(id).clone();
        self.draw_link(diagram, &link)
    }

    fn draw_link(&mut self, diagram: &Diagram, link: &Link) -> Result<()> {
        let routed = route(diagram, link, &self.config.layout)?;
        if routed.points.windows(2).all(|seg| seg[0] == seg[1]) {
            warn!(
                "connector `{}` -> `{}` skipped: anchors coincide at {:?}",
                diagram.node(link.source).name,
                diagram.node(link.target).name,
                routed.points.first()
            );
            return Ok(());
        }
        let points: Vec<Vector2> = routed.points.iter().copied().map(Vector2::from).collect();
        stroke_polyline(&mut self.canvas, &points, link.line_width, link.line_color);

        let n = points.len();
        if n >= 2 {
            if let Some(head) = &link.target_arrow {
                if let Some(tri) = arrowhead_points(points[n - 1], points[n - 2], head) {
                    fill_triangle(&mut self.canvas, tri, link.line_color);
                }
            }
            if let Some(head) = &link.source_arrow {
                if let Some(tri) = arrowhead_points(points[0], points[1], head) {
                    fill_triangle(&mut self.canvas, tri, link.line_color);
                }
            }
        }

        self.draw_link_labels(link, &routed.points);
        Ok(())
    }

    fn draw_link_labels(&mut self, link: &Link, points: &[Point]) {
        if link.labels.is_empty() {
            return;
        }
        let Some(face) = self.fonts.get(None) else {
            warn!("connector labels skipped: no font available");
            return;
        };
        let size = self.config.render.link_label_font_size;
        let distance = self.config.render.label_gap as f64 + self.config.layout.clearance as f64 / 2.0;
        let labels = [
            (&link.labels.source_left, true, LabelSide::Left),
            (&link.labels.source_right, true, LabelSide::Right),
            (&link.labels.target_left, false, LabelSide::Left),
            (&link.labels.target_right, false, LabelSide::Right),
        ];
        for (text, at_source, side) in labels {
            let Some(text) = text.as_deref() else {
                continue;
            };
            let Some((anchor, t)) = segment_anchor(points, at_source, distance) else {
                continue;
            };
            let extent = measure_text(face, text, size);
            let top_left = anchor + label_offset(t, side_normal(t, side), extent);
            draw_text(&mut self.canvas, face, text, size, top_left, self.config.theme.label_color);
        }
    }
}
