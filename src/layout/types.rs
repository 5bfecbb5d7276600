use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::assets::Icon;
use crate::geometry::{Margin, Padding, Rect};
use crate::theme::Rgba;

use super::error::{LayoutError, Result};
use super::windrose::Windrose;

/// Index of a node in the [`super::Diagram`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a connector in the [`super::Diagram`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub(crate) usize);

impl LinkId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Primary axis children are laid out along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => f.write_str("horizontal"),
            Orientation::Vertical => f.write_str("vertical"),
        }
    }
}

impl FromStr for Orientation {
    type Err = LayoutError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Orientation::Horizontal),
            "vertical" => Ok(Orientation::Vertical),
            _ => Err(LayoutError::UnknownOrientation {
                value: value.to_string(),
            }),
        }
    }
}

/// Cross-axis alignment. `Top`/`Bottom` only apply to horizontal flow,
/// `Left`/`Right` only to vertical flow; `Center` applies to both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Align {
    Top,
    Center,
    Bottom,
    Left,
    Right,
}

impl Align {
    pub fn parse(value: &str, orientation: Orientation) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Align::Top),
            "center" => Ok(Align::Center),
            "bottom" => Ok(Align::Bottom),
            "left" => Ok(Align::Left),
            "right" => Ok(Align::Right),
            _ => Err(LayoutError::UnknownAlignment {
                align: value.to_string(),
                orientation,
            }),
        }
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Align::Top => "top",
            Align::Center => "center",
            Align::Bottom => "bottom",
            Align::Left => "left",
            Align::Right => "right",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Resource,
    Group,
    HorizontalStack,
    VerticalStack,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Resource => "resource",
            NodeKind::Group => "group",
            NodeKind::HorizontalStack => "horizontal_stack",
            NodeKind::VerticalStack => "vertical_stack",
        }
    }
}

/// A node anchored to one side of its owner, outside the normal flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderChild {
    pub position: Windrose,
    pub node: NodeId,
}

/// A box in the diagram tree. Kinds differ only in their default data.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub bindings: Rect,
    /// Icon placement relative to `bindings.min`.
    pub icon_bounds: Rect,
    pub icon: Option<Icon>,
    pub border_color: Option<Rgba>,
    pub fill_color: Rgba,
    pub label: Option<String>,
    pub label_color: Option<Rgba>,
    pub label_font: Option<String>,
    pub margin: Margin,
    pub padding: Padding,
    pub direction: Orientation,
    pub align: Align,
    pub(crate) children: Vec<NodeId>,
    pub(crate) border_children: Vec<BorderChild>,
    pub(crate) links: Vec<LinkId>,
    pub(crate) drawn: bool,
}

impl Node {
    fn with_defaults(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            bindings: Rect::default(),
            icon_bounds: Rect::default(),
            icon: None,
            border_color: None,
            fill_color: Rgba::TRANSPARENT,
            label: None,
            label_color: None,
            label_font: None,
            margin: Margin::ZERO,
            padding: Padding::ZERO,
            direction: Orientation::Horizontal,
            align: Align::Center,
            children: Vec::new(),
            border_children: Vec::new(),
            links: Vec::new(),
            drawn: false,
        }
    }

    /// Icon-sized leaf box.
    pub fn resource(name: impl Into<String>) -> Self {
        Self {
            bindings: Rect::from_size(64, 64),
            icon_bounds: Rect::from_size(64, 64),
            margin: Margin::new(30, 100, 30, 100),
            ..Self::with_defaults(name, NodeKind::Resource)
        }
    }

    /// Framed container with a small corner icon and a title label.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            icon_bounds: Rect::from_size(40, 40),
            margin: Margin::new(20, 15, 20, 15),
            padding: Padding::new(50, 20, 20, 20),
            ..Self::with_defaults(name, NodeKind::Group)
        }
    }

    pub fn horizontal_stack(name: impl Into<String>) -> Self {
        Self::with_defaults(name, NodeKind::HorizontalStack)
    }

    pub fn vertical_stack(name: impl Into<String>) -> Self {
        Self {
            direction: Orientation::Vertical,
            ..Self::with_defaults(name, NodeKind::VerticalStack)
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn border_children(&self) -> &[BorderChild] {
        &self.border_children
    }

    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_drawn(&self) -> bool {
        self.drawn
    }

    /// Absolute icon rectangle for the current bindings.
    pub fn icon_rect(&self) -> Rect {
        self.icon_bounds
            .translate(self.bindings.min.x, self.bindings.min.y)
    }
}

/// Width class of an arrowhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrowWidth {
    Narrow,
    Default,
    Wide,
    /// Degenerate head that draws nothing.
    None,
}

impl ArrowWidth {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "narrow" => Ok(ArrowWidth::Narrow),
            "default" => Ok(ArrowWidth::Default),
            "wide" => Ok(ArrowWidth::Wide),
            _ => Err(LayoutError::UnknownArrowWidth {
                value: value.to_string(),
            }),
        }
    }

    /// Ratio triple `(a, b, c)`: the head reaches `length * a / b` back along
    /// the shaft and `length * c / b` to either side.
    pub fn ratios(self) -> (f64, f64, f64) {
        match self {
            ArrowWidth::Narrow => (3f64.sqrt(), 2.0, 1.0),
            ArrowWidth::Default => (1.0, 2f64.sqrt(), 1.0),
            ArrowWidth::Wide => (1.0, 2.0, 3f64.sqrt()),
            ArrowWidth::None => (0.0, 0.0, 0.0),
        }
    }
}

/// Ratio triple for a width class name. Unknown names degrade to `(0, 0, 0)`.
pub fn arrow_ratios(width: &str) -> (f64, f64, f64) {
    ArrowWidth::parse(width)
        .unwrap_or(ArrowWidth::None)
        .ratios()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowHead {
    pub width: ArrowWidth,
    pub length: i32,
}

impl ArrowHead {
    /// Unknown width classes are kept as a headless arrow instead of failing.
    pub fn new(width: &str, length: i32) -> Self {
        let width = ArrowWidth::parse(width).unwrap_or_else(|err| {
            warn!("{err}; arrowhead will not be drawn");
            ArrowWidth::None
        });
        Self { width, length }
    }
}

impl Default for ArrowHead {
    fn default() -> Self {
        Self {
            width: ArrowWidth::Default,
            length: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PathStyle {
    #[default]
    Straight,
    Orthogonal,
}

impl PathStyle {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "straight" => Some(PathStyle::Straight),
            "orthogonal" => Some(PathStyle::Orthogonal),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PathStyle::Straight => "straight",
            PathStyle::Orthogonal => "orthogonal",
        }
    }
}

/// Optional texts beside either end of a connector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkLabels {
    pub source_left: Option<String>,
    pub source_right: Option<String>,
    pub target_left: Option<String>,
    pub target_right: Option<String>,
}

impl LinkLabels {
    pub fn is_empty(&self) -> bool {
        self.source_left.is_none()
            && self.source_right.is_none()
            && self.target_left.is_none()
            && self.target_right.is_none()
    }
}

/// A connector between two nodes. Endpoints are arena indices, resolved to
/// live bindings at draw time.
#[derive(Debug, Clone)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
    pub source_position: Windrose,
    pub target_position: Windrose,
    pub source_arrow: Option<ArrowHead>,
    pub target_arrow: Option<ArrowHead>,
    pub line_width: i32,
    pub line_color: Rgba,
    pub style: PathStyle,
    pub labels: LinkLabels,
    pub(crate) drawn: bool,
}

impl Link {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            source_position: Windrose::Auto,
            target_position: Windrose::Auto,
            source_arrow: None,
            target_arrow: Some(ArrowHead::default()),
            line_width: 2,
            line_color: Rgba::BLACK,
            style: PathStyle::Straight,
            labels: LinkLabels::default(),
            drawn: false,
        }
    }

    pub fn is_drawn(&self) -> bool {
        self.drawn
    }
}
