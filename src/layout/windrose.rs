use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

use super::error::{LayoutError, Result};

/// One of the 16 compass points, or `Auto` (chosen by the router).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Windrose {
    North,
    NorthNorthEast,
    NorthEast,
    EastNorthEast,
    East,
    EastSouthEast,
    SouthEast,
    SouthSouthEast,
    South,
    SouthSouthWest,
    SouthWest,
    WestSouthWest,
    West,
    WestNorthWest,
    NorthWest,
    NorthNorthWest,
    Auto,
}

/// Outward-facing side of a rectangle used by the orthogonal router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeSide {
    Top,
    Right,
    Bottom,
    Left,
}

impl EdgeSide {
    /// Unit outward normal in screen space.
    pub const fn normal(self) -> (i32, i32) {
        match self {
            EdgeSide::Top => (0, -1),
            EdgeSide::Right => (1, 0),
            EdgeSide::Bottom => (0, 1),
            EdgeSide::Left => (-1, 0),
        }
    }

    pub const fn is_vertical_normal(self) -> bool {
        matches!(self, EdgeSide::Top | EdgeSide::Bottom)
    }

    pub const fn opposite(self) -> Self {
        match self {
            EdgeSide::Top => EdgeSide::Bottom,
            EdgeSide::Right => EdgeSide::Left,
            EdgeSide::Bottom => EdgeSide::Top,
            EdgeSide::Left => EdgeSide::Right,
        }
    }
}

const COMPASS_TOKENS: [(&str, Windrose); 17] = [
    ("N", Windrose::North),
    ("NNE", Windrose::NorthNorthEast),
    ("NE", Windrose::NorthEast),
    ("ENE", Windrose::EastNorthEast),
    ("E", Windrose::East),
    ("ESE", Windrose::EastSouthEast),
    ("SE", Windrose::SouthEast),
    ("SSE", Windrose::SouthSouthEast),
    ("S", Windrose::South),
    ("SSW", Windrose::SouthSouthWest),
    ("SW", Windrose::SouthWest),
    ("WSW", Windrose::WestSouthWest),
    ("W", Windrose::West),
    ("WNW", Windrose::WestNorthWest),
    ("NW", Windrose::NorthWest),
    ("NNW", Windrose::NorthNorthWest),
    ("AUTO", Windrose::Auto),
];

impl Windrose {
    pub const ALL: [Windrose; 16] = [
        Windrose::North,
        Windrose::NorthNorthEast,
        Windrose::NorthEast,
        Windrose::EastNorthEast,
        Windrose::East,
        Windrose::EastSouthEast,
        Windrose::SouthEast,
        Windrose::SouthSouthEast,
        Windrose::South,
        Windrose::SouthSouthWest,
        Windrose::SouthWest,
        Windrose::WestSouthWest,
        Windrose::West,
        Windrose::WestNorthWest,
        Windrose::NorthWest,
        Windrose::NorthNorthWest,
    ];

    pub fn token(self) -> &'static str {
        COMPASS_TOKENS
            .iter()
            .find(|(_, dir)| *dir == self)
            .map(|(token, _)| *token)
            .unwrap_or("AUTO")
    }

    /// Quarter-grid cell `(col, row)` in `0..=4` for this direction.
    const fn grid_cell(self) -> Option<(i32, i32)> {
        let cell = match self {
            Windrose::North => (2, 0),
            Windrose::NorthNorthEast => (3, 0),
            Windrose::NorthEast => (4, 0),
            Windrose::EastNorthEast => (4, 1),
            Windrose::East => (4, 2),
            Windrose::EastSouthEast => (4, 3),
            Windrose::SouthEast => (4, 4),
            Windrose::SouthSouthEast => (3, 4),
            Windrose::South => (2, 4),
            Windrose::SouthSouthWest => (1, 4),
            Windrose::SouthWest => (0, 4),
            Windrose::WestSouthWest => (0, 3),
            Windrose::West => (0, 2),
            Windrose::WestNorthWest => (0, 1),
            Windrose::NorthWest => (0, 0),
            Windrose::NorthNorthWest => (1, 0),
            Windrose::Auto => return None,
        };
        Some(cell)
    }

    /// Side whose outward normal the orthogonal router leaves along.
    /// Corners belong to the top or bottom side.
    pub fn side(self) -> Result<EdgeSide> {
        let side = match self {
            Windrose::NorthNorthWest
            | Windrose::North
            | Windrose::NorthNorthEast
            | Windrose::NorthWest
            | Windrose::NorthEast => EdgeSide::Top,
            Windrose::EastNorthEast | Windrose::East | Windrose::EastSouthEast => EdgeSide::Right,
            Windrose::SouthSouthEast
            | Windrose::South
            | Windrose::SouthSouthWest
            | Windrose::SouthEast
            | Windrose::SouthWest => EdgeSide::Bottom,
            Windrose::WestSouthWest | Windrose::West | Windrose::WestNorthWest => EdgeSide::Left,
            Windrose::Auto => return Err(LayoutError::UnresolvedAuto),
        };
        Ok(side)
    }
}

impl fmt::Display for Windrose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Windrose {
    type Err = LayoutError;

    fn from_str(value: &str) -> Result<Self> {
        let upper = value.trim().to_ascii_uppercase();
        COMPASS_TOKENS
            .iter()
            .find(|(token, _)| *token == upper)
            .map(|(_, dir)| *dir)
            .ok_or_else(|| LayoutError::UnknownDirection {
                value: value.to_string(),
            })
    }
}

/// Anchor point on the perimeter of `rect` for a concrete compass direction.
///
/// The rectangle is split into quarters on both axes; each direction owns one
/// cell of the resulting 5x5 grid. Offsets use integer division.
pub fn resolve(rect: &Rect, direction: Windrose) -> Result<Point> {
    let (col, row) = direction.grid_cell().ok_or(LayoutError::UnresolvedAuto)?;
    let x = rect.min.x + rect.width() * col / 4;
    let y = rect.min.y + rect.height() * row / 4;
    Ok(Point::new(x, y))
}

/// Picks a concrete direction on `this` facing `other`.
///
/// The dominant axis of the center-to-center offset picks the cardinal side,
/// ties going to the horizontal axis. Unless `cardinal_only` is set, an offset
/// whose minor/major ratio reaches `intercardinal_ratio` picks the corner
/// instead. A zero offset resolves to south.
pub fn resolve_auto(
    this: &Rect,
    other: &Rect,
    cardinal_only: bool,
    intercardinal_ratio: f64,
) -> Windrose {
    let offset = other.center() - this.center();
    let (ax, ay) = (offset.x.abs(), offset.y.abs());
    if ax <= f64::EPSILON && ay <= f64::EPSILON {
        return Windrose::South;
    }

    let major = ax.max(ay);
    let minor = ax.min(ay);
    if !cardinal_only && minor / major >= intercardinal_ratio {
        return match (offset.x >= 0.0, offset.y >= 0.0) {
            (true, true) => Windrose::SouthEast,
            (true, false) => Windrose::NorthEast,
            (false, true) => Windrose::SouthWest,
            (false, false) => Windrose::NorthWest,
        };
    }

    if ax >= ay {
        if offset.x >= 0.0 {
            Windrose::East
        } else {
            Windrose::West
        }
    } else if offset.y >= 0.0 {
        Windrose::South
    } else {
        Windrose::North
    }
}
