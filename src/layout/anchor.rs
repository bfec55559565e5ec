//! Named anchor points on an element's box
//!
//! Every element exposes nine anchor points: the four corners, the four edge
//! midpoints and the center. Anchors are used in two directions:
//!
//! - [`AnchorPoint::position`] maps an anchor onto a box in absolute coordinates
//! - [`AnchorPoint::offset`] gives the same point relative to the box's own origin,
//!   which turns "put my anchor P at point Q" into a top-left position
//!
//! For any box `B` the two agree: `position(p, B) = B.origin + offset(p, B)`.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{BoundingBox, Point, Vector};

/// One of the nine named points on a box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "String")]
pub enum AnchorPoint {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

/// Horizontal placement of an anchor point within its box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Left,
    Center,
    Right,
}

/// Vertical placement of an anchor point within its box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Top,
    Center,
    Bottom,
}

impl Column {
    fn fraction(self) -> f64 {
        match self {
            Column::Left => 0.0,
            Column::Center => 0.5,
            Column::Right => 1.0,
        }
    }
}

impl Row {
    fn fraction(self) -> f64 {
        match self {
            Row::Top => 0.0,
            Row::Center => 0.5,
            Row::Bottom => 1.0,
        }
    }
}

impl AnchorPoint {
    pub const ALL: [AnchorPoint; 9] = [
        AnchorPoint::TopLeft,
        AnchorPoint::TopCenter,
        AnchorPoint::TopRight,
        AnchorPoint::CenterLeft,
        AnchorPoint::Center,
        AnchorPoint::CenterRight,
        AnchorPoint::BottomLeft,
        AnchorPoint::BottomCenter,
        AnchorPoint::BottomRight,
    ];

    pub fn column(self) -> Column {
        match self {
            AnchorPoint::TopLeft | AnchorPoint::CenterLeft | AnchorPoint::BottomLeft => {
                Column::Left
            }
            AnchorPoint::TopCenter | AnchorPoint::Center | AnchorPoint::BottomCenter => {
                Column::Center
            }
            AnchorPoint::TopRight | AnchorPoint::CenterRight | AnchorPoint::BottomRight => {
                Column::Right
            }
        }
    }

    pub fn row(self) -> Row {
        match self {
            AnchorPoint::TopLeft | AnchorPoint::TopCenter | AnchorPoint::TopRight => Row::Top,
            AnchorPoint::CenterLeft | AnchorPoint::Center | AnchorPoint::CenterRight => {
                Row::Center
            }
            AnchorPoint::BottomLeft | AnchorPoint::BottomCenter | AnchorPoint::BottomRight => {
                Row::Bottom
            }
        }
    }

    /// Offset of this anchor from the box's own top-left corner
    pub fn offset(self, bounds: &BoundingBox) -> Vector {
        Vector::new(
            bounds.width * self.column().fraction(),
            bounds.height * self.row().fraction(),
        )
    }

    /// Absolute position of this anchor on the box
    pub fn position(self, bounds: &BoundingBox) -> Point {
        bounds.origin().offset_by(self.offset(bounds))
    }

    /// Strict lookup accepting camelCase, snake_case, kebab-case or spaced names
    pub fn from_name(name: &str) -> Option<AnchorPoint> {
        let normalized: String = name
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let anchor = match normalized.as_str() {
            "topleft" | "lefttop" => AnchorPoint::TopLeft,
            "topcenter" | "top" => AnchorPoint::TopCenter,
            "topright" | "righttop" => AnchorPoint::TopRight,
            "centerleft" | "left" => AnchorPoint::CenterLeft,
            "center" | "centercenter" | "middle" => AnchorPoint::Center,
            "centerright" | "right" => AnchorPoint::CenterRight,
            "bottomleft" | "leftbottom" => AnchorPoint::BottomLeft,
            "bottomcenter" | "bottom" => AnchorPoint::BottomCenter,
            "bottomright" | "rightbottom" => AnchorPoint::BottomRight,
            _ => return None,
        };
        Some(anchor)
    }

    /// Lenient lookup: unknown names fall back to `topLeft` with a warning
    pub fn parse(name: &str) -> AnchorPoint {
        Self::from_name(name).unwrap_or_else(|| {
            log::warn!("unknown anchor point '{}', falling back to topLeft", name);
            AnchorPoint::TopLeft
        })
    }

    /// Canonical camelCase name
    pub fn name(self) -> &'static str {
        match self {
            AnchorPoint::TopLeft => "topLeft",
            AnchorPoint::TopCenter => "topCenter",
            AnchorPoint::TopRight => "topRight",
            AnchorPoint::CenterLeft => "centerLeft",
            AnchorPoint::Center => "center",
            AnchorPoint::CenterRight => "centerRight",
            AnchorPoint::BottomLeft => "bottomLeft",
            AnchorPoint::BottomCenter => "bottomCenter",
            AnchorPoint::BottomRight => "bottomRight",
        }
    }
}

impl From<String> for AnchorPoint {
    fn from(name: String) -> Self {
        AnchorPoint::parse(&name)
    }
}

impl From<&str> for AnchorPoint {
    fn from(name: &str) -> Self {
        AnchorPoint::parse(name)
    }
}

impl fmt::Display for AnchorPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
