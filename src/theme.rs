use serde::{Deserialize, Serialize};
use std::fmt;

/// Straight (non-premultiplied) 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`.
    pub fn parse_hex(value: &str) -> Option<Self> {
        let hex = value.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).ok();
        match hex.len() {
            6 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value).ok_or_else(|| format!("invalid color `{value}` (expected #RRGGBB or #RRGGBBAA)"))
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub background: Rgba,
    pub label_color: Rgba,
    pub line_color: Rgba,
    pub border_color: Rgba,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            background: Rgba::WHITE,
            label_color: Rgba::BLACK,
            line_color: Rgba::BLACK,
            border_color: Rgba::new(0, 0, 0, 255),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Rgba::new(0x1C, 0x24, 0x30, 255),
            label_color: Rgba::new(0xF8, 0xFA, 0xFF, 255),
            line_color: Rgba::new(0xC7, 0xD2, 0xE5, 255),
            border_color: Rgba::new(0x7A, 0x8A, 0xA6, 255),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Rgba::parse_hex("#FF0000"), Some(Rgba::new(255, 0, 0, 255)));
        assert_eq!(Rgba::parse_hex("#00ff007d"), Some(Rgba::new(0, 255, 0, 125)));
        assert_eq!(Rgba::parse_hex("FF0000"), None);
        assert_eq!(Rgba::parse_hex("#FF00"), None);
        assert_eq!(Rgba::parse_hex("#GG0000"), None);
    }

    #[test]
    fn color_serde_uses_hex_strings() {
        let color: Rgba = serde_json::from_str("\"#0A0B0C80\"").unwrap();
        assert_eq!(color, Rgba::new(10, 11, 12, 128));
        assert_eq!(serde_json::to_string(&color).unwrap(), "\"#0A0B0C80\"");
        assert!(serde_json::from_str::<Rgba>("\"red\"").is_err());
    }
}
