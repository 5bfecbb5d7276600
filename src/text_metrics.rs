use crate::assets::{AssetError, Result};
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use ttf_parser::{Face, GlyphId};

/// TrueType/OpenType face kept as raw bytes; parsed views are cheap to make.
#[derive(Debug, Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
    index: u32,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    ascii_advances: [u16; 128],
}

/// One positioned glyph of a laid-out line, in pixels from the pen origin.
#[derive(Debug, Clone, Copy)]
pub struct PlacedGlyph {
    pub id: GlyphId,
    pub x: f32,
}

impl FontFace {
    pub fn from_bytes(data: Vec<u8>, index: u32) -> Result<Self> {
        let face = Face::parse(&data, index).map_err(|err| AssetError::FontLoad {
            path: "<memory>".to_string(),
            reason: err.to_string(),
        })?;
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph_id) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph_id).unwrap_or(0);
            }
        }
        let units_per_em = face.units_per_em().max(1);
        let ascender = face.ascender();
        let descender = face.descender();
        Ok(Self {
            data: Arc::new(data),
            index,
            units_per_em,
            ascender,
            descender,
            ascii_advances,
        })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(data, 0).map_err(|err| match err {
            AssetError::FontLoad { reason, .. } => AssetError::FontLoad {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parsed view over the stored bytes.
    pub fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.index).ok()
    }

    pub fn scale(&self, font_size: f32) -> f32 {
        font_size / self.units_per_em as f32
    }

    pub fn ascent(&self, font_size: f32) -> f32 {
        self.ascender as f32 * self.scale(font_size)
    }

    /// Positive distance below the baseline.
    pub fn descent(&self, font_size: f32) -> f32 {
        -(self.descender as f32) * self.scale(font_size)
    }

    pub fn line_height(&self, font_size: f32) -> f32 {
        self.ascent(font_size) + self.descent(font_size)
    }

    pub fn measure_width(&self, text: &str, font_size: f32) -> f32 {
        if text.is_empty() || font_size <= 0.0 {
            return 0.0;
        }
        let scale = self.scale(font_size);
        let fallback = font_size * 0.56;

        if text.is_ascii() {
            let mut width = 0.0f32;
            for byte in text.as_bytes() {
                if *byte == b'\n' {
                    continue;
                }
                let advance = self.ascii_advances[*byte as usize];
                if advance == 0 {
                    width += fallback;
                } else {
                    width += advance as f32 * scale;
                }
            }
            return width.max(0.0);
        }

        self.layout_line(text, font_size)
            .last()
            .map(|(glyph, advance)| glyph.x + advance)
            .unwrap_or(0.0)
            .max(0.0)
    }

    /// Glyphs of a single line with their advances, left to right.
    /// Characters missing from the face are skipped with a fallback advance.
    pub fn layout_line(&self, text: &str, font_size: f32) -> Vec<(PlacedGlyph, f32)> {
        let Some(face) = self.face() else {
            return Vec::new();
        };
        let scale = self.scale(font_size);
        let fallback = font_size * 0.56;
        let mut pen = 0.0f32;
        let mut glyphs = Vec::new();
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            match face.glyph_index(ch) {
                Some(id) => {
                    let advance = face.glyph_hor_advance(id).unwrap_or(0) as f32 * scale;
                    glyphs.push((PlacedGlyph { id, x: pen }, advance));
                    pen += advance;
                }
                None => pen += fallback,
            }
        }
        glyphs
    }
}

/// Named faces with a default used for unset or unknown keys.
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    default: Option<FontFace>,
    faces: HashMap<String, FontFace>,
}

impl FontBook {
    pub fn new(default: Option<FontFace>) -> Self {
        Self {
            default,
            faces: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, face: FontFace) {
        self.faces.insert(key.into(), face);
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.faces.is_empty()
    }

    pub fn get(&self, key: Option<&str>) -> Option<&FontFace> {
        match key {
            Some(key) => match self.faces.get(key) {
                Some(face) => Some(face),
                None => {
                    warn!("font `{key}` is not loaded; using the default face");
                    self.default.as_ref()
                }
            },
            None => self.default.as_ref(),
        }
    }
}

/// Looks up a face from the system font database by CSS-like family list.
pub fn find_system_font(font_family: &str) -> Option<FontFace> {
    #[derive(Clone, Copy)]
    enum FamilyToken {
        Generic(fontdb::Family<'static>),
        Name(usize),
    }

    let mut names: Vec<String> = Vec::new();
    let mut order: Vec<FamilyToken> = Vec::new();
    for part in font_family.split(',') {
        let raw = part.trim().trim_matches('"').trim_matches('\'');
        if raw.is_empty() {
            continue;
        }
        match raw.to_ascii_lowercase().as_str() {
            "serif" => order.push(FamilyToken::Generic(Family::Serif)),
            "sans-serif" | "system-ui" => order.push(FamilyToken::Generic(Family::SansSerif)),
            "monospace" => order.push(FamilyToken::Generic(Family::Monospace)),
            _ => {
                let idx = names.len();
                names.push(raw.to_string());
                order.push(FamilyToken::Name(idx));
            }
        }
    }
    if order.is_empty() {
        order.push(FamilyToken::Generic(Family::SansSerif));
    }

    let families: Vec<Family<'_>> = order
        .iter()
        .map(|token| match *token {
            FamilyToken::Generic(family) => family,
            FamilyToken::Name(idx) => Family::Name(names[idx].as_str()),
        })
        .collect();

    let mut db = Database::new();
    db.load_system_fonts();
    let query = Query {
        families: &families,
        weight: Weight::NORMAL,
        stretch: Stretch::Normal,
        style: Style::Normal,
    };
    let id = db.query(&query)?;
    let loaded = db.with_face_data(id, |data, index| FontFace::from_bytes(data.to_vec(), index))?;
    match loaded {
        Ok(face) => {
            debug!("using system font for `{font_family}`");
            Some(face)
        }
        Err(err) => {
            warn!("system font for `{font_family}` is unusable: {err}");
            None
        }
    }
}
