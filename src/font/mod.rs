//! Bitmap font loading and glyph atlas packing
//!
//! Handles:
//! - BDF text fonts
//! - Windows FON fonts (bare or inside an MZ/NE executable)
//! - Packing the printable ASCII glyphs into one power-of-two R8 atlas
//!
//! [`BitmapFont`] is built in one step by a decoder and never changes
//! afterwards, so it can be shared freely between render threads.

pub mod atlas;
mod bdf;
pub mod error;
mod fon;
pub mod glyph;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::info;

pub use atlas::Atlas;
pub use error::FontError;
pub use glyph::{AtlasRect, FontMetrics, Glyph, UvRect};

/// Input format tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFormat {
    /// Glyph Bitmap Distribution Format (text)
    Bdf,
    /// Windows bitmap font resource (binary)
    Fon,
}

impl FontFormat {
    /// Tag name as accepted by [`FromStr`]
    pub fn as_str(&self) -> &'static str {
        match self {
            FontFormat::Bdf => "bdf",
            FontFormat::Fon => "fon",
        }
    }

    /// Infer the format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FontError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                FontError::UnsupportedFormat(format!("no file extension: {}", path.display()))
            })?;
        ext.parse()
    }
}

impl FromStr for FontFormat {
    type Err = FontError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bdf" => Ok(FontFormat::Bdf),
            "fon" => Ok(FontFormat::Fon),
            _ => Err(FontError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for FontFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded bitmap font: glyph map, atlas and global metrics
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapFont {
    format: FontFormat,
    glyphs: BTreeMap<char, Glyph>,
    atlas: Atlas,
    metrics: FontMetrics,
}

impl BitmapFont {
    /// Decode `data` as `format`
    pub fn decode(data: &[u8], format: FontFormat) -> Result<Self, FontError> {
        let font = match format {
            FontFormat::Bdf => bdf::decode(&String::from_utf8_lossy(data))?,
            FontFormat::Fon => fon::decode(data)?,
        };
        info!(
            "Loaded {} font: {} glyphs, atlas {}x{}, bounding box {}x{}, baseline {}",
            format,
            font.glyph_count(),
            font.atlas.width(),
            font.atlas.height(),
            font.metrics.bbox_width,
            font.metrics.bbox_height,
            font.metrics.baseline
        );
        Ok(font)
    }

    pub(crate) fn from_parts(
        format: FontFormat,
        glyphs: BTreeMap<char, Glyph>,
        atlas: Atlas,
        metrics: FontMetrics,
    ) -> Self {
        Self {
            format,
            glyphs,
            atlas,
            metrics,
        }
    }

    /// Decoder that produced this font
    pub fn format(&self) -> FontFormat {
        self.format
    }

    pub fn has_glyph(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }

    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs.get(&c)
    }

    /// All glyphs in ascending character order
    pub fn glyphs(&self) -> impl Iterator<Item = &Glyph> {
        self.glyphs.values()
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Bounding box (width, height) in pixels
    pub fn bounding_box(&self) -> (u32, u32) {
        (self.metrics.bbox_width, self.metrics.bbox_height)
    }

    pub fn baseline(&self) -> i32 {
        self.metrics.baseline
    }

    pub fn atlas(&self) -> &Atlas {
        &self.atlas
    }
}

/// Decode `data` using a format tag ("bdf" / "fon")
pub fn decode(data: &[u8], format: &str) -> Result<BitmapFont, FontError> {
    BitmapFont::decode(data, format.parse()?)
}
