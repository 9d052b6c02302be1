//! Glyph model
//!
//! Plain data shared by both decoders: per-glyph metrics, the unpacked
//! bitmap and the glyph's place in the atlas.

/// Normalized texture rectangle (0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    /// Left U coordinate
    pub s0: f32,
    /// Top V coordinate
    pub t0: f32,
    /// Right U coordinate
    pub s1: f32,
    /// Bottom V coordinate
    pub t1: f32,
}

impl UvRect {
    /// UV rectangle of a `width`x`height` region at (x, y) in an atlas
    pub fn from_pixels(x: u32, y: u32, width: u32, height: u32, atlas_width: u32, atlas_height: u32) -> Self {
        let aw = atlas_width as f32;
        let ah = atlas_height as f32;
        Self {
            s0: x as f32 / aw,
            t0: y as f32 / ah,
            s1: (x + width) as f32 / aw,
            t1: (y + height) as f32 / ah,
        }
    }
}

/// Pixel rectangle inside the atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRect {
    /// Whether two rectangles share at least one pixel
    pub fn overlaps(&self, other: &AtlasRect) -> bool {
        if self.width == 0 || self.height == 0 || other.width == 0 || other.height == 0 {
            return false;
        }
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Render data for one character
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Character code
    pub code: char,
    /// Bitmap width (pixels)
    pub width: u32,
    /// Bitmap height (pixels)
    pub height: u32,
    /// Horizontal bearing
    pub x_offset: i32,
    /// Vertical offset (baseline-relative as produced by the decoder)
    pub y_offset: i32,
    /// Horizontal advance to next character
    pub advance: i32,
    /// Texture coordinates in the atlas
    pub uv: UvRect,
    /// Left edge in the atlas (pixels)
    pub atlas_x: u32,
    /// Top edge in the atlas (pixels)
    pub atlas_y: u32,
    /// Row-major coverage, `width * height` entries, row 0 is the top
    pub bitmap: Vec<bool>,
}

impl Glyph {
    /// Pixel at (x, y); out of range reads are clear
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.bitmap
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Pixel rectangle this glyph occupies in the atlas
    pub fn atlas_rect(&self) -> AtlasRect {
        AtlasRect {
            x: self.atlas_x,
            y: self.atlas_y,
            width: self.width,
            height: self.height,
        }
    }

    /// '#' / '.' rendering of the bitmap, one line per row
    pub fn ascii_rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| if self.pixel(x, y) { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }
}

/// Global font geometry shared by all glyphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FontMetrics {
    /// Bounding box width (pixels)
    pub bbox_width: u32,
    /// Bounding box height (pixels)
    pub bbox_height: u32,
    /// Baseline offset (pixels)
    pub baseline: i32,
}
