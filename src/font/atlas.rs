//! Glyph atlas packing
//!
//! Shared by the BDF and FON decoders. A decoder sizes the atlas first,
//! allocates an [`AtlasBuilder`], blits every glyph into it and finally
//! freezes it into an immutable [`Atlas`].

use log::{debug, warn};

use super::error::FontError;
use crate::constants::MAX_ATLAS_DIMENSION;

/// Coverage value written for a set pixel
const COVERAGE_ON: u8 = 0xFF;
/// Coverage value written for a clear pixel
const COVERAGE_OFF: u8 = 0x00;

/// Smallest power of two >= n (1 for 0), None on overflow
pub fn next_power_of_two(n: u32) -> Option<u32> {
    n.max(1).checked_next_power_of_two()
}

/// Round a requested pixel extent up to a power of two, refusing anything
/// above the atlas ceiling before allocation happens
pub(crate) fn atlas_dimension(pixels: u64, axis: &str) -> Result<u32, FontError> {
    let dim = u32::try_from(pixels)
        .ok()
        .and_then(next_power_of_two)
        .filter(|&d| d <= MAX_ATLAS_DIMENSION);
    dim.ok_or_else(|| {
        FontError::format(format!(
            "font too large for atlas: {} of {} px exceeds the {} px limit",
            axis, pixels, MAX_ATLAS_DIMENSION
        ))
    })
}

/// Packed single-channel (R8) glyph texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atlas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Atlas {
    /// Texture width (power of two)
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Texture height (power of two)
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major coverage bytes, `width * height` long
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Coverage at (x, y), None outside the texture
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }
}

/// Mutable atlas owned by one decode call
#[derive(Debug)]
pub(crate) struct AtlasBuilder {
    width: u32,
    height: u32,
    data: Vec<u8>,
    /// Pixels dropped because they fell outside the texture
    clipped: usize,
}

impl AtlasBuilder {
    /// Allocate a zeroed `width`x`height` buffer
    pub fn new(width: u32, height: u32) -> Self {
        debug!("Allocating atlas {}x{}", width, height);
        Self {
            width,
            height,
            data: vec![COVERAGE_OFF; width as usize * height as usize],
            clipped: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Copy a `width`x`height` bitmap to (x, y)
    ///
    /// Pixels landing outside the texture are skipped and reported; that
    /// only happens when the caller's layout is wrong.
    pub fn blit(&mut self, bitmap: &[bool], width: u32, height: u32, x: u32, y: u32) {
        let mut clipped = 0usize;
        for row in 0..height {
            for col in 0..width {
                let src = bitmap
                    .get((row * width + col) as usize)
                    .copied()
                    .unwrap_or(false);
                let (dst_x, dst_y) = (x as u64 + col as u64, y as u64 + row as u64);
                if dst_x >= self.width as u64 || dst_y >= self.height as u64 {
                    clipped += 1;
                    continue;
                }
                let idx = (dst_y * self.width as u64 + dst_x) as usize;
                self.data[idx] = if src { COVERAGE_ON } else { COVERAGE_OFF };
            }
        }
        if clipped > 0 {
            warn!(
                "Glyph {}x{} at ({}, {}) clipped by atlas {}x{} ({} pixels dropped)",
                width, height, x, y, self.width, self.height, clipped
            );
            self.clipped += clipped;
        }
    }

    /// Total pixels dropped so far
    #[cfg(test)]
    pub fn clipped(&self) -> usize {
        self.clipped
    }

    /// Freeze into an immutable atlas
    pub fn finish(self) -> Atlas {
        if self.clipped > 0 {
            warn!("Atlas finished with {} clipped pixels", self.clipped);
        }
        Atlas {
            width: self.width,
            height: self.height,
            data: self.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(0), Some(1));
        assert_eq!(next_power_of_two(1), Some(1));
        assert_eq!(next_power_of_two(3), Some(4));
        assert_eq!(next_power_of_two(128), Some(128));
        assert_eq!(next_power_of_two(129), Some(256));
        assert_eq!(next_power_of_two(u32::MAX), None);
    }

    #[test]
    fn test_atlas_dimension_ceiling() {
        assert_eq!(atlas_dimension(100, "width"), Ok(128));
        assert_eq!(atlas_dimension(16384, "width"), Ok(16384));
        assert!(matches!(
            atlas_dimension(16385, "height"),
            Err(FontError::Format(_))
        ));
        assert!(atlas_dimension(u64::MAX, "height").is_err());
        let err = atlas_dimension(19000, "height").unwrap_err();
        assert!(err.to_string().contains("too large for atlas"));
    }

    #[test]
    fn test_blit_writes_coverage() {
        let mut builder = AtlasBuilder::new(4, 4);
        builder.blit(&[true, false, false, true], 2, 2, 1, 1);
        let atlas = builder.finish();
        assert_eq!(atlas.pixel(1, 1), Some(0xFF));
        assert_eq!(atlas.pixel(2, 1), Some(0x00));
        assert_eq!(atlas.pixel(2, 2), Some(0xFF));
        assert_eq!(atlas.pixel(0, 0), Some(0x00));
        assert_eq!(atlas.data().iter().filter(|&&b| b == 0xFF).count(), 2);
    }

    #[test]
    fn test_blit_clips_outside_pixels() {
        let mut builder = AtlasBuilder::new(4, 4);
        builder.blit(&[true; 9], 3, 3, 2, 2);
        assert_eq!(builder.clipped(), 5);
        let atlas = builder.finish();
        assert_eq!(atlas.pixel(3, 3), Some(0xFF));
        assert_eq!(atlas.pixel(4, 4), None);
    }
}
