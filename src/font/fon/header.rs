//! Windows font resource header (FNT, versions 2.x and 3.0)
//!
//! Field positions follow the documented FNT layout:
//!
//! ```text
//! 0x00 version      0x4A ascent          0x58 pix_height   0x63 width_bytes
//! 0x02 size         0x4C int. leading    0x5A pitch/family 0x65 device
//! 0x06 copyright    0x4E ext. leading    0x5B avg_width    0x69 face
//! 0x42 type         0x50 italic/ul/so    0x5D max_width    0x6D bits_pointer
//! 0x44 points       0x53 weight          0x5F first_char   0x71 bits_offset
//! 0x46 vert_res     0x55 charset         0x60 last_char    0x76 flags (3.0)
//! 0x48 horiz_res    0x56 pix_width       0x61 default/break 0x7A a/b/c space
//! ```

use log::{debug, trace};

use super::ByteReader;
use crate::constants::{
    align_dword, CHAR_ENTRY_SIZE_LARGE, CHAR_ENTRY_SIZE_SMALL, DFF_FIXED, DFF_PROPORTIONAL,
    FON_COPYRIGHT_LEN, FON_HEADER_SIZE_2X, FON_HEADER_SIZE_3X, FON_MAX_BITMAP_BYTES,
    FON_MAX_DIMENSION, FON_MAX_GLYPH_WIDTH, FON_TYPE_BITS_AT_OFFSET, FON_VERSION_3,
};
use crate::font::error::FontError;

/// Fields only present in the 3.0 layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct FonHeaderV3 {
    pub device: u32,
    pub face: u32,
    pub bits_pointer: u32,
    pub bits_offset: u32,
    pub flags: u32,
    pub a_space: u16,
    pub b_space: u16,
    pub c_space: u16,
    pub color_pointer: u32,
}

impl FonHeaderV3 {
    pub fn is_fixed_pitch(&self) -> bool {
        self.flags & DFF_FIXED != 0
    }

    pub fn is_proportional(&self) -> bool {
        self.flags & DFF_PROPORTIONAL != 0
    }
}

/// Decoded font resource header
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct FonHeader {
    pub version: u16,
    pub file_size: u32,
    pub copyright: String,
    pub font_type: u16,
    pub points: u16,
    pub vert_res: u16,
    pub horiz_res: u16,
    pub ascent: u16,
    pub internal_leading: u16,
    pub external_leading: u16,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub weight: u16,
    pub charset: u8,
    pub pix_width: u16,
    pub pix_height: u16,
    pub pitch_and_family: u8,
    pub avg_width: u16,
    pub max_width: u16,
    pub first_char: u8,
    pub last_char: u8,
    pub default_char: u8,
    pub break_char: u8,
    /// Bytes per scanline derived from the pixel width
    pub width_bytes: u16,
    /// Start of the resource within the input
    pub resource_offset: usize,
    pub v3: Option<FonHeaderV3>,
}

impl FonHeader {
    /// Read the header at `offset`; `size` is the resource size
    ///
    /// Reads past the end of the data yield zero; [`FonHeader::validate`]
    /// is what rejects such headers.
    pub fn parse(data: &ByteReader, offset: usize, size: usize) -> Result<Self, FontError> {
        if size < FON_HEADER_SIZE_2X {
            return Err(FontError::format(format!(
                "font header too short ({} bytes, need {})",
                size, FON_HEADER_SIZE_2X
            )));
        }
        trace!("FON header bytes at 0x{:X}:\n{}", offset, data.hex_dump(offset, 128));

        let at = |rel: usize| offset + rel;
        let version = data.u16(at(0x00));
        let pix_width = data.u16(at(0x56));

        let copyright_bytes = data.bytes(at(0x06), FON_COPYRIGHT_LEN);
        let copyright = String::from_utf8_lossy(copyright_bytes)
            .trim_end_matches('\0')
            .trim()
            .to_string();

        let v3 = (version == FON_VERSION_3).then(|| FonHeaderV3 {
            device: data.u32(at(0x65)),
            face: data.u32(at(0x69)),
            bits_pointer: data.u32(at(0x6D)),
            bits_offset: data.u32(at(0x71)),
            flags: data.u32(at(0x76)),
            a_space: data.u16(at(0x7A)),
            b_space: data.u16(at(0x7C)),
            c_space: data.u16(at(0x7E)),
            color_pointer: data.u32(at(0x80)),
        });

        let header = Self {
            version,
            file_size: data.u32(at(0x02)),
            copyright,
            font_type: data.u16(at(0x42)),
            points: data.u16(at(0x44)),
            vert_res: data.u16(at(0x46)),
            horiz_res: data.u16(at(0x48)),
            ascent: data.u16(at(0x4A)),
            internal_leading: data.u16(at(0x4C)),
            external_leading: data.u16(at(0x4E)),
            italic: data.u8(at(0x50)) != 0,
            underline: data.u8(at(0x51)) != 0,
            strikeout: data.u8(at(0x52)) != 0,
            weight: data.u16(at(0x53)),
            charset: data.u8(at(0x55)),
            pix_width,
            pix_height: data.u16(at(0x58)),
            pitch_and_family: data.u8(at(0x5A)),
            avg_width: data.u16(at(0x5B)),
            max_width: data.u16(at(0x5D)),
            first_char: data.u8(at(0x5F)),
            last_char: data.u8(at(0x60)),
            default_char: data.u8(at(0x61)),
            break_char: data.u8(at(0x62)),
            width_bytes: pix_width.div_ceil(8),
            resource_offset: offset,
            v3,
        };
        header.log_fields();
        Ok(header)
    }

    fn log_fields(&self) {
        debug!(
            "FON header: version 0x{:04X} ({}), size {}, type 0x{:04X}",
            self.version,
            if self.v3.is_some() { "3.0" } else { "2.x" },
            self.file_size,
            self.font_type
        );
        debug!("  copyright: {}", self.copyright);
        debug!(
            "  points {}, resolution {}x{}, ascent {}, leading {}/{}",
            self.points,
            self.horiz_res,
            self.vert_res,
            self.ascent,
            self.internal_leading,
            self.external_leading
        );
        debug!(
            "  italic {}, underline {}, strikeout {}, weight {}, charset 0x{:02X}",
            self.italic, self.underline, self.strikeout, self.weight, self.charset
        );
        debug!(
            "  pixels {}x{}, pitch/family 0x{:02X}, avg width {}, max width {}",
            self.pix_width, self.pix_height, self.pitch_and_family, self.avg_width, self.max_width
        );
        debug!(
            "  chars {}..={}, default {}, break {}, width bytes {}",
            self.first_char, self.last_char, self.default_char, self.break_char, self.width_bytes
        );
        if let Some(v3) = &self.v3 {
            debug!(
                "  device 0x{:X}, face 0x{:X}, bits pointer 0x{:X}, bits offset 0x{:X}",
                v3.device, v3.face, v3.bits_pointer, v3.bits_offset
            );
            debug!(
                "  flags 0x{:X} (fixed {}, proportional {}), spacing {}/{}/{}, color pointer 0x{:X}",
                v3.flags,
                v3.is_fixed_pitch(),
                v3.is_proportional(),
                v3.a_space,
                v3.b_space,
                v3.c_space,
                v3.color_pointer
            );
        }
    }

    /// Reject headers whose geometry is out of range or would need an
    /// unreasonable allocation
    pub fn validate(&self) -> Result<(), FontError> {
        check_dimension("pixel width", self.pix_width)?;
        check_dimension("pixel height", self.pix_height)?;
        check_dimension("max width", self.max_width)?;
        // first/last are u8, so only the ordering can be wrong
        if self.last_char < self.first_char {
            return Err(FontError::format(format!(
                "invalid character range: last char {} < first char {}",
                self.last_char, self.first_char
            )));
        }

        let total = self.bytes_per_char() as u64 * self.char_count() as u64;
        if total > FON_MAX_BITMAP_BYTES {
            return Err(FontError::format(format!(
                "unreasonable bitmap size: {} bytes ({} per char * {} chars)",
                total,
                self.bytes_per_char(),
                self.char_count()
            )));
        }

        if self.max_width as u32 > FON_MAX_GLYPH_WIDTH {
            return Err(FontError::format(format!(
                "glyph width {} needs more than one byte per scanline (at most {} supported)",
                self.max_width, FON_MAX_GLYPH_WIDTH
            )));
        }
        debug!(
            "FON: {} bytes per row, {} bytes per char, {} chars, {} bytes total",
            self.bytes_per_row(),
            self.bytes_per_char(),
            self.char_count(),
            total
        );
        Ok(())
    }

    pub fn char_count(&self) -> usize {
        self.last_char as usize - self.first_char as usize + 1
    }

    /// DWORD-aligned bytes per scanline
    pub fn bytes_per_row(&self) -> usize {
        align_dword(self.width_bytes as usize)
    }

    /// Bitmap stride between consecutive characters
    pub fn bytes_per_char(&self) -> usize {
        self.bytes_per_row() * self.pix_height as usize
    }

    /// Absolute offset of the first glyph bitmap
    pub fn bitmap_offset(&self) -> Result<usize, FontError> {
        // The character table carries one sentinel entry past last_char
        let table_entries = self.char_count() + 1;
        match &self.v3 {
            None => Ok(align_dword(
                self.resource_offset + FON_HEADER_SIZE_2X + table_entries * CHAR_ENTRY_SIZE_SMALL,
            )),
            Some(v3) if self.font_type & FON_TYPE_BITS_AT_OFFSET != 0 => self
                .resource_offset
                .checked_add(v3.bits_offset as usize)
                .ok_or_else(|| {
                    FontError::format(format!("bits offset 0x{:X} overflows", v3.bits_offset))
                }),
            Some(v3) => {
                let entry = if v3.is_fixed_pitch() {
                    CHAR_ENTRY_SIZE_LARGE
                } else {
                    CHAR_ENTRY_SIZE_SMALL
                };
                Ok(align_dword(
                    self.resource_offset + FON_HEADER_SIZE_3X + table_entries * entry,
                ))
            }
        }
    }
}

fn check_dimension(name: &str, value: u16) -> Result<(), FontError> {
    if value == 0 || value as u32 > FON_MAX_DIMENSION {
        return Err(FontError::format(format!("invalid font {}: {}", name, value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_header(version: u16, pix_width: u16, pix_height: u16, first: u8, last: u8) -> Vec<u8> {
        let mut data = vec![0u8; 256];
        data[0..2].copy_from_slice(&version.to_le_bytes());
        data[6..6 + 9].copy_from_slice(b"(c) test\0");
        data[0x4A..0x4C].copy_from_slice(&7u16.to_le_bytes());
        data[0x56..0x58].copy_from_slice(&pix_width.to_le_bytes());
        data[0x58..0x5A].copy_from_slice(&pix_height.to_le_bytes());
        data[0x5D..0x5F].copy_from_slice(&pix_width.to_le_bytes());
        data[0x5F] = first;
        data[0x60] = last;
        data
    }

    fn parse(data: &[u8]) -> FonHeader {
        FonHeader::parse(&ByteReader::new(data), 0, data.len()).unwrap()
    }

    #[test]
    fn test_parse_fields() {
        let h = parse(&raw_header(0x0200, 8, 12, 0x20, 0x7E));
        assert_eq!(h.copyright, "(c) test");
        assert_eq!(h.ascent, 7);
        assert_eq!((h.pix_width, h.pix_height, h.max_width), (8, 12, 8));
        assert_eq!(h.char_count(), 95);
        assert_eq!(h.width_bytes, 1);
        assert_eq!(h.bytes_per_row(), 4);
        assert_eq!(h.bytes_per_char(), 48);
        assert!(h.v3.is_none());
        assert!(h.validate().is_ok());
    }

    #[test]
    fn test_short_resource() {
        let data = vec![0u8; 100];
        assert!(matches!(
            FonHeader::parse(&ByteReader::new(&data), 0, data.len()),
            Err(FontError::Format(_))
        ));
    }

    #[test]
    fn test_validate_dimensions() {
        assert!(parse(&raw_header(0x0200, 0, 12, 0x20, 0x7E)).validate().is_err());
        assert!(parse(&raw_header(0x0200, 8, 257, 0x20, 0x7E)).validate().is_err());
        assert!(parse(&raw_header(0x0200, 10000, 12, 0x20, 0x7E)).validate().is_err());
        assert!(parse(&raw_header(0x0200, 8, 12, 0x50, 0x40)).validate().is_err());
    }

    #[test]
    fn test_validate_total_size() {
        // 256 px wide -> 32 bytes per row; 32 * 256 * 256 chars = 2 MiB
        let h = parse(&raw_header(0x0200, 256, 256, 0, 255));
        let err = h.validate().unwrap_err();
        assert!(err.to_string().contains("unreasonable"), "{}", err);
    }

    #[test]
    fn test_validate_wide_glyphs() {
        let h = parse(&raw_header(0x0200, 10, 11, 0x20, 0x7E));
        let err = h.validate().unwrap_err();
        assert!(err.to_string().contains("one byte per scanline"), "{}", err);
    }

    #[test]
    fn test_bitmap_offset_v2() {
        let h = parse(&raw_header(0x0200, 8, 2, 0x41, 0x41));
        // 118 + 2 * 4 = 126 -> 128
        assert_eq!(h.bitmap_offset().unwrap(), 128);
    }

    #[test]
    fn test_bitmap_offset_v3() {
        let mut data = raw_header(0x0300, 8, 2, 0x41, 0x42);
        data[0x76..0x7A].copy_from_slice(&DFF_FIXED.to_le_bytes());
        let h = parse(&data);
        // 148 + 3 * 6 = 166 -> 168
        assert_eq!(h.bitmap_offset().unwrap(), 168);

        data[0x76..0x7A].copy_from_slice(&DFF_PROPORTIONAL.to_le_bytes());
        // 148 + 3 * 4 = 160
        assert_eq!(parse(&data).bitmap_offset().unwrap(), 160);

        data[0x42..0x44].copy_from_slice(&FON_TYPE_BITS_AT_OFFSET.to_le_bytes());
        data[0x71..0x75].copy_from_slice(&0x200u32.to_le_bytes());
        assert_eq!(parse(&data).bitmap_offset().unwrap(), 0x200);
    }
}
