//! Global constants for bitatlas
//!
//! Consolidates format signatures, sanity ceilings and character ranges
//! to eliminate magic numbers throughout the decoders.

// ============================================================================
// Character Range
// ============================================================================

/// First character code kept in a glyph map (space)
pub const FIRST_PRINTABLE: u32 = 0x20;

/// Last character code kept in a glyph map (tilde)
pub const LAST_PRINTABLE: u32 = 0x7E;

/// Whether a character code falls in the printable ASCII range
pub fn is_printable(code: u32) -> bool {
    (FIRST_PRINTABLE..=LAST_PRINTABLE).contains(&code)
}

// ============================================================================
// Atlas Sizing
// ============================================================================

/// Glyph columns per atlas row for BDF fonts
pub const BDF_GLYPHS_PER_ROW: u32 = 16;

/// Maximum atlas dimension (16384 pixels, the common GPU texture limit)
pub const MAX_ATLAS_DIMENSION: u32 = 16384;

/// DWORD alignment used by FON data and FON atlas cells
pub const DWORD_ALIGN: usize = 4;

/// Round up to the next multiple of 4
pub fn align_dword(value: usize) -> usize {
    (value + (DWORD_ALIGN - 1)) & !(DWORD_ALIGN - 1)
}

// ============================================================================
// FON Sanity Ceilings
// ============================================================================

/// Maximum accepted pixel width / height / max width in a FON header
pub const FON_MAX_DIMENSION: u32 = 256;

/// Maximum total glyph bitmap bytes a FON header may declare (1 MiB)
pub const FON_MAX_BITMAP_BYTES: u64 = 1024 * 1024;

/// Widest glyph the FON decoder can unpack (one byte per scanline)
pub const FON_MAX_GLYPH_WIDTH: u32 = 8;

// ============================================================================
// FON / NE Layout
// ============================================================================

/// "MZ" little-endian
pub const MZ_SIGNATURE: u16 = 0x5A4D;

/// "NE" little-endian
pub const NE_SIGNATURE: u16 = 0x454E;

/// Smallest buffer that can hold an MZ stub with its NE pointer
pub const MZ_HEADER_SIZE: usize = 0x40;

/// Position of the 32-bit NE header offset inside the MZ stub
pub const MZ_NE_OFFSET_FIELD: usize = 0x3C;

/// Size of the fixed NE header
pub const NE_HEADER_SIZE: usize = 0x40;

/// Position of the 16-bit resource table offset inside the NE header
pub const NE_RESOURCE_TABLE_FIELD: usize = 0x24;

/// NE resource type of a font resource (RT_FONT | 0x8000)
pub const RT_FONT: u16 = 0x8007;

/// Size of one NE resource entry
pub const NE_RESOURCE_ENTRY_SIZE: usize = 12;

/// Font header version selecting the 3.0 layout
pub const FON_VERSION_3: u16 = 0x0300;

/// Size of the 2.x font header (also the minimum accepted resource size)
pub const FON_HEADER_SIZE_2X: usize = 118;

/// Size of the 3.0 font header
pub const FON_HEADER_SIZE_3X: usize = 148;

/// Length of the copyright field
pub const FON_COPYRIGHT_LEN: usize = 60;

/// dfType bit: bitmap lives at dfBitsOffset
pub const FON_TYPE_BITS_AT_OFFSET: u16 = 0x0004;

/// dfFlags bit: fixed pitch
pub const DFF_FIXED: u32 = 0x0001;

/// dfFlags bit: proportional
pub const DFF_PROPORTIONAL: u32 = 0x0002;

/// Character table entry size for 2.x fonts and 3.0 proportional fonts
pub const CHAR_ENTRY_SIZE_SMALL: usize = 4;

/// Character table entry size for 3.0 fixed-pitch fonts
pub const CHAR_ENTRY_SIZE_LARGE: usize = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_dword() {
        assert_eq!(align_dword(0), 0);
        assert_eq!(align_dword(1), 4);
        assert_eq!(align_dword(4), 4);
        assert_eq!(align_dword(13), 16);
    }

    #[test]
    fn test_printable_range() {
        assert!(is_printable(32));
        assert!(is_printable(126));
        assert!(!is_printable(31));
        assert!(!is_printable(127));
    }
}
