//! MZ/NE executable container walk
//!
//! A .fon file is usually a 16-bit Windows executable whose resource table
//! holds one or more RT_FONT resources. Bare font resources (no MZ stub)
//! are accepted as-is.
//!
//! ```text
//! MZ stub   0x3C: u32 offset of NE header
//! NE header 0x24: u16 resource table offset (relative to NE header)
//! Resource table:
//!   u16 alignment shift
//!   repeated until type == 0:
//!     u16 type, u16 count, u32 reserved
//!     count x { u16 offset, u16 length, u16 flags, u16 id, u16, u16 }
//! ```

use log::{debug, warn};

use super::ByteReader;
use crate::constants::{
    MZ_HEADER_SIZE, MZ_NE_OFFSET_FIELD, MZ_SIGNATURE, NE_HEADER_SIZE, NE_RESOURCE_ENTRY_SIZE,
    NE_RESOURCE_TABLE_FIELD, NE_SIGNATURE, RT_FONT,
};
use crate::font::error::FontError;

/// Largest alignment shift that still fits a u32 offset
const MAX_ALIGN_SHIFT: u16 = 16;

/// How the resource was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ResourceSource {
    /// No MZ stub: the input is the resource
    Raw,
    /// First RT_FONT entry of the NE resource table
    Container,
    /// NE table had no RT_FONT group; the whole input is tried instead
    RawFallback,
}

/// Byte range of the font resource within the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ResourceLocation {
    pub offset: usize,
    pub size: usize,
    pub source: ResourceSource,
}

impl ResourceLocation {
    fn whole(data: &ByteReader, source: ResourceSource) -> Self {
        Self {
            offset: 0,
            size: data.len(),
            source,
        }
    }
}

/// Find the font resource inside `data`
pub(super) fn locate_font_resource(data: &ByteReader) -> Result<ResourceLocation, FontError> {
    if data.len() < MZ_HEADER_SIZE || data.u16(0) != MZ_SIGNATURE {
        debug!("FON: no MZ header, reading input as a raw font resource");
        return Ok(ResourceLocation::whole(data, ResourceSource::Raw));
    }

    let ne_offset = data.u32(MZ_NE_OFFSET_FIELD) as usize;
    debug!("FON: NE header offset 0x{:X}", ne_offset);
    let ne_fits = ne_offset
        .checked_add(NE_HEADER_SIZE)
        .is_some_and(|end| end <= data.len());
    if !ne_fits || data.u16(ne_offset) != NE_SIGNATURE {
        return Err(FontError::format(format!(
            "invalid NE header at 0x{:X}",
            ne_offset
        )));
    }

    let table = ne_offset + data.u16(ne_offset + NE_RESOURCE_TABLE_FIELD) as usize;
    if table + 2 > data.len() {
        return Err(FontError::format(format!(
            "NE resource table at 0x{:X} lies outside {} bytes of data",
            table,
            data.len()
        )));
    }
    let align_shift = data.u16(table);
    if align_shift >= MAX_ALIGN_SHIFT {
        return Err(FontError::format(format!(
            "NE resource alignment shift {} out of range",
            align_shift
        )));
    }
    debug!("FON: resource table at 0x{:X}, alignment shift {}", table, align_shift);

    let mut pos = table + 2;
    while pos + 8 <= data.len() {
        let type_id = data.u16(pos);
        if type_id == 0 {
            break;
        }
        let count = data.u16(pos + 2) as usize;
        let entries = pos + 8;
        debug!("FON: resource type 0x{:04X}, {} entries", type_id, count);

        if type_id == RT_FONT {
            return font_entry(data, entries, count, align_shift);
        }
        pos = entries + count * NE_RESOURCE_ENTRY_SIZE;
    }

    warn!("FON: no font resource in NE resource table, trying the whole input as a raw font");
    Ok(ResourceLocation::whole(data, ResourceSource::RawFallback))
}

/// Resolve the first entry of the RT_FONT group
fn font_entry(
    data: &ByteReader,
    entry: usize,
    count: usize,
    align_shift: u16,
) -> Result<ResourceLocation, FontError> {
    if count == 0 {
        return Err(FontError::ResourceNotFound(
            "RT_FONT group has no entries".to_string(),
        ));
    }
    if entry + NE_RESOURCE_ENTRY_SIZE > data.len() {
        return Err(FontError::ResourceNotFound(format!(
            "RT_FONT entry at 0x{:X} is truncated",
            entry
        )));
    }

    let offset = (data.u16(entry) as usize) << align_shift;
    let size = (data.u16(entry + 2) as usize) << align_shift;
    let flags = data.u16(entry + 4);
    let id = data.u16(entry + 6);
    debug!(
        "FON: font resource id 0x{:04X}, flags 0x{:04X}, offset 0x{:X}, size 0x{:X}",
        id, flags, offset, size
    );

    if offset >= data.len() {
        return Err(FontError::ResourceNotFound(format!(
            "font resource at 0x{:X} lies outside {} bytes of data",
            offset,
            data.len()
        )));
    }

    Ok(ResourceLocation {
        offset,
        // The last resource is often padded past the end of the file
        size: size.min(data.len() - offset),
        source: ResourceSource::Container,
    })
}
