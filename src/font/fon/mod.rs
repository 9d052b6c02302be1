//! Windows FON decoder
//!
//! Handles:
//! - MZ/NE container walk to the first RT_FONT resource (or a bare resource)
//! - 2.x / 3.0 header decode and sanity validation
//! - Bitmap offset resolution and glyph extraction
//! - Square grid layout with DWORD-aligned cells
//!
//! Only glyphs up to 8 pixels wide (one byte per scanline) are supported.

mod header;
mod ne;

use std::collections::BTreeMap;

use log::{debug, trace};

use self::header::FonHeader;
use self::ne::{ResourceLocation, ResourceSource};
use super::atlas::{atlas_dimension, AtlasBuilder};
use super::error::FontError;
use super::glyph::{FontMetrics, Glyph, UvRect};
use super::{BitmapFont, FontFormat};
use crate::constants::{align_dword, is_printable, DWORD_ALIGN};

/// Little-endian reader over the input; out of range reads yield zero
#[derive(Debug, Clone, Copy)]
pub(super) struct ByteReader<'a> {
    data: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Exactly `len` bytes at `offset`, None if they are not all present
    pub fn slice(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        self.data.get(offset..offset.checked_add(len)?)
    }

    /// Up to `len` bytes at `offset`, clamped to the data
    pub fn bytes(&self, offset: usize, len: usize) -> &'a [u8] {
        let start = offset.min(self.data.len());
        let end = offset.saturating_add(len).min(self.data.len());
        &self.data[start..end]
    }

    pub fn u8(&self, offset: usize) -> u8 {
        self.data.get(offset).copied().unwrap_or(0)
    }

    pub fn u16(&self, offset: usize) -> u16 {
        self.slice(offset, 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .unwrap_or(0)
    }

    pub fn u32(&self, offset: usize) -> u32 {
        self.slice(offset, 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .unwrap_or(0)
    }

    /// 16 bytes per line, hex plus ASCII
    pub fn hex_dump(&self, offset: usize, len: usize) -> String {
        self.bytes(offset, len)
            .chunks(16)
            .enumerate()
            .map(|(i, chunk)| {
                let hex: Vec<String> = chunk.iter().map(|b| format!("{:02X}", b)).collect();
                let ascii: String = chunk
                    .iter()
                    .map(|&b| if (32..127).contains(&b) { b as char } else { '.' })
                    .collect();
                format!("  {:04X}: {:<47} | {}", i * 16, hex.join(" "), ascii)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Atlas grid for fixed-size FON cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GridLayout {
    columns: u32,
    cell_width: u32,
    cell_height: u32,
    atlas_width: u32,
    atlas_height: u32,
}

impl GridLayout {
    /// Roughly square grid of `count` cells, each padded to a DWORD multiple
    fn new(glyph_width: u32, glyph_height: u32, count: u32) -> Result<Self, FontError> {
        let columns = (count as f64).sqrt().ceil() as u32;
        let rows = if columns == 0 { 0 } else { count.div_ceil(columns) };
        let pad = DWORD_ALIGN - 1;
        let cell_width = align_dword(glyph_width as usize + pad) as u32;
        let cell_height = align_dword(glyph_height as usize + pad) as u32;

        Ok(Self {
            columns,
            cell_width,
            cell_height,
            atlas_width: atlas_dimension(cell_width as u64 * columns as u64, "width")?,
            atlas_height: atlas_dimension(cell_height as u64 * rows as u64, "height")?,
        })
    }

    /// Top-left corner of cell `slot`
    fn position(&self, slot: u32) -> (u32, u32) {
        (
            (slot % self.columns) * self.cell_width,
            (slot / self.columns) * self.cell_height,
        )
    }
}

/// Decode FON bytes into a font
pub(crate) fn decode(data: &[u8]) -> Result<BitmapFont, FontError> {
    debug!("FON: {} bytes of input", data.len());
    let reader = ByteReader::new(data);
    let location = ne::locate_font_resource(&reader)?;

    match decode_resource(&reader, &location) {
        Err(FontError::Format(msg)) if location.source == ResourceSource::RawFallback => {
            Err(FontError::UnsupportedFormat(format!(
                "no font resource in NE container and raw fallback failed: {}",
                msg
            )))
        }
        result => result,
    }
}

fn decode_resource(
    reader: &ByteReader,
    location: &ResourceLocation,
) -> Result<BitmapFont, FontError> {
    let header = FonHeader::parse(reader, location.offset, location.size)?;
    header.validate()?;

    let glyph_width = header.max_width as u32;
    let glyph_height = header.pix_height as u32;
    let printable = (header.first_char..=header.last_char)
        .filter(|&c| is_printable(c as u32))
        .count() as u32;

    let layout = GridLayout::new(glyph_width, glyph_height, printable)?;
    debug!(
        "FON: atlas {}x{}, {} columns of {}x{} cells",
        layout.atlas_width, layout.atlas_height, layout.columns, layout.cell_width, layout.cell_height
    );

    let metrics = FontMetrics {
        bbox_width: glyph_width,
        bbox_height: glyph_height,
        baseline: header.ascent as i32,
    };

    let mut atlas = AtlasBuilder::new(layout.atlas_width, layout.atlas_height);
    let glyphs = extract_glyphs(reader, &header, &layout, &metrics, &mut atlas)?;

    Ok(BitmapFont::from_parts(
        FontFormat::Fon,
        glyphs,
        atlas.finish(),
        metrics,
    ))
}

fn extract_glyphs(
    reader: &ByteReader,
    header: &FonHeader,
    layout: &GridLayout,
    metrics: &FontMetrics,
    atlas: &mut AtlasBuilder,
) -> Result<BTreeMap<char, Glyph>, FontError> {
    let width = metrics.bbox_width;
    let height = metrics.bbox_height;
    let stride = header.bytes_per_char();
    let mut offset = header.bitmap_offset()?;
    let mut slot = 0u32;
    let mut glyphs = BTreeMap::new();

    debug!(
        "FON: glyph bitmaps from 0x{:X}, {} bytes per char",
        offset, stride
    );

    for code in header.first_char..=header.last_char {
        let rows = reader.slice(offset, height as usize).ok_or_else(|| {
            FontError::format(format!(
                "glyph {} data at 0x{:X} extends beyond end of data (need {} bytes, have {})",
                code,
                offset,
                height,
                reader.len().saturating_sub(offset)
            ))
        })?;
        trace!("FON: glyph {} raw rows {:02X?}", code, rows);

        if is_printable(code as u32) {
            let bitmap = unpack_rows(rows, width);
            let (x, y) = layout.position(slot);
            atlas.blit(&bitmap, width, height, x, y);

            let glyph = Glyph {
                code: code as char,
                width,
                height,
                x_offset: 0,
                y_offset: metrics.baseline,
                advance: width as i32,
                uv: UvRect::from_pixels(x, y, width, height, atlas.width(), atlas.height()),
                atlas_x: x,
                atlas_y: y,
                bitmap,
            };
            trace!("FON: glyph {:?} at ({}, {})\n{}", glyph.code, x, y, glyph.ascii_rows().join("\n"));
            glyphs.insert(glyph.code, glyph);
            slot += 1;
        }

        offset = align_dword(offset + stride);
    }

    Ok(glyphs)
}

/// Unpack one-byte scanlines stored bottom row first into a top-down,
/// MSB-first bitmap
fn unpack_rows(rows: &[u8], width: u32) -> Vec<bool> {
    let height = rows.len();
    let width = width as usize;
    let mut bitmap = vec![false; width * height];
    for y in 0..height {
        let byte = rows[height - 1 - y];
        for x in 0..width {
            bitmap[y * width + x] = byte & (0x80 >> x) != 0;
        }
    }
    bitmap
}
