//! BDF (Glyph Bitmap Distribution Format) decoder
//!
//! Two passes over the same text:
//! 1. Sizing: read `FONTBOUNDINGBOX`, count printable `ENCODING`s and take
//!    the largest printable `BBX` to size the atlas.
//! 2. Extraction: collect each glyph's `BBX` and `BITMAP` rows and pack it
//!    on `ENDCHAR`.
//!
//! Only the keywords needed for rendering are interpreted; every other
//! property line is skipped.

use std::collections::BTreeMap;

use log::{debug, trace, warn};

use super::atlas::{atlas_dimension, AtlasBuilder};
use super::error::FontError;
use super::glyph::{FontMetrics, Glyph, UvRect};
use super::{BitmapFont, FontFormat};
use crate::constants::{is_printable, BDF_GLYPHS_PER_ROW, MAX_ATLAS_DIMENSION};

/// Result of the sizing pass
#[derive(Debug, Clone, Copy, PartialEq)]
struct BdfDimensions {
    atlas_width: u32,
    atlas_height: u32,
    metrics: FontMetrics,
}

/// Per-glyph bounding box from `BBX`
#[derive(Debug, Clone, Copy)]
struct GlyphBox {
    width: u32,
    height: u32,
    x_offset: i32,
    y_offset: i32,
}

/// Glyph being assembled between `STARTCHAR` and `ENDCHAR`
#[derive(Debug, Default)]
struct GlyphState {
    code: Option<i64>,
    bbx: Option<GlyphBox>,
    bitmap: Option<Vec<bool>>,
}

/// Shelf cursor for placing glyphs left to right, top to bottom
#[derive(Debug)]
struct Cursor {
    x: u32,
    y: u32,
    row_height: u32,
}

/// Decode BDF text into a font
pub(crate) fn decode(text: &str) -> Result<BitmapFont, FontError> {
    let dims = measure(text)?;
    debug!(
        "BDF: atlas {}x{} for bounding box {}x{} (baseline {})",
        dims.atlas_width,
        dims.atlas_height,
        dims.metrics.bbox_width,
        dims.metrics.bbox_height,
        dims.metrics.baseline
    );

    let mut atlas = AtlasBuilder::new(dims.atlas_width, dims.atlas_height);
    let glyphs = extract_glyphs(text, &dims.metrics, &mut atlas)?;

    Ok(BitmapFont::from_parts(
        FontFormat::Bdf,
        glyphs,
        atlas.finish(),
        dims.metrics,
    ))
}

/// Pass 1: global bounding box and atlas size
///
/// Glyph boxes larger than FONTBOUNDINGBOX widen the shelf and raise the
/// per-glyph height budget, so every glyph fits inside the atlas.
fn measure(text: &str) -> Result<BdfDimensions, FontError> {
    let mut metrics: Option<FontMetrics> = None;
    let mut printable_count = 0u64;
    let mut in_printable = false;
    let mut max_glyph_width = 0u64;
    let mut max_glyph_height = 0u64;

    for (index, line) in text.lines().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&keyword) = tokens.first() else {
            continue;
        };
        let line_no = index + 1;

        match keyword {
            "FONTBOUNDINGBOX" => {
                metrics = Some(parse_font_bounding_box(&tokens, line_no)?);
            }
            "STARTCHAR" | "ENDCHAR" => in_printable = false,
            "ENCODING" => {
                let code = parse_int(&tokens, 1, line_no)?;
                in_printable = is_printable_code(code);
                if in_printable {
                    printable_count += 1;
                }
            }
            "BBX" if in_printable => {
                let bbx = parse_glyph_box(&tokens, line_no)?;
                max_glyph_width = max_glyph_width.max(bbx.width as u64);
                max_glyph_height = max_glyph_height.max(bbx.height as u64);
            }
            _ => {}
        }
    }

    let metrics =
        metrics.ok_or_else(|| FontError::format("BDF: FONTBOUNDINGBOX not found"))?;

    // Every shelf row is at most this tall and holds at least one glyph
    let cell_width = max_glyph_width.max(metrics.bbox_width as u64);
    let cell_height = max_glyph_height.max(metrics.bbox_height as u64);
    if cell_width > metrics.bbox_width as u64 || cell_height > metrics.bbox_height as u64 {
        debug!(
            "BDF: glyph boxes up to {}x{} exceed FONTBOUNDINGBOX {}x{}",
            cell_width, cell_height, metrics.bbox_width, metrics.bbox_height
        );
    }

    Ok(BdfDimensions {
        atlas_width: atlas_dimension(cell_width * BDF_GLYPHS_PER_ROW as u64, "width")?,
        atlas_height: atlas_dimension(cell_height * printable_count, "height")?,
        metrics,
    })
}

/// Pass 2: unpack bitmaps and pack printable glyphs into the atlas
fn extract_glyphs(
    text: &str,
    metrics: &FontMetrics,
    atlas: &mut AtlasBuilder,
) -> Result<BTreeMap<char, Glyph>, FontError> {
    let mut glyphs = BTreeMap::new();
    let mut state = GlyphState::default();
    let mut cursor = Cursor {
        x: 0,
        y: 0,
        row_height: metrics.bbox_height,
    };
    let mut lines = text.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&keyword) = tokens.first() else {
            continue;
        };
        let line_no = index + 1;

        match keyword {
            "STARTCHAR" => state = GlyphState::default(),
            "ENCODING" => state.code = Some(parse_int(&tokens, 1, line_no)?),
            "BBX" => {
                state.bbx = Some(parse_glyph_box(&tokens, line_no)?);
                state.bitmap = None;
            }
            "BITMAP" => {
                let bbx = state.bbx.ok_or_else(|| {
                    FontError::format(format!("BDF line {}: BITMAP before BBX", line_no))
                })?;
                let mut bitmap = vec![false; bbx.width as usize * bbx.height as usize];
                for row in 0..bbx.height {
                    let row_text = match lines.next() {
                        Some((_, l)) if l.trim() != "ENDCHAR" => l.trim(),
                        _ => {
                            return Err(FontError::format(format!(
                                "BDF line {}: BITMAP truncated after {} of {} rows",
                                line_no, row, bbx.height
                            )))
                        }
                    };
                    let start = (row * bbx.width) as usize;
                    let dest = &mut bitmap[start..start + bbx.width as usize];
                    unpack_hex_row(row_text, dest).map_err(|e| {
                        FontError::format(format!(
                            "BDF line {}: {}",
                            line_no + 1 + row as usize,
                            e
                        ))
                    })?;
                }
                state.bitmap = Some(bitmap);
            }
            "ENDCHAR" => {
                let finished = std::mem::take(&mut state);
                if let (Some(code), Some(bbx), Some(bitmap)) =
                    (finished.code, finished.bbx, finished.bitmap)
                {
                    if is_printable_code(code) {
                        place_glyph(code, bbx, bitmap, metrics, atlas, &mut cursor, &mut glyphs);
                    } else {
                        trace!("BDF: skipping glyph {} outside printable range", code);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(glyphs)
}

/// Pack one glyph at the cursor and record it
fn place_glyph(
    code: i64,
    bbx: GlyphBox,
    bitmap: Vec<bool>,
    metrics: &FontMetrics,
    atlas: &mut AtlasBuilder,
    cursor: &mut Cursor,
    glyphs: &mut BTreeMap<char, Glyph>,
) {
    // is_printable_code guarantees an ASCII scalar
    let Some(ch) = char::from_u32(code as u32) else {
        return;
    };
    if glyphs.contains_key(&ch) {
        warn!("BDF: duplicate ENCODING {}, keeping the first glyph", code);
        return;
    }

    // Wrap when this glyph would run past the right edge
    if cursor.x > 0 && cursor.x + bbx.width > atlas.width() {
        cursor.x = 0;
        cursor.y += cursor.row_height;
        cursor.row_height = metrics.bbox_height;
    }

    let (x, y) = (cursor.x, cursor.y);
    atlas.blit(&bitmap, bbx.width, bbx.height, x, y);

    let glyph = Glyph {
        code: ch,
        width: bbx.width,
        height: bbx.height,
        x_offset: bbx.x_offset,
        y_offset: metrics.baseline + bbx.y_offset,
        advance: metrics.bbox_width as i32,
        uv: UvRect::from_pixels(x, y, bbx.width, bbx.height, atlas.width(), atlas.height()),
        atlas_x: x,
        atlas_y: y,
        bitmap,
    };
    trace!("BDF: glyph {:?} at ({}, {})\n{}", ch, x, y, glyph.ascii_rows().join("\n"));
    glyphs.insert(ch, glyph);

    cursor.x += bbx.width;
    cursor.row_height = cursor.row_height.max(bbx.height);
}

fn is_printable_code(code: i64) -> bool {
    u32::try_from(code).map(is_printable).unwrap_or(false)
}

/// Unpack one hex row MSB-first into `dest`
///
/// Rows are padded to whole bytes on the right, so the first hex digit's
/// high bit is always column 0.
fn unpack_hex_row(row: &str, dest: &mut [bool]) -> Result<(), String> {
    let nibbles = row
        .chars()
        .map(|c| c.to_digit(16))
        .collect::<Option<Vec<u32>>>()
        .ok_or_else(|| format!("invalid hex bitmap row '{}'", row))?;
    if nibbles.len() * 4 < dest.len() {
        return Err(format!(
            "bitmap row '{}' holds {} bits, glyph is {} wide",
            row,
            nibbles.len() * 4,
            dest.len()
        ));
    }
    for (col, pixel) in dest.iter_mut().enumerate() {
        *pixel = (nibbles[col / 4] >> (3 - col % 4)) & 1 == 1;
    }
    Ok(())
}

fn parse_int(tokens: &[&str], index: usize, line_no: usize) -> Result<i64, FontError> {
    let token = tokens.get(index).ok_or_else(|| {
        FontError::format(format!(
            "BDF line {}: {} is missing field {}",
            line_no, tokens[0], index
        ))
    })?;
    token.parse::<i64>().map_err(|_| {
        FontError::format(format!(
            "BDF line {}: expected integer in {}, found '{}'",
            line_no, tokens[0], token
        ))
    })
}

/// Width or height field, bounded by the atlas ceiling
fn parse_extent(tokens: &[&str], index: usize, line_no: usize) -> Result<u32, FontError> {
    let value = parse_int(tokens, index, line_no)?;
    u32::try_from(value)
        .ok()
        .filter(|&v| v <= MAX_ATLAS_DIMENSION)
        .ok_or_else(|| {
            FontError::format(format!(
                "BDF line {}: {} extent {} out of range",
                line_no, tokens[0], value
            ))
        })
}

fn parse_offset(tokens: &[&str], index: usize, line_no: usize) -> Result<i32, FontError> {
    let value = parse_int(tokens, index, line_no)?;
    i32::try_from(value).map_err(|_| {
        FontError::format(format!(
            "BDF line {}: {} offset {} out of range",
            line_no, tokens[0], value
        ))
    })
}

fn parse_font_bounding_box(tokens: &[&str], line_no: usize) -> Result<FontMetrics, FontError> {
    let bbox_width = parse_extent(tokens, 1, line_no)?;
    let bbox_height = parse_extent(tokens, 2, line_no)?;
    parse_offset(tokens, 3, line_no)?;
    let y_offset = parse_offset(tokens, 4, line_no)?;
    Ok(FontMetrics {
        bbox_width,
        bbox_height,
        baseline: -y_offset,
    })
}

fn parse_glyph_box(tokens: &[&str], line_no: usize) -> Result<GlyphBox, FontError> {
    Ok(GlyphBox {
        width: parse_extent(tokens, 1, line_no)?,
        height: parse_extent(tokens, 2, line_no)?,
        x_offset: parse_offset(tokens, 3, line_no)?,
        y_offset: parse_offset(tokens, 4, line_no)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "STARTFONT 2.1\nFONT test\nSIZE 8 75 75\nFONTBOUNDINGBOX 8 8 0 -2\nCHARS 2\n";

    fn glyph_block(code: i64, bbx: &str, rows: &[&str]) -> String {
        let mut s = format!("STARTCHAR c{}\nENCODING {}\nSWIDTH 500 0\nDWIDTH 8 0\nBBX {}\nBITMAP\n", code, code, bbx);
        for row in rows {
            s.push_str(row);
            s.push('\n');
        }
        s.push_str("ENDCHAR\n");
        s
    }

    #[test]
    fn test_unpack_hex_row_msb_first() {
        let mut row = [false; 8];
        unpack_hex_row("A5", &mut row).unwrap();
        assert_eq!(row, [true, false, true, false, false, true, false, true]);

        let mut narrow = [false; 3];
        unpack_hex_row("E0", &mut narrow).unwrap();
        assert_eq!(narrow, [true, true, true]);
    }

    #[test]
    fn test_unpack_hex_row_rejects_bad_input() {
        let mut row = [false; 4];
        assert!(unpack_hex_row("ZZ", &mut row).is_err());
        let mut wide = [false; 12];
        assert!(unpack_hex_row("FF", &mut wide).is_err());
    }

    #[test]
    fn test_measure() {
        let text = format!(
            "{}{}{}{}",
            HEADER,
            glyph_block(65, "8 8 0 -2", &["FF"; 8]),
            glyph_block(66, "8 8 0 -2", &["FF"; 8]),
            glyph_block(200, "8 8 0 -2", &["FF"; 8]),
        );
        let dims = measure(&text).unwrap();
        assert_eq!(dims.atlas_width, 128);
        assert_eq!(dims.atlas_height, 16);
        assert_eq!(dims.metrics.baseline, 2);
    }

    #[test]
    fn test_measure_oversized_glyph_box() {
        let text = format!(
            "{}{}{}",
            HEADER,
            glyph_block(65, "8 16 0 -2", &["FF"; 16]),
            glyph_block(66, "24 8 0 -2", &["FFFFFF"; 8]),
        );
        let dims = measure(&text).unwrap();
        assert_eq!(dims.atlas_width, 512);
        assert_eq!(dims.atlas_height, 32);
        assert_eq!(dims.metrics.bbox_height, 8);
    }

    #[test]
    fn test_missing_bounding_box() {
        let text = glyph_block(65, "1 1 0 0", &["80"]);
        assert!(matches!(decode(&text), Err(FontError::Format(_))));
    }

    #[test]
    fn test_non_numeric_field() {
        let text = format!("{}{}", HEADER, glyph_block(65, "8 x 0 0", &["FF"]));
        assert!(matches!(decode(&text), Err(FontError::Format(_))));
    }

    #[test]
    fn test_truncated_bitmap() {
        let text = format!("{}{}", HEADER, glyph_block(65, "8 3 0 0", &["FF"]));
        let err = decode(&text).unwrap_err();
        assert!(err.to_string().contains("truncated"), "{}", err);

        let eof = format!("{}STARTCHAR A\nENCODING 65\nBBX 8 3 0 0\nBITMAP\nFF\n", HEADER);
        assert!(matches!(decode(&eof), Err(FontError::Format(_))));
    }

    #[test]
    fn test_glyph_metrics() {
        let text = format!("{}{}", HEADER, glyph_block(65, "5 7 1 -1", &["F8"; 7]));
        let font = decode(&text).unwrap();
        let g = font.glyph('A').unwrap();
        assert_eq!((g.width, g.height), (5, 7));
        assert_eq!(g.x_offset, 1);
        assert_eq!(g.y_offset, 1);
        assert_eq!(g.advance, 8);
        assert!((0..5).all(|x| g.pixel(x, 0)));
    }

    #[test]
    fn test_wraps_to_next_row() {
        let mut text = String::from(HEADER);
        for code in 32..=64 {
            text.push_str(&glyph_block(code, "8 8 0 -2", &["FF"; 8]));
        }
        let font = decode(&text).unwrap();
        let g = font.glyph('0').unwrap(); // 17th glyph
        assert_eq!((g.atlas_x, g.atlas_y), (0, 8));
    }

    #[test]
    fn test_duplicate_encoding_keeps_first() {
        let text = format!(
            "{}{}{}",
            HEADER,
            glyph_block(65, "1 1 0 0", &["80"]),
            glyph_block(65, "1 1 0 0", &["00"]),
        );
        let font = decode(&text).unwrap();
        assert_eq!(font.glyph_count(), 1);
        assert!(font.glyph('A').unwrap().pixel(0, 0));
    }
}
