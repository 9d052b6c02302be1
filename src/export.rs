//! Atlas export and glyph preview
//!
//! Debug helpers for inspecting a decoded font without a renderer:
//! a grayscale PNG of the atlas and a text dump of every glyph.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::font::{Atlas, BitmapFont};

/// Encode the atlas coverage buffer as an 8-bit grayscale PNG
pub fn encode_png(atlas: &Atlas) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, atlas.width(), atlas.height());
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(atlas.data())?;
        writer.finish()?;
    }
    Ok(bytes)
}

/// Write the atlas to `path` as PNG
pub fn save_png<P: AsRef<Path>>(atlas: &Atlas, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode_png(atlas)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write atlas image: {}", path.display()))?;
    info!("Atlas saved: {} ({}x{})", path.display(), atlas.width(), atlas.height());
    Ok(())
}

/// '#' / '.' dump of every glyph in character order
pub fn glyph_preview(font: &BitmapFont) -> String {
    let mut out = String::new();
    for glyph in font.glyphs() {
        let _ = writeln!(
            out,
            "'{}' (0x{:02X}) {}x{} advance {} at ({}, {})",
            glyph.code,
            glyph.code as u32,
            glyph.width,
            glyph.height,
            glyph.advance,
            glyph.atlas_x,
            glyph.atlas_y
        );
        for row in glyph.ascii_rows() {
            out.push_str("  ");
            out.push_str(&row);
            out.push('\n');
        }
    }
    out
}
