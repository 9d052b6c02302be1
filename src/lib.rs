//! bitatlas - legacy bitmap font decoder
//!
//! Decodes BDF and Windows FON bitmap fonts into an immutable glyph atlas:
//! one power-of-two single-channel texture plus per-glyph metrics and UV
//! rectangles for printable ASCII (0x20-0x7E).
//!
//! ```no_run
//! let data = std::fs::read("fonts/terminus.bdf")?;
//! let font = bitatlas::decode(&data, "bdf")?;
//! if let Some(glyph) = font.glyph('A') {
//!     println!("{:?} advance {}", glyph.uv, glyph.advance);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod constants;
pub mod export;
pub mod font;

pub use font::{
    decode, Atlas, AtlasRect, BitmapFont, FontError, FontFormat, FontMetrics, Glyph, UvRect,
};
