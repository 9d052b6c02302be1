//! bitatlas - inspect legacy bitmap fonts
//!
//! Decodes a BDF or FON file, prints its atlas summary and optionally
//! exports the atlas as PNG or dumps every glyph as text.

use anyhow::{anyhow, Context, Result};
use log::info;
use std::path::PathBuf;

use bitatlas::config::Config;
use bitatlas::{export, BitmapFont};

/// Value of a `--name=VALUE` argument
fn arg_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    let prefix = format!("{}=", name);
    args.iter().find_map(|a| a.strip_prefix(prefix.as_str()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("bitatlas {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = match arg_value(&args, "--config") {
        Some(path) => Config::load_from_file(path)?,
        None => Config::load(),
    };

    // Command line overrides config
    if let Some(format) = arg_value(&args, "--format") {
        config.font.format = format.to_string();
    }
    if let Some(png) = arg_value(&args, "--png") {
        config.export.png = png.to_string();
    }
    if args.iter().any(|a| a == "--preview") {
        config.export.preview = true;
    }
    if let Some(path) = args.iter().find(|a| !a.starts_with('-')) {
        config.font.path = path.clone();
    }

    if config.font.path.is_empty() {
        return Err(anyhow!("No font file given (see --help)"));
    }
    let path = PathBuf::from(&config.font.path);
    let format = config.font.resolve_format(&path)?;

    let data = std::fs::read(&path)
        .with_context(|| format!("Failed to read font file: {}", path.display()))?;
    info!("Read {} bytes from {}", data.len(), path.display());

    let font = BitmapFont::decode(&data, format)
        .with_context(|| format!("Failed to decode {} font: {}", format, path.display()))?;

    let (bbox_w, bbox_h) = font.bounding_box();
    println!(
        "{}: {} font, {} glyphs, atlas {}x{}, bounding box {}x{}, baseline {}",
        path.display(),
        font.format(),
        font.glyph_count(),
        font.atlas().width(),
        font.atlas().height(),
        bbox_w,
        bbox_h,
        font.baseline()
    );

    if config.export.preview {
        print!("{}", export::glyph_preview(&font));
    }
    if !config.export.png.is_empty() {
        export::save_png(font.atlas(), &config.export.png)?;
    }

    Ok(())
}

/// Print help message
fn print_help() {
    println!(
        r#"bitatlas {} - legacy bitmap font decoder and atlas packer

USAGE:
    bitatlas [OPTIONS] [FONT]

OPTIONS:
    -h, --help          Print this help message
    -V, --version       Print version information
    --format=TAG        Font format: bdf | fon (default: from file extension)
    --png=PATH          Write the glyph atlas as a grayscale PNG
    --preview           Print every glyph as '#' / '.' rows
    --config=PATH       Load settings from PATH instead of the default location

EXAMPLES:
    bitatlas fonts/terminus.bdf
    bitatlas --png=atlas.png fonts/vgasys.fon
    RUST_LOG=debug bitatlas --preview fonts/vgasys.fon

CONFIG FILE:
    ~/.config/bitatlas/config.toml (override with $BITATLAS_CONFIG)
"#,
        env!("CARGO_PKG_VERSION")
    );
}
