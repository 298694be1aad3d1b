//! Screenshots of the emulated screen.
//!
//! Frames are written as RGBA PNG files to `<root>/Screenshots/`, named
//! `<game>_screenshot_<timestamp>.png`.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::engine::VideoFrame;

/// Sanitize a game name for use in filenames.
///
/// Drops the ROM extension, lowercases, and collapses anything that is not
/// alphanumeric into single underscores.
fn sanitize_filename(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);

    let sanitized = stem
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if sanitized.is_empty() {
        "game".to_string()
    } else {
        sanitized
    }
}

/// Generate a timestamped filename with game name prefix.
fn timestamped_filename(game_name: &str, suffix: &str, extension: &str) -> String {
    let now = chrono::Local::now();
    format!(
        "{}_{}_{}.{}",
        sanitize_filename(game_name),
        suffix,
        now.format("%Y-%m-%d_%H-%M-%S%.3f"),
        extension
    )
}

/// Save a frame as PNG inside `dir`, creating the directory if needed.
pub fn save_screenshot(dir: &Path, game_name: &str, frame: &VideoFrame) -> Result<PathBuf> {
    let expected = frame.width as usize * frame.height as usize;
    anyhow::ensure!(
        frame.pixels.len() == expected,
        "frame has {} pixels, expected {}x{}",
        frame.pixels.len(),
        frame.width,
        frame.height
    );

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(timestamped_filename(game_name, "screenshot", "png"));

    let file = File::create(&path).context("Failed to create screenshot file")?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut png_writer = encoder
        .write_header()
        .context("Failed to write PNG header")?;
    png_writer
        .write_image_data(&frame.to_rgba())
        .context("Failed to write PNG data")?;

    tracing::info!("Screenshot saved: {}", path.display());

    Ok(path)
}
