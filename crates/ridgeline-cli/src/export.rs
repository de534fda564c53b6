//! Heightmap file encoders.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ridgeline_config::OutputFormat;
use tracing::warn;

use crate::error::ExportError;

/// Writes a row-major heightmap in the requested format.
///
/// PNG output maps `[0, 1]` onto the full integer range; values outside it
/// are clamped. Raw output keeps the values unchanged.
pub fn write_heightmap(
    path: &Path,
    format: OutputFormat,
    width: u32,
    height: u32,
    data: &[f32],
) -> Result<(), ExportError> {
    let expected = width as usize * height as usize;
    if data.len() != expected {
        return Err(ExportError::SizeMismatch {
            len: data.len(),
            width,
            height,
            expected,
        });
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(ExportError::WriteError)?;
        }
    }
    let file = File::create(path).map_err(ExportError::WriteError)?;
    let mut out = BufWriter::new(file);

    match format {
        OutputFormat::Png16 => {
            warn_if_clamped(data);
            let pixels: Vec<u8> = data
                .iter()
                .flat_map(|&v| quantize(v, u16::MAX as f32).to_be_bytes())
                .collect();
            write_png(&mut out, width, height, png::BitDepth::Sixteen, &pixels)?;
        }
        OutputFormat::Png8 => {
            warn_if_clamped(data);
            let pixels: Vec<u8> = data.iter().map(|&v| quantize(v, u8::MAX as f32) as u8).collect();
            write_png(&mut out, width, height, png::BitDepth::Eight, &pixels)?;
        }
        OutputFormat::RawF32 => {
            for value in data {
                out.write_all(&value.to_le_bytes()).map_err(ExportError::WriteError)?;
            }
        }
    }

    out.flush().map_err(ExportError::WriteError)
}

/// Maps `[0, 1]` onto `[0, max]`, rounding to nearest. NaN becomes zero.
fn quantize(value: f32, max: f32) -> u16 {
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    (clamped * max).round() as u16
}

fn warn_if_clamped(data: &[f32]) {
    let outside = data.iter().filter(|v| !(0.0..=1.0).contains(*v)).count();
    if outside > 0 {
        warn!(outside, "heights outside [0, 1] clamped for png output");
    }
}

fn write_png<W: Write>(
    out: W,
    width: u32,
    height: u32,
    depth: png::BitDepth,
    pixels: &[u8],
) -> Result<(), ExportError> {
    let mut encoder = png::Encoder::new(out, width, height);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(depth);
    let mut writer = encoder.write_header().map_err(ExportError::EncodeError)?;
    writer.write_image_data(pixels).map_err(ExportError::EncodeError)?;
    writer.finish().map_err(ExportError::EncodeError)
}
