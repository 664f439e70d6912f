use crate::cli::Args;
use crate::dicom::DicomMetadata;
use crate::image::{DisplayBuffer, PixelFormat};
use anyhow::{Context, Result, anyhow};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use viuer::{Config as ViuerConfig, print};

/// Wrap a display buffer in an `image` buffer of the matching layout
pub fn to_dynamic_image(buffer: &DisplayBuffer) -> Result<DynamicImage> {
    let dimensions = buffer.dimensions();
    let data = buffer.data().to_vec();

    match buffer.format() {
        PixelFormat::Grayscale8 => GrayImage::from_raw(dimensions.width, dimensions.height, data)
            .map(DynamicImage::ImageLuma8)
            .context("Failed to create grayscale image buffer"),
        PixelFormat::Rgb888 => RgbImage::from_raw(dimensions.width, dimensions.height, data)
            .map(DynamicImage::ImageRgb8)
            .context("Failed to create RGB image buffer"),
    }
}

pub fn print_image(buffer: &DisplayBuffer, metadata: &DicomMetadata, args: &Args) -> Result<()> {
    let image = to_dynamic_image(buffer)?;
    let is_tty = std::io::stdout().is_terminal();

    // PAR = (vertical, horizontal): (1,1)=square, (2,1)=2x tall pixels
    let par_ratio = metadata.pixel_aspect_ratio().map_or(1.0, |par| par.ratio());

    let (config_width, config_height) = match (args.width, args.height) {
        (Some(w), ..) => (Some(w), None),
        (None, Some(h)) => (None, Some((f64::from(h) * par_ratio).round() as u32)),
        (None, None) => (Some(24), None),
    };

    let config = ViuerConfig {
        width: config_width,
        height: config_height,
        absolute_offset: false,
        use_kitty: is_tty,
        use_iterm: is_tty,
        use_sixel: is_tty,
        ..Default::default()
    };

    std::io::stdout()
        .flush()
        .map_err(|e| anyhow!("Failed to flush stdout: {e}"))?;

    print(&image, &config).map_err(|e| anyhow!("Failed to display image: {e}"))?;

    Ok(())
}

/// Write the buffer as PNG (L8 for grayscale, RGB8 for color)
pub fn save_png(buffer: &DisplayBuffer, path: &Path) -> Result<()> {
    to_dynamic_image(buffer)?
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// PNG path for file `index` of `count`; numbered when several files share one output
#[must_use]
pub fn output_path(base: &Path, index: usize, count: usize) -> PathBuf {
    if count <= 1 {
        return base.to_path_buf();
    }

    let stem = base.file_stem().map_or_else(|| "output".into(), |s| s.to_string_lossy());
    let extension = base.extension().map_or_else(|| "png".into(), |e| e.to_string_lossy());
    base.with_file_name(format!("{stem}-{}.{extension}", index + 1))
}
