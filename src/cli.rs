use clap::Parser;
use std::path::PathBuf;

/// Terminal DICOM viewer with window/level control
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// DICOM file path(s) to display
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Output width in terminal columns
    #[arg(short = 'W', long)]
    pub width: Option<u32>,

    /// Output height in terminal rows
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Show DICOM metadata
    #[arg(short, long)]
    pub verbose: bool,

    /// Window center in normalized 16-bit units (0-65535)
    #[arg(short, long, allow_negative_numbers = true)]
    pub center: Option<i32>,

    /// Window width in normalized 16-bit units
    #[arg(short = 'w', long = "window-width", allow_negative_numbers = true)]
    pub window_width: Option<i32>,

    /// Estimate the window from the image histogram
    #[arg(long)]
    pub auto: bool,

    /// Restore the initial window after the other window options
    #[arg(long)]
    pub reset: bool,

    /// Write the rendered image as PNG instead of printing it
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Render grayscale as RGB
    #[arg(long)]
    pub rgb: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    #[must_use]
    pub fn has_window_override(&self) -> bool {
        self.center.is_some() || self.window_width.is_some()
    }
}
