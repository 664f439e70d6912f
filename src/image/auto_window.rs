//! Default window/level from a histogram of canonical samples
//!
//! The darkest and brightest 1% of pixels are treated as outliers; the window
//! spans what remains. Saturated regions and a few hot pixels therefore do not
//! stretch the window.

use super::canonical::WindowLevel;

pub const NUM_BINS: usize = 4096;

/// Narrowest window the estimator returns in the general case
pub const MIN_WIDTH: i32 = 100;

/// Ranges narrower than this use [`FLAT_WIDTH`] around the midpoint
pub const FLAT_RANGE: u16 = 10;
pub const FLAT_WIDTH: i32 = 256;

/// Estimated window plus the clipped value bounds it was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEstimate {
    pub lower_bound: i32,
    pub upper_bound: i32,
    pub window: WindowLevel,
}

/// Estimate a window for `pixels`; `None` for empty input
#[must_use]
pub fn estimate(pixels: &[u16]) -> Option<WindowLevel> {
    estimate_with_bounds(pixels).map(|estimate| estimate.window)
}

#[must_use]
pub fn estimate_with_bounds(pixels: &[u16]) -> Option<WindowEstimate> {
    let (min_val, max_val) = min_max(pixels)?;
    log::debug!("auto window: data range {min_val}..={max_val}");

    if max_val - min_val < FLAT_RANGE {
        let window = WindowLevel {
            center: (i32::from(max_val) + i32::from(min_val)) / 2,
            width: FLAT_WIDTH,
        };
        log::debug!("auto window: flat range, center={} width={}", window.center, window.width);
        return Some(WindowEstimate {
            lower_bound: i32::from(min_val),
            upper_bound: i32::from(max_val),
            window,
        });
    }

    let histogram = Histogram::build(pixels, min_val, max_val);
    let threshold = pixels.len() / 100;
    let lower_bin = histogram.lower_percentile_bin(threshold);
    let upper_bin = histogram.upper_percentile_bin(threshold);

    let lower_bound = (histogram.bin_start(lower_bin) as i32).max(i32::from(min_val));
    let upper_bound = (histogram.bin_start(upper_bin + 1) as i32).min(i32::from(max_val));

    let window = WindowLevel {
        center: (upper_bound + lower_bound) / 2,
        width: (upper_bound - lower_bound).max(MIN_WIDTH),
    };
    log::debug!(
        "auto window: effective range {lower_bound}..={upper_bound}, center={} width={}",
        window.center,
        window.width
    );

    Some(WindowEstimate {
        lower_bound,
        upper_bound,
        window,
    })
}

fn min_max(pixels: &[u16]) -> Option<(u16, u16)> {
    pixels.iter().copied().fold(None, |acc, value| match acc {
        None => Some((value, value)),
        Some((min, max)) => Some((min.min(value), max.max(value))),
    })
}

/// Uniform bins over `[min, max]`
struct Histogram {
    bins: Vec<usize>,
    min: f64,
    bin_size: f64,
}

impl Histogram {
    fn build(pixels: &[u16], min_val: u16, max_val: u16) -> Self {
        let range = f64::from(max_val - min_val) + 1.0;
        let bin_size = range / NUM_BINS as f64;
        let mut bins = vec![0usize; NUM_BINS];

        for &pixel in pixels {
            let bin = (f64::from(pixel - min_val) / bin_size) as usize;
            bins[bin.min(NUM_BINS - 1)] += 1;
        }

        Self {
            bins,
            min: f64::from(min_val),
            bin_size,
        }
    }

    /// First bin, scanning upward, where the running count exceeds `threshold`
    fn lower_percentile_bin(&self, threshold: usize) -> usize {
        let mut cumulative = 0;
        for (index, &count) in self.bins.iter().enumerate() {
            cumulative += count;
            if cumulative > threshold {
                return index;
            }
        }
        0
    }

    /// First bin, scanning downward, where the running count exceeds `threshold`
    fn upper_percentile_bin(&self, threshold: usize) -> usize {
        let mut cumulative = 0;
        for (index, &count) in self.bins.iter().enumerate().rev() {
            cumulative += count;
            if cumulative > threshold {
                return index;
            }
        }
        NUM_BINS - 1
    }

    /// Value at the lower edge of `bin`
    fn bin_start(&self, bin: usize) -> f64 {
        self.min + bin as f64 * self.bin_size
    }
}
