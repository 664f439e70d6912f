//! Window/level mapping from canonical 16-bit samples to 8-bit intensity

/// Precomputed window bounds for mapping many samples with one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowLevelTransform {
    lower: f64,
    upper: f64,
    width: f64,
    invert: bool,
}

impl WindowLevelTransform {
    /// Widths below 1 are treated as 1
    #[must_use]
    pub fn new(center: i32, width: i32, invert: bool) -> Self {
        let width = f64::from(width.max(1));
        let center = f64::from(center);
        Self {
            lower: center - width / 2.0,
            upper: center + width / 2.0,
            width,
            invert,
        }
    }

    #[inline(always)]
    #[must_use]
    // Hot path: called for every pixel on each window change
    pub fn map(&self, sample: u16) -> u8 {
        let value = f64::from(sample);

        let gray = if value <= self.lower {
            0
        } else if value >= self.upper {
            255
        } else {
            (((value - self.lower) / self.width) * 255.0).round().clamp(0.0, 255.0) as u8
        };

        if self.invert { 255 - gray } else { gray }
    }
}

/// Map one canonical sample through a window.
///
/// Samples at or below `center - width/2` are black, at or above
/// `center + width/2` white, linear in between. `invert` flips the result.
#[inline]
#[must_use]
pub fn map(sample: u16, center: i32, width: i32, invert: bool) -> u8 {
    WindowLevelTransform::new(center, width, invert).map(sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_saturate() {
        // window [900, 1100]
        assert_eq!(map(0, 1000, 200, false), 0);
        assert_eq!(map(900, 1000, 200, false), 0);
        assert_eq!(map(1100, 1000, 200, false), 255);
        assert_eq!(map(u16::MAX, 1000, 200, false), 255);
    }

    #[test]
    fn test_midpoint_and_interpolation() {
        assert_eq!(map(1000, 1000, 200, false), 128);
        assert_eq!(map(950, 1000, 200, false), 64);
    }

    #[test]
    fn test_full_range_window_matches_expected_buffer() {
        let out: Vec<u8> = [0, 32767, 65535, 16000]
            .iter()
            .map(|&s| map(s, 32767, 65535, false))
            .collect();
        assert_eq!(out, vec![0, 128, 255, 62]);
    }

    #[test]
    fn test_zero_and_negative_width_treated_as_one() {
        assert_eq!(map(99, 100, 0, false), 0);
        assert_eq!(map(101, 100, -5, false), 255);
        assert_eq!(map(100, 100, 0, false), map(100, 100, 1, false));
    }

    #[test]
    fn test_invert_is_complement() {
        for sample in (0..=u16::MAX).step_by(997) {
            for (center, width) in [(32767, 65535), (1000, 200), (40000, 1), (-500, 3000)] {
                assert_eq!(
                    map(sample, center, width, true),
                    255 - map(sample, center, width, false),
                    "sample={sample} center={center} width={width}"
                );
            }
        }
    }

    #[test]
    fn test_monotonic_in_sample() {
        for (center, width) in [(32767, 65535), (2000, 300), (60000, 10_000), (0, 1)] {
            let transform = WindowLevelTransform::new(center, width, false);
            let mut previous = 0;
            for sample in 0..=u16::MAX {
                let gray = transform.map(sample);
                assert!(gray >= previous, "not monotonic at {sample} for c={center} w={width}");
                previous = gray;
            }
        }
    }

    #[test]
    fn test_extreme_windows_stay_in_range() {
        // i32 extremes must not overflow the bound computation
        assert_eq!(map(0, i32::MAX, i32::MAX, false), 0);
        assert_eq!(map(u16::MAX, i32::MIN, 1, false), 255);
    }
}
