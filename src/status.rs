//! Parsing of the control utility's state report (`-i` output).

use lazy_static::lazy_static;
use regex::Regex;

use crate::color::{rgb_to_hsv, Hsv, Rgb};

lazy_static! {
    static ref POWER_ON: Regex = Regex::new(r"\] ON ").unwrap();
    // Trailing channels (e.g. the white of an RGBW group) are matched and ignored.
    static ref COLOR_TRIPLE: Regex =
        Regex::new(r"\(([^(),]*),([^(),]*),([^(),]*)(?:,[^(),]*)*\)").unwrap();
}

/// Color reported when the output carries no color triple.
pub const FALLBACK_COLOR: Hsv = Hsv::new(255.0, 100.0, 50.0);

/// Device state as reported by one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceStatus {
    pub on: bool,
    pub color: Hsv,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            on: false,
            color: FALLBACK_COLOR,
        }
    }
}

/// Extracts power and color from the utility's stdout.
///
/// A line such as `[MAC: ...] ON  [Color: (255, 0, 0) Brightness: 100%]`
/// yields `on = true` and the HSV equivalent of the first triple whose
/// channels all parse as bytes.
pub fn parse_status(stdout: &str) -> DeviceStatus {
    let on = POWER_ON.is_match(stdout);
    let color = COLOR_TRIPLE
        .captures_iter(stdout)
        .find_map(|caps| format!("{},{},{}", &caps[1], &caps[2], &caps[3]).parse::<Rgb>().ok())
        .map(rgb_to_hsv)
        .unwrap_or(FALLBACK_COLOR);
    DeviceStatus { on, color }
}
