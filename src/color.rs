//! Color representations used between the hub and the controller.
//!
//! The hub speaks hue/saturation/brightness while the control utility
//! speaks 8-bit RGB, so every color crosses this module twice.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// An 8-bit RGB triple as printed and accepted by the control utility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = Error;

    /// Parses `"r, g, b"` with arbitrary whitespace around each channel.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let channels = input
            .split(',')
            .map(|item| item.trim().parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidColor(input.to_string()))?;
        match channels[..] {
            [r, g, b] => Ok(Rgb::new(r, g, b)),
            _ => Err(Error::InvalidColor(input.to_string())),
        }
    }
}

/// Hue in degrees (0-360), saturation and value in percent (0-100).
///
/// The value component doubles as the HomeKit brightness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Hsv {
    pub const fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }

    /// Returns a copy with every component forced into its valid range.
    pub fn clamped(self) -> Self {
        Self {
            h: clamp_or_zero(self.h, 360.0),
            s: clamp_or_zero(self.s, 100.0),
            v: clamp_or_zero(self.v, 100.0),
        }
    }
}

fn clamp_or_zero(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

/// Converts RGB color values to HSV, rounding every component.
///
/// Grey has no defined hue and reports 0; black reports saturation 0.
pub fn rgb_to_hsv(rgb: Rgb) -> Hsv {
    let r_f = rgb.r as f64 / 255.0;
    let g_f = rgb.g as f64 / 255.0;
    let b_f = rgb.b as f64 / 255.0;

    let max = r_f.max(g_f).max(b_f);
    let min = r_f.min(g_f).min(b_f);
    let delta = max - min;

    let mut h = if delta == 0.0 {
        0.0
    } else if max == r_f {
        60.0 * ((g_f - b_f) / delta)
    } else if max == g_f {
        60.0 * (((b_f - r_f) / delta) + 2.0)
    } else {
        60.0 * (((r_f - g_f) / delta) + 4.0)
    };
    if h < 0.0 {
        h += 360.0;
    }

    let s = if max == 0.0 { 0.0 } else { delta / max };

    Hsv::new(h.round(), (s * 100.0).round(), (max * 100.0).round())
}

/// Converts HSV to 8-bit RGB. Out of range inputs are clamped first.
pub fn hsv_to_rgb(hsv: Hsv) -> Rgb {
    let Hsv { h, s, v } = hsv.clamped();
    let h = h / 60.0;
    let s = s / 100.0;
    let v = v / 100.0 * 255.0;

    let sector = (h.floor() as u32) % 6;
    let f = h - h.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgb::new(to_channel(r), to_channel(g), to_channel(b))
}

fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
