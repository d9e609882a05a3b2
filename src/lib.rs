//! # flux_led HomeKit accessory driver
//!
//! This library exposes RGBW LED controllers driven by the `flux_led`
//! command-line utility as HomeKit-style light bulb accessories.
//!
//! ## Features
//!
//! - On/Off, Brightness, Hue and Saturation characteristics
//! - Warm-white-only controllers exposing brightness alone
//! - Periodic polling that pushes device-side changes to the hub
//! - YAML configuration for any number of controllers

pub mod accessory;
pub mod color;
pub mod command;
pub mod config;
mod error;
pub mod light_bulb;
pub mod platform;
pub mod status;

// Re-export main types for convenience
pub use accessory::{Accessory, CharacteristicKind, CharacteristicUpdate, CharacteristicValue, Service};
pub use command::{DeviceCommand, FluxLedCli, Transport};
pub use config::{LightBulbConfig, PlatformConfig};
pub use error::{Error, Result};
pub use light_bulb::{LightBulb, PollingHandle};
pub use platform::Platform;
