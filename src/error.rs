//! Error type shared by every part of the driver.

use std::process::ExitStatus;

use thiserror::Error;

/// Errors produced while talking to the controller or handling hub requests.
#[derive(Error, Debug)]
pub enum Error {
    /// The control utility could not be spawned or its output read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The control utility ran but reported failure.
    #[error("command `{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    /// A characteristic was written with a value of the wrong type.
    #[error("invalid value for {characteristic}: expected {expected}")]
    InvalidValue {
        characteristic: &'static str,
        expected: &'static str,
    },

    /// The accessory does not expose the requested characteristic.
    #[error("characteristic {0} is not available on this accessory")]
    UnsupportedCharacteristic(&'static str),

    /// A color triple could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),
}

pub type Result<T> = std::result::Result<T, Error>;
