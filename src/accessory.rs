//! HomeKit-style accessory model.
//!
//! An accessory owns services, a service owns characteristics, and the
//! hub reads or writes characteristics one at a time. State changes that
//! originate on the device side are pushed to the hub as
//! [`CharacteristicUpdate`]s.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The characteristics a light bulb service can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacteristicKind {
    On,
    Brightness,
    Hue,
    Saturation,
}

impl CharacteristicKind {
    pub fn name(self) -> &'static str {
        match self {
            CharacteristicKind::On => "On",
            CharacteristicKind::Brightness => "Brightness",
            CharacteristicKind::Hue => "Hue",
            CharacteristicKind::Saturation => "Saturation",
        }
    }

    /// Inclusive numeric range, `None` for boolean characteristics.
    pub fn range(self) -> Option<(f64, f64)> {
        match self {
            CharacteristicKind::On => None,
            CharacteristicKind::Brightness | CharacteristicKind::Saturation => Some((0.0, 100.0)),
            CharacteristicKind::Hue => Some((0.0, 360.0)),
        }
    }

    /// Checks the value type and clamps numbers into range.
    pub fn normalize(self, value: CharacteristicValue) -> Result<CharacteristicValue> {
        match self.range() {
            None => value.as_bool(self).map(CharacteristicValue::Bool),
            Some((min, max)) => {
                let number = value.as_number(self)?;
                let number = if number.is_nan() { min } else { number.clamp(min, max) };
                Ok(CharacteristicValue::Number(number))
            }
        }
    }
}

impl fmt::Display for CharacteristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A characteristic value as exchanged with the hub.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    Bool(bool),
    Number(f64),
}

impl CharacteristicValue {
    pub fn as_bool(self, kind: CharacteristicKind) -> Result<bool> {
        match self {
            CharacteristicValue::Bool(value) => Ok(value),
            CharacteristicValue::Number(_) => Err(Error::InvalidValue {
                characteristic: kind.name(),
                expected: "bool",
            }),
        }
    }

    pub fn as_number(self, kind: CharacteristicKind) -> Result<f64> {
        match self {
            CharacteristicValue::Number(value) => Ok(value),
            CharacteristicValue::Bool(_) => Err(Error::InvalidValue {
                characteristic: kind.name(),
                expected: "number",
            }),
        }
    }
}

impl From<bool> for CharacteristicValue {
    fn from(value: bool) -> Self {
        CharacteristicValue::Bool(value)
    }
}

impl From<f64> for CharacteristicValue {
    fn from(value: f64) -> Self {
        CharacteristicValue::Number(value)
    }
}

/// A Lightbulb service and the characteristics it exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub name: String,
    characteristics: Vec<CharacteristicKind>,
}

impl Service {
    pub fn lightbulb<S: Into<String>>(name: S, characteristics: Vec<CharacteristicKind>) -> Self {
        Self {
            name: name.into(),
            characteristics,
        }
    }

    pub fn has_characteristic(&self, kind: CharacteristicKind) -> bool {
        self.characteristics.contains(&kind)
    }

    pub fn characteristic_kinds(&self) -> &[CharacteristicKind] {
        &self.characteristics
    }
}

/// A device-side change pushed to the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicUpdate {
    pub accessory: String,
    pub characteristic: CharacteristicKind,
    pub value: CharacteristicValue,
}

/// An accessory the hub can query and control.
#[async_trait::async_trait]
pub trait Accessory: Send + Sync {
    fn name(&self) -> &str;

    fn model_name(&self) -> &'static str;

    fn serial_number(&self) -> &'static str;

    fn services(&self) -> Vec<Service>;

    /// Answers a hub read.
    async fn get(&self, kind: CharacteristicKind) -> Result<CharacteristicValue>;

    /// Applies a hub write.
    async fn set(&self, kind: CharacteristicKind, value: CharacteristicValue) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_into_range() {
        assert_eq!(
            CharacteristicKind::Hue.normalize(400.0.into()).unwrap(),
            CharacteristicValue::Number(360.0)
        );
        assert_eq!(
            CharacteristicKind::Brightness.normalize((-5.0).into()).unwrap(),
            CharacteristicValue::Number(0.0)
        );
        assert_eq!(
            CharacteristicKind::On.normalize(true.into()).unwrap(),
            CharacteristicValue::Bool(true)
        );
    }

    #[test]
    fn rejects_wrong_type() {
        let err = CharacteristicKind::On.normalize(1.0.into()).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { characteristic: "On", .. }));
        assert!(CharacteristicKind::Saturation.normalize(false.into()).is_err());
    }

    #[test]
    fn values_deserialize_untagged() {
        let value: CharacteristicValue = serde_json::from_str("true").unwrap();
        assert_eq!(value, CharacteristicValue::Bool(true));
        let value: CharacteristicValue = serde_json::from_str("42").unwrap();
        assert_eq!(value, CharacteristicValue::Number(42.0));
    }

    #[test]
    fn service_lists_characteristics() {
        let service = Service::lightbulb(
            "Desk",
            vec![CharacteristicKind::On, CharacteristicKind::Brightness],
        );
        assert!(service.has_characteristic(CharacteristicKind::On));
        assert!(!service.has_characteristic(CharacteristicKind::Hue));
        assert_eq!(service.characteristic_kinds().len(), 2);
    }
}
