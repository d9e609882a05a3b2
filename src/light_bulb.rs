//! Light bulb accessory backed by a `flux_led` controller.
//!
//! Hub reads are answered from a cached copy of the device state. Hub
//! writes update the cache and are translated into utility invocations.
//! A polling task periodically re-reads the device so that changes made
//! elsewhere (remote, app, power loss) reach the hub.

use std::{fmt, sync::Arc};

use tokio::{
    sync::{broadcast, Mutex, RwLock},
    task::JoinHandle,
};

use crate::{
    accessory::{Accessory, CharacteristicKind, CharacteristicUpdate, CharacteristicValue, Service},
    color::{hsv_to_rgb, Hsv},
    command::{DeviceCommand, Transport},
    config::LightBulbConfig,
    status::parse_status,
    Error, Result,
};

pub const MODEL_NAME: &str = "Light Bulb";
pub const SERIAL_NUMBER: &str = "00-001-LightBulb";

#[derive(Debug, Clone, Copy, PartialEq)]
struct CachedState {
    is_on: bool,
    color: Hsv,
}

/// A single RGBW controller exposed as a HomeKit light bulb.
pub struct LightBulb<T: Transport> {
    config: LightBulbConfig,
    transport: Arc<T>,
    state: RwLock<CachedState>,
    /// Serializes device commands; the cache lock is never held across one.
    commands: Mutex<()>,
    updates: broadcast::Sender<CharacteristicUpdate>,
}

impl<T: Transport> LightBulb<T> {
    /// Creates an accessory in the off state with white at full brightness.
    ///
    /// # Arguments
    ///
    /// * `config` - Per-light configuration
    /// * `transport` - Channel used to reach the controller
    /// * `updates` - Where device-side changes are published
    pub fn new(
        config: LightBulbConfig,
        transport: Arc<T>,
        updates: broadcast::Sender<CharacteristicUpdate>,
    ) -> Self {
        Self {
            config,
            transport,
            state: RwLock::new(CachedState {
                is_on: false,
                color: Hsv::new(0.0, 0.0, 100.0),
            }),
            commands: Mutex::new(()),
            updates,
        }
    }

    pub fn config(&self) -> &LightBulbConfig {
        &self.config
    }

    fn is_color_capable(&self) -> bool {
        !self.config.warm_white_only
    }

    fn log_message(&self, args: fmt::Arguments<'_>) {
        if self.config.debug {
            log::info!("[{}] {}", self.config.name, args);
        } else {
            log::debug!("[{}] {}", self.config.name, args);
        }
    }

    async fn send(&self, command: DeviceCommand) -> Result<String> {
        self.transport.execute(&self.config.ip, &command).await
    }

    pub async fn get_power_state(&self) -> bool {
        self.state.read().await.is_on
    }

    pub async fn get_brightness(&self) -> f64 {
        self.state.read().await.color.v
    }

    pub async fn get_hue(&self) -> f64 {
        self.state.read().await.color.h
    }

    pub async fn get_saturation(&self) -> f64 {
        self.state.read().await.color.s
    }

    /// Switches the controller on or off. The cache follows only on success.
    pub async fn set_power_state(&self, on: bool) -> Result<()> {
        self.log_message(format_args!("setPowerState {}", on));
        let _ordered = self.commands.lock().await;
        self.send(if on {
            DeviceCommand::PowerOn
        } else {
            DeviceCommand::PowerOff
        })
        .await?;
        self.state.write().await.is_on = on;
        Ok(())
    }

    pub async fn set_hue(&self, hue: f64) -> Result<()> {
        self.log_message(format_args!("setHue {}", hue));
        let _ordered = self.commands.lock().await;
        let color = self.update_color(|color| color.h = hue).await;
        self.send_color(color).await
    }

    pub async fn set_saturation(&self, saturation: f64) -> Result<()> {
        self.log_message(format_args!("setSaturation {}", saturation));
        let _ordered = self.commands.lock().await;
        let color = self.update_color(|color| color.s = saturation).await;
        self.send_color(color).await
    }

    /// Sets brightness through the color channels, or the warm white
    /// channel when the light is configured as warm white only.
    pub async fn set_brightness(&self, brightness: f64) -> Result<()> {
        self.log_message(format_args!("setBrightness {}", brightness));
        let _ordered = self.commands.lock().await;
        let color = self.update_color(|color| color.v = brightness).await;
        if self.is_color_capable() {
            return self.send_color(color).await;
        }
        let level = color.v.round() as u8;
        self.log_message(format_args!("white brightness {}", level));
        self.send(DeviceCommand::SetWarmWhite(level)).await?;
        Ok(())
    }

    /// Applies `change` to the cached color and returns the clamped result.
    async fn update_color<F: FnOnce(&mut Hsv)>(&self, change: F) -> Hsv {
        let mut state = self.state.write().await;
        change(&mut state.color);
        state.color = state.color.clamped();
        state.color
    }

    async fn send_color(&self, color: Hsv) -> Result<()> {
        let rgb = hsv_to_rgb(color);
        self.log_message(format_args!(
            "Setting new color from {} {:?} -> {}",
            self.config.ip, color, rgb
        ));
        self.send(DeviceCommand::SetColor(rgb)).await?;
        Ok(())
    }

    /// Queries the device, replaces the cache and publishes the new values.
    ///
    /// The query is ordered with hub writes, so a write issued while a
    /// poll is running lands after it. On failure the cache is left as it was.
    pub async fn refresh(&self) -> Result<()> {
        self.log_message(format_args!("Polling light {}", self.config.ip));
        let snapshot = {
            let _ordered = self.commands.lock().await;
            let stdout = self.send(DeviceCommand::QueryState).await?;
            let status = parse_status(&stdout);

            let mut state = self.state.write().await;
            state.is_on = status.on;
            state.color = status.color;
            *state
        };
        self.log_message(format_args!(
            "Updating device {} {:?} on={}",
            self.config.ip, snapshot.color, snapshot.is_on
        ));

        self.publish(CharacteristicKind::On, snapshot.is_on.into());
        self.publish(CharacteristicKind::Brightness, snapshot.color.v.into());
        if self.is_color_capable() {
            self.publish(CharacteristicKind::Hue, snapshot.color.h.into());
            self.publish(CharacteristicKind::Saturation, snapshot.color.s.into());
        }
        Ok(())
    }

    fn publish(&self, characteristic: CharacteristicKind, value: CharacteristicValue) {
        // No subscribers is fine; nobody is listening yet.
        let _ = self.updates.send(CharacteristicUpdate {
            accessory: self.config.name.clone(),
            characteristic,
            value,
        });
    }
}

impl<T: Transport + 'static> LightBulb<T> {
    /// Starts the polling task.
    ///
    /// The first refresh happens after the configured initial delay, then
    /// every `timeout` milliseconds. With `timeout: 0` only the first
    /// refresh runs. Failed refreshes are logged and polling carries on.
    pub fn spawn_polling(self: Arc<Self>) -> PollingHandle {
        let task = tokio::spawn(async move {
            tokio::time::sleep(self.config.initial_delay()).await;
            loop {
                if let Err(e) = self.refresh().await {
                    log::warn!("[{}] failed to poll {}: {}", self.config.name, self.config.ip, e);
                }
                match self.config.poll_interval() {
                    Some(interval) => tokio::time::sleep(interval).await,
                    None => break,
                }
            }
        });
        PollingHandle { task }
    }
}

#[async_trait::async_trait]
impl<T: Transport> Accessory for LightBulb<T> {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn model_name(&self) -> &'static str {
        MODEL_NAME
    }

    fn serial_number(&self) -> &'static str {
        SERIAL_NUMBER
    }

    fn services(&self) -> Vec<Service> {
        let mut characteristics = vec![CharacteristicKind::On, CharacteristicKind::Brightness];
        if self.is_color_capable() {
            characteristics.push(CharacteristicKind::Saturation);
            characteristics.push(CharacteristicKind::Hue);
        }
        vec![Service::lightbulb(self.config.name.clone(), characteristics)]
    }

    async fn get(&self, kind: CharacteristicKind) -> Result<CharacteristicValue> {
        self.ensure_supported(kind)?;
        Ok(match kind {
            CharacteristicKind::On => self.get_power_state().await.into(),
            CharacteristicKind::Brightness => self.get_brightness().await.into(),
            CharacteristicKind::Hue => self.get_hue().await.into(),
            CharacteristicKind::Saturation => self.get_saturation().await.into(),
        })
    }

    async fn set(&self, kind: CharacteristicKind, value: CharacteristicValue) -> Result<()> {
        self.ensure_supported(kind)?;
        let value = kind.normalize(value)?;
        match kind {
            CharacteristicKind::On => self.set_power_state(value.as_bool(kind)?).await,
            CharacteristicKind::Brightness => self.set_brightness(value.as_number(kind)?).await,
            CharacteristicKind::Hue => self.set_hue(value.as_number(kind)?).await,
            CharacteristicKind::Saturation => self.set_saturation(value.as_number(kind)?).await,
        }
    }
}

impl<T: Transport> LightBulb<T> {
    fn ensure_supported(&self, kind: CharacteristicKind) -> Result<()> {
        match kind {
            CharacteristicKind::Hue | CharacteristicKind::Saturation if !self.is_color_capable() => {
                Err(Error::UnsupportedCharacteristic(kind.name()))
            }
            _ => Ok(()),
        }
    }
}

/// Owns a running polling task and stops it when dropped.
pub struct PollingHandle {
    task: JoinHandle<()>,
}

impl PollingHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollingHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
