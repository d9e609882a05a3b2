//! Platform wiring: one light bulb per configured controller.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{
    accessory::{Accessory, CharacteristicUpdate},
    command::{FluxLedCli, Transport},
    config::{LightBulbConfig, PlatformConfig},
    light_bulb::{LightBulb, PollingHandle},
};

const UPDATE_CAPACITY: usize = 64;

/// All accessories of one configuration, sharing a transport and an
/// update channel.
pub struct Platform<T: Transport = FluxLedCli> {
    lights: Vec<Arc<LightBulb<T>>>,
    updates: broadcast::Sender<CharacteristicUpdate>,
}

impl Platform<FluxLedCli> {
    /// Builds the accessories of `config` on top of the `flux_led` utility.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use flux_homekit::{config, Platform};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let platform = Platform::from_config(config::load_config("config.yaml")?);
    /// let _polling = platform.start_polling();
    /// let mut updates = platform.subscribe();
    /// while let Ok(update) = updates.recv().await {
    ///     println!("{} {} = {:?}", update.accessory, update.characteristic, update.value);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_config(config: PlatformConfig) -> Self {
        let transport = Arc::new(FluxLedCli::new(config.command));
        Self::with_transport(config.lights, transport)
    }
}

impl<T: Transport + 'static> Platform<T> {
    pub fn with_transport(lights: Vec<LightBulbConfig>, transport: Arc<T>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        let lights = lights
            .into_iter()
            .map(|config| {
                log::info!("Adding light bulb {} at {}", config.name, config.ip);
                Arc::new(LightBulb::new(config, transport.clone(), updates.clone()))
            })
            .collect();
        Self { lights, updates }
    }

    pub fn lights(&self) -> &[Arc<LightBulb<T>>] {
        &self.lights
    }

    pub fn accessories(&self) -> Vec<Arc<dyn Accessory>> {
        self.lights
            .iter()
            .map(|light| light.clone() as Arc<dyn Accessory>)
            .collect()
    }

    /// Looks an accessory up by its configured name.
    pub fn find(&self, name: &str) -> Option<Arc<dyn Accessory>> {
        self.lights
            .iter()
            .find(|light| light.name() == name)
            .map(|light| light.clone() as Arc<dyn Accessory>)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CharacteristicUpdate> {
        self.updates.subscribe()
    }

    /// Starts polling every light. Polling stops when the handles drop.
    pub fn start_polling(&self) -> Vec<PollingHandle> {
        self.lights
            .iter()
            .map(|light| light.clone().spawn_polling())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        accessory::{CharacteristicKind, CharacteristicValue},
        command::{mock::MockTransport, DeviceCommand},
    };

    fn configs() -> Vec<LightBulbConfig> {
        let mut desk = LightBulbConfig::new("10.0.0.2");
        desk.name = "Desk".to_string();
        let mut shelf = LightBulbConfig::new("10.0.0.3");
        shelf.name = "Shelf".to_string();
        shelf.warm_white_only = true;
        vec![desk, shelf]
    }

    #[test]
    fn builds_from_config() {
        let config = crate::config::parse_config(
            "command: /usr/bin/flux_led\nlights:\n  - name: Desk\n    ip: 10.0.0.2\n",
        )
        .unwrap();
        let platform = Platform::from_config(config);
        assert_eq!(platform.lights().len(), 1);
        assert_eq!(platform.accessories()[0].model_name(), "Light Bulb");
    }

    #[tokio::test]
    async fn routes_by_name() {
        let transport = Arc::new(MockTransport::default());
        let platform = Platform::with_transport(configs(), transport.clone());

        let shelf = platform.find("Shelf").unwrap();
        shelf
            .set(CharacteristicKind::Brightness, CharacteristicValue::Number(30.0))
            .await
            .unwrap();
        assert!(platform.find("Porch").is_none());

        let sent = transport.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![("10.0.0.3".to_string(), DeviceCommand::SetWarmWhite(30))]);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_feeds_shared_channel() {
        let transport = Arc::new(MockTransport::default());
        transport.respond("[A] ON  [Color: (255, 0, 0)]");
        transport.respond("[B] OFF  [Color: (0, 0, 0)]");
        let platform = Platform::with_transport(configs(), transport.clone());
        let mut updates = platform.subscribe();

        let handles = platform.start_polling();
        tokio::time::sleep(Duration::from_millis(3_100)).await;

        let mut accessories = Vec::new();
        while let Ok(update) = updates.try_recv() {
            accessories.push(update.accessory);
        }
        assert_eq!(accessories.iter().filter(|name| *name == "Desk").count(), 4);
        assert_eq!(accessories.iter().filter(|name| *name == "Shelf").count(), 2);
        drop(handles);
    }
}
