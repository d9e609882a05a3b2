//! Textual command protocol of the `flux_led` control utility.
//!
//! Every request is a single invocation of the utility with the
//! controller address followed by the flags for one operation. The
//! utility's stdout is returned unparsed; see [`crate::status`].

use std::process::Stdio;

use crate::{color::Rgb, Error, Result};

/// One operation understood by the control utility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceCommand {
    /// Print the current state (`-i`)
    QueryState,
    PowerOn,
    PowerOff,
    /// Set an RGB color (`-c R,G,B`)
    SetColor(Rgb),
    /// Drive the warm white channel at a level in percent (`-w LEVEL`)
    SetWarmWhite(u8),
}

impl DeviceCommand {
    /// Command-line arguments for this operation, without the address.
    pub fn args(&self) -> Vec<String> {
        match self {
            DeviceCommand::QueryState => vec!["-i".to_string()],
            DeviceCommand::PowerOn => vec!["--on".to_string()],
            DeviceCommand::PowerOff => vec!["--off".to_string()],
            DeviceCommand::SetColor(rgb) => vec!["-c".to_string(), rgb.to_string()],
            DeviceCommand::SetWarmWhite(level) => {
                vec!["-w".to_string(), (*level).min(100).to_string()]
            }
        }
    }
}

/// Something that can deliver a [`DeviceCommand`] to a controller.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Runs `command` against the controller at `ip` and returns its stdout.
    async fn execute(&self, ip: &str, command: &DeviceCommand) -> Result<String>;
}

/// [`Transport`] that shells out to the `flux_led` utility.
#[derive(Debug, Clone)]
pub struct FluxLedCli {
    program: String,
}

impl FluxLedCli {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for FluxLedCli {
    fn default() -> Self {
        Self::new("flux_led")
    }
}

#[async_trait::async_trait]
impl Transport for FluxLedCli {
    async fn execute(&self, ip: &str, command: &DeviceCommand) -> Result<String> {
        let args = command.args();
        log::trace!("running {} {} {}", self.program, ip, args.join(" "));

        let output = tokio::process::Command::new(&self.program)
            .arg(ip)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: format!("{} {} {}", self.program, ip, args.join(" ")),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::{collections::VecDeque, sync::Mutex, time::Duration};

    use super::*;

    /// Records every command and replays canned query responses.
    #[derive(Default)]
    pub(crate) struct MockTransport {
        pub(crate) sent: Mutex<Vec<(String, DeviceCommand)>>,
        pub(crate) responses: Mutex<VecDeque<Result<String>>>,
        pub(crate) fail_all: bool,
        pub(crate) delay: Option<Duration>,
    }

    impl MockTransport {
        pub(crate) fn failing() -> Self {
            Self {
                fail_all: true,
                ..Self::default()
            }
        }

        /// Every command takes `delay` to complete, like an unresponsive controller.
        pub(crate) fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        pub(crate) fn respond(&self, stdout: &str) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(stdout.to_string()));
        }

        pub(crate) fn commands(&self) -> Vec<DeviceCommand> {
            self.sent.lock().unwrap().iter().map(|(_, c)| *c).collect()
        }
    }

    #[async_trait::async_trait]
    impl Transport for MockTransport {
        async fn execute(&self, ip: &str, command: &DeviceCommand) -> Result<String> {
            self.sent.lock().unwrap().push((ip.to_string(), *command));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_all {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "flux_led not found",
                )));
            }
            match command {
                DeviceCommand::QueryState => self
                    .responses
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| Ok(String::new())),
                _ => Ok(String::new()),
            }
        }
    }
}
