use std::{env, io::Write};

use flux_homekit::{
    config, Accessory, CharacteristicKind, CharacteristicValue, Platform, PlatformConfig,
};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// A hub request read from stdin, one JSON object per line.
///
/// `{"accessory":"Desk","characteristic":"hue","value":120}` writes,
/// leaving out `value` reads.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Request {
    accessory: String,
    characteristic: CharacteristicKind,
    value: Option<CharacteristicValue>,
}

async fn handle(platform: &Platform, line: &str) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let request: Request = serde_json::from_str(line)?;
    let accessory = platform
        .find(&request.accessory)
        .ok_or_else(|| format!("no accessory named {}", request.accessory))?;
    match request.value {
        Some(value) => {
            accessory.set(request.characteristic, value).await?;
            Ok(serde_json::json!({ "status": "ok" }))
        }
        None => {
            let value = accessory.get(request.characteristic).await?;
            Ok(serde_json::json!({ "status": "ok", "value": value }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = env::args().nth(1).unwrap_or_else(|| "config.yaml".to_string());
    let config: PlatformConfig = config::load_config(path)?;

    let default_level = if config.lights.iter().any(|light| light.debug) {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let platform = Platform::from_config(config);
    for accessory in platform.accessories() {
        log::info!(
            "{} ({} / {}) exposes {:?}",
            accessory.name(),
            accessory.model_name(),
            accessory.serial_number(),
            accessory.services()[0].characteristic_kinds()
        );
    }

    serve(&platform, BufReader::new(tokio::io::stdin()), std::io::stdout()).await
}

/// Prints updates and answers requests until the update channel closes.
///
/// Requests stop being read at end of input; polling and updates go on.
async fn serve<R, W>(platform: &Platform, input: R, mut out: W) -> Result<(), Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut updates = platform.subscribe();
    let _polling = platform.start_polling();
    let mut lines = input.lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(update) => writeln!(out, "{}", serde_json::to_string(&update)?)?,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!("Dropped {} characteristic updates", skipped);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    log::info!("input closed, serving updates only");
                    input_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = match handle(platform, &line).await {
                    Ok(reply) => reply,
                    Err(e) => serde_json::json!({ "status": "error", "message": e.to_string() }),
                };
                writeln!(out, "{}", reply)?;
            }
        }
        out.flush()?;
    }

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn keeps_publishing_after_input_ends() {
        // `echo` stands in for flux_led: it prints its arguments, which parse as "off".
        let config = config::parse_config(
            "command: echo\nlights:\n  - name: Desk\n    ip: 10.0.0.2\n    initial_delay: 200\n    timeout: 0\n",
        )
        .unwrap();
        let platform = Platform::from_config(config);

        let mut out = Vec::new();
        let served = tokio::time::timeout(
            Duration::from_secs(3),
            serve(&platform, tokio::io::empty(), &mut out),
        )
        .await;
        assert!(served.is_err(), "serve returned at end of input");

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(r#""accessory":"Desk","characteristic":"on","value":false"#));
    }
}

