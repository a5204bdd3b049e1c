//! `remote-deck action <id>`: run one action and exit.

use std::time::Duration;

use rd_client::{Action, CommandDispatcher, ConnectionStatus, Instance, SessionHandle, Wire};
use rd_domain::Config;
use serde_json::Value;

/// Grace period for the connection task to flush queued frames before the
/// session is closed.
const SETTLE: Duration = Duration::from_millis(250);

pub async fn action(
    config: Config,
    id: String,
    options: Option<String>,
    timeout: Duration,
) -> anyhow::Result<()> {
    let options = parse_options(options.as_deref())?;
    // Reject bad input before touching either device.
    let parsed = Action::parse(&id, &options)?;

    match parsed.wire() {
        Wire::Http { route, value } => {
            let dispatcher = CommandDispatcher::new(SessionHandle::spawn(), &config)?;
            dispatcher.dispatch(&parsed).await?;
            println!("{id}: GET {route}/{value}");
        }
        Wire::Buttons(messages) => {
            let instance = Instance::new()?;
            instance.init(config).await?;

            let mut status = instance.session().subscribe_status();
            let connected = tokio::time::timeout(timeout, async {
                status.wait_for(ConnectionStatus::is_connected).await.is_ok()
            })
            .await
            .unwrap_or(false);
            if !connected {
                let current = instance.status();
                instance.destroy().await;
                anyhow::bail!("not connected after {}s ({current})", timeout.as_secs());
            }

            instance.run_action(&id, &options).await?;
            tokio::time::sleep(SETTLE).await;
            instance.destroy().await;
            println!("{id}: sent {} button press(es)", messages.len());
        }
    }
    Ok(())
}

pub fn parse_options(raw: Option<&str>) -> anyhow::Result<Value> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Value::Null),
        Some(raw) => serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("--options: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_null() {
        assert_eq!(parse_options(None).unwrap(), Value::Null);
        assert_eq!(parse_options(Some("  ")).unwrap(), Value::Null);
    }

    #[test]
    fn options_must_be_json() {
        assert_eq!(
            parse_options(Some(r#"{"selectedChannel": 3}"#)).unwrap(),
            serde_json::json!({ "selectedChannel": 3 })
        );
        assert!(parse_options(Some("channel=3")).is_err());
    }

    #[tokio::test]
    async fn invalid_action_fails_before_connecting() {
        let config = Config {
            target_ip: String::new(),
            ..Config::default()
        };
        let err = action(
            config,
            "setChannel".into(),
            Some(r#"{"selectedChannel":"x"}"#.into()),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("selectedChannel"));
    }
}
