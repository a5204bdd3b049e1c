//! `remote-deck run`: interactive prompt.
//!
//! Connects with the loaded configuration, prints status and feedback
//! changes as they arrive, and runs one action per input line.

use std::sync::Arc;

use rd_client::feedback::{self, Feedback};
use rd_client::{ConnectionStatus, DeviceState, Instance, InstanceObserver};
use rd_domain::Config;
use serde_json::Value;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn run(config: Config) -> anyhow::Result<()> {
    let instance = Instance::new()?;
    let watcher = instance.watch(Arc::new(Printer));

    // A bad address is reported through the status; HTTP actions still work
    // once the config is fixed, so keep the prompt alive.
    if let Err(e) = instance.init(config).await {
        eprintln!("\x1B[31m{e}\x1B[0m");
    }

    let mut rl = rustyline::DefaultEditor::new()?;
    eprintln!("remote-deck  |  <actionId> [json-options], /help for commands, Ctrl+D to exit");

    loop {
        let readline = tokio::task::block_in_place(|| rl.readline("deck> "));
        let line = match readline {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /quit to exit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        };
        rl.add_history_entry(&line).ok();

        match parse_line(&line) {
            Ok(ReplInput::Empty) => {}
            Ok(ReplInput::Quit) => break,
            Ok(ReplInput::Help) => print_help(),
            Ok(ReplInput::Status) => println!("{}", instance.status()),
            Ok(ReplInput::Feedbacks) => print_feedbacks(&instance.device_state()),
            Ok(ReplInput::Actions) => {
                for line in super::catalog::format_table(&instance.action_definitions()) {
                    println!("{line}");
                }
            }
            Ok(ReplInput::Action { id, options }) => {
                if let Err(e) = instance.run_action(&id, &options).await {
                    eprintln!("\x1B[31merror: {e}\x1B[0m");
                }
            }
            Err(e) => eprintln!("\x1B[31m{e}\x1B[0m"),
        }
    }

    instance.destroy().await;
    let _ = watcher.await;
    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Input parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, PartialEq)]
pub enum ReplInput {
    Empty,
    Quit,
    Help,
    Status,
    Feedbacks,
    Actions,
    Action { id: String, options: Value },
}

pub fn parse_line(line: &str) -> anyhow::Result<ReplInput> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplInput::Empty);
    }

    if let Some(cmd) = line.strip_prefix('/') {
        return match cmd.trim() {
            "quit" | "exit" => Ok(ReplInput::Quit),
            "help" => Ok(ReplInput::Help),
            "status" => Ok(ReplInput::Status),
            "feedbacks" => Ok(ReplInput::Feedbacks),
            "actions" => Ok(ReplInput::Actions),
            other => anyhow::bail!("unknown command: /{other}"),
        };
    }

    let (id, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let options = match rest.trim() {
        "" => Value::Null,
        raw => serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("options: {e}"))?,
    };
    Ok(ReplInput::Action {
        id: id.to_owned(),
        options,
    })
}

fn print_help() {
    eprintln!("Commands:");
    eprintln!("  <actionId> [json]  Run an action, e.g. setChannel {{\"selectedChannel\": 3}}");
    eprintln!("  /actions           List actions");
    eprintln!("  /feedbacks         Evaluate every feedback with default options");
    eprintln!("  /status            Show the connection status");
    eprintln!("  /quit              Exit");
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Observer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn render_feedbacks(state: &DeviceState) -> Vec<String> {
    feedback::ids()
        .filter_map(|id| {
            let value = Feedback::parse(id, &Value::Null).ok()?.evaluate(state);
            Some(format!("{id}={value}"))
        })
        .collect()
}

fn print_feedbacks(state: &DeviceState) {
    println!("{}", render_feedbacks(state).join("  "));
}

/// Prints status changes to stderr and feedback snapshots to stdout.
struct Printer;

#[async_trait::async_trait]
impl InstanceObserver for Printer {
    async fn status_changed(&self, status: &ConnectionStatus) {
        eprintln!("[status] {status}");
    }

    async fn feedbacks_changed(&self, state: &DeviceState) {
        print_feedbacks(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_slash_commands() {
        assert_eq!(parse_line("  ").unwrap(), ReplInput::Empty);
        assert_eq!(parse_line("/quit").unwrap(), ReplInput::Quit);
        assert_eq!(parse_line("/status").unwrap(), ReplInput::Status);
        assert!(parse_line("/bogus").is_err());
    }

    #[test]
    fn parses_actions_with_options() {
        assert_eq!(
            parse_line("muteMicrophone").unwrap(),
            ReplInput::Action {
                id: "muteMicrophone".into(),
                options: Value::Null
            }
        );
        assert_eq!(
            parse_line(r#"setChannel {"selectedChannel": 4}"#).unwrap(),
            ReplInput::Action {
                id: "setChannel".into(),
                options: json!({ "selectedChannel": 4 })
            }
        );
        assert!(parse_line("setChannel {oops").is_err());
    }

    #[test]
    fn feedback_snapshot_covers_every_feedback() {
        let state = DeviceState {
            away: true,
            channel_id: Some("9".into()),
            ..DeviceState::default()
        };
        let rendered = render_feedbacks(&state);
        assert_eq!(rendered.len(), 5);
        assert!(rendered.contains(&"afk=true".to_owned()));
        assert!(rendered.contains(&"channelInformation=9".to_owned()));
    }
}
