//! Descriptive option schemas handed to hosts for registration.
//!
//! These only describe inputs; validation lives with the parsers in
//! [`commands`](crate::commands) and [`feedback`](crate::feedback).

use serde::Serialize;
use serde_json::Value;

/// An action or feedback as a host registers it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    pub id: String,
    pub name: String,
    pub description: String,
    /// `boolean` or `advanced` for feedbacks; absent for actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub options: Vec<OptionField>,
}

/// One input a host renders for an action, feedback or config.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionField {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    Number {
        default: u64,
        min: u64,
        max: u64,
    },
    Dropdown {
        default: Value,
        choices: Vec<Choice>,
    },
    Checkbox {
        default: bool,
    },
    Textinput {
        default: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub id: Value,
    pub label: String,
}

impl OptionField {
    pub fn number(id: &str, label: &str, default: u64, max: u64) -> Self {
        Self::new(id, label, FieldKind::Number { default, min: 0, max })
    }

    pub fn dropdown(id: &str, label: &str, default: Value, choices: &[(Value, &str)]) -> Self {
        let choices = choices
            .iter()
            .map(|(id, label)| Choice {
                id: id.clone(),
                label: (*label).to_owned(),
            })
            .collect();
        Self::new(id, label, FieldKind::Dropdown { default, choices })
    }

    pub fn checkbox(id: &str, label: &str, default: bool) -> Self {
        Self::new(id, label, FieldKind::Checkbox { default })
    }

    pub fn textinput(id: &str, label: &str, default: &str) -> Self {
        Self::new(
            id,
            label,
            FieldKind::Textinput {
                default: default.to_owned(),
            },
        )
    }

    pub fn with_tooltip(mut self, tooltip: &str) -> Self {
        self.tooltip = Some(tooltip.to_owned());
        self
    }

    fn new(id: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            id: id.to_owned(),
            label: label.to_owned(),
            tooltip: None,
            kind,
        }
    }
}

/// Configuration inputs, in display order.
pub fn config_fields() -> Vec<OptionField> {
    vec![
        OptionField::textinput("target_ip", "Target IP address", "127.0.0.1")
            .with_tooltip("For localhost use 127.0.0.1 (loopback IP)"),
        OptionField::number("target_port", "Channel device port", 9000, 65535),
        OptionField::number(
            "ws_port",
            "Remote apps port",
            u64::from(rd_domain::config::DEFAULT_WS_PORT),
            65535,
        ),
        OptionField::textinput("api_token", "API token", "")
            .with_tooltip("Optional; the client issues a token on first connect"),
        OptionField::checkbox("reconnect", "Reconnect", true)
            .with_tooltip("Reconnect after any disconnect (after 5 secs)"),
        OptionField::number(
            "reconnect_delay_ms",
            "Reconnect delay (ms)",
            rd_domain::config::DEFAULT_RECONNECT_DELAY_MS,
            u64::from(u32::MAX),
        ),
        OptionField::number("http_timeout_ms", "HTTP timeout (ms)", 5000, u64::from(u32::MAX)),
    ]
}
