//! Command catalog and dispatcher.
//!
//! Every host-visible action maps to a fixed wire shape: a sequence of
//! `buttonPress` envelopes on the WebSocket session, or one GET against the
//! channel device.  Options are validated in [`Action::parse`] before
//! anything is built, so a rejected action never reaches either wire.

use std::fmt;

use parking_lot::RwLock;
use rd_domain::{Config, Error, Result};
use rd_protocol::ClientMessage;
use serde_json::{json, Map, Value};

use crate::http::HttpCommandClient;
use crate::schema::{Definition, OptionField};
use crate::session::SessionHandle;

const CHANNEL_OPTION: &str = "selectedChannel";
const POWER_OPTION: &str = "selectedState";
const DEFAULT_CHANNEL: u32 = 1;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Catalog
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub shape: Shape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `buttonPress` envelopes for `button`, one per state, in order.
    Press {
        button: &'static str,
        states: &'static [bool],
    },
    /// `GET .../{route}/{value}` with the value taken from `option`.
    Http {
        route: &'static str,
        option: OptionSpec,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSpec {
    Channel,
    Power,
}

const MOMENTARY: &[bool] = &[true, false];

const fn momentary(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    button: &'static str,
) -> CatalogEntry {
    CatalogEntry {
        id,
        name,
        description,
        shape: Shape::Press {
            button,
            states: MOMENTARY,
        },
    }
}

const fn channel_route(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    route: &'static str,
) -> CatalogEntry {
    CatalogEntry {
        id,
        name,
        description,
        shape: Shape::Http {
            route,
            option: OptionSpec::Channel,
        },
    }
}

pub static CATALOG: &[CatalogEntry] = &[
    // Push-to-talk is a held key: mute presses it, unmute releases it.
    CatalogEntry {
        id: "pushToTalkMute",
        name: "Push To Talk Mute",
        description: "Disable the microphone",
        shape: Shape::Press {
            button: "pushtotalk",
            states: &[true],
        },
    },
    CatalogEntry {
        id: "pushToTalkUnmute",
        name: "Push To Talk Unmute",
        description: "Enable the microphone",
        shape: Shape::Press {
            button: "pushtotalk",
            states: &[false],
        },
    },
    momentary("muteMicrophone", "Mute the microphone", "Disable the microphone", "mute"),
    momentary("unmuteMicrophone", "Unmute the microphone", "Enable the microphone", "unmute"),
    momentary("muteSpeaker", "Mute the speaker", "Disable the speaker", "speakerMute"),
    momentary("unmuteSpeaker", "Unmute the speaker", "Enable the speaker", "speakerUnmute"),
    momentary("enableAfk", "Enable AFK", "Enable AFK", "enableAFK"),
    momentary("disableAFK", "Disable AFK", "Disable AFK", "disableAFK"),
    channel_route("setChannel", "Set Channel", "Set a new channel number", "setchannel"),
    CatalogEntry {
        id: "setPower",
        name: "Set Power",
        description: "Set the power state",
        shape: Shape::Http {
            route: "setpower",
            option: OptionSpec::Power,
        },
    },
    channel_route(
        "toggleMuteChannel",
        "Toggle Mute Channel",
        "Enables/disables the mute of channel",
        "togglemutechannel",
    ),
    channel_route("muteChannel", "Mute Channel", "Enables the mute of channel", "mutechannel"),
    channel_route(
        "unmuteChannel",
        "Unmute Channel",
        "Disables the mute of channel",
        "unmutechannel",
    ),
];

pub fn lookup(id: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| entry.id == id)
}

/// Host registration for every catalog entry.
pub fn definitions() -> Vec<Definition> {
    CATALOG
        .iter()
        .map(|entry| Definition {
            id: entry.id.into(),
            name: entry.name.into(),
            description: entry.description.into(),
            kind: None,
            options: match entry.shape {
                Shape::Press { .. } => Vec::new(),
                Shape::Http { option, .. } => vec![option.field()],
            },
        })
        .collect()
}

impl OptionSpec {
    fn field(self) -> OptionField {
        match self {
            Self::Channel => OptionField::number(
                CHANNEL_OPTION,
                "Channel",
                u64::from(DEFAULT_CHANNEL),
                u64::from(u32::MAX),
            ),
            Self::Power => OptionField::dropdown(
                POWER_OPTION,
                "Power State",
                json!("on"),
                &[(json!("on"), "On"), (json!("off"), "Off")],
            ),
        }
    }

    fn parse(self, options: &Map<String, Value>) -> Result<Argument> {
        match self {
            Self::Channel => parse_channel(options.get(CHANNEL_OPTION)).map(Argument::Channel),
            Self::Power => parse_power(options.get(POWER_OPTION)).map(Argument::Power),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Validated actions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Argument {
    Channel(u32),
    Power(PowerState),
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(n) => write!(f, "{n}"),
            Self::Power(p) => f.write_str(p.as_str()),
        }
    }
}

/// A catalog entry with its options checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub entry: &'static CatalogEntry,
    pub argument: Option<Argument>,
}

/// What an action puts on which wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wire {
    Buttons(Vec<ClientMessage>),
    Http { route: &'static str, value: String },
}

impl Action {
    /// Resolve `id` and validate `options` (a JSON object or null).
    pub fn parse(id: &str, options: &Value) -> Result<Self> {
        let entry = lookup(id).ok_or_else(|| Error::Validation(format!("unknown action: {id}")))?;

        let empty = Map::new();
        let options = match options {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(Error::Validation(format!(
                    "{id}: options must be an object, got {other}"
                )))
            }
        };

        let argument = match entry.shape {
            Shape::Press { .. } => None,
            Shape::Http { option, .. } => Some(
                option
                    .parse(options)
                    .map_err(|e| prefix_validation(id, e))?,
            ),
        };
        Ok(Self { entry, argument })
    }

    pub fn id(&self) -> &'static str {
        self.entry.id
    }

    pub fn wire(&self) -> Wire {
        match self.entry.shape {
            Shape::Press { button, states } => Wire::Buttons(
                states
                    .iter()
                    .map(|&state| ClientMessage::press(button, state))
                    .collect(),
            ),
            Shape::Http { route, .. } => Wire::Http {
                route,
                value: self.argument.map(|a| a.to_string()).unwrap_or_default(),
            },
        }
    }
}

fn prefix_validation(id: &str, err: Error) -> Error {
    match err {
        Error::Validation(msg) => Error::Validation(format!("{id}: {msg}")),
        other => other,
    }
}

fn parse_channel(value: Option<&Value>) -> Result<u32> {
    let invalid = |v: &Value| {
        Error::Validation(format!(
            "{CHANNEL_OPTION} must be a non-negative integer, got {v}"
        ))
    };
    match value {
        None | Some(Value::Null) => Ok(DEFAULT_CHANNEL),
        Some(v @ Value::Number(n)) => {
            let whole = n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
                    .map(|f| f as u64)
            });
            whole
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| invalid(v))
        }
        Some(v @ Value::String(s)) => s.trim().parse::<u32>().map_err(|_| invalid(v)),
        Some(v) => Err(invalid(v)),
    }
}

fn parse_power(value: Option<&Value>) -> Result<PowerState> {
    match value {
        None | Some(Value::Null) => Ok(PowerState::On),
        Some(Value::String(s)) if s == "on" => Ok(PowerState::On),
        Some(Value::String(s)) if s == "off" => Ok(PowerState::Off),
        Some(v) => Err(Error::Validation(format!(
            "{POWER_OPTION} must be \"on\" or \"off\", got {v}"
        ))),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dispatcher
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Routes validated actions to the WebSocket session or the HTTP device.
pub struct CommandDispatcher {
    session: SessionHandle,
    http: RwLock<HttpCommandClient>,
}

impl CommandDispatcher {
    pub fn new(session: SessionHandle, config: &Config) -> Result<Self> {
        Ok(Self {
            session,
            http: RwLock::new(HttpCommandClient::new(config)?),
        })
    }

    /// Point HTTP commands at a new device address.
    pub fn reconfigure(&self, config: &Config) -> Result<()> {
        let client = HttpCommandClient::new(config)?;
        *self.http.write() = client;
        Ok(())
    }

    /// Validate and dispatch in one step.
    pub async fn run(&self, id: &str, options: &Value) -> Result<()> {
        let action = Action::parse(id, options)?;
        self.dispatch(&action).await
    }

    pub async fn dispatch(&self, action: &Action) -> Result<()> {
        match action.wire() {
            Wire::Buttons(messages) => {
                tracing::debug!(action = action.id(), count = messages.len(), "button press");
                self.session.send(messages)
            }
            Wire::Http { route, value } => {
                tracing::debug!(action = action.id(), route, value = %value, "HTTP command");
                let client = self.http.read().clone();
                client.get(route, &value).await
            }
        }
    }
}
