//! Remote-apps protocol: WebSocket envelopes exchanged with the
//! communication client.
//!
//! Every frame is a JSON envelope `{"type": ..., "payload": ...}`.  We send
//! `auth` once per connection and `buttonPress` for every command; the client
//! sends `auth` (carrying the issued API key) and property/move events.

use rd_domain::{DeviceState, SelfFlag};
use serde::{Deserialize, Serialize};

/// Identity block presented in every `auth` request.
///
/// The client binds issued API keys to `identifier`, so these values must
/// stay stable across releases.
pub const CLIENT_IDENTITY: ClientIdentity = ClientIdentity {
    identifier: "de.bitfocus.companion",
    version: "1.0.0",
    name: "Bitfocus Companion Module",
    description: "Companion module to send Hotkeys to TeamSpeak",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIdentity {
    pub identifier: &'static str,
    pub version: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Outbound
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Envelope sent from us to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Handshake, sent exactly once right after the transport opens.
    #[serde(rename = "auth")]
    Auth(AuthRequest),

    #[serde(rename = "buttonPress")]
    ButtonPress(ButtonPress),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    pub identifier: String,
    pub version: String,
    pub name: String,
    pub description: String,
    pub content: AuthContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContent {
    #[serde(rename = "apiKey")]
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonPress {
    pub button: String,
    pub state: bool,
}

impl ClientMessage {
    /// Build the handshake envelope. `token` may be empty on first contact.
    pub fn auth(token: impl Into<String>) -> Self {
        Self::Auth(AuthRequest {
            identifier: CLIENT_IDENTITY.identifier.into(),
            version: CLIENT_IDENTITY.version.into(),
            name: CLIENT_IDENTITY.name.into(),
            description: CLIENT_IDENTITY.description.into(),
            content: AuthContent {
                api_key: token.into(),
            },
        })
    }

    pub fn press(button: impl Into<String>, state: bool) -> Self {
        Self::ButtonPress(ButtonPress {
            button: button.into(),
            state,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Inbound
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Envelope sent from the client to us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Handshake reply; carries the API key to present on future connects.
    #[serde(rename = "auth")]
    Auth(AuthGrant),

    /// One of our own client's properties changed.
    #[serde(rename = "clientSelfPropertyUpdated")]
    ClientSelfPropertyUpdated(SelfPropertyUpdate),

    #[serde(rename = "clientMoved")]
    ClientMoved(ClientMoved),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGrant {
    #[serde(rename = "apiKey", default)]
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfPropertyUpdate {
    pub flag: String,
    #[serde(rename = "newValue", default)]
    pub new_value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMoved {
    #[serde(rename = "newChannelId")]
    pub new_channel_id: ChannelId,
}

/// Channel ids arrive as numbers from current clients, as strings from
/// some older ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelId {
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl ServerMessage {
    /// The API key carried by a non-empty `auth` reply.
    pub fn granted_token(&self) -> Option<&str> {
        match self {
            Self::Auth(AuthGrant { api_key }) if !api_key.is_empty() => Some(api_key.as_str()),
            _ => None,
        }
    }

    /// Write this event into `state`.  Returns `true` when a field was set.
    ///
    /// Only recognized type/flag pairs with a boolean `newValue` touch the
    /// state; everything else is ignored.
    pub fn apply_to(&self, state: &mut DeviceState) -> bool {
        match self {
            Self::Auth(_) => false,
            Self::ClientSelfPropertyUpdated(update) => {
                let Some(flag) = SelfFlag::from_wire(&update.flag) else {
                    return false;
                };
                match update.new_value.as_bool() {
                    Some(value) => {
                        state.set_flag(flag, value);
                        true
                    }
                    None => false,
                }
            }
            Self::ClientMoved(moved) => {
                state.channel_id = Some(moved.new_channel_id.to_string());
                true
            }
        }
    }
}

/// Result of decoding one inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(ServerMessage),
    /// Valid JSON that is not a known envelope (unknown type, bad payload).
    Unrecognized(serde_json::Value),
    /// Not JSON at all; kept verbatim.
    Opaque(String),
}

/// Decode a text frame.  Never fails: anything that is not a known envelope
/// comes back as [`Frame::Unrecognized`] or [`Frame::Opaque`].
///
/// An envelope whose `type` is `auth` is always [`ServerMessage::Auth`]; a
/// missing or non-string `apiKey` decodes as an empty grant.
pub fn decode(text: &str) -> Frame {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return Frame::Opaque(text.to_owned()),
    };
    if value.get("type").and_then(serde_json::Value::as_str) == Some("auth") {
        let api_key = value
            .pointer("/payload/apiKey")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned();
        return Frame::Event(ServerMessage::Auth(AuthGrant { api_key }));
    }
    match ServerMessage::deserialize(&value) {
        Ok(msg) => Frame::Event(msg),
        Err(_) => Frame::Unrecognized(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_envelope_shape() {
        let json = serde_json::to_value(ClientMessage::auth("tok")).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "auth",
                "payload": {
                    "identifier": "de.bitfocus.companion",
                    "version": "1.0.0",
                    "name": "Bitfocus Companion Module",
                    "description": "Companion module to send Hotkeys to TeamSpeak",
                    "content": { "apiKey": "tok" }
                }
            })
        );
    }

    #[test]
    fn auth_envelope_with_empty_token() {
        let json = serde_json::to_value(ClientMessage::auth("")).unwrap();
        assert_eq!(json["payload"]["content"]["apiKey"], "");
    }

    #[test]
    fn button_press_envelope_shape() {
        assert_eq!(
            serde_json::to_value(ClientMessage::press("mute", true)).unwrap(),
            json!({ "type": "buttonPress", "payload": { "button": "mute", "state": true } })
        );
        assert_eq!(
            serde_json::to_value(ClientMessage::press("mute", false)).unwrap(),
            json!({ "type": "buttonPress", "payload": { "button": "mute", "state": false } })
        );
    }

    #[test]
    fn decode_auth_grant() {
        match decode(r#"{"type":"auth","payload":{"apiKey":"abc123"}}"#) {
            Frame::Event(msg) => assert_eq!(msg.granted_token(), Some("abc123")),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn empty_auth_grant_has_no_token() {
        match decode(r#"{"type":"auth","payload":{"apiKey":""}}"#) {
            Frame::Event(msg) => assert_eq!(msg.granted_token(), None),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn malformed_auth_is_still_an_empty_grant() {
        for raw in [
            r#"{"type":"auth","payload":{"apiKey":null}}"#,
            r#"{"type":"auth","payload":{"apiKey":123}}"#,
            r#"{"type":"auth","payload":"nope"}"#,
            r#"{"type":"auth"}"#,
        ] {
            match decode(raw) {
                Frame::Event(msg @ ServerMessage::Auth(_)) => {
                    assert_eq!(msg.granted_token(), None, "{raw}")
                }
                other => panic!("{raw} decoded as {other:?}"),
            }
        }
    }

    #[test]
    fn decode_non_json_is_opaque() {
        assert_eq!(decode("hello there"), Frame::Opaque("hello there".into()));
    }

    #[test]
    fn decode_unknown_type_is_unrecognized() {
        let frame = decode(r#"{"type":"talkStatusChanged","payload":{"status":1}}"#);
        assert!(matches!(frame, Frame::Unrecognized(_)));
    }

    #[test]
    fn decode_bad_payload_is_unrecognized() {
        let frame = decode(r#"{"type":"clientMoved","payload":{"oldChannelId":3}}"#);
        assert!(matches!(frame, Frame::Unrecognized(_)));
    }

    #[test]
    fn self_property_update_sets_each_flag() {
        for (flag, pick) in [
            ("inputMuted", SelfFlag::InputMuted),
            ("outputMuted", SelfFlag::OutputMuted),
            ("away", SelfFlag::Away),
            ("flagTalking", SelfFlag::Talking),
        ] {
            let mut state = DeviceState::default();
            let raw = json!({
                "type": "clientSelfPropertyUpdated",
                "payload": { "flag": flag, "newValue": true }
            })
            .to_string();
            let Frame::Event(msg) = decode(&raw) else {
                panic!("{flag} did not decode");
            };
            assert!(msg.apply_to(&mut state));
            assert!(state.flag(pick), "{flag} not applied");
        }
    }

    #[test]
    fn unknown_flag_leaves_state_unchanged() {
        let mut state = DeviceState::default();
        let Frame::Event(msg) = decode(
            r#"{"type":"clientSelfPropertyUpdated","payload":{"flag":"nickname","newValue":"bob"}}"#,
        ) else {
            panic!("expected event");
        };
        assert!(!msg.apply_to(&mut state));
        assert_eq!(state, DeviceState::default());
    }

    #[test]
    fn non_bool_value_for_known_flag_is_ignored() {
        let mut state = DeviceState::default();
        let Frame::Event(msg) = decode(
            r#"{"type":"clientSelfPropertyUpdated","payload":{"flag":"away","newValue":"yes"}}"#,
        ) else {
            panic!("expected event");
        };
        assert!(!msg.apply_to(&mut state));
        assert!(!state.away);
    }

    #[test]
    fn client_moved_sets_channel_id() {
        let mut state = DeviceState::default();
        let Frame::Event(msg) = decode(r#"{"type":"clientMoved","payload":{"newChannelId":42}}"#)
        else {
            panic!("expected event");
        };
        assert!(msg.apply_to(&mut state));
        assert_eq!(state.channel_id.as_deref(), Some("42"));

        let Frame::Event(msg) =
            decode(r#"{"type":"clientMoved","payload":{"newChannelId":"7"}}"#)
        else {
            panic!("expected event");
        };
        msg.apply_to(&mut state);
        assert_eq!(state.channel_id.as_deref(), Some("7"));
    }

    #[test]
    fn auth_grant_does_not_touch_state() {
        let mut state = DeviceState::default();
        let msg = ServerMessage::Auth(AuthGrant {
            api_key: "abc".into(),
        });
        assert!(!msg.apply_to(&mut state));
        assert_eq!(state, DeviceState::default());
    }
}
