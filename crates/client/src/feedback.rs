//! Host feedbacks: booleans and text derived from [`DeviceState`].

use std::fmt;

use rd_domain::{ChannelDisplay, DeviceState, Error, Result, SelfFlag};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::schema::{Definition, OptionField};

const INVERT_OPTION: &str = "invertFeedback";
const DISPLAY_OPTION: &str = "displayOptions";

/// `(id, name, description, flag)` for every boolean feedback.
const FLAG_FEEDBACKS: &[(&str, &str, &str, SelfFlag)] = &[
    (
        "isMuted",
        "Is muted",
        "True when the microphone is muted, false when it is not.",
        SelfFlag::InputMuted,
    ),
    (
        "outputMuted",
        "Output muted",
        "True when the output is muted, false when it is not.",
        SelfFlag::OutputMuted,
    ),
    (
        "talking",
        "Talking",
        "True when the user is currently talking, false when they are not.",
        SelfFlag::Talking,
    ),
    (
        "afk",
        "AFK",
        "True when the user is currently afk, false when they are not.",
        SelfFlag::Away,
    ),
];

const CHANNEL_INFORMATION: &str = "channelInformation";

/// A validated feedback instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Flag { flag: SelfFlag, invert: bool },
    ChannelInformation(ChannelDisplay),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FeedbackValue {
    Bool(bool),
    Text { text: String },
}

impl fmt::Display for FeedbackValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text { text } => f.write_str(text),
        }
    }
}

impl Feedback {
    pub fn parse(id: &str, options: &Value) -> Result<Self> {
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

        if id == CHANNEL_INFORMATION {
            return parse_display(options.get(DISPLAY_OPTION))
                .map(Self::ChannelInformation)
                .map_err(|msg| Error::Validation(format!("{id}: {msg}")));
        }

        let flag = FLAG_FEEDBACKS
            .iter()
            .find(|(fid, ..)| *fid == id)
            .map(|&(.., flag)| flag)
            .ok_or_else(|| Error::Validation(format!("unknown feedback: {id}")))?;
        let invert = match options.get(INVERT_OPTION) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(v) => {
                return Err(Error::Validation(format!(
                    "{id}: {INVERT_OPTION} must be a boolean, got {v}"
                )))
            }
        };
        Ok(Self::Flag { flag, invert })
    }

    pub fn evaluate(&self, state: &DeviceState) -> FeedbackValue {
        match *self {
            Self::Flag { flag, invert } => FeedbackValue::Bool(match flag {
                SelfFlag::InputMuted => state.input_muted(invert),
                SelfFlag::OutputMuted => state.output_muted(invert),
                SelfFlag::Away => state.away(invert),
                SelfFlag::Talking => state.talking(invert),
            }),
            Self::ChannelInformation(display) => FeedbackValue::Text {
                text: state.channel_info(display),
            },
        }
    }
}

fn parse_display(value: Option<&Value>) -> std::result::Result<ChannelDisplay, String> {
    let index = match value {
        None | Some(Value::Null) => return Ok(ChannelDisplay::default()),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };
    index
        .and_then(ChannelDisplay::from_index)
        .ok_or_else(|| format!("{DISPLAY_OPTION} must be 0, 1 or 2"))
}

pub fn ids() -> impl Iterator<Item = &'static str> {
    FLAG_FEEDBACKS
        .iter()
        .map(|&(id, ..)| id)
        .chain(std::iter::once(CHANNEL_INFORMATION))
}

/// Host registration for every feedback.
pub fn definitions() -> Vec<Definition> {
    let mut defs: Vec<Definition> = FLAG_FEEDBACKS
        .iter()
        .map(|&(id, name, description, _)| Definition {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            kind: Some("boolean".into()),
            options: vec![OptionField::checkbox(INVERT_OPTION, "Invert", false)],
        })
        .collect();

    defs.push(Definition {
        id: CHANNEL_INFORMATION.into(),
        name: "Channel information".into(),
        description: "Display channel id / label".into(),
        kind: Some("advanced".into()),
        options: vec![OptionField::dropdown(
            DISPLAY_OPTION,
            "Display",
            json!(0),
            &[(json!(0), "ID"), (json!(1), "Label"), (json!(2), "ID & Label")],
        )],
    });
    defs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> DeviceState {
        DeviceState {
            input_muted: true,
            talking: false,
            channel_id: Some("42".into()),
            channel_label: Some("Lobby".into()),
            ..DeviceState::default()
        }
    }

    #[test]
    fn boolean_feedbacks_honour_invert() {
        let muted = Feedback::parse("isMuted", &Value::Null).unwrap();
        assert_eq!(muted.evaluate(&state()), FeedbackValue::Bool(true));

        let inverted = Feedback::parse("isMuted", &json!({ "invertFeedback": true })).unwrap();
        assert_eq!(inverted.evaluate(&state()), FeedbackValue::Bool(false));

        let talking = Feedback::parse("talking", &json!({ "invertFeedback": true })).unwrap();
        assert_eq!(talking.evaluate(&state()), FeedbackValue::Bool(true));

        for id in ["outputMuted", "afk"] {
            let plain = Feedback::parse(id, &Value::Null).unwrap();
            assert_eq!(plain.evaluate(&state()), FeedbackValue::Bool(false), "{id}");
            let inverted = Feedback::parse(id, &json!({ "invertFeedback": true })).unwrap();
            assert_eq!(inverted.evaluate(&state()), FeedbackValue::Bool(true), "{id}");
        }
    }

    #[test]
    fn channel_information_modes() {
        let render = |display: Value| {
            Feedback::parse("channelInformation", &json!({ "displayOptions": display }))
                .unwrap()
                .evaluate(&state())
                .to_string()
        };
        assert_eq!(render(json!(0)), "42");
        assert_eq!(render(json!(1)), "Lobby");
        assert_eq!(render(json!("2")), "42: Lobby");
    }

    #[test]
    fn channel_information_defaults_to_id() {
        let fb = Feedback::parse("channelInformation", &json!({})).unwrap();
        assert_eq!(fb, Feedback::ChannelInformation(ChannelDisplay::Id));
        assert_eq!(
            fb.evaluate(&DeviceState::default()),
            FeedbackValue::Text { text: String::new() }
        );
    }

    #[test]
    fn invalid_feedback_options_are_rejected() {
        assert!(Feedback::parse("channelInformation", &json!({ "displayOptions": 3 })).is_err());
        assert!(Feedback::parse("afk", &json!({ "invertFeedback": "yes" })).is_err());
        assert!(Feedback::parse("inMeeting", &Value::Null).is_err());
    }

    #[test]
    fn definitions_match_ids() {
        let ids: Vec<_> = ids().collect();
        let defs: Vec<_> = definitions().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, defs);
        assert_eq!(ids.len(), 5);
    }
}
