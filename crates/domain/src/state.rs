//! Last-known state of the communication client.
//!
//! A plain record: inbound events overwrite individual fields
//! (last-write-wins), feedback queries read them. No history is kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Self-property flags the client reports and this crate tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelfFlag {
    InputMuted,
    OutputMuted,
    Away,
    Talking,
}

impl SelfFlag {
    /// Map the wire name of a flag. Unknown names yield `None`.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "inputMuted" => Some(Self::InputMuted),
            "outputMuted" => Some(Self::OutputMuted),
            "away" => Some(Self::Away),
            "flagTalking" => Some(Self::Talking),
            _ => None,
        }
    }
}

/// How the channel-information feedback renders the current channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelDisplay {
    #[default]
    Id,
    Label,
    IdAndLabel,
}

impl ChannelDisplay {
    /// Host option index: `0` id, `1` label, `2` id & label.
    pub fn from_index(index: u64) -> Option<Self> {
        match index {
            0 => Some(Self::Id),
            1 => Some(Self::Label),
            2 => Some(Self::IdAndLabel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceState {
    pub input_muted: bool,
    pub output_muted: bool,
    pub away: bool,
    pub talking: bool,
    pub channel_id: Option<String>,
    pub channel_label: Option<String>,
    /// When the last inbound event was applied.
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeviceState {
    pub fn set_flag(&mut self, flag: SelfFlag, value: bool) {
        match flag {
            SelfFlag::InputMuted => self.input_muted = value,
            SelfFlag::OutputMuted => self.output_muted = value,
            SelfFlag::Away => self.away = value,
            SelfFlag::Talking => self.talking = value,
        }
    }

    pub fn flag(&self, flag: SelfFlag) -> bool {
        match flag {
            SelfFlag::InputMuted => self.input_muted,
            SelfFlag::OutputMuted => self.output_muted,
            SelfFlag::Away => self.away,
            SelfFlag::Talking => self.talking,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    // ── Feedback accessors ───────────────────────────────────────────

    pub fn input_muted(&self, invert: bool) -> bool {
        self.input_muted != invert
    }

    pub fn output_muted(&self, invert: bool) -> bool {
        self.output_muted != invert
    }

    pub fn away(&self, invert: bool) -> bool {
        self.away != invert
    }

    pub fn talking(&self, invert: bool) -> bool {
        self.talking != invert
    }

    /// Render the current channel. Unknown parts render as empty text.
    pub fn channel_info(&self, display: ChannelDisplay) -> String {
        let id = self.channel_id.as_deref().unwrap_or_default();
        let label = self.channel_label.as_deref().unwrap_or_default();
        match display {
            ChannelDisplay::Id => id.to_owned(),
            ChannelDisplay::Label => label.to_owned(),
            ChannelDisplay::IdAndLabel => format!("{id}: {label}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_names_map_to_fields() {
        let mut state = DeviceState::default();
        for (name, flag) in [
            ("inputMuted", SelfFlag::InputMuted),
            ("outputMuted", SelfFlag::OutputMuted),
            ("away", SelfFlag::Away),
            ("flagTalking", SelfFlag::Talking),
        ] {
            assert_eq!(SelfFlag::from_wire(name), Some(flag));
            state.set_flag(flag, true);
            assert!(state.flag(flag));
        }
        assert_eq!(SelfFlag::from_wire("talking"), None);
        assert_eq!(SelfFlag::from_wire("InputMuted"), None);
    }

    #[test]
    fn accessors_invert_on_request() {
        let state = DeviceState {
            input_muted: true,
            ..Default::default()
        };
        assert!(state.input_muted(false));
        assert!(!state.input_muted(true));
        assert!(!state.output_muted(false));
        assert!(state.output_muted(true));
        assert!(state.away(true));
        assert!(state.talking(true));
    }

    #[test]
    fn channel_info_modes() {
        let state = DeviceState {
            channel_id: Some("42".into()),
            channel_label: Some("Lobby".into()),
            ..Default::default()
        };
        assert_eq!(state.channel_info(ChannelDisplay::Id), "42");
        assert_eq!(state.channel_info(ChannelDisplay::Label), "Lobby");
        assert_eq!(state.channel_info(ChannelDisplay::IdAndLabel), "42: Lobby");
    }

    #[test]
    fn channel_info_with_nothing_known() {
        let state = DeviceState::default();
        assert_eq!(state.channel_info(ChannelDisplay::Id), "");
        assert_eq!(state.channel_info(ChannelDisplay::IdAndLabel), ": ");
    }

    #[test]
    fn display_index_mapping() {
        assert_eq!(ChannelDisplay::from_index(0), Some(ChannelDisplay::Id));
        assert_eq!(ChannelDisplay::from_index(2), Some(ChannelDisplay::IdAndLabel));
        assert_eq!(ChannelDisplay::from_index(3), None);
    }
}
