//! Inbound stat events
//!
//! Events arrive from the game-server plugin in batches, are validated into
//! [`StatEvent`]s and discarded once folded into a [`PlayerDelta`](super::PlayerDelta).
//! They are never persisted verbatim.

use serde::Serialize;
use serde_json::Value;

/// Display name used when the plugin does not report one
pub const UNKNOWN_PLAYER_NAME: &str = "Unknown";

/// One plugin-reported action after key normalization, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEvent {
    pub player_id: Option<Value>,
    pub event_type: Option<Value>,
    pub amount: Option<Value>,
    pub weapon: Option<Value>,
    pub player_name: Option<Value>,
    pub clan_tag: Option<Value>,
}

/// A validated event bound to a registry column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatEvent {
    /// 17-digit platform identifier
    pub player_id: String,
    pub event_type: &'static str,
    /// Registry column the event increments
    pub column: &'static str,
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weapon: Option<String>,
    pub player_name: String,
    pub clan_tag: String,
}

impl StatEvent {
    pub fn has_display_name(&self) -> bool {
        !self.player_name.is_empty() && self.player_name != UNKNOWN_PLAYER_NAME
    }
}
