//! Event batch validation
//!
//! Plugins send keys in whatever case their serializer produces, so every
//! object is first normalized (a leading capital is lowered: `SteamId` becomes
//! `steamId`) and the known aliases are resolved before any checks run.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::error::{RejectReason, ValidationCode, ValidationError};
use super::identifiers::parse_player_id;
use crate::types::{RawEvent, StatEvent, UNKNOWN_PLAYER_NAME};
use crate::registry::StatRegistry;

/// Accepted spellings of each event field, after key normalization
const PLAYER_ID_KEYS: &[&str] = &["steamId", "steamid", "steamID", "playerId", "playerid"];
const EVENT_TYPE_KEYS: &[&str] = &["_event", "eventType", "event", "type"];
const AMOUNT_KEYS: &[&str] = &["amount", "value", "count"];
const WEAPON_KEYS: &[&str] = &["weapon", "weaponName"];
const PLAYER_NAME_KEYS: &[&str] = &["playerName", "name", "displayName"];
const CLAN_TAG_KEYS: &[&str] = &["clanTag", "clan"];

/// Longest accepted name, clan or weapon string; longer input is truncated
pub const MAX_TEXT_LEN: usize = 64;

/// Reasons kept in a `NO_VALID_EVENTS` error body
const MAX_REPORTED_REJECTIONS: usize = 10;

/// Batch size and amount ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventLimits {
    pub max_batch_size: usize,
    pub max_amount: u64,
}

impl Default for EventLimits {
    fn default() -> Self {
        Self {
            max_batch_size: 500,
            max_amount: 9_999_999,
        }
    }
}

/// One dropped element of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub index: usize,
    pub reason: RejectReason,
}

/// Accepted events, in arrival order, plus what was dropped
#[derive(Debug, Clone, Default)]
pub struct ValidatedBatch {
    pub events: Vec<StatEvent>,
    pub rejections: Vec<Rejection>,
}

impl ValidatedBatch {
    pub fn rejected(&self) -> usize {
        self.rejections.len()
    }
}

/// Validates raw event JSON against the registry
#[derive(Debug, Clone)]
pub struct EventValidator {
    registry: Arc<StatRegistry>,
    limits: EventLimits,
}

impl EventValidator {
    pub fn new(registry: Arc<StatRegistry>, limits: EventLimits) -> Self {
        Self { registry, limits }
    }

    pub fn limits(&self) -> EventLimits {
        self.limits
    }

    /// Validate a request body: a bare array, or an object with an `events` array
    ///
    /// Invalid elements are dropped. The batch only fails when its shape is
    /// wrong, it is too large, or nothing in it validates.
    pub fn validate_batch(&self, body: &Value) -> Result<ValidatedBatch, ValidationError> {
        let elements = extract_events(body)?;

        if elements.len() > self.limits.max_batch_size {
            return Err(ValidationError::new(
                ValidationCode::BatchTooLarge,
                format!(
                    "Batch of {} events exceeds the maximum of {}",
                    elements.len(),
                    self.limits.max_batch_size
                ),
            )
            .with_details(json!({
                "received": elements.len(),
                "max": self.limits.max_batch_size,
            })));
        }

        let mut batch = ValidatedBatch::default();
        for (index, element) in elements.iter().enumerate() {
            match self.validate_event(element) {
                Ok(event) => batch.events.push(event),
                Err(reason) => {
                    log::debug!("Dropping event {}: {}", index, reason);
                    batch.rejections.push(Rejection { index, reason });
                }
            }
        }

        if batch.events.is_empty() {
            let reasons: Vec<Value> = batch
                .rejections
                .iter()
                .take(MAX_REPORTED_REJECTIONS)
                .map(|r| json!({ "index": r.index, "reason": r.reason.to_string() }))
                .collect();
            return Err(ValidationError::new(
                ValidationCode::NoValidEvents,
                "No valid events in batch",
            )
            .with_details(json!({
                "received": elements.len(),
                "rejected": batch.rejections.len(),
                "reasons": reasons,
            })));
        }

        Ok(batch)
    }

    /// Validate a single raw event object
    pub fn validate_event(&self, value: &Value) -> Result<StatEvent, RejectReason> {
        let object = value.as_object().ok_or(RejectReason::NotAnObject)?;
        let raw = RawEvent::from_object(object);
        self.validate_raw(&raw)
    }

    pub fn validate_raw(&self, raw: &RawEvent) -> Result<StatEvent, RejectReason> {
        let player_id = raw
            .player_id
            .as_ref()
            .and_then(parse_player_id)
            .ok_or(RejectReason::InvalidPlayerId)?;

        let event_name = raw
            .event_type
            .as_ref()
            .and_then(Value::as_str)
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .ok_or(RejectReason::MissingEvent)?;

        let (event_type, column) = self
            .registry
            .resolve_event(&event_name)
            .ok_or_else(|| RejectReason::UnknownEvent(event_name.clone()))?;

        let amount = coerce_amount(raw.amount.as_ref(), self.limits.max_amount)
            .ok_or(RejectReason::InvalidAmount)?;

        let player_name = text_field(raw.player_name.as_ref())
            .unwrap_or_else(|| UNKNOWN_PLAYER_NAME.to_string());
        let clan_tag = text_field(raw.clan_tag.as_ref()).unwrap_or_default();
        let weapon = text_field(raw.weapon.as_ref());

        Ok(StatEvent {
            player_id,
            event_type,
            column,
            amount,
            weapon,
            player_name,
            clan_tag,
        })
    }
}

impl RawEvent {
    /// Pull the known fields out of an event object, normalizing key case
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let normalized = normalize_keys(object);
        let pick = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| normalized.get(*k).filter(|v| !v.is_null()))
                .cloned()
        };

        RawEvent {
            player_id: pick(PLAYER_ID_KEYS),
            event_type: pick(EVENT_TYPE_KEYS),
            amount: pick(AMOUNT_KEYS),
            weapon: pick(WEAPON_KEYS),
            player_name: pick(PLAYER_NAME_KEYS),
            clan_tag: pick(CLAN_TAG_KEYS),
        }
    }
}

/// Lower a leading ASCII capital on every key (`Amount` -> `amount`)
pub fn normalize_keys(object: &Map<String, Value>) -> Map<String, Value> {
    object
        .iter()
        .map(|(key, value)| (lower_first(key), value.clone()))
        .collect()
}

fn lower_first(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            let mut out = String::with_capacity(key.len());
            out.push(first.to_ascii_lowercase());
            out.push_str(chars.as_str());
            out
        }
        _ => key.to_string(),
    }
}

fn extract_events(body: &Value) -> Result<&Vec<Value>, ValidationError> {
    let invalid = || {
        ValidationError::new(
            ValidationCode::InvalidBody,
            "Body must be an array of events or an object with an 'events' array",
        )
    };

    match body {
        Value::Array(events) => Ok(events),
        Value::Object(object) => object
            .iter()
            .find(|(k, _)| lower_first(k) == "events")
            .and_then(|(_, v)| v.as_array())
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Coerce an amount to a non-negative integer capped at `max`
///
/// Missing amounts count as one occurrence. Floats are truncated and numeric
/// strings are parsed; negatives and anything else fail.
pub fn coerce_amount(value: Option<&Value>, max: u64) -> Option<u64> {
    let amount = match value {
        None | Some(Value::Null) => 1,
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) => v,
            None => float_amount(n.as_f64()?)?,
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            match s.parse::<u64>() {
                Ok(v) => v,
                Err(_) => float_amount(s.parse::<f64>().ok()?)?,
            }
        }
        Some(_) => return None,
    };
    Some(amount.min(max))
}

fn float_amount(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 {
        Some(value.trunc() as u64)
    } else {
        None
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(MAX_TEXT_LEN).collect())
}
