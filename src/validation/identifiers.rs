//! Player and server identifier formats

use serde_json::Value;

/// Platform player ids are exactly this many ASCII digits
pub const PLAYER_ID_LEN: usize = 17;

/// Longest accepted server identifier
pub const MAX_SERVER_ID_LEN: usize = 64;

pub fn is_valid_player_id(id: &str) -> bool {
    id.len() == PLAYER_ID_LEN && id.bytes().all(|b| b.is_ascii_digit())
}

/// Accept a player id sent either as a string or as a JSON integer
pub fn parse_player_id(value: &Value) -> Option<String> {
    let id = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.as_u64()?.to_string(),
        _ => return None,
    };
    is_valid_player_id(&id).then_some(id)
}

/// Server ids: 1-64 characters of `[A-Za-z0-9_.-]`
pub fn is_valid_server_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SERVER_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
}
