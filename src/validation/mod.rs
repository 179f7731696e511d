//! Validation of inbound events and request identifiers
//!
//! Events are validated against the stat registry; identifiers follow the
//! platform's fixed formats. Nothing here has side effects.

mod error;
mod events;
mod identifiers;

pub use error::{RejectReason, ValidationCode, ValidationError};
pub use events::{
    coerce_amount, normalize_keys, EventLimits, EventValidator, Rejection, ValidatedBatch,
    MAX_TEXT_LEN,
};
pub use identifiers::{
    is_valid_player_id, is_valid_server_id, parse_player_id, MAX_SERVER_ID_LEN, PLAYER_ID_LEN,
};
