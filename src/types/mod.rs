//! Data types shared by the ingestion engine, the stores and the API

mod delta;
mod event;
mod row;
mod timeframe;
mod value;

pub use delta::PlayerDelta;
pub use event::{RawEvent, StatEvent, UNKNOWN_PLAYER_NAME};
pub use row::AggregateRow;
pub use timeframe::Timeframe;
pub use value::StatValue;
