//! HTTP surface of the stats engine
//!
//! Game-server plugins post event batches; the dashboard reads player rows,
//! leaderboards and clan roll-ups.

pub mod auth;
pub mod http;
pub mod rest;
pub mod state;

pub use auth::{AuthError, Claims, JwtAuth, STATS_WRITE};
pub use http::create_router;
pub use state::AppState;
