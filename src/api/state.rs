//! Shared application state

use std::sync::Arc;

use super::auth::JwtAuth;
use crate::engine::IngestEngine;
use crate::registry::StatRegistry;
use crate::store::TimeframeStores;

pub struct AppState {
    pub engine: IngestEngine,
    pub auth: JwtAuth,
    /// Shared secret of the reset endpoint; resets are refused when unset
    pub reset_secret: Option<String>,
}

impl AppState {
    pub fn new(engine: IngestEngine, auth: JwtAuth, reset_secret: Option<String>) -> Self {
        Self {
            engine,
            auth,
            reset_secret,
        }
    }

    pub fn registry(&self) -> &Arc<StatRegistry> {
        self.engine.registry()
    }

    pub fn stores(&self) -> &TimeframeStores {
        self.engine.stores()
    }
}
