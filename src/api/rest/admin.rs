//! Ledger reset endpoint

use std::sync::Arc;

use axum::extract::{rejection::QueryRejection, Query, State};
use serde::Deserialize;

use super::{ApiError, ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::engine::{ResetReport, ResetTarget};

#[derive(Debug, Deserialize)]
pub struct ResetParams {
    pub target: Option<String>,
    pub secret: Option<String>,
}

/// POST /stats/reset?target={monthly|serverId}&secret=
///
/// `monthly` clears the monthly and wipe ledgers of every server; a server
/// id clears that server's wipe ledger only.
pub async fn post_reset(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ResetParams>, QueryRejection>,
) -> ApiResult<ResetReport> {
    let Query(params) = params?;

    let Some(expected) = state.reset_secret.as_deref().filter(|s| !s.is_empty()) else {
        return Err(ApiError::forbidden("Reset is disabled"));
    };
    let given = params.secret.as_deref().unwrap_or_default();
    if !secrets_match(given.as_bytes(), expected.as_bytes()) {
        log::warn!("Rejected reset with a wrong secret");
        return Err(ApiError::forbidden("Invalid reset secret"));
    }

    let target = ResetTarget::parse(params.target.as_deref().unwrap_or_default())?;
    let report = state.engine.reset(&target).await?;
    Ok(ApiResponse::new(report))
}

/// Byte comparison whose running time depends only on `expected`'s length
fn secrets_match(given: &[u8], expected: &[u8]) -> bool {
    let mut diff = given.len() ^ expected.len();
    for (i, &byte) in expected.iter().enumerate() {
        diff |= usize::from(byte ^ given.get(i).copied().unwrap_or(0));
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match(b"wipe-day", b"wipe-day"));
        assert!(!secrets_match(b"wipe-dax", b"wipe-day"));
        assert!(!secrets_match(b"wipe", b"wipe-day"));
        assert!(!secrets_match(b"wipe-day-2", b"wipe-day"));
        assert!(!secrets_match(b"", b"wipe-day"));
    }
}
