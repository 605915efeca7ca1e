use crate::{AppState, dto::FreshnessReport, errors::ApiError, store::StoreError};
use axum::{Json, extract::State, http::StatusCode};
use tracing::{info, warn};

/// POST /check
/// Headers: Authorization: Basic <base64(username:password)>
/// Response: 200 when the feed is fresh, 500 when stale; same body either way
pub async fn check_update(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<FreshnessReport>), ApiError> {
    let record = tokio::time::timeout(state.store_timeout, state.store.fetch(&state.target))
        .await
        .map_err(|_| StoreError::Timeout(state.store_timeout))??;

    let evaluation = state.policy.evaluate(&record.updated_at, state.clock.now())?;
    let report = state.policy.report(&evaluation);

    if evaluation.is_fresh() {
        info!(
            last_update = %report.last_update,
            next_update = %report.next_update,
            "Feed is fresh"
        );
        Ok((StatusCode::OK, Json(report)))
    } else {
        warn!(
            last_update = %report.last_update,
            next_update = %report.next_update,
            now = %report.now,
            "Feed is stale"
        );
        Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(report)))
    }
}
