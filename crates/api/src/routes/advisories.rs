//! Advisory Routes

use advisory::{Advisory, Measurements};
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Response for advisories endpoint
#[derive(Debug, Serialize)]
pub struct AdvisoryResponse {
    pub advisories: Vec<Advisory>,
    pub count: usize,
}

/// Compute advice for a measurement set without storing it
pub async fn compute(
    State(state): State<Arc<AppState>>,
    Json(measurements): Json<Measurements>,
) -> Json<AdvisoryResponse> {
    let advisories = state.service.advise(&measurements);

    Json(AdvisoryResponse {
        count: advisories.len(),
        advisories,
    })
}
