//! Soil Record Routes

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use storage::NewSoilRecord;

use crate::service::{BatchOutcome, Listing, Notice, NoticeKind, RowLimit, Submission};
use crate::table;
use crate::AppState;

/// Query parameters for listing endpoints
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// "all" or one of the row limit choices; defaults to 100
    pub limit: Option<String>,
}

/// Body of a bulk insert
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub records: Vec<NewSoilRecord>,
    /// Rows per transaction, clamped to 1..=10000
    pub batch_size: Option<usize>,
}

fn status_for(notice: &Notice, success: StatusCode) -> StatusCode {
    match notice.kind {
        NoticeKind::Success => success,
        NoticeKind::Warning => StatusCode::UNPROCESSABLE_ENTITY,
        NoticeKind::Error => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn parse_limit(query: &ListQuery) -> Result<RowLimit, (StatusCode, Json<Notice>)> {
    match query.limit.as_deref() {
        None => Ok(RowLimit::default()),
        Some(raw) => raw
            .parse()
            .map_err(|e: String| (StatusCode::BAD_REQUEST, Json(Notice::warning(e)))),
    }
}

/// Insert one record and return advice for it
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Json(record): Json<NewSoilRecord>,
) -> (StatusCode, Json<Submission>) {
    let submission = state.service.submit(record).await;
    (status_for(&submission.notice, StatusCode::CREATED), Json(submission))
}

/// Insert many records in chunks
pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> (StatusCode, Json<BatchOutcome>) {
    let outcome = state
        .service
        .submit_batch(request.records, request.batch_size)
        .await;
    (status_for(&outcome.notice, StatusCode::CREATED), Json(outcome))
}

/// Recent records as JSON
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<(StatusCode, Json<Listing>), (StatusCode, Json<Notice>)> {
    let limit = parse_limit(&query)?;
    let listing = state.service.recent(limit).await;
    let status = listing
        .notice
        .as_ref()
        .map_or(StatusCode::OK, |n| status_for(n, StatusCode::OK));
    Ok((status, Json(listing)))
}

/// Recent records as a plain-text table
pub async fn records_table(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Response {
    let limit = match parse_limit(&query) {
        Ok(limit) => limit,
        Err(rejection) => return rejection.into_response(),
    };

    let listing = state.service.recent(limit).await;
    if let Some(notice) = listing.notice {
        return (status_for(&notice, StatusCode::OK), Json(notice)).into_response();
    }

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        table::render(&listing.title, &listing.records),
    )
        .into_response()
}
