//! Axum HTTP handlers for the log service.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use reef_core::date::sort_by_date_desc;
use reef_core::{
    evaluate_reading, parse_canonical_date, sort_by_date, validate_form, CalendarDate,
    ParameterKey, ReadingInput, ThresholdSet,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{
        FlagView, ListReadingsQuery, ParameterInfo, ReadingView, SortOrder, ValidationResponse,
        WarningsResponse,
    },
    AppState,
};

// ------------------------------------------------------------------ //
//  Owner extraction                                                   //
// ------------------------------------------------------------------ //

pub const OWNER_HEADER: &str = "x-owner-id";

/// Authenticated owner, forwarded by the auth layer in front of the service.
#[derive(Debug, Clone, Copy)]
pub struct Owner(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(Owner)
            .ok_or(ApiError::Unauthorized)
    }
}

fn path_date(raw: &str) -> Result<CalendarDate, ApiError> {
    parse_canonical_date(raw).map_err(|e| ApiError::BadDate(raw.to_string(), e))
}

/// JSON request body; a rejected body surfaces as [`ApiError::BadBody`].
type JsonBody<T> = Result<Json<T>, JsonRejection>;

// ------------------------------------------------------------------ //
//  Readings                                                           //
// ------------------------------------------------------------------ //

/// POST /readings/validate
///
/// Live form check; never persists.
pub async fn validate_reading(
    State(state): State<Arc<AppState>>,
    body: JsonBody<ReadingInput>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = body?;
    let validation = validate_form(&input, state.clock.today());
    Ok(Json(ValidationResponse {
        valid: validation.is_valid,
        errors: validation.errors,
    }))
}

/// POST /readings
pub async fn create_reading(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    body: JsonBody<ReadingInput>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = body?;
    let reading = input
        .into_reading(state.clock.today())
        .map_err(|rejected| ApiError::Rejected(rejected.errors))?;

    let stored = state.store.upsert_reading(owner, &reading).await?;
    let thresholds = state.store.get_thresholds(owner).await?;
    let flags = evaluate_reading(&stored.values, &thresholds);

    info!(
        %owner,
        date = %stored.date,
        parameters = stored.values.len(),
        flags = flags.len(),
        "reading saved"
    );
    Ok((StatusCode::CREATED, Json(ReadingView::new(stored, &flags))))
}

/// GET /readings
pub async fn list_readings(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Query(query): Query<ListReadingsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let readings = state.store.list_readings(owner).await?;
    let thresholds = state.store.get_thresholds(owner).await?;

    let ordered = match query.order {
        SortOrder::Asc => sort_by_date(&readings),
        SortOrder::Desc => sort_by_date_desc(&readings),
    };

    let views: Vec<ReadingView> = ordered
        .into_iter()
        .map(|r| {
            let flags = evaluate_reading(&r.values, &thresholds);
            ReadingView::new(r, &flags)
        })
        .collect();

    Ok(Json(views))
}

/// GET /readings/:date
pub async fn get_reading(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let date = path_date(&raw)?.to_string();
    let Some(reading) = state.store.get_reading(owner, &date).await? else {
        return Err(ApiError::NotFound(date));
    };

    let thresholds = state.store.get_thresholds(owner).await?;
    let flags = evaluate_reading(&reading.values, &thresholds);
    Ok(Json(ReadingView::new(reading, &flags)))
}

/// DELETE /readings/:date
pub async fn delete_reading(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let date = path_date(&raw)?.to_string();
    if !state.store.delete_reading(owner, &date).await? {
        return Err(ApiError::NotFound(date));
    }
    info!(%owner, %date, "reading deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ------------------------------------------------------------------ //
//  Thresholds                                                         //
// ------------------------------------------------------------------ //

/// GET /thresholds
pub async fn get_thresholds(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.store.get_thresholds(owner).await?))
}

/// PUT /thresholds
///
/// Open thresholds (no bound) are dropped. Inverted ranges are stored as
/// given. JSON cannot carry NaN or infinity, and literals that overflow
/// `f64` are refused by the extractor with a 400.
pub async fn put_thresholds(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    body: JsonBody<ThresholdSet>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    for (key, t) in body.iter().filter(|(_, t)| !t.is_ordered()) {
        warn!(%owner, parameter = %key, min = ?t.min, max = ?t.max, "threshold min exceeds max");
    }

    let thresholds: ThresholdSet = body.into_iter().filter(|(_, t)| !t.is_open()).collect();
    state.store.put_thresholds(owner, &thresholds).await?;

    info!(%owner, count = thresholds.len(), "thresholds updated");
    Ok(Json(thresholds))
}

// ------------------------------------------------------------------ //
//  Dashboard                                                          //
// ------------------------------------------------------------------ //

/// GET /dashboard/warnings
///
/// Flags for the most recent reading with a valid date.
pub async fn dashboard_warnings(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
) -> Result<impl IntoResponse, ApiError> {
    let readings = state.store.list_readings(owner).await?;
    let latest = sort_by_date(&readings)
        .into_iter()
        .rev()
        .find(|r| parse_canonical_date(&r.date).is_ok());

    let Some(latest) = latest else {
        return Ok(Json(WarningsResponse { date: None, flags: vec![] }));
    };

    let thresholds = state.store.get_thresholds(owner).await?;
    let flags = evaluate_reading(&latest.values, &thresholds);
    Ok(Json(WarningsResponse {
        date: Some(latest.date),
        flags: flags.iter().map(FlagView::from).collect(),
    }))
}

// ------------------------------------------------------------------ //
//  Catalogue / health                                                 //
// ------------------------------------------------------------------ //

/// GET /parameters
pub async fn parameters() -> impl IntoResponse {
    let catalogue: Vec<ParameterInfo> =
        ParameterKey::ALL.into_iter().map(ParameterInfo::from).collect();
    Json(catalogue)
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}
