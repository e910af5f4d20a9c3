use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use coach_core::search::SearchQuery;
use coach_core::EngineError;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::response::{ok, Envelope};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/buses/search", get(search_buses))
        .route("/api/buses/{id}", get(bus_details))
        .route("/api/buses/{id}/seats", get(seat_map))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    source: Option<String>,
    destination: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatParams {
    route_id: Option<Uuid>,
    date: Option<String>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

async fn search_buses(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(source), Some(destination), Some(date)) = (params.source, params.destination, params.date) else {
        return Err(EngineError::Validation("Please provide source, destination, and date".to_string()).into());
    };
    let query = SearchQuery {
        source,
        destination,
        date: parse_date(&date)?,
    };

    let results = state.availability.search(&query).await?;
    Ok(ok(Envelope::list(results)))
}

async fn bus_details(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.availability.bus_details(id).await?;
    Ok(ok(Envelope::data(details)))
}

async fn seat_map(
    State(state): State<AppState>,
    Path(bus_id): Path<Uuid>,
    Query(params): Query<SeatParams>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(route_id), Some(date)) = (params.route_id, params.date) else {
        return Err(AppError::BadRequest("Please provide routeId and date".to_string()));
    };
    let map = state.availability.seat_map(bus_id, route_id, parse_date(&date)?).await?;
    Ok(ok(Envelope::data(map)))
}
