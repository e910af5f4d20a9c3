use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use coach_catalog::{BusInput, RouteInput};
use coach_order::{BookingFilter, NewSeatLayout, SeatLayoutUpdate};
use uuid::Uuid;

use crate::bookings::body;
use crate::error::AppError;
use crate::middleware::require_admin;
use crate::response::{created, ok, Envelope};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/buses", get(list_buses).post(add_bus))
        .route("/api/admin/buses/{id}", put(update_bus).delete(delete_bus))
        .route("/api/admin/routes", get(list_routes).post(add_route))
        .route("/api/admin/routes/{id}", put(update_route).delete(delete_route))
        .route("/api/admin/seat-layouts", post(create_layout))
        .route("/api/admin/seat-layouts/{bus_id}", put(update_layout))
        .route("/api/admin/bookings", get(list_bookings))
        .route("/api/admin/stats", get(stats))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

// ==================== BUSES ====================

async fn list_buses(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let buses = state.back_office.list_buses().await?;
    Ok(ok(Envelope::list(buses)))
}

async fn add_bus(
    State(state): State<AppState>,
    payload: Result<Json<BusInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let bus = state.back_office.add_bus(body(payload)?).await?;
    Ok(created(Envelope::data(bus).with_message("Bus added successfully")))
}

async fn update_bus(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<BusInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let bus = state.back_office.update_bus(id, body(payload)?).await?;
    Ok(ok(Envelope::data(bus).with_message("Bus updated successfully")))
}

async fn delete_bus(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    state.back_office.delete_bus(id).await?;
    Ok(ok(Envelope::message("Bus deleted successfully")))
}

// ==================== ROUTES ====================

async fn list_routes(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let routes = state.back_office.list_routes().await?;
    Ok(ok(Envelope::list(routes)))
}

async fn add_route(
    State(state): State<AppState>,
    payload: Result<Json<RouteInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let route = state.back_office.add_route(body(payload)?).await?;
    Ok(created(Envelope::data(route).with_message("Route added successfully")))
}

async fn update_route(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<RouteInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let route = state.back_office.update_route(id, body(payload)?).await?;
    Ok(ok(Envelope::data(route).with_message("Route updated successfully")))
}

async fn delete_route(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    state.back_office.delete_route(id).await?;
    Ok(ok(Envelope::message("Route deleted successfully")))
}

// ==================== SEAT LAYOUTS ====================

async fn create_layout(
    State(state): State<AppState>,
    payload: Result<Json<NewSeatLayout>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let layout = state.back_office.create_layout(body(payload)?).await?;
    Ok(created(Envelope::data(layout).with_message("Seat layout created successfully")))
}

async fn update_layout(
    State(state): State<AppState>,
    Path(bus_id): Path<Uuid>,
    payload: Result<Json<SeatLayoutUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let layout = state.back_office.update_layout(bus_id, body(payload)?).await?;
    Ok(ok(Envelope::data(layout).with_message("Seat layout updated successfully")))
}

// ==================== BOOKINGS & STATS ====================

async fn list_bookings(
    State(state): State<AppState>,
    filter: Result<Query<BookingFilter>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(filter) = filter.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let bookings = state.back_office.list_bookings(&filter).await?;
    Ok(ok(Envelope::list(bookings)))
}

async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = state.back_office.stats().await?;
    Ok(ok(Envelope::data(stats)))
}
