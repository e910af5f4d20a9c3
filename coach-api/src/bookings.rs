use axum::{
    extract::{rejection::JsonRejection, Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use coach_core::identity::Principal;
use coach_order::{CancelRequest, PaymentRequest, ReserveRequest};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::require_user;
use crate::response::{created, ok, Envelope};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(create_booking))
        .route("/api/bookings/user/{user_id}", get(user_bookings))
        .route("/api/bookings/{id}", get(get_booking))
        .route("/api/bookings/{id}/cancel", put(cancel_booking))
        .route("/api/bookings/{id}/payment", post(process_payment))
        .route_layer(middleware::from_fn_with_state(state, require_user))
}

pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<ReserveRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = body(payload)?;
    let details = state.engine.reserve(&principal, request).await?;
    Ok(created(Envelope::data(details).with_message("Booking created successfully")))
}

async fn user_bookings(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.engine.bookings_for_user(&principal, user_id).await?;
    Ok(ok(Envelope::list(bookings)))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.engine.booking(&principal, id).await?;
    Ok(ok(Envelope::data(details)))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    payload: Option<Json<CancelRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let reason = payload.and_then(|Json(req)| req.reason);
    let receipt = state.engine.cancel(&principal, id, reason).await?;
    Ok(ok(Envelope::data(receipt).with_message("Booking cancelled successfully")))
}

async fn process_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let request = body(payload)?;
    let booking = state
        .engine
        .record_payment(&principal, id, request.payment_method, request.transaction_id)
        .await?;
    Ok(ok(Envelope::data(booking).with_message("Payment processed successfully")))
}
