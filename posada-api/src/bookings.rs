use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use posada_core::{Booking, BookingStatus, NewBooking, NewGuest};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub room_id: u64,
    pub guest: NewGuest,
    pub check_in: String,
    pub check_out: String,
    // Bookings start as pending unless told otherwise
    #[serde(default)]
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: BookingStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_bookings).post(create_booking))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/status", post(transition_booking))
}

/// POST /v1/bookings
async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let Json(req) = payload?;
    let new_booking = NewBooking {
        room_id: req.room_id,
        guest: req.guest,
        check_in: req.check_in,
        check_out: req.check_out,
    };

    let booking = state.engine.lock().await.create_booking(new_booking, req.status)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/bookings?status=
async fn list_bookings(
    State(state): State<AppState>,
    query: Result<Query<BookingQuery>, QueryRejection>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let Query(query) = query?;
    let engine = state.engine.lock().await;

    let bookings = match query.status {
        Some(status) => engine.filter_bookings_by_status(status),
        None => engine.list_bookings(),
    };
    Ok(Json(bookings))
}

/// GET /v1/bookings/{id}
async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.engine.lock().await.get_booking(id)?))
}

/// POST /v1/bookings/{id}/status
async fn transition_booking(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<TransitionRequest>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let Json(req) = payload?;
    let booking = state.engine.lock().await.transition_booking(id, req.status)?;
    Ok(Json(booking))
}
