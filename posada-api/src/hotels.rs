use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use posada_core::{Hotel, NewHotel};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/hotels", get(list_hotels).post(create_hotel))
        .route("/v1/hotels/{id}", get(get_hotel))
}

/// POST /v1/hotels
async fn create_hotel(
    State(state): State<AppState>,
    payload: Result<Json<NewHotel>, JsonRejection>,
) -> Result<(StatusCode, Json<Hotel>), AppError> {
    let Json(req) = payload?;
    let hotel = state.engine.lock().await.create_hotel(req)?;
    Ok((StatusCode::CREATED, Json(hotel)))
}

/// GET /v1/hotels
async fn list_hotels(State(state): State<AppState>) -> Json<Vec<Hotel>> {
    Json(state.engine.lock().await.list_hotels())
}

/// GET /v1/hotels/{id}
async fn get_hotel(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Hotel>, AppError> {
    Ok(Json(state.engine.lock().await.get_hotel(id)?))
}
