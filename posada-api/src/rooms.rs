use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use posada_core::{NewRoom, Room};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoomQuery {
    pub hotel_id: Option<u64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/rooms", get(list_rooms).post(create_room))
        .route("/v1/rooms/available", get(list_available_rooms))
}

/// POST /v1/rooms
async fn create_room(
    State(state): State<AppState>,
    payload: Result<Json<NewRoom>, JsonRejection>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    let Json(req) = payload?;
    let room = state.engine.lock().await.create_room(req)?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// GET /v1/rooms?hotel_id=
async fn list_rooms(
    State(state): State<AppState>,
    query: Result<Query<RoomQuery>, QueryRejection>,
) -> Result<Json<Vec<Room>>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.engine.lock().await.list_rooms(query.hotel_id)))
}

/// GET /v1/rooms/available?hotel_id=
async fn list_available_rooms(
    State(state): State<AppState>,
    query: Result<Query<RoomQuery>, QueryRejection>,
) -> Result<Json<Vec<Room>>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.engine.lock().await.list_available_rooms(query.hotel_id)))
}
