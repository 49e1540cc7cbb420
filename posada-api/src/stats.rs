use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use posada_core::OccupancySummary;

use crate::error::AppError;
use crate::rooms::RoomQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/stats", get(get_stats))
}

/// GET /v1/stats?hotel_id=
async fn get_stats(
    State(state): State<AppState>,
    query: Result<Query<RoomQuery>, QueryRejection>,
) -> Result<Json<OccupancySummary>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.engine.lock().await.occupancy_summary(query.hotel_id)))
}
