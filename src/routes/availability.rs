use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::availability::{AvailabilityQuery, DayAvailability},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::availability_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{barber_id}", get(get_availability))
}

#[utoipa::path(
    get,
    path = "/availability/{barber_id}",
    params(
        ("barber_id" = Uuid, Path, description = "Barber to compute the day grid for"),
        ("salon_id" = Uuid, Query, description = "Salon the booking would be at"),
        ("date" = String, Query, description = "Calendar day, YYYY-MM-DD"),
    ),
    responses(
        (status = 200, description = "Day grid", body = ApiResponse<DayAvailability>),
    ),
    tag = "Availability"
)]
pub async fn get_availability(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(barber_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<ApiResponse<DayAvailability>>> {
    Ok(Json(
        availability_service::get_availability(&state, barber_id, query.salon_id, query.date)
            .await?,
    ))
}
