use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::appointments::{
        AppointmentList, CancelAppointmentRequest, CompleteAppointmentRequest,
        CreateAppointmentRequest, EmergencyCancelRequest, EmergencyCancelResult,
        UpdateAppointmentRequest, WalkInRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Appointment,
    response::ApiResponse,
    routes::params::AppointmentListQuery,
    services::{appointment_service, emergency_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_appointments).post(create_appointment))
        .route("/walk-in", post(create_walk_in))
        .route("/emergency-cancel/{barber_id}", post(emergency_cancel))
        .route(
            "/{id}",
            get(get_appointment)
                .put(update_appointment)
                .delete(cancel_appointment),
        )
        .route("/{id}/complete", put(complete_appointment))
}

#[utoipa::path(get, path = "/appointments", tag = "Appointments")]
pub async fn list_appointments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AppointmentListQuery>,
) -> AppResult<Json<ApiResponse<AppointmentList>>> {
    Ok(Json(
        appointment_service::list_appointments(&state, &user, query).await?,
    ))
}

#[utoipa::path(post, path = "/appointments", tag = "Appointments")]
pub async fn create_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateAppointmentRequest>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    Ok(Json(
        appointment_service::create_appointment(&state, &user, payload).await?,
    ))
}

#[utoipa::path(get, path = "/appointments/{id}", tag = "Appointments")]
pub async fn get_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    Ok(Json(
        appointment_service::get_appointment(&state, &user, id).await?,
    ))
}

#[utoipa::path(put, path = "/appointments/{id}", tag = "Appointments")]
pub async fn update_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateAppointmentRequest>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    Ok(Json(
        appointment_service::update_appointment(&state, &user, id, patch).await?,
    ))
}

#[utoipa::path(delete, path = "/appointments/{id}", tag = "Appointments")]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<CancelAppointmentRequest>>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    Ok(Json(
        appointment_service::cancel_appointment(&state, &user, id, payload).await?,
    ))
}

#[utoipa::path(put, path = "/appointments/{id}/complete", tag = "Appointments")]
pub async fn complete_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Option<Json<CompleteAppointmentRequest>>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    Ok(Json(
        appointment_service::complete_appointment(&state, &user, id, payload).await?,
    ))
}

#[utoipa::path(post, path = "/appointments/walk-in", tag = "Appointments")]
pub async fn create_walk_in(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<WalkInRequest>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    Ok(Json(
        appointment_service::create_walk_in(&state, &user, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/appointments/emergency-cancel/{barber_id}",
    tag = "Appointments"
)]
pub async fn emergency_cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(barber_id): Path<Uuid>,
    Json(payload): Json<EmergencyCancelRequest>,
) -> AppResult<Json<ApiResponse<EmergencyCancelResult>>> {
    Ok(Json(
        emergency_service::emergency_cancel_barber(&state, &user, barber_id, payload).await?,
    ))
}
