use axum::Router;

use crate::state::AppState;

pub mod appointments;
pub mod availability;
pub mod doc;
pub mod events;
pub mod health;
pub mod params;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/appointments", appointments::router())
        .nest("/availability", availability::router())
        .nest("/events", events::router())
}
