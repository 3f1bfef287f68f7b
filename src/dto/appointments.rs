use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Appointment, ProductUsed, Status};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAppointmentRequest {
    pub barber_id: Uuid,
    pub service_id: Uuid,
    pub salon_id: Uuid,
    pub date: NaiveDate,
    pub start_time: String,
    /// Defaults to start_time + the service duration.
    pub end_time: Option<String>,
}

/// Generic patch: reschedule fields, a status move, or the free-form fields.
/// Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAppointmentRequest {
    pub barber_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub status: Option<Status>,
    pub notes: Option<String>,
    pub rating: Option<i16>,
    pub review: Option<String>,
}

impl UpdateAppointmentRequest {
    pub fn is_reschedule(&self) -> bool {
        self.barber_id.is_some()
            || self.date.is_some()
            || self.start_time.is_some()
            || self.end_time.is_some()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CancelAppointmentRequest {
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CompleteAppointmentRequest {
    pub notes: Option<String>,
    pub products_used: Option<Vec<ProductUsed>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WalkInRequest {
    pub customer_id: Uuid,
    pub barber_id: Uuid,
    pub service_id: Uuid,
    pub salon_id: Uuid,
    pub start_time: String,
    pub end_time: Option<String>,
    pub estimated_wait_time: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmergencyCancelRequest {
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmergencyCancelResult {
    pub cancelled_count: i64,
    pub cancelled_appointment_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentList {
    pub items: Vec<Appointment>,
}
