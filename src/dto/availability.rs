use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::TimeSlot;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailabilityQuery {
    pub salon_id: Uuid,
    pub date: NaiveDate,
}

/// A barber's day grid. `is_work_day = false` means the barber is off (or
/// the salon is closed) that day, which callers must distinguish from a day
/// that is simply booked solid.
#[derive(Debug, Serialize, ToSchema)]
pub struct DayAvailability {
    pub barber_id: Uuid,
    pub salon_id: Uuid,
    pub date: NaiveDate,
    pub is_work_day: bool,
    pub slots: Vec<TimeSlot>,
}
