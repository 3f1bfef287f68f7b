//! The availability calculator: one barber, one salon, one day, out comes
//! the ordered 30-minute grid with booked cells marked.
//!
//! A slot counts as booked when its interval overlaps an active
//! appointment's interval. The barber's work window is clamped to the
//! salon's operating hours, so a barber personally scheduled past closing
//! is not bookable there.

use chrono::{Datelike, NaiveDate};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    dto::availability::DayAvailability,
    entity::{appointments::Column as ApptCol, Appointments},
    error::AppResult,
    models::{TimeSlot, ACTIVE_STATUSES},
    response::{ApiResponse, Meta},
    services::catalog_service,
    slots::{self, TimeRange},
    state::AppState,
};

pub async fn get_availability(
    state: &AppState,
    barber_id: Uuid,
    salon_id: Uuid,
    date: NaiveDate,
) -> AppResult<ApiResponse<DayAvailability>> {
    catalog_service::find_active_barber(&state.orm, barber_id).await?;
    catalog_service::find_salon(&state.orm, salon_id).await?;

    let weekday = date.weekday().num_days_from_sunday() as i16;

    let off_day = |message: &str| {
        ApiResponse::success(
            message,
            DayAvailability {
                barber_id,
                salon_id,
                date,
                is_work_day: false,
                slots: Vec::new(),
            },
            Some(Meta::empty()),
        )
    };

    let schedule = catalog_service::work_schedule_for(&state.orm, barber_id, weekday).await?;
    let schedule = match schedule {
        Some(entry) if entry.is_working => entry,
        _ => return Ok(off_day("Barber is not scheduled to work on this day")),
    };

    let hours = catalog_service::operating_hours_for(&state.orm, salon_id, weekday).await?;
    let hours = match hours {
        Some(entry) if entry.is_open => entry,
        _ => return Ok(off_day("Salon is closed on this day")),
    };

    let work_window = TimeRange::parse(&schedule.start_time, &schedule.end_time)?;
    let salon_window = TimeRange::parse(&hours.start_time, &hours.end_time)?;
    let window = match work_window.intersect(&salon_window) {
        Some(window) => window,
        None => return Ok(off_day("Barber's schedule falls outside salon hours")),
    };

    let appointments = Appointments::find()
        .filter(ApptCol::BarberId.eq(barber_id))
        .filter(ApptCol::Date.eq(date))
        .filter(ApptCol::Status.is_in(ACTIVE_STATUSES))
        .order_by_asc(ApptCol::StartTime)
        .all(&state.orm)
        .await?;

    let booked: Vec<(TimeRange, Uuid)> = appointments
        .iter()
        .map(|appt| TimeRange::parse(&appt.start_time, &appt.end_time).map(|r| (r, appt.id)))
        .collect::<AppResult<_>>()?;

    let slots = slots::grid(window)
        .into_iter()
        .map(|cell| {
            let hit = booked.iter().find(|(range, _)| range.overlaps(&cell));
            TimeSlot {
                start_time: slots::format_hhmm(cell.start),
                end_time: slots::format_hhmm(cell.end),
                is_booked: hit.is_some(),
                appointment_id: hit.map(|(_, id)| *id),
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        DayAvailability {
            barber_id,
            salon_id,
            date,
            is_work_day: true,
            slots,
        },
        Some(Meta::empty()),
    ))
}
