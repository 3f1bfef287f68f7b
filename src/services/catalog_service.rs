//! Read-side lookups into the catalog tables (users, services, salons,
//! schedules). Their CRUD lives elsewhere; the booking core only resolves
//! references and rejects the dangling ones with `NotFound`.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    entity::{
        operating_hours::{self, Column as HoursCol},
        salons, services,
        users::{self, Column as UserCol},
        work_schedules::{self, Column as ScheduleCol},
        OperatingHours, Salons, Services, Users, WorkSchedules,
    },
    error::{AppError, AppResult},
};

pub async fn find_active_barber<C: ConnectionTrait>(
    conn: &C,
    barber_id: Uuid,
) -> AppResult<users::Model> {
    Users::find_by_id(barber_id)
        .filter(UserCol::Role.eq("barber"))
        .filter(UserCol::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Barber".to_string()))
}

pub async fn find_customer<C: ConnectionTrait>(
    conn: &C,
    customer_id: Uuid,
) -> AppResult<users::Model> {
    Users::find_by_id(customer_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
}

pub async fn find_service<C: ConnectionTrait>(
    conn: &C,
    service_id: Uuid,
) -> AppResult<services::Model> {
    Services::find_by_id(service_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Service".to_string()))
}

pub async fn find_salon<C: ConnectionTrait>(conn: &C, salon_id: Uuid) -> AppResult<salons::Model> {
    Salons::find_by_id(salon_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Salon".to_string()))
}

/// The barber's schedule entry for one weekday (0 = Sunday .. 6 = Saturday),
/// if any.
pub async fn work_schedule_for<C: ConnectionTrait>(
    conn: &C,
    barber_id: Uuid,
    weekday: i16,
) -> AppResult<Option<work_schedules::Model>> {
    let entry = WorkSchedules::find()
        .filter(ScheduleCol::BarberId.eq(barber_id))
        .filter(ScheduleCol::Weekday.eq(weekday))
        .one(conn)
        .await?;
    Ok(entry)
}

pub async fn operating_hours_for<C: ConnectionTrait>(
    conn: &C,
    salon_id: Uuid,
    weekday: i16,
) -> AppResult<Option<operating_hours::Model>> {
    let entry = OperatingHours::find()
        .filter(HoursCol::SalonId.eq(salon_id))
        .filter(HoursCol::Weekday.eq(weekday))
        .one(conn)
        .await?;
    Ok(entry)
}
