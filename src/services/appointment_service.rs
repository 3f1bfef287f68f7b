//! Booking writes: create, reschedule, status transitions, walk-ins.
//!
//! Every check-then-write runs inside one transaction that first takes a
//! per-(barber, date) advisory lock, so two requests for the same barber-day
//! serialize and the no-overlap invariant holds under concurrency. A partial
//! unique index on (barber_id, date, start_time) backs this up at the
//! storage layer.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, DbBackend,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
    TransactionTrait,
};
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit::{self, log_audit},
    dto::appointments::{
        AppointmentList, CancelAppointmentRequest, CompleteAppointmentRequest,
        CreateAppointmentRequest, UpdateAppointmentRequest, WalkInRequest,
    },
    entity::appointments::{
        ActiveModel as ApptActive, Column as ApptCol, Entity as Appointments, Model as ApptModel,
    },
    error::{AppError, AppResult},
    events,
    middleware::auth::AuthUser,
    models::{
        Appointment, CancelledBy, CompletedBy, ProductUsed, Role, Status, ACTIVE_STATUSES,
    },
    response::{ApiResponse, Meta},
    routes::params::AppointmentListQuery,
    services::catalog_service,
    slots::{self, TimeRange},
    state::AppState,
    transitions::{self, Action, AppointmentRef},
};

const SLOT_TAKEN: &str = "This time slot is already booked. Please choose another time.";

pub async fn create_appointment(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAppointmentRequest,
) -> AppResult<ApiResponse<Appointment>> {
    let barber = catalog_service::find_active_barber(&state.orm, payload.barber_id).await?;
    let service = catalog_service::find_service(&state.orm, payload.service_id).await?;
    catalog_service::find_salon(&state.orm, payload.salon_id).await?;
    let customer = catalog_service::find_customer(&state.orm, user.user_id).await?;

    let range = requested_range(
        &payload.start_time,
        payload.end_time.as_deref(),
        service.duration_minutes,
    )?;

    let txn = state.orm.begin().await?;
    lock_barber_day(&txn, payload.barber_id, payload.date).await?;
    if has_conflict(&txn, payload.barber_id, payload.date, range, None).await? {
        return Err(AppError::SlotConflict(SLOT_TAKEN.to_string()));
    }

    let model = ApptActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(user.user_id),
        barber_id: Set(payload.barber_id),
        service_id: Set(payload.service_id),
        salon_id: Set(payload.salon_id),
        date: Set(payload.date),
        start_time: Set(slots::format_hhmm(range.start)),
        end_time: Set(slots::format_hhmm(range.end)),
        status: Set(Status::Pending.as_str().to_string()),
        price: Set(Some(service.price)),
        is_paid: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    let appointment = appointment_from_entity(model)?;
    audit_write(state, user, audit::APPOINTMENT_CREATED, &appointment.id).await;
    events::publish(
        &state.events,
        events::booking_created(&appointment, &customer.name, &service.name),
    );
    tracing::info!(appointment_id = %appointment.id, barber_id = %barber.id, "appointment created");

    Ok(ApiResponse::success(
        "Appointment created",
        appointment,
        Some(Meta::empty()),
    ))
}

pub async fn update_appointment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    patch: UpdateAppointmentRequest,
) -> AppResult<ApiResponse<Appointment>> {
    let preview = find_appointment(&state.orm, id).await?;
    let reference = appointment_ref(&preview);

    let status_move = match patch.status {
        Some(to) => {
            let action = Action::for_status_change(to).ok_or_else(|| {
                AppError::Validation(format!(
                    "Status cannot be set to {} directly",
                    to.as_str()
                ))
            })?;
            transitions::authorize(user, &reference, action)?;
            Some(to)
        }
        None => None,
    };

    if patch.is_reschedule() {
        transitions::authorize(user, &reference, Action::Reschedule)?;
    } else if status_move.is_none() {
        // Free-form fields (notes, rating, review) are settable at any point
        // after creation, including on completed appointments; only the
        // ownership rule applies.
        transitions::authorize(user, &reference, Action::Reschedule)?;
    }

    let barber_id = patch.barber_id.unwrap_or(preview.barber_id);
    let date = patch.date.unwrap_or(preview.date);

    let txn = state.orm.begin().await?;
    if patch.is_reschedule() {
        lock_barber_day(&txn, barber_id, date).await?;
    }

    // Legality runs against the row as it is under the lock, not the earlier
    // read, so a concurrent transition cannot be silently overwritten.
    let current = find_appointment_for_update(&txn, id).await?;
    let current_status = parse_status(&current.status)?;
    if let Some(to) = status_move {
        transitions::ensure_transition(current_status, to)?;
    }
    if patch.is_reschedule() {
        transitions::ensure_reschedulable(current_status)?;
    }

    let mut active: ApptActive = current.clone().into();
    if patch.is_reschedule() {
        if barber_id != current.barber_id {
            catalog_service::find_active_barber(&txn, barber_id).await?;
        }
        let start = patch.start_time.as_deref().unwrap_or(&current.start_time);
        let end = patch.end_time.as_deref().unwrap_or(&current.end_time);
        let range = TimeRange::parse(start, end)?;

        if has_conflict(&txn, barber_id, date, range, Some(id)).await? {
            return Err(AppError::SlotConflict(SLOT_TAKEN.to_string()));
        }

        active.barber_id = Set(barber_id);
        active.date = Set(date);
        active.start_time = Set(slots::format_hhmm(range.start));
        active.end_time = Set(slots::format_hhmm(range.end));
    }

    if let Some(to) = status_move {
        active.status = Set(to.as_str().to_string());
        match to {
            Status::Completed | Status::NoShow => {
                active.completed_by =
                    Set(Some(CompletedBy::from_role(user.role).as_str().to_string()));
            }
            Status::Cancelled => {
                active.cancelled_by =
                    Set(Some(CancelledBy::from_role(user.role).as_str().to_string()));
                active.cancellation_time = Set(Some(Utc::now().into()));
            }
            _ => {}
        }
    }

    if let Some(notes) = patch.notes {
        active.notes = Set(Some(notes));
    }
    if let Some(rating) = patch.rating {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        active.rating = Set(Some(rating));
    }
    if let Some(review) = patch.review {
        active.review = Set(Some(review));
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&txn).await?;
    txn.commit().await?;

    let appointment = appointment_from_entity(updated)?;
    audit_write(state, user, audit::APPOINTMENT_UPDATED, &appointment.id).await;
    let change = status_move.map(|s| s.as_str()).unwrap_or("updated");
    notify_parties(state, &appointment, change).await;

    Ok(ApiResponse::success(
        "Appointment updated",
        appointment,
        Some(Meta::empty()),
    ))
}

pub async fn cancel_appointment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CancelAppointmentRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    let current = find_appointment_for_update(&txn, id).await?;
    let current_status = parse_status(&current.status)?;

    transitions::authorize(user, &appointment_ref(&current), Action::Cancel)?;
    transitions::ensure_transition(current_status, Status::Cancelled)?;

    let mut active: ApptActive = current.into();
    active.status = Set(Status::Cancelled.as_str().to_string());
    active.cancelled_by = Set(Some(CancelledBy::from_role(user.role).as_str().to_string()));
    active.cancellation_time = Set(Some(Utc::now().into()));
    if let Some(reason) = payload.cancellation_reason {
        active.cancellation_reason = Set(Some(reason));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    let appointment = appointment_from_entity(updated)?;
    audit_write(state, user, audit::APPOINTMENT_CANCELLED, &appointment.id).await;
    notify_parties(state, &appointment, "cancelled").await;

    Ok(ApiResponse::success(
        "Appointment cancelled",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn complete_appointment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CompleteAppointmentRequest,
) -> AppResult<ApiResponse<Appointment>> {
    let txn = state.orm.begin().await?;
    let current = find_appointment_for_update(&txn, id).await?;
    let current_status = parse_status(&current.status)?;

    transitions::authorize(user, &appointment_ref(&current), Action::Complete)?;
    transitions::ensure_transition(current_status, Status::Completed)?;

    let mut active: ApptActive = current.into();
    active.status = Set(Status::Completed.as_str().to_string());
    active.completed_by = Set(Some(CompletedBy::from_role(user.role).as_str().to_string()));
    if let Some(notes) = payload.notes {
        active.notes = Set(Some(notes));
    }
    if let Some(products) = payload.products_used {
        let value = serde_json::to_value(&products)
            .map_err(|err| AppError::Internal(err.into()))?;
        active.products_used = Set(Some(value));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    let appointment = appointment_from_entity(updated)?;
    audit_write(state, user, audit::APPOINTMENT_COMPLETED, &appointment.id).await;
    notify_parties(state, &appointment, "completed").await;

    Ok(ApiResponse::success(
        "Appointment completed",
        appointment,
        Some(Meta::empty()),
    ))
}

/// Walk-ins are staff-created bookings for today that join the salon queue;
/// they run through the same conflict check and state machine as anything
/// else.
pub async fn create_walk_in(
    state: &AppState,
    user: &AuthUser,
    payload: WalkInRequest,
) -> AppResult<ApiResponse<Appointment>> {
    transitions::authorize_walk_in(user, payload.barber_id, payload.salon_id)?;

    catalog_service::find_active_barber(&state.orm, payload.barber_id).await?;
    let service = catalog_service::find_service(&state.orm, payload.service_id).await?;
    catalog_service::find_salon(&state.orm, payload.salon_id).await?;
    catalog_service::find_customer(&state.orm, payload.customer_id).await?;

    let today = Utc::now().date_naive();
    let range = requested_range(
        &payload.start_time,
        payload.end_time.as_deref(),
        service.duration_minutes,
    )?;

    let txn = state.orm.begin().await?;
    lock_barber_day(&txn, payload.barber_id, today).await?;
    if has_conflict(&txn, payload.barber_id, today, range, None).await? {
        return Err(AppError::SlotConflict(SLOT_TAKEN.to_string()));
    }

    let queue_position = Appointments::find()
        .filter(ApptCol::SalonId.eq(payload.salon_id))
        .filter(ApptCol::Date.eq(today))
        .filter(ApptCol::IsWalkIn.eq(true))
        .count(&txn)
        .await? as i32;

    let model = ApptActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(payload.customer_id),
        barber_id: Set(payload.barber_id),
        service_id: Set(payload.service_id),
        salon_id: Set(payload.salon_id),
        date: Set(today),
        start_time: Set(slots::format_hhmm(range.start)),
        end_time: Set(slots::format_hhmm(range.end)),
        status: Set(Status::Pending.as_str().to_string()),
        is_walk_in: Set(true),
        queue_number: Set(Some(queue_position + 1)),
        estimated_wait_time: Set(payload.estimated_wait_time),
        price: Set(Some(service.price)),
        is_paid: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    let appointment = appointment_from_entity(model)?;
    audit_write(state, user, audit::WALK_IN_CREATED, &appointment.id).await;
    events::publish(&state.events, events::walk_in_created(&appointment));

    Ok(ApiResponse::success(
        "Walk-in registered",
        appointment,
        Some(Meta::empty()),
    ))
}

pub async fn list_appointments(
    state: &AppState,
    user: &AuthUser,
    query: AppointmentListQuery,
) -> AppResult<ApiResponse<AppointmentList>> {
    let (page, per_page, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    match user.role {
        Role::Customer => condition = condition.add(ApptCol::CustomerId.eq(user.user_id)),
        Role::Barber => condition = condition.add(ApptCol::BarberId.eq(user.user_id)),
        Role::Manager => {
            condition =
                condition.add(ApptCol::SalonId.is_in(user.managed_salon_ids.iter().copied()))
        }
        Role::Admin => {}
    }
    if let Some(status) = query.status {
        condition = condition.add(ApptCol::Status.eq(status.as_str()));
    }
    if let Some(date) = query.date {
        condition = condition.add(ApptCol::Date.eq(date));
    }

    let finder = Appointments::find()
        .filter(condition)
        .order_by_asc(ApptCol::Date)
        .order_by_asc(ApptCol::StartTime);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(per_page as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(appointment_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Ok",
        AppointmentList { items },
        Some(Meta::new(page, per_page, total)),
    ))
}

pub async fn get_appointment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Appointment>> {
    let model = find_appointment(&state.orm, id).await?;

    let visible = match user.role {
        Role::Admin => true,
        Role::Manager => user.managed_salon_ids.contains(&model.salon_id),
        Role::Barber => model.barber_id == user.user_id,
        Role::Customer => model.customer_id == user.user_id,
    };
    if !visible {
        return Err(AppError::Forbidden(
            "Not authorized to view this appointment".to_string(),
        ));
    }

    Ok(ApiResponse::success(
        "Ok",
        appointment_from_entity(model)?,
        Some(Meta::empty()),
    ))
}

/// Serialize all bookings for one barber-day. Advisory, transaction-scoped:
/// released automatically at commit or rollback.
pub async fn lock_barber_day(
    txn: &DatabaseTransaction,
    barber_id: Uuid,
    date: NaiveDate,
) -> AppResult<()> {
    let key = format!("{barber_id}/{date}");
    txn.query_one(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))",
        [key.into()],
    ))
    .await?;
    Ok(())
}

/// True when the proposed range overlaps any slot-occupying appointment for
/// this barber-day. The rows are locked FOR UPDATE so a concurrent
/// transition cannot slip between check and write.
pub async fn has_conflict(
    txn: &DatabaseTransaction,
    barber_id: Uuid,
    date: NaiveDate,
    proposed: TimeRange,
    exclude: Option<Uuid>,
) -> AppResult<bool> {
    let mut finder = Appointments::find()
        .filter(ApptCol::BarberId.eq(barber_id))
        .filter(ApptCol::Date.eq(date))
        .filter(ApptCol::Status.is_in(ACTIVE_STATUSES));
    if let Some(id) = exclude {
        finder = finder.filter(ApptCol::Id.ne(id));
    }
    let existing = finder.lock(LockType::Update).all(txn).await?;

    for appt in existing {
        let range = TimeRange::parse(&appt.start_time, &appt.end_time)?;
        if range.overlaps(&proposed) {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn appointment_from_entity(model: ApptModel) -> AppResult<Appointment> {
    let status = parse_status(&model.status)?;
    let products_used: Vec<ProductUsed> = match model.products_used {
        Some(value) => serde_json::from_value(value)
            .map_err(|err| AppError::Internal(anyhow::anyhow!("corrupt products_used: {err}")))?,
        None => Vec::new(),
    };
    Ok(Appointment {
        id: model.id,
        customer_id: model.customer_id,
        barber_id: model.barber_id,
        service_id: model.service_id,
        salon_id: model.salon_id,
        date: model.date,
        start_time: model.start_time,
        end_time: model.end_time,
        status,
        is_walk_in: model.is_walk_in,
        queue_number: model.queue_number,
        estimated_wait_time: model.estimated_wait_time,
        cancellation_reason: model.cancellation_reason,
        cancelled_by: model.cancelled_by.as_deref().and_then(CancelledBy::parse),
        cancellation_time: model.cancellation_time.map(|dt| dt.with_timezone(&Utc)),
        is_emergency: model.is_emergency,
        emergency_details: model.emergency_details,
        completed_by: model.completed_by.as_deref().and_then(CompletedBy::parse),
        price: model.price,
        is_paid: model.is_paid,
        payment_method: model.payment_method,
        products_used,
        rating: model.rating,
        review: model.review,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

async fn find_appointment<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<ApptModel> {
    Appointments::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment".to_string()))
}

/// Row-locked fetch for a status transition: holds the row until the
/// surrounding transaction commits, so two racing transitions serialize and
/// the loser's guard sees the winner's terminal state.
async fn find_appointment_for_update(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> AppResult<ApptModel> {
    Appointments::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment".to_string()))
}

fn appointment_ref(model: &ApptModel) -> AppointmentRef {
    AppointmentRef {
        customer_id: model.customer_id,
        barber_id: model.barber_id,
        salon_id: model.salon_id,
    }
}

fn parse_status(s: &str) -> AppResult<Status> {
    Status::parse(s).ok_or_else(|| AppError::Internal(anyhow::anyhow!("corrupt status: {s}")))
}

fn requested_range(start: &str, end: Option<&str>, duration_minutes: i32) -> AppResult<TimeRange> {
    match end {
        Some(end) => TimeRange::parse(start, end),
        None => {
            let start = slots::parse_hhmm(start)?;
            if duration_minutes <= 0 {
                return Err(AppError::Validation(
                    "Service has no duration, provide an end time".to_string(),
                ));
            }
            let end = start as i32 + duration_minutes;
            if end > 24 * 60 {
                return Err(AppError::Validation(
                    "Appointment would run past midnight".to_string(),
                ));
            }
            Ok(TimeRange {
                start,
                end: end as u16,
            })
        }
    }
}

/// Event fan-out after an accepted transition. The write already succeeded;
/// lookup failures here are logged and swallowed.
async fn notify_parties(state: &AppState, appointment: &Appointment, change: &str) {
    let customer = catalog_service::find_customer(&state.orm, appointment.customer_id).await;
    let service = catalog_service::find_service(&state.orm, appointment.service_id).await;
    match (customer, service) {
        (Ok(customer), Ok(service)) => {
            events::publish(
                &state.events,
                events::booking_updated(appointment, &customer.name, &service.name, change),
            );
        }
        _ => {
            tracing::warn!(appointment_id = %appointment.id, "skipping notification, lookup failed");
        }
    }
}

async fn audit_write(state: &AppState, user: &AuthUser, action: &str, appointment_id: &Uuid) {
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action,
        Some("appointments"),
        Some(serde_json::json!({ "appointment_id": appointment_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}
