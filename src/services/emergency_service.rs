//! Emergency protocol: cancel everything upcoming for one barber.
//!
//! Three explicit phases so the notified set is exactly the transitioned
//! set even while new bookings arrive concurrently: snapshot the rows FOR
//! UPDATE, transition that snapshot inside the same transaction, then notify
//! from the snapshot after commit.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit::{self, log_audit},
    dto::appointments::{EmergencyCancelRequest, EmergencyCancelResult},
    entity::appointments::{Column as ApptCol, Entity as Appointments},
    error::AppResult,
    events,
    middleware::auth::AuthUser,
    models::{CancelledBy, Role, Status, BULK_CANCELLABLE_STATUSES},
    response::{ApiResponse, Meta},
    services::{appointment_service, catalog_service},
    state::AppState,
    transitions,
};

pub async fn emergency_cancel_barber(
    state: &AppState,
    user: &AuthUser,
    barber_id: Uuid,
    payload: EmergencyCancelRequest,
) -> AppResult<ApiResponse<EmergencyCancelResult>> {
    transitions::authorize_emergency_cancel(user)?;
    let barber = catalog_service::find_active_barber(&state.orm, barber_id).await?;

    let today = Utc::now().date_naive();
    let now = Utc::now();

    let mut condition = Condition::all()
        .add(ApptCol::BarberId.eq(barber_id))
        .add(ApptCol::Date.gte(today))
        .add(ApptCol::Status.is_in(BULK_CANCELLABLE_STATUSES));
    if user.role == Role::Manager {
        condition = condition.add(ApptCol::SalonId.is_in(user.managed_salon_ids.iter().copied()));
    }

    let txn = state.orm.begin().await?;

    // Phase 1: consistent snapshot.
    let snapshot = Appointments::find()
        .filter(condition)
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    let ids: Vec<Uuid> = snapshot.iter().map(|a| a.id).collect();

    // Phase 2: transition exactly the snapshot.
    if !ids.is_empty() {
        Appointments::update_many()
            .col_expr(
                ApptCol::Status,
                Expr::value(Status::EmergencyCancelled.as_str()),
            )
            .col_expr(ApptCol::CancellationReason, Expr::value(payload.reason.clone()))
            .col_expr(
                ApptCol::CancelledBy,
                Expr::value(CancelledBy::System.as_str()),
            )
            .col_expr(ApptCol::CancellationTime, Expr::value(now))
            .col_expr(ApptCol::IsEmergency, Expr::value(true))
            .col_expr(ApptCol::EmergencyDetails, Expr::value(payload.reason.clone()))
            .col_expr(ApptCol::UpdatedAt, Expr::value(now))
            .filter(ApptCol::Id.is_in(ids.clone()))
            .exec(&txn)
            .await?;
    }
    txn.commit().await?;

    // Phase 3: notify from the same snapshot, with the transition applied.
    let cancelled: Vec<_> = snapshot
        .into_iter()
        .map(|model| {
            appointment_service::appointment_from_entity(model).map(|mut appointment| {
                appointment.status = Status::EmergencyCancelled;
                appointment.cancellation_reason = Some(payload.reason.clone());
                appointment.cancelled_by = Some(CancelledBy::System);
                appointment.cancellation_time = Some(now);
                appointment.is_emergency = true;
                appointment.emergency_details = Some(payload.reason.clone());
                appointment.updated_at = now;
                appointment
            })
        })
        .collect::<AppResult<_>>()?;

    events::publish(
        &state.events,
        events::emergency_cancelled(&cancelled, &barber.name, &payload.reason),
    );
    tracing::info!(
        barber_id = %barber_id,
        affected = cancelled.len(),
        "emergency cancellation executed"
    );

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        audit::EMERGENCY_CANCEL,
        Some("appointments"),
        Some(serde_json::json!({ "barber_id": barber_id, "affected": ids.len() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Emergency cancellation executed",
        EmergencyCancelResult {
            cancelled_count: ids.len() as i64,
            cancelled_appointment_ids: ids,
        },
        Some(Meta::empty()),
    ))
}
