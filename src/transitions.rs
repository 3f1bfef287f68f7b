//! Appointment lifecycle rules.
//!
//! Both halves of every guard live here as pure functions so they can be
//! unit-tested without a database or HTTP stack: `ensure_transition` answers
//! "does the current status permit this move", `authorize` answers "may this
//! actor make it". Services call both before touching a row; a rejected
//! attempt never mutates anything.

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, Status},
};

/// The state-machine moves an actor can request on a single appointment.
/// Rescheduling (time or barber change) is not a status move but shares the
/// same authorization table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Confirm,
    Reschedule,
    Complete,
    NoShow,
    Cancel,
    EmergencyCancel,
}

impl Action {
    /// The action a requested status change corresponds to, if any. The
    /// emergency status is deliberately absent: it is reachable only through
    /// the bulk operation, never a single-row update.
    pub fn for_status_change(to: Status) -> Option<Action> {
        match to {
            Status::Confirmed => Some(Action::Confirm),
            Status::Completed => Some(Action::Complete),
            Status::NoShow => Some(Action::NoShow),
            Status::Cancelled => Some(Action::Cancel),
            Status::Pending | Status::EmergencyCancelled => None,
        }
    }
}

/// Ownership facts the policy needs about one appointment.
#[derive(Debug, Clone, Copy)]
pub struct AppointmentRef {
    pub customer_id: Uuid,
    pub barber_id: Uuid,
    pub salon_id: Uuid,
}

/// Does the current status permit this move? Terminal states admit nothing.
pub fn ensure_transition(from: Status, to: Status) -> AppResult<()> {
    if from.is_terminal() {
        return Err(AppError::InvalidTransition(format!(
            "Appointment is already {} and cannot be changed",
            from.as_str()
        )));
    }
    let allowed = match to {
        Status::Confirmed => from == Status::Pending,
        Status::Completed | Status::Cancelled | Status::NoShow | Status::EmergencyCancelled => {
            matches!(from, Status::Pending | Status::Confirmed)
        }
        Status::Pending => false,
    };
    if !allowed {
        return Err(AppError::InvalidTransition(format!(
            "Cannot move a {} appointment to {}",
            from.as_str(),
            to.as_str()
        )));
    }
    Ok(())
}

/// Rescheduling only makes sense while the appointment is still live.
pub fn ensure_reschedulable(status: Status) -> AppResult<()> {
    if status.is_terminal() {
        return Err(AppError::InvalidTransition(format!(
            "Appointment is already {} and cannot be changed",
            status.as_str()
        )));
    }
    Ok(())
}

/// Role/ownership policy for one appointment. Customers act on their own
/// bookings, barbers on appointments assigned to them, managers on their
/// salons, admins everywhere.
pub fn authorize(actor: &AuthUser, appointment: &AppointmentRef, action: Action) -> AppResult<()> {
    let allowed = match actor.role {
        Role::Admin => true,
        Role::Manager => actor.managed_salon_ids.contains(&appointment.salon_id),
        Role::Barber => {
            appointment.barber_id == actor.user_id
                && matches!(
                    action,
                    Action::Confirm
                        | Action::Reschedule
                        | Action::Complete
                        | Action::NoShow
                        | Action::Cancel
                )
        }
        Role::Customer => {
            appointment.customer_id == actor.user_id
                && matches!(action, Action::Cancel | Action::Reschedule)
        }
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not authorized to modify this appointment".to_string(),
        ))
    }
}

/// The emergency bulk cancel is scoped to a barber, not a single
/// appointment, so only the role gate lives here. For managers the service
/// additionally restricts the transitioned snapshot to their managed salons.
pub fn authorize_emergency_cancel(actor: &AuthUser) -> AppResult<()> {
    match actor.role {
        Role::Admin | Role::Manager => Ok(()),
        _ => Err(AppError::Forbidden(
            "Not authorized to trigger an emergency cancellation".to_string(),
        )),
    }
}

/// Walk-ins are staff-created bookings.
pub fn authorize_walk_in(actor: &AuthUser, barber_id: Uuid, salon_id: Uuid) -> AppResult<()> {
    match actor.role {
        Role::Admin => Ok(()),
        Role::Manager if actor.managed_salon_ids.contains(&salon_id) => Ok(()),
        Role::Barber if actor.user_id == barber_id => Ok(()),
        _ => Err(AppError::Forbidden(
            "Not authorized to register a walk-in".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TERMINAL: [Status; 4] = [
        Status::Completed,
        Status::Cancelled,
        Status::NoShow,
        Status::EmergencyCancelled,
    ];

    fn actor(role: Role, user_id: Uuid) -> AuthUser {
        AuthUser {
            user_id,
            role,
            managed_salon_ids: Vec::new(),
        }
    }

    fn appt(customer_id: Uuid, barber_id: Uuid, salon_id: Uuid) -> AppointmentRef {
        AppointmentRef {
            customer_id,
            barber_id,
            salon_id,
        }
    }

    #[test]
    fn live_statuses_reach_every_outcome() {
        for from in [Status::Pending, Status::Confirmed] {
            for to in TERMINAL {
                assert!(ensure_transition(from, to).is_ok(), "{from:?} -> {to:?}");
            }
        }
        assert!(ensure_transition(Status::Pending, Status::Confirmed).is_ok());
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for from in TERMINAL {
            for to in [
                Status::Pending,
                Status::Confirmed,
                Status::Completed,
                Status::Cancelled,
                Status::NoShow,
                Status::EmergencyCancelled,
            ] {
                let err = ensure_transition(from, to).unwrap_err();
                assert_eq!(err.kind(), "invalid_transition", "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn confirmed_cannot_fall_back_to_pending() {
        let err = ensure_transition(Status::Confirmed, Status::Pending).unwrap_err();
        assert_eq!(err.kind(), "invalid_transition");
        let err = ensure_transition(Status::Confirmed, Status::Confirmed).unwrap_err();
        assert_eq!(err.kind(), "invalid_transition");
    }

    #[test]
    fn customers_cancel_and_reschedule_only_their_own() {
        let customer_id = Uuid::new_v4();
        let a = appt(customer_id, Uuid::new_v4(), Uuid::new_v4());
        let me = actor(Role::Customer, customer_id);
        let stranger = actor(Role::Customer, Uuid::new_v4());

        assert!(authorize(&me, &a, Action::Cancel).is_ok());
        assert!(authorize(&me, &a, Action::Reschedule).is_ok());
        assert!(authorize(&me, &a, Action::Confirm).is_err());
        assert!(authorize(&me, &a, Action::Complete).is_err());
        assert!(authorize(&me, &a, Action::NoShow).is_err());
        assert!(authorize(&stranger, &a, Action::Cancel).is_err());
    }

    #[test]
    fn barbers_act_only_on_assigned_appointments() {
        let barber_id = Uuid::new_v4();
        let a = appt(Uuid::new_v4(), barber_id, Uuid::new_v4());
        let me = actor(Role::Barber, barber_id);
        let other = actor(Role::Barber, Uuid::new_v4());

        for action in [
            Action::Confirm,
            Action::Complete,
            Action::NoShow,
            Action::Cancel,
            Action::Reschedule,
        ] {
            assert!(authorize(&me, &a, action).is_ok(), "{action:?}");
            assert!(authorize(&other, &a, action).is_err(), "{action:?}");
        }
        assert!(authorize(&me, &a, Action::EmergencyCancel).is_err());
    }

    #[test]
    fn managers_are_scoped_to_their_salons() {
        let salon_id = Uuid::new_v4();
        let a = appt(Uuid::new_v4(), Uuid::new_v4(), salon_id);
        let mut manager = actor(Role::Manager, Uuid::new_v4());
        assert!(authorize(&manager, &a, Action::Cancel).is_err());

        manager.managed_salon_ids.push(salon_id);
        assert!(authorize(&manager, &a, Action::Cancel).is_ok());
        assert!(authorize(&manager, &a, Action::Complete).is_ok());
    }

    #[test]
    fn admins_are_unscoped() {
        let a = appt(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let admin = actor(Role::Admin, Uuid::new_v4());
        for action in [
            Action::Confirm,
            Action::Reschedule,
            Action::Complete,
            Action::NoShow,
            Action::Cancel,
            Action::EmergencyCancel,
        ] {
            assert!(authorize(&admin, &a, action).is_ok());
        }
    }

    #[test]
    fn emergency_cancel_is_manager_or_admin_only() {
        assert!(authorize_emergency_cancel(&actor(Role::Admin, Uuid::new_v4())).is_ok());
        assert!(authorize_emergency_cancel(&actor(Role::Manager, Uuid::new_v4())).is_ok());
        assert!(authorize_emergency_cancel(&actor(Role::Barber, Uuid::new_v4())).is_err());
        assert!(authorize_emergency_cancel(&actor(Role::Customer, Uuid::new_v4())).is_err());
    }

    #[test]
    fn emergency_status_is_unreachable_from_a_single_row_update() {
        assert_eq!(Action::for_status_change(Status::EmergencyCancelled), None);
        assert_eq!(Action::for_status_change(Status::Pending), None);
        assert_eq!(
            Action::for_status_change(Status::Completed),
            Some(Action::Complete)
        );
    }
}
