//! Notification fan-out.
//!
//! The routing here is pure: given an accepted write, produce the set of
//! (channel, payload) envelopes to deliver. The transport is a process-wide
//! `tokio::sync::broadcast` bus consumed by the SSE endpoint; delivery is
//! at-most-once and best-effort, and a failed publish never fails the write
//! that triggered it.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    middleware::auth::AuthUser,
    models::{Appointment, Role},
};

/// Capacity of the broadcast bus; slow subscribers lag and drop, they never
/// block writers.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// A logical delivery target. Connection-time membership is derived from the
/// actor's identity by [`channels_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    User(Uuid),
    Barbers,
    Managers,
    Salon(Uuid),
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::User(id) => write!(f, "user-{id}"),
            Channel::Barbers => write!(f, "barbers"),
            Channel::Managers => write!(f, "managers"),
            Channel::Salon(id) => write!(f, "salon-{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    #[serde(rename = "appointment.created")]
    AppointmentCreated,
    #[serde(rename = "appointment.updated")]
    AppointmentUpdated,
    #[serde(rename = "appointment.cancelled")]
    AppointmentCancelled,
    #[serde(rename = "queue.updated")]
    QueueUpdated,
    #[serde(rename = "walk-in.created")]
    WalkInCreated,
}

impl EventKind {
    /// Wire name, also used as the SSE event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AppointmentCreated => "appointment.created",
            EventKind::AppointmentUpdated => "appointment.updated",
            EventKind::AppointmentCancelled => "appointment.cancelled",
            EventKind::QueueUpdated => "queue.updated",
            EventKind::WalkInCreated => "walk-in.created",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventPayload {
    pub kind: EventKind,
    /// Full current appointment, absent only for summary events.
    pub appointment: Option<Appointment>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    pub channel: Channel,
    pub payload: EventPayload,
}

fn envelope(channel: Channel, kind: EventKind, appointment: Option<Appointment>, message: String) -> Envelope {
    Envelope {
        channel,
        payload: EventPayload {
            kind,
            appointment,
            message,
        },
    }
}

/// appointment.created goes to the assigned barber and the salon.
pub fn booking_created(
    appointment: &Appointment,
    customer_name: &str,
    service_name: &str,
) -> Vec<Envelope> {
    vec![
        envelope(
            Channel::User(appointment.barber_id),
            EventKind::AppointmentCreated,
            Some(appointment.clone()),
            format!("New appointment booked with {customer_name} for {service_name}"),
        ),
        envelope(
            Channel::Salon(appointment.salon_id),
            EventKind::AppointmentCreated,
            Some(appointment.clone()),
            format!("New appointment booked for {service_name}"),
        ),
    ]
}

/// appointment.updated goes to both parties.
pub fn booking_updated(
    appointment: &Appointment,
    customer_name: &str,
    service_name: &str,
    change: &str,
) -> Vec<Envelope> {
    vec![
        envelope(
            Channel::User(appointment.customer_id),
            EventKind::AppointmentUpdated,
            Some(appointment.clone()),
            format!("Your appointment for {service_name} has been {change}"),
        ),
        envelope(
            Channel::User(appointment.barber_id),
            EventKind::AppointmentUpdated,
            Some(appointment.clone()),
            format!("Appointment with {customer_name} for {service_name} has been {change}"),
        ),
    ]
}

/// Emergency bulk cancellation: one event per affected customer, built from
/// the transitioned snapshot, plus a single summary to the managers channel.
pub fn emergency_cancelled(
    snapshot: &[Appointment],
    barber_name: &str,
    reason: &str,
) -> Vec<Envelope> {
    let mut out: Vec<Envelope> = snapshot
        .iter()
        .map(|appointment| {
            envelope(
                Channel::User(appointment.customer_id),
                EventKind::AppointmentCancelled,
                Some(appointment.clone()),
                format!(
                    "Your appointment on {} at {} has been cancelled due to an emergency: {reason}",
                    appointment.date, appointment.start_time
                ),
            )
        })
        .collect();
    out.push(envelope(
        Channel::Managers,
        EventKind::AppointmentCancelled,
        None,
        format!(
            "Emergency cancellation for {barber_name}: {reason} ({} appointments affected)",
            snapshot.len()
        ),
    ));
    out
}

/// Walk-ins announce themselves and bump the salon queue.
pub fn walk_in_created(appointment: &Appointment) -> Vec<Envelope> {
    vec![
        envelope(
            Channel::Salon(appointment.salon_id),
            EventKind::WalkInCreated,
            Some(appointment.clone()),
            "New walk-in customer".to_string(),
        ),
        envelope(
            Channel::User(appointment.barber_id),
            EventKind::WalkInCreated,
            Some(appointment.clone()),
            "You have a new walk-in customer".to_string(),
        ),
        envelope(
            Channel::Salon(appointment.salon_id),
            EventKind::QueueUpdated,
            Some(appointment.clone()),
            "Walk-in queue updated".to_string(),
        ),
        envelope(
            Channel::User(appointment.barber_id),
            EventKind::QueueUpdated,
            Some(appointment.clone()),
            "Walk-in queue updated".to_string(),
        ),
    ]
}

/// The channel set a connecting actor is subscribed to.
pub fn channels_for(user: &AuthUser) -> Vec<Channel> {
    let mut channels = vec![Channel::User(user.user_id)];
    match user.role {
        Role::Barber => channels.push(Channel::Barbers),
        Role::Manager => {
            channels.push(Channel::Managers);
            channels.extend(user.managed_salon_ids.iter().map(|id| Channel::Salon(*id)));
        }
        Role::Customer | Role::Admin => {}
    }
    channels
}

/// Best-effort publish. A bus with no subscribers is not an error.
pub fn publish(bus: &broadcast::Sender<Envelope>, envelopes: Vec<Envelope>) {
    for env in envelopes {
        let channel = env.channel;
        let kind = env.payload.kind;
        if let Err(err) = bus.send(env) {
            tracing::debug!(%channel, kind = kind.as_str(), error = %err, "event dropped, no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use crate::models::Status;

    fn sample_appointment() -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            barber_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            salon_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: "10:00".to_string(),
            end_time: "10:30".to_string(),
            status: Status::Pending,
            is_walk_in: false,
            queue_number: None,
            estimated_wait_time: None,
            cancellation_reason: None,
            cancelled_by: None,
            cancellation_time: None,
            is_emergency: false,
            emergency_details: None,
            completed_by: None,
            price: Some(2500),
            is_paid: false,
            payment_method: None,
            products_used: Vec::new(),
            rating: None,
            review: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn created_goes_to_barber_and_salon() {
        let appt = sample_appointment();
        let envs = booking_created(&appt, "Ada", "Haircut");
        assert_eq!(envs.len(), 2);
        assert_eq!(envs[0].channel, Channel::User(appt.barber_id));
        assert_eq!(envs[1].channel, Channel::Salon(appt.salon_id));
        for env in &envs {
            assert_eq!(env.payload.kind, EventKind::AppointmentCreated);
            assert!(env.payload.appointment.is_some());
        }
    }

    #[test]
    fn updated_goes_to_both_parties() {
        let appt = sample_appointment();
        let envs = booking_updated(&appt, "Ada", "Haircut", "confirmed");
        let channels: Vec<_> = envs.iter().map(|e| e.channel).collect();
        assert_eq!(
            channels,
            vec![Channel::User(appt.customer_id), Channel::User(appt.barber_id)]
        );
    }

    #[test]
    fn emergency_notifies_exactly_the_snapshot_plus_managers() {
        let a = sample_appointment();
        let b = sample_appointment();
        let envs = emergency_cancelled(&[a.clone(), b.clone()], "Sam", "flooding");

        assert_eq!(envs.len(), 3);
        assert_eq!(envs[0].channel, Channel::User(a.customer_id));
        assert_eq!(envs[1].channel, Channel::User(b.customer_id));
        assert_eq!(envs[2].channel, Channel::Managers);
        assert!(envs[2].payload.appointment.is_none());
        assert!(envs[2].payload.message.contains("2 appointments"));
    }

    #[test]
    fn walk_in_announces_and_updates_the_queue() {
        let appt = sample_appointment();
        let kinds: Vec<_> = walk_in_created(&appt)
            .iter()
            .map(|e| e.payload.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::WalkInCreated,
                EventKind::WalkInCreated,
                EventKind::QueueUpdated,
                EventKind::QueueUpdated
            ]
        );
    }

    #[test]
    fn channel_membership_follows_role() {
        let customer = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Customer,
            managed_salon_ids: Vec::new(),
        };
        assert_eq!(channels_for(&customer), vec![Channel::User(customer.user_id)]);

        let barber = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Barber,
            managed_salon_ids: Vec::new(),
        };
        assert_eq!(
            channels_for(&barber),
            vec![Channel::User(barber.user_id), Channel::Barbers]
        );

        let salon = Uuid::new_v4();
        let manager = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Manager,
            managed_salon_ids: vec![salon],
        };
        assert_eq!(
            channels_for(&manager),
            vec![
                Channel::User(manager.user_id),
                Channel::Managers,
                Channel::Salon(salon)
            ]
        );
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let (bus, rx) = broadcast::channel(EVENT_BUS_CAPACITY);
        drop(rx);
        publish(&bus, booking_created(&sample_appointment(), "Ada", "Haircut"));
    }
}
