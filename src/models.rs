use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Who is acting on an appointment, as attested by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Barber,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Barber => "barber",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(Role::Customer),
            "barber" => Some(Role::Barber),
            "manager" => Some(Role::Manager),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
    EmergencyCancelled,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Confirmed => "confirmed",
            Status::Completed => "completed",
            Status::Cancelled => "cancelled",
            Status::NoShow => "no-show",
            Status::EmergencyCancelled => "emergency-cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Status::Pending),
            "confirmed" => Some(Status::Confirmed),
            "completed" => Some(Status::Completed),
            "cancelled" => Some(Status::Cancelled),
            "no-show" => Some(Status::NoShow),
            "emergency-cancelled" => Some(Status::EmergencyCancelled),
            _ => None,
        }
    }

    /// Terminal statuses admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Status::Completed | Status::Cancelled | Status::NoShow | Status::EmergencyCancelled
        )
    }

    /// Statuses that hold a slot: these are the ones the conflict detector
    /// and the availability grid count as occupying time. A completed
    /// appointment still occupied its interval; only the cancelled family
    /// releases the slot.
    pub fn occupies_slot(&self) -> bool {
        !matches!(
            self,
            Status::Cancelled | Status::NoShow | Status::EmergencyCancelled
        )
    }
}

/// Statuses that occupy a slot, as stored in the database.
pub const ACTIVE_STATUSES: [&str; 3] = ["pending", "confirmed", "completed"];

/// Statuses the emergency bulk cancel sweeps up.
pub const BULK_CANCELLABLE_STATUSES: [&str; 2] = ["pending", "confirmed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CancelledBy {
    Customer,
    Barber,
    Manager,
    System,
}

impl CancelledBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelledBy::Customer => "customer",
            CancelledBy::Barber => "barber",
            CancelledBy::Manager => "manager",
            CancelledBy::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(CancelledBy::Customer),
            "barber" => Some(CancelledBy::Barber),
            "manager" => Some(CancelledBy::Manager),
            "system" => Some(CancelledBy::System),
            _ => None,
        }
    }

    /// The cancellation attribution an actor's role produces.
    pub fn from_role(role: Role) -> Self {
        match role {
            Role::Customer => CancelledBy::Customer,
            Role::Barber => CancelledBy::Barber,
            Role::Manager | Role::Admin => CancelledBy::Manager,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CompletedBy {
    Barber,
    Manager,
}

impl CompletedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletedBy::Barber => "barber",
            CompletedBy::Manager => "manager",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "barber" => Some(CompletedBy::Barber),
            "manager" => Some(CompletedBy::Manager),
            _ => None,
        }
    }

    pub fn from_role(role: Role) -> Self {
        match role {
            Role::Barber => CompletedBy::Barber,
            _ => CompletedBy::Manager,
        }
    }
}

/// A product consumed during a completed appointment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductUsed {
    pub product: String,
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "ml".to_string()
}

/// The canonical appointment record exposed by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Appointment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub barber_id: Uuid,
    pub service_id: Uuid,
    pub salon_id: Uuid,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub status: Status,
    pub is_walk_in: bool,
    pub queue_number: Option<i32>,
    pub estimated_wait_time: Option<i32>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<CancelledBy>,
    pub cancellation_time: Option<DateTime<Utc>>,
    pub is_emergency: bool,
    pub emergency_details: Option<String>,
    pub completed_by: Option<CompletedBy>,
    pub price: Option<i64>,
    pub is_paid: bool,
    pub payment_method: Option<String>,
    pub products_used: Vec<ProductUsed>,
    pub rating: Option<i16>,
    pub review: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One cell of a barber's day grid, as produced by the availability
/// calculator. Ordered ascending by start time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimeSlot {
    pub start_time: String,
    pub end_time: String,
    pub is_booked: bool,
    pub appointment_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            Status::Pending,
            Status::Confirmed,
            Status::Completed,
            Status::Cancelled,
            Status::NoShow,
            Status::EmergencyCancelled,
        ] {
            assert_eq!(Status::parse(status.as_str()), Some(status));
        }
        assert_eq!(Status::parse("nope"), None);
    }

    #[test]
    fn cancelled_family_releases_the_slot() {
        assert!(Status::Pending.occupies_slot());
        assert!(Status::Confirmed.occupies_slot());
        assert!(Status::Completed.occupies_slot());
        assert!(!Status::Cancelled.occupies_slot());
        assert!(!Status::NoShow.occupies_slot());
        assert!(!Status::EmergencyCancelled.occupies_slot());
    }

    #[test]
    fn admin_cancellations_are_attributed_to_manager() {
        assert_eq!(CancelledBy::from_role(Role::Admin), CancelledBy::Manager);
        assert_eq!(
            CancelledBy::from_role(Role::Customer),
            CancelledBy::Customer
        );
    }
}
