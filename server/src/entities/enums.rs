//! Enumerations stored as lowercase TEXT columns

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Patient => "patient",
            Role::Student => "student",
        }
    }

    /// Roles that may create their own account through `/auth/register`
    pub fn can_self_register(&self) -> bool {
        matches!(self, Role::Patient | Role::Student)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Completed) | (Pending, Cancelled) | (Confirmed, Cancelled)
        )
    }

    /// Pending and confirmed appointments hold their slot
    pub fn occupies_slot(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// pending -> confirmed -> processing -> ready -> delivered, cancel from any open state
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        if next == Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Processing) | (Processing, Ready) | (Ready, Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        *self == ApplicationStatus::Pending && next != ApplicationStatus::Pending
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_follows_fulfilment_chain() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Ready));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn order_cannot_skip_steps() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Ready));
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn order_cancel_only_from_open_states() {
        for status in OrderStatus::ALL {
            let expected = !matches!(status, OrderStatus::Delivered | OrderStatus::Cancelled);
            assert_eq!(status.can_transition_to(OrderStatus::Cancelled), expected, "{status}");
        }
    }

    #[test]
    fn appointment_transitions() {
        assert!(AppointmentStatus::Pending.can_transition_to(AppointmentStatus::Confirmed));
        assert!(AppointmentStatus::Confirmed.can_transition_to(AppointmentStatus::Completed));
        assert!(AppointmentStatus::Confirmed.can_transition_to(AppointmentStatus::Cancelled));
        assert!(!AppointmentStatus::Pending.can_transition_to(AppointmentStatus::Completed));
        assert!(!AppointmentStatus::Completed.can_transition_to(AppointmentStatus::Cancelled));
        assert!(!AppointmentStatus::Cancelled.can_transition_to(AppointmentStatus::Pending));
    }

    #[test]
    fn application_is_reviewed_once() {
        assert!(ApplicationStatus::Pending.can_transition_to(ApplicationStatus::Approved));
        assert!(ApplicationStatus::Pending.can_transition_to(ApplicationStatus::Rejected));
        assert!(!ApplicationStatus::Pending.can_transition_to(ApplicationStatus::Pending));
        assert!(!ApplicationStatus::Approved.can_transition_to(ApplicationStatus::Rejected));
    }

    #[test]
    fn statuses_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&OrderStatus::Processing).unwrap(), "\"processing\"");
        assert_eq!(serde_json::to_string(&Role::Doctor).unwrap(), "\"doctor\"");
        let parsed: ApplicationStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(parsed, ApplicationStatus::Approved);
    }

    #[test]
    fn only_patients_and_students_self_register() {
        assert!(Role::Patient.can_self_register());
        assert!(Role::Student.can_self_register());
        assert!(!Role::Doctor.can_self_register());
        assert!(!Role::Admin.can_self_register());
    }
}
