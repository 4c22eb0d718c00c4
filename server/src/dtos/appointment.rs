//! Appointment and prescription DTOs

use crate::entities::AppointmentStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct BookAppointmentDTO {
    pub doctor_id: i64,
    pub scheduled_at: DateTime<Utc>,

    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateAppointmentDTO {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppointmentStatusDTO {
    pub status: AppointmentStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct AppointmentNotesDTO {
    #[validate(length(max = 10000, message = "Notes must be at most 10000 characters"))]
    pub notes: String,
}

/// Filters for `GET /appointments`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AppointmentQuery {
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreatePrescriptionDTO {
    pub patient_id: i64,
    pub appointment_id: Option<i64>,

    #[validate(length(min = 1, max = 5000, message = "Medicines must be between 1 and 5000 characters"))]
    pub medicines: String,

    #[validate(length(max = 5000))]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPrescriptionDTO {
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_id: Option<i64>,
    pub medicines: String,
    pub instructions: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PrescriptionQuery {
    pub patient_id: Option<i64>,
}
