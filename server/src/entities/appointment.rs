//! Appointment and prescription entities

use super::enums::AppointmentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Appointment {
    pub appointment_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    /// consultation notes written by the doctor
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Appointment with both participants' names, as listed to clients
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct AppointmentDetails {
    pub appointment_id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub specialization: String,
    pub scheduled_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Prescription {
    pub prescription_id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub appointment_id: Option<i64>,
    pub medicines: String,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}
