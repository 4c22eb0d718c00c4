//! Doctor profile and weekly availability windows

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Doctor {
    pub doctor_id: i64,
    pub user_id: i64,
    pub specialization: String,
    pub qualification: String,
    pub experience_years: i64,
    pub consultation_fee_cents: i64,
    pub bio: Option<String>,
}

/// Doctor row joined with the owning user's public fields
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct DoctorProfile {
    pub doctor_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub qualification: String,
    pub experience_years: i64,
    pub consultation_fee_cents: i64,
    pub bio: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Availability {
    pub availability_id: i64,
    pub doctor_id: i64,
    /// 0 = Monday ... 6 = Sunday
    pub weekday: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
