//! Course and application entities

use super::enums::ApplicationStatus;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Course {
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub duration_weeks: i64,
    pub fee_cents: i64,
    pub start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Application {
    pub application_id: i64,
    pub course_id: i64,
    pub student_id: i64,
    pub statement: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct ApplicationDetails {
    pub application_id: i64,
    pub course_id: i64,
    pub course_title: String,
    pub student_id: i64,
    pub student_name: String,
    pub statement: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}
