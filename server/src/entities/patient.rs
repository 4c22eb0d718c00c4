//! Patient and student profiles

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Patient {
    pub patient_id: i64,
    pub user_id: i64,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct PatientProfile {
    pub patient_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Student {
    pub student_id: i64,
    pub user_id: i64,
    pub date_of_birth: Option<NaiveDate>,
    pub institution: Option<String>,
    pub education_level: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct StudentProfile {
    pub student_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub institution: Option<String>,
    pub education_level: Option<String>,
}
