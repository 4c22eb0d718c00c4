//! Doctor and availability DTOs

use super::PHONE_RE;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Admin request creating a doctor account together with its profile
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateDoctorDTO {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "Email address is not valid"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,

    #[validate(regex(path = *PHONE_RE, message = "Phone number is not valid"))]
    pub phone: Option<String>,

    #[validate(length(min = 2, max = 100))]
    pub specialization: String,

    #[validate(length(min = 2, max = 200))]
    pub qualification: String,

    #[validate(range(min = 0, max = 80))]
    #[serde(default)]
    pub experience_years: i64,

    #[validate(range(min = 0))]
    #[serde(default)]
    pub consultation_fee_cents: i64,

    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

/// Profile columns of a new doctor row
#[derive(Debug, Clone)]
pub struct NewDoctorDTO {
    pub specialization: String,
    pub qualification: String,
    pub experience_years: i64,
    pub consultation_fee_cents: i64,
    pub bio: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateDoctorDTO {
    #[validate(length(min = 2, max = 100))]
    pub specialization: Option<String>,

    #[validate(length(min = 2, max = 200))]
    pub qualification: Option<String>,

    #[validate(range(min = 0, max = 80))]
    pub experience_years: Option<i64>,

    #[validate(range(min = 0))]
    pub consultation_fee_cents: Option<i64>,

    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AvailabilityWindowDTO {
    pub weekday: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReplaceAvailabilityDTO {
    pub windows: Vec<AvailabilityWindowDTO>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}
