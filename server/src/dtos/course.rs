//! Course and application DTOs

use crate::entities::ApplicationStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateCourseDTO {
    #[validate(length(min = 2, max = 200, message = "Title must be between 2 and 200 characters"))]
    pub title: String,

    #[validate(length(max = 10000))]
    pub description: Option<String>,

    #[validate(length(max = 100))]
    pub instructor: Option<String>,

    #[validate(range(min = 1, max = 520, message = "Duration must be between 1 and 520 weeks"))]
    pub duration_weeks: i64,

    #[validate(range(min = 0, message = "Fee cannot be negative"))]
    #[serde(default)]
    pub fee_cents: i64,

    pub start_date: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateCourseDTO {
    #[validate(length(min = 2, max = 200, message = "Title must be between 2 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 10000))]
    pub description: Option<String>,

    #[validate(length(max = 100))]
    pub instructor: Option<String>,

    #[validate(range(min = 1, max = 520, message = "Duration must be between 1 and 520 weeks"))]
    pub duration_weeks: Option<i64>,

    #[validate(range(min = 0, message = "Fee cannot be negative"))]
    pub fee_cents: Option<i64>,

    pub start_date: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CourseQuery {
    pub search: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct ApplyDTO {
    pub course_id: i64,

    #[validate(length(max = 5000, message = "Statement must be at most 5000 characters"))]
    pub statement: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApplicationStatusDTO {
    pub status: ApplicationStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ApplicationQuery {
    pub status: Option<ApplicationStatus>,
    pub course_id: Option<i64>,
}
