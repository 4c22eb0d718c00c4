//! Patient and student profile DTOs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdatePatientDTO {
    pub date_of_birth: Option<NaiveDate>,

    #[validate(length(max = 20))]
    pub gender: Option<String>,

    #[validate(length(max = 500))]
    pub address: Option<String>,

    #[validate(length(max = 5000))]
    pub medical_history: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateStudentDTO {
    pub date_of_birth: Option<NaiveDate>,

    #[validate(length(max = 200))]
    pub institution: Option<String>,

    #[validate(length(max = 100))]
    pub education_level: Option<String>,
}
