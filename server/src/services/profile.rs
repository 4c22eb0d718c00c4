//! Patient and student profile services

use crate::core::{AppError, AppState, require_role};
use crate::dtos::{UpdatePatientDTO, UpdateStudentDTO};
use crate::entities::{Patient, PatientProfile, Role, Student, StudentProfile, User};
use axum::{
    Extension,
    extract::{Json, Path, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

/// Resolves the patient profile of the logged-in user
pub(crate) async fn current_patient(state: &AppState, user: &User) -> Result<Patient, AppError> {
    require_role(user, &[Role::Patient])?;
    state
        .patient
        .find_by_user_id(&user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Patient profile not found"))
}

/// Resolves the student profile of the logged-in user
pub(crate) async fn current_student(state: &AppState, user: &User) -> Result<Student, AppError> {
    require_role(user, &[Role::Student])?;
    state
        .student
        .find_by_user_id(&user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Student profile not found"))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_my_patient_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<PatientProfile>, AppError> {
    require_role(&current_user, &[Role::Patient])?;
    let profile = state
        .patient
        .find_profile_by_user_id(&current_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Patient profile not found"))?;
    Ok(Json(profile))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_my_patient_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdatePatientDTO>,
) -> Result<Json<Patient>, AppError> {
    require_role(&current_user, &[Role::Patient])?;
    body.validate()?;
    let patient = state
        .patient
        .update_by_user_id(&current_user.user_id, &body)
        .await?;
    info!("Patient {} updated their profile", patient.patient_id);
    Ok(Json(patient))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<PatientProfile>>, AppError> {
    require_role(&current_user, &[Role::Admin, Role::Doctor])?;
    let patients = state.patient.find_profiles().await?;
    debug!("Found {} patients", patients.len());
    Ok(Json(patients))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(patient_id): Path<i64>,
) -> Result<Json<PatientProfile>, AppError> {
    require_role(&current_user, &[Role::Admin, Role::Doctor])?;
    let patient = state
        .patient
        .find_profile(&patient_id)
        .await?
        .ok_or_else(|| AppError::not_found("Patient not found"))?;
    Ok(Json(patient))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_my_student_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<StudentProfile>, AppError> {
    require_role(&current_user, &[Role::Student])?;
    let profile = state
        .student
        .find_profile_by_user_id(&current_user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Student profile not found"))?;
    Ok(Json(profile))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_my_student_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdateStudentDTO>,
) -> Result<Json<Student>, AppError> {
    require_role(&current_user, &[Role::Student])?;
    body.validate()?;
    let student = state
        .student
        .update_by_user_id(&current_user.user_id, &body)
        .await?;
    Ok(Json(student))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_students(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<StudentProfile>>, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    Ok(Json(state.student.find_profiles().await?))
}
