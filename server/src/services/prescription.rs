//! Prescription services

use super::doctor::current_doctor;
use super::profile::current_patient;
use crate::core::{AppError, AppState};
use crate::dtos::{CreatePrescriptionDTO, NewPrescriptionDTO, PrescriptionQuery};
use crate::entities::{Prescription, Role, User};
use crate::repositories::{Create, PrescriptionScope, Read};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

async fn prescription_scope(state: &AppState, user: &User) -> Result<PrescriptionScope, AppError> {
    match user.role {
        Role::Admin => Ok(PrescriptionScope::All),
        Role::Patient => Ok(PrescriptionScope::Patient(
            current_patient(state, user).await?.patient_id,
        )),
        Role::Doctor => Ok(PrescriptionScope::Doctor(
            current_doctor(state, user).await?.doctor_id,
        )),
        Role::Student => Err(AppError::forbidden("Students have no prescriptions")),
    }
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, patient_id = %body.patient_id))]
pub async fn create_prescription(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreatePrescriptionDTO>,
) -> Result<(StatusCode, Json<Prescription>), AppError> {
    let doctor = current_doctor(&state, &current_user).await?;
    body.validate()?;

    if state.patient.read(&body.patient_id).await?.is_none() {
        return Err(AppError::not_found("Patient not found"));
    }

    if let Some(appointment_id) = body.appointment_id {
        let appointment = state
            .appointment
            .read(&appointment_id)
            .await?
            .ok_or_else(|| AppError::bad_request("Appointment does not exist"))?;
        if appointment.doctor_id != doctor.doctor_id || appointment.patient_id != body.patient_id {
            warn!("Appointment {} does not match prescription", appointment_id);
            return Err(AppError::bad_request(
                "Appointment does not belong to this doctor and patient",
            ));
        }
    }

    let prescription = state
        .prescription
        .create(&NewPrescriptionDTO {
            doctor_id: doctor.doctor_id,
            patient_id: body.patient_id,
            appointment_id: body.appointment_id,
            medicines: body.medicines,
            instructions: body.instructions,
        })
        .await?;

    info!("Prescription {} written", prescription.prescription_id);
    Ok((StatusCode::CREATED, Json(prescription)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_prescriptions(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(query): Query<PrescriptionQuery>,
) -> Result<Json<Vec<Prescription>>, AppError> {
    let scope = prescription_scope(&state, &current_user).await?;
    // patients always see only their own, the filter is for doctors and admins
    let patient_filter = match scope {
        PrescriptionScope::Patient(_) => None,
        _ => query.patient_id,
    };
    Ok(Json(state.prescription.find_many(scope, patient_filter).await?))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_prescription(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(prescription_id): Path<i64>,
) -> Result<Json<Prescription>, AppError> {
    let scope = prescription_scope(&state, &current_user).await?;
    let prescription = state
        .prescription
        .read(&prescription_id)
        .await?
        .ok_or_else(|| AppError::not_found("Prescription not found"))?;

    let allowed = match scope {
        PrescriptionScope::All => true,
        PrescriptionScope::Patient(id) => id == prescription.patient_id,
        PrescriptionScope::Doctor(id) => id == prescription.doctor_id,
    };
    if !allowed {
        return Err(AppError::forbidden("You cannot view this prescription"));
    }
    Ok(Json(prescription))
}
