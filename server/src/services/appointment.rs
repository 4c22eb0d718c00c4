//! Appointment services - booking, scoped listings and the status workflow

use super::doctor::current_doctor;
use super::profile::current_patient;
use super::schedule::{fits_availability, truncate_to_minute};
use crate::core::{AppError, AppState, require_role};
use crate::dtos::{
    AppointmentNotesDTO, AppointmentQuery, AppointmentStatusDTO, BookAppointmentDTO,
    CreateAppointmentDTO,
};
use crate::entities::{Appointment, AppointmentDetails, AppointmentStatus, Role, User};
use crate::repositories::{AppointmentScope, Delete, Read};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Which appointments the user may see: patients and doctors their own, admins all
pub(crate) async fn appointment_scope(
    state: &AppState,
    user: &User,
) -> Result<AppointmentScope, AppError> {
    match user.role {
        Role::Admin => Ok(AppointmentScope::All),
        Role::Patient => Ok(AppointmentScope::Patient(
            current_patient(state, user).await?.patient_id,
        )),
        Role::Doctor => Ok(AppointmentScope::Doctor(
            current_doctor(state, user).await?.doctor_id,
        )),
        Role::Student => Err(AppError::forbidden("Students have no appointments")),
    }
}

fn in_scope(scope: &AppointmentScope, patient_id: i64, doctor_id: i64) -> bool {
    match scope {
        AppointmentScope::All => true,
        AppointmentScope::Patient(id) => *id == patient_id,
        AppointmentScope::Doctor(id) => *id == doctor_id,
    }
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, doctor_id = %body.doctor_id))]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<BookAppointmentDTO>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    // 1. only patients book, for themselves
    // 2. the start is truncated to the minute and must lie ahead
    // 3. the doctor must exist and, if they publish a schedule, the slot must fit it
    // 4. no other open booking may start within one slot of this one
    debug!("Booking appointment");
    let patient = current_patient(&state, &current_user).await?;
    body.validate()?;

    let scheduled_at = truncate_to_minute(body.scheduled_at);
    if scheduled_at <= Utc::now() {
        return Err(AppError::bad_request("Appointment must be in the future"));
    }

    if state.doctor.read(&body.doctor_id).await?.is_none() {
        return Err(AppError::not_found("Doctor not found"));
    }

    let windows = state.doctor.find_availability(&body.doctor_id).await?;
    if !windows.is_empty() && !fits_availability(scheduled_at, &windows, state.slot_minutes) {
        warn!("Requested time outside availability");
        return Err(AppError::bad_request("Doctor is not available at that time"));
    }

    let appointment = state
        .appointment
        .book_if_free(
            &CreateAppointmentDTO {
                patient_id: patient.patient_id,
                doctor_id: body.doctor_id,
                scheduled_at,
                reason: body.reason,
            },
            Duration::minutes(state.slot_minutes),
        )
        .await?
        .ok_or_else(|| {
            warn!("Slot already taken");
            AppError::conflict("This time slot is already booked")
        })?;

    info!("Appointment {} booked", appointment.appointment_id);
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Vec<AppointmentDetails>>, AppError> {
    let scope = appointment_scope(&state, &current_user).await?;
    let appointments = state.appointment.find_many(scope, &query).await?;
    debug!("Found {} appointments", appointments.len());
    Ok(Json(appointments))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<AppointmentDetails>, AppError> {
    let scope = appointment_scope(&state, &current_user).await?;
    let appointment = state
        .appointment
        .find_details(&appointment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment not found"))?;

    if !in_scope(&scope, appointment.patient_id, appointment.doctor_id) {
        return Err(AppError::forbidden("You cannot view this appointment"));
    }
    Ok(Json(appointment))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, status = %body.status))]
pub async fn update_appointment_status(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(appointment_id): Path<i64>,
    Json(body): Json<AppointmentStatusDTO>,
) -> Result<Json<Appointment>, AppError> {
    let scope = appointment_scope(&state, &current_user).await?;
    let appointment = state
        .appointment
        .read(&appointment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment not found"))?;

    if !in_scope(&scope, appointment.patient_id, appointment.doctor_id) {
        return Err(AppError::forbidden("You cannot change this appointment"));
    }
    if matches!(scope, AppointmentScope::Patient(_)) && body.status != AppointmentStatus::Cancelled {
        return Err(AppError::forbidden("Patients can only cancel appointments"));
    }
    if !appointment.status.can_transition_to(body.status) {
        warn!("Illegal transition {} -> {}", appointment.status, body.status);
        return Err(AppError::bad_request("Illegal status transition").with_details(format!(
            "Cannot move an appointment from {} to {}",
            appointment.status, body.status
        )));
    }

    let updated = state
        .appointment
        .update_status(&appointment_id, appointment.status, body.status)
        .await?
        .ok_or_else(|| AppError::conflict("Appointment was changed by someone else"))?;
    info!("Appointment {} is now {}", appointment_id, updated.status);
    Ok(Json(updated))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_appointment_notes(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(appointment_id): Path<i64>,
    Json(body): Json<AppointmentNotesDTO>,
) -> Result<Json<Appointment>, AppError> {
    let doctor = current_doctor(&state, &current_user).await?;
    body.validate()?;
    let appointment = state
        .appointment
        .read(&appointment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment not found"))?;
    if appointment.doctor_id != doctor.doctor_id {
        return Err(AppError::forbidden("You can only annotate your own appointments"));
    }

    let updated = state
        .appointment
        .update_notes(&appointment_id, &body.notes)
        .await?;
    Ok(Json(updated))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    state.appointment.delete(&appointment_id).await?;
    info!("Appointment {} deleted", appointment_id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_limits_visibility() {
        assert!(in_scope(&AppointmentScope::All, 1, 2));
        assert!(in_scope(&AppointmentScope::Patient(1), 1, 2));
        assert!(!in_scope(&AppointmentScope::Patient(3), 1, 2));
        assert!(in_scope(&AppointmentScope::Doctor(2), 1, 2));
        assert!(!in_scope(&AppointmentScope::Doctor(1), 1, 2));
    }
}
