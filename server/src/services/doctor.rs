//! Doctor services - directory, admin management, weekly schedule and free slots

use super::schedule::{free_slots, validate_windows};
use crate::core::{AppError, AppState, require_role};
use crate::dtos::{
    CreateDoctorDTO, CreateUserDTO, DoctorQuery, NewDoctorDTO, ReplaceAvailabilityDTO, SlotsQuery,
    UpdateDoctorDTO,
};
use crate::entities::{Availability, Doctor, DoctorProfile, Role, User};
use crate::repositories::{Delete, Read, Update};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Resolves the doctor profile of the logged-in user
pub(crate) async fn current_doctor(state: &AppState, user: &User) -> Result<Doctor, AppError> {
    require_role(user, &[Role::Doctor])?;
    state
        .doctor
        .find_by_user_id(&user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Doctor profile not found"))
}

#[instrument(skip(state))]
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DoctorQuery>,
) -> Result<Json<Vec<DoctorProfile>>, AppError> {
    let doctors = state.doctor.find_profiles(&query).await?;
    debug!("Found {} doctors", doctors.len());
    Ok(Json(doctors))
}

#[instrument(skip(state))]
pub async fn get_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<DoctorProfile>, AppError> {
    let doctor = state
        .doctor
        .find_profile(&doctor_id)
        .await?
        .ok_or_else(|| AppError::not_found("Doctor not found"))?;
    Ok(Json(doctor))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, email = %body.email))]
pub async fn create_doctor(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateDoctorDTO>,
) -> Result<(StatusCode, Json<DoctorProfile>), AppError> {
    require_role(&current_user, &[Role::Admin])?;
    body.validate()?;

    if state.user.find_by_email(&body.email).await?.is_some() {
        return Err(AppError::conflict("Email is already registered"));
    }

    let account = CreateUserDTO {
        name: body.name.trim().to_string(),
        email: body.email.trim().to_lowercase(),
        password: User::hash_password(&body.password, state.bcrypt_cost)?,
        role: Role::Doctor,
        phone: body.phone,
    };
    let profile = NewDoctorDTO {
        specialization: body.specialization,
        qualification: body.qualification,
        experience_years: body.experience_years,
        consultation_fee_cents: body.consultation_fee_cents,
        bio: body.bio,
    };

    let (_, doctor) = state.doctor.create_with_account(&account, &profile).await?;
    let created = state
        .doctor
        .find_profile(&doctor.doctor_id)
        .await?
        .ok_or_else(|| AppError::internal_server_error("Doctor vanished after creation"))?;

    info!("Doctor {} created", created.doctor_id);
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_doctor(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(doctor_id): Path<i64>,
    Json(body): Json<UpdateDoctorDTO>,
) -> Result<Json<DoctorProfile>, AppError> {
    body.validate()?;
    let doctor = state
        .doctor
        .read(&doctor_id)
        .await?
        .ok_or_else(|| AppError::not_found("Doctor not found"))?;

    // admins edit anyone, doctors only themselves
    if current_user.role != Role::Admin && doctor.user_id != current_user.user_id {
        warn!("User {} may not edit doctor {}", current_user.user_id, doctor_id);
        return Err(AppError::forbidden("You can only edit your own profile"));
    }

    state.doctor.update(&doctor_id, &body).await?;
    let profile = state
        .doctor
        .find_profile(&doctor_id)
        .await?
        .ok_or_else(|| AppError::not_found("Doctor not found"))?;
    Ok(Json(profile))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_doctor(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(doctor_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    state.doctor.delete(&doctor_id).await?;
    info!("Doctor {} deleted", doctor_id);
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Vec<Availability>>, AppError> {
    if state.doctor.read(&doctor_id).await?.is_none() {
        return Err(AppError::not_found("Doctor not found"));
    }
    Ok(Json(state.doctor.find_availability(&doctor_id).await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, windows = body.windows.len()))]
pub async fn replace_my_availability(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<ReplaceAvailabilityDTO>,
) -> Result<Json<Vec<Availability>>, AppError> {
    let doctor = current_doctor(&state, &current_user).await?;
    validate_windows(&body.windows)?;

    let windows = state
        .doctor
        .replace_availability(&doctor.doctor_id, &body.windows)
        .await?;
    info!("Doctor {} now has {} windows", doctor.doctor_id, windows.len());
    Ok(Json(windows))
}

#[instrument(skip(state))]
pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<DateTime<Utc>>>, AppError> {
    if state.doctor.read(&doctor_id).await?.is_none() {
        return Err(AppError::not_found("Doctor not found"));
    }

    let windows = state.doctor.find_availability(&doctor_id).await?;
    let day_start = query.date.and_hms_opt(0, 0, 0).map(|t| t.and_utc());
    let Some(day_start) = day_start else {
        return Err(AppError::bad_request("Invalid date"));
    };
    // bookings just before midnight can still block the first slot of the day
    let from = day_start - Duration::minutes(state.slot_minutes);
    let to = day_start + Duration::days(1) + Duration::minutes(state.slot_minutes);
    let booked = state
        .appointment
        .find_booked_times(&doctor_id, &from, &to)
        .await?;

    let slots = free_slots(query.date, &windows, &booked, state.slot_minutes, Utc::now());
    debug!("{} free slots on {}", slots.len(), query.date);
    Ok(Json(slots))
}
