//! Course and application services

use super::profile::current_student;
use crate::core::{AppError, AppState, require_role};
use crate::dtos::{
    ApplicationQuery, ApplicationStatusDTO, ApplyDTO, CourseQuery, CreateCourseDTO, UpdateCourseDTO,
};
use crate::entities::{Application, ApplicationDetails, ApplicationStatus, Course, Role, User};
use crate::repositories::{Create, Delete, NewApplication, Read, Update};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state))]
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CourseQuery>,
) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(state.course.find_many(query.search.as_deref()).await?))
}

#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<i64>,
) -> Result<Json<Course>, AppError> {
    let course = state
        .course
        .read(&course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;
    Ok(Json(course))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, title = %body.title))]
pub async fn create_course(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateCourseDTO>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    require_role(&current_user, &[Role::Admin])?;
    body.validate()?;
    let course = state.course.create(&body).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_course(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(course_id): Path<i64>,
    Json(body): Json<UpdateCourseDTO>,
) -> Result<Json<Course>, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    body.validate()?;
    Ok(Json(state.course.update(&course_id, &body).await?))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_course(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(course_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    state.course.delete(&course_id).await?;
    info!("Course {} deleted", course_id);
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, course_id = %body.course_id))]
pub async fn apply_to_course(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<ApplyDTO>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let student = current_student(&state, &current_user).await?;
    body.validate()?;

    if state.course.read(&body.course_id).await?.is_none() {
        return Err(AppError::not_found("Course not found"));
    }

    let application = state
        .application
        .create(&NewApplication {
            course_id: body.course_id,
            student_id: student.student_id,
            statement: body.statement,
        })
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::conflict("You already applied to this course")
            }
            other => AppError::from(other),
        })?;

    info!("Student {} applied to course {}", student.student_id, body.course_id);
    Ok((StatusCode::CREATED, Json(application)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_applications(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(query): Query<ApplicationQuery>,
) -> Result<Json<Vec<ApplicationDetails>>, AppError> {
    let student_id = match current_user.role {
        Role::Admin => None,
        Role::Student => Some(current_student(&state, &current_user).await?.student_id),
        _ => return Err(AppError::forbidden("Only students and admins see applications")),
    };
    let applications = state.application.find_many(student_id, &query).await?;
    debug!("Found {} applications", applications.len());
    Ok(Json(applications))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, status = %body.status))]
pub async fn review_application(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(application_id): Path<i64>,
    Json(body): Json<ApplicationStatusDTO>,
) -> Result<Json<Application>, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    if body.status == ApplicationStatus::Pending {
        return Err(AppError::bad_request("Status must be approved or rejected"));
    }

    let application = state
        .application
        .read(&application_id)
        .await?
        .ok_or_else(|| AppError::not_found("Application not found"))?;
    if !application.status.can_transition_to(body.status) {
        return Err(AppError::bad_request("Application has already been reviewed"));
    }

    let reviewed = state
        .application
        .review(&application_id, body.status)
        .await?
        .ok_or_else(|| AppError::bad_request("Application has already been reviewed"))?;
    Ok(Json(reviewed))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn withdraw_application(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(application_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let application = state
        .application
        .read(&application_id)
        .await?
        .ok_or_else(|| AppError::not_found("Application not found"))?;

    match current_user.role {
        Role::Admin => {}
        Role::Student => {
            let student = current_student(&state, &current_user).await?;
            if application.student_id != student.student_id {
                warn!("Student {} does not own application {}", student.student_id, application_id);
                return Err(AppError::forbidden("You cannot withdraw this application"));
            }
            if application.status != ApplicationStatus::Pending {
                return Err(AppError::bad_request("Only pending applications can be withdrawn"));
            }
        }
        _ => return Err(AppError::forbidden("Insufficient role")),
    }

    state.application.delete(&application_id).await?;
    info!("Application {} removed", application_id);
    Ok(StatusCode::NO_CONTENT)
}
