//! Shop catalogue services - categories and medicines

use crate::core::{AppError, AppState, require_role};
use crate::dtos::{CategoryDTO, CreateMedicineDTO, MedicineQuery, UpdateCategoryDTO, UpdateMedicineDTO};
use crate::entities::{Category, Medicine, Role, User};
use crate::repositories::{Create, Delete, Read, Update};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use validator::Validate;

async fn ensure_category_exists(state: &AppState, category_id: Option<i64>) -> Result<(), AppError> {
    if let Some(category_id) = category_id {
        if state.category.read(&category_id).await?.is_none() {
            return Err(AppError::bad_request("Category does not exist"));
        }
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.category.find_all().await?))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<i64>,
) -> Result<Json<Category>, AppError> {
    let category = state
        .category
        .read(&category_id)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))?;
    Ok(Json(category))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CategoryDTO>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    require_role(&current_user, &[Role::Admin])?;
    body.validate()?;
    let category = state.category.create(&body).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(category_id): Path<i64>,
    Json(body): Json<UpdateCategoryDTO>,
) -> Result<Json<Category>, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    body.validate()?;
    Ok(Json(state.category.update(&category_id, &body).await?))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(category_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    state.category.delete(&category_id).await?;
    info!("Category {} deleted", category_id);
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_medicines(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MedicineQuery>,
) -> Result<Json<Vec<Medicine>>, AppError> {
    let medicines = state.medicine.find_many(&query).await?;
    debug!("Found {} medicines", medicines.len());
    Ok(Json(medicines))
}

#[instrument(skip(state))]
pub async fn get_medicine(
    State(state): State<Arc<AppState>>,
    Path(medicine_id): Path<i64>,
) -> Result<Json<Medicine>, AppError> {
    let medicine = state
        .medicine
        .read(&medicine_id)
        .await?
        .ok_or_else(|| AppError::not_found("Medicine not found"))?;
    Ok(Json(medicine))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, name = %body.name))]
pub async fn create_medicine(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateMedicineDTO>,
) -> Result<(StatusCode, Json<Medicine>), AppError> {
    require_role(&current_user, &[Role::Admin])?;
    body.validate()?;
    ensure_category_exists(&state, body.category_id).await?;

    let medicine = state.medicine.create(&body).await?;
    info!("Medicine {} added", medicine.medicine_id);
    Ok((StatusCode::CREATED, Json(medicine)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_medicine(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(medicine_id): Path<i64>,
    Json(body): Json<UpdateMedicineDTO>,
) -> Result<Json<Medicine>, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    body.validate()?;
    ensure_category_exists(&state, body.category_id).await?;
    Ok(Json(state.medicine.update(&medicine_id, &body).await?))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_medicine(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(medicine_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    state.medicine.delete(&medicine_id).await?;
    info!("Medicine {} deleted", medicine_id);
    Ok(StatusCode::NO_CONTENT)
}
