//! Category and medicine DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CategoryDTO {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateCategoryDTO {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateMedicineDTO {
    pub category_id: Option<i64>,

    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_cents: i64,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i64,

    #[validate(url(message = "Image URL is not valid"))]
    pub image_url: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateMedicineDTO {
    pub category_id: Option<i64>,

    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_cents: Option<i64>,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i64>,

    #[validate(url(message = "Image URL is not valid"))]
    pub image_url: Option<String>,
}

/// Filters for `GET /medicines`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MedicineQuery {
    pub category_id: Option<i64>,
    pub search: Option<String>,
    pub in_stock: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl MedicineQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
