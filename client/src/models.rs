//! Wire types exchanged with the server

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Student,
    Admin,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Ready,
    Delivered,
    Cancelled,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

// ---- accounts ----

#[derive(Serialize, Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub name: String,
    pub role: Role,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct UserFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// ---- doctors and appointments ----

#[derive(Deserialize, Debug, Clone)]
pub struct Doctor {
    pub doctor_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub qualification: String,
    pub experience_years: i64,
    pub consultation_fee_cents: i64,
    pub bio: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AvailabilityWindow {
    /// 0 = Monday ... 6 = Sunday
    pub weekday: i64,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Appointment {
    pub appointment_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

/// Appointment as listed, with both participants' names
#[derive(Deserialize, Debug, Clone)]
pub struct AppointmentDetails {
    pub appointment_id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub doctor_id: i64,
    pub doctor_name: String,
    pub specialization: String,
    pub scheduled_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

// ---- shop ----

#[derive(Deserialize, Debug, Clone)]
pub struct Category {
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Medicine {
    pub medicine_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub image_url: Option<String>,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct MedicineFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct OrderLine {
    pub medicine_id: i64,
    pub quantity: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct OrderItem {
    pub medicine_id: i64,
    pub medicine_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Order summary as returned by the history listing
#[derive(Deserialize, Debug, Clone)]
pub struct Order {
    pub order_id: i64,
    pub user_id: i64,
    pub shipping_address: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Order with its line items
#[derive(Deserialize, Debug, Clone)]
pub struct OrderDetails {
    pub order_id: i64,
    pub user_id: i64,
    pub shipping_address: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

// ---- courses ----

#[derive(Deserialize, Debug, Clone)]
pub struct Course {
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub duration_weeks: i64,
    pub fee_cents: i64,
    pub start_date: Option<NaiveDate>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Application {
    pub application_id: i64,
    pub course_id: i64,
    pub student_id: i64,
    pub statement: Option<String>,
    pub status: ApplicationStatus,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ApplicationDetails {
    pub application_id: i64,
    pub course_id: i64,
    pub course_title: String,
    pub student_id: i64,
    pub student_name: String,
    pub statement: Option<String>,
    pub status: ApplicationStatus,
    pub reviewed_at: Option<DateTime<Utc>>,
}

// ---- messaging ----

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub message_id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Conversation {
    pub conversation_id: i64,
    pub participant_id: i64,
    pub participant_name: String,
    pub last_message: Option<Message>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Health {
    pub status: String,
    pub uptime_secs: u64,
    pub database: String,
}
