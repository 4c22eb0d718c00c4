//! Services module - HTTP handlers grouped by resource
//!
//! Handlers take the shared state, the authenticated user from request
//! extensions where the route is guarded, and return `Result<_, AppError>`.

pub mod admin;
pub mod appointment;
pub mod auth;
pub mod catalog;
pub mod conversation;
pub mod course;
pub mod doctor;
pub mod order;
pub mod prescription;
pub mod profile;
pub mod schedule;
pub mod user;

pub use admin::get_stats;
pub use appointment::{
    book_appointment, delete_appointment, get_appointment, list_appointments,
    update_appointment_notes, update_appointment_status,
};
pub use auth::{get_me, login_user, register_user};
pub use catalog::{
    create_category, create_medicine, delete_category, delete_medicine, get_category, get_medicine,
    list_categories, list_medicines, update_category, update_medicine,
};
pub use conversation::{get_messages, list_conversations, send_message, start_conversation};
pub use course::{
    apply_to_course, create_course, delete_course, get_course, list_applications, list_courses,
    review_application, update_course, withdraw_application,
};
pub use doctor::{
    create_doctor, delete_doctor, get_availability, get_doctor, get_slots, list_doctors,
    replace_my_availability, update_doctor,
};
pub use order::{cancel_order, get_order, list_orders, place_order, update_order_status};
pub use prescription::{create_prescription, get_prescription, list_prescriptions};
pub use profile::{
    get_my_patient_profile, get_my_student_profile, get_patient, list_patients, list_students,
    update_my_patient_profile, update_my_student_profile,
};
pub use user::{change_password, delete_user, get_user_by_id, list_users, update_me, update_user};

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::warn;

/// Root endpoint
pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, "Ayurweda server is running")
}

#[derive(Serialize, Debug)]
pub struct HealthDTO {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub memory_mb: f64,
    pub database: &'static str,
}

/// Resident memory of this process in megabytes
fn process_memory_mb() -> f64 {
    let mut sys = System::new();
    let pid = Pid::from_u32(std::process::id());
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid)
        .map(|p| p.memory() as f64 / (1024.0 * 1024.0))
        .unwrap_or(0.0)
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    if !database_ok {
        warn!("Health check: database unavailable");
    }

    let body = HealthDTO {
        status: if database_ok { "ok" } else { "degraded" },
        uptime_secs: state.started_at.elapsed().as_secs(),
        memory_mb: (process_memory_mb() * 100.0).round() / 100.0,
        database: if database_ok { "ok" } else { "unavailable" },
    };
    let code = if database_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(body))
}
