//! Ayurweda server library - exposes the router and modules for the binaries and tests

pub mod core;
pub mod dtos;
pub mod entities;
pub mod repositories;
pub mod services;

pub use core::{AppError, AppState, auth, config};

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;

/// Embedded schema migrations, run at startup and by `#[sqlx::test]`
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Builds the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    use services::{health, root};

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/auth", configure_auth_routes(state.clone()))
        .nest("/users", configure_user_routes(state.clone()))
        .nest("/doctors", configure_doctor_routes(state.clone()))
        .nest("/patients", configure_patient_routes(state.clone()))
        .nest("/students", configure_student_routes(state.clone()))
        .nest("/appointments", configure_appointment_routes(state.clone()))
        .nest("/prescriptions", configure_prescription_routes(state.clone()))
        .nest("/categories", configure_category_routes(state.clone()))
        .nest("/medicines", configure_medicine_routes(state.clone()))
        .nest("/orders", configure_order_routes(state.clone()))
        .nest("/courses", configure_course_routes(state.clone()))
        .nest("/applications", configure_application_routes(state.clone()))
        .nest("/conversations", configure_conversation_routes(state.clone()))
        .nest("/admin", configure_admin_routes(state.clone()))
        .with_state(state)
}

/// Wraps every route of `router` with the authentication middleware
fn authenticated(router: Router<Arc<AppState>>, state: Arc<AppState>) -> Router<Arc<AppState>> {
    router.route_layer(middleware::from_fn_with_state(
        state,
        core::authentication_middleware,
    ))
}

fn configure_auth_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use services::*;

    let public_routes = Router::new()
        .route("/login", post(login_user))
        .route("/register", post(register_user));

    let private_routes = authenticated(Router::new().route("/me", get(get_me)), state);

    public_routes.merge(private_routes)
}

fn configure_user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use services::*;

    authenticated(
        Router::new()
            .route("/", get(list_users))
            .route("/me", put(update_me))
            .route("/me/password", put(change_password))
            .route(
                "/{user_id}",
                get(get_user_by_id).put(update_user).delete(delete_user),
            ),
        state,
    )
}

fn configure_doctor_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use services::*;

    // Directory and schedules are open to visitors
    let public_routes = Router::new()
        .route("/", get(list_doctors))
        .route("/{doctor_id}", get(get_doctor))
        .route("/{doctor_id}/availability", get(get_availability))
        .route("/{doctor_id}/slots", get(get_slots));

    let private_routes = authenticated(
        Router::new()
            .route("/", post(create_doctor))
            .route("/{doctor_id}", put(update_doctor).delete(delete_doctor))
            .route("/me/availability", put(replace_my_availability)),
        state,
    );

    public_routes.merge(private_routes)
}

fn configure_patient_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use services::*;

    authenticated(
        Router::new()
            .route("/", get(list_patients))
            .route(
                "/me",
                get(get_my_patient_profile).put(update_my_patient_profile),
            )
            .route("/{patient_id}", get(get_patient)),
        state,
    )
}

fn configure_student_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use services::*;

    authenticated(
        Router::new()
            .route("/", get(list_students))
            .route(
                "/me",
                get(get_my_student_profile).put(update_my_student_profile),
            ),
        state,
    )
}

fn configure_appointment_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use services::*;

    authenticated(
        Router::new()
            .route("/", get(list_appointments).post(book_appointment))
            .route(
                "/{appointment_id}",
                get(get_appointment).delete(delete_appointment),
            )
            .route("/{appointment_id}/status", put(update_appointment_status))
            .route("/{appointment_id}/notes", put(update_appointment_notes)),
        state,
    )
}

fn configure_prescription_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use services::*;

    authenticated(
        Router::new()
            .route("/", get(list_prescriptions).post(create_prescription))
            .route("/{prescription_id}", get(get_prescription)),
        state,
    )
}

fn configure_category_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use services::*;

    let public_routes = Router::new()
        .route("/", get(list_categories))
        .route("/{category_id}", get(get_category));

    let admin_routes = authenticated(
        Router::new()
            .route("/", post(create_category))
            .route(
                "/{category_id}",
                put(update_category).delete(delete_category),
            ),
        state,
    );

    public_routes.merge(admin_routes)
}

fn configure_medicine_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use services::*;

    let public_routes = Router::new()
        .route("/", get(list_medicines))
        .route("/{medicine_id}", get(get_medicine));

    let admin_routes = authenticated(
        Router::new()
            .route("/", post(create_medicine))
            .route(
                "/{medicine_id}",
                put(update_medicine).delete(delete_medicine),
            ),
        state,
    );

    public_routes.merge(admin_routes)
}

fn configure_order_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use services::*;

    authenticated(
        Router::new()
            .route("/", get(list_orders).post(place_order))
            .route("/{order_id}", get(get_order))
            .route("/{order_id}/status", put(update_order_status))
            .route("/{order_id}/cancel", post(cancel_order)),
        state,
    )
}

fn configure_course_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use services::*;

    let public_routes = Router::new()
        .route("/", get(list_courses))
        .route("/{course_id}", get(get_course));

    let admin_routes = authenticated(
        Router::new()
            .route("/", post(create_course))
            .route("/{course_id}", put(update_course).delete(delete_course)),
        state,
    );

    public_routes.merge(admin_routes)
}

fn configure_application_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use services::*;

    authenticated(
        Router::new()
            .route("/", get(list_applications).post(apply_to_course))
            .route("/{application_id}", delete(withdraw_application))
            .route("/{application_id}/status", put(review_application)),
        state,
    )
}

fn configure_conversation_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::{authentication_middleware, conversation_participant_middleware};
    use services::*;

    // Routes that only need a logged-in user
    let user_routes = authenticated(
        Router::new().route("/", get(list_conversations).post(start_conversation)),
        state.clone(),
    );

    // Routes that also need the user to take part in the conversation
    let participant_routes = Router::new()
        .route(
            "/{conversation_id}/messages",
            get(get_messages).post(send_message),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            conversation_participant_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    user_routes.merge(participant_routes)
}

fn configure_admin_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use services::*;

    authenticated(Router::new().route("/stats", get(get_stats)), state)
}
