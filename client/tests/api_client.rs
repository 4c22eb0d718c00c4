//! Drives a real server on an ephemeral port through `ApiClient`

use ayurweda_client::models::{
    AppointmentStatus, AvailabilityWindow, MedicineFilter, OrderLine, OrderStatus, Registration,
    Role, UserFilter,
};
use ayurweda_client::{ApiClient, ClientError, SessionStore};
use ayurweda_server::core::{AppState, Config};
use ayurweda_server::dtos::{CategoryDTO, CreateMedicineDTO, CreateUserDTO, NewDoctorDTO};
use ayurweda_server::entities::{Role as ServerRole, User};
use ayurweda_server::repositories::Create;
use chrono::{Datelike, Duration, NaiveTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;

const PASSWORD: &str = "Password123";

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "client-test-secret".to_string(),
        jwt_expiry_hours: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        max_connections: 1,
        connection_lifetime_secs: 1800,
        app_env: "test".to_string(),
        bcrypt_cost: 4,
        slot_minutes: 30,
        login_max_failures: 5,
        login_lockout_secs: 60,
        cors_origin: None,
    }
}

/// Starts the full router against a fresh in-memory database
async fn spawn_server() -> (String, Arc<AppState>) {
    // one connection that never expires, otherwise the in-memory database vanishes
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open database");
    ayurweda_server::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let state = Arc::new(AppState::new(pool, &test_config()));
    let app = ayurweda_server::create_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server error");
    });

    (format!("http://{}", addr), state)
}

fn account(name: &str, email: &str, role: ServerRole) -> CreateUserDTO {
    CreateUserDTO {
        name: name.to_string(),
        email: email.to_string(),
        password: User::hash_password(PASSWORD, 4).expect("hash"),
        role,
        phone: None,
    }
}

async fn create_admin(state: &AppState) {
    state
        .user
        .create(&account("Admin", "admin@example.com", ServerRole::Admin))
        .await
        .expect("admin");
}

async fn create_doctor(state: &AppState) -> i64 {
    let (_, doctor) = state
        .doctor
        .create_with_account(
            &account("Dr. Nair", "nair@example.com", ServerRole::Doctor),
            &NewDoctorDTO {
                specialization: "Panchakarma".to_string(),
                qualification: "MD (Ayu)".to_string(),
                experience_years: 12,
                consultation_fee_cents: 200_000,
                bio: None,
            },
        )
        .await
        .expect("doctor");
    doctor.doctor_id
}

async fn registered(base_url: &str, name: &str, email: &str, role: Role) -> ApiClient {
    let mut client = ApiClient::new(base_url).expect("client");
    client
        .register(&Registration {
            name: name.to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            role,
            phone: None,
        })
        .await
        .expect("register");
    client.login(email, PASSWORD).await.expect("login");
    client
}

#[tokio::test]
async fn unreachable_server_is_a_connect_error() {
    let client = ApiClient::new("http://127.0.0.1:1").expect("client");
    let err = client.list_courses().await.unwrap_err();
    assert!(matches!(err, ClientError::Connect(_)));
    assert_eq!(err.to_string(), "Cannot connect to the server");
}

#[tokio::test]
async fn login_session_and_errors() {
    let (base_url, _state) = spawn_server().await;
    let client = registered(&base_url, "Asha", "asha@example.com", Role::Patient).await;

    let me = client.me().await.expect("me");
    assert_eq!(me.email, "asha@example.com");
    assert_eq!(me.role, Role::Patient);

    let session = client.session().cloned().expect("session");
    assert_eq!(session.name, "Asha");

    // the session survives a restart through the store
    let dir = std::env::temp_dir().join(format!("ayurweda-client-test-{}", std::process::id()));
    let store = SessionStore::new(dir.join("session.json"));
    store.save(&session).await.expect("save");
    let restored = store.load().await.expect("load").expect("stored session");
    let resumed = ApiClient::new(&base_url).expect("client").with_session(restored);
    assert_eq!(resumed.me().await.expect("me").user_id, me.user_id);
    store.clear().await.expect("clear");

    // server messages come through unchanged
    let mut anonymous = ApiClient::new(&base_url).expect("client");
    let err = anonymous.login("asha@example.com", "wrong-password").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.to_string(), "Invalid email or password");
    assert!(anonymous.session().is_none());

    let err = anonymous.me().await.unwrap_err();
    assert_eq!(err.status(), Some(403));

    // patients are not admins
    let err = client.list_users(&UserFilter::default()).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn book_an_appointment() {
    let (base_url, state) = spawn_server().await;
    let doctor_id = create_doctor(&state).await;

    let mut doctor = ApiClient::new(&base_url).expect("client");
    doctor.login("nair@example.com", PASSWORD).await.expect("login");
    doctor
        .set_my_availability(&[AvailabilityWindow {
            weekday: 0,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).expect("time"),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).expect("time"),
        }])
        .await
        .expect("availability");

    let patient = registered(&base_url, "Asha", "asha@example.com", Role::Patient).await;
    let doctors = patient.list_doctors(Some("nair")).await.expect("doctors");
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].doctor_id, doctor_id);

    let today = Utc::now().date_naive();
    let monday = today + Duration::days(14 - today.weekday().num_days_from_monday() as i64);
    let slots = patient.free_slots(doctor_id, monday).await.expect("slots");
    assert_eq!(slots.len(), 2);

    let appointment = patient
        .book_appointment(doctor_id, slots[0], Some("Back pain"))
        .await
        .expect("book");
    assert_eq!(appointment.status, AppointmentStatus::Pending);

    let err = patient
        .book_appointment(doctor_id, slots[0], None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));

    let confirmed = doctor
        .update_appointment_status(appointment.appointment_id, AppointmentStatus::Confirmed)
        .await
        .expect("confirm");
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

    let listed = patient.list_appointments().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].doctor_name, "Dr. Nair");
    assert_eq!(listed[0].status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn shop_order_lifecycle() {
    let (base_url, state) = spawn_server().await;
    create_admin(&state).await;
    let category = state
        .category
        .create(&CategoryDTO { name: "Churna".to_string(), description: None })
        .await
        .expect("category");
    let medicine = state
        .medicine
        .create(&CreateMedicineDTO {
            category_id: Some(category.category_id),
            name: "Triphala Churna".to_string(),
            description: None,
            price_cents: 45_000,
            stock: 5,
            image_url: None,
        })
        .await
        .expect("medicine");

    let patient = registered(&base_url, "Asha", "asha@example.com", Role::Patient).await;
    assert_eq!(patient.list_categories().await.expect("categories").len(), 1);
    let in_stock = patient
        .list_medicines(&MedicineFilter { in_stock: Some(true), ..Default::default() })
        .await
        .expect("medicines");
    assert_eq!(in_stock.len(), 1);

    let order = patient
        .place_order(
            &[OrderLine { medicine_id: medicine.medicine_id, quantity: 2 }],
            "12 Lotus Road, Kandy",
        )
        .await
        .expect("order");
    assert_eq!(order.total_cents, 90_000);
    assert_eq!(order.items[0].medicine_name, "Triphala Churna");

    let err = patient
        .place_order(
            &[OrderLine { medicine_id: medicine.medicine_id, quantity: 10 }],
            "12 Lotus Road, Kandy",
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));

    let mut admin = ApiClient::new(&base_url).expect("client");
    admin.login("admin@example.com", PASSWORD).await.expect("login");
    let confirmed = admin
        .update_order_status(order.order_id, OrderStatus::Confirmed)
        .await
        .expect("confirm");
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    // confirmed orders are past the point of self-service cancellation
    let err = patient.cancel_order(order.order_id).await.unwrap_err();
    assert_eq!(err.status(), Some(400));

    let history = patient.list_orders().await.expect("orders");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, OrderStatus::Confirmed);

    let patients = admin
        .list_users(&UserFilter { role: Some(Role::Patient), ..Default::default() })
        .await
        .expect("users");
    assert_eq!(patients.len(), 1);
}

#[tokio::test]
async fn courses_and_messages() {
    let (base_url, state) = spawn_server().await;
    create_doctor(&state).await;
    state
        .course
        .create(&ayurweda_server::dtos::CreateCourseDTO {
            title: "Foundations of Ayurveda".to_string(),
            description: None,
            instructor: Some("Dr. Nair".to_string()),
            duration_weeks: 12,
            fee_cents: 150_000,
            start_date: None,
        })
        .await
        .expect("course");

    let student = registered(&base_url, "Meera", "meera@example.com", Role::Student).await;
    let courses = student.list_courses().await.expect("courses");
    assert_eq!(courses.len(), 1);

    let application = student
        .apply_to_course(courses[0].course_id, Some("I want to learn"))
        .await
        .expect("apply");
    let err = student
        .apply_to_course(courses[0].course_id, None)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert_eq!(student.list_applications().await.expect("list").len(), 1);

    student
        .withdraw_application(application.application_id)
        .await
        .expect("withdraw");
    assert!(student.list_applications().await.expect("list").is_empty());

    // messaging the doctor
    let doctor_user_id = state
        .user
        .find_by_email("nair@example.com")
        .await
        .expect("query")
        .expect("doctor")
        .user_id;
    let conversation = student
        .start_conversation(doctor_user_id)
        .await
        .expect("conversation");
    assert_eq!(conversation.participant_name, "Dr. Nair");

    for text in ["first", "second", "third"] {
        student
            .send_message(conversation.conversation_id, text)
            .await
            .expect("send");
    }

    let latest = student
        .messages(conversation.conversation_id, None, Some(2))
        .await
        .expect("messages");
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].content, "third");

    let older = student
        .messages(conversation.conversation_id, Some(latest[1].message_id), None)
        .await
        .expect("messages");
    assert_eq!(older.len(), 1);
    assert_eq!(older[0].content, "first");

    let inbox = student.list_conversations().await.expect("inbox");
    assert_eq!(inbox.len(), 1);
    assert_eq!(
        inbox[0].last_message.as_ref().map(|m| m.content.as_str()),
        Some("third")
    );
}
