//! Integration tests for doctors and their schedules
//!
//! - GET/POST /doctors, GET/PUT/DELETE /doctors/{doctor_id}
//! - GET /doctors/{doctor_id}/availability, PUT /doctors/me/availability
//! - GET /doctors/{doctor_id}/slots

mod common;

#[cfg(test)]
mod doctor_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use ayurweda_server::entities::Role;
    use chrono::{Datelike, Duration, NaiveDate, Utc};
    use serde_json::json;
    use sqlx::SqlitePool;

    /// A Monday at least a week ahead, so every slot on it is in the future
    fn upcoming_monday() -> NaiveDate {
        let today = Utc::now().date_naive();
        let ahead = 7 - today.weekday().num_days_from_monday() as i64;
        today + Duration::days(ahead + 7)
    }

    #[sqlx::test]
    async fn test_admin_creates_doctor(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (_, admin_token) = login_as(&state, "Admin", "admin@example.com", Role::Admin).await;

        let response = server
            .post("/doctors")
            .add_header(auth_header(), admin_token)
            .json(&json!({
                "name": "Dr. Lakshmi Nair",
                "email": "nair@example.com",
                "password": "Password123",
                "specialization": "Panchakarma",
                "qualification": "MD (Ayu)",
                "experience_years": 12,
                "consultation_fee_cents": 200000
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let doctor: serde_json::Value = response.json();
        assert_eq!(doctor["name"], "Dr. Lakshmi Nair");
        assert_eq!(doctor["specialization"], "Panchakarma");

        // the new account can log in straight away
        let login = server
            .post("/auth/login")
            .json(&json!({"email": "nair@example.com", "password": "Password123"}))
            .await;
        login.assert_status_ok();
        assert_eq!(login.json::<serde_json::Value>()["role"], "doctor");
        Ok(())
    }

    #[sqlx::test]
    async fn test_only_admin_creates_doctors(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (_, token) = login_as(&state, "Asha", "asha@example.com", Role::Patient).await;

        server
            .post("/doctors")
            .add_header(auth_header(), token)
            .json(&json!({
                "name": "Dr. Fake",
                "email": "fake@example.com",
                "password": "Password123",
                "specialization": "Anything",
                "qualification": "None",
                "experience_years": 1,
                "consultation_fee_cents": 0
            }))
            .await
            .assert_status_forbidden();

        server
            .post("/doctors")
            .json(&json!({}))
            .await
            .assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test]
    async fn test_public_directory_with_filters(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let nair = create_user(&state, "Dr. Lakshmi Nair", "nair@example.com", Role::Doctor).await;
        create_user(&state, "Dr. Suresh Iyer", "iyer@example.com", Role::Doctor).await;

        let all: Vec<serde_json::Value> = server.get("/doctors").await.json();
        assert_eq!(all.len(), 2);

        let found: Vec<serde_json::Value> = server
            .get("/doctors")
            .add_query_param("search", "nair")
            .await
            .json();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["email"], "nair@example.com");

        let doctor_id = doctor_id_of(&state, &nair).await;
        let one: serde_json::Value = server.get(&format!("/doctors/{}", doctor_id)).await.json();
        assert_eq!(one["name"], "Dr. Lakshmi Nair");

        server.get("/doctors/9999").await.assert_status_not_found();
        Ok(())
    }

    #[sqlx::test]
    async fn test_doctor_edits_only_own_profile(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (nair, nair_token) =
            login_as(&state, "Dr. Nair", "nair@example.com", Role::Doctor).await;
        let iyer = create_user(&state, "Dr. Iyer", "iyer@example.com", Role::Doctor).await;

        let response = server
            .put(&format!("/doctors/{}", doctor_id_of(&state, &nair).await))
            .add_header(auth_header(), nair_token.clone())
            .json(&json!({"bio": "Twenty years of Panchakarma"}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["bio"], "Twenty years of Panchakarma");

        server
            .put(&format!("/doctors/{}", doctor_id_of(&state, &iyer).await))
            .add_header(auth_header(), nair_token)
            .json(&json!({"bio": "hijacked"}))
            .await
            .assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test]
    async fn test_admin_deletes_doctor_and_account(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (_, admin_token) = login_as(&state, "Admin", "admin@example.com", Role::Admin).await;
        let nair = create_user(&state, "Dr. Nair", "nair@example.com", Role::Doctor).await;
        let doctor_id = doctor_id_of(&state, &nair).await;

        server
            .delete(&format!("/doctors/{}", doctor_id))
            .add_header(auth_header(), admin_token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server.get(&format!("/doctors/{}", doctor_id)).await.assert_status_not_found();
        assert!(state.user.find_by_email("nair@example.com").await?.is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn test_replace_availability(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (nair, token) = login_as(&state, "Dr. Nair", "nair@example.com", Role::Doctor).await;
        let doctor_id = doctor_id_of(&state, &nair).await;

        let response = server
            .put("/doctors/me/availability")
            .add_header(auth_header(), token.clone())
            .json(&json!({"windows": [
                {"weekday": 0, "start_time": "09:00:00", "end_time": "12:00:00"},
                {"weekday": 2, "start_time": "14:00:00", "end_time": "17:00:00"}
            ]}))
            .await;
        response.assert_status_ok();

        // a second call replaces, not appends
        server
            .put("/doctors/me/availability")
            .add_header(auth_header(), token)
            .json(&json!({"windows": [
                {"weekday": 4, "start_time": "10:00:00", "end_time": "13:00:00"}
            ]}))
            .await
            .assert_status_ok();

        let windows: Vec<serde_json::Value> = server
            .get(&format!("/doctors/{}/availability", doctor_id))
            .await
            .json();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0]["weekday"], 4);
        assert_eq!(windows[0]["start_time"], "10:00:00");
        Ok(())
    }

    #[sqlx::test]
    async fn test_overlapping_availability_is_rejected(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (_, token) = login_as(&state, "Dr. Nair", "nair@example.com", Role::Doctor).await;

        server
            .put("/doctors/me/availability")
            .add_header(auth_header(), token.clone())
            .json(&json!({"windows": [
                {"weekday": 0, "start_time": "09:00:00", "end_time": "12:00:00"},
                {"weekday": 0, "start_time": "11:00:00", "end_time": "13:00:00"}
            ]}))
            .await
            .assert_status_bad_request();

        server
            .put("/doctors/me/availability")
            .add_header(auth_header(), token)
            .json(&json!({"windows": [
                {"weekday": 0, "start_time": "12:00:00", "end_time": "09:00:00"}
            ]}))
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test]
    async fn test_patients_cannot_set_availability(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (_, token) = login_as(&state, "Asha", "asha@example.com", Role::Patient).await;

        server
            .put("/doctors/me/availability")
            .add_header(auth_header(), token)
            .json(&json!({"windows": []}))
            .await
            .assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test]
    async fn test_slots_exclude_booked_times(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (nair, doctor_token) =
            login_as(&state, "Dr. Nair", "nair@example.com", Role::Doctor).await;
        let (_, patient_token) = login_as(&state, "Asha", "asha@example.com", Role::Patient).await;
        let doctor_id = doctor_id_of(&state, &nair).await;
        let monday = upcoming_monday();

        server
            .put("/doctors/me/availability")
            .add_header(auth_header(), doctor_token)
            .json(&json!({"windows": [
                {"weekday": 0, "start_time": "09:00:00", "end_time": "11:00:00"}
            ]}))
            .await
            .assert_status_ok();

        let slots: Vec<String> = server
            .get(&format!("/doctors/{}/slots", doctor_id))
            .add_query_param("date", monday.to_string())
            .await
            .json();
        assert_eq!(
            slots,
            vec![
                format!("{}T09:00:00Z", monday),
                format!("{}T09:30:00Z", monday),
                format!("{}T10:00:00Z", monday),
                format!("{}T10:30:00Z", monday),
            ]
        );

        server
            .post("/appointments")
            .add_header(auth_header(), patient_token)
            .json(&json!({
                "doctor_id": doctor_id,
                "scheduled_at": format!("{}T09:30:00Z", monday)
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let slots: Vec<String> = server
            .get(&format!("/doctors/{}/slots", doctor_id))
            .add_query_param("date", monday.to_string())
            .await
            .json();
        assert_eq!(
            slots,
            vec![
                format!("{}T09:00:00Z", monday),
                format!("{}T10:00:00Z", monday),
                format!("{}T10:30:00Z", monday),
            ]
        );

        // Tuesday has no window
        let tuesday: Vec<String> = server
            .get(&format!("/doctors/{}/slots", doctor_id))
            .add_query_param("date", (monday + Duration::days(1)).to_string())
            .await
            .json();
        assert!(tuesday.is_empty());
        Ok(())
    }
}
