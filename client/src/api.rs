//! Typed HTTP client for the Ayurweda REST API

use crate::error::{ClientError, Result};
use crate::models::*;
use crate::session::Session;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Header carrying the session token on every authenticated request
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Shape of every error body the server sends
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Option<Session>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("ayurweda-client/0.1")
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
        })
    }

    /// Resumes a session loaded from a [`crate::SessionStore`]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn logout(&mut self) {
        self.session = None;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.session {
            Some(session) => builder.header(AUTH_TOKEN_HEADER, &session.token),
            None => builder,
        }
    }

    /// Sends the request and turns non-success statuses into [`ClientError::Api`]
    async fn execute(builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(|err| {
            warn!("Request failed: {}", err);
            ClientError::Connect(err)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Request failed").to_string());
        debug!("Server answered {}: {}", status, message);
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
        let response = Self::execute(builder).await?;
        let body = response.bytes().await.map_err(ClientError::Connect)?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn fetch_empty(builder: RequestBuilder) -> Result<()> {
        let response = Self::execute(builder).await?;
        if response.status() != StatusCode::NO_CONTENT {
            debug!("Ignoring body of {} response", response.status());
        }
        Ok(())
    }

    // ---- health ----

    pub async fn health(&self) -> Result<Health> {
        Self::fetch(self.request(Method::GET, "/health")).await
    }

    // ---- accounts ----

    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<User> {
        Self::fetch(self.request(Method::POST, "/auth/register").json(registration)).await
    }

    /// Logs in and keeps the returned session on this client
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, email: &str, password: &str) -> Result<Session> {
        let response: LoginResponse = Self::fetch(
            self.request(Method::POST, "/auth/login")
                .json(&json!({"email": email, "password": password})),
        )
        .await?;

        let session = Session {
            token: response.token,
            user_id: response.user_id,
            name: response.name,
            role: response.role,
        };
        self.session = Some(session.clone());
        Ok(session)
    }

    pub async fn me(&self) -> Result<User> {
        Self::fetch(self.request(Method::GET, "/auth/me")).await
    }

    pub async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>> {
        Self::fetch(self.request(Method::GET, "/users").query(filter)).await
    }

    // ---- doctors ----

    pub async fn list_doctors(&self, search: Option<&str>) -> Result<Vec<Doctor>> {
        let mut builder = self.request(Method::GET, "/doctors");
        if let Some(search) = search {
            builder = builder.query(&[("search", search)]);
        }
        Self::fetch(builder).await
    }

    pub async fn get_doctor(&self, doctor_id: i64) -> Result<Doctor> {
        Self::fetch(self.request(Method::GET, &format!("/doctors/{}", doctor_id))).await
    }

    pub async fn get_availability(&self, doctor_id: i64) -> Result<Vec<AvailabilityWindow>> {
        Self::fetch(self.request(Method::GET, &format!("/doctors/{}/availability", doctor_id))).await
    }

    /// Replaces the logged-in doctor's weekly schedule
    pub async fn set_my_availability(
        &self,
        windows: &[AvailabilityWindow],
    ) -> Result<Vec<AvailabilityWindow>> {
        Self::fetch(
            self.request(Method::PUT, "/doctors/me/availability")
                .json(&json!({"windows": windows})),
        )
        .await
    }

    pub async fn free_slots(&self, doctor_id: i64, date: NaiveDate) -> Result<Vec<DateTime<Utc>>> {
        Self::fetch(
            self.request(Method::GET, &format!("/doctors/{}/slots", doctor_id))
                .query(&[("date", date.to_string())]),
        )
        .await
    }

    // ---- appointments ----

    #[instrument(skip(self, reason))]
    pub async fn book_appointment(
        &self,
        doctor_id: i64,
        scheduled_at: DateTime<Utc>,
        reason: Option<&str>,
    ) -> Result<Appointment> {
        Self::fetch(self.request(Method::POST, "/appointments").json(&json!({
            "doctor_id": doctor_id,
            "scheduled_at": scheduled_at,
            "reason": reason,
        })))
        .await
    }

    pub async fn list_appointments(&self) -> Result<Vec<AppointmentDetails>> {
        Self::fetch(self.request(Method::GET, "/appointments")).await
    }

    pub async fn update_appointment_status(
        &self,
        appointment_id: i64,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        Self::fetch(
            self.request(Method::PUT, &format!("/appointments/{}/status", appointment_id))
                .json(&json!({"status": status})),
        )
        .await
    }

    // ---- shop ----

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        Self::fetch(self.request(Method::GET, "/categories")).await
    }

    pub async fn list_medicines(&self, filter: &MedicineFilter) -> Result<Vec<Medicine>> {
        Self::fetch(self.request(Method::GET, "/medicines").query(filter)).await
    }

    #[instrument(skip(self, items, shipping_address), fields(lines = items.len()))]
    pub async fn place_order(&self, items: &[OrderLine], shipping_address: &str) -> Result<OrderDetails> {
        Self::fetch(self.request(Method::POST, "/orders").json(&json!({
            "items": items,
            "shipping_address": shipping_address,
        })))
        .await
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        Self::fetch(self.request(Method::GET, "/orders")).await
    }

    pub async fn get_order(&self, order_id: i64) -> Result<OrderDetails> {
        Self::fetch(self.request(Method::GET, &format!("/orders/{}", order_id))).await
    }

    pub async fn cancel_order(&self, order_id: i64) -> Result<OrderDetails> {
        Self::fetch(self.request(Method::POST, &format!("/orders/{}/cancel", order_id))).await
    }

    /// Admin only
    pub async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<OrderDetails> {
        Self::fetch(
            self.request(Method::PUT, &format!("/orders/{}/status", order_id))
                .json(&json!({"status": status})),
        )
        .await
    }

    // ---- courses ----

    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        Self::fetch(self.request(Method::GET, "/courses")).await
    }

    pub async fn apply_to_course(&self, course_id: i64, statement: Option<&str>) -> Result<Application> {
        Self::fetch(self.request(Method::POST, "/applications").json(&json!({
            "course_id": course_id,
            "statement": statement,
        })))
        .await
    }

    pub async fn list_applications(&self) -> Result<Vec<ApplicationDetails>> {
        Self::fetch(self.request(Method::GET, "/applications")).await
    }

    pub async fn withdraw_application(&self, application_id: i64) -> Result<()> {
        Self::fetch_empty(self.request(Method::DELETE, &format!("/applications/{}", application_id))).await
    }

    // ---- messaging ----

    /// Opens (or reopens) the conversation with another user
    pub async fn start_conversation(&self, participant_id: i64) -> Result<Conversation> {
        Self::fetch(
            self.request(Method::POST, "/conversations")
                .json(&json!({"participant_id": participant_id})),
        )
        .await
    }

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>> {
        Self::fetch(self.request(Method::GET, "/conversations")).await
    }

    /// Newest first; pass the oldest id seen as `before_id` to page back
    pub async fn messages(
        &self,
        conversation_id: i64,
        before_id: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<Message>> {
        let mut builder =
            self.request(Method::GET, &format!("/conversations/{}/messages", conversation_id));
        if let Some(before_id) = before_id {
            builder = builder.query(&[("before_id", before_id)]);
        }
        if let Some(limit) = limit {
            builder = builder.query(&[("limit", limit)]);
        }
        Self::fetch(builder).await
    }

    pub async fn send_message(&self, conversation_id: i64, content: &str) -> Result<Message> {
        Self::fetch(
            self.request(Method::POST, &format!("/conversations/{}/messages", conversation_id))
                .json(&json!({"content": content})),
        )
        .await
    }
}
