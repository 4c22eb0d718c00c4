//! Integration tests for direct messaging
//!
//! - POST/GET /conversations
//! - GET/POST /conversations/{conversation_id}/messages

mod common;

#[cfg(test)]
mod conversation_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use ayurweda_server::entities::Role;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn test_start_conversation_is_idempotent(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (asha, asha_token) = login_as(&state, "Asha", "asha@example.com", Role::Patient).await;
        let (nair, nair_token) =
            login_as(&state, "Dr. Nair", "nair@example.com", Role::Doctor).await;

        let response = server
            .post("/conversations")
            .add_header(auth_header(), asha_token)
            .json(&json!({"participant_id": nair.user_id}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let first: Value = response.json();
        assert_eq!(first["participant_name"], "Dr. Nair");
        assert!(first["last_message"].is_null());

        // the other side opening it finds the same conversation
        let response = server
            .post("/conversations")
            .add_header(auth_header(), nair_token)
            .json(&json!({"participant_id": asha.user_id}))
            .await;
        response.assert_status_ok();
        let second: Value = response.json();
        assert_eq!(second["conversation_id"], first["conversation_id"]);
        assert_eq!(second["participant_name"], "Asha");
        Ok(())
    }

    #[sqlx::test]
    async fn test_start_conversation_rules(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (asha, token) = login_as(&state, "Asha", "asha@example.com", Role::Patient).await;

        server
            .post("/conversations")
            .add_header(auth_header(), token.clone())
            .json(&json!({"participant_id": asha.user_id}))
            .await
            .assert_status_bad_request();

        server
            .post("/conversations")
            .add_header(auth_header(), token)
            .json(&json!({"participant_id": 9999}))
            .await
            .assert_status_not_found();

        server
            .post("/conversations")
            .json(&json!({"participant_id": 1}))
            .await
            .assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test]
    async fn test_exchange_messages(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (asha, asha_token) = login_as(&state, "Asha", "asha@example.com", Role::Patient).await;
        let (nair, nair_token) =
            login_as(&state, "Dr. Nair", "nair@example.com", Role::Doctor).await;

        let conversation: Value = server
            .post("/conversations")
            .add_header(auth_header(), asha_token.clone())
            .json(&json!({"participant_id": nair.user_id}))
            .await
            .json();
        let messages_url = format!("/conversations/{}/messages", conversation["conversation_id"]);

        let response = server
            .post(&messages_url)
            .add_header(auth_header(), asha_token.clone())
            .json(&json!({"content": "Namaste doctor, is the oil safe for children?"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["sender_id"], asha.user_id);

        server
            .post(&messages_url)
            .add_header(auth_header(), nair_token.clone())
            .json(&json!({"content": "Yes, in small amounts."}))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post(&messages_url)
            .add_header(auth_header(), nair_token.clone())
            .json(&json!({"content": "   "}))
            .await
            .assert_status_bad_request();

        let history: Vec<Value> = server
            .get(&messages_url)
            .add_header(auth_header(), asha_token.clone())
            .await
            .json();
        assert_eq!(history.len(), 2);
        // newest first
        assert_eq!(history[0]["content"], "Yes, in small amounts.");
        assert_eq!(history[0]["sender_id"], nair.user_id);

        let inbox: Vec<Value> = server
            .get("/conversations")
            .add_header(auth_header(), nair_token)
            .await
            .json();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0]["participant_id"], asha.user_id);
        assert_eq!(inbox[0]["last_message"]["content"], "Yes, in small amounts.");
        Ok(())
    }

    #[sqlx::test]
    async fn test_message_history_pages_backwards(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (_, token) = login_as(&state, "Asha", "asha@example.com", Role::Patient).await;
        let nair = create_user(&state, "Dr. Nair", "nair@example.com", Role::Doctor).await;

        let conversation: Value = server
            .post("/conversations")
            .add_header(auth_header(), token.clone())
            .json(&json!({"participant_id": nair.user_id}))
            .await
            .json();
        let messages_url = format!("/conversations/{}/messages", conversation["conversation_id"]);

        for i in 1..=5 {
            server
                .post(&messages_url)
                .add_header(auth_header(), token.clone())
                .json(&json!({"content": format!("message {}", i)}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let page: Vec<Value> = server
            .get(&messages_url)
            .add_header(auth_header(), token.clone())
            .add_query_param("limit", 2)
            .await
            .json();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0]["content"], "message 5");
        assert_eq!(page[1]["content"], "message 4");

        let older: Vec<Value> = server
            .get(&messages_url)
            .add_header(auth_header(), token)
            .add_query_param("limit", 2)
            .add_query_param("before_id", page[1]["message_id"].as_i64().expect("id"))
            .await
            .json();
        assert_eq!(older.len(), 2);
        assert_eq!(older[0]["content"], "message 3");
        assert_eq!(older[1]["content"], "message 2");
        Ok(())
    }

    #[sqlx::test]
    async fn test_outsiders_cannot_read_or_write(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let (_, token) = login_as(&state, "Asha", "asha@example.com", Role::Patient).await;
        let nair = create_user(&state, "Dr. Nair", "nair@example.com", Role::Doctor).await;
        let (_, outsider_token) =
            login_as(&state, "Ravi", "ravi@example.com", Role::Patient).await;

        let conversation: Value = server
            .post("/conversations")
            .add_header(auth_header(), token)
            .json(&json!({"participant_id": nair.user_id}))
            .await
            .json();
        let messages_url = format!("/conversations/{}/messages", conversation["conversation_id"]);

        server
            .get(&messages_url)
            .add_header(auth_header(), outsider_token.clone())
            .await
            .assert_status_forbidden();

        server
            .post(&messages_url)
            .add_header(auth_header(), outsider_token.clone())
            .json(&json!({"content": "let me in"}))
            .await
            .assert_status_forbidden();

        server
            .get("/conversations/9999/messages")
            .add_header(auth_header(), outsider_token)
            .await
            .assert_status_not_found();

        // without a token the authentication layer answers first
        server.get(&messages_url).await.assert_status_forbidden();
        Ok(())
    }
}
