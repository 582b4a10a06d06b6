//! # REST API Interface Layer
//!
//! HTTP endpoints under `/api`. Every handler takes the caller's
//! [`Session`](crate::backend::domain::Session) from the identity headers,
//! builds a domain command and maps failures through [`error::ApiError`].
//!
//! Failures answer with `{"error": ..., "detail": ...}`; storage failures
//! read "Error loading data." on reads and "Error saving." on writes.

pub mod account_apis;
pub mod animal_apis;
pub mod error;
pub mod farm_apis;
pub mod health_apis;
pub mod paycheck_apis;
pub mod session;

#[cfg(test)]
mod tests {
    use crate::backend::domain::FixedClock;
    use crate::backend::storage::SqliteDocumentStore;
    use crate::backend::{create_router, AppState};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn setup_test_app() -> Router {
        let store = SqliteDocumentStore::init_test().await.expect("Failed to init test DB");
        let today = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let state = AppState::new(Arc::new(store), Arc::new(FixedClock(today)), "discover");
        create_router(state, "http://localhost:8080")
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Farm, species and one animal owned by `user-1`; returns (species id, animal id)
    async fn seed_herd(app: &Router) -> (String, String) {
        let (status, _) = send(app, "PUT", "/api/farm", Some("user-1"), Some(json!({"farm_name": "Willow Creek"}))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, species) = send(app, "POST", "/api/species", Some("user-1"), Some(json!({"name": "Goat"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let species_id = species["id"].as_str().unwrap().to_string();

        let (status, animal) = send(
            app,
            "POST",
            "/api/animals",
            Some("user-1"),
            Some(json!({"name": "Daisy", "species_id": species_id, "gender": "female"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let animal_id = animal["id"].as_str().unwrap().to_string();

        (species_id, animal_id)
    }

    #[tokio::test]
    async fn test_liveness_probe_needs_no_identity() {
        let app = setup_test_app().await;
        let (status, _) = send(&app, "GET", "/healthz", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let app = setup_test_app().await;
        let (status, body) = send(&app, "GET", "/api/farm", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_farm_round_trip() {
        let app = setup_test_app().await;
        let (_, empty) = send(&app, "GET", "/api/farm", Some("user-1"), None).await;
        assert!(empty["farm"].is_null());

        send(&app, "PUT", "/api/farm", Some("user-1"), Some(json!({"farm_name": "Willow Creek", "location": "VT"}))).await;
        let (status, body) = send(&app, "GET", "/api/farm", Some("user-1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["farm"]["farm_name"], "Willow Creek");
        assert_eq!(body["farm"]["id"], "user-1");
    }

    #[tokio::test]
    async fn test_species_without_farm_is_bad_request() {
        let app = setup_test_app().await;
        let (status, body) = send(&app, "POST", "/api/species", Some("user-1"), Some(json!({"name": "Goat"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No farm found. Please create a farm first.");
    }

    #[tokio::test]
    async fn test_species_delete_by_other_user_is_forbidden() {
        let app = setup_test_app().await;
        let (species_id, _) = seed_herd(&app).await;

        let uri = format!("/api/species/{}", species_id);
        let (status, _) = send(&app, "DELETE", &uri, Some("user-2"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, "DELETE", &uri, Some("user-1"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_unknown_animal_is_not_found() {
        let app = setup_test_app().await;
        let (status, body) = send(&app, "GET", "/api/animals/nope", Some("user-1"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_completing_task_twice_conflicts() {
        let app = setup_test_app().await;
        let (_, animal_id) = seed_herd(&app).await;

        let (status, task) = send(
            &app,
            "POST",
            "/api/health/tasks",
            Some("user-1"),
            Some(json!({"animal_id": animal_id, "event_type": "Vaccination", "is_undated": true})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = format!("/api/health/tasks/{}/complete", task["id"].as_str().unwrap());
        let completion = json!({"completion_date": "2024-01-05", "withdrawal": {"meat": 7}});
        let (status, done) = send(&app, "POST", &uri, Some("user-1"), Some(completion.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["record"]["withdrawal"]["meat"]["end_date"], "2024-01-12");

        let (status, _) = send(&app, "POST", &uri, Some("user-1"), Some(completion)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, dashboard) = send(&app, "GET", "/api/health/dashboard?scope=mine", Some("user-1"), None).await;
        assert_eq!(dashboard["stats"]["in_withdrawal"], 1);
        assert_eq!(dashboard["withdrawals"][0]["days_left"], 7);
    }

    #[tokio::test]
    async fn test_withdrawal_past_calendar_is_bad_request() {
        let app = setup_test_app().await;
        let request = json!({"event_date": "2024-01-01", "withdrawal": {"meat": u32::MAX}});
        let (status, body) = send(&app, "POST", "/api/health/withdrawal", Some("user-1"), Some(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Withdrawal period is out of range");

        let request = json!({"event_date": "2024-01-01", "withdrawal": {"dairy": 3}});
        let (status, body) = send(&app, "POST", "/api/health/withdrawal", Some("user-1"), Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["withdrawal"]["dairy"]["end_date"], "2024-01-04");
    }

    #[tokio::test]
    async fn test_paycheck_preview() {
        let app = setup_test_app().await;
        let form = json!({
            "salary_biweekly": "2000",
            "deductions_pre_tax": [{"name": "401k", "biweekly_amount": "100"}]
        });
        let (status, body) = send(&app, "POST", "/api/paycheck/breakdown", Some("user-1"), Some(form)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["breakdown"]["pre_tax"]["total"]["annual"]["raw"], 2400.0);
    }
}
