use crate::models::AppState;
use axum::Router;

pub mod admin_routes;
pub mod appointment_routes;
pub mod auth_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", auth_routes::router())
        .nest("/api/admin", admin_routes::router())
        .nest("/api", appointment_routes::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::booking::{
        memory_store::MemoryStore, status::StatusWorkflow, BookingEngine,
    };

    // Only exercises paths that are rejected before any query runs.
    fn test_router() -> Router {
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://unused@localhost/unused")
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        router(AppState {
            db,
            session_ttl_hours: 24,
            booking: BookingEngine::new(store.clone(), store.clone()),
            workflow: StatusWorkflow::new(store),
        })
    }

    #[tokio::test]
    async fn booking_without_bearer_token_is_unauthorized() {
        let res = test_router()
            .oneshot(
                Request::post("/api/appointments")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"doctorId":1,"appointmentTime":"2099-06-01T10:00"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "SESSION_EXPIRED");
        assert!(body["timestamp"].is_string());
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn admin_status_update_without_bearer_token_is_unauthorized() {
        let res = test_router()
            .oneshot(
                Request::patch("/api/admin/appointments/1/status")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"status":"CONFIRMED"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    async fn post_register(content_type: &str, body: &'static str) -> (StatusCode, serde_json::Value) {
        let res = test_router()
            .oneshot(
                Request::post("/api/auth/register")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn malformed_bodies_get_the_structured_error_shape() {
        let (status, body) =
            post_register("application/json", r#"{"username":5,"fullName":"Pat","password":"secret1"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["timestamp"].is_string());

        let (status, body) = post_register("application/json", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = post_register("text/plain", r#"{"username":"pat"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let res = test_router()
            .oneshot(Request::get("/api/doctors").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
