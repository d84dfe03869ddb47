pub mod error;
pub mod volumes;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app_state::AppState;

/// 所有路由（统一入口）
pub fn router(state: AppState) -> Router {
    // 设置CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/gluster", volumes::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::manager::testing::FakeBackend;
    use crate::backends::nfs::testing::ScriptedWorkflow;
    use crate::backends::BackendManager;
    use crate::clients::openshift::testing::FakePlatform;
    use crate::clients::workflow::JobState;
    use crate::extractors::testing::token_for;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use common::{SizePolicy, Technology};
    use std::sync::Arc;
    use tower::ServiceExt;

    const JWT_SECRET: &str = "jwt-secret";

    fn app() -> Router {
        let mut backends = BackendManager::new();
        backends.register(Arc::new(FakeBackend::new(Technology::Gluster)));
        backends.register(Arc::new(FakeBackend::new(Technology::Nfs)));

        router(AppState::new(
            backends,
            Arc::new(FakePlatform::with_admin("alice")),
            Arc::new(ScriptedWorkflow::new(&[JobState::Completed], None)),
            SizePolicy::new(100).unwrap(),
            vec!["10.0.0.1".to_string()],
            JWT_SECRET,
        ))
    }

    fn post(uri: &str, user: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", token_for(user, JWT_SECRET)),
            )
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_as(uri: &str, user: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", token_for(user, JWT_SECRET)),
            )
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/gluster/volume/fix")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"project":"team"}"#))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_gluster_volume() {
        let body = serde_json::json!({
            "project": "team",
            "size": "1G",
            "pvcName": "data",
            "mode": "ReadWriteMany",
            "technology": "gluster"
        });

        let response = app()
            .oneshot(post("/api/gluster/volume", "alice", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["pvName"], "gl-team-pv1");
        assert!(json["message"].as_str().unwrap().starts_with("The volume was created"));
    }

    #[tokio::test]
    async fn test_create_with_missing_fields() {
        let body = serde_json::json!({"project": "team", "technology": "nfs"});

        let response = app()
            .oneshot(post("/api/gluster/volume", "alice", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Not all fields are filled in");
    }

    #[tokio::test]
    async fn test_grow_denied_for_non_admin() {
        let body = serde_json::json!({
            "project": "team",
            "newSize": "2G",
            "pvName": "gl-team-pv1"
        });

        let response = app()
            .oneshot(post("/api/gluster/volume/grow", "bob", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert!(json["message"].as_str().unwrap().ends_with("alice"));
    }

    #[tokio::test]
    async fn test_grow_with_unknown_technology() {
        let body = serde_json::json!({
            "project": "team",
            "newSize": "2G",
            "pvName": "gl-team-pv1",
            "technology": "ceph"
        });

        let response = app()
            .oneshot(post("/api/gluster/volume/grow", "alice", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["message"],
            "Invalid technology. Must be either nfs or gluster"
        );
    }

    #[tokio::test]
    async fn test_fix_volume() {
        let response = app()
            .oneshot(post(
                "/api/gluster/volume/fix",
                "alice",
                serde_json::json!({"project": "team"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["message"],
            "The gluster objects were created in your project."
        );
    }

    #[tokio::test]
    async fn test_job_status() {
        let response = app()
            .oneshot(get_as("/api/gluster/volume/job/12", "alice"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["jobId"], 12);
        assert_eq!(json["status"], "COMPLETED");
        assert_eq!(json["progress"], 0.0);

        let response = app()
            .oneshot(get_as("/api/gluster/volume/job/abc", "alice"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
