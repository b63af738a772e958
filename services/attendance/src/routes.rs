//! Attendance service routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    checkin::check_in,
    enrollment::save_student_embedding,
    error::{ApiError, ApiResult},
    models::{CheckInQuery, CheckInResponse, EmbeddingRequest, SaveEmbeddingResponse},
    repositories::AttendanceStore,
    state::AppState,
};

/// Create the router for the attendance service
pub fn create_router<S: AttendanceStore>(state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check::<S>))
        .route("/api/students/:student_id/embedding", post(save_embedding::<S>))
        .route("/api/attendance/checkin-vec", post(checkin_vec::<S>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Liveness check
pub async fn root() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// Health check endpoint, including store connectivity
pub async fn health_check<S: AttendanceStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let database_up = match state.store.ping().await {
        Ok(up) => up,
        Err(e) => {
            warn!("Health check could not reach the database: {}", e);
            false
        }
    };

    let status = if database_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if database_up { "ok" } else { "degraded" },
            "service": "attendance",
            "database": if database_up { "up" } else { "down" },
        })),
    )
}

/// Save or replace a student's reference embedding
pub async fn save_embedding<S: AttendanceStore>(
    State(state): State<AppState<S>>,
    WithRejection(Path(student_id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<EmbeddingRequest>, ApiError>,
) -> ApiResult<Json<SaveEmbeddingResponse>> {
    let saved =
        save_student_embedding(&state.store, &state.matching, student_id, payload.embedding)
            .await
            .inspect_err(|e| warn!(student_id, "Embedding save rejected: {}", e))?;

    Ok(Json(SaveEmbeddingResponse {
        ok: true,
        student_id: saved.student_id,
        saved_dims: saved.saved_dims,
    }))
}

/// Match a live embedding and record attendance for the session
pub async fn checkin_vec<S: AttendanceStore>(
    State(state): State<AppState<S>>,
    WithRejection(Query(query), _): WithRejection<Query<CheckInQuery>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<EmbeddingRequest>, ApiError>,
) -> ApiResult<Json<CheckInResponse>> {
    let outcome = check_in(
        &state.store,
        &state.matching,
        query.course_id,
        query.session_id,
        payload.embedding,
        Utc::now(),
    )
    .await
    .inspect_err(|e| {
        warn!(
            course_id = query.course_id,
            session_id = query.session_id,
            "Check-in rejected: {}",
            e
        )
    })?;

    Ok(Json(CheckInResponse {
        ok: true,
        matched_student_id: outcome.matched_student_id,
        similarity: outcome.similarity,
        status: outcome.status,
        course_id: outcome.course_id,
        session_id: outcome.session_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::MatchingConfig, models::attendance::Session, repositories::memory::MemoryStore,
    };
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use chrono::Duration;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(store: MemoryStore) -> Router {
        create_router(AppState::new(store, MatchingConfig::default()))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn extract_json(body: Body) -> Value {
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .expect("Should read body");
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    }

    fn student_42_embedding() -> Vec<f64> {
        (0..80).map(|i| ((i % 7) as f64 + 1.0) / 10.0).collect()
    }

    #[tokio::test]
    async fn test_root() {
        let response = app(MemoryStore::new())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(extract_json(response.into_body()).await, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(MemoryStore::new())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["database"], "up");
        assert_eq!(body["service"], "attendance");
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let request = Request::builder()
            .uri("/")
            .header(header::ORIGIN, "https://example.github.io")
            .body(Body::empty())
            .unwrap();

        let response = app(MemoryStore::new()).oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_save_embedding_errors() {
        let store = MemoryStore::new();
        store.add_user(7, "admin");

        let short = app(store.clone())
            .oneshot(post_json(
                "/api/students/7/embedding",
                json!({ "embedding": vec![0.1; 10] }),
            ))
            .await
            .unwrap();
        assert_eq!(short.status(), StatusCode::BAD_REQUEST);
        let body = extract_json(short.into_body()).await;
        assert_eq!(body["ok"], false);
        assert!(body["error"].is_string());

        let wrong_role = app(store.clone())
            .oneshot(post_json(
                "/api/students/7/embedding",
                json!({ "embedding": vec![0.1; 128] }),
            ))
            .await
            .unwrap();
        assert_eq!(wrong_role.status(), StatusCode::BAD_REQUEST);

        let missing = app(store)
            .oneshot(post_json(
                "/api/students/8/embedding",
                json!({ "embedding": vec![0.1; 128] }),
            ))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_embedding_is_bad_request() {
        let store = MemoryStore::new();
        store.add_user(42, "student");

        let response = app(store.clone())
            .oneshot(post_json(
                "/api/students/42/embedding",
                json!({ "embedding": [1.0, "x"] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["ok"], false);
        assert!(body["error"].as_str().unwrap().contains("embedding"));
        assert_eq!(store.embedding_count(), 0);

        let response = app(store.clone())
            .oneshot(post_json(
                "/api/attendance/checkin-vec?course_id=3&session_id=11",
                json!({ "vector": [0.5] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(extract_json(response.into_body()).await["ok"], false);
    }

    #[tokio::test]
    async fn test_bad_query_and_path_are_bad_request() {
        let missing_session = app(MemoryStore::new())
            .oneshot(post_json(
                "/api/attendance/checkin-vec?course_id=3",
                json!({ "embedding": vec![0.5; 128] }),
            ))
            .await
            .unwrap();
        assert_eq!(missing_session.status(), StatusCode::BAD_REQUEST);
        assert_eq!(extract_json(missing_session.into_body()).await["ok"], false);

        let bad_id = app(MemoryStore::new())
            .oneshot(post_json(
                "/api/students/abc/embedding",
                json!({ "embedding": vec![0.5; 128] }),
            ))
            .await
            .unwrap();
        assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
        assert_eq!(extract_json(bad_id.into_body()).await["ok"], false);
    }

    #[tokio::test]
    async fn test_enroll_then_check_in() {
        let store = MemoryStore::new();
        store.add_user(42, "student");
        store.add_user(43, "student");
        store.enroll(3, 42);
        store.enroll(3, 43);
        store.add_session(Session {
            id: 11,
            course_id: 3,
            start_time: Utc::now() - Duration::minutes(2),
            late_after_minutes: Some(15),
        });

        let response = app(store.clone())
            .oneshot(post_json(
                "/api/students/42/embedding",
                json!({ "embedding": student_42_embedding() }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            extract_json(response.into_body()).await,
            json!({ "ok": true, "student_id": 42, "saved_dims": 80 })
        );

        let other: Vec<f64> = (0..80).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let response = app(store.clone())
            .oneshot(post_json(
                "/api/students/43/embedding",
                json!({ "embedding": other }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut live = student_42_embedding();
        live[0] += 0.05;
        let response = app(store.clone())
            .oneshot(post_json(
                "/api/attendance/checkin-vec?course_id=3&session_id=11",
                json!({ "embedding": live }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = extract_json(response.into_body()).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["matched_student_id"], 42);
        assert_eq!(body["status"], "present");
        assert_eq!(body["course_id"], 3);
        assert_eq!(body["session_id"], 11);
        assert!(body["similarity"].as_f64().unwrap() > 0.99);
        assert_eq!(store.attendance_records().len(), 1);
    }

    #[tokio::test]
    async fn test_check_in_wrong_course() {
        let store = MemoryStore::new();
        store.add_session(Session {
            id: 11,
            course_id: 3,
            start_time: Utc::now(),
            late_after_minutes: None,
        });

        let response = app(store)
            .oneshot(post_json(
                "/api/attendance/checkin-vec?course_id=4&session_id=11",
                json!({ "embedding": vec![0.5; 128] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
