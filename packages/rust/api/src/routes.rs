//! Synchronous HTTP API over the registry service.
//!
//! Endpoint shapes mirror the other ingress channels: descriptors in,
//! `FileRecord`s out, with validation failures as 422 and unknown ids as 404.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use scriptwatch_registry::Registry;
use scriptwatch_shared::{FileDescriptor, FileId, FileRecord, ScriptwatchError};

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/js-files", get(list_files).post(add_files))
        .route("/js-files/:id/fetch-content", put(fetch_content))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AddParams {
    /// Refresh each created record before returning it.
    #[serde(default)]
    fetch_content: bool,
}

async fn add_files(
    State(state): State<AppState>,
    Query(params): Query<AddParams>,
    Json(descriptors): Json<Vec<FileDescriptor>>,
) -> Result<impl IntoResponse, ApiError> {
    let mut records = state.registry.add_files(&descriptors).await?;

    if params.fetch_content {
        let mut refreshed = Vec::with_capacity(records.len());
        for record in records {
            refreshed.push(state.registry.refresh_content(&record.id).await?.record);
        }
        records = refreshed;
    }

    Ok((StatusCode::CREATED, Json(records)))
}

async fn fetch_content(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FileRecord>, ApiError> {
    let outcome = state.registry.refresh_content(&FileId(id)).await?;
    Ok(Json(outcome.record))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    company_id: Option<Uuid>,
    /// Refresh each record before returning it.
    #[serde(default)]
    fetch_content: bool,
}

async fn list_files(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<FileRecord>>, ApiError> {
    let records = match params.company_id {
        Some(company_id) => {
            state
                .registry
                .list_by_company(&company_id, params.fetch_content)
                .await?
        }
        None => state.registry.list_all(params.fetch_content).await?,
    };
    Ok(Json(records))
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Service error carried to the HTTP boundary.
struct ApiError(ScriptwatchError);

impl From<ScriptwatchError> for ApiError {
    fn from(e: ScriptwatchError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            ScriptwatchError::Validation { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.0.to_string())
            }
            ScriptwatchError::NotFound { .. } => (StatusCode::NOT_FOUND, self.0.to_string()),
            _ => {
                error!(error = %self.0, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use scriptwatch_fetcher::Fetcher;
    use scriptwatch_shared::FetchConfig;
    use scriptwatch_storage::Storage;
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let tmp = std::env::temp_dir().join(format!("sw_api_test_{}.db", Uuid::now_v7()));
        let storage = Storage::open(&tmp).await.expect("open test db");
        let fetcher = Fetcher::new(&FetchConfig {
            timeout_secs: 2,
            max_redirects: 5,
        })
        .expect("build fetcher");
        router(AppState {
            registry: Arc::new(Registry::new(Arc::new(storage), fetcher)),
        })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("parse body")
    }

    fn post_files(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/js-files")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn add_returns_created_records() {
        let app = test_router().await;
        let company = Uuid::now_v7();

        let response = app
            .oneshot(post_files(serde_json::json!([
                { "url": "http://x.com/a.js", "priority": 3, "company_id": company }
            ])))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let records = body.as_array().expect("array");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["host"], "x.com");
        assert!(records[0]["content"].is_null());
    }

    #[tokio::test]
    async fn invalid_descriptor_maps_to_422() {
        let app = test_router().await;

        let response = app
            .oneshot(post_files(serde_json::json!([
                { "url": "http://x.com/a.js", "priority": 9, "company_id": Uuid::now_v7() }
            ])))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert!(body["detail"].as_str().unwrap().contains("priority"));
    }

    #[tokio::test]
    async fn refresh_unknown_id_maps_to_404() {
        let app = test_router().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/js-files/{}/fetch-content", Uuid::now_v7()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_filters_by_company() {
        let app = test_router().await;
        let company_a = Uuid::now_v7();
        let company_b = Uuid::now_v7();

        app.clone()
            .oneshot(post_files(serde_json::json!([
                { "url": "http://x.com/a.js", "priority": 1, "company_id": company_a },
                { "url": "http://x.com/b.js", "priority": 2, "company_id": company_b }
            ])))
            .await
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/js-files?company_id={company_a}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let records = body.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["company_id"], company_a.to_string());
    }

    #[tokio::test]
    async fn add_with_fetch_content_refreshes_created_records() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string("boot()"))
            .mount(&server)
            .await;

        let app = test_router().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/js-files?fetch_content=true")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!([{
                            "url": format!("{}/app.js", server.uri()),
                            "priority": 2,
                            "company_id": Uuid::now_v7()
                        }])
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body[0]["content"], "boot()");
        assert!(!body[0]["last_fetched"].is_null());
    }
}
