//! Axum server setup
//!
//! Server skeleton with:
//! - CORS for the configured web client origins
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::Router;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::uploads::{ImageStore, UploadError};

/// Origin of the web client during development
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Default request body limit (16MB), sized for image uploads
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    pub bind_addr: SocketAddr,

    /// Root of the static mount; uploads land in `<resources_dir>/images`
    pub resources_dir: PathBuf,

    /// Origins allowed to make credentialed cross-origin requests
    pub cors_origins: Vec<String>,

    /// Allow permissive CORS (default: false = `cors_origins` only)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,

    /// Request body limit in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            resources_dir: PathBuf::from("resources"),
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            cors_permissive: false,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub images: ImageStore,
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: AppState, config: &ServerConfig) -> Result<Router, ServerError> {
    let cors = cors_layer(config)?;

    Ok(Router::new()
        .merge(routes::health::router())
        .merge(routes::diary::router())
        .merge(routes::upload::router())
        .merge(routes::resources::router(state.images.resources_dir()))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state)))
}

fn cors_layer(config: &ServerConfig) -> Result<CorsLayer, ServerError> {
    if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        return Ok(CorsLayer::permissive());
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ServerError::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Credentials forbid wildcards, so methods and headers mirror the request
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&database_url).await?;
/// migrations::run(&pool).await?;
/// run_server(pool, ServerConfig::default()).await?;
/// ```
pub async fn run_server(pool: SqlitePool, config: ServerConfig) -> Result<(), ServerError> {
    let images = ImageStore::new(&config.resources_dir);
    images.ensure_dirs().await?;
    tracing::info!(resources = %config.resources_dir.display(), "Resources directory ready");

    let state = AppState { pool, images };
    let app = build_router(state, &config)?;

    // Bind listener
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("invalid CORS origin: {0}")]
    InvalidOrigin(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    use crate::db::testing::memory_pool;
    use crate::http::routes::diary::{CommentResponse, DiaryResponse};
    use crate::http::routes::health::HealthResponse;
    use crate::http::routes::upload::UploadResponse;

    struct TestApp {
        router: Router,
        pool: SqlitePool,
        resources: tempfile::TempDir,
    }

    async fn test_app() -> TestApp {
        test_app_with(|_| {}).await
    }

    async fn test_app_with(configure: impl FnOnce(&mut ServerConfig)) -> TestApp {
        let pool = memory_pool().await;
        let resources = tempfile::tempdir().unwrap();
        let images = ImageStore::new(resources.path());
        images.ensure_dirs().await.unwrap();

        let mut config = ServerConfig {
            resources_dir: resources.path().to_path_buf(),
            ..ServerConfig::default()
        };
        configure(&mut config);
        let state = AppState {
            pool: pool.clone(),
            images,
        };

        TestApp {
            router: build_router(state, &config).unwrap(),
            pool,
            resources,
        }
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_upload(field: &str, file_name: &str, data: &[u8]) -> Request<Body> {
        let boundary = "diaryswap-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/upload/image")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173".to_string()]);
        assert!(!config.cors_permissive);
    }

    #[test]
    fn rejects_unparseable_origin() {
        let config = ServerConfig {
            cors_origins: vec!["http://bad\norigin".into()],
            ..ServerConfig::default()
        };
        assert!(matches!(cors_layer(&config), Err(ServerError::InvalidOrigin(_))));
    }

    #[tokio::test]
    async fn health_reports_database() {
        let app = test_app().await;

        let response = app
            .router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: HealthResponse = read_json(response).await;
        assert_eq!(body.status, "ok");
        assert!(body.database);
    }

    #[tokio::test]
    async fn first_exchange_is_404_and_stores_diary() {
        let app = test_app().await;

        let response = app
            .router
            .oneshot(post_json(
                "/diary/exchange",
                serde_json::json!({"author": "alice", "content": "<p>hello</p>"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["error"], "exchange_pool_empty");
        assert_eq!(count(&app.pool, "diary").await, 1);
    }

    #[tokio::test]
    async fn exchange_returns_other_diary_with_comments() {
        let app = test_app().await;

        // Seed: alice's diary plus a comment on it
        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/diary/exchange",
                serde_json::json!({"author": "alice", "content": "first"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/diary/add-comments",
                serde_json::json!({"author": "bob", "content": "nice", "diary_id": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let comment: CommentResponse = read_json(response).await;
        assert_eq!(comment.author, "bob");

        // Bob's submission gets alice's diary back
        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/diary/exchange",
                serde_json::json!({"author": "bob", "content": "second"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let diary: DiaryResponse = read_json(response).await;
        assert_eq!(diary.id, 1);
        assert_eq!(diary.author, "alice");
        assert_eq!(diary.comments.len(), 1);
        assert_eq!(diary.comments[0].id, comment.id);
        assert_eq!(count(&app.pool, "diary").await, 2);
    }

    #[tokio::test]
    async fn comment_on_unknown_diary_is_404() {
        let app = test_app().await;

        let response = app
            .router
            .oneshot(post_json(
                "/diary/add-comments/",
                serde_json::json!({"author": "bob", "content": "hi", "diary_id": 99}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(count(&app.pool, "comment").await, 0);
    }

    #[tokio::test]
    async fn blank_author_is_400() {
        let app = test_app().await;

        let response = app
            .router
            .oneshot(post_json(
                "/diary/exchange",
                serde_json::json!({"author": "  ", "content": "text"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(count(&app.pool, "diary").await, 0);
    }

    #[tokio::test]
    async fn oversized_diary_is_400_and_stores_nothing() {
        let app = test_app().await;

        let response = app
            .router
            .oneshot(post_json(
                "/diary/exchange",
                serde_json::json!({"author": "alice", "content": "a".repeat(256 * 1024 + 1)}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(count(&app.pool, "diary").await, 0);
    }

    #[tokio::test]
    async fn rejected_bodies_still_get_json_errors() {
        let app = test_app().await;

        // Missing field
        let response = app
            .router
            .clone()
            .oneshot(post_json("/diary/exchange", serde_json::json!({"content": "x"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert!(body["message"].as_str().unwrap().contains("author"));

        // Wrong type
        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/diary/add-comments",
                serde_json::json!({"author": "bob", "content": "hi", "diary_id": "one"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["error"], "validation_error");

        // Not JSON at all
        let response = app
            .router
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/diary/exchange")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["error"], "bad_request");

        assert_eq!(count(&app.pool, "diary").await, 0);
        assert_eq!(count(&app.pool, "comment").await, 0);
    }

    #[tokio::test]
    async fn get_diary_lists_comments() {
        let app = test_app().await;

        app.router
            .clone()
            .oneshot(post_json(
                "/diary/exchange",
                serde_json::json!({"author": "alice", "content": "first"}),
            ))
            .await
            .unwrap();
        app.router
            .clone()
            .oneshot(post_json(
                "/diary/add-comments",
                serde_json::json!({"author": "bob", "content": "one", "diary_id": 1}),
            ))
            .await
            .unwrap();

        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/diary/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let diary: DiaryResponse = read_json(response).await;
        assert_eq!(diary.comments.len(), 1);
        assert_eq!(diary.comments[0].content, "one");

        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/diary/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .router
            .oneshot(Request::builder().uri("/diary/2").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn uploaded_image_is_served_back() {
        let app = test_app().await;

        let response = app
            .router
            .clone()
            .oneshot(multipart_upload("file", "cat.png", b"not really a png"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let upload: UploadResponse = read_json(response).await;
        assert!(upload.url.starts_with("/resources/images/"));
        assert!(upload.url.ends_with(".png"));

        let file_name = upload.url.trim_start_matches("/resources/images/");
        assert!(app.resources.path().join("images").join(file_name).exists());

        let response = app
            .router
            .oneshot(Request::builder().uri(&upload.url).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"not really a png");
    }

    #[tokio::test]
    async fn upload_without_file_field_is_400() {
        let app = test_app().await;

        let response = app
            .router
            .oneshot(multipart_upload("attachment", "cat.png", b"data"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upload_over_body_limit_is_413() {
        let app = test_app_with(|config| config.max_upload_bytes = 1024).await;

        let response = app
            .router
            .oneshot(multipart_upload("file", "big.png", &[0u8; 4096]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body: serde_json::Value = read_json(response).await;
        assert_eq!(body["error"], "invalid_multipart");

        let stored = std::fs::read_dir(app.resources.path().join("images"))
            .unwrap()
            .count();
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn permissive_cors_allows_any_origin() {
        let app = test_app_with(|config| config.cors_permissive = true).await;

        let response = app
            .router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/upload/image")
                    .header(header::ORIGIN, "https://elsewhere.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).is_none());
    }

    #[tokio::test]
    async fn cors_allows_web_client_with_credentials() {
        let app = test_app().await;

        let response = app
            .router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/diary/exchange")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }
}
