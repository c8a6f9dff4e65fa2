// SPDX-License-Identifier: GPL-2.0-or-later
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use meme_audio_api_structs::ErrorBody;
use sqlx::SqlitePool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;
use ulid::Ulid;

use crate::synthesis::AudioSynthesizer;
use crate::Error;

pub(crate) mod handlers;
pub(crate) mod ui;

/// Everything a handler needs, constructed once at startup.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: SqlitePool,
    pub synthesizer: Arc<dyn AudioSynthesizer>,
}

impl AppState {
    pub fn new(db: SqlitePool, synthesizer: Arc<dyn AudioSynthesizer>) -> Self {
        Self { db, synthesizer }
    }
}

/// Build the router serving the RPC operations and the single-page UI.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::index))
        .route("/assets/app.js", get(ui::app_js))
        .route("/assets/style.css", get(ui::style_css))
        .route("/rpc/healthcheck", get(handlers::status::get))
        .route("/rpc/createAudio", post(handlers::audio::create))
        .route("/rpc/getAudioClips", get(handlers::audio::get_all))
        .route("/rpc/getAudioById", get(handlers::audio::get))
        .fallback(handle_404)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!("request",
                        id = %Ulid::new(),
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "This isn't the endpoint you're looking for".into(),
            issues: vec![],
        }),
    )
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Error::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Invalid request".into(),
                    issues: errors.issues,
                },
            ),
            Error::Database(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: "The database is unavailable".into(),
                    issues: vec![],
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Something went oopsies".into(),
                    issues: vec![],
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::http::{header, Method};
    use meme_audio_api_structs::{AudioClip, Health, Prompt, STATUS_OK};
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config;
    use crate::db::testing::memory_pool;
    use crate::synthesis::{PlaceholderSynthesizer, SynthesizedAudio};

    /// Counts calls and then defers to the placeholder.
    #[derive(Debug)]
    struct CountingSynthesizer {
        calls: AtomicUsize,
        inner: Option<PlaceholderSynthesizer>,
    }

    #[async_trait]
    impl AudioSynthesizer for CountingSynthesizer {
        async fn synthesize(&self, prompt: &Prompt) -> Result<SynthesizedAudio, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.inner {
                Some(inner) => inner.synthesize(prompt).await,
                None => Err(Error::Synthesis("the provider is down".into())),
            }
        }
    }

    struct TestServer {
        router: Router,
        db: SqlitePool,
        synthesizer: Arc<CountingSynthesizer>,
    }

    async fn server() -> TestServer {
        server_with(Some(PlaceholderSynthesizer::new(
            &config::Synthesis::default(),
        )))
        .await
    }

    async fn server_with(inner: Option<PlaceholderSynthesizer>) -> TestServer {
        let db = memory_pool().await;
        let synthesizer = Arc::new(CountingSynthesizer {
            calls: AtomicUsize::new(0),
            inner,
        });
        let router = create_router(AppState::new(db.clone(), synthesizer.clone()));
        TestServer {
            router,
            db,
            synthesizer,
        }
    }

    impl TestServer {
        async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
            let request = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(body) => request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string())),
                None => request.body(Body::empty()),
            }
            .unwrap();
            self.router.clone().oneshot(request).await.unwrap()
        }

        async fn create(&self, prompt: &str) -> Response {
            self.request(
                Method::POST,
                "/rpc/createAudio",
                Some(json!({ "prompt": prompt })),
            )
            .await
        }

        async fn row_count(&self) -> i64 {
            sqlx::query_scalar("SELECT COUNT(*) FROM audio_clips")
                .fetch_one(&self.db)
                .await
                .unwrap()
        }
    }

    async fn body<T: DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn healthcheck() {
        let server = server().await;
        let before = chrono::Utc::now();
        let response = server
            .request(Method::GET, "/rpc/healthcheck", None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let health: Health = body(response).await;
        assert_eq!(health.status, STATUS_OK);
        assert!(health.timestamp >= before);
        assert_eq!(health.db_connections, 1);
    }

    #[tokio::test]
    async fn healthcheck_without_database() {
        let server = server().await;
        server.db.close().await;
        let response = server
            .request(Method::GET, "/rpc/healthcheck", None)
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let error: ErrorBody = body(response).await;
        assert_eq!(error.error, "The database is unavailable");
        assert!(error.issues.is_empty());
    }

    #[tokio::test]
    async fn create_returns_the_stored_clip() {
        let server = server().await;
        let response = server
            .create("Generate a soothing nature sound with birds chirping")
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let clip: AudioClip = body(response).await;
        assert!(clip.id > 0);
        assert_eq!(
            clip.prompt,
            "Generate a soothing nature sound with birds chirping"
        );
        assert!(clip
            .audio_url
            .starts_with("https://audio-storage.example.com/clips/"));
        assert!(clip.audio_url.ends_with(".mp3"));
        assert_eq!(clip.duration, 5);

        let response = server
            .request(
                Method::GET,
                &format!("/rpc/getAudioById?id={}", clip.id),
                None,
            )
            .await;
        let stored: Option<AudioClip> = body(response).await;
        assert_eq!(stored, Some(clip));
    }

    #[tokio::test]
    async fn create_durations() {
        let server = server().await;

        let short: AudioClip = body(server.create("Hi").await).await;
        assert_eq!(short.duration, 5);

        let long: AudioClip = body(server.create(&"A".repeat(500)).await).await;
        assert_eq!(long.duration, 50);
        assert_eq!(long.prompt.len(), 500);
    }

    #[tokio::test]
    async fn prompt_length_counts_characters_not_bytes() {
        let server = server().await;
        let emoji = "🎵".repeat(500);
        let response = server.create(&emoji).await;
        assert_eq!(response.status(), StatusCode::OK);
        let clip: AudioClip = body(response).await;
        assert_eq!(clip.prompt, emoji);
        assert_eq!(clip.duration, 50);

        let response = server.create(&"🎵".repeat(501)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn identical_requests_create_distinct_clips() {
        let server = server().await;
        let first: AudioClip = body(server.create("Hi").await).await;
        let second: AudioClip = body(server.create("Hi").await).await;
        assert_ne!(first.id, second.id);
        assert_ne!(first.audio_url, second.audio_url);
        assert_eq!(server.row_count().await, 2);
    }

    #[tokio::test]
    async fn concurrent_creates_get_fresh_ids() {
        let server = server().await;
        let responses = create_concurrently(&server, 8).await;
        let mut ids: Vec<i64> = Vec::new();
        for response in responses {
            assert_eq!(response.status(), StatusCode::OK);
            let clip: AudioClip = body(response).await;
            ids.push(clip.id);
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    async fn create_concurrently(server: &TestServer, n: usize) -> Vec<Response> {
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..n {
            let router = server.router.clone();
            tasks.spawn(async move {
                let request = Request::builder()
                    .method(Method::POST)
                    .uri("/rpc/createAudio")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "prompt": format!("clip {i}") }).to_string()))
                    .unwrap();
                router.oneshot(request).await.unwrap()
            });
        }
        let mut responses = Vec::new();
        while let Some(response) = tasks.join_next().await {
            responses.push(response.unwrap());
        }
        responses
    }

    #[tokio::test]
    async fn prompt_too_long_is_rejected_before_persistence() {
        let server = server().await;
        let response = server.create(&"A".repeat(501)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error: ErrorBody = body(response).await;
        assert_eq!(error.error, "Invalid request");
        assert_eq!(error.issues.len(), 1);
        assert_eq!(error.issues[0].field, "prompt");

        assert_eq!(server.synthesizer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(server.row_count().await, 0);
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected() {
        let server = server().await;
        let response = server.create("").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(server.row_count().await, 0);
    }

    #[tokio::test]
    async fn client_credentials_are_refused() {
        let server = server().await;
        let response = server
            .request(
                Method::POST,
                "/rpc/createAudio",
                Some(json!({ "prompt": "Hi", "modelName": "tts-1", "apiKey": "sk-123" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error: ErrorBody = body(response).await;
        assert_eq!(error.issues[0].field, "body");
        assert_eq!(server.row_count().await, 0);
    }

    #[tokio::test]
    async fn missing_prompt_is_rejected() {
        let server = server().await;
        let response = server
            .request(Method::POST, "/rpc/createAudio", Some(json!({})))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn synthesis_failure_is_fatal_and_stores_nothing() {
        let server = server_with(None).await;
        let response = server.create("Hi").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(server.synthesizer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(server.row_count().await, 0);
    }

    #[tokio::test]
    async fn database_failure_is_reported() {
        let server = server().await;
        server.db.close().await;
        let response = server.create("Hi").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let error: ErrorBody = body(response).await;
        assert_eq!(error.error, "The database is unavailable");
    }

    #[tokio::test]
    async fn get_unknown_id_is_null() {
        let server = server().await;
        let response = server
            .request(Method::GET, "/rpc/getAudioById?id=999", None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let clip: Option<AudioClip> = body(response).await;
        assert!(clip.is_none());
    }

    #[tokio::test]
    async fn get_requires_a_positive_integer() {
        let server = server().await;
        for uri in [
            "/rpc/getAudioById?id=0",
            "/rpc/getAudioById?id=-4",
            "/rpc/getAudioById?id=abc",
            "/rpc/getAudioById",
        ] {
            let response = server.request(Method::GET, uri, None).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn list_empty() {
        let server = server().await;
        let response = server
            .request(Method::GET, "/rpc/getAudioClips", None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let clips: Vec<AudioClip> = body(response).await;
        assert!(clips.is_empty());
    }

    #[tokio::test]
    async fn list_newest_first() {
        let server = server().await;
        let a: AudioClip = body(server.create("First clip").await).await;
        let b: AudioClip = body(server.create("Second clip").await).await;

        let response = server
            .request(Method::GET, "/rpc/getAudioClips", None)
            .await;
        let clips: Vec<AudioClip> = body(response).await;
        assert_eq!(clips, vec![b, a]);
    }

    #[tokio::test]
    async fn unknown_route() {
        let server = server().await;
        let response = server.request(Method::GET, "/rpc/deleteAudio", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn serves_the_ui() {
        let server = server().await;
        for (uri, content_type) in [
            ("/", "text/html"),
            ("/assets/app.js", "text/javascript"),
            ("/assets/style.css", "text/css"),
        ] {
            let response = server.request(Method::GET, uri, None).await;
            assert_eq!(response.status(), StatusCode::OK);
            let header = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
            assert!(header.starts_with(content_type), "{uri}: {header}");
        }
    }

    #[tokio::test]
    async fn prompt_box_has_no_browser_length_limit() {
        // maxlength counts UTF-16 units and would cut off emoji prompts the server accepts.
        let server = server().await;
        let response = server.request(Method::GET, "/", None).await;
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let page = std::str::from_utf8(&bytes).unwrap();
        assert!(page.contains(r#"<textarea id="prompt""#));
        assert!(!page.contains("maxlength"));
    }
}
