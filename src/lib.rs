//! SAN Finance Backend - content and feedback API for the marketing site

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod slug;
pub mod state;
pub mod storage;
pub mod store;
pub mod visitor;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::storage::{LocalFileStore, PUBLIC_PREFIX};
use crate::store::{ContentStore, MemoryStore, PgStore};

/// Headroom for the text fields sent alongside an image.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Cap for every body outside the blog editor.
const JSON_BODY_LIMIT: usize = 64 * 1024;

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
/// Falls back to the local frontend dev server.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        // The visitor cookie rides on cross-origin requests from the site.
        .allow_credentials(true)
}

/// Routes under `/api/admin`; every one requires an admin token.
fn admin_routes(state: &AppState) -> Router<AppState> {
    use routes::{blog, comments, contact, testimonials};

    // Only the editor accepts image uploads.
    let upload_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;
    let editor_limits = ServiceBuilder::new()
        .layer(RequestBodyLimitLayer::new(upload_limit))
        .layer(DefaultBodyLimit::max(upload_limit));

    Router::new()
        .route("/contacts", get(contact::list_contacts))
        .route(
            "/contacts/{id}",
            get(contact::open_contact).delete(contact::delete_contact),
        )
        .route("/contacts/{id}/read", post(contact::mark_read))
        .route("/testimonials", get(testimonials::list_all))
        .route("/testimonials/{id}", delete(testimonials::delete_testimonial))
        .route("/testimonials/{id}/approve", post(testimonials::approve))
        .route(
            "/testimonials/{id}/toggle-featured",
            post(testimonials::toggle_featured),
        )
        .route(
            "/blog",
            get(blog::admin_list_posts)
                .post(blog::create_post)
                .layer(editor_limits.clone()),
        )
        .route(
            "/blog/{id}",
            get(blog::admin_get_post)
                .put(blog::update_post)
                .delete(blog::delete_post)
                .layer(editor_limits),
        )
        .route("/blog/{id}/publish", post(blog::publish_post))
        .route("/blog/{id}/unpublish", post(blog::unpublish_post))
        .route("/blog/{id}/toggle-publish", post(blog::toggle_publish))
        .route("/comments", get(comments::admin_list_comments))
        .route("/comments/{id}", delete(comments::delete_comment))
        .route("/comments/{id}/approve", post(comments::approve_comment))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::require_admin,
        ))
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    use routes::{blog, comments, contact, health, preferences, reactions, testimonials};

    let cors = configure_cors();
    Router::new()
        .route("/api/contact", post(contact::submit_contact))
        .route(
            "/api/testimonials",
            get(testimonials::list_public).post(testimonials::submit_testimonial),
        )
        .route("/api/blog", get(blog::list_posts))
        .route("/api/blog/{slug}", get(blog::get_post))
        .route(
            "/api/blog/{slug}/comments",
            get(comments::list_comments).post(comments::submit_comment),
        )
        .route(
            "/api/blog/{slug}/reactions",
            get(reactions::get_reactions).post(reactions::toggle_reaction),
        )
        .route(
            "/api/preferences/welcome-popup",
            get(preferences::welcome_popup),
        )
        .route(
            "/api/preferences/welcome-popup/seen",
            post(preferences::mark_welcome_popup_seen),
        )
        .nest("/api/admin", admin_routes(&state))
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&state.config.upload_dir))
        .route("/health", get(health::health_ping))
        .route("/health/database", get(health::health_database))
        .route("/health/ready", get(health::health_ready))
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Pick the content store: Postgres when DATABASE_URL is set, memory otherwise.
async fn connect_store(
    config: &AppConfig,
) -> Result<Arc<dyn ContentStore>, Box<dyn std::error::Error + Send + Sync>> {
    if std::env::var("DATABASE_URL").is_err() {
        tracing::info!("DATABASE_URL not set. Content is kept in memory and lost on restart.");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let connected = match db::init_pool(None).await {
        Ok(pool) => db::run_migrations(&pool).await.map(|_| pool),
        Err(e) => Err(e),
    };

    match connected {
        Ok(pool) => Ok(Arc::new(PgStore::new(pool))),
        Err(e) if config.is_production() => Err(e.into()),
        Err(e) => {
            tracing::warn!(
                "Failed to initialize database: {}. Continuing with the in-memory store.",
                e
            );
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Run the server (used by main).
pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();

    // Dropping the guards stops the background log writers.
    let _log_guards = logging::init(config.environment);

    routes::health::init_start_time();
    config.validate()?;

    let store = connect_store(&config).await?;
    tracing::info!("Content store: {}", store.backend());

    let files = Arc::new(LocalFileStore::new(
        config.upload_dir.clone(),
        config.public_base_url.clone(),
    ));

    let addr = config.bind_address()?;
    let app = create_app(AppState::new(store, files, config));

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = create_app(AppState::in_memory());
        let res = app
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_every_admin_route_requires_token() {
        let state = AppState::in_memory();
        let id = uuid::Uuid::new_v4();
        let routes = [
            (Method::GET, "/api/admin/contacts".to_string()),
            (Method::POST, format!("/api/admin/contacts/{}/read", id)),
            (Method::GET, "/api/admin/testimonials".to_string()),
            (Method::DELETE, format!("/api/admin/testimonials/{}", id)),
            (Method::GET, "/api/admin/blog".to_string()),
            (Method::POST, format!("/api/admin/blog/{}/publish", id)),
            (Method::GET, "/api/admin/comments".to_string()),
        ];
        for (method, uri) in routes {
            let req = Request::builder()
                .method(method)
                .uri(&uri)
                .body(Body::empty())
                .unwrap();
            let res = create_app(state.clone()).oneshot(req).await.unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_non_admin_role_is_forbidden() {
        let state = AppState::in_memory();
        let token = routes::auth::test_support::token_for("editor", &state.config.jwt_secret);
        let req = Request::get("/api/admin/contacts")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let res = create_app(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let app = create_app(AppState::in_memory());
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_json_intake_rejects_upload_sized_bodies() {
        let state = AppState::in_memory();
        let body = serde_json::json!({
            "fullName": "Big",
            "email": "big@example.com",
            "message": "x".repeat(JSON_BODY_LIMIT + 1),
        });
        let req = Request::post("/api/contact")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let res = create_app(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(state.store.list_contacts().await.unwrap().is_empty());
    }
}
