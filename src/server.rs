use std::net::SocketAddr;

use anyhow::Context;
use axum::http::HeaderValue;
use axum::routing::{get, patch, post};
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{self, SecurityConfig};
use crate::database::manager;
use crate::handlers::{protected, public};
use crate::middleware::auth::jwt_auth_middleware;
use crate::middleware::rate_limit::rate_limit_middleware;

pub fn app() -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/whoami", get(protected::auth::whoami))
        .route(
            "/api/users",
            get(protected::users::list).post(protected::users::create),
        )
        .route(
            "/api/users/:id",
            get(protected::users::get)
                .patch(protected::users::patch)
                .delete(protected::users::delete),
        )
        .route(
            "/api/leave-requests/:id/status",
            patch(protected::leave::patch_status),
        )
        .route(
            "/api/compliance-issues/:id/status",
            patch(protected::compliance::patch_status),
        )
        .route("/api/notifications/send", post(protected::notify::send))
        .route("/api/files", post(protected::files::upload))
        // Generic data plane: every registry resource
        .route(
            "/api/:resource",
            get(protected::data::list).post(protected::data::create),
        )
        .route(
            "/api/:resource/:id",
            get(protected::data::get_one)
                .patch(protected::data::patch)
                .delete(protected::data::delete),
        )
        .route_layer(middleware::from_fn(jwt_auth_middleware));

    let security = &config::config().security;
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/auth/login", post(public::auth::login))
        .route("/api/auth/refresh", post(public::auth::refresh))
        .merge(protected_routes)
        // Global middleware, outermost first: tracing, then throttling
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(rate_limit_middleware)),
        );

    if security.enable_cors {
        router = router.layer(cors_layer(security));
    }
    router
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub async fn serve(port: u16) -> anyhow::Result<()> {
    if config::config().database.auto_migrate {
        if let Err(e) = manager::run_migrations().await {
            tracing::warn!("migrations not applied: {}", e);
        }
    }

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    println!("🚀 ChurchFlow API listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app().into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server")?;
    Ok(())
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "ChurchFlow API",
            "version": version,
            "description": "Church administration backend: announcements, members, finances, HR and compliance",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth/login, /api/auth/refresh (public), /api/auth/whoami (protected)",
                "users": "/api/users[/:id] (protected, superadmin)",
                "data": "/api/:resource[/:id] (protected; see resources)",
                "leave": "/api/leave-requests/:id/status (protected)",
                "compliance": "/api/compliance-issues/:id/status (protected)",
                "notifications": "/api/notifications/send (protected)",
                "files": "/api/files (protected)",
            },
            "resources": crate::resources::REGISTRY
                .iter()
                .map(|r| r.slug)
                .collect::<Vec<_>>(),
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match manager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": {
                    "code": "SERVICE_UNAVAILABLE",
                    "message": "database unavailable"
                },
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
