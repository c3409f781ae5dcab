//! Route table and middleware stack.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use cadence_core::defaults;

use crate::config::ServerConfig;
use crate::handlers::{auth, automation, notifications, recurrence, tasks};
use crate::state::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the application router with every route and layer attached.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Accounts and credentials
        .route("/auth/register", post(auth::register))
        .route("/auth/user/login", post(auth::login))
        .route("/auth/user/refresh-token", post(auth::refresh_token))
        .route("/auth/protected-route", get(auth::protected_route))
        .route("/auth/account", delete(auth::delete_account))
        .route("/api-key/regenerate", post(auth::regenerate_api_key))
        .route("/api-key/revoke", post(auth::revoke_api_key))
        // Tasks
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/:id",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/tasks/:id/dependencies", get(tasks::list_dependencies))
        .route(
            "/tasks/:id/dependencies/:dependent_id",
            post(tasks::add_dependency).delete(tasks::remove_dependency),
        )
        // Recurrence
        .route("/recurring-tasks", get(recurrence::list_recurring))
        .route(
            "/recurring-tasks/:id/recurrence",
            get(recurrence::get_recurrence).put(recurrence::update_recurrence),
        )
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/mark-all-as-read",
            put(notifications::mark_all_as_read),
        )
        .route(
            "/notifications/:id/mark-as-read",
            put(notifications::mark_as_read),
        )
        // Job triggers
        .route("/automation/reminders", post(automation::run_reminders))
        .route("/automation/run-recurring", post(automation::run_recurring))
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(config.allowed_origins.clone()))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(Duration::from_secs(defaults::CORS_MAX_AGE_SECS)),
        )
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Some(limiter) = &state.rate_limiter {
        let client = client_addr(&request);
        if limiter.check_key(&client).is_err() {
            tracing::warn!(subsystem = "api", %client, "Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "Too many requests. Please wait before retrying."
                })),
            ));
        }
    }
    Ok(next.run(request).await)
}

/// Peer address of the connection. Requests without connection info share
/// the unspecified-address bucket.
fn client_addr(request: &axum::extract::Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
