//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domains::auth::JwtService;
use crate::domains::chat::ChatService;
use crate::domains::sessions::SessionService;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    chat_history, chat_socket_handler, create_session, delete_session, get_session,
    health_handler, join_session, kick_user, leave_session, list_sessions, search_sessions,
    sport_types,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub chat: Arc<ChatService>,
    pub jwt_service: Arc<JwtService>,
}

/// Build the Axum application router
pub fn build_app(state: AppState) -> Router {
    let jwt_service = state.jwt_service.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/session", post(create_session).get(list_sessions))
        .route("/api/v1/session/search", get(search_sessions))
        .route("/api/v1/session/types", get(sport_types))
        .route(
            "/api/v1/session/:session_id",
            get(get_session).delete(delete_session),
        )
        .route("/api/v1/session/:session_id/join", put(join_session))
        .route("/api/v1/session/:session_id/leave", put(leave_session))
        .route("/api/v1/session/:session_id/:user_id", delete(kick_user))
        .route("/api/v1/session/:session_id/chat", get(chat_socket_handler))
        .route(
            "/api/v1/session/:session_id/chat/history",
            get(chat_history),
        )
        .layer(middleware::from_fn(move |request, next| {
            jwt_auth_middleware(jwt_service.clone(), request, next)
        }))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
