//! Session endpoints: create, read, discovery, participation.
//!
//! List endpoints return one page in the body and the "more entries
//! available" flag out-of-band in the `X-Has-More-Entries` header.

use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::response::AppendHeaders;
use axum::Json;

use crate::common::{ApiError, PageQuery, SessionId, UserId};
use crate::domains::sessions::models::{SessionDto, SportType};
use crate::domains::sessions::search::NearbyQuery;
use crate::domains::sessions::validate::CreateSessionRequest;
use crate::server::app::AppState;
use crate::server::middleware::CurrentUser;

const HAS_MORE_HEADER: &str = "x-has-more-entries";

type PagedSessions = (
    AppendHeaders<[(&'static str, String); 1]>,
    Json<Vec<SessionDto>>,
);

fn paged(sessions: Vec<SessionDto>, has_more: bool) -> PagedSessions {
    (
        AppendHeaders([(HAS_MORE_HEADER, has_more.to_string())]),
        Json(sessions),
    )
}

/// POST /api/v1/session
pub async fn create_session(
    Extension(state): Extension<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionDto>), ApiError> {
    let session = state.sessions.create(request, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/v1/session
pub async fn list_sessions(
    Extension(state): Extension<AppState>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<PageQuery>,
) -> Result<PagedSessions, ApiError> {
    let (sessions, has_more) = state
        .sessions
        .list_for_user(user.user_id, &page.validate())
        .await?;
    Ok(paged(sessions, has_more))
}

/// GET /api/v1/session/search
pub async fn search_sessions(
    Extension(state): Extension<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<NearbyQuery>,
) -> Result<PagedSessions, ApiError> {
    let (sessions, has_more) = state.sessions.search_nearby(user.user_id, &query).await?;
    Ok(paged(sessions, has_more))
}

/// GET /api/v1/session/types
pub async fn sport_types(CurrentUser(_user): CurrentUser) -> Json<&'static [SportType]> {
    Json(SportType::all())
}

/// GET /api/v1/session/{session_id}
pub async fn get_session(
    Extension(state): Extension<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionDto>, ApiError> {
    let session = state.sessions.get(session_id, user.user_id).await?;
    Ok(Json(session))
}

/// PUT /api/v1/session/{session_id}/join
pub async fn join_session(
    Extension(state): Extension<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    state.sessions.join(session_id, user.user_id).await?;
    Ok(StatusCode::OK)
}

/// PUT /api/v1/session/{session_id}/leave
pub async fn leave_session(
    Extension(state): Extension<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    state.sessions.leave(session_id, user.user_id).await?;
    Ok(StatusCode::OK)
}

/// DELETE /api/v1/session/{session_id}/{user_id}
pub async fn kick_user(
    Extension(state): Extension<AppState>,
    CurrentUser(user): CurrentUser,
    Path((session_id, target)): Path<(SessionId, UserId)>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .kick(session_id, target, user.user_id)
        .await?;
    Ok(StatusCode::OK)
}

/// DELETE /api/v1/session/{session_id}
pub async fn delete_session(
    Extension(state): Extension<AppState>,
    CurrentUser(user): CurrentUser,
    Path(session_id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    state.sessions.delete(session_id, user.user_id).await?;
    Ok(StatusCode::OK)
}
