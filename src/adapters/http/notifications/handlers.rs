//! HTTP handlers for notification endpoints.

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::adapters::http::middleware::RequireAuth;
use crate::adapters::http::state::AppState;
use crate::application::handlers::notification::{
    BroadcastAnnouncementCommand, ListUserNotificationsQuery,
};
use crate::domain::foundation::{DomainError, ErrorCode};

use super::dto::{
    BroadcastRequest, ErrorResponse, HealthResponse, NotificationListResponse,
    NotificationResponse,
};

/// GET /api/v1/users/notifications - Caller's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state
        .list_notifications_handler()
        .handle(ListUserNotificationsQuery { user_id: user.id })
        .await?;

    Ok(Json(NotificationListResponse {
        notifications: notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    }))
}

/// POST /api/v1/cms/broadcast - Announcement to every live client (superadmin)
pub async fn broadcast_announcement(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<BroadcastRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .broadcast_announcement_handler()
        .handle(BroadcastAnnouncementCommand {
            title: request.title,
            message: request.message,
        })
        .await?;

    tracing::info!(user_id = %user.id, "Announcement accepted");
    Ok(StatusCode::ACCEPTED)
}

/// GET /health - Liveness plus hub counts
pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state.hub.stats().await.map_err(|e| {
        DomainError::new(ErrorCode::RealtimeUnavailable, e.to_string())
    })?;
    Ok(Json(HealthResponse::ok(stats)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Mapping
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::RealtimeUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError
            | ErrorCode::SerializationError
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        // Internal details stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.0.message.clone()
        };

        let body = ErrorResponse::new(self.0.code.to_string(), message);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(code: ErrorCode) -> StatusCode {
        ApiError(DomainError::new(code, "x")).into_response().status()
    }

    #[test]
    fn validation_errors_are_bad_request() {
        assert_eq!(status_of(ErrorCode::EmptyField), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(ErrorCode::InvalidFormat), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn stopped_hub_is_service_unavailable() {
        assert_eq!(
            status_of(ErrorCode::RealtimeUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn database_errors_are_internal() {
        assert_eq!(
            status_of(ErrorCode::DatabaseError),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
