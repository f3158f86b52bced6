use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use strum::IntoEnumIterator;

use crate::model::health_status::HealthStatus;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("The national id or the name are not registered for an active employee")]
    UnknownEmployee,

    #[error("No project is available to assign the session to")]
    NoSiteAvailable,

    #[error("Invalid health status '{0}'")]
    InvalidHealthStatus(String),

    #[error("Another check event for this employee is being recorded, try again")]
    ConcurrentWriteConflict,

    #[error("Attendance for today is already closed")]
    AlreadyClosedForToday,

    #[error("Check event is earlier than the last recorded one")]
    OutOfOrderEvent,

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl TrackerError {
    pub fn code(&self) -> &'static str {
        match self {
            TrackerError::UnknownEmployee => "unknown_employee",
            TrackerError::NoSiteAvailable => "no_site_available",
            TrackerError::InvalidHealthStatus(_) => "invalid_health_status",
            TrackerError::ConcurrentWriteConflict => "concurrent_write_conflict",
            TrackerError::AlreadyClosedForToday => "already_closed_for_today",
            TrackerError::OutOfOrderEvent => "out_of_order_event",
            TrackerError::Store(_) => "internal_error",
        }
    }

    fn user_message(&self) -> String {
        match self {
            TrackerError::InvalidHealthStatus(given) => {
                let allowed = HealthStatus::iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Invalid health status '{given}'. Allowed: {allowed}")
            }
            TrackerError::Store(_) => "Something went wrong, Contact with system admin".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for TrackerError {
    fn status_code(&self) -> StatusCode {
        match self {
            TrackerError::UnknownEmployee => StatusCode::NOT_FOUND,
            TrackerError::InvalidHealthStatus(_) | TrackerError::OutOfOrderEvent => {
                StatusCode::BAD_REQUEST
            }
            TrackerError::NoSiteAvailable => StatusCode::UNPROCESSABLE_ENTITY,
            TrackerError::ConcurrentWriteConflict | TrackerError::AlreadyClosedForToday => {
                StatusCode::CONFLICT
            }
            TrackerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.user_message(),
            "code": self.code(),
        }))
    }
}

/// Unique key allowing a single open session per employee and work date.
const OPEN_SESSION_KEY: &str = "uq_attendance_one_open";

/// Maps a database error raised while writing a session. A duplicate on the
/// open-session key and a deadlock between two writers of the same key are
/// reported as a retryable conflict; other integrity errors stay store errors.
pub fn classify_write_error(e: sqlx::Error) -> TrackerError {
    if let sqlx::Error::Database(db_err) = &e {
        let open_session_taken =
            db_err.is_unique_violation() && db_err.message().contains(OPEN_SESSION_KEY);
        let deadlock = db_err.code().as_deref() == Some("40001");
        if open_session_taken || deadlock {
            return TrackerError::ConcurrentWriteConflict;
        }
    }
    TrackerError::Store(e)
}
