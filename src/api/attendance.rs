use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::attendance::{SessionFilter, SessionListResponse, SessionResponse, SessionView};
use crate::tracker::{AttendanceTracker, CheckEvent, SessionTransition};

#[derive(Deserialize, ToSchema)]
pub struct CheckEventReq {
    #[schema(example = "1032456789")]
    /// national id number typed on the form
    pub national_id: String,
    #[schema(example = "Juan Perez")]
    /// full name, must match the registered one
    pub name: String,
    #[schema(example = "Good")]
    /// Good, Fair or Poor (Bien, Regular, Mal also accepted)
    pub health_status: String,
    #[schema(example = 3, nullable = true)]
    /// project the session is attributed to, required to open a session
    pub project_id: Option<u64>,
    #[schema(example = "Mina Norte", nullable = true)]
    pub site: Option<String>,
    #[schema(nullable = true)]
    pub observation: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CheckEventResponse {
    #[schema(example = "Check-in recorded")]
    pub message: String,
    #[schema(example = "opened")]
    pub transition: String,
    pub session: SessionResponse,
}

/// Check event endpoint: the first scan of the day opens a session, the next one closes it
#[utoipa::path(
    post,
    path = "/api/attendance/check",
    request_body = CheckEventReq,
    responses(
        (status = 200, description = "Session opened or closed", body = CheckEventResponse),
        (status = 400, description = "Invalid health status or out of order event", body = Object, example = json!({
            "message": "Invalid health status 'tired'. Allowed: Good, Fair, Poor",
            "code": "invalid_health_status"
        })),
        (status = 404, description = "Unknown or inactive employee", body = Object, example = json!({
            "message": "The national id or the name are not registered for an active employee",
            "code": "unknown_employee"
        })),
        (status = 409, description = "Concurrent scan or attendance already closed today", body = Object, example = json!({
            "message": "Another check event for this employee is being recorded, try again",
            "code": "concurrent_write_conflict"
        })),
        (status = 422, description = "No project to attribute the session to", body = Object, example = json!({
            "message": "No project is available to assign the session to",
            "code": "no_site_available"
        })),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn check_event(
    tracker: web::Data<AttendanceTracker>,
    payload: web::Json<CheckEventReq>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();

    let transition = tracker
        .handle_check_event(CheckEvent {
            national_id: payload.national_id,
            name: Some(payload.name),
            event_time: Utc::now(),
            health_status: payload.health_status,
            project_id: payload.project_id,
            site: payload.site,
            observation: payload.observation,
        })
        .await?;

    let message = match &transition {
        SessionTransition::Opened(_) => "Check-in recorded",
        SessionTransition::Closed(_) => "Check-out recorded",
    };

    Ok(HttpResponse::Ok().json(CheckEventResponse {
        message: message.to_string(),
        transition: transition.label().to_string(),
        session: SessionResponse::from(transition.session()),
    }))
}

/// Access log: paginated, filterable list of sessions
#[utoipa::path(
    get,
    path = "/api/attendance/sessions",
    params(SessionFilter),
    responses(
        (status = 200, description = "Paginated session list", body = SessionListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_sessions(
    tracker: web::Data<AttendanceTracker>,
    query: web::Query<SessionFilter>,
) -> actix_web::Result<impl Responder> {
    let (data, total) = tracker.store().list_sessions(&query).await?;

    Ok(HttpResponse::Ok().json(SessionListResponse {
        data,
        page: query.page(),
        per_page: query.per_page(),
        total,
    }))
}

/// Get one session by id
#[utoipa::path(
    get,
    path = "/api/attendance/sessions/{session_id}",
    params(
        ("session_id" = u64, Path, description = "ID of the session to fetch")
    ),
    responses(
        (status = 200, description = "Session found", body = SessionView),
        (status = 404, description = "Session not found", body = Object, example = json!({
            "message": "Session not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn get_session(
    tracker: web::Data<AttendanceTracker>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let session_id = path.into_inner();

    match tracker.store().get_session(session_id).await? {
        Some(view) => Ok(HttpResponse::Ok().json(view)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Session not found"
        }))),
    }
}
