use crate::api::attendance::{CheckEventReq, CheckEventResponse};
use crate::api::employee::{EmployeeLookupQuery, EmployeeLookupResponse};
use crate::model::attendance::{
    SessionFilter, SessionListResponse, SessionResponse, SessionStatus, SessionView,
};
use crate::model::health_status::HealthStatus;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Site Access API",
        version = "0.1.0",
        description = r#"
## Site Access: attendance sessions for mining operations

Workers check in and out at the work fronts through a simple form. Each scan
toggles the worker's attendance session for the site-local day:

- the first scan of the day **opens** a session (a project is required)
- the next scan **closes** it, recording the exit health status
- a repeated scan within a few seconds returns the same result

At most one session per employee and day is ever open.

### 📦 Response Format
- JSON responses, errors as `{ "message", "code" }`
- Pagination supported for the access log
"#,
    ),
    paths(
        crate::api::attendance::check_event,
        crate::api::attendance::list_sessions,
        crate::api::attendance::get_session,

        crate::api::employee::lookup_employee
    ),
    components(
        schemas(
            CheckEventReq,
            CheckEventResponse,
            SessionResponse,
            SessionView,
            SessionListResponse,
            SessionFilter,
            SessionStatus,
            HealthStatus,
            EmployeeLookupQuery,
            EmployeeLookupResponse
        )
    ),
    tags(
        (name = "Attendance", description = "Check events and the access log"),
        (name = "Employee", description = "Employee lookups for the check form"),
    )
)]
pub struct ApiDoc;
