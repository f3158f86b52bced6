use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::tracker::{AttendanceTracker, error::TrackerError};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct EmployeeLookupQuery {
    #[schema(example = "1032456789")]
    /// national id number of the employee
    pub national_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeLookupResponse {
    #[schema(example = "1032456789")]
    pub national_id: String,
    #[schema(example = "Juan Perez")]
    pub full_name: String,
}

/// Find an active employee's name by national id, used to prefill the check form
#[utoipa::path(
    get,
    path = "/api/employee/lookup",
    params(EmployeeLookupQuery),
    responses(
        (status = 200, description = "Employee found", body = EmployeeLookupResponse),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn lookup_employee(
    tracker: web::Data<AttendanceTracker>,
    query: web::Query<EmployeeLookupQuery>,
) -> actix_web::Result<impl Responder> {
    match tracker.lookup_employee(&query.national_id).await {
        Ok(employee) => Ok(HttpResponse::Ok().json(EmployeeLookupResponse {
            national_id: employee.national_id,
            full_name: employee.full_name,
        })),
        Err(TrackerError::UnknownEmployee) => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Employee not found"
        }))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to look up employee");
            Err(e.into())
        }
    }
}
