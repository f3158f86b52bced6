use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::model::health_status::HealthStatus;

/// Sessions are scoped to one employee on one site-local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub employee_id: u64,
    pub work_date: NaiveDate,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSession {
    pub id: u64,
    pub employee_id: u64,
    pub project_id: u64,
    pub work_date: NaiveDate,
    pub check_in_time: NaiveTime,
    pub check_out_time: Option<NaiveTime>,
    pub health_status_in: HealthStatus,
    pub health_status_out: Option<HealthStatus>,
    pub site: Option<String>,
    pub observation: Option<String>,
}

impl AttendanceSession {
    pub fn status(&self) -> SessionStatus {
        match self.check_out_time {
            Some(_) => SessionStatus::Closed,
            None => SessionStatus::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status() == SessionStatus::Open
    }

    pub fn key(&self) -> SessionKey {
        SessionKey {
            employee_id: self.employee_id,
            work_date: self.work_date,
        }
    }

    /// Moment of the most recent transition: check-out once closed, check-in while open.
    pub fn last_transition_at(&self) -> NaiveDateTime {
        self.work_date
            .and_time(self.check_out_time.unwrap_or(self.check_in_time))
    }
}

/// Row about to be inserted when a session opens.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub employee_id: u64,
    pub project_id: u64,
    pub work_date: NaiveDate,
    pub check_in_time: NaiveTime,
    pub health_status_in: HealthStatus,
    pub site: Option<String>,
    pub observation: Option<String>,
}

impl NewSession {
    pub fn into_session(self, id: u64) -> AttendanceSession {
        AttendanceSession {
            id,
            employee_id: self.employee_id,
            project_id: self.project_id,
            work_date: self.work_date,
            check_in_time: self.check_in_time,
            check_out_time: None,
            health_status_in: self.health_status_in,
            health_status_out: None,
            site: self.site,
            observation: self.observation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 12,
    "employee_id": 1,
    "project_id": 3,
    "work_date": "2026-03-02",
    "check_in_time": "08:00:00",
    "check_out_time": null,
    "health_status_in": "Good",
    "health_status_out": null,
    "site": "Mina Norte",
    "observation": null,
    "status": "open"
}))]
pub struct SessionResponse {
    pub id: u64,
    pub employee_id: u64,
    pub project_id: u64,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub work_date: NaiveDate,
    #[schema(example = "08:00:00", value_type = String)]
    pub check_in_time: NaiveTime,
    #[schema(example = "17:00:00", value_type = String, nullable = true)]
    pub check_out_time: Option<NaiveTime>,
    pub health_status_in: HealthStatus,
    #[schema(nullable = true)]
    pub health_status_out: Option<HealthStatus>,
    #[schema(example = "Mina Norte", nullable = true)]
    pub site: Option<String>,
    #[schema(nullable = true)]
    pub observation: Option<String>,
    pub status: SessionStatus,
}

impl From<&AttendanceSession> for SessionResponse {
    fn from(s: &AttendanceSession) -> Self {
        Self {
            id: s.id,
            employee_id: s.employee_id,
            project_id: s.project_id,
            work_date: s.work_date,
            check_in_time: s.check_in_time,
            check_out_time: s.check_out_time,
            health_status_in: s.health_status_in,
            health_status_out: s.health_status_out,
            site: s.site.clone(),
            observation: s.observation.clone(),
            status: s.status(),
        }
    }
}

/// A session joined with the employee it belongs to, as shown in the access log.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionView {
    #[schema(example = "1032456789")]
    pub national_id: String,
    #[schema(example = "Juan Perez")]
    pub full_name: String,
    #[serde(flatten)]
    pub session: SessionResponse,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SessionFilter {
    #[schema(example = "1032456789")]
    /// Exact national id of the employee
    pub national_id: Option<String>,
    #[schema(example = "perez")]
    /// Case-insensitive substring of the employee name
    pub name: Option<String>,
    #[schema(example = "2026-03-02", format = "date", value_type = Option<String>)]
    #[param(value_type = Option<String>, format = "date")]
    /// Site-local work date
    pub work_date: Option<NaiveDate>,
    /// open or closed
    pub status: Option<SessionStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    #[schema(example = 20)]
    /// Items per page (max 100)
    pub per_page: Option<u32>,
}

impl SessionFilter {
    pub const DEFAULT_PER_PAGE: u32 = 20;
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.per_page())
    }
}

#[derive(Serialize, ToSchema)]
pub struct SessionListResponse {
    pub data: Vec<SessionView>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}
