//! Attendance session tracking: decides, per employee and site-local day,
//! whether a check event opens a new session or closes the open one.

pub mod decision;
pub mod error;
#[cfg(test)]
pub mod memory;
pub mod mysql;
pub mod store;

use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};
use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumString};
use tracing::{debug, info, instrument, warn};

use crate::model::{
    attendance::{AttendanceSession, SessionKey},
    employee::Employee,
    health_status::HealthStatus,
};
use crate::utils::{employee_cache::EmployeeCache, key_lock::KeyLocks};

use decision::{ResolvedEvent, decide};
use error::TrackerError;
use store::SessionStore;

/// What to do when an employee scans again after closing a session the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ReentryPolicy {
    /// Open another session for the day.
    NewSession,
    /// Refuse with `AlreadyClosedForToday`.
    Reject,
}

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Offset of the site clock; work dates are calendar days in this offset.
    pub utc_offset: FixedOffset,
    pub reentry: ReentryPolicy,
    /// Scans this close to the previous transition are treated as repeats,
    /// on top of scans in the same second, which always are. Zero by default.
    pub duplicate_window: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTransition {
    Opened(AttendanceSession),
    Closed(AttendanceSession),
}

impl SessionTransition {
    pub fn from_session(session: AttendanceSession) -> Self {
        if session.is_open() {
            SessionTransition::Opened(session)
        } else {
            SessionTransition::Closed(session)
        }
    }

    pub fn session(&self) -> &AttendanceSession {
        match self {
            SessionTransition::Opened(s) | SessionTransition::Closed(s) => s,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionTransition::Opened(_) => "opened",
            SessionTransition::Closed(_) => "closed",
        }
    }
}

/// Incoming scan from the check form or a reader device.
#[derive(Debug, Clone)]
pub struct CheckEvent {
    pub national_id: String,
    /// Redundant confirmation of the identity; checked when present.
    pub name: Option<String>,
    pub event_time: DateTime<Utc>,
    pub health_status: String,
    pub project_id: Option<u64>,
    pub site: Option<String>,
    pub observation: Option<String>,
}

const MAX_SITE_LEN: usize = 100;

pub struct AttendanceTracker {
    store: Arc<dyn SessionStore>,
    employees: EmployeeCache,
    locks: KeyLocks<SessionKey>,
    settings: TrackerSettings,
}

impl AttendanceTracker {
    pub fn new(
        store: Arc<dyn SessionStore>,
        employees: EmployeeCache,
        locks: KeyLocks<SessionKey>,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            store,
            employees,
            locks,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Active employee registered under `national_id`, served from the cache
    /// when possible.
    pub async fn lookup_employee(&self, national_id: &str) -> Result<Employee, TrackerError> {
        let employee = match self.employees.get(national_id).await {
            Some(e) => e,
            None => {
                let found = self
                    .store
                    .find_employee(national_id.trim())
                    .await?
                    .ok_or(TrackerError::UnknownEmployee)?;
                if found.is_active() {
                    self.employees.insert(found.clone()).await;
                }
                found
            }
        };

        if !employee.is_active() {
            return Err(TrackerError::UnknownEmployee);
        }
        Ok(employee)
    }

    /// Records one check event: opens a session when none is open for the
    /// employee on the event's work date, closes the open one otherwise.
    #[instrument(
        name = "check_event",
        skip(self, event),
        fields(national_id = %event.national_id)
    )]
    pub async fn handle_check_event(
        &self,
        event: CheckEvent,
    ) -> Result<SessionTransition, TrackerError> {
        let health_status = event
            .health_status
            .trim()
            .parse::<HealthStatus>()
            .map_err(|_| TrackerError::InvalidHealthStatus(event.health_status.clone()))?;

        let employee = self.lookup_employee(&event.national_id).await?;
        if let Some(name) = event.name.as_deref() {
            if !employee.name_matches(name) {
                info!(employee_id = employee.id, "Name does not match national id");
                return Err(TrackerError::UnknownEmployee);
            }
        }

        let project_id = match event.project_id {
            Some(id) => Some(
                self.store
                    .find_project(id)
                    .await?
                    .ok_or(TrackerError::NoSiteAvailable)?
                    .id,
            ),
            None => None,
        };

        let local = event.event_time.with_timezone(&self.settings.utc_offset);
        let time = local.time();
        let time = time.with_nanosecond(0).unwrap_or(time);
        let key = SessionKey {
            employee_id: employee.id,
            work_date: local.date_naive(),
        };

        let resolved = ResolvedEvent {
            employee_id: employee.id,
            work_date: key.work_date,
            time,
            health_status,
            project_id,
            site: clean_text(event.site, Some(MAX_SITE_LEN)),
            observation: clean_text(event.observation, None),
        };

        let lock = self.locks.for_key(key).await;
        let _guard = lock.lock().await;
        debug!(employee_id = key.employee_id, work_date = %key.work_date, "Key lock acquired");

        let settings = self.settings.clone();
        let result = self
            .store
            .apply_check_event(
                key,
                Box::new(move |sessions: &[AttendanceSession]| {
                    decide(sessions, resolved, &settings)
                }),
            )
            .await;

        match &result {
            Ok(transition) => info!(
                employee_id = key.employee_id,
                work_date = %key.work_date,
                session_id = transition.session().id,
                transition = transition.label(),
                "Check event recorded"
            ),
            Err(TrackerError::Store(e)) => {
                tracing::error!(error = %e, employee_id = key.employee_id, "Check event failed")
            }
            Err(e) => warn!(error = %e, employee_id = key.employee_id, "Check event refused"),
        }

        result
    }
}

fn clean_text(value: Option<String>, max_chars: Option<usize>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() {
        return None;
    }
    Some(match max_chars {
        Some(max) => trimmed.chars().take(max).collect(),
        None => trimmed,
    })
}
