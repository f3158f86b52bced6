use async_trait::async_trait;
use chrono::NaiveTime;

use crate::model::{
    attendance::{AttendanceSession, NewSession, SessionFilter, SessionKey, SessionView},
    employee::Employee,
    health_status::HealthStatus,
    project::Project,
};
use crate::tracker::{SessionTransition, error::TrackerError};

/// The single row change a check event results in.
#[derive(Debug, Clone)]
pub enum SessionWrite {
    Open(NewSession),
    Close {
        session_id: u64,
        check_out_time: NaiveTime,
        health_status_out: HealthStatus,
    },
    /// Nothing is written; the previous transition is reported again.
    Unchanged(SessionTransition),
}

/// Given every session of one key, ordered by id, picks the write to apply.
pub type Decide =
    Box<dyn FnOnce(&[AttendanceSession]) -> Result<SessionWrite, TrackerError> + Send>;

/// Durable home of sessions plus the employee and project directories they
/// reference.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn find_employee(&self, national_id: &str) -> Result<Option<Employee>, TrackerError>;

    async fn find_project(&self, project_id: u64) -> Result<Option<Project>, TrackerError>;

    /// Reads the sessions of `key` and applies the write chosen by `decide`
    /// atomically: no other writer of the same key may interleave, and a
    /// failure leaves no row behind.
    async fn apply_check_event(
        &self,
        key: SessionKey,
        decide: Decide,
    ) -> Result<SessionTransition, TrackerError>;

    async fn list_sessions(
        &self,
        filter: &SessionFilter,
    ) -> Result<(Vec<SessionView>, i64), TrackerError>;

    async fn get_session(&self, session_id: u64) -> Result<Option<SessionView>, TrackerError>;
}

/// Closed copy of the open session `session_id`, as a backend is about to persist it.
pub(crate) fn close_target(
    sessions: &[AttendanceSession],
    session_id: u64,
    check_out_time: NaiveTime,
    health_status_out: HealthStatus,
) -> Result<AttendanceSession, TrackerError> {
    let mut session = sessions
        .iter()
        .find(|s| s.id == session_id && s.is_open())
        .cloned()
        .ok_or(TrackerError::ConcurrentWriteConflict)?;
    session.check_out_time = Some(check_out_time);
    session.health_status_out = Some(health_status_out);
    Ok(session)
}
