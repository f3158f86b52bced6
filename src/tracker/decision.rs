use chrono::{Duration, NaiveDate, NaiveTime};

use crate::model::{
    attendance::{AttendanceSession, NewSession},
    health_status::HealthStatus,
};
use crate::tracker::{
    ReentryPolicy, SessionTransition, TrackerSettings, error::TrackerError, store::SessionWrite,
};

/// A check event after validation, placed on the site-local calendar.
#[derive(Debug, Clone)]
pub struct ResolvedEvent {
    pub employee_id: u64,
    pub work_date: NaiveDate,
    pub time: NaiveTime,
    pub health_status: HealthStatus,
    pub project_id: Option<u64>,
    pub site: Option<String>,
    pub observation: Option<String>,
}

/// Two-state machine per key: an open session is closed by the next event,
/// otherwise a new one is opened. `sessions` holds every session of the key.
pub fn decide(
    sessions: &[AttendanceSession],
    event: ResolvedEvent,
    settings: &TrackerSettings,
) -> Result<SessionWrite, TrackerError> {
    let at = event.work_date.and_time(event.time);

    if let Some(latest) = sessions.iter().max_by_key(|s| s.id) {
        let gap = at.signed_duration_since(latest.last_transition_at());
        let window = settings.duplicate_window;

        // Same second as the last transition is always a repeat; a wider
        // window only applies when configured.
        let repeat = gap == Duration::zero()
            || (window > Duration::zero() && gap <= window && gap >= -window);
        if repeat {
            return Ok(SessionWrite::Unchanged(SessionTransition::from_session(
                latest.clone(),
            )));
        }
        if gap < Duration::zero() {
            return Err(TrackerError::OutOfOrderEvent);
        }
    }

    if let Some(open) = sessions.iter().find(|s| s.is_open()) {
        return Ok(SessionWrite::Close {
            session_id: open.id,
            check_out_time: event.time,
            health_status_out: event.health_status,
        });
    }

    if settings.reentry == ReentryPolicy::Reject && !sessions.is_empty() {
        return Err(TrackerError::AlreadyClosedForToday);
    }

    let project_id = event.project_id.ok_or(TrackerError::NoSiteAvailable)?;

    Ok(SessionWrite::Open(NewSession {
        employee_id: event.employee_id,
        project_id,
        work_date: event.work_date,
        check_in_time: event.time,
        health_status_in: event.health_status,
        site: event.site,
        observation: event.observation,
    }))
}
