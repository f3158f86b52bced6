use async_trait::async_trait;
use std::sync::Mutex;

use crate::model::{
    attendance::{AttendanceSession, SessionFilter, SessionKey, SessionResponse, SessionView},
    employee::Employee,
    project::Project,
};
use crate::tracker::{
    SessionTransition,
    error::TrackerError,
    store::{Decide, SessionStore, SessionWrite, close_target},
};

/// Store kept in process memory, with the same one-open-session rule the
/// database enforces.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    employees: Vec<Employee>,
    projects: Vec<Project>,
    sessions: Vec<AttendanceSession>,
    next_id: u64,
    /// Every write loses the race, as when another writer holds the key.
    write_conflict: bool,
}

impl MemoryStore {
    pub fn with_employee(self, employee: Employee) -> Self {
        self.state.lock().unwrap().employees.push(employee);
        self
    }

    pub fn with_project(self, project: Project) -> Self {
        self.state.lock().unwrap().projects.push(project);
        self
    }

    pub fn with_write_conflict(self) -> Self {
        self.state.lock().unwrap().write_conflict = true;
        self
    }

    pub fn sessions(&self) -> Vec<AttendanceSession> {
        self.state.lock().unwrap().sessions.clone()
    }
}

impl State {
    fn view(&self, session: &AttendanceSession) -> SessionView {
        let employee = self.employees.iter().find(|e| e.id == session.employee_id);
        SessionView {
            national_id: employee.map(|e| e.national_id.clone()).unwrap_or_default(),
            full_name: employee.map(|e| e.full_name.clone()).unwrap_or_default(),
            session: SessionResponse::from(session),
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_employee(&self, national_id: &str) -> Result<Option<Employee>, TrackerError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .employees
            .iter()
            .find(|e| e.national_id == national_id)
            .cloned())
    }

    async fn find_project(&self, project_id: u64) -> Result<Option<Project>, TrackerError> {
        let state = self.state.lock().unwrap();
        Ok(state.projects.iter().find(|p| p.id == project_id).cloned())
    }

    async fn apply_check_event(
        &self,
        key: SessionKey,
        decide: Decide,
    ) -> Result<SessionTransition, TrackerError> {
        let mut state = self.state.lock().unwrap();
        let day: Vec<AttendanceSession> = state
            .sessions
            .iter()
            .filter(|s| s.key() == key)
            .cloned()
            .collect();

        let write = decide(&day)?;
        if state.write_conflict && !matches!(write, SessionWrite::Unchanged(_)) {
            return Err(TrackerError::ConcurrentWriteConflict);
        }

        match write {
            SessionWrite::Open(new) => {
                if day.iter().any(|s| s.is_open()) {
                    return Err(TrackerError::ConcurrentWriteConflict);
                }
                state.next_id += 1;
                let session = new.into_session(state.next_id);
                state.sessions.push(session.clone());
                Ok(SessionTransition::Opened(session))
            }
            SessionWrite::Close {
                session_id,
                check_out_time,
                health_status_out,
            } => {
                let closed = close_target(&day, session_id, check_out_time, health_status_out)?;
                if let Some(slot) = state.sessions.iter_mut().find(|s| s.id == session_id) {
                    *slot = closed.clone();
                }
                Ok(SessionTransition::Closed(closed))
            }
            SessionWrite::Unchanged(transition) => Ok(transition),
        }
    }

    async fn list_sessions(
        &self,
        filter: &SessionFilter,
    ) -> Result<(Vec<SessionView>, i64), TrackerError> {
        let state = self.state.lock().unwrap();
        let mut views: Vec<SessionView> = state
            .sessions
            .iter()
            .map(|s| state.view(s))
            .filter(|v| {
                filter
                    .national_id
                    .as_deref()
                    .is_none_or(|id| v.national_id == id)
                    && filter.name.as_deref().is_none_or(|name| {
                        v.full_name.to_lowercase().contains(&name.to_lowercase())
                    })
                    && filter.work_date.is_none_or(|d| v.session.work_date == d)
                    && filter.status.is_none_or(|st| v.session.status == st)
            })
            .collect();

        views.sort_by(|a, b| {
            b.session
                .work_date
                .cmp(&a.session.work_date)
                .then(b.session.id.cmp(&a.session.id))
        });

        let total = views.len() as i64;
        let page = views
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.per_page() as usize)
            .collect();
        Ok((page, total))
    }

    async fn get_session(&self, session_id: u64) -> Result<Option<SessionView>, TrackerError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .map(|s| state.view(s)))
    }
}
