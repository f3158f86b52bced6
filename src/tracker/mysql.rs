use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use crate::model::{
    attendance::{
        AttendanceSession, SessionFilter, SessionKey, SessionResponse, SessionStatus, SessionView,
    },
    employee::Employee,
    health_status::HealthStatus,
    project::Project,
};
use crate::tracker::{
    SessionTransition,
    error::{TrackerError, classify_write_error},
    store::{Decide, SessionStore, SessionWrite, close_target},
};

const SESSION_COLUMNS: &str = r#"
    s.id, s.employee_id, s.project_id, s.work_date, s.check_in_time, s.check_out_time,
    s.health_status_in, s.health_status_out, s.site, s.observation
"#;

#[derive(Debug, FromRow)]
struct SessionRow {
    id: u64,
    employee_id: u64,
    project_id: u64,
    work_date: NaiveDate,
    check_in_time: NaiveTime,
    check_out_time: Option<NaiveTime>,
    health_status_in: String,
    health_status_out: Option<String>,
    site: Option<String>,
    observation: Option<String>,
}

#[derive(Debug, FromRow)]
struct SessionViewRow {
    national_id: String,
    full_name: String,
    #[sqlx(flatten)]
    session: SessionRow,
}

fn parse_health(column: &str, value: &str) -> Result<HealthStatus, TrackerError> {
    value.parse().map_err(|_| {
        TrackerError::Store(sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: format!("unknown health status '{value}'").into(),
        })
    })
}

impl TryFrom<SessionRow> for AttendanceSession {
    type Error = TrackerError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(AttendanceSession {
            id: row.id,
            employee_id: row.employee_id,
            project_id: row.project_id,
            work_date: row.work_date,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            health_status_in: parse_health("health_status_in", &row.health_status_in)?,
            health_status_out: row
                .health_status_out
                .as_deref()
                .map(|v| parse_health("health_status_out", v))
                .transpose()?,
            site: row.site,
            observation: row.observation,
        })
    }
}

impl TryFrom<SessionViewRow> for SessionView {
    type Error = TrackerError;

    fn try_from(row: SessionViewRow) -> Result<Self, Self::Error> {
        let session = AttendanceSession::try_from(row.session)?;
        Ok(SessionView {
            national_id: row.national_id,
            full_name: row.full_name,
            session: SessionResponse::from(&session),
        })
    }
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    Str(&'a str),
    Date(NaiveDate),
}

pub struct MySqlSessionStore {
    pool: MySqlPool,
}

impl MySqlSessionStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for MySqlSessionStore {
    async fn find_employee(&self, national_id: &str) -> Result<Option<Employee>, TrackerError> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, national_id, full_name, position, status
            FROM employees
            WHERE national_id = ?
            "#,
        )
        .bind(national_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    async fn find_project(&self, project_id: u64) -> Result<Option<Project>, TrackerError> {
        let project = sqlx::query_as::<_, Project>(
            "SELECT id, name, status FROM projects WHERE id = ?",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn apply_check_event(
        &self,
        key: SessionKey,
        decide: Decide,
    ) -> Result<SessionTransition, TrackerError> {
        let mut tx = self.pool.begin().await?;

        // Row and gap locks on the key: a second writer waits here or deadlocks
        // out, and the open-session unique key catches anything that slips by.
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM attendance_sessions s
            WHERE s.employee_id = ? AND s.work_date = ?
            ORDER BY s.id
            FOR UPDATE
            "#
        ))
        .bind(key.employee_id)
        .bind(key.work_date)
        .fetch_all(&mut *tx)
        .await
        .map_err(classify_write_error)?;

        let sessions = rows
            .into_iter()
            .map(AttendanceSession::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            employee_id = key.employee_id,
            work_date = %key.work_date,
            sessions = sessions.len(),
            "Loaded sessions for key"
        );

        // Returning early drops `tx`, which rolls back.
        let transition = match decide(&sessions)? {
            SessionWrite::Open(new) => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO attendance_sessions
                        (employee_id, project_id, work_date, check_in_time,
                         health_status_in, site, observation)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(new.employee_id)
                .bind(new.project_id)
                .bind(new.work_date)
                .bind(new.check_in_time)
                .bind(new.health_status_in.as_ref())
                .bind(new.site.as_deref())
                .bind(new.observation.as_deref())
                .execute(&mut *tx)
                .await
                .map_err(classify_write_error)?;

                SessionTransition::Opened(new.into_session(result.last_insert_id()))
            }
            SessionWrite::Close {
                session_id,
                check_out_time,
                health_status_out,
            } => {
                let closed =
                    close_target(&sessions, session_id, check_out_time, health_status_out)?;

                let result = sqlx::query(
                    r#"
                    UPDATE attendance_sessions
                    SET check_out_time = ?, health_status_out = ?
                    WHERE id = ?
                    AND check_out_time IS NULL
                    "#,
                )
                .bind(check_out_time)
                .bind(health_status_out.as_ref())
                .bind(session_id)
                .execute(&mut *tx)
                .await
                .map_err(classify_write_error)?;

                if result.rows_affected() == 0 {
                    return Err(TrackerError::ConcurrentWriteConflict);
                }
                SessionTransition::Closed(closed)
            }
            SessionWrite::Unchanged(transition) => {
                tx.rollback().await?;
                return Ok(transition);
            }
        };

        tx.commit().await.map_err(classify_write_error)?;
        Ok(transition)
    }

    async fn list_sessions(
        &self,
        filter: &SessionFilter,
    ) -> Result<(Vec<SessionView>, i64), TrackerError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(national_id) = filter.national_id.as_deref() {
            where_sql.push_str(" AND e.national_id = ?");
            args.push(FilterValue::Str(national_id));
        }

        let name_like = filter.name.as_deref().map(|n| format!("%{}%", n.trim()));
        if let Some(like) = name_like.as_deref() {
            where_sql.push_str(" AND LOWER(e.full_name) LIKE LOWER(?)");
            args.push(FilterValue::Str(like));
        }

        if let Some(work_date) = filter.work_date {
            where_sql.push_str(" AND s.work_date = ?");
            args.push(FilterValue::Date(work_date));
        }

        if let Some(status) = filter.status {
            where_sql.push_str(match status {
                SessionStatus::Open => " AND s.check_out_time IS NULL",
                SessionStatus::Closed => " AND s.check_out_time IS NOT NULL",
            });
        }

        let from_sql = "FROM attendance_sessions s JOIN employees e ON e.id = s.employee_id";

        let count_sql = format!("SELECT COUNT(*) {from_sql}{where_sql}");
        debug!(sql = %count_sql, "Counting sessions");

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::Str(s) => count_q.bind(*s),
                FilterValue::Date(d) => count_q.bind(*d),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            r#"
            SELECT e.national_id, e.full_name, {SESSION_COLUMNS}
            {from_sql}
            {where_sql}
            ORDER BY s.work_date DESC, s.id DESC
            LIMIT ? OFFSET ?
            "#
        );
        debug!(sql = %data_sql, page = filter.page(), per_page = filter.per_page(), "Fetching sessions");

        let mut data_q = sqlx::query_as::<_, SessionViewRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::Str(s) => data_q.bind(s),
                FilterValue::Date(d) => data_q.bind(d),
            };
        }

        let rows = data_q
            .bind(filter.per_page())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        let views = rows
            .into_iter()
            .map(SessionView::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((views, total))
    }

    async fn get_session(&self, session_id: u64) -> Result<Option<SessionView>, TrackerError> {
        let row = sqlx::query_as::<_, SessionViewRow>(&format!(
            r#"
            SELECT e.national_id, e.full_name, {SESSION_COLUMNS}
            FROM attendance_sessions s
            JOIN employees e ON e.id = s.employee_id
            WHERE s.id = ?
            "#
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionView::try_from).transpose()
    }
}
