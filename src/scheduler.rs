use crate::config::Permission;
use crate::notify::Notifier;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::watch;

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y.%m.%d@%H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    Pending,
    Fired,
    Suppressed,
}

/// A reminder waiting on its timer. It can be observed but not cancelled.
#[derive(Debug)]
pub struct ReminderHandle {
    fire_at: DateTime<Utc>,
    title: String,
    state: watch::Receiver<ReminderState>,
}

impl ReminderHandle {
    pub fn fire_at(&self) -> DateTime<Utc> {
        self.fire_at
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn state(&self) -> ReminderState {
        *self.state.borrow()
    }

    /// Waits until the timer has elapsed. Stays `Pending` if the runtime
    /// shut down first.
    pub async fn settled(mut self) -> ReminderState {
        self.state
            .wait_for(|state| *state != ReminderState::Pending)
            .await
            .map(|state| *state)
            .unwrap_or(ReminderState::Pending)
    }
}

/// One-shot, in-process reminder timers on the current tokio runtime.
///
/// Nothing is persisted: reminders still pending when the process exits are
/// lost. Permission is checked when the timer elapses, not when it is set.
#[derive(Clone)]
pub struct Scheduler {
    notifier: Arc<dyn Notifier>,
}

impl Scheduler {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Scheduler { notifier }
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Schedules from user-entered text. Unparseable input schedules nothing.
    pub fn schedule_one_shot(
        &self,
        fire_at: &str,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Option<ReminderHandle> {
        let Some(fire_at) = parse_timestamp(fire_at) else {
            tracing::debug!(input = fire_at, "reminder time unparseable, skipping");
            return None;
        };
        self.schedule_at(fire_at, title, body)
    }

    pub fn schedule_at(
        &self,
        fire_at: DateTime<Utc>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Option<ReminderHandle> {
        self.schedule_from(Utc::now(), fire_at, title.into(), body.into())
    }

    /// Past and present times are skipped rather than fired immediately.
    fn schedule_from(
        &self,
        now: DateTime<Utc>,
        fire_at: DateTime<Utc>,
        title: String,
        body: String,
    ) -> Option<ReminderHandle> {
        let delay = match (fire_at - now).to_std() {
            Ok(delay) if !delay.is_zero() => delay,
            _ => {
                tracing::debug!(%fire_at, "reminder time already passed, skipping");
                return None;
            }
        };
        let (tx, rx) = watch::channel(ReminderState::Pending);
        let notifier = Arc::clone(&self.notifier);
        let task_title = title.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let state = if notifier.permission() == Permission::Granted {
                if let Err(err) = notifier.dispatch(&task_title, &body) {
                    tracing::warn!(title = %task_title, error = %err, "failed to deliver reminder");
                }
                ReminderState::Fired
            } else {
                ReminderState::Suppressed
            };
            tracing::info!(title = %task_title, ?state, "reminder elapsed");
            let _ = tx.send(state);
        });
        tracing::info!(%title, %fire_at, "reminder scheduled");
        Some(ReminderHandle {
            fire_at,
            title,
            state: rx,
        })
    }
}

/// Parses RFC 3339 timestamps, or local date/times such as `2024-05-01 09:30`.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::default()))
        })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
