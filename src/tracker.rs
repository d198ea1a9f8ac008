use crate::config::{Permission, Settings};
use crate::model::{CycleRecord, FormError, JournalEntry, Namespace, ReminderEntry};
use crate::notify::Notifier;
use crate::predict::{self, Prediction};
use crate::render::{self, Fragment};
use crate::scheduler::{parse_timestamp, ReminderHandle, ReminderState, Scheduler};
use crate::storage::{RecordStore, StoreLocation};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const UPCOMING_TITLE: &str = "Upcoming period";
pub const UPCOMING_BODY: &str = "Your period is expected tomorrow. Take care of yourself.";
pub const REMINDER_TITLE: &str = "Reminder";

#[derive(thiserror::Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] FormError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSubmission {
    pub record: CycleRecord,
    pub prediction: Prediction,
    pub reminder_scheduled: bool,
}

/// What the reminder form tells the user after saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderNotice {
    Scheduled,
    NotificationsOff,
}

impl ReminderNotice {
    pub fn message(&self) -> &'static str {
        match self {
            ReminderNotice::Scheduled => "Reminder scheduled. Keep bloom open to ensure delivery.",
            ReminderNotice::NotificationsOff => "Enable notifications to receive alerts.",
        }
    }
}

/// Application context: owns the record store, the in-memory copy of every
/// namespace, and the reminders scheduled during this run.
pub struct Tracker {
    store: RecordStore,
    settings: Settings,
    scheduler: Scheduler,
    cycles: Vec<CycleRecord>,
    journal: Vec<JournalEntry>,
    reminders: Vec<ReminderEntry>,
    pending: Vec<ReminderHandle>,
}

impl Tracker {
    pub fn open(store: RecordStore, notifier: Arc<dyn Notifier>) -> Self {
        let settings = Settings::load(&store.location().settings_path());
        Tracker {
            cycles: store.load(),
            journal: store.load(),
            reminders: store.load(),
            settings,
            scheduler: Scheduler::new(notifier),
            store,
            pending: Vec::new(),
        }
    }

    pub fn location(&self) -> &StoreLocation {
        self.store.location()
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        self.scheduler.notifier()
    }

    pub fn permission(&self) -> Permission {
        self.notifier().permission()
    }

    #[cfg(test)]
    pub fn cycles(&self) -> &[CycleRecord] {
        &self.cycles
    }

    #[cfg(test)]
    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    #[cfg(test)]
    pub fn reminders(&self) -> &[ReminderEntry] {
        &self.reminders
    }

    pub fn cycle_fragments(&self) -> Vec<Fragment> {
        render::render_cycles(&self.cycles, self.settings.cycles_shown)
    }

    pub fn journal_fragments(&self) -> Vec<Fragment> {
        render::render_journal(&self.journal, self.settings.journal_shown)
    }

    pub fn reminder_fragments(&self) -> Vec<Fragment> {
        render::render_reminders(&self.reminders, self.settings.reminders_shown)
    }

    /// Validates the cycle form, stores the prediction, and when notifications
    /// are already allowed, sets a reminder for the day before.
    pub fn submit_cycle(
        &mut self,
        last_start: &str,
        avg_cycle_length: &str,
        period_length: &str,
        now: DateTime<Utc>,
    ) -> Result<CycleSubmission, SubmitError> {
        let input = predict::parse_cycle_input(last_start, avg_cycle_length, period_length)?;
        let prediction = predict::predict_input(&input, now)?;
        let record = CycleRecord {
            last_start: input.last_start,
            avg_cycle_length_days: input.avg_cycle_length_days,
            period_length_days: input.period_length_days,
            predicted_next_start: prediction.next_start,
            predicted_next_end: prediction.next_end,
            created_at: now,
        };
        prepend_and_save(&self.store, &mut self.cycles, record.clone())?;

        let mut reminder_scheduled = false;
        if self.permission() == Permission::Granted {
            if let Some(fire_at) = predict::days_before(prediction.next_start, 1) {
                let handle = self
                    .scheduler
                    .schedule_at(fire_at, UPCOMING_TITLE, UPCOMING_BODY);
                reminder_scheduled = self.track(handle);
            }
        }
        Ok(CycleSubmission {
            record,
            prediction,
            reminder_scheduled,
        })
    }

    /// Schedules a reminder `days` days before the latest predicted start.
    /// Returns whether a timer was set; a time already in the past sets none.
    pub fn remind_before(&mut self, days: u32) -> Result<bool, FormError> {
        let next_start = self
            .cycles
            .first()
            .map(|c| c.predicted_next_start)
            .ok_or(FormError::NoCycle)?;
        let Some(fire_at) = predict::days_before(next_start, days) else {
            tracing::debug!(days, "heads-up time out of range, skipping");
            return Ok(false);
        };
        let (title, body) = heads_up_text(days);
        let handle = self.scheduler.schedule_at(fire_at, title, body);
        Ok(self.track(handle))
    }

    pub fn submit_journal(
        &mut self,
        title: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<JournalEntry, SubmitError> {
        let entry = JournalEntry::new(title, body, now)?;
        prepend_and_save(&self.store, &mut self.journal, entry.clone())?;
        Ok(entry)
    }

    pub fn submit_reminder(
        &mut self,
        text: &str,
        due: &str,
        now: DateTime<Utc>,
    ) -> Result<ReminderNotice, SubmitError> {
        let text = text.trim();
        if text.is_empty() || due.trim().is_empty() {
            return Err(FormError::IncompleteReminder.into());
        }
        let due_at =
            parse_timestamp(due).ok_or_else(|| FormError::InvalidDueDate(due.trim().to_string()))?;
        let entry = ReminderEntry {
            text: text.to_string(),
            due_at,
            created_at: now,
        };
        prepend_and_save(&self.store, &mut self.reminders, entry)?;

        if self.permission() == Permission::Granted {
            let handle = self.scheduler.schedule_one_shot(due, REMINDER_TITLE, text);
            self.track(handle);
            Ok(ReminderNotice::Scheduled)
        } else {
            Ok(ReminderNotice::NotificationsOff)
        }
    }

    /// Wipes a namespace. Callers confirm with the user first.
    pub fn clear(&mut self, namespace: Namespace) -> anyhow::Result<()> {
        self.store.clear(namespace)?;
        match namespace {
            Namespace::Cycles => self.cycles.clear(),
            Namespace::Journal => self.journal.clear(),
            Namespace::Reminders => self.reminders.clear(),
        }
        tracing::info!(namespace = namespace.key(), "namespace cleared");
        Ok(())
    }

    pub fn pending_count(&self) -> usize {
        self.pending
            .iter()
            .filter(|h| h.state() == ReminderState::Pending)
            .count()
    }

    /// Hands over every reminder scheduled so far, e.g. to wait on them.
    pub fn take_pending(&mut self) -> Vec<ReminderHandle> {
        std::mem::take(&mut self.pending)
    }

    fn track(&mut self, handle: Option<ReminderHandle>) -> bool {
        self.pending.retain(|h| h.state() == ReminderState::Pending);
        match handle {
            Some(handle) => {
                self.pending.push(handle);
                true
            }
            None => false,
        }
    }
}

fn prepend_and_save<R: crate::model::Record>(
    store: &RecordStore,
    items: &mut Vec<R>,
    record: R,
) -> anyhow::Result<()> {
    items.insert(0, record);
    if let Err(err) = store.save(items) {
        items.remove(0);
        return Err(err);
    }
    Ok(())
}

fn heads_up_text(days: u32) -> (&'static str, String) {
    match days {
        1 => ("Gentle reminder", "Your period may start tomorrow.".to_string()),
        n => ("Heads-up", format!("Your period may start in ~{} days.", n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use crate::storage::temp_store;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn tracker(dir: &std::path::Path, permission: Permission) -> (Tracker, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::with_permission(permission));
        (Tracker::open(temp_store(dir), notifier.clone()), notifier)
    }

    #[test]
    fn cycle_submission_predicts_and_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tracker, _) = tracker(tmp.path(), Permission::Default);
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();
        let submission = tracker.submit_cycle("2024-01-01", "28", "5", now).unwrap();
        assert_eq!(
            submission.record.predicted_next_start,
            NaiveDate::from_ymd_opt(2024, 1, 29).unwrap()
        );
        assert_eq!(
            submission.record.predicted_next_end,
            NaiveDate::from_ymd_opt(2024, 2, 3).unwrap()
        );
        assert!(!submission.reminder_scheduled);

        let reopened = temp_store(tmp.path()).load::<CycleRecord>();
        assert_eq!(reopened, vec![submission.record]);
    }

    #[test]
    fn later_cycles_come_first() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tracker, _) = tracker(tmp.path(), Permission::Default);
        let now = Utc::now();
        tracker.submit_cycle("2024-01-01", "28", "5", now).unwrap();
        tracker.submit_cycle("2024-01-29", "30", "4", now).unwrap();

        let loaded = temp_store(tmp.path()).load::<CycleRecord>();
        let starts: Vec<_> = loaded.iter().map(|c| c.last_start.to_string()).collect();
        assert_eq!(starts, vec!["2024-01-29", "2024-01-01"]);
    }

    #[test]
    fn invalid_cycle_leaves_store_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tracker, _) = tracker(tmp.path(), Permission::Default);
        let err = tracker
            .submit_cycle("2024-01-01", "0", "5", Utc::now())
            .unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(FormError::InvalidCycle)));
        assert!(tracker.cycles().is_empty());
        assert!(temp_store(tmp.path()).load::<CycleRecord>().is_empty());
    }

    #[test]
    fn empty_journal_entry_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tracker, _) = tracker(tmp.path(), Permission::Default);
        let err = tracker.submit_journal("", "", Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Please write a title or a note.");
        assert!(temp_store(tmp.path()).load::<JournalEntry>().is_empty());

        tracker.submit_journal("Monday", "", Utc::now()).unwrap();
        assert_eq!(tracker.journal().len(), 1);
    }

    #[test]
    fn reminder_without_permission_is_stored_but_not_scheduled() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tracker, _) = tracker(tmp.path(), Permission::Denied);
        let notice = tracker
            .submit_reminder("call mum", "2030-06-01 18:00", Utc::now())
            .unwrap();
        assert_eq!(notice, ReminderNotice::NotificationsOff);
        assert_eq!(tracker.reminders().len(), 1);
        assert_eq!(tracker.pending_count(), 0);
    }

    #[test]
    fn reminder_form_requires_text_and_time() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tracker, _) = tracker(tmp.path(), Permission::Default);
        let err = tracker.submit_reminder("  ", "2030-06-01 18:00", Utc::now()).unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(FormError::IncompleteReminder)));
        let err = tracker.submit_reminder("yoga", "soon", Utc::now()).unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(FormError::InvalidDueDate(_))));
        assert!(tracker.reminders().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn granted_cycle_schedules_day_before_reminder() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tracker, notifier) = tracker(tmp.path(), Permission::Granted);
        let today = Utc::now().date_naive().to_string();
        let submission = tracker.submit_cycle(&today, "28", "5", Utc::now()).unwrap();
        assert!(submission.reminder_scheduled);

        let handles = tracker.take_pending();
        assert_eq!(handles.len(), 1);
        assert_eq!(
            handles[0].fire_at(),
            predict::start_of_day(submission.prediction.next_start) - Duration::days(1)
        );
        for handle in handles {
            assert_eq!(handle.settled().await, ReminderState::Fired);
        }
        assert_eq!(
            notifier.sent(),
            vec![(UPCOMING_TITLE.to_string(), UPCOMING_BODY.to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn heads_up_needs_a_cycle() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tracker, notifier) = tracker(tmp.path(), Permission::Granted);
        assert_eq!(tracker.remind_before(3), Err(FormError::NoCycle));

        // a prediction long past schedules nothing
        tracker.submit_cycle("2001-01-01", "28", "5", Utc::now()).unwrap();
        assert_eq!(tracker.remind_before(3), Ok(false));
        assert!(tracker.take_pending().is_empty());

        let today = Utc::now().date_naive().to_string();
        tracker.submit_cycle(&today, "28", "5", Utc::now()).unwrap();
        tracker.take_pending();
        assert_eq!(tracker.remind_before(3), Ok(true));
        for handle in tracker.take_pending() {
            handle.settled().await;
        }
        assert_eq!(notifier.sent().last().unwrap().0, "Heads-up");
    }

    #[tokio::test(start_paused = true)]
    async fn heads_up_beyond_the_calendar_schedules_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tracker, _) = tracker(tmp.path(), Permission::Granted);
        let today = Utc::now().date_naive().to_string();
        tracker.submit_cycle(&today, "28", "5", Utc::now()).unwrap();
        tracker.take_pending();
        assert_eq!(tracker.remind_before(u32::MAX), Ok(false));
        assert_eq!(tracker.pending_count(), 0);
    }

    #[test]
    fn failed_save_leaves_memory_and_disk_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        // a plain file where the store directory should be
        std::fs::write(tmp.path().join(".bloom"), "not a directory").unwrap();
        let (mut tracker, _) = tracker(tmp.path(), Permission::Default);

        let err = tracker
            .submit_journal("Monday", "tired", Utc::now())
            .unwrap_err();
        assert!(matches!(err, SubmitError::Store(_)));
        assert!(tracker.journal().is_empty());

        let err = tracker
            .submit_cycle("2024-01-01", "28", "5", Utc::now())
            .unwrap_err();
        assert!(matches!(err, SubmitError::Store(_)));
        assert!(tracker.cycles().is_empty());
        assert_eq!(
            std::fs::read_to_string(tmp.path().join(".bloom")).unwrap(),
            "not a directory"
        );
    }

    #[test]
    fn clear_empties_memory_and_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut tracker, _) = tracker(tmp.path(), Permission::Default);
        tracker.submit_journal("a", "b", Utc::now()).unwrap();
        tracker.submit_cycle("2024-01-01", "28", "5", Utc::now()).unwrap();
        tracker.clear(Namespace::Journal).unwrap();
        assert!(tracker.journal().is_empty());
        assert!(temp_store(tmp.path()).load::<JournalEntry>().is_empty());
        assert_eq!(tracker.cycles().len(), 1);
        assert_eq!(tracker.journal_fragments()[0].lines, vec!["No entries yet."]);
    }
}
