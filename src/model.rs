use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Partition of the record store holding one record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Cycles,
    Journal,
    Reminders,
}

impl Namespace {
    pub fn key(&self) -> &'static str {
        match self {
            Namespace::Cycles => "cycles",
            Namespace::Journal => "journal",
            Namespace::Reminders => "reminders",
        }
    }
}

/// A record kind stored under a fixed namespace.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const NAMESPACE: Namespace;
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CycleRecord {
    pub last_start: NaiveDate,
    pub avg_cycle_length_days: u32,
    pub period_length_days: u32,
    pub predicted_next_start: NaiveDate,
    pub predicted_next_end: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub title: Option<String>,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReminderEntry {
    pub text: String,
    pub due_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Record for CycleRecord {
    const NAMESPACE: Namespace = Namespace::Cycles;
}

impl Record for JournalEntry {
    const NAMESPACE: Namespace = Namespace::Journal;
}

impl Record for ReminderEntry {
    const NAMESPACE: Namespace = Namespace::Reminders;
}

/// Rejected form input. The message is shown to the user as-is.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Please fill all fields with valid values.")]
    InvalidCycle,
    #[error("Please write a title or a note.")]
    EmptyJournal,
    #[error("Please add text and date/time.")]
    IncompleteReminder,
    #[error("Unrecognized date/time: {0} (use YYYY-MM-DD HH:MM)")]
    InvalidDueDate(String),
    #[error("Add a cycle first.")]
    NoCycle,
}

impl JournalEntry {
    /// Builds an entry from raw form fields, trimming both. Blank fields become `None`.
    pub fn new(title: &str, body: &str, created_at: DateTime<Utc>) -> Result<Self, FormError> {
        let title = non_blank(title);
        let body = non_blank(body);
        if title.is_none() && body.is_none() {
            return Err(FormError::EmptyJournal);
        }
        Ok(JournalEntry {
            title,
            body,
            created_at,
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journal_requires_title_or_body() {
        let now = Utc::now();
        assert_eq!(
            JournalEntry::new("  ", "\n", now).unwrap_err(),
            FormError::EmptyJournal
        );
        let entry = JournalEntry::new("", " slept well ", now).unwrap();
        assert_eq!(entry.title, None);
        assert_eq!(entry.body.as_deref(), Some("slept well"));
    }

    #[test]
    fn namespaces_use_fixed_keys() {
        let keys: Vec<_> = [Namespace::Cycles, Namespace::Journal, Namespace::Reminders]
            .iter()
            .map(|ns| ns.key())
            .collect();
        assert_eq!(keys, vec!["cycles", "journal", "reminders"]);
        assert_eq!(CycleRecord::NAMESPACE, Namespace::Cycles);
    }
}
