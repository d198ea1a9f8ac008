use crate::model::{CycleRecord, JournalEntry, ReminderEntry};
use crate::predict::Prediction;
use chrono::{DateTime, Local, NaiveDate, Utc};

/// Display lines for one list item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub lines: Vec<String>,
}

impl Fragment {
    fn single(line: impl Into<String>) -> Self {
        Fragment {
            lines: vec![line.into()],
        }
    }
}

pub fn render_prediction(prediction: &Prediction) -> Vec<String> {
    vec![
        format!("Next start: {}", format_date(prediction.next_start)),
        format!("Next end: {}", format_date(prediction.next_end)),
        format!("Days until: {}", prediction.days_until_next_start),
    ]
}

pub fn render_cycles(items: &[CycleRecord], limit: usize) -> Vec<Fragment> {
    if items.is_empty() {
        return vec![Fragment::single("No saved cycles yet.")];
    }
    items
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, c)| Fragment {
            lines: vec![
                format!("Entry {}: Last start: {}", idx + 1, format_date(c.last_start)),
                format!(
                    "Avg length: {} days • Period length: {} days",
                    c.avg_cycle_length_days, c.period_length_days
                ),
                format!(
                    "Next start: {} • End: {}",
                    format_date(c.predicted_next_start),
                    format_date(c.predicted_next_end)
                ),
            ],
        })
        .collect()
}

pub fn render_journal(items: &[JournalEntry], limit: usize) -> Vec<Fragment> {
    if items.is_empty() {
        return vec![Fragment::single("No entries yet.")];
    }
    items
        .iter()
        .take(limit)
        .map(|e| Fragment {
            lines: vec![
                format!(
                    "{} — {}",
                    e.title.as_deref().unwrap_or("Untitled"),
                    format_local(&e.created_at)
                ),
                e.body.clone().unwrap_or_default(),
            ],
        })
        .collect()
}

pub fn render_reminders(items: &[ReminderEntry], limit: usize) -> Vec<Fragment> {
    if items.is_empty() {
        return vec![Fragment::single("No reminders yet.")];
    }
    items
        .iter()
        .take(limit)
        .map(|r| Fragment {
            lines: vec![
                format!("{} — {}", r.text, format_local(&r.due_at)),
                format!("Added: {}", format_local(&r.created_at)),
            ],
        })
        .collect()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%a %b %d %Y").to_string()
}

pub fn format_local(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::predict;
    use chrono::TimeZone;

    fn cycle(last_start: NaiveDate) -> CycleRecord {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let p = predict(last_start, 28, 5, now).unwrap();
        CycleRecord {
            last_start,
            avg_cycle_length_days: 28,
            period_length_days: 5,
            predicted_next_start: p.next_start,
            predicted_next_end: p.next_end,
            created_at: now,
        }
    }

    #[test]
    fn empty_lists_show_placeholder() {
        assert_eq!(render_cycles(&[], 6)[0].lines, vec!["No saved cycles yet."]);
        assert_eq!(render_journal(&[], 10)[0].lines, vec!["No entries yet."]);
        assert_eq!(render_reminders(&[], 10)[0].lines, vec!["No reminders yet."]);
    }

    #[test]
    fn cycles_render_a_numbered_prefix() {
        let items: Vec<_> = (1..=8)
            .map(|d| cycle(NaiveDate::from_ymd_opt(2024, 1, d).unwrap()))
            .collect();
        let fragments = render_cycles(&items, 6);
        assert_eq!(fragments.len(), 6);
        assert_eq!(
            fragments[0].lines,
            vec![
                "Entry 1: Last start: Mon Jan 01 2024",
                "Avg length: 28 days • Period length: 5 days",
                "Next start: Mon Jan 29 2024 • End: Sat Feb 03 2024",
            ]
        );
        assert!(fragments[5].lines[0].starts_with("Entry 6:"));
    }

    #[test]
    fn untitled_journal_entries_get_a_label() {
        let entry = JournalEntry {
            title: None,
            body: Some("long walk".into()),
            created_at: Utc::now(),
        };
        let fragments = render_journal(&[entry], 10);
        assert!(fragments[0].lines[0].starts_with("Untitled — "));
        assert_eq!(fragments[0].lines[1], "long walk");
    }

    #[test]
    fn prediction_lines() {
        let now = Utc.with_ymd_and_hms(2024, 1, 28, 12, 0, 0).unwrap();
        let p = predict(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 28, 5, now).unwrap();
        assert_eq!(
            render_prediction(&p),
            vec![
                "Next start: Mon Jan 29 2024",
                "Next end: Sat Feb 03 2024",
                "Days until: 1",
            ]
        );
    }
}
