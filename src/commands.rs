use crate::cli::{CycleAction, JournalAction, NotifyAction, ReminderAction};
use crate::model::Namespace;
use crate::notify::{self, DesktopNotifier};
use crate::render::{self, Fragment};
use crate::scheduler::ReminderState;
use crate::storage::{init_project_store, locate_store, RecordStore};
use crate::tracker::Tracker;
use crate::ui;
use crate::widgets::{Accordion, ContactForm};
use anyhow::{Context, Result};
use chrono::Utc;
use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

pub fn init() -> Result<()> {
    let location = init_project_store()?;
    println!("Initialized store at {}", location.dir.display());
    Ok(())
}

pub async fn cycle(action: CycleAction) -> Result<()> {
    let mut tracker = open_tracker()?;
    match action {
        CycleAction::Add {
            last_start,
            avg_cycle_length,
            period_length,
            wait,
        } => {
            let submission =
                tracker.submit_cycle(&last_start, &avg_cycle_length, &period_length, Utc::now())?;
            for line in render::render_prediction(&submission.prediction) {
                println!("{}", line);
            }
            if submission.reminder_scheduled {
                println!("Reminder set for the day before.");
            }
            finish(&mut tracker, wait).await;
        }
        CycleAction::List => print_fragments(&tracker.cycle_fragments()),
        CycleAction::Remind { days, wait } => {
            if tracker.remind_before(days)? {
                println!("Reminder scheduled for ~{} day(s) before the expected start.", days);
            } else {
                println!("That time has already passed; nothing scheduled.");
            }
            finish(&mut tracker, wait).await;
        }
        CycleAction::Clear { yes } => clear(&mut tracker, Namespace::Cycles, yes).await?,
    }
    Ok(())
}

pub async fn journal(action: JournalAction) -> Result<()> {
    let mut tracker = open_tracker()?;
    match action {
        JournalAction::Add { title, body } => {
            tracker.submit_journal(&title, &body, Utc::now())?;
            println!("Saved journal entry");
        }
        JournalAction::List => print_fragments(&tracker.journal_fragments()),
        JournalAction::Clear { yes } => clear(&mut tracker, Namespace::Journal, yes).await?,
    }
    Ok(())
}

pub async fn reminder(action: ReminderAction) -> Result<()> {
    let mut tracker = open_tracker()?;
    match action {
        ReminderAction::Add { text, due, wait } => {
            let notice = tracker.submit_reminder(&text, &due, Utc::now())?;
            println!("{}", notice.message());
            finish(&mut tracker, wait).await;
        }
        ReminderAction::List => print_fragments(&tracker.reminder_fragments()),
        ReminderAction::Clear { yes } => clear(&mut tracker, Namespace::Reminders, yes).await?,
    }
    Ok(())
}

pub async fn notify(action: NotifyAction) -> Result<()> {
    let tracker = open_tracker()?;
    match action {
        NotifyAction::Enable => {
            let settings_path = tracker.location().settings_path();
            let permission = notify::request_permission(
                tracker.notifier().as_ref(),
                &settings_path,
                ask("Allow bloom to show desktop notifications?"),
            )
            .await?;
            match permission {
                crate::config::Permission::Granted => println!("Notifications enabled"),
                _ => println!(
                    "Notifications are disabled. Run `bloom notify enable` again to allow them."
                ),
            }
        }
        NotifyAction::Status => println!("Notifications: {}", tracker.permission().label()),
    }
    Ok(())
}

pub fn faq() -> Result<()> {
    for item in Accordion::default().items() {
        println!("{}", item.question);
        println!("  {}", item.answer);
        println!();
    }
    Ok(())
}

pub fn contact(name: String, email: String, message: String) -> Result<()> {
    let mut form = ContactForm {
        name,
        email,
        message,
    };
    println!("{}", form.submit());
    Ok(())
}

pub async fn tui() -> Result<()> {
    let tracker = open_tracker()?;
    ui::run(tracker).await
}

fn open_tracker() -> Result<Tracker> {
    let cwd = env::current_dir()?;
    let location = locate_store(&cwd)?;
    let notifier = Arc::new(DesktopNotifier::new(location.settings_path()));
    Ok(Tracker::open(RecordStore::open(location), notifier))
}

async fn clear(tracker: &mut Tracker, namespace: Namespace, yes: bool) -> Result<()> {
    let confirmed = yes || ask(&format!("Clear all saved {}?", namespace.key())).await?;
    if !confirmed {
        println!("Nothing cleared");
        return Ok(());
    }
    tracker.clear(namespace)?;
    println!("Cleared {}", namespace.key());
    Ok(())
}

/// Either waits out the reminders scheduled by this command or warns that
/// they end with the process.
async fn finish(tracker: &mut Tracker, wait: bool) {
    let pending = tracker.take_pending();
    if pending.is_empty() {
        return;
    }
    if !wait {
        println!("Pending reminders only fire while bloom runs; use --wait or the TUI.");
        return;
    }
    for handle in pending {
        println!(
            "Waiting for \"{}\" at {}",
            handle.title(),
            render::format_local(&handle.fire_at())
        );
        match handle.settled().await {
            ReminderState::Fired => println!("Delivered"),
            ReminderState::Suppressed => println!("Skipped: notifications are not enabled"),
            ReminderState::Pending => {}
        }
    }
}

async fn ask(prompt: &str) -> Result<bool> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || -> Result<bool> {
        print!("{} [y/N] ", prompt);
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
    })
    .await
    .context("reading answer")?
}

fn print_fragments(fragments: &[Fragment]) {
    for fragment in fragments {
        for (idx, line) in fragment.lines.iter().enumerate() {
            if idx == 0 {
                println!("- {}", line);
            } else {
                println!("  {}", line);
            }
        }
    }
}
