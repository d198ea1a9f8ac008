use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bloom", version, about = "Cycle tracker, journal and gentle reminders")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project store in the current directory
    Init,
    /// Period cycle tracking
    Cycle {
        #[command(subcommand)]
        action: CycleAction,
    },
    /// Personal journal
    Journal {
        #[command(subcommand)]
        action: JournalAction,
    },
    /// Personal reminders
    Reminder {
        #[command(subcommand)]
        action: ReminderAction,
    },
    /// Desktop notification permission
    Notify {
        #[command(subcommand)]
        action: NotifyAction,
    },
    /// Frequently asked questions
    Faq,
    /// Send us a message
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
    /// Launch the interactive TUI
    Tui,
}

#[derive(Subcommand, Debug)]
pub enum CycleAction {
    /// Record a cycle and predict the next period
    Add {
        /// Start date of your last period (YYYY-MM-DD)
        last_start: String,
        /// Average cycle length in days
        avg_cycle_length: String,
        /// Typical period length in days
        period_length: String,
        /// Stay running until scheduled reminders are delivered
        #[arg(long)]
        wait: bool,
    },
    /// Show saved cycles
    List,
    /// Schedule a reminder ahead of the latest predicted start
    Remind {
        /// Days before the predicted start
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        days: u32,
        /// Stay running until the reminder is delivered
        #[arg(long)]
        wait: bool,
    },
    /// Delete all saved cycles
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum JournalAction {
    /// Write a journal entry
    Add {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
    },
    /// Show recent entries
    List,
    /// Delete all journal entries
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReminderAction {
    /// Add a reminder
    Add {
        /// What to be reminded of
        text: String,
        /// When, e.g. "2024-05-01 09:30"
        due: String,
        /// Stay running until the reminder is delivered
        #[arg(long)]
        wait: bool,
    },
    /// Show saved reminders
    List,
    /// Delete all reminders
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotifyAction {
    /// Ask for permission to show desktop notifications
    Enable,
    /// Show the current permission
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remind_days_must_be_positive() {
        assert!(Cli::try_parse_from(["bloom", "cycle", "remind", "--days", "0"]).is_err());
        let cli = Cli::try_parse_from(["bloom", "cycle", "remind", "--days", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Cycle {
                action: CycleAction::Remind { days: 3, .. }
            })
        ));
    }
}
