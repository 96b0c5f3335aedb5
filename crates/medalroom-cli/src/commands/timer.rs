use chrono::NaiveDate;
use clap::Subcommand;
use medalroom_core::{Database, NewTimer};

use super::{parse_date, today};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Record focused minutes
    Add {
        /// Minutes focused
        minutes: u32,
        /// What was worked on
        #[arg(long, default_value = "Focus")]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Date the time counts for (YYYY-MM-DD), defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// List recent timers
    List {
        #[arg(long, default_value_t = 20)]
        limit: u32,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a timer by id
    Delete { id: i64 },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        TimerAction::Add {
            minutes,
            name,
            description,
            date,
        } => {
            let fixated_on = date.unwrap_or_else(today);
            let id = db.save_timer(&NewTimer {
                external_id: None,
                name,
                description,
                fixated_on,
                spent_ms: i64::from(minutes) * 60_000,
            })?;
            println!("Timer {id} recorded: {minutes} min on {fixated_on}");
            println!("run `fix-rewards --date {fixated_on}` to update medals");
        }
        TimerAction::List { limit, json } => {
            let timers = db.list_timers(limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&timers)?);
            } else if timers.is_empty() {
                println!("No timers recorded");
            } else {
                for timer in timers {
                    println!(
                        "{:>6}  {}  {:>5} min  {}",
                        timer.id,
                        timer.fixated_on,
                        timer.spent_ms / 60_000,
                        timer.name
                    );
                }
            }
        }
        TimerAction::Delete { id } => {
            if !db.delete_timer(id)? {
                return Err(format!("no timer with id {id}").into());
            }
            println!("Timer {id} deleted");
        }
    }
    Ok(())
}
