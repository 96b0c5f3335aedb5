use chrono::NaiveDate;
use clap::Args;
use medalroom_core::{reconcile_range, BatchReport, Database, DayOutcome};

use super::{load_settings, parse_date, today};

#[derive(Args)]
pub struct FixRewardsArgs {
    /// Single date (YYYY-MM-DD), defaults to today
    #[arg(long, value_parser = parse_date, conflicts_with_all = ["from", "to"])]
    date: Option<NaiveDate>,
    /// First date of a range
    #[arg(long, value_parser = parse_date, requires = "to")]
    from: Option<NaiveDate>,
    /// Last date of a range, inclusive
    #[arg(long, value_parser = parse_date, requires = "from")]
    to: Option<NaiveDate>,
    /// Print JSON
    #[arg(long)]
    json: bool,
}

impl FixRewardsArgs {
    fn range(&self) -> (NaiveDate, NaiveDate) {
        match (self.date, self.from, self.to) {
            (Some(date), _, _) => (date, date),
            (None, Some(from), Some(to)) => (from, to),
            _ => {
                let today = today();
                (today, today)
            }
        }
    }
}

pub fn run(args: FixRewardsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, settings) = load_settings()?;
    let db = Database::open()?;
    let (from, to) = args.range();

    let report = reconcile_range(&db, &db, &settings.calendar, from, to)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    for day in &report.days {
        match day {
            DayOutcome::Reconciled { day_type, result } => {
                let change = if result.changed() {
                    format!(" ({})", result.delta)
                } else {
                    String::new()
                };
                println!(
                    "{} {:<10} {:>5} min  {}{}",
                    result.date, day_type, result.minutes, result.snapshot, change
                );
            }
            DayOutcome::Skipped { date, weekday } => {
                println!("{date} skipped, no day type for {weekday}");
            }
        }
    }

    match &report.wallet.totals {
        Some(totals) if !report.wallet.is_noop() => {
            println!("wallet {}: now {}", report.wallet.adjustment, totals);
        }
        _ => println!("wallet unchanged"),
    }
    if report.skipped() == report.days.len() {
        tracing::warn!("no date in range has a day type; check [calendar] in the config");
    }
}
