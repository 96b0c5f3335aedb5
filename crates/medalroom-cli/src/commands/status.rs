use medalroom_core::stats::{daily_history, day_status, next_level, DailyMinutes, DayStatus};
use medalroom_core::{current_level, Database, Level};
use serde::Serialize;

use super::{load_settings, today};

#[derive(Serialize)]
struct StatusReport {
    total_minutes: u64,
    level: Option<Level>,
    next_level: Option<Level>,
    history: Vec<DailyMinutes>,
    today: DayStatus,
}

pub fn run(days: u32, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, settings) = load_settings()?;
    let db = Database::open()?;
    let now = chrono::Local::now().time();
    let today = today();

    let total_minutes = u64::try_from(db.total_focused_seconds()? / 60).unwrap_or(0);
    let report = StatusReport {
        total_minutes,
        level: current_level(&settings.levels, total_minutes).cloned(),
        next_level: next_level(&settings.levels, total_minutes).cloned(),
        history: daily_history(&db, today, days)?,
        today: day_status(&db, &settings, today, now)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &StatusReport) {
    let level = report
        .level
        .as_ref()
        .map_or_else(|| "no level".to_string(), |l| format!("level {} {}", l.level, l.name));
    print!("{} min focused in total, {level}", report.total_minutes);
    if let Some(next) = &report.next_level {
        print!(", {} min to {}", next.remaining(report.total_minutes), next.name);
    }
    println!();

    for day in &report.history {
        println!("  {} {:>5} min", day.date, day.minutes);
    }

    let status = &report.today;
    println!();
    match &status.day_type {
        Some(name) => println!("today ({name}): {} min, earned {}", status.display.minutes, status.earned),
        None => println!("today: {} min, no day type configured", status.display.minutes),
    }
    for goal in &status.display.goals {
        println!(
            "  {:>4} min -> {} x{}  {:>5.1}%  rest from {}{}",
            goal.goal.threshold_minutes,
            goal.goal.medal,
            goal.goal.reward_count,
            goal.ratio * 100.0,
            goal.goal.rest_unlock.format("%H:%M"),
            if goal.reached { "  reached" } else { "" },
        );
    }
    let verdict = if status.can_rest { "rest allowed" } else { "keep going" };
    println!("nearest rest at {}, {verdict}", status.display.nearest_rest.format("%H:%M"));
}
