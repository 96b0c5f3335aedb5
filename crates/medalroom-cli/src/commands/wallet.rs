use medalroom_core::{Database, Medal, MedalCounts};

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let record = db.wallet_record()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    let totals = record.as_ref().map(|r| r.totals.clone()).unwrap_or_else(MedalCounts::new);
    for medal in Medal::ALL.iter().rev() {
        println!("{:<7}{:>6}", medal.as_str(), totals.get(*medal));
    }
    println!("{:<7}{:>6}", "total", totals.total());
    if let Some(record) = record {
        println!("updated {} (revision {})", record.updated_at.format("%Y-%m-%d %H:%M"), record.revision);
    }
    Ok(())
}
