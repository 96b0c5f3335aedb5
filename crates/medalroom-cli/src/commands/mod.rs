pub mod fix_rewards;
pub mod import;
pub mod settings;
pub mod status;
pub mod timer;
pub mod wallet;

use chrono::NaiveDate;
use medalroom_core::{Config, RewardSettings, ValidationError};

/// Parse a `YYYY-MM-DD` argument.
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        input: input.to_string(),
    })
}

/// Load the config file and resolve it for the engine.
pub fn load_settings() -> Result<(Config, RewardSettings), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let settings = config.validate()?;
    Ok((config, settings))
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
