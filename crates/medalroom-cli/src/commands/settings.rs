use clap::Subcommand;
use medalroom_core::Config;

#[derive(Subcommand, Default)]
pub enum SettingsAction {
    /// Config path and whether it validates
    #[default]
    Show,
    /// Get a config value
    Get {
        /// Config key (e.g. "always_rest_after", "import.dir")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Print the whole config as JSON
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SettingsAction::Show => {
            let config = Config::load()?;
            println!("config: {}", Config::path()?.display());
            let settings = config.validate()?;
            println!("valid, rest always allowed after {}", settings.fallback_rest.format("%H:%M"));

            let mut days: Vec<_> = config.calendar.iter().collect();
            days.sort_by_key(|(day, _)| weekday_order(day));
            for (day, day_type) in days {
                println!("  {day}: {day_type}");
            }
        }
        SettingsAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key).ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        SettingsAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("ok");
        }
        SettingsAction::List => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        SettingsAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}

fn weekday_order(day: &str) -> usize {
    ["mon", "tue", "wed", "thu", "fri", "sat", "sun"]
        .iter()
        .position(|d| *d == day)
        .unwrap_or(usize::MAX)
}
