use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "medalroom-cli", version, about = "Medalroom CLI")]
struct Cli {
    /// Log what the engine does to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute medals for one or more dates and settle the wallet
    FixRewards(commands::fix_rewards::FixRewardsArgs),
    /// Show the medal wallet
    Wallet {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Today's focus, goals, rest time and level
    Status {
        /// Days of history to show
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=3660))]
        days: u32,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Manual timer records
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Import timers from Super Productivity
    Import(commands::import::ImportArgs),
    /// Configuration management
    Settings {
        #[command(subcommand)]
        action: Option<commands::settings::SettingsAction>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,medalroom_core=info,medalroom_cli=info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::FixRewards(args) => commands::fix_rewards::run(args),
        Commands::Wallet { json } => commands::wallet::run(json),
        Commands::Status { days, json } => commands::status::run(days, json),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Import(args) => commands::import::run(args),
        Commands::Settings { action } => commands::settings::run(action.unwrap_or_default()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
