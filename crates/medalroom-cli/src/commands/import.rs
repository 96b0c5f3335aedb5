use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};

use clap::Args;
use medalroom_core::{import_file, newest_json_in, AutoImport, Config, Database, ImportSource, ImportSummary, Trigger};

#[derive(Args)]
pub struct ImportArgs {
    /// Path to the export or backup file
    #[arg(
        short = 'F',
        long,
        required_unless_present_any = ["latest", "watch"],
        conflicts_with_all = ["latest", "watch"]
    )]
    file: Option<PathBuf>,
    /// Source format: spexport or spbackup (defaults to import.source)
    #[arg(short = 'S', long)]
    source: Option<String>,
    /// Import the newest .json file in import.dir
    #[arg(long, conflicts_with = "watch")]
    latest: bool,
    /// Re-import the newest .json file in import.dir every import.every.
    /// Press Enter to import now, `q` or Ctrl+C to quit.
    #[arg(long)]
    watch: bool,
    /// Print JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ImportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let source: ImportSource = args.source.as_deref().unwrap_or(&config.import.source).parse()?;

    if args.watch {
        return watch(&config, source, args.json);
    }

    let path = match args.file {
        Some(path) => path,
        None => newest_json_in(import_dir(&config)?)?,
    };

    let db = Database::open()?;
    let summary = import_file(&db, &path, source)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
        println!("run `fix-rewards` for the affected dates to update medals");
    }
    Ok(())
}

fn import_dir(config: &Config) -> Result<&Path, &'static str> {
    config
        .import
        .dir
        .as_deref()
        .map(Path::new)
        .ok_or("import.dir is not set; use `settings set import.dir <DIR>`")
}

fn watch(config: &Config, source: ImportSource, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dir = import_dir(config)?;
    let every = config.import.interval()?;
    let db = Database::open()?;
    let auto = AutoImport::new(&db, dir, source, every);

    let (tx, rx) = mpsc::channel();
    spawn_stdin_reader(tx);

    if !json {
        println!("Watching {} every {}", dir.display(), config.import.every);
        println!("press Enter to import now, `q` to quit");
    }
    auto.watch(&rx, |result| {
        let at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        match result {
            Ok(summary) if json => match serde_json::to_string(summary) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("{at} error: {e}"),
            },
            Ok(summary) => {
                print!("{at} ");
                print_summary(summary);
            }
            Err(e) => eprintln!("{at} error: {e}"),
        }
    });
    Ok(())
}

/// Forward stdin lines as triggers: `q`/`quit` stops, anything else runs now.
fn spawn_stdin_reader(tx: Sender<Trigger>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let trigger = match line.trim() {
                "q" | "quit" => Trigger::Stop,
                _ => Trigger::RunNow,
            };
            if tx.send(trigger).is_err() || trigger == Trigger::Stop {
                break;
            }
        }
    });
}

fn print_summary(summary: &ImportSummary) {
    println!(
        "Imported {} timers ({} min) from {}",
        summary.timers,
        summary.focused_ms / 60_000,
        summary.path.display()
    );
}
