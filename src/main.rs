use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use osinfo_lookup::check::MemoryChecker;
use osinfo_lookup::construct::{Database, OsMatch, short_id_of};
use osinfo_lookup::datatype::DATE_FORMAT;
use osinfo_lookup::lifecycle;
use osinfo_lookup::settings::Settings;
use osinfo_lookup::template::load_templates;

#[derive(Parser)]
#[command(name = "osinfo-lookup")]
#[command(about = "Query the OS metadata database and check templates against it", long_about = None)]
struct Cli {
    /// Settings file (defaults to osinfo-lookup.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare template memory requests with the OS minimums.
    CheckMemory {
        /// Template directory, overriding the configured one.
        #[arg(long)]
        templates: Option<PathBuf>,
    },
    /// Look up OS records by short id or by a key=value clause.
    Lookup {
        term: String,

        /// Resolve this path against every match.
        #[arg(long)]
        path: Option<String>,
    },
    /// List the OSes that are still active.
    Active {
        /// Reference date (YYYY-MM-DD), today when omitted.
        #[arg(long)]
        as_of: Option<String>,

        #[arg(long)]
        grace_days: Option<i64>,
    },
}

fn init_logging(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: Cli, settings: Settings) -> anyhow::Result<bool> {
    let database = Database::open(&settings.sources)
        .with_context(|| format!("building the OS database from {:?}", settings.sources))?;

    match cli.cmd {
        Commands::CheckMemory { templates } => {
            let dir = templates.unwrap_or(settings.templates);
            info!(templates = %dir.display(), "running minimum memory requirements validation");
            let templates = load_templates(&dir).with_context(|| format!("reading templates from {}", dir.display()))?;
            let checker = MemoryChecker::with_label_prefix(&database, settings.label_prefix);
            let report = checker.check(&templates);
            info!(
                checked = report.checked,
                skipped = report.skipped.len(),
                violations = report.violations.len(),
                failures = report.failures.len(),
                "validation finished"
            );
            if !report.is_success() {
                println!("{}", report);
            }
            Ok(report.is_success())
        }
        Commands::Lookup { term, path } => {
            let mut all_found = true;
            for os in database.lookup(&term) {
                all_found &= os.is_found();
                match (&os, &path) {
                    (OsMatch::Missing(placeholder), _) => println!("{}: not found", placeholder.short_id()),
                    (OsMatch::Found(node), None) => println!("{}: {}", os.short_id(), node.record()),
                    (OsMatch::Found(_), Some(path)) => match os.get(path) {
                        Ok(value) => println!("{}: {}", os.short_id(), value),
                        Err(e) => {
                            all_found = false;
                            println!("{}: {}", os.short_id(), e);
                        }
                    },
                }
            }
            Ok(all_found)
        }
        Commands::Active { as_of, grace_days } => {
            let as_of = match as_of {
                Some(text) => NaiveDate::parse_from_str(&text, DATE_FORMAT)
                    .with_context(|| format!("--as-of {:?} is not a YYYY-MM-DD date", text))?,
                None => Utc::now().date_naive(),
            };
            let grace_days = grace_days.unwrap_or(settings.grace_days);
            for os in lifecycle::active_oses(&database, as_of, grace_days) {
                println!("{}", short_id_of(os.record()).unwrap_or_default());
            }
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&settings);

    match run(cli, settings) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
