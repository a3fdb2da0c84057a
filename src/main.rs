use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tabled::{Table, Tabled};
use tracing::error;

use gridcurb::app::App;
use gridcurb::config::Config;
use gridcurb::domain::{HardwareProfile, ProfileName};
use gridcurb::error::Result;

#[derive(Parser)]
#[command(name = "gridcurb", version, about = "Wind curtailment ingestion and mining-potential analytics")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch and reconcile one settlement date.
    Reconcile { date: NaiveDate },
    /// Delete a date's data and reconcile it from scratch.
    Reprocess { date: NaiveDate },
    /// Show the curtailment summary for a date.
    Summary { date: NaiveDate },
    /// Show the mining-potential summary for a date.
    Mining {
        date: NaiveDate,
        /// Hardware profile name; omit to list every built-in profile.
        #[arg(long)]
        profile: Option<String>,
    },
    /// Manage the tracked-unit reference data.
    Units {
        #[command(subcommand)]
        command: UnitsCommand,
    },
    /// Manage the difficulty reference data.
    Difficulty {
        #[command(subcommand)]
        command: DifficultyCommand,
    },
}

#[derive(Subcommand)]
enum UnitsCommand {
    /// Import tracked units from a JSON file.
    Import { path: PathBuf },
    /// List the tracked units.
    List,
}

#[derive(Subcommand)]
enum DifficultyCommand {
    /// Import difficulty epochs from a JSON file.
    Import { path: PathBuf },
}

#[derive(Tabled)]
struct SummaryRow {
    date: String,
    energy_mwh: String,
    payment_gbp: String,
}

#[derive(Tabled)]
struct MiningRow {
    date: String,
    profile: String,
    btc: String,
}

#[derive(Tabled)]
struct UnitRow {
    unit_id: String,
    owner: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    config.init_logging();

    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &Config) -> Result<()> {
    let app = App::from_config(config)?;

    match cli.command {
        Command::Reconcile { date } => {
            let report = app.reconcile_date(date).await?;
            print_report(&report);
        }
        Command::Reprocess { date } => {
            let report = app.reprocess_date(date).await?;
            print_report(&report);
        }
        Command::Summary { date } => match app.daily_summary(date)? {
            Some(summary) => {
                let rows = vec![SummaryRow {
                    date: summary.settlement_date.to_string(),
                    energy_mwh: summary.total_energy_mwh.to_string(),
                    payment_gbp: summary.total_payment.to_string(),
                }];
                println!("{}", Table::new(rows));
            }
            None => println!("No summary for {date}: date not yet processed"),
        },
        Command::Mining { date, profile } => {
            let profiles: Vec<ProfileName> = match profile {
                Some(name) => vec![ProfileName::new(name)],
                None => HardwareProfile::builtin().into_iter().map(|p| p.name).collect(),
            };
            let mut rows = Vec::new();
            for name in &profiles {
                if let Some(summary) = app.mining_summary(date, name)? {
                    rows.push(MiningRow {
                        date: summary.settlement_date.to_string(),
                        profile: summary.profile.to_string(),
                        btc: summary.total_btc.to_string(),
                    });
                }
            }
            if rows.is_empty() {
                println!("No mining summary for {date}: date not yet processed");
            } else {
                println!("{}", Table::new(rows));
            }
        }
        Command::Units { command } => match command {
            UnitsCommand::Import { path } => {
                let count = app.import_units(&path)?;
                println!("Imported {count} tracked units");
            }
            UnitsCommand::List => {
                let rows: Vec<UnitRow> = app
                    .list_units()?
                    .into_iter()
                    .map(|u| UnitRow {
                        unit_id: u.unit_id.to_string(),
                        owner: u.owner,
                    })
                    .collect();
                println!("{}", Table::new(rows));
            }
        },
        Command::Difficulty { command } => match command {
            DifficultyCommand::Import { path } => {
                let count = app.import_difficulty(&path)?;
                println!("Imported {count} difficulty epochs");
            }
        },
    }

    Ok(())
}

fn print_report(report: &gridcurb::service::ReconcileReport) {
    if report.is_complete() {
        println!("{}: complete", report.date);
    } else {
        let missing: Vec<String> = report
            .missing_periods
            .iter()
            .map(|p| p.index().to_string())
            .collect();
        println!(
            "{}: incomplete, {} periods unresolved: {}",
            report.date,
            missing.len(),
            missing.join(",")
        );
    }
}
