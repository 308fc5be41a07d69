use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::debug;

use booking_cli::{app, config::AppConfig, logging, request::BookingRequest};
use booking_core::BookingRepository;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Salon booking flow.
///
/// Books a service from a scripted request file, or lists what the
/// configured database holds.
#[derive(Debug, Parser)]
#[command(name = "salon-booking", version)]
struct Cli {
    /// TOML configuration file with [database], [booking] and [logging] tables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `salon.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log level or EnvFilter directive; `RUST_LOG` still wins.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a booking from a TOML request file and print the confirmation.
    Book {
        #[arg(long)]
        request: PathBuf,
    },
    /// List stored bookings.
    Bookings {
        /// Only bookings on this day (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List stored coupons.
    Coupons,
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref())?.with_overrides(
        cli.backend,
        cli.db,
        cli.log_level,
    );
    logging::init_logging(&config.logging)?;
    debug!(?config, "configuration loaded");

    let repo = app::open_repository(&config.database).await?;

    match cli.command {
        Command::Book { request } => {
            let request = BookingRequest::load(&request)?;
            let today = Local::now().date_naive();
            let run = app::run_booking(repo, &config.booking, &request, today).await?;
            println!("{run}");
        }
        Command::Bookings { date } => {
            let bookings = repo.list_bookings(date).await?;
            if bookings.is_empty() {
                println!("No bookings.");
            }
            for booking in &bookings {
                println!("{}", app::format_booking(booking));
            }
        }
        Command::Coupons => {
            for coupon in repo.list_coupons().await? {
                println!("{}", app::format_coupon(&coupon));
            }
        }
    }

    Ok(())
}
