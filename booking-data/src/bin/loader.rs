use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use booking_data::CouponLoader;
use booking_db_sqlite::SqliteRepository;
use clap::Parser;

/// Load coupon definitions from a CSV file into the database.
///
/// The CSV file should have the following columns:
/// - code: Redemption code (stored uppercase)
/// - name, description: Display text
/// - discount_type: `percentage` or `fixed`
/// - discount_value: Percent or currency amount
/// - minimum_amount: Smallest booking amount the coupon applies to
/// - maximum_discount: Cap for percentage coupons (empty for none)
/// - usage_limit: Total redemptions allowed (empty for unlimited)
/// - valid_from, valid_until: Inclusive dates (YYYY-MM-DD)
/// - is_active: true or false
#[derive(Parser, Debug)]
#[command(name = "booking-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing coupon data
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database file, created if missing (`:memory:` for a throwaway run)
    #[arg(short, long, default_value = "salon.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    println!("Loading coupons from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = CouponLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let loaded = CouponLoader::load(&repo, &records)
        .await
        .context("Failed to load coupons into database")?;

    println!("Successfully loaded {} coupons into the database.", loaded);

    Ok(())
}
