//! # tariff: Pricing from the Command Line
//!
//! ```text
//! tariff --fixture demos/catalog.json order o-1
//! tariff --fixture demos/catalog.json product chair --currency EUR --country DE
//! tariff --fixture demos/catalog.json product chair --discount spring:10%
//! tariff --fixture demos/catalog.json delivery post --summary
//! tariff config
//! ```
//!
//! Sheets are printed as JSON on stdout; logs go to stderr
//! (`RUST_LOG=tariff_engine=trace` shows every adapter step).

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{OrderArgs, ProductArgs, ProviderArgs};

/// Price products, orders, deliveries and payments.
#[derive(Parser)]
#[command(name = "tariff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine configuration file (TOML). Defaults to the platform config dir.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Catalog, orders and exchange rates (JSON).
    #[arg(short, long, global = true)]
    fixture: Option<PathBuf>,

    /// Print totals instead of the full sheet.
    #[arg(long, global = true)]
    summary: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price one product
    Product(ProductArgs),

    /// Price an order with its positions, delivery and payment
    Order(OrderArgs),

    /// Price a delivery provider's fee
    Delivery(ProviderArgs),

    /// Price a payment provider's fee
    Payment(ProviderArgs),

    /// Print the effective engine configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let Cli {
        config,
        fixture,
        summary,
        command,
    } = Cli::parse();

    let config = tariff_engine::EngineConfig::load_or_default(config);
    let boot = |config| commands::boot(config, fixture.as_deref());

    let sheet = match command {
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            return Ok(());
        }
        Commands::Product(args) => boot(config)?.price_product(args.into_request()?).await?,
        Commands::Order(args) => boot(config)?.price_order(args.into_request()).await?,
        Commands::Delivery(args) => {
            boot(config)?
                .price_delivery(args.into_delivery_request())
                .await?
        }
        Commands::Payment(args) => {
            boot(config)?
                .price_payment(args.into_payment_request())
                .await?
        }
    };

    if summary {
        print!("{}", commands::summary(&sheet));
    } else {
        println!("{}", serde_json::to_string_pretty(&sheet)?);
    }
    Ok(())
}

/// Initializes the tracing subscriber on stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tariff_engine=trace` - Trace the engine only
/// - Default: INFO, DEBUG for tariff crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tariff_engine=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
