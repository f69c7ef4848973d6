use clap::Parser;
use strikegate::cli::{Cli, Commands};
use strikegate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    let _guard = strikegate::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting paper trading engine");
            args.execute(config).await?;
        }
        Commands::Status => {
            println!("strikegate status");
            println!("  Mode: Paper Trading");
            println!("  Status: Not running");
        }
        Commands::Config => {
            println!("Current configuration:");
            for platform in &config.platforms {
                println!(
                    "  Platform: {} (bankroll ${})",
                    platform.id, platform.initial_bankroll
                );
            }
            println!(
                "  Scan: every {}s, asset {:?}",
                config.scan.interval_secs, config.scan.asset
            );
            println!(
                "  Sizing: min ${}, max {}% of bankroll",
                config.sizing.min_position,
                config.sizing.max_bankroll_pct * rust_decimal_macros::dec!(100)
            );
            println!(
                "  Adaptive: enabled={}, every {}s",
                config.adaptive.enabled, config.adaptive.interval_secs
            );
        }
    }

    Ok(())
}
