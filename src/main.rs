use log::{error, info, warn};
use time::OffsetDateTime;
use tokio::io::BufReader;

use mjs_uplink::config::UplinkConfig;
use mjs_uplink::uplink::{run, RunStats};
use mjs_uplink::utils::format_datetime;

async fn main_loop(config: UplinkConfig) -> Result<RunStats, Box<dyn std::error::Error>> {
    info!(
        "Starting uplink decoding at: {}",
        format_datetime(&OffsetDateTime::now_utc())
    );

    let stdout = tokio::io::stdout();
    let stats = match &config.input {
        Some(path) => {
            info!("Reading uplink messages from {}", path);
            let file = tokio::fs::File::open(path).await?;
            run(BufReader::new(file), stdout, &config).await?
        }
        None => {
            info!("Reading uplink messages from stdin");
            run(BufReader::new(tokio::io::stdin()), stdout, &config).await?
        }
    };

    Ok(stats)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match UplinkConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };
    if config.strict_flags {
        info!("Strict flag checking enabled");
    }

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            // Keep the sender alive so the select below only ends on input
            std::future::pending::<()>().await;
        }
        let _ = tx.send(());
    });

    // Run until input ends or a shutdown signal arrives
    tokio::select! {
        result = main_loop(config) => {
            match result {
                Ok(stats) => {
                    info!(
                        "Input exhausted: {} messages, {} rejected, {} measurements",
                        stats.messages, stats.rejected, stats.measurements
                    );
                    if stats.messages > 0 && stats.measurements == 0 {
                        warn!("No measurements decoded from this input!");
                    }
                }
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
