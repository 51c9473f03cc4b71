//! classtap: NFC room-entry scanner.
//!
//! Polls the reader, identifies tags and HCE phones, and reports each tap to
//! the attendance backend for the configured room.
//!
//! ```sh
//! RUST_LOG=debug classtap 12 --api-url http://192.168.0.10:5000 --simulate
//! ```

mod simulate;

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use classtap_core::RoomId;
use classtap_core::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_POLL_TIMEOUT_MS, DEFAULT_SCAN_COOLDOWN_SECS,
    DEFAULT_SUBMIT_TIMEOUT_MS,
};
use classtap_hardware::mock::MockReader;
use classtap_hardware::{AnyReader, ApduTransport};
use classtap_network::{HttpGateway, HttpGatewayConfig};
use classtap_scanner::{Scanner, ScannerConfig, SystemClock};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "classtap")]
#[command(version, about = "NFC room-entry scanner", long_about = None)]
struct Cli {
    /// Room the scanner is mounted in
    room_id: RoomId,

    /// Base URL of the attendance backend
    #[arg(long, env = "CLASSTAP_API_URL", default_value = DEFAULT_API_BASE_URL)]
    api_url: String,

    /// Seconds before the same tag is submitted again
    #[arg(long, default_value_t = DEFAULT_SCAN_COOLDOWN_SECS)]
    cooldown_secs: u64,

    /// How long one presence poll waits for a target
    #[arg(long, default_value_t = DEFAULT_POLL_TIMEOUT_MS)]
    poll_timeout_ms: u64,

    /// Timeout for one submission to the backend
    #[arg(long, default_value_t = DEFAULT_SUBMIT_TIMEOUT_MS)]
    submit_timeout_ms: u64,

    /// Read taps from stdin instead of a reader
    #[arg(long)]
    simulate: bool,
}

impl Cli {
    fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig::default()
            .with_cooldown(Duration::from_secs(self.cooldown_secs))
            .with_poll_timeout(Duration::from_millis(self.poll_timeout_ms))
    }

    fn gateway_config(&self) -> HttpGatewayConfig {
        HttpGatewayConfig {
            base_url: self.api_url.clone(),
            timeout: Duration::from_millis(self.submit_timeout_ms),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    if !cli.simulate {
        bail!("no reader driver is built into this binary; run with --simulate");
    }

    let config = cli.scanner_config();
    config.validate().context("invalid scanner configuration")?;

    let gateway =
        HttpGateway::new(cli.gateway_config()).context("failed to build HTTP client")?;

    let (reader, handle) = MockReader::with_name("simulated reader".to_string());
    let reader = AnyReader::Mock(reader);

    let info = reader
        .reader_info()
        .await
        .context("failed to query reader")?;
    info!(
        "Reader: {} ({}), firmware {}",
        info.name,
        info.protocols.join(", "),
        info.firmware_version.as_deref().unwrap_or("unknown")
    );
    info!("Room {}, submitting to {}", cli.room_id, gateway.endpoint());

    // The scanner keeps polling after stdin closes, until Ctrl-C
    let feeder = tokio::spawn(simulate::feed_taps(
        tokio::io::BufReader::new(tokio::io::stdin()),
        handle.clone(),
    ));

    let mut scanner = Scanner::new(reader, gateway, SystemClock, cli.room_id, config)
        .context("failed to start scanner")?;

    let stats = scanner
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Cannot listen for Ctrl-C: {}", e);
            }
        })
        .await;

    feeder.abort();
    info!(
        "Shutting down: {} taps detected, {} submitted",
        stats.detections, stats.delivered
    );
    drop(handle);
    Ok(())
}
