//! Personal Offloading Test, headless terminal driver.
//!
//! Runs one participant through the experiment over stdin/stdout and writes
//! the result document when the last phase completes.
//!
//! ```bash
//! cargo run -p offload -- --participant P042 --seed 7 --export-dir results
//! ```
//!
//! Settings can also come from `OFFLOAD_PARTICIPANT_ID`, `OFFLOAD_SEED` and
//! `OFFLOAD_EXPORT_DIR`, including via a `.env` file. Flags win.

mod headless;
mod input;
mod render;

use offload_core::ExperimentConfig;
use std::io;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // Logs go to stderr; stdout is the participant's screen.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = headless::parse_config_from_args(&args, ExperimentConfig::from_env()?)?;
    tracing::info!(participant = %config.participant_id, "starting headless session");

    headless::run_headless(config).await?;
    Ok(())
}

fn print_help() {
    println!("Personal Offloading Test");
    println!();
    println!("Usage: offload [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --participant <ID>   Participant id (default: P<epoch-millis>)");
    println!("  --seed <N>           Fixed RNG seed for reproducible stimuli");
    println!("  --export-dir <DIR>   Where to write google-effect-<ID>.json (default: .)");
    println!("  -h, --help           Show this help");
    println!();
    println!("Environment: OFFLOAD_PARTICIPANT_ID, OFFLOAD_SEED, OFFLOAD_EXPORT_DIR, RUST_LOG");
}
