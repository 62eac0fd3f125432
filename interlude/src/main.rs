//! Interlude headless driver.
//!
//! Simulates a long-running job and prints the companion's events as JSON
//! lines, which is handy for checking content files and phase tables:
//!
//! ```bash
//! cargo run -p interlude -- --seconds 75 --estimate 60 --character kyur
//! ```

mod headless;

use interlude_core::CompanionConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let config = match CompanionConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let options = match headless::parse_options_from_args(&args, config) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };

    headless::run_headless(options).await.map_err(|e| e.into())
}

fn print_help() {
    println!("Interlude - keeps the user company during long waits");
    println!();
    println!("USAGE:");
    println!("  interlude [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help            Show this help message");
    println!("  --seconds <SECS>      How long the simulated job runs (default: 20)");
    println!("  --estimate <SECS>     Estimated job duration, enables progress");
    println!("  --process <NAME>      Name of the simulated job");
    println!("  --character <NAME>    Character persona (default: kyur)");
    println!("  --switch-to <NAME>    Switch character halfway through the wait");
    println!("  --content <PATH>      JSON content file to load");
    println!();
    println!("ENVIRONMENT:");
    println!("  INTERLUDE_CHARACTER       Default character persona");
    println!("  INTERLUDE_TICK_MS         Tick period in milliseconds (default: 1000)");
    println!("  INTERLUDE_ENGAGEMENT_MS   Delay before the first ambient pose (default: 500)");
    println!("  INTERLUDE_PHASE_BOUNDS    Comma-separated phase start times in milliseconds");
    println!("  INTERLUDE_CONTENT         JSON content file to load");
    println!("  RUST_LOG                  Log filter (default: info)");
}
