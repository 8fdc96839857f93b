//! # VetPOS Counter Library
//!
//! The counter application: cart, client and checkout commands for one
//! clinic front desk, driven from an interactive shell.
//!
//! ## Module Organization
//! ```text
//! vetpos_counter/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── state/
//! │   ├── backend.rs  ◄─── Arc<dyn BackendApi> (HTTP or in-memory)
//! │   ├── catalog.rs  ◄─── Last catalog + client snapshots
//! │   ├── config.rs   ◄─── ConfigState (TOML + env)
//! │   └── session.rs  ◄─── Cart + client, checkout in-flight flag
//! ├── commands/
//! │   ├── catalog.rs  ◄─── refresh, search, clients
//! │   ├── cart.rs     ◄─── add, qty, toggle, remove, discounts
//! │   └── sale.rs     ◄─── preview, checkout
//! ├── notification.rs ◄─── Success / warning / error messages
//! ├── shell.rs        ◄─── Line-oriented front end
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()          RUST_LOG, else debug for vetpos crates     │
//! │  2. ConfigState::load()     defaults → counter.toml → VETPOS_* env     │
//! │  3. BackendState            HttpBackend, or InMemoryBackend offline    │
//! │  4. Shell::run()            fetch catalog + clients, then prompt       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod notification;
pub mod shell;
pub mod state;

use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shell::Shell;
use state::{BackendState, ConfigState};

/// Runs the counter on stdin/stdout until the operator quits.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = ConfigState::load(None)?;
    info!(
        store = %config.store_name,
        offline = config.offline,
        "Starting VetPOS counter"
    );

    let backend = BackendState::from_config(&config)?;
    let shell = Shell::new(config, backend);

    shell
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    info!("Counter closed");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so they never interleave with shell output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=vetpos_backend=trace` - Trace HTTP calls only
/// - Default: INFO, DEBUG for vetpos crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vetpos_core=debug,vetpos_backend=debug,vetpos_counter=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
