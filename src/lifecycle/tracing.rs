//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter for the whole process.
//!
//! `RUST_LOG` wins when set; otherwise the configured filter (`BACKOFFICE_LOG`, default
//! `info`) applies.
//!
//! ```bash
//! # Boot sequence and workflow dispatch
//! RUST_LOG=info cargo run
//!
//! # Registrations, guard skips and record pipeline steps
//! RUST_LOG=debug cargo run
//!
//! # Only the core crate, verbosely
//! RUST_LOG=app_core=trace cargo run
//! ```

use tracing_subscriber::EnvFilter;

pub fn setup_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false) // unit names are carried as fields (module = ..., event = ...)
        .compact()
        .init();
}
