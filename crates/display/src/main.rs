mod app;
mod render;
mod source;
mod text;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::app::{run_app, AppConfig};

fn main() {
    init_tracing();
    info!("=== Input Display Startup ===");

    if let Err(err) = run_app(AppConfig::default()) {
        error!(error = %err, "startup_failed");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
