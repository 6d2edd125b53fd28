//! Ingestgate entrypoint.
//!
//! Serves two sibling listeners: the external tenant-facing surface
//! (`/authorize`, `/upload`, `/metrics/v1/receive`) and the internal
//! operator surface (`/healthz`, `/healthz/ready`, `/metrics`). Both
//! start together and shut down together on SIGTERM/SIGINT.

mod config;
mod internal;
mod run;
mod shutdown;
mod telemetry;

use dotenvy::dotenv;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let config = Config::load()?;
    telemetry::init(config.log_level.as_deref());

    run::run(config).await
}
