//! `IDIssuer` Service Entry Point
//!
//! Loads configuration, installs logging and metrics, and serves the
//! WebSocket issuance endpoint.

use idissuer::run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run().await
}
