//! `IDIssuer` client entry point.
//!
//! Opens the configured number of concurrent connections, requests one
//! identifier on each, and logs the results.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    idissuer::client::run().await
}
