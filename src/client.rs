//! WebSocket dialer.
//!
//! Opens connections to the issuance endpoint, performs one request/response
//! exchange on each, and disconnects.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::domain::Identifier;
use crate::error::ClientError;

/// Payload sent to request an identifier. The server ignores its content.
pub const REQUEST_PAYLOAD: &str = "request";

/// Result of one connection's exchange.
#[derive(Debug)]
pub struct ExchangeOutcome {
    /// 1-based connection index.
    pub connection: usize,
    /// The identifier received, or why none was.
    pub result: Result<Identifier, ClientError>,
}

/// Connect to `url`, request one identifier, and disconnect.
///
/// # Errors
///
/// Returns a [`ClientError`] if the connection, the exchange, or parsing the
/// response fails, or if no response arrives within `limit`.
pub async fn request_id(url: &str, limit: Duration) -> Result<Identifier, ClientError> {
    timeout(limit, exchange(url))
        .await
        .map_err(|_| ClientError::Timeout(limit))?
}

async fn exchange(url: &str) -> Result<Identifier, ClientError> {
    let (mut stream, _) = connect_async(url).await.map_err(ClientError::Connect)?;

    stream
        .send(Message::text(REQUEST_PAYLOAD.to_string()))
        .await
        .map_err(ClientError::Send)?;

    let id = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => break text.as_str().parse::<Identifier>()?,
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
            Some(Ok(Message::Binary(_))) => return Err(ClientError::NonText),
            Some(Ok(Message::Close(_))) | None => return Err(ClientError::Closed),
            Some(Err(e)) => return Err(ClientError::Receive(e)),
        }
    };

    if let Err(e) = stream.close(None).await {
        debug!(error = %e, "Close handshake failed");
    }

    Ok(id)
}

/// Run `connections` exchanges against `url` concurrently.
///
/// Outcomes are returned ordered by connection index. A task that panics is
/// logged and left out.
pub async fn run_clients(url: &str, connections: usize, limit: Duration) -> Vec<ExchangeOutcome> {
    let mut tasks = JoinSet::new();

    for connection in 1..=connections {
        let url = url.to_string();
        tasks.spawn(async move {
            let result = request_id(&url, limit).await;
            ExchangeOutcome { connection, result }
        });
    }

    let mut outcomes = Vec::with_capacity(connections);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => {
                let connection = outcome.connection;
                match &outcome.result {
                    Ok(id) => info!(connection, %id, "Client request succeeded"),
                    Err(e) => error!(connection, error = %e, "Client request failed"),
                }
                outcomes.push(outcome);
            }
            Err(e) => error!(error = %e, "Client task failed"),
        }
    }

    outcomes.sort_by_key(|outcome| outcome.connection);
    outcomes
}

/// Run the dialer as configured.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or any exchange failed.
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load()?;
    crate::init_logging(&config);

    let client = &config.client;
    info!(url = %client.url, connections = client.connections, "Starting clients");

    let outcomes = run_clients(&client.url, client.connections, client.timeout()).await;
    let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
    let failed = client.connections - succeeded;

    info!(succeeded, failed, "All connections completed");

    if failed > 0 {
        anyhow::bail!("{failed} of {} connections failed", client.connections);
    }
    Ok(())
}
