//! WebSocket identifier exchange.
//!
//! Each upgraded connection runs its own task. Every inbound data message
//! gets exactly one issuance attempt; a successful one is answered with the
//! identifier as a decimal text message before the next message is read.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use metrics::{counter, gauge};
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::service::IssuanceService;

/// Why a connection loop ended.
#[derive(Debug, thiserror::Error)]
enum Disconnect {
    /// The peer sent a close frame or dropped the stream.
    #[error("peer closed the connection")]
    PeerClosed,

    /// No inbound message arrived within the idle deadline.
    #[error("idle for {0:?}")]
    IdleTimeout(Duration),

    /// Reading from the socket failed.
    #[error("read failed: {0}")]
    Read(axum::Error),

    /// Writing the response failed.
    #[error("write failed: {0}")]
    Write(axum::Error),
}

/// Upgrade an HTTP request to a WebSocket identifier exchange.
pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let issuance = Arc::clone(&state.issuance);
    let idle_timeout = state.config.server.idle_timeout();

    ws.on_failed_upgrade(|err| warn!(error = %err, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| handle_connection(socket, issuance, idle_timeout))
}

/// Serve one connection until it closes or fails.
async fn handle_connection(
    mut socket: WebSocket,
    issuance: Arc<IssuanceService>,
    idle_timeout: Option<Duration>,
) {
    let span = info_span!("connection", id = %Uuid::new_v4());

    async move {
        counter!("idissuer_connections_total").increment(1);
        let active = gauge!("idissuer_connections_active");
        active.increment(1.0);
        debug!("Connection opened");

        let reason = serve(&mut socket, &issuance, idle_timeout).await;
        active.decrement(1.0);

        match &reason {
            Disconnect::PeerClosed => debug!("Connection closed by peer"),
            Disconnect::IdleTimeout(_) => info!(%reason, "Connection closed"),
            Disconnect::Read(_) | Disconnect::Write(_) => warn!(%reason, "Connection closed"),
        }
    }
    .instrument(span)
    .await;
}

/// Run the request/response loop. Only returns once the connection is done.
async fn serve(
    socket: &mut WebSocket,
    issuance: &IssuanceService,
    idle_timeout: Option<Duration>,
) -> Disconnect {
    loop {
        if let Err(reason) = next_request(socket, idle_timeout).await {
            return reason;
        }

        let id = match issuance.issue() {
            Ok(id) => id,
            Err(e) => {
                // No response for this request; the connection stays open.
                error!(
                    error = %e,
                    error_code = e.error_code().as_i32(),
                    "Identifier issuance failed"
                );
                continue;
            }
        };

        if let Err(e) = socket.send(Message::Text(id.to_string().into())).await {
            return Disconnect::Write(e);
        }
        debug!(%id, "Identifier issued");
    }
}

/// Wait for the next data message. Its content is not interpreted.
async fn next_request(
    socket: &mut WebSocket,
    idle_timeout: Option<Duration>,
) -> Result<(), Disconnect> {
    loop {
        let received = match idle_timeout {
            Some(limit) => timeout(limit, socket.recv())
                .await
                .map_err(|_| Disconnect::IdleTimeout(limit))?,
            None => socket.recv().await,
        };

        match received {
            Some(Ok(Message::Text(_) | Message::Binary(_))) => return Ok(()),
            // Pings are answered by the transport.
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            Some(Ok(Message::Close(_))) | None => return Err(Disconnect::PeerClosed),
            Some(Err(e)) => return Err(Disconnect::Read(e)),
        }
    }
}
