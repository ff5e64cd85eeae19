//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve the configured address (host names included)
//! - Bind the socket the HTTP server accepts on
//!
//! # Design Decisions
//! - Port 0 binds an ephemeral port; the real address is logged and returned

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to resolve or bind the address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bind to the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let address = config.socket_address();
    let listener = TcpListener::bind(address.as_str())
        .await
        .map_err(|source| ListenerError::Bind { address, source })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!(address = %local_addr, "Listener bound");
    }
    Ok(listener)
}
