//! Local command transport.
//!
//! The primary instance listens on a loopback TCP port and accepts one
//! command line per connection. Owning that port is also what makes an
//! instance primary: a launch that cannot bind forwards its command line to
//! whoever holds the port and exits.

mod client;
mod server;

pub use client::{send_command, CONNECT_TIMEOUT};
pub use server::{CommandServer, ServerHandle, MAX_LINE_BYTES};

use std::io;
use std::net::SocketAddr;

/// Result of trying to become the primary instance.
#[derive(Debug)]
pub enum Instance {
    /// This process owns the command port.
    Primary(CommandServer),
    /// Another instance owns the port; the command line was handed to it.
    Secondary,
}

/// Bind `addr`, or forward `line` to the instance already bound there.
/// Forwarding failures are ignored: an unreachable primary looks the same
/// as one that accepted the command and did nothing.
pub async fn claim_or_forward(addr: SocketAddr, line: &str) -> io::Result<Instance> {
    match CommandServer::bind(addr).await {
        Ok(server) => Ok(Instance::Primary(server)),
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
            let line = line.trim().to_string();
            if !line.is_empty() {
                let sent = tokio::task::spawn_blocking(move || send_command(addr, &line)).await;
                match sent {
                    Ok(Ok(())) => tracing::info!(%addr, "forwarded command to running instance"),
                    Ok(Err(e)) => tracing::debug!(%addr, error = %e, "forwarding failed"),
                    Err(e) => tracing::debug!(error = %e, "forwarding task failed"),
                }
            }
            Ok(Instance::Secondary)
        }
        Err(e) => Err(e),
    }
}
