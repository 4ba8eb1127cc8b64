use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::command::Command;

/// Longest command line accepted; the rest of the connection is ignored.
pub const MAX_LINE_BYTES: u64 = 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Loopback listener turning command lines into [`Command`] values.
#[derive(Debug)]
pub struct CommandServer {
    listener: TcpListener,
}

impl CommandServer {
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "command listener bound");
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the accept loop on the current runtime. Parsed commands go to
    /// `tx`; the loop ends on [`ServerHandle::shutdown`], when the handle is
    /// dropped, or when the receiver goes away.
    pub fn spawn(self, tx: mpsc::UnboundedSender<Command>) -> ServerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(serve(self.listener, tx, shutdown_rx));
        ServerHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running [`CommandServer`].
#[derive(Debug)]
pub struct ServerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Stop accepting and wait until the socket is closed.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "command listener task failed");
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve(
    listener: TcpListener,
    tx: mpsc::UnboundedSender<Command>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        let stream = tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _peer)) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    continue;
                }
            },
        };

        let line = tokio::select! {
            _ = &mut shutdown => break,
            line = tokio::time::timeout(READ_TIMEOUT, read_line(stream)) => line,
        };
        let line = match line {
            Ok(Ok(line)) => line,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "unreadable command connection");
                continue;
            }
            Err(_) => {
                tracing::debug!("command connection timed out");
                continue;
            }
        };

        let Some(command) = Command::parse(&line) else {
            continue;
        };
        tracing::debug!(command = %command, "command received");
        if tx.send(command).is_err() {
            break;
        }
    }
    tracing::info!("command listener stopped");
}

async fn read_line(stream: TcpStream) -> io::Result<String> {
    let mut reader = BufReader::new(stream).take(MAX_LINE_BYTES);
    let mut line = String::new();
    reader.read_line(&mut line).await?;
    Ok(line)
}
