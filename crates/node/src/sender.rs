//! Outbound sends with bounded retry.
//!
//! One message per connection: connect, write the line, flush, close.
//! Failures back off for a fixed delay and retry until the attempt budget
//! runs out, at which point the message is silently dropped - the protocol
//! absorbs the loss through the phase timeout above it.

use crate::Timing;
use hsring_messages::WireMessage;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::sleep;
use tracing::{debug, error, trace};

/// Sender shared by the dispatcher and the phase driver.
pub struct RingSender {
    timing: Timing,
    /// Successfully delivered protocol messages (probes, reflections,
    /// announcements). Report sends are not counted.
    messages_sent: AtomicU64,
}

impl RingSender {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            messages_sent: AtomicU64::new(0),
        }
    }

    /// Send a protocol message to a ring peer, counting it on success.
    pub async fn send_protocol(&self, port: u16, message: &WireMessage) -> bool {
        let delivered = self
            .send_with_retry(
                port,
                message,
                self.timing.peer_retry_attempts,
                self.timing.peer_retry_backoff,
            )
            .await;
        if delivered {
            self.messages_sent.fetch_add(1, Ordering::Relaxed);
        }
        delivered
    }

    /// Send the terminal report to the orchestrator. Not counted: the
    /// counter's value travels inside this very message.
    pub async fn send_report(&self, port: u16, message: &WireMessage) -> bool {
        self.send_with_retry(
            port,
            message,
            self.timing.report_retry_attempts,
            self.timing.report_retry_backoff,
        )
        .await
    }

    /// Protocol messages delivered so far.
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    async fn send_with_retry(
        &self,
        port: u16,
        message: &WireMessage,
        attempts: u32,
        backoff: Duration,
    ) -> bool {
        let line = match message.encode_line() {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "unencodable message");
                return false;
            }
        };
        for attempt in 1..=attempts {
            match send_once(port, line.as_bytes()).await {
                Ok(()) => return true,
                Err(e) => {
                    trace!(port, attempt, error = %e, "send failed");
                    if attempt < attempts {
                        sleep(backoff).await;
                    }
                }
            }
        }
        debug!(port, attempts, "retry budget exhausted, dropping message");
        false
    }
}

async fn send_once(port: u16, bytes: &[u8]) -> std::io::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(bytes).await?;
    stream.flush().await?;
    stream.shutdown().await?;
    Ok(())
}
