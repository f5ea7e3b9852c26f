//! Inbound TCP listener.
//!
//! Accepts any number of concurrent connections and reads newline-delimited
//! JSON off each one. Lines that fail to parse are dropped and reading
//! continues - messages are independent, so one bad line cannot poison the
//! connection. Peers send one message per connection and close, so read
//! tasks are short-lived; the accept loop itself runs until the runtime
//! aborts it at shutdown.

use hsring_messages::{Envelope, WireMessage};
use hsring_types::RingPosition;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{trace, warn};

pub(crate) async fn run(
    listener: TcpListener,
    position: RingPosition,
    inbox: mpsc::UnboundedSender<Envelope>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                trace!(%peer, "connection accepted");
                let inbox = inbox.clone();
                tokio::spawn(read_connection(stream, position, inbox));
            }
            Err(e) => {
                warn!(error = %e, "accept failed");
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}

async fn read_connection(
    stream: TcpStream,
    position: RingPosition,
    inbox: mpsc::UnboundedSender<Envelope>,
) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match WireMessage::parse_line(&line) {
                Ok(message) => {
                    let envelope = Envelope::received(message, &position);
                    if inbox.send(envelope).is_err() {
                        // Dispatcher is gone; the node is shutting down.
                        return;
                    }
                }
                Err(e) => trace!(error = %e, "dropping unparseable line"),
            },
            Ok(None) => return,
            Err(e) => {
                trace!(error = %e, "connection read failed");
                return;
            }
        }
    }
}
