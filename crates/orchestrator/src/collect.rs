//! Report collection.

use hsring_messages::WireMessage;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// One node's terminal report, as collected off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeReport {
    pub uid: u64,
    pub winner: i64,
    pub rounds: u64,
    pub messages: u64,
}

/// Accept report connections until `expected` reports arrived or the
/// deadline elapsed, whichever is first.
///
/// Each connection carries exactly one line; anything on this port that is
/// not a well-formed report is dropped. The listener must be bound before
/// the nodes are spawned - their report retry budget is short.
pub async fn collect_reports(
    listener: TcpListener,
    expected: usize,
    deadline: Duration,
) -> Vec<NodeReport> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let accept_task = tokio::spawn(accept_loop(listener, tx));

    let end = Instant::now() + deadline;
    let mut reports = Vec::with_capacity(expected);
    while reports.len() < expected {
        match timeout_at(end, rx.recv()).await {
            Ok(Some(report)) => {
                debug!(?report, "report collected");
                reports.push(report);
            }
            Ok(None) => break,
            Err(_) => {
                warn!(
                    got = reports.len(),
                    expected, "scenario deadline elapsed with reports missing"
                );
                break;
            }
        }
    }
    accept_task.abort();
    reports
}

async fn accept_loop(listener: TcpListener, tx: mpsc::UnboundedSender<NodeReport>) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                tokio::spawn(read_report(stream, tx.clone()));
            }
            Err(e) => {
                warn!(error = %e, "accept failed on report port");
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}

async fn read_report(stream: TcpStream, tx: mpsc::UnboundedSender<NodeReport>) {
    let mut lines = tokio::io::BufReader::new(stream).lines();
    match lines.next_line().await {
        Ok(Some(line)) => match WireMessage::parse_line(&line) {
            Ok(WireMessage::Report {
                uid,
                winner,
                rounds,
                messages,
            }) => {
                let _ = tx.send(NodeReport {
                    uid,
                    winner,
                    rounds,
                    messages,
                });
            }
            Ok(other) => warn!(?other, "non-report message on the report port"),
            Err(e) => warn!(error = %e, "unparseable line on the report port"),
        },
        Ok(None) => {}
        Err(e) => warn!(error = %e, "report connection read failed"),
    }
}
