//! Integration tests for the node runtime over real loopback sockets.

use hsring_messages::WireMessage;
use hsring_node::{ExitReason, NodeConfig, NodeRuntime, Timing};
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::net::TcpListener;
use tokio::time::timeout;

fn fast_timing() -> Timing {
    Timing {
        startup_grace: Duration::from_millis(100),
        ack_poll_interval: Duration::from_millis(10),
        phase_timeout: Duration::from_millis(600),
        peer_retry_attempts: 10,
        peer_retry_backoff: Duration::from_millis(20),
        report_retry_attempts: 5,
        report_retry_backoff: Duration::from_millis(20),
    }
}

async fn read_report(listener: &TcpListener) -> WireMessage {
    let (stream, _) = listener.accept().await.unwrap();
    let mut lines = tokio::io::BufReader::new(stream).lines();
    let line = lines.next_line().await.unwrap().unwrap();
    WireMessage::parse_line(&line).unwrap()
}

#[tokio::test]
async fn singleton_ring_reports_itself_as_winner() {
    let orch = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let orch_port = orch.local_addr().unwrap().port();

    let node = NodeRuntime::new(NodeConfig {
        n: 1,
        index: 0,
        base_port: 58_200,
        orch_port,
        uid: 7001,
        timing: fast_timing(),
    });
    let run = tokio::spawn(node.run());

    let report = timeout(Duration::from_secs(5), read_report(&orch))
        .await
        .expect("report before deadline");
    let WireMessage::Report {
        uid,
        winner,
        rounds,
        messages,
    } = report
    else {
        panic!("expected a report, got {report:?}");
    };
    assert_eq!(uid, 7001);
    assert_eq!(winner, 7001);
    assert_eq!(rounds, 1);
    // Two probes to itself plus two announcements; probe sends run on
    // background tasks, so some may not yet be counted when the report
    // snapshots the counter.
    assert!((2..=4).contains(&messages), "messages={messages}");

    assert_eq!(run.await.unwrap().unwrap(), ExitReason::Completed);
}

#[tokio::test]
async fn starved_phase_exits_without_a_report() {
    let orch = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let orch_port = orch.local_addr().unwrap().port();

    // A two-ring whose peer never starts: the probes exhaust their retries
    // and the phase times out.
    let node = NodeRuntime::new(NodeConfig {
        n: 2,
        index: 0,
        base_port: 58_210,
        orch_port,
        uid: 7002,
        timing: fast_timing(),
    });
    let reason = timeout(Duration::from_secs(5), node.run())
        .await
        .expect("exit before deadline")
        .unwrap();
    assert_eq!(reason, ExitReason::PhaseTimeout);

    // No report ever shows up.
    assert!(timeout(Duration::from_millis(300), orch.accept())
        .await
        .is_err());
}

#[tokio::test]
async fn phase_timeout_fires_while_sends_still_retry() {
    let orch = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let orch_port = orch.local_addr().unwrap().port();

    // Production-shaped ratio: the peer retry budget (5s) outlasts the
    // phase timeout (500ms). The ack clock must run from probe emission,
    // not from retry exhaustion.
    let node = NodeRuntime::new(NodeConfig {
        n: 2,
        index: 0,
        base_port: 58_230,
        orch_port,
        uid: 7004,
        timing: Timing {
            startup_grace: Duration::from_millis(100),
            ack_poll_interval: Duration::from_millis(10),
            phase_timeout: Duration::from_millis(500),
            peer_retry_attempts: 100,
            peer_retry_backoff: Duration::from_millis(50),
            report_retry_attempts: 5,
            report_retry_backoff: Duration::from_millis(20),
        },
    });

    let started = std::time::Instant::now();
    let reason = timeout(Duration::from_secs(10), node.run())
        .await
        .expect("exit before deadline")
        .unwrap();
    assert_eq!(reason, ExitReason::PhaseTimeout);
    assert!(
        started.elapsed() < Duration::from_secs(4),
        "timed out only after {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn rejects_out_of_range_index() {
    let node = NodeRuntime::new(NodeConfig {
        n: 2,
        index: 5,
        base_port: 58_220,
        orch_port: 58_221,
        uid: 7003,
        timing: fast_timing(),
    });
    assert!(node.run().await.is_err());
}
