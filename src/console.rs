//! Console Source
//!
//! Relays operator input: every line read from the process's standard input
//! is trimmed and published to all peers.
//!
//! Standard input is read on a plain OS thread so a pending read never holds
//! up runtime shutdown.

use std::io::BufRead;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::websocket::Broadcaster;

/// Lines buffered between the reader thread and the relay task
const LINE_BUFFER: usize = 64;

/// Publish every line received on `lines` until the channel closes
///
/// Returns the number of lines relayed.
pub async fn relay_lines(mut lines: mpsc::Receiver<String>, broadcaster: Broadcaster) -> usize {
    let mut relayed = 0;

    while let Some(line) = lines.recv().await {
        let report = broadcaster.publish(line.trim()).await;
        relayed += 1;
        tracing::debug!(delivered = report.delivered, "Relayed console input");
    }

    tracing::info!(lines = relayed, "Console input closed");
    relayed
}

/// Feed lines from a blocking reader into `tx` until EOF or the receiver is gone
pub fn read_lines<R: BufRead>(reader: R, tx: mpsc::Sender<String>) {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if tx.blocking_send(line).is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read console input");
                return;
            }
        }
    }
}

/// Relay standard input in the background
pub fn spawn_stdin(broadcaster: Broadcaster) -> JoinHandle<usize> {
    let (tx, rx) = mpsc::channel(LINE_BUFFER);

    let reader = std::thread::Builder::new()
        .name("console-stdin".to_string())
        .spawn(move || read_lines(std::io::stdin().lock(), tx));
    if let Err(e) = reader {
        tracing::error!(error = %e, "Failed to start console reader");
    }

    tokio::spawn(relay_lines(rx, broadcaster))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::{ConnectionHub, Envelope, Peer};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_lines_are_trimmed_and_published() {
        let hub = Arc::new(ConnectionHub::default());
        let (peer, mut rx) = Peer::new(8);
        hub.add(Arc::new(peer)).await;

        let (tx, lines) = mpsc::channel(8);
        let input: &[u8] = b"  hello there  \nsecond line\r\n";
        std::thread::spawn(move || read_lines(input, tx))
            .join()
            .unwrap();

        let relayed = relay_lines(lines, Broadcaster::new(hub)).await;
        assert_eq!(relayed, 2);

        let first: Envelope = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        let second: Envelope = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(first, Envelope::message("hello there"));
        assert_eq!(second, Envelope::message("second line"));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let broadcaster = Broadcaster::new(Arc::new(ConnectionHub::default()));
        let (tx, lines) = mpsc::channel(1);
        drop(tx);
        assert_eq!(relay_lines(lines, broadcaster).await, 0);
    }
}
