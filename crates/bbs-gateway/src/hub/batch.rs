//! Per-connection event batching
//!
//! Events accepted for a connection are coalesced for a short window before
//! being written to the socket. A full buffer is flushed immediately so a
//! burst never waits on the timer.

use crate::connection::Connection;
use crate::protocol::GatewayMessage;
use bbs_core::NotificationEvent;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Accumulates events for one connection between flushes
pub struct BatchBuffer {
    /// Events awaiting delivery, in acceptance order
    pending: Mutex<Vec<NotificationEvent>>,
    /// Whether a timer flush is already scheduled
    flush_scheduled: AtomicBool,
    /// Coalescing window
    window: Duration,
    /// Maximum events per outbound frame
    max_batch_size: usize,
}

impl BatchBuffer {
    /// Create a new buffer
    pub fn new(window_ms: u64, max_batch_size: usize) -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(Vec::new()),
            flush_scheduled: AtomicBool::new(false),
            window: Duration::from_millis(window_ms),
            max_batch_size: max_batch_size.max(1),
        })
    }

    /// Accept an event for delivery
    ///
    /// Flushes inline when the buffer reaches the frame limit, otherwise
    /// schedules a timer flush if none is pending.
    pub fn push(self: &Arc<Self>, conn: &Arc<Connection>, event: NotificationEvent) {
        {
            let mut pending = self.pending.lock();
            pending.push(event);
            if pending.len() >= self.max_batch_size {
                // drain and deliver under the lock: sequence numbers are
                // assigned in the same order frames enter the channel, even
                // when a timer flush races this one
                let events = std::mem::take(&mut *pending);
                Self::deliver(conn, &events, self.max_batch_size);
                return;
            }
        }

        if !self.flush_scheduled.swap(true, Ordering::SeqCst) {
            let buffer = Arc::clone(self);
            let conn = Arc::clone(conn);
            tokio::spawn(async move {
                tokio::time::sleep(buffer.window).await;
                buffer.flush(&conn);
            });
        }
    }

    /// Drain everything pending and write it to the socket
    pub fn flush(&self, conn: &Arc<Connection>) {
        self.flush_scheduled.store(false, Ordering::SeqCst);
        let mut pending = self.pending.lock();
        if !pending.is_empty() {
            let events = std::mem::take(&mut *pending);
            Self::deliver(conn, &events, self.max_batch_size);
        }
    }

    /// Number of events currently buffered
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    fn deliver(conn: &Arc<Connection>, events: &[NotificationEvent], max_batch_size: usize) {
        for chunk in events.chunks(max_batch_size) {
            let seq = conn.next_sequence();
            let message = if chunk.len() == 1 {
                GatewayMessage::dispatch_event(seq, &chunk[0])
            } else {
                GatewayMessage::dispatch_batch(seq, chunk)
            };

            if let Err(e) = conn.try_send(message) {
                tracing::debug!(
                    connection_id = %conn.id(),
                    error = %e,
                    "Dropping buffered events for unwritable connection"
                );
                break;
            }
        }
    }
}
