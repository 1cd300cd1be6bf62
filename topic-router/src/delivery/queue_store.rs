//! In-memory durable queue with visibility timeouts and receipt handles.

use crate::delivery::envelope::QueueEntry;
use crate::observability::events;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};
use uuid::Uuid;

const COMPONENT: &str = "queue_store";

/// Longest time a received entry stays hidden; longer requests are clamped to it.
pub const MAX_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

/// One entry handed out by [`TopicBroker::receive`](crate::TopicBroker::receive).
#[derive(Clone, Debug, PartialEq)]
pub struct ReceivedEntry {
    /// Handle to pass to `delete`; replaced every time the entry is handed out.
    pub receipt_handle: Uuid,
    /// How many times the entry has been handed out, this time included.
    pub receive_count: u32,
    pub entry: QueueEntry,
}

/// Visible and in-flight entry counts for one queue.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueueDepth {
    pub visible: usize,
    pub in_flight: usize,
}

struct StoredEntry {
    sequence: u64,
    receive_count: u32,
    entry: QueueEntry,
}

struct InFlightEntry {
    visible_at: Instant,
    stored: StoredEntry,
}

#[derive(Default)]
struct QueueState {
    next_sequence: u64,
    visible: VecDeque<StoredEntry>,
    in_flight: HashMap<Uuid, InFlightEntry>,
}

impl QueueState {
    /// Moves entries whose visibility timeout elapsed back into arrival order.
    fn restore_expired(&mut self, queue: &str, now: Instant) {
        let expired: Vec<Uuid> = self
            .in_flight
            .iter()
            .filter(|(_, in_flight)| in_flight.visible_at <= now)
            .map(|(receipt, _)| *receipt)
            .collect();

        for receipt in expired {
            if let Some(in_flight) = self.in_flight.remove(&receipt) {
                trace!(
                    event = events::QUEUE_VISIBILITY_EXPIRED,
                    component = COMPONENT,
                    queue,
                    msg_id = %in_flight.stored.entry.message_id(),
                    receive_count = in_flight.stored.receive_count,
                    "entry visible again"
                );
                let sequence = in_flight.stored.sequence;
                let position = self
                    .visible
                    .partition_point(|stored| stored.sequence < sequence);
                self.visible.insert(position, in_flight.stored);
            }
        }
    }
}

/// Arrival-ordered store backing one declared queue.
pub(crate) struct QueueStore {
    name: String,
    state: Mutex<QueueState>,
}

impl QueueStore {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Mutex::new(QueueState::default()),
        }
    }

    pub(crate) async fn enqueue(&self, entry: QueueEntry) {
        let mut state = self.state.lock().await;
        let sequence = state.next_sequence;
        state.next_sequence += 1;

        debug!(
            event = events::QUEUE_ENQUEUE,
            component = COMPONENT,
            queue = self.name.as_str(),
            msg_id = %entry.message_id(),
            raw = entry.is_raw(),
            "entry enqueued"
        );

        state.visible.push_back(StoredEntry {
            sequence,
            receive_count: 0,
            entry,
        });
    }

    /// Hands out up to `max_entries` visible entries, oldest first, hiding each one for
    /// `visibility_timeout`.
    pub(crate) async fn receive(
        &self,
        max_entries: usize,
        visibility_timeout: Duration,
    ) -> Vec<ReceivedEntry> {
        let visibility_timeout = visibility_timeout.min(MAX_VISIBILITY_TIMEOUT);
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.restore_expired(&self.name, now);

        let mut received = Vec::new();
        while received.len() < max_entries {
            let Some(mut stored) = state.visible.pop_front() else {
                break;
            };
            stored.receive_count += 1;
            let receipt_handle = Uuid::new_v4();

            trace!(
                event = events::QUEUE_RECEIVE,
                component = COMPONENT,
                queue = self.name.as_str(),
                msg_id = %stored.entry.message_id(),
                receipt = %receipt_handle,
                receive_count = stored.receive_count,
                "entry received"
            );

            received.push(ReceivedEntry {
                receipt_handle,
                receive_count: stored.receive_count,
                entry: stored.entry.clone(),
            });
            state.in_flight.insert(
                receipt_handle,
                InFlightEntry {
                    visible_at: now + visibility_timeout,
                    stored,
                },
            );
        }

        received
    }

    /// Removes an in-flight entry. Returns `false` when the handle is unknown or stale.
    ///
    /// An entry whose timeout elapsed can still be deleted with its last handle until it is
    /// handed out again.
    pub(crate) async fn delete(&self, receipt_handle: &Uuid) -> bool {
        let mut state = self.state.lock().await;
        match state.in_flight.remove(receipt_handle) {
            Some(in_flight) => {
                debug!(
                    event = events::QUEUE_DELETE_OK,
                    component = COMPONENT,
                    queue = self.name.as_str(),
                    msg_id = %in_flight.stored.entry.message_id(),
                    "entry deleted"
                );
                true
            }
            None => {
                debug!(
                    event = events::QUEUE_DELETE_UNKNOWN_RECEIPT,
                    component = COMPONENT,
                    queue = self.name.as_str(),
                    receipt = %receipt_handle,
                    "unknown or stale receipt handle"
                );
                false
            }
        }
    }

    /// Counts expired in-flight entries as visible without handing them back yet.
    pub(crate) async fn depth(&self) -> QueueDepth {
        let state = self.state.lock().await;
        let now = Instant::now();
        let expired = state
            .in_flight
            .values()
            .filter(|in_flight| in_flight.visible_at <= now)
            .count();
        QueueDepth {
            visible: state.visible.len() + expired,
            in_flight: state.in_flight.len() - expired,
        }
    }

    /// Drops every entry, visible or in flight.
    pub(crate) async fn purge(&self) {
        let mut state = self.state.lock().await;
        state.visible.clear();
        state.in_flight.clear();
    }
}
