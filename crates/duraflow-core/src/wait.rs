//! Registry of flows blocked on an external signal.
//!
//! Maps `flow_id` to a wait entry holding the parked resume arguments and a
//! notification primitive. Entries are created lazily by whichever side
//! arrives first: `Notify` stores a permit, so a resume delivered before the
//! awaiting task parks is not lost. Entries remain after resume; repeat use
//! of the same flow id is idempotent.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tokio::sync::Notify;
use uuid::Uuid;

struct WaitEntry {
    /// Serialized argument tuple handed over by the resumer.
    parked: Mutex<Option<Vec<u8>>>,
    signal: Notify,
}

/// Process-wide mapping from flow id to its suspension primitive.
#[derive(Default)]
pub struct WaitRegistry {
    entries: DashMap<Uuid, Arc<WaitEntry>>,
}

impl WaitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, flow_id: Uuid) -> Arc<WaitEntry> {
        self.entries
            .entry(flow_id)
            .or_insert_with(|| {
                Arc::new(WaitEntry {
                    parked: Mutex::new(None),
                    signal: Notify::new(),
                })
            })
            .clone()
    }

    /// Park the resume arguments for `flow_id` and wake its waiting task.
    pub fn deliver(&self, flow_id: Uuid, args: Vec<u8>) {
        let entry = self.entry(flow_id);
        *entry.parked.lock().unwrap() = Some(args);
        entry.signal.notify_one();
    }

    /// Block until a resume is delivered for `flow_id`, then take the parked
    /// arguments.
    pub async fn wait(&self, flow_id: Uuid) -> Option<Vec<u8>> {
        let entry = self.entry(flow_id);
        entry.signal.notified().await;
        entry.parked.lock().unwrap().take()
    }
}
