use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;
use wordplay_protocol::AttemptRecord;

/// Receives one record per generation attempt. Side channel only: nothing
/// written here affects what the generator returns.
pub trait AttemptSink: Send + Sync {
    fn record(&self, record: AttemptRecord);
}

pub(crate) fn attempt_record(
    operation: &str,
    attempt: u32,
    success: bool,
    data: String,
    error: Option<String>,
) -> AttemptRecord {
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    AttemptRecord {
        timestamp_ms,
        operation: operation.to_string(),
        attempt,
        success,
        data,
        error,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AttemptSink for NullSink {
    fn record(&self, _record: AttemptRecord) {}
}

/// Keeps the most recent `capacity` records in memory.
#[derive(Debug)]
pub struct MemorySink {
    capacity: usize,
    records: Mutex<VecDeque<AttemptRecord>>,
}

impl MemorySink {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: Mutex::new(VecDeque::new()),
        }
    }

    pub fn snapshot(&self) -> Vec<AttemptRecord> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }
}

impl AttemptSink for MemorySink {
    fn record(&self, record: AttemptRecord) {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }
}

/// Fans records out to live subscribers. Records sent while nobody listens
/// are dropped.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<AttemptRecord>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AttemptRecord> {
        self.tx.subscribe()
    }
}

impl AttemptSink for BroadcastSink {
    fn record(&self, record: AttemptRecord) {
        let _ = self.tx.send(record);
    }
}
