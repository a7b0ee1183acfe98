use crate::backend::Operation;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use wordplay_protocol::CallCountsSnapshot;

/// External call accounting, per operation and per model.
#[derive(Debug, Default)]
pub struct CallCounters {
    by_operation: [AtomicU64; Operation::COUNT],
    by_model: Mutex<BTreeMap<String, u64>>,
}

impl CallCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one call and returns the running total for `operation`.
    pub fn record(&self, operation: Operation, model: &str) -> u64 {
        let count = self.by_operation[operation.index()].fetch_add(1, Ordering::Relaxed) + 1;
        {
            let mut by_model = self
                .by_model
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *by_model.entry(model.to_string()).or_insert(0) += 1;
        }
        log::debug!("API request #{count} - model: {model}, operation: {operation}");
        count
    }

    pub fn count(&self, operation: Operation) -> u64 {
        self.by_operation[operation.index()].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CallCountsSnapshot {
        let by_operation: BTreeMap<String, u64> = Operation::ALL
            .iter()
            .map(|op| (op.as_str().to_string(), self.count(*op)))
            .collect();
        let total = by_operation.values().sum();
        let by_model = self
            .by_model
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        CallCountsSnapshot {
            total,
            by_operation,
            by_model,
        }
    }

    pub fn reset(&self) {
        for counter in &self.by_operation {
            counter.store(0, Ordering::Relaxed);
        }
        self.by_model
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tracks_operations_and_models() {
        let counters = CallCounters::new();
        assert_eq!(counters.record(Operation::GeneratePuzzle, "text"), 1);
        assert_eq!(counters.record(Operation::GeneratePuzzle, "text"), 2);
        counters.record(Operation::GeneratePartImage, "image");

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.by_operation["generate_puzzle"], 2);
        assert_eq!(snapshot.by_operation["verify_answer"], 0);
        assert_eq!(snapshot.by_model["text"], 2);
        assert_eq!(snapshot.by_model["image"], 1);
    }

    #[test]
    fn reset_zeroes_everything() {
        let counters = CallCounters::new();
        counters.record(Operation::JudgeMashup, "text");
        counters.reset();
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.total, 0);
        assert!(snapshot.by_model.is_empty());
    }
}
