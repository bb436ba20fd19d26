use std::collections::{HashSet, VecDeque};

/// Titles already broadcast during this process lifetime.
///
/// Bounded: once `capacity` titles are held, recording a new one evicts the
/// oldest. Nothing is persisted.
#[derive(Debug)]
pub struct DedupLedger {
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl DedupLedger {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);

        Self {
            capacity,
            order: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    pub fn seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Record `id`; recording a known id is a no-op and keeps its age
    pub fn record(&mut self, id: &str) {
        if self.seen.contains(id) {
            return;
        }

        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }

        self.order.push_back(id.to_string());
        self.seen.insert(id.to_string());
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
