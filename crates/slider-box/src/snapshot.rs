//! Latest-values handoff between the polling loop and its consumer

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::parse::parse_values;

#[derive(Debug)]
struct SnapshotState {
    values: Vec<i32>,
    /// Lines published since the last `fill`
    new_data: u64,
    /// Consecutive `fill` calls that found no new line
    missed: u64,
}

/// The most recent reading plus staleness bookkeeping, behind one lock
#[derive(Debug)]
pub struct SharedSnapshot {
    state: Mutex<SnapshotState>,
}

impl SharedSnapshot {
    /// Snapshot of `value_count` zeros with both counters at zero
    pub fn new(value_count: usize) -> Self {
        Self {
            state: Mutex::new(SnapshotState {
                values: vec![0; value_count],
                new_data: 0,
                missed: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SnapshotState> {
        // Every update leaves the state consistent, so a panic elsewhere
        // while holding the lock does not invalidate it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of values per reading
    pub fn value_count(&self) -> usize {
        self.lock().values.len()
    }

    /// Parse `line` into the stored values and count it as new data.
    ///
    /// Values missing from a short or malformed line keep their previous
    /// reading. Returns the number of values parsed.
    pub fn publish_line(&self, line: &[u8]) -> usize {
        let mut state = self.lock();
        let parsed = parse_values(line, &mut state.values);
        state.new_data += 1;
        parsed
    }

    /// Copy the latest values into `out` and return how many consecutive
    /// calls, this one included, found no new line.
    ///
    /// A return of 0 means at least one line arrived since the previous
    /// call. Never waits for data.
    pub fn fill(&self, out: &mut Vec<i32>) -> u64 {
        let mut state = self.lock();
        if state.new_data == 0 {
            state.missed += 1;
        } else {
            state.missed = 0;
        }
        state.new_data = 0;
        out.clear();
        out.extend_from_slice(&state.values);
        state.missed
    }

    /// Copy of the latest values, leaving the counters untouched
    pub fn latest(&self) -> Vec<i32> {
        self.lock().values.clone()
    }
}
