// ABOUTME: Target-side per-table state: required/requested queues, pending buffer, done set

use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::Result;
use rand::rngs::StdRng;

use crate::model::table::TableName;
use crate::row::Row;
use crate::sampler::Sampler;
use crate::store::RelationalStore;
use crate::value::PkValue;

/// Per-target-table queues and buffers.
pub struct TargetTableState {
    pub required: VecDeque<Row>,
    pub requested: VecDeque<Row>,
    pub pending: HashMap<Vec<PkValue>, Row>,
    pub done: HashSet<Vec<PkValue>>,
    pub fetch_all: bool,
    pub n_rows: i64,
    pub n_rows_desired: i64,
    sampler: Sampler,
}

impl TargetTableState {
    pub fn new(source_table: TableName, fetch_all: bool, n_rows_desired: i64, n_rows_for_sampling: i64) -> Self {
        Self {
            required: VecDeque::new(),
            requested: VecDeque::new(),
            pending: HashMap::new(),
            done: HashSet::new(),
            fetch_all,
            n_rows: 0,
            n_rows_desired,
            sampler: Sampler::new(source_table, n_rows_for_sampling.max(1)),
        }
    }

    pub fn contains(&self, pk: &[PkValue]) -> bool {
        self.pending.contains_key(pk) || self.done.contains(pk)
    }

    /// Required rows first, then requested, then a fresh sample. Returns
    /// `(row, prioritized)`.
    pub async fn next_row(
        &mut self,
        store: &dyn RelationalStore,
        rng: &mut StdRng,
    ) -> Result<Option<(Row, bool)>> {
        if let Some(row) = self.required.pop_front() {
            return Ok(Some((row, true)));
        }
        if let Some(row) = self.requested.pop_front() {
            return Ok(Some((row, false)));
        }
        match self.sampler.next_row(store, rng).await? {
            Some(row) => Ok(Some((row, false))),
            None => Ok(None),
        }
    }

    /// Pushes child-row candidates onto the queue: prioritized
    /// parents send every candidate to `required`; non-prioritized
    /// parents send the first candidate to the *front* of `requested`
    /// and the rest to the back ("first fresh candidate goes to the
    /// front").
    pub fn enqueue_children(&mut self, candidates: Vec<Row>, prioritized: bool) {
        if prioritized {
            self.required.extend(candidates);
            return;
        }
        let mut iter = candidates.into_iter();
        if let Some(first) = iter.next() {
            self.requested.push_front(first);
        }
        self.requested.extend(iter);
    }
}
