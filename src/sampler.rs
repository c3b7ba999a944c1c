// ABOUTME: Per-table lazy restartable random row stream
// ABOUTME: Regenerates from the store when its in-memory buffer is exhausted

use std::collections::VecDeque;

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::rngs::StdRng;

use crate::model::table::TableName;
use crate::row::Row;
use crate::store::RelationalStore;

/// An infinite sequence of approximately-`target_n`-sized batches of
/// random rows from one source table. The dialect-specific sampling SQL
/// (`random() < fraction` vs `ORDER BY random() LIMIT n`) lives behind
/// [`RelationalStore::random_sample`]; this type owns only the
/// "materialize a batch, shuffle it, yield one at a time, regenerate
/// when empty" behavior.
pub struct Sampler {
    table: TableName,
    target_n: i64,
    buffer: VecDeque<Row>,
}

impl Sampler {
    pub fn new(table: TableName, target_n: i64) -> Self {
        Self {
            table,
            target_n,
            buffer: VecDeque::new(),
        }
    }

    /// Returns the next sampled row, regenerating the batch from the
    /// store if the buffer has run dry. Returns `Ok(None)` only if the
    /// store gave back an empty batch twice in a row (genuinely
    /// exhausted source table).
    pub async fn next_row(&mut self, store: &dyn RelationalStore, rng: &mut StdRng) -> Result<Option<Row>> {
        if self.buffer.is_empty() {
            self.refill(store, rng).await?;
        }
        Ok(self.buffer.pop_front())
    }

    async fn refill(&mut self, store: &dyn RelationalStore, rng: &mut StdRng) -> Result<()> {
        let mut rows = store.random_sample(&self.table, self.target_n.max(1)).await?;
        rows.shuffle(rng);
        self.buffer = rows.into();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fake::{FakeStore, FakeTable};
    use crate::value::Value;

    fn fixture_store() -> FakeStore {
        let store = FakeStore::new();
        store.add_table(
            TableName::new("public", "state"),
            FakeTable {
                pk: vec!["abbrev".into()],
                columns: vec!["abbrev".into(), "name".into()],
                fks: vec![],
                rows: (0..4)
                    .map(|i| {
                        Row::new(vec![
                            ("abbrev".into(), Value::Text(format!("S{i}"))),
                            ("name".into(), Value::Text(format!("State {i}"))),
                        ])
                    })
                    .collect(),
            },
        );
        store
    }

    #[tokio::test]
    async fn yields_rows_and_regenerates_when_exhausted() {
        let store = fixture_store();
        let mut sampler = Sampler::new(TableName::new("public", "state"), 2);
        let mut rng = rand::SeedableRng::seed_from_u64(1);

        let mut seen = Vec::new();
        for _ in 0..6 {
            let row = sampler.next_row(&store, &mut rng).await.unwrap();
            seen.push(row.is_some());
        }
        assert!(seen.iter().all(|x| *x), "sampler should never report exhaustion for a non-empty table");
    }

    #[tokio::test]
    async fn empty_table_yields_nothing() {
        let store = FakeStore::new();
        store.add_table(
            TableName::new("public", "empty"),
            FakeTable {
                pk: vec!["id".into()],
                columns: vec!["id".into()],
                fks: vec![],
                rows: vec![],
            },
        );
        let mut sampler = Sampler::new(TableName::new("public", "empty"), 2);
        let mut rng = rand::SeedableRng::seed_from_u64(1);
        let row = sampler.next_row(&store, &mut rng).await.unwrap();
        assert!(row.is_none());
    }
}
