// ABOUTME: Admission Engine: ensures parents exist, buffers the row, queues children
// ABOUTME: Parent recursion is an explicit work-stack instead of native recursion, to bound stack depth

use std::collections::HashMap;

use anyhow::{bail, Result};

use crate::model::table::{ForeignKey, TableDescriptor, TableName};
use crate::model::SchemaModel;
use crate::observer::{Listeners, RowAdded};
use crate::row::Row;
use crate::store::{ColumnFilter, RelationalStore};
use crate::target_state::TargetTableState;
use crate::value::{PkValue, Value};

/// One admission task on the explicit work stack: either "make sure this
/// row's parents exist, then schedule its commit" or "this row's parents
/// are already settled, commit it and fan out to children".
enum Frame {
    Admit {
        row: Row,
        table: TableName,
        prioritized: bool,
    },
    Commit {
        row: Row,
        table: TableName,
        prioritized: bool,
    },
}

pub struct Engine<'a> {
    model: &'a SchemaModel,
    source: &'a dyn RelationalStore,
    target: &'a dyn RelationalStore,
    states: &'a mut HashMap<TableName, TargetTableState>,
    children_max: i64,
    buffer: i64,
    listeners: &'a Listeners,
    target_label: String,
}

impl<'a> Engine<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: &'a SchemaModel,
        source: &'a dyn RelationalStore,
        target: &'a dyn RelationalStore,
        states: &'a mut HashMap<TableName, TargetTableState>,
        children_max: i64,
        buffer: i64,
        listeners: &'a Listeners,
        target_label: impl Into<String>,
    ) -> Self {
        Self {
            model,
            source,
            target,
            states,
            children_max,
            buffer,
            listeners,
            target_label: target_label.into(),
        }
    }

    pub fn total_pending(&self) -> usize {
        self.states.values().map(|s| s.pending.len()).sum()
    }

    pub fn model(&self) -> &SchemaModel {
        self.model
    }

    /// Admits one row: walks the parent chain with an explicit stack
    /// instead of native recursion, then commits the row and enqueues
    /// child candidates.
    pub async fn create_row_in(&mut self, row: Row, table: TableName, prioritized: bool) -> Result<()> {
        let mut stack = vec![Frame::Admit { row, table, prioritized }];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Admit { row, table, prioritized } => {
                    let desc = self
                        .model
                        .get(&table)
                        .cloned()
                        .ok_or_else(|| anyhow::anyhow!("table {table} not present in the schema model"))?;

                    let pk = row.pk_tuple(&desc.pk);
                    let already = self.states.get(&table).map(|s| s.contains(&pk)).unwrap_or(false);
                    if already && !prioritized {
                        continue;
                    }

                    let mut missing_parents = Vec::new();

                    for fk in &desc.fks {
                        if row.all_null(&fk.constrained_columns) {
                            continue;
                        }
                        if self.parent_exists(fk, &row).await? {
                            continue;
                        }
                        let filters = build_parent_filters(fk, &row);
                        match self.source.select_one(&fk.referred(), &filters).await? {
                            Some(parent_row) => missing_parents.push((fk.referred(), parent_row)),
                            None => bail!(
                                "source is missing the row in {} that {}:{:?} requires (foreign key on {:?}); source data integrity violation",
                                fk.referred(),
                                table,
                                pk,
                                fk.constrained_columns
                            ),
                        }
                    }

                    for constraint in &desc.constraints {
                        if row.all_null(&constraint.constrained_columns) {
                            continue;
                        }
                        if self.parent_exists(constraint, &row).await? {
                            continue;
                        }
                        let filters = build_parent_filters(constraint, &row);
                        match self.source.select_one(&constraint.referred(), &filters).await? {
                            Some(parent_row) => missing_parents.push((constraint.referred(), parent_row)),
                            None => {
                                tracing::warn!(
                                    "pseudo-foreign-key parent in {} absent from source; skipping (not DB-enforced)",
                                    constraint.referred()
                                );
                            }
                        }
                    }

                    stack.push(Frame::Commit { row: row.clone(), table: table.clone(), prioritized });
                    for (parent_table, parent_row) in missing_parents {
                        stack.push(Frame::Admit { row: parent_row, table: parent_table, prioritized: false });
                    }
                }
                Frame::Commit { row, table, prioritized } => {
                    self.commit_row(row, table, prioritized).await?;
                }
            }
        }
        Ok(())
    }

    /// True if a row satisfying `fk` for `row`'s values already exists in
    /// the target — either buffered (`pending`) or committed (`done`) by
    /// this run, or already present in the target database from a prior
    /// run (re-running against an already-populated target must stay
    /// idempotent, which the in-memory checks alone can't guarantee).
    async fn parent_exists(&self, fk: &ForeignKey, row: &Row) -> Result<bool> {
        let parent = fk.referred();
        let filters = build_parent_filters(fk, row);

        // Fast path: only safe when no constrained column was NULL (so the
        // candidate tuple really mirrors the parent's composite key) AND
        // the fk's referred columns are the parent's primary key in the
        // same order — `done`/`pending` are keyed by `pk_tuple(desc.pk)`,
        // so an fk onto a non-PK unique column (or the PK in a different
        // order) can't be checked against that set without risking a
        // false match against an unrelated row.
        let pk_aligned = self
            .model
            .get(&parent)
            .map(|desc| desc.pk == fk.referred_columns)
            .unwrap_or(false);
        if pk_aligned && filters.len() == fk.constrained_columns.len() {
            let candidate: Vec<PkValue> = fk
                .constrained_columns
                .iter()
                .map(|c| PkValue::from(row.get(c).unwrap_or(&Value::Null)))
                .collect();
            if let Some(state) = self.states.get(&parent) {
                if state.contains(&candidate) {
                    return Ok(true);
                }
            }
        }

        self.target.exists(&parent, &filters).await
    }

    async fn commit_row(&mut self, row: Row, table: TableName, prioritized: bool) -> Result<()> {
        let desc = self
            .model
            .get(&table)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("table {table} not present in the schema model"))?;
        let pk = row.pk_tuple(&desc.pk);

        // Re-check existence: admitting this row's parents may have
        // cascaded into admitting this exact row already (e.g. it is
        // also a child of one of its own parents along a different
        // edge). Mirrors the source tool's post-parent-creation re-check.
        let already = self.states.get(&table).map(|s| s.contains(&pk)).unwrap_or(false);
        if already && !prioritized {
            return Ok(());
        }

        if self.buffer == 0 {
            self.target.insert_one(&table, &row).await?;
        }

        if let Some(state) = self.states.get_mut(&table) {
            state.n_rows += 1;
            if self.buffer == 0 {
                state.done.insert(pk.clone());
            } else {
                state.pending.insert(pk.clone(), row.clone());
            }
        }

        self.listeners.notify_row_added(&RowAdded {
            source_row: &row,
            target_label: &self.target_label,
            target_table: &table,
            prioritized,
        });

        self.enqueue_children(&desc, &row, prioritized).await?;

        Ok(())
    }

    async fn enqueue_children(&mut self, desc: &TableDescriptor, row: &Row, prioritized: bool) -> Result<()> {
        for child_fk in &desc.child_fks {
            let child_table = child_fk.constrained();
            if !self.states.contains_key(&child_table) {
                continue; // child table excluded from this run's model
            }
            let filters = build_child_filters(child_fk, row);
            let limit = if prioritized { None } else { Some(self.children_max) };
            let children = self.source.select_filtered(&child_table, &filters, limit).await?;
            if let Some(state) = self.states.get_mut(&child_table) {
                state.enqueue_children(children, prioritized);
            }
        }
        Ok(())
    }

    /// Batch-inserts every table with pending rows,
    /// falling back to per-row inserts (logging and skipping individual
    /// failures) when the batch fails.
    pub async fn flush(&mut self) -> Result<()> {
        let tables: Vec<TableName> = self
            .states
            .iter()
            .filter(|(_, s)| !s.pending.is_empty())
            .map(|(t, _)| t.clone())
            .collect();

        for table in tables {
            let rows: Vec<Row> = self.states[&table].pending.values().cloned().collect();
            match self.target.insert_batch(&table, &rows).await {
                Ok(()) => {
                    let state = self.states.get_mut(&table).unwrap();
                    state.done.extend(state.pending.keys().cloned());
                    state.pending.clear();
                }
                Err(e) => {
                    tracing::warn!("batch insert into {table} failed ({e}); falling back to per-row inserts");
                    let pks: Vec<Vec<PkValue>> = self.states[&table].pending.keys().cloned().collect();
                    for pk in pks {
                        let row = self.states[&table].pending.get(&pk).cloned().unwrap();
                        match self.target.insert_one(&table, &row).await {
                            Ok(()) => {
                                let state = self.states.get_mut(&table).unwrap();
                                state.pending.remove(&pk);
                                state.done.insert(pk);
                            }
                            Err(row_err) => {
                                tracing::warn!("skipping row in {table}: {row_err}");
                                self.states.get_mut(&table).unwrap().pending.remove(&pk);
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn build_parent_filters<'r>(fk: &'r ForeignKey, row: &'r Row) -> Vec<ColumnFilter<'r>> {
    fk.referred_columns
        .iter()
        .zip(fk.constrained_columns.iter())
        .filter_map(|(parent_col, child_col)| {
            let value = row.get(child_col).unwrap_or(&Value::Null);
            if value.is_null() {
                None
            } else {
                Some(ColumnFilter { column: parent_col, value })
            }
        })
        .collect()
}

fn build_child_filters<'r>(child_fk: &'r ForeignKey, row: &'r Row) -> Vec<ColumnFilter<'r>> {
    child_fk
        .constrained_columns
        .iter()
        .zip(child_fk.referred_columns.iter())
        .filter_map(|(child_col, parent_col)| {
            let value = row.get(parent_col).unwrap_or(&Value::Null);
            if value.is_null() {
                None
            } else {
                Some(ColumnFilter { column: child_col, value })
            }
        })
        .collect()
}
