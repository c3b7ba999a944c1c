// ABOUTME: In-memory RelationalStore used only by the test suite
// ABOUTME: Lets engine/scheduler tests run fixture scenarios without a live database

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::table::{ForeignKey, TableName};
use crate::row::Row;

use super::{ColumnFilter, IntrospectedTable, RelationalStore};

#[derive(Clone)]
pub struct FakeTable {
    pub pk: Vec<String>,
    pub columns: Vec<String>,
    pub fks: Vec<ForeignKey>,
    pub rows: Vec<Row>,
}

/// An in-memory database: tables keyed by qualified name, each holding a
/// fixed row set. `insert_one`/`insert_batch` append to the in-memory
/// vector, so a `FakeStore` can play the role of either source or target
/// in a test.
pub struct FakeStore {
    tables: Mutex<HashMap<TableName, FakeTable>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
        }
    }

    pub fn add_table(&self, name: TableName, table: FakeTable) {
        self.tables.lock().unwrap().insert(name, table);
    }

    /// Snapshot of a table's current rows, for assertions.
    pub fn rows_of(&self, name: &TableName) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(name)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }
}

impl Default for FakeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn row_matches(row: &Row, filters: &[ColumnFilter<'_>]) -> bool {
    filters.iter().all(|f| row.get(f.column) == Some(f.value))
}

#[async_trait]
impl RelationalStore for FakeStore {
    async fn introspect(&self, schemas: &[String]) -> Result<Vec<IntrospectedTable>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .iter()
            .filter(|(name, _)| schemas.is_empty() || schemas.contains(&name.schema))
            .map(|(name, t)| IntrospectedTable {
                name: name.clone(),
                pk: t.pk.clone(),
                fks: t.fks.clone(),
                columns: t.columns.clone(),
            })
            .collect())
    }

    async fn approximate_row_count(&self, table: &TableName) -> Result<i64> {
        self.exact_row_count(table).await
    }

    async fn exact_row_count(&self, table: &TableName) -> Result<i64> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .map(|t| t.rows.len() as i64)
            .unwrap_or(0))
    }

    async fn random_sample(&self, table: &TableName, n: i64) -> Result<Vec<Row>> {
        // Deterministic for tests: take the first n rows rather than
        // shuffling. The engine-level Sampler is what's responsible for
        // randomization; this fake only needs to hand back *some* rows.
        let tables = self.tables.lock().unwrap();
        let rows = tables.get(table).map(|t| t.rows.clone()).unwrap_or_default();
        Ok(rows.into_iter().take(n.max(0) as usize).collect())
    }

    async fn select_filtered(
        &self,
        table: &TableName,
        filters: &[ColumnFilter<'_>],
        limit: Option<i64>,
    ) -> Result<Vec<Row>> {
        let tables = self.tables.lock().unwrap();
        let rows = tables.get(table).map(|t| t.rows.clone()).unwrap_or_default();
        let mut matched: Vec<Row> = rows.into_iter().filter(|r| row_matches(r, filters)).collect();
        if let Some(limit) = limit {
            matched.truncate(limit.max(0) as usize);
        }
        Ok(matched)
    }

    async fn select_one(
        &self,
        table: &TableName,
        filters: &[ColumnFilter<'_>],
    ) -> Result<Option<Row>> {
        Ok(self.select_filtered(table, filters, Some(1)).await?.into_iter().next())
    }

    async fn exists(&self, table: &TableName, filters: &[ColumnFilter<'_>]) -> Result<bool> {
        Ok(self.select_one(table, filters).await?.is_some())
    }

    async fn select_by_pk(
        &self,
        table: &TableName,
        pk_column: &str,
        pk_value: &str,
    ) -> Result<Option<Row>> {
        let tables = self.tables.lock().unwrap();
        let rows = tables.get(table).map(|t| t.rows.clone()).unwrap_or_default();
        Ok(rows.into_iter().find(|r| match r.get(pk_column) {
            Some(crate::value::Value::Text(s)) => s == pk_value,
            Some(crate::value::Value::Int(i)) => i.to_string() == pk_value,
            _ => false,
        }))
    }

    async fn insert_one(&self, table: &TableName, row: &Row) -> Result<()> {
        self.insert_batch(table, std::slice::from_ref(row)).await
    }

    async fn insert_batch(&self, table: &TableName, rows: &[Row]) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| anyhow::anyhow!("unknown table {table} in fake store"))?;
        for row in rows {
            let pk = row.pk_tuple(&t.pk);
            let already: bool = t
                .rows
                .iter()
                .any(|existing| existing.pk_tuple(&t.pk) == pk);
            if !already {
                t.rows.push(row.clone());
            }
        }
        Ok(())
    }
}
