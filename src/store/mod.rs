// ABOUTME: RelationalStore trait: the boundary between engine logic and a database driver
// ABOUTME: Connection management and dialect specifics live here, out of scope for the engine proper

pub mod postgres;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;

use crate::model::table::{ForeignKey, TableName};
use crate::row::Row;

/// Raw introspection result for one table, before `child_fks` are derived.
#[derive(Debug, Clone)]
pub struct IntrospectedTable {
    pub name: TableName,
    pub pk: Vec<String>,
    pub fks: Vec<ForeignKey>,
    /// All column names, used as the fallback composite key when `pk`
    /// is empty.
    pub columns: Vec<String>,
}

/// A filter over a column: `column = value`, used to build parameterized
/// SELECTs for parent/child lookups. Values come straight from a source
/// row so the store can bind them positionally.
#[derive(Debug, Clone)]
pub struct ColumnFilter<'a> {
    pub column: &'a str,
    pub value: &'a crate::value::Value,
}

/// The async surface the engine needs from a concrete database driver.
///
/// Connection management, SQL dialect quirks, and driver selection all
/// live behind this trait; the
/// engine (schema model, sampler, scorer, admission, scheduler) is
/// generic over `R: RelationalStore` so it can be exercised in tests
/// against [`fake::FakeStore`] without a live database.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Enumerates tables in the given schemas, with pk/fks/columns.
    async fn introspect(&self, schemas: &[String]) -> anyhow::Result<Vec<IntrospectedTable>>;

    /// Approximate row count, using a dialect-specific fast path
    /// (catalog estimate) when available, falling back to `COUNT(*)`.
    async fn approximate_row_count(&self, table: &TableName) -> anyhow::Result<i64>;

    /// Exact row count, always used for fetch_all tables.
    async fn exact_row_count(&self, table: &TableName) -> anyhow::Result<i64>;

    /// A lazy, dialect-specific random sample of approximately `n` rows.
    /// Implementations materialize the dialect's random
    /// sampling query; the engine-side [`crate::sampler::Sampler`] owns
    /// the "regenerate when exhausted" and in-memory shuffle behavior.
    async fn random_sample(&self, table: &TableName, n: i64) -> anyhow::Result<Vec<Row>>;

    /// `SELECT * FROM table WHERE <filters> LIMIT limit` (limit of `None`
    /// means unbounded — used for prioritized child pulls).
    async fn select_filtered(
        &self,
        table: &TableName,
        filters: &[ColumnFilter<'_>],
        limit: Option<i64>,
    ) -> anyhow::Result<Vec<Row>>;

    /// `SELECT * FROM table WHERE <filters> LIMIT 1`.
    async fn select_one(
        &self,
        table: &TableName,
        filters: &[ColumnFilter<'_>],
    ) -> anyhow::Result<Option<Row>>;

    /// `SELECT EXISTS(SELECT 1 FROM table WHERE <filters>)`.
    async fn exists(&self, table: &TableName, filters: &[ColumnFilter<'_>]) -> anyhow::Result<bool>;

    /// Single-primary-key-column lookup, used by the forced-row seeder
    /// `pk_value` is the literal string the user passed
    /// on `--force table:pk`.
    async fn select_by_pk(
        &self,
        table: &TableName,
        pk_column: &str,
        pk_value: &str,
    ) -> anyhow::Result<Option<Row>>;

    /// Inserts a single row immediately (used when buffering is disabled).
    async fn insert_one(&self, table: &TableName, row: &Row) -> anyhow::Result<()>;

    /// Inserts a batch of rows in one statement; callers fall back to
    /// `insert_one` per row on failure.
    async fn insert_batch(&self, table: &TableName, rows: &[Row]) -> anyhow::Result<()>;
}
