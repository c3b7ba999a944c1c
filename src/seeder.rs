// ABOUTME: Forced-row seeder: admits user-requested rows before the main scheduler loop

use anyhow::Result;

use crate::engine::Engine;
use crate::model::table::TableName;
use crate::store::RelationalStore;

/// One `--force table:pk` entry, already split on the first `:`.
pub struct ForcedRow {
    pub table: TableName,
    pub pk_value: String,
}

/// Fetches each forced row from the source by single-column primary-key
/// lookup and admits it with `prioritized = true`. A miss is a warning,
/// not fatal — the user may have mistyped a key that no longer exists.
pub async fn seed(engine: &mut Engine<'_>, source: &dyn RelationalStore, forced: &[ForcedRow]) -> Result<()> {
    for f in forced {
        let pk_column = match engine_pk_column(engine, &f.table) {
            Some(c) => c,
            None => {
                tracing::warn!("--force {}:{} names a table not in the selected schema/table set; skipping", f.table, f.pk_value);
                continue;
            }
        };
        match source.select_by_pk(&f.table, &pk_column, &f.pk_value).await? {
            Some(row) => {
                engine.create_row_in(row, f.table.clone(), true).await?;
            }
            None => {
                tracing::warn!("--force {}:{} matched no row in the source; skipping", f.table, f.pk_value);
            }
        }
    }
    Ok(())
}

fn engine_pk_column(engine: &Engine<'_>, table: &TableName) -> Option<String> {
    engine.model().get(table).and_then(|d| d.pk.first().cloned())
}
