// ABOUTME: Sequence resync afterword: a dialect-specific post-step, not part of the engine
// ABOUTME: Scoped by the same selection filters as the main run, and never fails the run on error

use crate::filters::SelectionFilters;
use crate::model::SchemaModel;
use crate::store::postgres::PostgresStore;

/// For every included table with a single-column integer primary key
/// backed by a sequence (identity/serial column), sets the sequence's
/// `last_value` to the greater of its current value and `MAX(pk)` over
/// the target table.
///
/// This is a best-effort afterword: a failure for one table is logged and
/// skipped rather than failing the run — sequence handling is outside
/// the engine's own correctness surface.
pub async fn resync_sequences(target: &PostgresStore, model: &SchemaModel, filters: &SelectionFilters) {
    for (name, desc) in model.iter() {
        if !filters.is_included(&name.schema, &name.name) {
            continue;
        }
        if desc.pk.len() != 1 {
            continue;
        }
        let pk_column = &desc.pk[0];

        let sequence = match find_owned_sequence(target, name, pk_column).await {
            Ok(Some(seq)) => seq,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("failed to look up sequence for {name}.{pk_column}: {e}");
                continue;
            }
        };

        if let Err(e) = set_sequence_to_max(target, name, pk_column, &sequence).await {
            tracing::warn!("failed to resync sequence {sequence} for {name}.{pk_column}: {e}");
        }
    }
}

async fn find_owned_sequence(
    target: &PostgresStore,
    table: &crate::model::table::TableName,
    column: &str,
) -> anyhow::Result<Option<String>> {
    let row = target
        .client()
        .query_opt(
            "SELECT pg_get_serial_sequence($1, $2)",
            &[&table.qualified(), &column],
        )
        .await?;
    Ok(row.and_then(|r| r.try_get::<_, Option<String>>(0).ok().flatten()))
}

async fn set_sequence_to_max(
    target: &PostgresStore,
    table: &crate::model::table::TableName,
    column: &str,
    sequence: &str,
) -> anyhow::Result<()> {
    // GREATEST over the target's MAX(pk) *and* the sequence's own current
    // value: the subset's max pk may be well behind a sequence that was
    // already advanced (e.g. a prior run, or rows inserted outside this
    // tool), and setval must never move a sequence backwards.
    let sql = format!(
        "SELECT setval($1, GREATEST(COALESCE((SELECT MAX({}) FROM {}), 1), (SELECT last_value FROM {}), 1), true)",
        crate::utils::quote_ident(column),
        format!("{}.{}", crate::utils::quote_ident(&table.schema), crate::utils::quote_ident(&table.name)),
        sequence,
    );
    target.client().query_one(&sql, &[&sequence]).await?;
    Ok(())
}
