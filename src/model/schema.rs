// ABOUTME: Schema Model construction: table enumeration, filtering, child-fk derivation
// ABOUTME: Also the schema-mismatch check between source and target models

use std::collections::HashMap;

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::filters::SelectionFilters;
use crate::store::RelationalStore;

use super::table::{ForeignKey, TableDescriptor, TableName};

/// The full in-memory model of one side (source or target) of a
/// subsetting run.
pub struct SchemaModel {
    tables: HashMap<TableName, TableDescriptor>,
}

impl SchemaModel {
    /// Builds the model for one database: introspects the given schemas,
    /// keeps only tables that pass `filters`, attaches user-declared
    /// constraints from `config`, then derives `child_fks` in a second
    /// pass over every foreign key.
    pub async fn build(
        store: &dyn RelationalStore,
        schemas: &[String],
        filters: &SelectionFilters,
        config: &Config,
    ) -> Result<Self> {
        let introspected = store.introspect(schemas).await?;

        let mut tables = HashMap::new();
        for t in &introspected {
            if !filters.is_included(&t.name.schema, &t.name.name) {
                continue;
            }
            let pk = if t.pk.is_empty() { t.columns.clone() } else { t.pk.clone() };
            let mut desc = TableDescriptor::new(t.name.clone(), pk);
            desc.fetch_all = filters.is_full_table(&t.name.schema, &t.name.name);
            desc.n_rows = if desc.fetch_all {
                store
                    .exact_row_count(&t.name)
                    .await
                    .with_context(|| format!("failed to count rows in {}", t.name))?
            } else {
                store
                    .approximate_row_count(&t.name)
                    .await
                    .with_context(|| format!("failed to estimate row count for {}", t.name))?
            };
            desc.fks = t.fks.clone();
            desc.constraints = config
                .constraints_for(&t.name.schema, &t.name.name)
                .iter()
                .map(|c| ForeignKey {
                    referred_schema: c.referred_schema.clone(),
                    referred_table: c.referred_table.clone(),
                    referred_columns: c.referred_columns.clone(),
                    constrained_columns: c.constrained_columns.clone(),
                    constrained_schema: t.name.schema.clone(),
                    constrained_table: t.name.name.clone(),
                })
                .collect();
            tables.insert(t.name.clone(), desc);
        }

        // Foreign keys reaching tables that were filtered out (or never
        // introspected) are a schema-mismatch, not a silent drop — a
        // child row admitted through such an edge would have no target
        // parent table to check against.
        let names: Vec<TableName> = tables.keys().cloned().collect();
        for name in &names {
            let fks = tables[name].fks.clone();
            for fk in &fks {
                let referred = fk.referred();
                if !tables.contains_key(&referred) {
                    bail!(
                        "table {} has a foreign key to {}, which is not in the selected schema/table set",
                        name,
                        referred
                    );
                }
                let mirror = ForeignKey {
                    referred_schema: fk.referred_schema.clone(),
                    referred_table: fk.referred_table.clone(),
                    referred_columns: fk.referred_columns.clone(),
                    constrained_columns: fk.constrained_columns.clone(),
                    constrained_schema: name.schema.clone(),
                    constrained_table: name.name.clone(),
                };
                tables.get_mut(&referred).unwrap().child_fks.push(mirror);
            }
        }

        Ok(Self { tables })
    }

    pub fn get(&self, name: &TableName) -> Option<&TableDescriptor> {
        self.tables.get(name)
    }

    pub fn get_mut(&mut self, name: &TableName) -> Option<&mut TableDescriptor> {
        self.tables.get_mut(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &TableName> {
        self.tables.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TableName, &TableDescriptor)> {
        self.tables.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&TableName, &mut TableDescriptor)> {
        self.tables.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Verifies that `self` (the source model) and `target` cover the
    /// same set of qualified tables.
    pub fn assert_matches(&self, target: &SchemaModel) -> Result<()> {
        let mut source_names: Vec<String> = self.tables.keys().map(|t| t.qualified()).collect();
        let mut target_names: Vec<String> = target.tables.keys().map(|t| t.qualified()).collect();
        source_names.sort();
        target_names.sort();
        if source_names != target_names {
            bail!(
                "schema mismatch between source and target: source has {:?}, target has {:?}",
                source_names,
                target_names
            );
        }
        Ok(())
    }
}
