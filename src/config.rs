// ABOUTME: JSON config file loading
// ABOUTME: tables/schemas/full_tables are unioned with CLI flags; constraints key supplies pseudo-FKs

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::table::ConstraintSpec;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(default)]
    pub full_tables: Vec<String>,
    /// Keyed by qualified ("schema.table") or unqualified ("table") name.
    #[serde(default)]
    pub constraints: HashMap<String, Vec<ConstraintSpec>>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Looks up pseudo-foreign-keys declared for a table, trying the
    /// qualified name first and falling back to the unqualified name
    /// (the `constraints` map is keyed by qualified or unqualified name).
    pub fn constraints_for(&self, schema: &str, table: &str) -> &[ConstraintSpec] {
        let qualified = format!("{schema}.{table}");
        self.constraints
            .get(&qualified)
            .or_else(|| self.constraints.get(table))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
