// ABOUTME: Table selection filters: include/exclude/full-table glob patterns
// ABOUTME: Patterns are tried against both "schema.name" and "name"

use anyhow::{Context, Result};
use glob::Pattern;

/// Include/exclude/full-table glob selection.
///
/// Mirrors the shape of a conventional replication filter (include list,
/// exclude list) but matches with shell-glob semantics instead of exact
/// names, and adds a third "full-table" dimension used for target sizing.
pub struct SelectionFilters {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    full_table: Vec<Pattern>,
}

impl SelectionFilters {
    pub fn new(include: &[String], exclude: &[String], full_table: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
            full_table: compile(full_table)?,
        })
    }

    /// A table is included iff it matches any include pattern (or the
    /// include list is empty) AND matches no exclude pattern.
    pub fn is_included(&self, schema: &str, name: &str) -> bool {
        let included = self.include.is_empty() || self.matches_any(&self.include, schema, name);
        let excluded = self.matches_any(&self.exclude, schema, name);
        included && !excluded
    }

    pub fn is_full_table(&self, schema: &str, name: &str) -> bool {
        self.matches_any(&self.full_table, schema, name)
    }

    fn matches_any(&self, patterns: &[Pattern], schema: &str, name: &str) -> bool {
        if patterns.is_empty() {
            return false;
        }
        let qualified = format!("{schema}.{name}");
        patterns
            .iter()
            .any(|p| p.matches(&qualified) || p.matches(name))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("invalid glob pattern '{p}'")))
        .collect()
}
