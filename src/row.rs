// ABOUTME: Row type shared by source and target tables
// ABOUTME: An ordered column->value mapping, with primary-key tuple extraction

use crate::value::{PkValue, Value};

/// An ordered mapping from column name to value.
///
/// Column order is whatever the store returned it in; lookups are by name
/// so order doesn't matter for correctness, only for stable debug output.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    pub fn columns(&self) -> &[(String, Value)] {
        &self.columns
    }

    /// Builds the primary-key tuple for this row, in `pk` column order.
    ///
    /// Panics only if `pk` names a column absent from the row, which would
    /// indicate the table descriptor and the row's own source table have
    /// diverged — a programming error, not a data condition.
    pub fn pk_tuple(&self, pk: &[String]) -> Vec<PkValue> {
        pk.iter()
            .map(|col| {
                let v = self
                    .get(col)
                    .unwrap_or_else(|| panic!("row missing primary key column {col}"));
                PkValue::from(v)
            })
            .collect()
    }

    /// True if every value named in `columns` is NULL (or the list is
    /// empty). Used for the null-safe foreign-key check in §4.5: a FK is
    /// trivially satisfied when all of its constrained columns are NULL.
    pub fn all_null(&self, columns: &[String]) -> bool {
        columns.iter().all(|c| self.get(c).is_none_or_null())
    }
}

trait OptionValueExt {
    fn is_none_or_null(&self) -> bool;
}

impl OptionValueExt for Option<&Value> {
    fn is_none_or_null(&self) -> bool {
        match self {
            None => true,
            Some(v) => v.is_null(),
        }
    }
}
