// ABOUTME: Table descriptor: qualified name, primary key, foreign keys, inverse child-fks
// ABOUTME: Also the user-declared pseudo-foreign-key ("constraint") shape, which mirrors ForeignKey

use serde::Deserialize;

/// A qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableName {
    pub schema: String,
    pub name: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

/// An outgoing foreign-key edge from a constrained table to a referred
/// table. The inverse edge (`child_fks`, populated
/// after all tables are loaded) reuses this same shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub referred_schema: String,
    pub referred_table: String,
    /// Columns in the referred (parent) table, in order.
    pub referred_columns: Vec<String>,
    /// Columns in the constrained (child) table, in the same order as
    /// `referred_columns`. Invariant: `referred_columns.len() ==
    /// constrained_columns.len()`.
    pub constrained_columns: Vec<String>,
    /// The table this edge originates from — only meaningful for
    /// `child_fks`, where it names the *child* table rather than the
    /// table the edge is stored under.
    pub constrained_schema: String,
    pub constrained_table: String,
}

impl ForeignKey {
    pub fn referred(&self) -> TableName {
        TableName::new(&self.referred_schema, &self.referred_table)
    }

    pub fn constrained(&self) -> TableName {
        TableName::new(&self.constrained_schema, &self.constrained_table)
    }
}

/// JSON shape of a user-declared pseudo-foreign-key, as read from the
/// `constraints` key of the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ConstraintSpec {
    #[serde(default = "default_schema")]
    pub referred_schema: String,
    pub referred_table: String,
    pub referred_columns: Vec<String>,
    pub constrained_columns: Vec<String>,
}

fn default_schema() -> String {
    "public".to_string()
}

/// In-memory representation of one included table.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    pub name: TableName,
    /// Ordered primary-key column names. Empty only transiently during
    /// construction — a table with no catalog-reported primary
    /// key falls back to treating all columns as a composite key, so by
    /// the time the model is built this is never empty for an included
    /// table with at least one column.
    pub pk: Vec<String>,
    pub fks: Vec<ForeignKey>,
    pub child_fks: Vec<ForeignKey>,
    /// User-supplied pseudo-foreign-keys, treated as parents for
    /// admission but whose referenced row is not guaranteed to exist.
    pub constraints: Vec<ForeignKey>,
    /// Approximate (or, for fetch_all tables, exact) source row count.
    pub n_rows: i64,
    pub fetch_all: bool,
}

impl TableDescriptor {
    pub fn new(name: TableName, pk: Vec<String>) -> Self {
        Self {
            name,
            pk,
            fks: Vec::new(),
            child_fks: Vec::new(),
            constraints: Vec::new(),
            n_rows: 0,
            fetch_all: false,
        }
    }

    /// Desired row count for the target table given a sampling fraction.
    pub fn n_rows_desired(&self, fraction: f64, logarithmic: bool) -> i64 {
        if self.n_rows == 0 {
            return 0;
        }
        if self.fetch_all {
            return self.n_rows;
        }
        if logarithmic {
            let n = (10f64.powf((self.n_rows as f64).log10() * fraction)).floor() as i64;
            n.max(1)
        } else {
            let n = (self.n_rows as f64 * fraction).floor() as i64;
            n.max(1)
        }
    }
}
