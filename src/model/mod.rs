// ABOUTME: In-memory schema model: table descriptors, foreign keys, and construction from introspection

pub mod schema;
pub mod table;

pub use schema::SchemaModel;
pub use table::{ConstraintSpec, ForeignKey, TableDescriptor, TableName};
