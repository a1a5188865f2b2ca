pub mod parser;
pub mod schema;

pub use parser::{AvroSchemaParser, DynSchemaParser, RawSchemaParser, SchemaParser};
pub use schema::{Schema, SchemaVersion, SchemaWithId};
