pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod schema;
pub mod transport;
pub mod utils;

pub use cache::{CacheStats, FlightGroup, SchemaCache};
pub use client::CachedSchemaRegistryClient;
pub use config::{AuthConfig, EnvConfig, RegistryClientConfig};
pub use error::{RegistryError, Result};
pub use schema::{
    AvroSchemaParser, DynSchemaParser, RawSchemaParser, Schema, SchemaParser, SchemaVersion,
    SchemaWithId,
};
pub use transport::{DynRegistryTransport, HttpTransport, RegistryTransport};
pub use utils::{logging, validation, LoggingConfig};
