pub mod cached;

pub use cached::CachedSchemaRegistryClient;
