pub mod flight;
pub mod store;

pub use flight::{FlightGroup, FlightGuard};
pub use store::{CacheStats, SchemaCache};
