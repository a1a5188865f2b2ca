pub mod client_config;
pub mod env;

pub use client_config::{AuthConfig, RegistryClientConfig};
pub use env::EnvConfig;
