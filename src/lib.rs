//! Declarative lifecycle management for Pinecone indexes
//!
//! - [`pinecone`] - Control-plane client, value types and the in-memory substitute
//! - [`resource`] - Reconciliation loop, state mapping, schema and diagnostics
//! - [`provider`] - Configuration entry point handing out resources
//! - [`config`] - Explicit provider settings and their resolution
//! - [`driver`] - Apply/destroy/import against a tracked state file
//! - [`statefile`] - Desired-state and state files for the command-line driver

pub mod config;
pub mod driver;
pub mod pinecone;
pub mod provider;
pub mod resource;
pub mod statefile;

pub use config::ProviderConfig;
pub use provider::Provider;

/// Version injected at compile time via PINECONE_PROVIDER_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("PINECONE_PROVIDER_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};
