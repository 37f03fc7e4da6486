//! Pinecone control-plane interaction module
//!
//! This module provides the core functionality for talking to the Pinecone
//! controller: value types, the HTTP client, and the in-memory substitute.
//!
//! # Module Structure
//!
//! - [`client`] - [`ControlPlane`] contract and the production HTTPS client
//! - [`error`] - Classified control-plane errors
//! - [`http`] - HTTP utilities for REST API calls
//! - [`memory`] - In-memory control plane for tests
//! - [`types`] - Metric, pod type, metadata config and wire bodies
//!
//! # Example
//!
//! ```ignore
//! use pinecone_provider::pinecone::{ControlPlane, PineconeClient};
//!
//! async fn example() -> pinecone_provider::pinecone::Result<()> {
//!     let client = PineconeClient::new("us-west1-gcp", "my-api-key")?;
//!     let names = client.list_indexes().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod types;

pub use client::{controller_url, ControlPlane, PineconeClient};
pub use error::{format_api_error, Error, Result};
pub use memory::InMemoryControlPlane;
pub use types::{
    ConfigureIndexRequest, CreateIndexRequest, DatabaseDescription, IndexDescription, IndexStatus,
    MetadataConfig, Metric, ParseError, PodClass, PodSize, PodType,
};
