//! Resource abstraction layer
//!
//! This module turns declarative desired state into control-plane calls and
//! back into persisted state.
//!
//! # Architecture
//!
//! - [`reconcile`] - Poll-until-converged driver for create/update/delete
//! - [`state`] - Desired, persisted and lookup records and their mapping
//! - [`schema`] - Attribute tables, mutability metadata and planning
//! - [`diagnostics`] - Accumulator for user-facing errors and warnings
//! - [`index`] - The `pinecone_index` resource and data source entry points
//!
//! # Example
//!
//! ```ignore
//! use pinecone_provider::resource::{Diagnostics, IndexConfig, IndexResource, Reconciler};
//!
//! async fn create(resource: &IndexResource) -> Option<IndexState> {
//!     let mut diags = Diagnostics::new();
//!     let state = resource.create(&IndexConfig::new("docs", 1536), &mut diags).await;
//!     for diag in diags.iter() {
//!         eprintln!("{}", diag);
//!     }
//!     state
//! }
//! ```

pub mod diagnostics;
mod index;
pub mod reconcile;
pub mod schema;
pub mod state;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use index::{IndexDataSource, IndexResource};
pub use reconcile::{Reconciler, DEFAULT_POLL_INTERVAL};
pub use schema::{
    index_data_source_schema, index_resource_schema, plan, provider_schema, Mutability, Plan,
    Schema,
};
pub use state::{IndexConfig, IndexDataSourceState, IndexState, ReadOutcome};
