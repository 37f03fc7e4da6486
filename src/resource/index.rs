//! Index resource and data source
//!
//! Lifecycle entry points the host calls. Each one records failures in the
//! caller's [`Diagnostics`] and returns `None` instead of propagating, so the
//! host decides what to do with partially applied operations.

use super::diagnostics::Diagnostics;
use super::reconcile::Reconciler;
use super::state::{timestamp_now, IndexConfig, IndexDataSourceState, IndexState, ReadOutcome};
use crate::pinecone::{format_api_error, ControlPlane, Error};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

fn operation_span(op: &'static str, name: &str) -> tracing::Span {
    tracing::info_span!("index", op, name = %name, operation_id = %Uuid::new_v4())
}

/// Managed `pinecone_index` resource
#[derive(Clone)]
pub struct IndexResource {
    client: Arc<dyn ControlPlane>,
    reconciler: Reconciler,
}

impl IndexResource {
    pub fn new(client: Arc<dyn ControlPlane>, reconciler: Reconciler) -> Self {
        Self { client, reconciler }
    }

    /// Create the index and wait for it to become ready
    pub async fn create(&self, plan: &IndexConfig, diags: &mut Diagnostics) -> Option<IndexState> {
        async move {
            let req = plan.to_create_request(diags)?;

            match self.reconciler.create(self.client.as_ref(), &req).await {
                Ok(desc) => Some(IndexState::from_description(&desc, Some(timestamp_now()))),
                Err(e) => {
                    diags.add_error("Error creating index", failure("create", &e));
                    None
                }
            }
        }
        .instrument(operation_span("create", &plan.name))
        .await
    }

    /// Refresh tracked state; `None` only when an error was recorded
    pub async fn read(&self, state: &IndexState, diags: &mut Diagnostics) -> Option<ReadOutcome> {
        self.refresh(&state.name, state.last_updated.clone(), diags)
            .instrument(operation_span("read", &state.name))
            .await
    }

    /// Apply replicas/pod type changes and wait for the index to settle
    pub async fn update(
        &self,
        plan: &IndexConfig,
        prior: &IndexState,
        diags: &mut Diagnostics,
    ) -> Option<IndexState> {
        async move {
            if plan.name != prior.name {
                diags.add_attribute_error(
                    "name",
                    "Error updating index",
                    format!(
                        "Renaming index {} to {} requires replacement, not an update.",
                        prior.name, plan.name
                    ),
                );
                return None;
            }
            if plan.metadata_config.is_some() && plan.metadata_config != prior.metadata_config {
                diags.add_warning(
                    "metadata_config not updated",
                    "metadata_config cannot be changed in place and was left as is.",
                );
            }

            let req = plan.to_configure_request(diags)?;

            match self.reconciler.configure(self.client.as_ref(), &plan.name, &req).await {
                Ok(desc) => Some(IndexState::from_description(&desc, Some(timestamp_now()))),
                Err(e) => {
                    diags.add_error("Error updating index", failure("update", &e));
                    None
                }
            }
        }
        .instrument(operation_span("update", &plan.name))
        .await
    }

    /// Delete the index and wait until it is gone
    pub async fn delete(&self, state: &IndexState, diags: &mut Diagnostics) {
        let result = self
            .reconciler
            .delete(self.client.as_ref(), &state.name)
            .instrument(operation_span("delete", &state.name))
            .await;

        if let Err(e) = result {
            diags.add_error("Error deleting index", failure("delete", &e));
        }
    }

    /// Seed state from the index name alone
    pub async fn import_state(&self, id: &str, diags: &mut Diagnostics) -> Option<IndexState> {
        let outcome = self
            .refresh(id, None, diags)
            .instrument(operation_span("import", id))
            .await?;

        match outcome {
            ReadOutcome::Present(state) => Some(state),
            ReadOutcome::Removed => {
                diags.add_attribute_error(
                    "name",
                    "Cannot import non-existent index",
                    format!("Index {} was not found in environment {}.", id, self.client.environment()),
                );
                None
            }
        }
    }

    async fn refresh(
        &self,
        name: &str,
        last_updated: Option<String>,
        diags: &mut Diagnostics,
    ) -> Option<ReadOutcome> {
        match self.client.describe_index(name).await {
            Ok(Some(desc)) => Some(ReadOutcome::Present(IndexState::from_description(&desc, last_updated))),
            Ok(None) => {
                tracing::info!("Index {} no longer exists, removing from state", name);
                Some(ReadOutcome::Removed)
            }
            Err(e) => {
                diags.add_error("Error Reading Pinecone Index", failure("read", &e));
                None
            }
        }
    }
}

/// Read-only `pinecone_index` lookup
#[derive(Clone)]
pub struct IndexDataSource {
    client: Arc<dyn ControlPlane>,
}

impl IndexDataSource {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self { client }
    }

    /// Look an index up by name; a missing index yields a record with only `id`
    pub async fn read(&self, name: &str, diags: &mut Diagnostics) -> Option<IndexDataSourceState> {
        let result = self
            .client
            .describe_index(name)
            .instrument(operation_span("lookup", name))
            .await;

        match result {
            Ok(Some(desc)) => Some(IndexDataSourceState::from_description(name, &desc)),
            Ok(None) => Some(IndexDataSourceState::absent(name)),
            Err(e) => {
                diags.add_error("Error DescribeIndex", format_api_error(&e));
                None
            }
        }
    }
}

fn failure(op: &str, error: &Error) -> String {
    format!("Could not {} index, unexpected error: {}", op, format_api_error(error))
}
