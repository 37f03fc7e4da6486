//! In-memory control plane
//!
//! Substitute for [`PineconeClient`](super::client::PineconeClient) in tests and
//! local dry runs. A single lock guards the index map for the duration of each
//! operation. Remote convergence can be simulated: with `convergence_polls = n`
//! the first `n` describes after a mutation observe the transitional state.

use super::client::ControlPlane;
use super::error::{Error, Result};
use super::types::{
    ConfigureIndexRequest, CreateIndexRequest, DatabaseDescription, IndexDescription, IndexStatus,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug)]
struct Entry {
    description: IndexDescription,
    /// Describes left before the pending transition completes
    pending_polls: u32,
    deleting: bool,
}

#[derive(Debug, Default)]
struct Store {
    indexes: HashMap<String, Entry>,
    requests: usize,
}

#[derive(Debug)]
pub struct InMemoryControlPlane {
    environment: String,
    api_key: String,
    convergence_polls: u32,
    store: Mutex<Store>,
}

impl InMemoryControlPlane {
    pub fn new(environment: &str, api_key: &str) -> Self {
        Self {
            environment: environment.to_string(),
            api_key: api_key.to_string(),
            convergence_polls: 0,
            store: Mutex::new(Store::default()),
        }
    }

    /// Delay readiness (and disappearance after delete) by `polls` describes
    pub fn with_convergence_polls(mut self, polls: u32) -> Self {
        self.convergence_polls = polls;
        self
    }

    /// Number of operations that passed the credential checks
    pub async fn requests(&self) -> usize {
        self.store.lock().await.requests
    }

    fn preflight(&self) -> Result<()> {
        self.base_url()?;
        if self.api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }
        Ok(())
    }

    fn status(&self, state: &str, ready: bool) -> IndexStatus {
        IndexStatus {
            host: format!("{}.svc.{}.pinecone.io", state.to_lowercase(), self.environment),
            port: 433,
            state: state.to_string(),
            ready,
            ..IndexStatus::default()
        }
    }
}

#[async_trait]
impl ControlPlane for InMemoryControlPlane {
    fn environment(&self) -> &str {
        &self.environment
    }

    async fn list_indexes(&self) -> Result<Vec<String>> {
        self.preflight()?;
        let mut store = self.store.lock().await;
        store.requests += 1;

        let mut names: Vec<String> = store.indexes.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_index(&self, req: &CreateIndexRequest) -> Result<()> {
        self.preflight()?;
        let mut store = self.store.lock().await;
        store.requests += 1;

        if store.indexes.contains_key(&req.name) {
            return Err(Error::Status {
                operation: "create index",
                status: 409,
            });
        }

        let ready = self.convergence_polls == 0;
        let description = IndexDescription {
            database: DatabaseDescription {
                name: req.name.clone(),
                metric: req.metric,
                dimension: req.dimension,
                replicas: req.replicas,
                shards: 1,
                pods: req.pods,
                pod_type: req.pod_type,
                metadata_config: req.metadata_config.clone(),
            },
            status: self.status(if ready { "Ready" } else { "Initializing" }, ready),
        };

        store.indexes.insert(
            req.name.clone(),
            Entry {
                description,
                pending_polls: self.convergence_polls,
                deleting: false,
            },
        );
        Ok(())
    }

    async fn describe_index(&self, name: &str) -> Result<Option<IndexDescription>> {
        self.preflight()?;
        let mut store = self.store.lock().await;
        store.requests += 1;

        let Some(entry) = store.indexes.get_mut(name) else {
            return Ok(None);
        };

        if entry.pending_polls > 0 {
            entry.pending_polls -= 1;
            return Ok(Some(entry.description.clone()));
        }

        if entry.deleting {
            store.indexes.remove(name);
            return Ok(None);
        }

        if !entry.description.status.ready {
            entry.description.status = self.status("Ready", true);
        }
        Ok(Some(entry.description.clone()))
    }

    async fn delete_index(&self, name: &str) -> Result<()> {
        self.preflight()?;
        let mut store = self.store.lock().await;
        store.requests += 1;

        if self.convergence_polls == 0 {
            store.indexes.remove(name);
            return Ok(());
        }

        if let Some(entry) = store.indexes.get_mut(name) {
            entry.deleting = true;
            entry.pending_polls = self.convergence_polls;
            entry.description.status = self.status("Terminating", false);
        }
        Ok(())
    }

    async fn configure_index(&self, name: &str, req: &ConfigureIndexRequest) -> Result<()> {
        self.preflight()?;
        let mut store = self.store.lock().await;
        store.requests += 1;

        let Some(entry) = store.indexes.get_mut(name) else {
            return Err(Error::NotFound(name.to_string()));
        };

        entry.description.database.replicas = req.replicas;
        entry.description.database.pod_type = req.pod_type;
        if self.convergence_polls > 0 {
            entry.pending_polls = self.convergence_polls;
            entry.description.status = self.status("ScalingUp", false);
        }
        Ok(())
    }
}
