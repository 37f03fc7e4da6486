//! Resource state mapping
//!
//! Three records cross the host boundary:
//! - [`IndexConfig`]: desired state as declared by the user
//! - [`IndexState`]: persisted resource state, rebuilt from every describe
//! - [`IndexDataSourceState`]: read-only lookup result, including live status

use super::diagnostics::Diagnostics;
use super::schema::{DEFAULT_METRIC, DEFAULT_PODS, DEFAULT_POD_TYPE, DEFAULT_REPLICAS, MAX_NAME_LENGTH};
use crate::pinecone::{
    ConfigureIndexRequest, CreateIndexRequest, IndexDescription, MetadataConfig, Metric, PodType,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// RFC 850 timestamp, e.g. `Monday, 02-Jan-06 15:04:05 UTC`
pub fn timestamp_now() -> String {
    Utc::now().format("%A, %d-%b-%y %H:%M:%S %Z").to_string()
}

// =============================================================================
// Desired state
// =============================================================================

/// Desired index configuration
///
/// Optional attributes fall back to the schema defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    pub name: String,
    pub dimension: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pods: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_config: Option<MetadataConfig>,
}

impl IndexConfig {
    pub fn new(name: &str, dimension: i64) -> Self {
        Self {
            name: name.to_string(),
            dimension,
            metric: None,
            pods: None,
            replicas: None,
            pod_type: None,
            metadata_config: None,
        }
    }

    pub fn effective_metric(&self) -> &str {
        self.metric.as_deref().unwrap_or(DEFAULT_METRIC)
    }

    pub fn effective_pods(&self) -> i64 {
        self.pods.unwrap_or(DEFAULT_PODS)
    }

    pub fn effective_replicas(&self) -> i64 {
        self.replicas.unwrap_or(DEFAULT_REPLICAS)
    }

    pub fn effective_pod_type(&self) -> &str {
        self.pod_type.as_deref().unwrap_or(DEFAULT_POD_TYPE)
    }

    /// Validate everything a create needs; problems are recorded, not raised
    pub fn to_create_request(&self, diags: &mut Diagnostics) -> Option<CreateIndexRequest> {
        let before = diags.errors().count();

        if self.name.is_empty() {
            diags.add_attribute_error("name", "Invalid index name", "The index name must not be empty.");
        } else if self.name.len() > MAX_NAME_LENGTH {
            diags.add_attribute_error(
                "name",
                "Invalid index name",
                format!("The index name must be at most {} characters.", MAX_NAME_LENGTH),
            );
        }
        if self.dimension <= 0 {
            diags.add_attribute_error(
                "dimension",
                "Invalid dimension",
                format!("The dimension must be positive, got {}.", self.dimension),
            );
        }
        if self.effective_pods() < 1 {
            diags.add_attribute_error("pods", "Invalid pods", "At least one pod is required.");
        }

        let metric = match self.effective_metric().parse::<Metric>() {
            Ok(metric) => Some(metric),
            Err(e) => {
                diags.add_attribute_error("metric", "Error creating index", format!("Could not create index, unexpected error: {}", e));
                None
            }
        };

        if let Some(config) = &self.metadata_config {
            if config.indexed.is_empty() {
                diags.add_attribute_error(
                    "metadata_config",
                    "Invalid metadata config",
                    "metadata_config.indexed must name at least one field; omit metadata_config to index nothing.",
                );
            }
        }

        let configure = self.to_configure_request(diags);

        if diags.errors().count() > before {
            return None;
        }
        let (metric, configure) = (metric?, configure?);

        Some(CreateIndexRequest {
            name: self.name.clone(),
            dimension: self.dimension,
            metric,
            pods: self.effective_pods(),
            replicas: configure.replicas,
            pod_type: configure.pod_type,
            metadata_config: self.metadata_config.clone(),
        })
    }

    /// Validate the mutable attributes
    pub fn to_configure_request(&self, diags: &mut Diagnostics) -> Option<ConfigureIndexRequest> {
        let replicas = self.effective_replicas();
        let replicas_ok = replicas >= 1;
        if !replicas_ok {
            diags.add_attribute_error(
                "replicas",
                "Invalid replicas",
                format!("At least one replica is required, got {}.", replicas),
            );
        }

        let pod_type = match self.effective_pod_type().parse::<PodType>() {
            Ok(pod_type) => Some(pod_type),
            Err(e) => {
                diags.add_attribute_error(
                    "pod_type",
                    "Invalid pod type",
                    format!("Could not use pod type, unexpected error: {}", e),
                );
                None
            }
        };

        match (replicas_ok, pod_type) {
            (true, Some(pod_type)) => Some(ConfigureIndexRequest { replicas, pod_type }),
            _ => None,
        }
    }
}

// =============================================================================
// Persisted state
// =============================================================================

/// Persisted state of a managed index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexState {
    pub id: String,
    pub name: String,
    pub dimension: i64,
    pub metric: Metric,
    pub pods: i64,
    pub replicas: i64,
    pub pod_type: PodType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_config: Option<MetadataConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl IndexState {
    /// Map a describe snapshot; the status half is dropped
    pub fn from_description(desc: &IndexDescription, last_updated: Option<String>) -> Self {
        let db = &desc.database;
        Self {
            id: db.name.clone(),
            name: db.name.clone(),
            dimension: db.dimension,
            metric: db.metric,
            pods: db.pods,
            replicas: db.replicas,
            pod_type: db.pod_type,
            metadata_config: db.metadata_config.clone(),
            last_updated,
        }
    }
}

/// Result of refreshing a tracked index
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Present(IndexState),
    /// The index no longer exists remotely; drop it from tracked state
    Removed,
}

// =============================================================================
// Data source
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStatusState {
    pub host: String,
    pub port: i64,
    pub state: String,
    pub ready: bool,
}

/// Read-only lookup of an index
///
/// When the index does not exist only `id` is set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexDataSourceState {
    pub id: String,
    pub name: Option<String>,
    pub metric: Option<Metric>,
    pub dimension: Option<i64>,
    pub replicas: Option<i64>,
    pub shards: Option<i64>,
    pub pods: Option<i64>,
    pub pod_type: Option<PodType>,
    pub metadata_config: Option<MetadataConfig>,
    pub status: Option<IndexStatusState>,
}

impl IndexDataSourceState {
    pub fn absent(name: &str) -> Self {
        Self {
            id: name.to_string(),
            ..Self::default()
        }
    }

    pub fn from_description(name: &str, desc: &IndexDescription) -> Self {
        let db = &desc.database;
        Self {
            id: name.to_string(),
            name: Some(db.name.clone()),
            metric: Some(db.metric),
            dimension: Some(db.dimension),
            replicas: Some(db.replicas),
            shards: Some(db.shards),
            pods: Some(db.pods),
            pod_type: Some(db.pod_type),
            metadata_config: db.metadata_config.clone(),
            status: Some(IndexStatusState {
                host: desc.status.host.clone(),
                port: desc.status.port,
                state: desc.status.state.clone(),
                ready: desc.status.ready,
            }),
        }
    }

    pub fn exists(&self) -> bool {
        self.status.is_some()
    }
}
