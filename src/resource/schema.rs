//! Schema metadata and planning
//!
//! Attribute tables exposed to the host, with per-field mutability. The
//! planner uses the same table to decide between an in-place configure and a
//! replacement.

use super::state::{IndexConfig, IndexState};
use serde::Serialize;

pub const PROVIDER_TYPE_NAME: &str = "pinecone";
pub const INDEX_TYPE_NAME: &str = "pinecone_index";

pub const DEFAULT_METRIC: &str = "cosine";
pub const DEFAULT_PODS: i64 = 1;
pub const DEFAULT_REPLICAS: i64 = 1;
pub const DEFAULT_POD_TYPE: &str = "p1.x1";
pub const MAX_NAME_LENGTH: usize = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int64,
    Bool,
    StringList,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Required,
    Optional,
    /// Optional; the provider fills it in when omitted
    OptionalComputed,
    Computed,
}

/// How a change to the attribute is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutability {
    /// A change destroys and recreates the index
    RequiresReplace,
    /// Changed through configure
    InPlace,
    /// Fixed after create; no update path touches it
    Immutable,
    /// Set by the provider only
    Computed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub presence: Presence,
    pub mutability: Mutability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<Attribute>,
}

impl Attribute {
    fn new(
        name: &'static str,
        kind: AttributeType,
        presence: Presence,
        mutability: Mutability,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            presence,
            mutability,
            default: None,
            sensitive: false,
            description,
            nested: Vec::new(),
        }
    }

    fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    fn with_nested(mut self, nested: Vec<Attribute>) -> Self {
        self.nested = nested;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub type_name: &'static str,
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Provider-level configuration schema
pub fn provider_schema() -> Schema {
    use AttributeType::*;
    use Mutability::InPlace;
    use Presence::Optional;

    Schema {
        type_name: PROVIDER_TYPE_NAME,
        description: "Interact with Pinecone vector database. https://www.pinecone.io/",
        attributes: vec![
            Attribute::new("environment", String, Optional, InPlace, "The Pinecone environment to use."),
            Attribute::new("api_key", String, Optional, InPlace, "The Pinecone API key to use.").sensitive(),
        ],
    }
}

/// Managed index resource schema
pub fn index_resource_schema() -> Schema {
    use AttributeType::*;
    use Mutability::{Immutable, InPlace, RequiresReplace};
    use Presence::*;

    Schema {
        type_name: INDEX_TYPE_NAME,
        description: "Manage an index.",
        attributes: vec![
            Attribute::new("id", String, Computed, Mutability::Computed, "The ID of the index."),
            Attribute::new("name", String, Required, RequiresReplace, "The name of the index."),
            Attribute::new("dimension", Int64, Required, RequiresReplace, "The dimension of the index."),
            Attribute::new("metric", String, OptionalComputed, RequiresReplace, "The metric of the index.")
                .with_default(DEFAULT_METRIC),
            Attribute::new("pods", Int64, OptionalComputed, RequiresReplace, "The number of pods of the index.")
                .with_default("1"),
            Attribute::new("replicas", Int64, OptionalComputed, InPlace, "The number of replicas of the index.")
                .with_default("1"),
            Attribute::new("pod_type", String, OptionalComputed, InPlace, "The pod type of the index.")
                .with_default(DEFAULT_POD_TYPE),
            Attribute::new("metadata_config", Object, OptionalComputed, Immutable, "The metadata config of the index.")
                .with_nested(vec![Attribute::new(
                    "indexed",
                    StringList,
                    OptionalComputed,
                    Immutable,
                    "The indexed fields of the index.",
                )]),
            Attribute::new("last_updated", String, Computed, Mutability::Computed, "The last updated time of the index."),
        ],
    }
}

/// Read-only index lookup schema
pub fn index_data_source_schema() -> Schema {
    use AttributeType::*;
    use Mutability::Computed as C;
    use Presence::*;

    let computed = |name, kind, description| Attribute::new(name, kind, Computed, C, description);

    Schema {
        type_name: INDEX_TYPE_NAME,
        description: "Get information about an index.",
        attributes: vec![
            computed("id", String, "The ID of the index."),
            Attribute::new("name", String, Required, C, "The name of the index."),
            computed("metric", String, "The metric of the index."),
            computed("dimension", Int64, "The dimension of the index."),
            computed("replicas", Int64, "The replicas of the index."),
            computed("shards", Int64, "The shards of the index."),
            computed("pods", Int64, "The pods of the index."),
            computed("pod_type", String, "The pod type of the index."),
            computed("metadata_config", Object, "The metadata config of the index.")
                .with_nested(vec![computed("indexed", StringList, "The indexed fields of the index.")]),
            computed("status", Object, "The status of the index.").with_nested(vec![
                computed("host", String, "The host of the index."),
                computed("port", Int64, "The port of the index."),
                computed("state", String, "The state of the index."),
                computed("ready", Bool, "The ready state of the index."),
            ]),
        ],
    }
}

// =============================================================================
// Planning
// =============================================================================

/// Action needed to move prior state to the desired configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Create,
    NoOp,
    /// Configure in place; lists the changed attributes
    Update(Vec<&'static str>),
    /// Destroy and recreate; lists the attributes forcing it
    Replace(Vec<&'static str>),
}

/// Diff desired configuration against prior state
///
/// Schema defaults fill omitted optional attributes. An unparseable desired
/// value counts as a change; validation reports it when the request is built.
pub fn plan(prior: Option<&IndexState>, desired: &IndexConfig) -> Plan {
    let Some(prior) = prior else {
        return Plan::Create;
    };

    let changes: [(&'static str, bool); 7] = [
        ("name", prior.name != desired.name),
        ("dimension", prior.dimension != desired.dimension),
        ("metric", prior.metric.as_str() != desired.effective_metric()),
        ("pods", prior.pods != desired.effective_pods()),
        ("replicas", prior.replicas != desired.effective_replicas()),
        ("pod_type", prior.pod_type.to_string() != desired.effective_pod_type()),
        (
            "metadata_config",
            // omitted means "keep whatever the server computed"
            desired.metadata_config.is_some() && desired.metadata_config != prior.metadata_config,
        ),
    ];

    let schema = index_resource_schema();
    let mut replace = Vec::new();
    let mut update = Vec::new();

    for (name, changed) in changes {
        if !changed {
            continue;
        }
        match schema.attribute(name).map(|a| a.mutability) {
            Some(Mutability::InPlace) => update.push(name),
            Some(Mutability::Immutable) | Some(Mutability::RequiresReplace) => replace.push(name),
            Some(Mutability::Computed) | None => {}
        }
    }

    if !replace.is_empty() {
        Plan::Replace(replace)
    } else if !update.is_empty() {
        Plan::Update(update)
    } else {
        Plan::NoOp
    }
}
