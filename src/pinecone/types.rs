//! Control-plane value types and wire shapes
//!
//! Scalar domain values (metric, pod type, metadata config) with their
//! canonical string forms, plus the request/response bodies of the
//! `/databases` API. Field names on the wire are fixed snake_case keys.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rejected domain value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid metric value: {0}")]
    InvalidMetric(String),
    #[error("invalid metric code: {0}")]
    InvalidMetricCode(i64),
    #[error("invalid pod type: {0}")]
    InvalidPodType(String),
    #[error("invalid pod class: {0}")]
    InvalidPodClass(String),
    #[error("invalid pod size: {0}")]
    InvalidPodSize(String),
}

// =============================================================================
// Metric
// =============================================================================

/// Distance function used for similarity search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Metric {
    Euclidean,
    #[default]
    Cosine,
    Dotproduct,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Euclidean, Metric::Cosine, Metric::Dotproduct];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Cosine => "cosine",
            Self::Dotproduct => "dotproduct",
        }
    }

    /// Numeric code (declaration order)
    pub fn code(&self) -> i64 {
        match self {
            Self::Euclidean => 0,
            Self::Cosine => 1,
            Self::Dotproduct => 2,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "euclidean" => Ok(Self::Euclidean),
            "cosine" => Ok(Self::Cosine),
            "dotproduct" => Ok(Self::Dotproduct),
            other => Err(ParseError::InvalidMetric(other.to_string())),
        }
    }
}

/// Out-of-range codes are rejected; there is no fallback variant
impl TryFrom<i64> for Metric {
    type Error = ParseError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Euclidean),
            1 => Ok(Self::Cosine),
            2 => Ok(Self::Dotproduct),
            other => Err(ParseError::InvalidMetricCode(other)),
        }
    }
}

impl TryFrom<String> for Metric {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Metric> for String {
    fn from(metric: Metric) -> Self {
        metric.as_str().to_string()
    }
}

// =============================================================================
// Pod type
// =============================================================================

/// Performance/storage tier of a pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PodClass {
    S1,
    P1,
    P2,
}

impl PodClass {
    pub const ALL: [PodClass; 3] = [PodClass::S1, PodClass::P1, PodClass::P2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S1 => "s1",
            Self::P1 => "p1",
            Self::P2 => "p2",
        }
    }
}

impl FromStr for PodClass {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s1" => Ok(Self::S1),
            "p1" => Ok(Self::P1),
            "p2" => Ok(Self::P2),
            other => Err(ParseError::InvalidPodClass(other.to_string())),
        }
    }
}

/// Capacity multiplier of a pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PodSize {
    X1,
    X2,
    X4,
    X8,
}

impl PodSize {
    pub const ALL: [PodSize; 4] = [PodSize::X1, PodSize::X2, PodSize::X4, PodSize::X8];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X1 => "x1",
            Self::X2 => "x2",
            Self::X4 => "x4",
            Self::X8 => "x8",
        }
    }
}

impl FromStr for PodSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x1" => Ok(Self::X1),
            "x2" => Ok(Self::X2),
            "x4" => Ok(Self::X4),
            "x8" => Ok(Self::X8),
            other => Err(ParseError::InvalidPodSize(other.to_string())),
        }
    }
}

/// Pod type in `<class>.<size>` form, e.g. `p1.x2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PodType {
    pub class: PodClass,
    pub size: PodSize,
}

impl PodType {
    pub fn new(class: PodClass, size: PodSize) -> Self {
        Self { class, size }
    }
}

impl Default for PodType {
    fn default() -> Self {
        Self::new(PodClass::P1, PodSize::X1)
    }
}

impl fmt::Display for PodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class.as_str(), self.size.as_str())
    }
}

impl FromStr for PodType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        let [class, size] = parts.as_slice() else {
            return Err(ParseError::InvalidPodType(s.to_string()));
        };

        Ok(Self {
            class: class.parse()?,
            size: size.parse()?,
        })
    }
}

impl TryFrom<String> for PodType {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PodType> for String {
    fn from(pod_type: PodType) -> Self {
        pod_type.to_string()
    }
}

// =============================================================================
// Metadata config
// =============================================================================

/// Metadata fields indexed for filtering, `{"indexed": ["field"]}`
///
/// Absence is modelled as `Option::None` by every holder; an empty list is a
/// distinct (if useless) value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub indexed: Vec<String>,
}

impl MetadataConfig {
    pub fn new<I, S>(indexed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indexed: indexed.into_iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Body of `POST /databases`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndexRequest {
    pub name: String,
    pub dimension: i64,
    pub metric: Metric,
    pub pods: i64,
    pub replicas: i64,
    pub pod_type: PodType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_config: Option<MetadataConfig>,
}

/// Body of `PATCH /databases/{name}`; only these fields are mutable post-create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigureIndexRequest {
    pub replicas: i64,
    pub pod_type: PodType,
}

// =============================================================================
// Describe response
// =============================================================================

/// Response of `GET /databases/{name}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescription {
    pub database: DatabaseDescription,
    pub status: IndexStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDescription {
    pub name: String,
    pub metric: Metric,
    pub dimension: i64,
    #[serde(default)]
    pub replicas: i64,
    #[serde(default)]
    pub shards: i64,
    #[serde(default)]
    pub pods: i64,
    pub pod_type: PodType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_config: Option<MetadataConfig>,
}

/// Status snapshot; produced fresh by every describe, never persisted
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexStatus {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub waiting: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub crashed: Vec<String>,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: i64,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub ready: bool,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
