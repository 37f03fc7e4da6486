//! Pinecone control-plane client
//!
//! One call per remote action. [`ControlPlane`] is the contract shared by the
//! production [`PineconeClient`] and the in-memory substitute used in tests.

use super::error::{Error, Result};
use super::http::PineconeHttpClient;
use super::types::{ConfigureIndexRequest, CreateIndexRequest, IndexDescription};
use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

/// Remote operations on indexes
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Environment the client targets
    fn environment(&self) -> &str;

    /// Controller base URL; fails when no environment is configured
    fn base_url(&self) -> Result<String> {
        controller_url(self.environment())
    }

    /// List index names
    async fn list_indexes(&self) -> Result<Vec<String>>;

    /// Start provisioning an index; does not wait for readiness
    async fn create_index(&self, req: &CreateIndexRequest) -> Result<()>;

    /// Describe an index; `Ok(None)` when it does not exist
    async fn describe_index(&self, name: &str) -> Result<Option<IndexDescription>>;

    async fn delete_index(&self, name: &str) -> Result<()>;

    /// Change replicas and pod type of an existing index
    async fn configure_index(&self, name: &str, req: &ConfigureIndexRequest) -> Result<()>;
}

/// Build the controller URL for an environment
pub fn controller_url(environment: &str) -> Result<String> {
    if environment.is_empty() {
        return Err(Error::MissingEnvironment);
    }
    let url = format!("https://controller.{}.pinecone.io", environment);
    Url::parse(&url).map_err(|e| Error::InvalidEndpoint {
        endpoint: url.clone(),
        reason: e.to_string(),
    })?;
    Ok(url)
}

/// Production client talking to the Pinecone controller over HTTPS
#[derive(Clone, Debug)]
pub struct PineconeClient {
    http: PineconeHttpClient,
    api_key_present: bool,
    environment: String,
    endpoint: Option<String>,
}

impl PineconeClient {
    /// Create a new client
    /// Empty credentials are accepted here and rejected by every operation
    pub fn new(environment: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            http: PineconeHttpClient::new(api_key)?,
            api_key_present: !api_key.is_empty(),
            environment: environment.to_string(),
            endpoint: None,
        })
    }

    /// Override the derived controller URL
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        let parsed = Url::parse(endpoint).map_err(|e| Error::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(Error::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "not a base URL".to_string(),
            });
        }
        self.endpoint = Some(endpoint.trim_end_matches('/').to_string());
        Ok(self)
    }

    /// Check credentials and resolve the base URL before touching the network
    fn preflight(&self) -> Result<String> {
        let base = self.base_url()?;
        if !self.api_key_present {
            return Err(Error::MissingApiKey);
        }
        Ok(base)
    }

    fn databases_url(&self) -> Result<String> {
        Ok(format!("{}/databases", self.preflight()?))
    }

    fn database_url(&self, name: &str) -> Result<String> {
        Ok(format!(
            "{}/databases/{}",
            self.preflight()?,
            urlencoding::encode(name)
        ))
    }
}

#[async_trait]
impl ControlPlane for PineconeClient {
    fn environment(&self) -> &str {
        &self.environment
    }

    fn base_url(&self) -> Result<String> {
        let derived = controller_url(&self.environment)?;
        Ok(self.endpoint.clone().unwrap_or(derived))
    }

    async fn list_indexes(&self) -> Result<Vec<String>> {
        let url = self.databases_url()?;
        let response = self
            .http
            .get(&url, "application/json; charset=utf-8")
            .await?
            .error_for_status("list indexes")?;

        Ok(serde_json::from_str(&response.body)?)
    }

    async fn create_index(&self, req: &CreateIndexRequest) -> Result<()> {
        let url = self.databases_url()?;
        tracing::info!("Creating index {} ({} dims, {})", req.name, req.dimension, req.metric);
        self.http
            .post(&url, "text/plain; charset=utf-8", req)
            .await?
            .error_for_status("create index")?;
        Ok(())
    }

    async fn describe_index(&self, name: &str) -> Result<Option<IndexDescription>> {
        let url = self.database_url(name)?;
        let response = self.http.get(&url, "application/json").await?;

        if response.status == StatusCode::NOT_FOUND {
            tracing::debug!("Index {} not found", name);
            return Ok(None);
        }

        let response = response.error_for_status("describe index")?;
        Ok(Some(serde_json::from_str(&response.body)?))
    }

    async fn delete_index(&self, name: &str) -> Result<()> {
        let url = self.database_url(name)?;
        tracing::info!("Deleting index {}", name);
        self.http
            .delete(&url, "text/plain")
            .await?
            .error_for_status("delete index")?;
        Ok(())
    }

    async fn configure_index(&self, name: &str, req: &ConfigureIndexRequest) -> Result<()> {
        let url = self.database_url(name)?;
        tracing::info!(
            "Configuring index {}: replicas={}, pod_type={}",
            name,
            req.replicas,
            req.pod_type
        );
        self.http
            .patch(&url, "text/plain", req)
            .await?
            .error_for_status("configure index")?;
        Ok(())
    }
}
