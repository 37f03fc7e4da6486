//! Provider
//!
//! Validates provider configuration, builds the control-plane client and hands
//! out the index resource and data source bound to it.

use crate::config::{ProviderConfig, API_KEY_ENV, ENVIRONMENT_ENV};
use crate::pinecone::{ControlPlane, PineconeClient};
use crate::resource::schema::PROVIDER_TYPE_NAME;
use crate::resource::{Diagnostics, IndexDataSource, IndexResource, Reconciler};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct Provider {
    version: String,
    /// Injected client; replaces the HTTPS client when set
    injected: Option<Arc<dyn ControlPlane>>,
    configured: Option<Configured>,
    cancel: CancellationToken,
}

struct Configured {
    client: Arc<dyn ControlPlane>,
    reconciler: Reconciler,
}

impl Provider {
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            injected: None,
            configured: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `client` instead of building the HTTPS client at configure time
    pub fn with_client(mut self, client: Arc<dyn ControlPlane>) -> Self {
        self.injected = Some(client);
        self
    }

    /// Share a cancellation token with every convergence wait
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn type_name(&self) -> &'static str {
        PROVIDER_TYPE_NAME
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_configured(&self) -> bool {
        self.configured.is_some()
    }

    /// Validate settings and prepare the client
    pub fn configure(&mut self, config: &ProviderConfig, diags: &mut Diagnostics) {
        tracing::info!("Configuring Pinecone client");

        if config.environment.is_empty() {
            diags.add_attribute_error(
                "environment",
                "Missing Pinecone API environment",
                format!(
                    "The provider cannot create the Pinecone API client as there is a missing or empty value for the Pinecone API environment. \
                     Set the environment value in the configuration or use the {} environment variable. \
                     If either is already set, ensure the value is not empty.",
                    ENVIRONMENT_ENV
                ),
            );
        }

        if config.api_key.is_empty() {
            diags.add_attribute_error(
                "api_key",
                "Missing Pinecone API Key",
                format!(
                    "The provider cannot create the Pinecone API client as there is a missing or empty value for the Pinecone API Key. \
                     Set the api_key value in the configuration or use the {} environment variable. \
                     If either is already set, ensure the value is not empty.",
                    API_KEY_ENV
                ),
            );
        }

        if diags.has_error() {
            return;
        }

        tracing::debug!(environment = %config.environment, "Creating Pinecone client");

        let client: Arc<dyn ControlPlane> = match &self.injected {
            Some(client) => {
                tracing::info!("Configured injected Pinecone client");
                client.clone()
            }
            None => match build_client(config) {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    diags.add_error(
                        "Unable to Create Pinecone API Client",
                        format!(
                            "An unexpected error occurred when creating the Pinecone API client.\n\nPinecone Client Error: {}",
                            e
                        ),
                    );
                    return;
                }
            },
        };

        let reconciler = Reconciler::new(config.poll_interval)
            .with_timeout(config.timeout)
            .with_cancellation(self.cancel.clone());

        self.configured = Some(Configured { client, reconciler });
        tracing::info!(environment = %config.environment, "Configured Pinecone client");
    }

    /// The `pinecone_index` resource; requires a successful configure
    pub fn index_resource(&self, diags: &mut Diagnostics) -> Option<IndexResource> {
        let configured = self.require_configured(diags)?;
        Some(IndexResource::new(configured.client.clone(), configured.reconciler.clone()))
    }

    /// The `pinecone_index` data source; requires a successful configure
    pub fn index_data_source(&self, diags: &mut Diagnostics) -> Option<IndexDataSource> {
        let configured = self.require_configured(diags)?;
        Some(IndexDataSource::new(configured.client.clone()))
    }

    /// Configured client, for operations outside the resource lifecycle
    pub fn client(&self, diags: &mut Diagnostics) -> Option<Arc<dyn ControlPlane>> {
        Some(self.require_configured(diags)?.client.clone())
    }

    fn require_configured(&self, diags: &mut Diagnostics) -> Option<&Configured> {
        if self.configured.is_none() {
            diags.add_error("Error Configure", "Provider has not been configured");
        }
        self.configured.as_ref()
    }
}

fn build_client(config: &ProviderConfig) -> crate::pinecone::Result<PineconeClient> {
    let client = PineconeClient::new(&config.environment, &config.api_key)?;
    match &config.endpoint {
        Some(endpoint) => client.with_endpoint(endpoint),
        None => Ok(client),
    }
}
