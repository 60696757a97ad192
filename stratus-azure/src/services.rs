//! Azure services container with lazy client construction.

use async_trait::async_trait;
#[allow(unused_imports)]
use parking_lot::RwLock;
use std::sync::Arc;
use stratus_http_client::{HttpClient, HttpClientConfig, Request, Response, Transport};
use tracing::{debug, info};

#[allow(unused_imports)]
use crate::{AzureConfig, AzureError, CredentialsSource, Result};

#[cfg(feature = "logs")]
use crate::logs::LogsQueryClient;
#[cfg(feature = "postgresql")]
use crate::postgresql::ServersClient;
#[cfg(feature = "deployments")]
use crate::resources::DeploymentsClient;

/// Adds a fixed bearer token to every outgoing request.
struct BearerTokenTransport {
    inner: Arc<dyn Transport>,
    token: String,
}

#[async_trait]
impl Transport for BearerTokenTransport {
    async fn send(&self, request: Request) -> stratus_http_client::Result<Response> {
        self.inner.send(request.bearer_auth(&self.token)).await
    }
}

/// Container for Azure service clients.
///
/// Clients are built on first use and cached. Only services enabled in the
/// configuration (and compiled in through their feature flag) can be
/// obtained; all of them share one transport.
pub struct AzureServices {
    config: AzureConfig,
    transport: Arc<dyn Transport>,

    #[cfg(feature = "logs")]
    logs: RwLock<Option<LogsQueryClient>>,

    #[cfg(feature = "deployments")]
    deployments: RwLock<Option<DeploymentsClient>>,

    #[cfg(feature = "postgresql")]
    postgresql_servers: RwLock<Option<ServersClient>>,
}

impl AzureServices {
    /// Create a container backed by a real HTTP client.
    pub fn new(config: AzureConfig) -> Result<Arc<Self>> {
        let http = HttpClient::new(
            HttpClientConfig::builder()
                .user_agent(concat!("stratus-azure/", env!("CARGO_PKG_VERSION")))
                .build(),
        )?;
        Self::with_transport(config, Arc::new(http))
    }

    /// Create a container that sends through `transport`.
    pub fn with_transport(config: AzureConfig, transport: Arc<dyn Transport>) -> Result<Arc<Self>> {
        let transport: Arc<dyn Transport> = match &config.credentials {
            CredentialsSource::Anonymous => transport,
            CredentialsSource::AccessToken(token) => Arc::new(BearerTokenTransport {
                inner: transport,
                token: token.clone(),
            }),
        };

        info!(
            subscription_id = ?config.subscription_id,
            services = ?config.enabled_services,
            "Azure services initialized"
        );

        let services = Arc::new(Self {
            config,
            transport,
            #[cfg(feature = "logs")]
            logs: RwLock::new(None),
            #[cfg(feature = "deployments")]
            deployments: RwLock::new(None),
            #[cfg(feature = "postgresql")]
            postgresql_servers: RwLock::new(None),
        });

        services.initialize_enabled_services()?;

        Ok(services)
    }

    /// Build the clients of every enabled service up front, so that
    /// configuration mistakes surface here rather than on first use.
    fn initialize_enabled_services(&self) -> Result<()> {
        for service in &self.config.enabled_services {
            match service.as_str() {
                #[cfg(feature = "logs")]
                "logs" => {
                    self.init_logs()?;
                }
                #[cfg(feature = "deployments")]
                "deployments" => {
                    self.init_deployments()?;
                }
                #[cfg(feature = "postgresql")]
                "postgresql" => {
                    self.init_postgresql_servers()?;
                }
                other => debug!(service = other, "Skipping unknown or disabled service"),
            }
        }
        Ok(())
    }

    /// Get the configuration.
    pub fn config(&self) -> &AzureConfig {
        &self.config
    }

    /// The shared transport, with credentials applied.
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    // Service initializers

    #[cfg(feature = "logs")]
    fn init_logs(&self) -> Result<LogsQueryClient> {
        let mut client = self.logs.write();
        if let Some(existing) = client.as_ref() {
            return Ok(existing.clone());
        }

        let endpoint = self.config.logs_url()?;
        info!(endpoint = %endpoint, "Log Analytics query client initialized");
        let created = LogsQueryClient::new(self.transport(), endpoint);
        *client = Some(created.clone());
        Ok(created)
    }

    #[cfg(feature = "deployments")]
    fn init_deployments(&self) -> Result<DeploymentsClient> {
        let mut client = self.deployments.write();
        if let Some(existing) = client.as_ref() {
            return Ok(existing.clone());
        }

        let endpoint = self.config.management_url()?;
        let subscription_id = self.config.require_subscription_id()?;
        info!(endpoint = %endpoint, subscription_id, "Deployments client initialized");
        let created = DeploymentsClient::new(self.transport(), endpoint, subscription_id)
            .with_poll_interval(self.config.default_poll_interval);
        *client = Some(created.clone());
        Ok(created)
    }

    #[cfg(feature = "postgresql")]
    fn init_postgresql_servers(&self) -> Result<ServersClient> {
        let mut client = self.postgresql_servers.write();
        if let Some(existing) = client.as_ref() {
            return Ok(existing.clone());
        }

        let endpoint = self.config.management_url()?;
        let subscription_id = self.config.require_subscription_id()?;
        info!(endpoint = %endpoint, subscription_id, "PostgreSQL servers client initialized");
        let created = ServersClient::new(self.transport(), endpoint, subscription_id)
            .with_poll_interval(self.config.default_poll_interval);
        *client = Some(created.clone());
        Ok(created)
    }

    // Service accessors

    /// Get the Log Analytics query client.
    #[cfg(feature = "logs")]
    pub fn logs(&self) -> Result<LogsQueryClient> {
        if !self.config.is_enabled("logs") {
            return Err(AzureError::not_configured("logs"));
        }

        if let Some(client) = self.logs.read().clone() {
            return Ok(client);
        }
        self.init_logs()
    }

    #[cfg(not(feature = "logs"))]
    pub fn logs(&self) -> Result<()> {
        Err(AzureError::not_enabled("logs"))
    }

    /// Get the Resource Manager deployments client.
    #[cfg(feature = "deployments")]
    pub fn deployments(&self) -> Result<DeploymentsClient> {
        if !self.config.is_enabled("deployments") {
            return Err(AzureError::not_configured("deployments"));
        }

        if let Some(client) = self.deployments.read().clone() {
            return Ok(client);
        }
        self.init_deployments()
    }

    #[cfg(not(feature = "deployments"))]
    pub fn deployments(&self) -> Result<()> {
        Err(AzureError::not_enabled("deployments"))
    }

    /// Get the PostgreSQL flexible servers client.
    #[cfg(feature = "postgresql")]
    pub fn postgresql_servers(&self) -> Result<ServersClient> {
        if !self.config.is_enabled("postgresql") {
            return Err(AzureError::not_configured("postgresql"));
        }

        if let Some(client) = self.postgresql_servers.read().clone() {
            return Ok(client);
        }
        self.init_postgresql_servers()
    }

    #[cfg(not(feature = "postgresql"))]
    pub fn postgresql_servers(&self) -> Result<()> {
        Err(AzureError::not_enabled("postgresql"))
    }
}

impl std::fmt::Debug for AzureServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureServices")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
