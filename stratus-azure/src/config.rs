//! Azure configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::lro::DEFAULT_POLL_INTERVAL;
use crate::{AzureError, Result};

/// Default Log Analytics query endpoint.
pub const DEFAULT_LOGS_ENDPOINT: &str = "https://api.loganalytics.io/v1";

/// Default Resource Manager endpoint.
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// How requests are authenticated.
///
/// Token acquisition flows live outside this crate; hand in a token obtained
/// elsewhere, or send anonymous requests to an endpoint that does not need one.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialsSource {
    /// Send no `Authorization` header.
    #[default]
    Anonymous,
    /// Send a fixed bearer token.
    AccessToken(String),
}

impl std::fmt::Debug for CredentialsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
        }
    }
}

/// Azure service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Log Analytics query endpoint.
    #[serde(default = "default_logs_endpoint")]
    pub logs_endpoint: String,
    /// Resource Manager endpoint.
    #[serde(default = "default_management_endpoint")]
    pub management_endpoint: String,
    /// Subscription that Resource Manager calls target.
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Credentials source.
    #[serde(default)]
    pub credentials: CredentialsSource,
    /// Delay between long-running-operation polls when the service gives no
    /// hint.
    #[serde(default = "default_poll_interval")]
    pub default_poll_interval: Duration,
    /// Enabled services.
    #[serde(default)]
    pub enabled_services: HashSet<String>,
}

fn default_logs_endpoint() -> String {
    DEFAULT_LOGS_ENDPOINT.to_string()
}

fn default_management_endpoint() -> String {
    DEFAULT_MANAGEMENT_ENDPOINT.to_string()
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            logs_endpoint: default_logs_endpoint(),
            management_endpoint: default_management_endpoint(),
            subscription_id: None,
            credentials: CredentialsSource::Anonymous,
            default_poll_interval: DEFAULT_POLL_INTERVAL,
            enabled_services: HashSet::new(),
        }
    }
}

impl AzureConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder.
    pub fn builder() -> AzureConfigBuilder {
        AzureConfigBuilder::new()
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `AZURE_SUBSCRIPTION_ID`, `AZURE_LOG_ANALYTICS_ENDPOINT`,
    /// `AZURE_RESOURCE_MANAGER_ENDPOINT` and `AZURE_ACCESS_TOKEN`.
    pub fn from_env() -> AzureConfigBuilder {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AzureConfigBuilder {
        let mut builder = AzureConfigBuilder::new();

        if let Some(subscription) = lookup("AZURE_SUBSCRIPTION_ID") {
            builder = builder.subscription_id(subscription);
        }

        if let Some(endpoint) = lookup("AZURE_LOG_ANALYTICS_ENDPOINT") {
            builder = builder.logs_endpoint(endpoint);
        }

        if let Some(endpoint) = lookup("AZURE_RESOURCE_MANAGER_ENDPOINT") {
            builder = builder.management_endpoint(endpoint);
        }

        if let Some(token) = lookup("AZURE_ACCESS_TOKEN").filter(|t| !t.is_empty()) {
            builder = builder.access_token(token);
        }

        builder
    }

    /// Check if a service is enabled.
    pub fn is_enabled(&self, service: &str) -> bool {
        self.enabled_services.contains(service)
    }

    /// The Log Analytics endpoint as a URL.
    pub fn logs_url(&self) -> Result<Url> {
        parse_endpoint("logs_endpoint", &self.logs_endpoint)
    }

    /// The Resource Manager endpoint as a URL.
    pub fn management_url(&self) -> Result<Url> {
        parse_endpoint("management_endpoint", &self.management_endpoint)
    }

    /// The subscription id, required by Resource Manager clients.
    pub fn require_subscription_id(&self) -> Result<&str> {
        self.subscription_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AzureError::Config("subscription_id is not set".to_string()))
    }
}

fn parse_endpoint(field: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value).map_err(|e| AzureError::Config(format!("{field} '{value}': {e}")))?;
    if !matches!(url.scheme(), "https" | "http") {
        return Err(AzureError::Config(format!(
            "{field} '{value}' must be an http(s) URL"
        )));
    }
    Ok(url)
}

/// Builder for Azure configuration.
#[derive(Debug, Clone, Default)]
pub struct AzureConfigBuilder {
    config: AzureConfig,
}

impl AzureConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Log Analytics endpoint.
    pub fn logs_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.logs_endpoint = endpoint.into();
        self
    }

    /// Set the Resource Manager endpoint.
    pub fn management_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.management_endpoint = endpoint.into();
        self
    }

    /// Set the subscription id.
    pub fn subscription_id(mut self, subscription_id: impl Into<String>) -> Self {
        self.config.subscription_id = Some(subscription_id.into());
        self
    }

    /// Set the credentials source.
    pub fn credentials(mut self, credentials: CredentialsSource) -> Self {
        self.config.credentials = credentials;
        self
    }

    /// Use a fixed bearer token.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.credentials = CredentialsSource::AccessToken(token.into());
        self
    }

    /// Set the default long-running-operation poll interval.
    pub fn default_poll_interval(mut self, interval: Duration) -> Self {
        self.config.default_poll_interval = interval;
        self
    }

    /// Enable a service.
    pub fn enable(mut self, service: impl Into<String>) -> Self {
        self.config.enabled_services.insert(service.into());
        self
    }

    /// Enable the Log Analytics query client.
    pub fn enable_logs(self) -> Self {
        self.enable("logs")
    }

    /// Enable the Resource Manager deployments client.
    pub fn enable_deployments(self) -> Self {
        self.enable("deployments")
    }

    /// Enable the PostgreSQL flexible server client.
    pub fn enable_postgresql(self) -> Self {
        self.enable("postgresql")
    }

    /// Enable every service.
    pub fn enable_all(self) -> Self {
        self.enable_logs().enable_deployments().enable_postgresql()
    }

    /// Build the configuration.
    pub fn build(self) -> AzureConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AzureConfig::default();
        assert_eq!(config.logs_endpoint, "https://api.loganalytics.io/v1");
        assert_eq!(config.management_endpoint, "https://management.azure.com");
        assert_eq!(config.default_poll_interval, Duration::from_secs(10));
        assert_eq!(config.credentials, CredentialsSource::Anonymous);
        assert!(config.enabled_services.is_empty());
        assert!(config.require_subscription_id().is_err());
    }

    #[test]
    fn test_builder() {
        let config = AzureConfig::builder()
            .subscription_id("sub-1")
            .access_token("secret")
            .default_poll_interval(Duration::from_secs(2))
            .enable_logs()
            .enable_deployments()
            .build();

        assert_eq!(config.require_subscription_id().unwrap(), "sub-1");
        assert!(config.is_enabled("logs"));
        assert!(config.is_enabled("deployments"));
        assert!(!config.is_enabled("postgresql"));
        assert_eq!(config.default_poll_interval, Duration::from_secs(2));
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("AZURE_SUBSCRIPTION_ID", "sub-env"),
            ("AZURE_RESOURCE_MANAGER_ENDPOINT", "https://management.usgovcloudapi.net"),
            ("AZURE_ACCESS_TOKEN", "tok"),
        ]
        .into_iter()
        .collect();

        let config = AzureConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
            .enable_all()
            .build();

        assert_eq!(config.subscription_id.as_deref(), Some("sub-env"));
        assert_eq!(config.management_endpoint, "https://management.usgovcloudapi.net");
        assert_eq!(config.logs_endpoint, DEFAULT_LOGS_ENDPOINT);
        assert_eq!(config.credentials, CredentialsSource::AccessToken("tok".into()));
        assert_eq!(config.enabled_services.len(), 3);
    }

    #[test]
    fn test_endpoint_validation() {
        let config = AzureConfig::builder().logs_endpoint("not a url").build();
        assert!(matches!(config.logs_url(), Err(AzureError::Config(_))));

        let config = AzureConfig::builder().management_endpoint("ftp://example.com").build();
        assert!(config.management_url().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: AzureConfig = serde_json::from_value(serde_json::json!({
            "subscription_id": "sub-1",
            "credentials": {"access_token": "tok"},
            "enabled_services": ["logs"]
        }))
        .unwrap();

        assert_eq!(config.logs_endpoint, DEFAULT_LOGS_ENDPOINT);
        assert_eq!(config.default_poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.credentials, CredentialsSource::AccessToken("tok".into()));
        assert!(config.is_enabled("logs"));
    }
}
