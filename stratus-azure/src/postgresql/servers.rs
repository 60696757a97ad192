//! Flexible server management.

use std::sync::Arc;
use std::time::Duration;
use stratus_http_client::{Method, Request, Transport, Url};
use tracing::info;

use super::models::{Server, ServerForUpdate};
use crate::Result;
use crate::lro::{Accepted, DEFAULT_POLL_INTERVAL};
use crate::management::ArmClient;

const API_VERSION: &str = "2021-06-01";

/// Client for PostgreSQL flexible servers.
#[derive(Clone)]
pub struct ServersClient {
    arm: ArmClient,
}

impl ServersClient {
    pub fn new(transport: Arc<dyn Transport>, endpoint: Url, subscription_id: impl Into<String>) -> Self {
        Self {
            arm: ArmClient::new(transport, endpoint, subscription_id, DEFAULT_POLL_INTERVAL),
        }
    }

    /// Delay between polls when the service gives no retry hint.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.arm.set_poll_interval(poll_interval);
        self
    }

    pub async fn get(&self, resource_group: &str, server_name: &str) -> Result<Server> {
        let url = self.server_url(resource_group, server_name)?;
        self.arm.get_json(url).await
    }

    /// Start updating a server. The update is validated before anything is
    /// sent.
    pub async fn begin_update(
        &self,
        resource_group: &str,
        server_name: &str,
        update: &ServerForUpdate,
    ) -> Result<Accepted<Server>> {
        update.validate()?;
        let url = self.server_url(resource_group, server_name)?;
        let request = Request::new(Method::PATCH, url).json(update)?;

        info!(resource_group = %resource_group, server = %server_name, "Updating PostgreSQL server");
        Ok(Accepted::new(self.arm.begin(request).await?))
    }

    /// Update a server and wait for the update to finish.
    pub async fn update(
        &self,
        resource_group: &str,
        server_name: &str,
        update: &ServerForUpdate,
    ) -> Result<Server> {
        self.begin_update(resource_group, server_name, update)
            .await?
            .final_result()
            .await
    }

    /// Start deleting a server.
    pub async fn begin_delete(&self, resource_group: &str, server_name: &str) -> Result<Accepted<()>> {
        let url = self.server_url(resource_group, server_name)?;
        info!(resource_group = %resource_group, server = %server_name, "Deleting PostgreSQL server");
        Ok(Accepted::new(self.arm.begin(Request::new(Method::DELETE, url)).await?))
    }

    /// Delete a server and wait until it is gone.
    pub async fn delete(&self, resource_group: &str, server_name: &str) -> Result<()> {
        self.begin_delete(resource_group, server_name)
            .await?
            .final_result()
            .await
    }

    fn server_url(&self, resource_group: &str, server_name: &str) -> Result<Url> {
        self.arm.resource_group_url(
            resource_group,
            &["Microsoft.DBforPostgreSQL", "flexibleServers", server_name],
            API_VERSION,
        )
    }
}

impl std::fmt::Debug for ServersClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServersClient")
            .field("subscription_id", &self.arm.subscription_id())
            .finish_non_exhaustive()
    }
}
