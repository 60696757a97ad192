//! Resource Manager template deployments.

use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use stratus_http_client::{Method, Request, StatusCode, Transport, Url};
use tracing::info;

use super::models::{
    Deployment, DeploymentExportResult, DeploymentOperation, DeploymentProperties, DeploymentRequest,
    DeploymentWhatIf, WhatIfOperationResult, WhatIfRequest,
};
use crate::lro::{Accepted, DEFAULT_POLL_INTERVAL};
use crate::management::{ArmClient, rejection};
use crate::{AzureError, Result};

const API_VERSION: &str = "2021-04-01";

/// Client for deployments in a resource group.
#[derive(Clone)]
pub struct DeploymentsClient {
    arm: ArmClient,
}

impl DeploymentsClient {
    /// Create a client for a subscription.
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

    pub fn subscription_id(&self) -> &str {
        self.arm.subscription_id()
    }

    /// Start creating or updating a deployment.
    ///
    /// The returned [`Accepted`] carries the activation snapshot; its poller
    /// can also [`cancel`](crate::lro::Poller::cancel) the deployment.
    pub async fn begin_create_or_update(
        &self,
        resource_group: &str,
        deployment_name: &str,
        properties: &DeploymentProperties,
    ) -> Result<Accepted<Deployment>> {
        properties.validate()?;
        let url = self.deployment_url(resource_group, deployment_name, &[])?;
        let request = Request::new(Method::PUT, url).json(&DeploymentRequest { properties })?;

        info!(
            resource_group = %resource_group,
            deployment = %deployment_name,
            mode = ?properties.mode,
            "Starting deployment"
        );
        let cancel_url = self.deployment_url(resource_group, deployment_name, &["cancel"])?;
        let poller = self.arm.begin(request).await?.with_cancel_url(cancel_url);
        Ok(Accepted::new(poller))
    }

    /// Create or update a deployment and wait for it to finish.
    pub async fn create_or_update(
        &self,
        resource_group: &str,
        deployment_name: &str,
        properties: &DeploymentProperties,
    ) -> Result<Deployment> {
        self.begin_create_or_update(resource_group, deployment_name, properties)
            .await?
            .final_result()
            .await
    }

    pub async fn get(&self, resource_group: &str, deployment_name: &str) -> Result<Deployment> {
        let url = self.deployment_url(resource_group, deployment_name, &[])?;
        self.arm.get_json(url).await
    }

    /// Whether the deployment exists.
    pub async fn check_existence(&self, resource_group: &str, deployment_name: &str) -> Result<bool> {
        let url = self.deployment_url(resource_group, deployment_name, &[])?;
        let response = self.arm.send(Request::new(Method::HEAD, url)).await?;
        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(rejection(response)),
        }
    }

    /// All deployments of a resource group.
    pub async fn list_by_resource_group(&self, resource_group: &str) -> Result<Vec<Deployment>> {
        let url = self
            .arm
            .resource_group_url(resource_group, &["Microsoft.Resources", "deployments", ""], API_VERSION)?;
        self.arm.list_all(url).await
    }

    /// Deployments of a resource group, one page at a time.
    pub fn list_by_resource_group_pages(
        &self,
        resource_group: &str,
    ) -> Result<impl Stream<Item = Result<Vec<Deployment>>> + Send + '_> {
        let url = self
            .arm
            .resource_group_url(resource_group, &["Microsoft.Resources", "deployments", ""], API_VERSION)?;
        Ok(self.arm.pages(url))
    }

    /// Cancel a running deployment. The service answers 204 and moves the
    /// deployment to `Canceled` in its own time.
    pub async fn cancel(&self, resource_group: &str, deployment_name: &str) -> Result<()> {
        let url = self.deployment_url(resource_group, deployment_name, &["cancel"])?;
        info!(resource_group = %resource_group, deployment = %deployment_name, "Cancelling deployment");
        self.arm.send_checked(Request::new(Method::POST, url)).await?;
        Ok(())
    }

    /// Start deleting a deployment record.
    pub async fn begin_delete(&self, resource_group: &str, deployment_name: &str) -> Result<Accepted<()>> {
        let url = self.deployment_url(resource_group, deployment_name, &[])?;
        info!(resource_group = %resource_group, deployment = %deployment_name, "Deleting deployment");
        let poller = self.arm.begin(Request::new(Method::DELETE, url)).await?;
        Ok(Accepted::new(poller))
    }

    /// Every step of a deployment.
    pub async fn list_operations(
        &self,
        resource_group: &str,
        deployment_name: &str,
    ) -> Result<Vec<DeploymentOperation>> {
        let url = self.deployment_url(resource_group, deployment_name, &["operations"])?;
        self.arm.list_all(url).await
    }

    pub async fn get_operation(
        &self,
        resource_group: &str,
        deployment_name: &str,
        operation_id: &str,
    ) -> Result<DeploymentOperation> {
        let url = self.deployment_url(resource_group, deployment_name, &["operations", operation_id])?;
        self.arm.get_json(url).await
    }

    /// Start a what-if: preview the changes a deployment would make to a
    /// resource group.
    ///
    /// The service answers 202 with a `Location` to poll; the changes arrive
    /// with the final poll.
    pub async fn begin_what_if(
        &self,
        resource_group: &str,
        deployment_name: &str,
        what_if: &DeploymentWhatIf,
    ) -> Result<Accepted<WhatIfOperationResult>> {
        what_if.properties.validate()?;
        let url = self.deployment_url(resource_group, deployment_name, &["whatIf"])?;
        let request = Request::new(Method::POST, url).json(&WhatIfRequest::from(what_if))?;

        info!(resource_group = %resource_group, deployment = %deployment_name, "Starting what-if");
        Ok(Accepted::new(self.arm.begin(request).await?))
    }

    /// Run a what-if against a resource group and wait for the result.
    pub async fn what_if(
        &self,
        resource_group: &str,
        deployment_name: &str,
        what_if: &DeploymentWhatIf,
    ) -> Result<WhatIfOperationResult> {
        self.begin_what_if(resource_group, deployment_name, what_if)
            .await?
            .final_result()
            .await
    }

    /// Start a what-if of a subscription-level deployment. The what-if must
    /// name a location.
    pub async fn begin_what_if_at_subscription_scope(
        &self,
        deployment_name: &str,
        what_if: &DeploymentWhatIf,
    ) -> Result<Accepted<WhatIfOperationResult>> {
        if what_if.location.as_deref().is_none_or(str::is_empty) {
            return Err(AzureError::Config(
                "subscription-level what-if requires a location".into(),
            ));
        }
        what_if.properties.validate()?;
        let url = self.arm.subscription_url(
            &["Microsoft.Resources", "deployments", deployment_name, "whatIf"],
            API_VERSION,
        )?;
        let request = Request::new(Method::POST, url).json(&WhatIfRequest::from(what_if))?;

        info!(deployment = %deployment_name, "Starting subscription what-if");
        Ok(Accepted::new(self.arm.begin(request).await?))
    }

    pub async fn what_if_at_subscription_scope(
        &self,
        deployment_name: &str,
        what_if: &DeploymentWhatIf,
    ) -> Result<WhatIfOperationResult> {
        self.begin_what_if_at_subscription_scope(deployment_name, what_if)
            .await?
            .final_result()
            .await
    }

    /// The template a deployment ran with.
    pub async fn export_template(
        &self,
        resource_group: &str,
        deployment_name: &str,
    ) -> Result<DeploymentExportResult> {
        let url = self.deployment_url(resource_group, deployment_name, &["exportTemplate"])?;
        let response = self.arm.send_checked(Request::new(Method::POST, url)).await?;
        Ok(serde_json::from_slice(response.bytes())?)
    }

    fn deployment_url(&self, resource_group: &str, deployment_name: &str, tail: &[&str]) -> Result<Url> {
        let mut segments = vec!["Microsoft.Resources", "deployments", deployment_name];
        segments.extend_from_slice(tail);
        self.arm.resource_group_url(resource_group, &segments, API_VERSION)
    }
}

impl std::fmt::Debug for DeploymentsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentsClient")
            .field("subscription_id", &self.arm.subscription_id())
            .finish_non_exhaustive()
    }
}
