//! Shared Resource Manager plumbing: URL building, error mapping, paging.

mod error;
mod paging;

pub use error::{AdditionalInfo, ManagementError};
pub use paging::Page;

use std::sync::Arc;
use std::time::Duration;
use stratus_http_client::{Method, Request, Response, Transport, Url};
use tracing::debug;

use crate::lro::{Poller, PollableResource};
use crate::{AzureError, Result};

/// Resource Manager client core shared by the service clients.
#[derive(Clone)]
pub(crate) struct ArmClient {
    transport: Arc<dyn Transport>,
    endpoint: Url,
    subscription_id: String,
    poll_interval: Duration,
}

impl ArmClient {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        mut endpoint: Url,
        subscription_id: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Self {
            transport,
            endpoint,
            subscription_id: subscription_id.into(),
            poll_interval,
        }
    }

    pub(crate) fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub(crate) fn set_poll_interval(&mut self, poll_interval: Duration) {
        self.poll_interval = poll_interval;
    }

    /// `{endpoint}/subscriptions/{sub}/resourcegroups/{rg}/providers/{segments..}?api-version=..`
    ///
    /// Each segment is percent-encoded on its own, so names cannot add path
    /// segments or a query.
    pub(crate) fn resource_group_url(
        &self,
        resource_group: &str,
        segments: &[&str],
        api_version: &str,
    ) -> Result<Url> {
        self.provider_url(&["resourcegroups", resource_group], segments, api_version)
    }

    /// `{endpoint}/subscriptions/{sub}/providers/{segments..}?api-version=..`
    pub(crate) fn subscription_url(&self, segments: &[&str], api_version: &str) -> Result<Url> {
        self.provider_url(&[], segments, api_version)
    }

    fn provider_url(&self, scope: &[&str], segments: &[&str], api_version: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AzureError::Config(format!("management endpoint '{}' cannot hold a path", self.endpoint))
            })?
            .pop_if_empty()
            .push("subscriptions")
            .push(&self.subscription_id)
            .extend(scope)
            .push("providers")
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    /// Send a request, returning the response whatever its status.
    pub(crate) async fn send(&self, request: Request) -> Result<Response> {
        debug!(method = %request.method(), url = %request.url(), "Sending management request");
        Ok(self.transport.send(request).await?)
    }

    /// Send a request and turn any non-2xx status into [`AzureError::Management`].
    pub(crate) async fn send_checked(&self, request: Request) -> Result<Response> {
        let response = self.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(rejection(response))
        }
    }

    pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.send_checked(Request::new(Method::GET, url)).await?;
        Ok(serde_json::from_slice(response.bytes())?)
    }

    /// Follow `nextLink` until the listing is exhausted.
    pub(crate) async fn list_all<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next.take() {
            let page: Page<T> = self.get_json(url).await?;
            items.extend(page.value);
            next = page.next_link.as_deref().map(Url::parse).transpose()?;
        }

        Ok(items)
    }

    /// Issue the request that starts a long-running operation and wrap the
    /// activation response in a poller.
    pub(crate) async fn begin<T: PollableResource>(&self, request: Request) -> Result<Poller<T>> {
        let method = request.method().clone();
        let url = request.url().clone();
        let response = self.send_checked(request).await?;
        Poller::from_activation(
            self.transport.clone(),
            method,
            url,
            &response,
            self.poll_interval,
        )
    }
}

/// Deserialize a field the service may send as `null`, falling back to the
/// type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    Ok(<Option<T> as serde::Deserialize>::deserialize(deserializer)?.unwrap_or_default())
}

/// Map a rejected response to [`AzureError::Management`].
pub(crate) fn rejection(response: Response) -> AzureError {
    let error = ManagementError::from_body(response.bytes()).unwrap_or_else(|| {
        let reason = response
            .status()
            .canonical_reason()
            .unwrap_or("UnknownError")
            .replace(' ', "");
        ManagementError::new(reason, response.text().unwrap_or_default())
    });

    AzureError::Management {
        status: response.status(),
        headers: response.headers().clone(),
        error,
    }
}
