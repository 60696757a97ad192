//! Resource Manager long-running operation poller.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use stratus_http_client::{Method, Request, Response, StatusCode, Transport, Url};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::status::{LongRunningOperationStatus, PollResponse};
use crate::management::{ManagementError, rejection};
use crate::{AzureError, Result};

/// Delay between polls when the service gives no hint.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// A resource a long-running operation resolves to.
pub trait PollableResource: Clone + Send + Sync + Sized + 'static {
    /// Decode the resource from a response body. `Ok(None)` means the body
    /// carries no resource.
    fn from_body(body: &[u8]) -> std::result::Result<Option<Self>, serde_json::Error>;

    /// The value to resolve to when the service never returns a body, as
    /// for deletes.
    fn empty() -> Option<Self> {
        None
    }
}

/// Decode a JSON body, treating an empty body as "no resource".
pub fn decode_json<T: DeserializeOwned>(
    body: &[u8],
) -> std::result::Result<Option<T>, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some)
}

impl PollableResource for () {
    fn from_body(_body: &[u8]) -> std::result::Result<Option<Self>, serde_json::Error> {
        Ok(Some(()))
    }

    fn empty() -> Option<Self> {
        Some(())
    }
}

#[derive(Debug, Clone)]
enum PollMode {
    /// Poll the `Azure-AsyncOperation` status monitor.
    AsyncOperation(Url),
    /// Poll the `Location` URL until it stops answering 202.
    Location(Url),
    /// Poll the resource itself and read its `provisioningState`.
    ResourceState,
}

#[derive(Debug, Default, Deserialize)]
struct OperationStatusBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<ManagementError>,
}

/// Drives a long-running operation to a terminal state.
///
/// Every poll takes `&mut self`, so one operation never has two polls in
/// flight. Once a terminal status is seen, [`Poller::poll`] and
/// [`Poller::final_result`] stop talking to the service and replay the cached
/// outcome.
pub struct Poller<T> {
    transport: Arc<dyn Transport>,
    mode: PollMode,
    method: Method,
    resource_url: Url,
    resource_id: String,
    default_interval: Duration,
    latest: PollResponse<T>,
    snapshot: Option<T>,
    failure: Option<ManagementError>,
    outcome: Option<std::result::Result<T, ManagementError>>,
    cancel_url: Option<Url>,
}

impl<T: PollableResource> Poller<T> {
    /// Build a poller from the response to the request that started the
    /// operation.
    pub(crate) fn from_activation(
        transport: Arc<dyn Transport>,
        method: Method,
        url: Url,
        response: &Response,
        default_interval: Duration,
    ) -> Result<Self> {
        let mode = if let Some(target) = header_url(&url, response, "azure-asyncoperation")? {
            PollMode::AsyncOperation(target)
        } else if let Some(target) = header_url(&url, response, "location")? {
            PollMode::Location(target)
        } else {
            PollMode::ResourceState
        };

        let body = response.bytes();
        let carries_resource = response.status() != StatusCode::ACCEPTED;
        let state = carries_resource.then(|| provisioning_state(body)).flatten();

        let status = match response.status() {
            StatusCode::ACCEPTED => LongRunningOperationStatus::InProgress,
            StatusCode::CREATED => state
                .as_deref()
                .map(LongRunningOperationStatus::from_service_status)
                .unwrap_or(LongRunningOperationStatus::InProgress),
            StatusCode::NO_CONTENT => LongRunningOperationStatus::Succeeded,
            _ => state
                .as_deref()
                .map(LongRunningOperationStatus::from_service_status)
                .unwrap_or(LongRunningOperationStatus::Succeeded),
        };

        let value = if carries_resource {
            match T::from_body(body) {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, url = %url, "Activation body is not a resource snapshot");
                    None
                }
            }
        } else {
            None
        };

        let failure = match status {
            LongRunningOperationStatus::Failed | LongRunningOperationStatus::UserCancelled => {
                resource_error(body)
            }
            _ => None,
        };
        let snapshot = (status == LongRunningOperationStatus::Succeeded)
            .then(|| value.clone())
            .flatten();

        let resource_id = url.path().to_string();
        debug!(
            resource_id = %resource_id,
            status = %status,
            mode = ?mode,
            "Long-running operation started"
        );

        Ok(Self {
            transport,
            mode,
            method,
            resource_url: url,
            resource_id,
            default_interval,
            latest: PollResponse::new(status, value, response.retry_after()),
            snapshot,
            failure,
            outcome: None,
            cancel_url: None,
        })
    }

    /// Attach the URL that [`Poller::cancel`] posts to.
    pub(crate) fn with_cancel_url(mut self, url: Url) -> Self {
        self.cancel_url = Some(url);
        self
    }

    /// Current status.
    pub fn status(&self) -> LongRunningOperationStatus {
        self.latest.status()
    }

    /// Everything learnt from the most recent round trip.
    pub fn latest(&self) -> &PollResponse<T> {
        &self.latest
    }

    /// Latest known resource snapshot.
    pub fn value(&self) -> Option<&T> {
        self.latest.value()
    }

    /// Resource id (ARM path) of the operation's target.
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Status monitor URL, if the service handed one out.
    pub fn operation_url(&self) -> Option<&Url> {
        match &self.mode {
            PollMode::AsyncOperation(url) | PollMode::Location(url) => Some(url),
            PollMode::ResourceState => None,
        }
    }

    /// Delay before the next poll: the service's hint, else the default.
    pub fn next_delay(&self) -> Duration {
        self.latest.retry_after().unwrap_or(self.default_interval)
    }

    /// Issue one poll and update the status.
    ///
    /// A failed or cancelled operation is not an error here; inspect the
    /// returned status and call [`Poller::final_result`] for the failure.
    pub async fn poll(&mut self) -> Result<LongRunningOperationStatus> {
        if self.status().is_complete() {
            return Ok(self.status());
        }

        let url = match &self.mode {
            PollMode::AsyncOperation(url) | PollMode::Location(url) => url.clone(),
            PollMode::ResourceState => self.resource_url.clone(),
        };
        let response = self.transport.send(Request::new(Method::GET, url)).await?;
        let retry_after = response.retry_after();

        let (status, value) = match self.mode.clone() {
            PollMode::AsyncOperation(_) => self.read_operation_status(response)?,
            PollMode::Location(_) => self.read_location(response)?,
            PollMode::ResourceState => self.read_resource_state(response)?,
        };

        if status == LongRunningOperationStatus::Succeeded {
            self.snapshot = value.clone();
        }
        let value = value.or_else(|| self.latest.value().cloned());
        self.latest = PollResponse::new(status, value, retry_after);

        debug!(resource_id = %self.resource_id, status = %status, "Polled long-running operation");
        Ok(status)
    }

    /// Sleep and poll until the operation reaches a terminal status.
    pub async fn wait_for_completion(&mut self) -> Result<LongRunningOperationStatus> {
        while !self.status().is_complete() {
            let delay = self.next_delay();
            debug!(resource_id = %self.resource_id, delay_ms = delay.as_millis() as u64, "Waiting before next poll");
            tokio::time::sleep(delay).await;
            self.poll().await?;
        }
        Ok(self.status())
    }

    /// Like [`Poller::wait_for_completion`], but gives up with
    /// [`AzureError::Cancelled`] as soon as `token` fires. An in-flight poll is
    /// dropped and no further polls are issued.
    pub async fn wait_for_completion_until_cancelled(
        &mut self,
        token: &CancellationToken,
    ) -> Result<LongRunningOperationStatus> {
        while !self.status().is_complete() {
            let delay = self.next_delay();
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!(resource_id = %self.resource_id, "Stopped waiting for long-running operation");
                    return Err(AzureError::Cancelled);
                }
                polled = async {
                    tokio::time::sleep(delay).await;
                    self.poll().await
                } => {
                    polled?;
                }
            }
        }
        Ok(self.status())
    }

    /// Wait for the operation and resolve it.
    ///
    /// `Succeeded` yields the resource, fetched with a final GET of the
    /// original URL when no poll response carried it. POST actions are never
    /// read back. `Failed` and `UserCancelled` yield
    /// [`AzureError::OperationFailed`]. The outcome is cached: later calls
    /// return it again without network calls.
    pub async fn final_result(&mut self) -> Result<T> {
        if self.outcome.is_none() {
            self.wait_for_completion().await?;
            let outcome = match self.status() {
                LongRunningOperationStatus::Succeeded => Ok(self.final_value().await?),
                status => Err(self
                    .failure
                    .clone()
                    .unwrap_or_else(|| synthesized_failure(status))),
            };
            self.outcome = Some(outcome);
        }

        match &self.outcome {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(error)) => Err(AzureError::OperationFailed {
                resource_id: self.resource_id.clone(),
                status: self.status(),
                error: error.clone(),
            }),
            None => Err(AzureError::Internal(
                "long-running operation resolved without an outcome".into(),
            )),
        }
    }

    /// Ask the service to cancel the operation.
    ///
    /// Best effort: the status is left alone and keeps following what the
    /// service reports on later polls.
    pub async fn cancel(&self) -> Result<()> {
        let url = self.cancel_url.clone().ok_or_else(|| {
            AzureError::Config(format!(
                "operation on '{}' does not support cancellation",
                self.resource_id
            ))
        })?;

        info!(resource_id = %self.resource_id, "Requesting cancellation of long-running operation");
        let response = self.transport.send(Request::new(Method::POST, url)).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(rejection(response))
        }
    }

    async fn final_value(&mut self) -> Result<T> {
        if let Some(value) = self.snapshot.clone().or_else(T::empty) {
            return Ok(value);
        }
        if self.method == Method::DELETE {
            return Err(AzureError::Internal(format!(
                "delete of '{}' has no resource to return",
                self.resource_id
            )));
        }
        // The target of a POST action is not a resource that can be read back.
        if self.method == Method::POST {
            return Err(AzureError::Internal(format!(
                "action on '{}' completed without a result body",
                self.resource_id
            )));
        }

        debug!(resource_id = %self.resource_id, "Fetching final resource state");
        let response = self
            .transport
            .send(Request::new(Method::GET, self.resource_url.clone()))
            .await?;
        if !response.is_success() {
            return Err(rejection(response));
        }

        let value = T::from_body(response.bytes())?.ok_or_else(|| {
            AzureError::Internal(format!(
                "final GET of '{}' returned no resource",
                self.resource_id
            ))
        })?;
        self.snapshot = Some(value.clone());
        self.latest = PollResponse::new(self.status(), Some(value.clone()), None);
        Ok(value)
    }

    fn read_operation_status(
        &mut self,
        response: Response,
    ) -> Result<(LongRunningOperationStatus, Option<T>)> {
        if !response.is_success() {
            return Err(rejection(response));
        }

        let body: OperationStatusBody = decode_json(response.bytes())?.unwrap_or_default();
        let status = body
            .status
            .as_deref()
            .map(LongRunningOperationStatus::from_service_status)
            .unwrap_or(LongRunningOperationStatus::InProgress);
        if matches!(
            status,
            LongRunningOperationStatus::Failed | LongRunningOperationStatus::UserCancelled
        ) {
            self.failure = body.error;
        }
        Ok((status, None))
    }

    fn read_location(
        &mut self,
        response: Response,
    ) -> Result<(LongRunningOperationStatus, Option<T>)> {
        match response.status() {
            StatusCode::ACCEPTED => {
                if let Some(next) = header_url(&self.resource_url, &response, "location")? {
                    self.mode = PollMode::Location(next);
                }
                Ok((LongRunningOperationStatus::InProgress, None))
            }
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Ok((
                LongRunningOperationStatus::Succeeded,
                T::from_body(response.bytes())?,
            )),
            _ => {
                self.failure = ManagementError::from_body(response.bytes());
                Ok((LongRunningOperationStatus::Failed, None))
            }
        }
    }

    fn read_resource_state(
        &mut self,
        response: Response,
    ) -> Result<(LongRunningOperationStatus, Option<T>)> {
        if self.method == Method::DELETE && response.status() == StatusCode::NOT_FOUND {
            return Ok((LongRunningOperationStatus::Succeeded, T::empty()));
        }
        if !response.is_success() {
            return Err(rejection(response));
        }

        let body = response.bytes();
        let status = provisioning_state(body)
            .as_deref()
            .map(LongRunningOperationStatus::from_service_status)
            .unwrap_or(LongRunningOperationStatus::Succeeded);
        if matches!(
            status,
            LongRunningOperationStatus::Failed | LongRunningOperationStatus::UserCancelled
        ) {
            self.failure = resource_error(body);
        }
        Ok((status, T::from_body(body)?))
    }
}

impl<T> std::fmt::Debug for Poller<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("resource_id", &self.resource_id)
            .field("mode", &self.mode)
            .field("status", &self.latest.status())
            .finish_non_exhaustive()
    }
}

fn header_url(base: &Url, response: &Response, name: &str) -> Result<Option<Url>> {
    match response.header(name) {
        Some(value) if !value.trim().is_empty() => Ok(Some(base.join(value.trim())?)),
        _ => Ok(None),
    }
}

fn provisioning_state(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .pointer("/properties/provisioningState")
        .or_else(|| value.get("provisioningState"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn resource_error(body: &[u8]) -> Option<ManagementError> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let error = value
        .pointer("/properties/error")
        .or_else(|| value.get("error"))?;
    serde_json::from_value(error.clone()).ok()
}

fn synthesized_failure(status: LongRunningOperationStatus) -> ManagementError {
    match status {
        LongRunningOperationStatus::UserCancelled => {
            ManagementError::new("Canceled", "The operation was canceled.")
        }
        _ => ManagementError::new(
            "OperationFailed",
            "The operation failed without an error description.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use stratus_http_client::{HeaderMap, HeaderValue};
    use stratus_testing::{MockResponse, MockTransport};
    use tokio::time::Instant;

    const RESOURCE: &str =
        "https://management.azure.com/subscriptions/s/resourcegroups/rg/providers/Test.Widgets/widgets/w1?api-version=2024-01-01";
    const RESOURCE_PATH: &str =
        "/subscriptions/s/resourcegroups/rg/providers/Test.Widgets/widgets/w1";

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        name: String,
        #[serde(default)]
        properties: Value,
    }

    impl PollableResource for Widget {
        fn from_body(body: &[u8]) -> std::result::Result<Option<Self>, serde_json::Error> {
            decode_json(body)
        }
    }

    fn widget_body(state: &str) -> Value {
        serde_json::json!({"name": "w1", "properties": {"provisioningState": state}})
    }

    fn activation(status: u16, headers: &[(&'static str, &str)], body: Option<Value>) -> Response {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        let body = body.map(|b| serde_json::to_vec(&b).unwrap()).unwrap_or_default();
        Response::new(
            StatusCode::from_u16(status).unwrap(),
            map,
            body,
            Url::parse(RESOURCE).unwrap(),
        )
    }

    fn start_poller<T: PollableResource>(mock: &MockTransport, method: Method, response: &Response) -> Poller<T> {
        Poller::from_activation(
            Arc::new(mock.clone()),
            method,
            Url::parse(RESOURCE).unwrap(),
            response,
            Duration::from_secs(10),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_operation_happy_path() {
        let mock = MockTransport::new();
        mock.respond(
            Method::GET,
            "/operations/op1",
            MockResponse::json(200, &serde_json::json!({"status": "Succeeded"})),
        );
        mock.respond(Method::GET, RESOURCE_PATH, MockResponse::json(200, &widget_body("Succeeded")));

        let response = activation(
            201,
            &[
                ("azure-asyncoperation", "https://management.azure.com/operations/op1"),
                ("retry-after", "2"),
            ],
            Some(widget_body("Accepted")),
        );
        let mut poller: Poller<Widget> = start_poller(&mock, Method::PUT, &response);
        assert_eq!(poller.status(), LongRunningOperationStatus::InProgress);
        assert_eq!(poller.next_delay(), Duration::from_secs(2));
        assert_eq!(poller.resource_id(), RESOURCE_PATH);
        assert_eq!(
            poller.operation_url().map(Url::as_str),
            Some("https://management.azure.com/operations/op1")
        );

        let start = Instant::now();
        let status = poller.wait_for_completion().await.unwrap();
        assert_eq!(status, LongRunningOperationStatus::Succeeded);
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(3));

        let widget = poller.final_result().await.unwrap();
        assert_eq!(widget.properties["provisioningState"], "Succeeded");
        assert_eq!(mock.request_count(), 2);

        let again = poller.final_result().await.unwrap();
        assert_eq!(again, widget);
        assert_eq!(poller.poll().await.unwrap(), LongRunningOperationStatus::Succeeded);
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_operation_failure_is_cached() {
        let mock = MockTransport::new();
        mock.respond(
            Method::GET,
            "/operations/op1",
            MockResponse::json(
                200,
                &serde_json::json!({
                    "status": "Failed",
                    "error": {"code": "DeploymentFailed", "message": "At least one resource deployment operation failed."}
                }),
            ),
        );

        let response = activation(
            201,
            &[("azure-asyncoperation", "https://management.azure.com/operations/op1")],
            Some(widget_body("Accepted")),
        );
        let mut poller: Poller<Widget> = start_poller(&mock, Method::PUT, &response);

        let err = poller.final_result().await.unwrap_err();
        assert!(err.is_operation_failure());
        assert_eq!(err.error_code(), Some("DeploymentFailed"));
        assert_eq!(mock.request_count(), 1);

        assert_eq!(poller.poll().await.unwrap(), LongRunningOperationStatus::Failed);
        let again = poller.final_result().await.unwrap_err();
        assert_eq!(again.error_code(), Some("DeploymentFailed"));
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_with_null_details_still_resolves_to_operation_failure() {
        let mock = MockTransport::new();
        mock.respond(
            Method::GET,
            "/operations/op1",
            MockResponse::json(
                200,
                &serde_json::json!({
                    "status": "Failed",
                    "error": {
                        "code": "ServerBusy",
                        "message": "The server is busy.",
                        "target": null,
                        "details": null,
                        "additionalInfo": null
                    }
                }),
            ),
        );

        let response = activation(
            202,
            &[("azure-asyncoperation", "https://management.azure.com/operations/op1")],
            None,
        );
        let mut poller: Poller<Widget> = start_poller(&mock, Method::PUT, &response);

        assert_eq!(poller.poll().await.unwrap(), LongRunningOperationStatus::Failed);
        let err = poller.final_result().await.unwrap_err();
        assert!(err.is_operation_failure());
        assert_eq!(err.error_code(), Some("ServerBusy"));
    }

    #[tokio::test]
    async fn test_terminal_activation_needs_no_polls() {
        let mock = MockTransport::new();
        let response = activation(200, &[], Some(widget_body("Succeeded")));
        let mut poller: Poller<Widget> = start_poller(&mock, Method::PUT, &response);

        assert_eq!(poller.status(), LongRunningOperationStatus::Succeeded);
        let widget = poller.final_result().await.unwrap();
        assert_eq!(widget.name, "w1");
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_activation_surfaces_resource_error() {
        let mock = MockTransport::new();
        let body = serde_json::json!({
            "name": "w1",
            "properties": {
                "provisioningState": "Failed",
                "error": {"code": "InvalidTemplate", "message": "bad template"}
            }
        });
        let response = activation(200, &[], Some(body));
        let mut poller: Poller<Widget> = start_poller(&mock, Method::PUT, &response);

        let err = poller.final_result().await.unwrap_err();
        assert_eq!(err.error_code(), Some("InvalidTemplate"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_location_polling() {
        let mock = MockTransport::new();
        mock.respond(
            Method::GET,
            "/operations/loc1",
            MockResponse::new(202).header("retry-after", "1"),
        );
        mock.respond(Method::GET, "/operations/loc1", MockResponse::json(200, &widget_body("Succeeded")));

        let response = activation(
            202,
            &[("location", "https://management.azure.com/operations/loc1")],
            None,
        );
        let mut poller: Poller<Widget> = start_poller(&mock, Method::PATCH, &response);
        assert_eq!(poller.status(), LongRunningOperationStatus::InProgress);
        assert_eq!(poller.next_delay(), Duration::from_secs(10));

        let start = Instant::now();
        let widget = poller.final_result().await.unwrap();
        assert_eq!(widget.name, "w1");
        // 10s default before the first poll, 1s hint before the second
        assert!(start.elapsed() >= Duration::from_secs(11));
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_action_without_result_body_skips_final_get() {
        let mock = MockTransport::new();
        mock.respond(Method::GET, "/operations/loc1", MockResponse::new(204));

        let response = activation(
            202,
            &[("location", "https://management.azure.com/operations/loc1")],
            None,
        );
        let mut poller: Poller<Widget> = start_poller(&mock, Method::POST, &response);

        let err = poller.final_result().await.unwrap_err();
        assert!(matches!(err, AzureError::Internal(_)));
        assert_eq!(poller.status(), LongRunningOperationStatus::Succeeded);
        assert!(mock.requests_to(Method::GET, RESOURCE_PATH).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_location_error_status_fails_operation() {
        let mock = MockTransport::new();
        mock.respond(
            Method::GET,
            "/operations/loc1",
            MockResponse::json(
                409,
                &serde_json::json!({"error": {"code": "Conflict", "message": "busy"}}),
            ),
        );

        let response = activation(
            202,
            &[("location", "https://management.azure.com/operations/loc1")],
            None,
        );
        let mut poller: Poller<Widget> = start_poller(&mock, Method::POST, &response);

        assert_eq!(
            poller.wait_for_completion().await.unwrap(),
            LongRunningOperationStatus::Failed
        );
        assert_eq!(poller.final_result().await.unwrap_err().error_code(), Some("Conflict"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provisioning_state_polling_uses_default_delay() {
        let mock = MockTransport::new();
        mock.respond(Method::GET, RESOURCE_PATH, MockResponse::json(200, &widget_body("Updating")));
        mock.respond(Method::GET, RESOURCE_PATH, MockResponse::json(200, &widget_body("Succeeded")));

        let response = activation(201, &[], Some(widget_body("Creating")));
        let mut poller: Poller<Widget> = start_poller(&mock, Method::PUT, &response);
        assert!(poller.operation_url().is_none());

        let start = Instant::now();
        poller.wait_for_completion().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(20));
        assert!(start.elapsed() < Duration::from_secs(21));

        let widget = poller.final_result().await.unwrap();
        assert_eq!(widget.properties["provisioningState"], "Succeeded");
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_resolves_on_not_found() {
        let mock = MockTransport::new();
        mock.respond(Method::GET, RESOURCE_PATH, MockResponse::new(404));

        let response = activation(202, &[], None);
        let mut poller: Poller<()> = start_poller(&mock, Method::DELETE, &response);

        poller.final_result().await.unwrap();
        assert_eq!(poller.status(), LongRunningOperationStatus::Succeeded);
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_operation_resolves_to_failure() {
        let mock = MockTransport::new();
        mock.respond(
            Method::GET,
            "/operations/op1",
            MockResponse::json(200, &serde_json::json!({"status": "Canceled"})),
        );

        let response = activation(
            201,
            &[("azure-asyncoperation", "https://management.azure.com/operations/op1")],
            None,
        );
        let mut poller: Poller<Widget> = start_poller(&mock, Method::PUT, &response);

        let err = poller.final_result().await.unwrap_err();
        assert_eq!(err.error_code(), Some("Canceled"));
        assert!(matches!(
            err,
            AzureError::OperationFailed {
                status: LongRunningOperationStatus::UserCancelled,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_token_stops_polling() {
        let mock = MockTransport::new();
        mock.respond(
            Method::GET,
            "/operations/op1",
            MockResponse::json(200, &serde_json::json!({"status": "Running"})),
        );

        let response = activation(
            201,
            &[("azure-asyncoperation", "https://management.azure.com/operations/op1")],
            None,
        );
        let mut poller: Poller<Widget> = start_poller(&mock, Method::PUT, &response);

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(15)).await;
            trigger.cancel();
        });

        let err = poller.wait_for_completion_until_cancelled(&token).await.unwrap_err();
        assert!(matches!(err, AzureError::Cancelled));
        assert_eq!(mock.request_count(), 1);
        assert_eq!(poller.status(), LongRunningOperationStatus::InProgress);

        let err = poller.wait_for_completion_until_cancelled(&token).await.unwrap_err();
        assert!(matches!(err, AzureError::Cancelled));
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_leaves_status_alone() {
        let mock = MockTransport::new();
        mock.respond(Method::POST, "/operations/op1/cancel", MockResponse::new(204));

        let response = activation(
            201,
            &[("azure-asyncoperation", "https://management.azure.com/operations/op1")],
            None,
        );
        let poller: Poller<Widget> = start_poller(&mock, Method::PUT, &response)
            .with_cancel_url(Url::parse("https://management.azure.com/operations/op1/cancel").unwrap());

        poller.cancel().await.unwrap();
        assert_eq!(poller.status(), LongRunningOperationStatus::InProgress);
        assert_eq!(mock.requests_to(Method::POST, "/operations/op1/cancel").len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_without_url_is_rejected() {
        let mock = MockTransport::new();
        let response = activation(202, &[], None);
        let poller: Poller<Widget> = start_poller(&mock, Method::PUT, &response);

        assert!(matches!(poller.cancel().await, Err(AzureError::Config(_))));
        assert_eq!(mock.request_count(), 0);
    }
}
