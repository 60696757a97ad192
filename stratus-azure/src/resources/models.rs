//! Deployment models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::lro::{PollableResource, decode_json};
use crate::management::ManagementError;
use crate::{AzureError, Result};

/// How a deployment treats resources not in its template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentMode {
    /// Leave unlisted resources alone.
    #[default]
    Incremental,
    /// Delete resources not in the template.
    Complete,
}

/// A link to a template or parameters file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentLink {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_version: Option<String>,
}

impl ContentLink {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            content_version: None,
        }
    }

    pub fn content_version(mut self, version: impl Into<String>) -> Self {
        self.content_version = Some(version.into());
        self
    }
}

/// What to deploy: a template (inline or linked) and its parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_link: Option<ContentLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters_link: Option<ContentLink>,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub mode: DeploymentMode,
}

impl DeploymentProperties {
    /// Deploy an inline template.
    pub fn with_template(template: Value) -> Self {
        Self {
            template: Some(template),
            ..Default::default()
        }
    }

    /// Deploy a template fetched from a URI.
    pub fn with_template_link(link: ContentLink) -> Self {
        Self {
            template_link: Some(link),
            ..Default::default()
        }
    }

    /// Inline parameters, in the `{"name": {"value": ..}}` shape.
    pub fn parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self.parameters_link = None;
        self
    }

    /// Parameters fetched from a URI.
    pub fn parameters_link(mut self, link: ContentLink) -> Self {
        self.parameters_link = Some(link);
        self.parameters = None;
        self
    }

    pub fn mode(mut self, mode: DeploymentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Check that exactly one template source and at most one parameters
    /// source are set.
    pub fn validate(&self) -> Result<()> {
        match (&self.template, &self.template_link) {
            (Some(_), Some(_)) => Err(AzureError::Config(
                "deployment has both an inline template and a template link".into(),
            )),
            (None, None) => Err(AzureError::Config("deployment has no template".into())),
            _ if self.parameters.is_some() && self.parameters_link.is_some() => Err(AzureError::Config(
                "deployment has both inline parameters and a parameters link".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// A resource a deployment created or touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReference {
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub id: String,
}

/// Deployment state as reported by Resource Manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPropertiesExtended {
    #[serde(default)]
    pub provisioning_state: Option<String>,
    #[serde(default)]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// ISO-8601 duration of the deployment so far.
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub mode: Option<DeploymentMode>,
    #[serde(default)]
    pub outputs: Option<Value>,
    #[serde(default)]
    pub parameters: Option<Value>,
    #[serde(default)]
    pub template_link: Option<ContentLink>,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub output_resources: Vec<ResourceReference>,
    #[serde(default)]
    pub error: Option<ManagementError>,
}

/// A deployment in a resource group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub properties: DeploymentPropertiesExtended,
}

impl Deployment {
    pub fn provisioning_state(&self) -> Option<&str> {
        self.properties.provisioning_state.as_deref()
    }
}

impl PollableResource for Deployment {
    fn from_body(body: &[u8]) -> std::result::Result<Option<Self>, serde_json::Error> {
        decode_json(body)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DeploymentRequest<'a> {
    pub(crate) properties: &'a DeploymentProperties,
}

/// How much of each resource a what-if returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhatIfResultFormat {
    /// Resource ids only, no `before`/`after`/`delta`.
    ResourceIdOnly,
    #[default]
    FullResourcePayloads,
}

/// A deployment to preview without applying it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentWhatIf {
    pub location: Option<String>,
    pub properties: DeploymentProperties,
    pub result_format: Option<WhatIfResultFormat>,
}

impl DeploymentWhatIf {
    pub fn new(properties: DeploymentProperties) -> Self {
        Self {
            location: None,
            properties,
            result_format: None,
        }
    }

    /// Where the deployment metadata lives. Required at subscription scope.
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn result_format(mut self, format: WhatIfResultFormat) -> Self {
        self.result_format = Some(format);
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WhatIfSettings {
    result_format: WhatIfResultFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WhatIfRequestProperties<'a> {
    #[serde(flatten)]
    deployment: &'a DeploymentProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    what_if_settings: Option<WhatIfSettings>,
}

#[derive(Debug, Serialize)]
pub(crate) struct WhatIfRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    properties: WhatIfRequestProperties<'a>,
}

impl<'a> From<&'a DeploymentWhatIf> for WhatIfRequest<'a> {
    fn from(what_if: &'a DeploymentWhatIf) -> Self {
        Self {
            location: what_if.location.as_deref(),
            properties: WhatIfRequestProperties {
                deployment: &what_if.properties,
                what_if_settings: what_if
                    .result_format
                    .map(|result_format| WhatIfSettings { result_format }),
            },
        }
    }
}

/// What a deployment would do to one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    Create,
    Delete,
    Ignore,
    Deploy,
    NoChange,
    Modify,
    Unsupported,
}

/// What a deployment would do to one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyChangeType {
    Create,
    Delete,
    Modify,
    Array,
    NoEffect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfPropertyChange {
    pub path: String,
    pub property_change_type: PropertyChangeType,
    #[serde(default)]
    pub before: Option<Value>,
    #[serde(default)]
    pub after: Option<Value>,
    /// Nested changes, for objects and arrays.
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub children: Vec<WhatIfPropertyChange>,
}

/// A predicted change to one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfChange {
    pub resource_id: String,
    pub change_type: ChangeType,
    #[serde(default)]
    pub unsupported_reason: Option<String>,
    #[serde(default)]
    pub before: Option<Value>,
    #[serde(default)]
    pub after: Option<Value>,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub delta: Vec<WhatIfPropertyChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhatIfOperationProperties {
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub changes: Vec<WhatIfChange>,
}

/// Result of a what-if. An evaluation the service gave up on reports its
/// reason in `error` rather than as a failed operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhatIfOperationResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub properties: WhatIfOperationProperties,
    #[serde(default)]
    pub error: Option<ManagementError>,
}

impl WhatIfOperationResult {
    pub fn changes(&self) -> &[WhatIfChange] {
        &self.properties.changes
    }

    /// Changes of one kind, in service order.
    pub fn changes_of(&self, change_type: ChangeType) -> impl Iterator<Item = &WhatIfChange> {
        self.changes()
            .iter()
            .filter(move |change| change.change_type == change_type)
    }
}

impl PollableResource for WhatIfOperationResult {
    fn from_body(body: &[u8]) -> std::result::Result<Option<Self>, serde_json::Error> {
        decode_json(body)
    }
}

/// Template of an existing deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentExportResult {
    #[serde(default)]
    pub template: Option<Value>,
    #[serde(default)]
    pub error: Option<ManagementError>,
}

/// The resource a deployment operation acted on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub resource_name: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
}

/// Details of one deployment step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOperationProperties {
    #[serde(default)]
    pub provisioning_operation: Option<String>,
    #[serde(default)]
    pub provisioning_state: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub service_request_id: Option<String>,
    /// HTTP status name of the step, e.g. `OK` or `Conflict`.
    #[serde(default)]
    pub status_code: Option<String>,
    /// Free-form status payload, usually `{"error": {...}}` on failure.
    #[serde(default)]
    pub status_message: Option<Value>,
    #[serde(default)]
    pub target_resource: Option<TargetResource>,
}

/// One step of a deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOperation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub operation_id: String,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub properties: DeploymentOperationProperties,
}

const SUCCESS_STATUS_CODES: [&str; 4] = ["OK", "Created", "Accepted", "NoContent"];

impl DeploymentOperation {
    pub fn provisioning_state(&self) -> Option<&str> {
        self.properties.provisioning_state.as_deref()
    }

    pub fn status_code(&self) -> Option<&str> {
        self.properties.status_code.as_deref()
    }

    pub fn target_resource(&self) -> Option<&TargetResource> {
        self.properties.target_resource.as_ref()
    }

    /// True when the step failed: its state is `Failed` or it reported a
    /// non-success status code.
    pub fn is_failed(&self) -> bool {
        let state_failed = self
            .provisioning_state()
            .is_some_and(|s| s.eq_ignore_ascii_case("failed"));
        let status_failed = self
            .status_code()
            .is_some_and(|code| !SUCCESS_STATUS_CODES.iter().any(|ok| ok.eq_ignore_ascii_case(code)));
        state_failed || status_failed
    }

    /// The error the step reported, if its status message carries one.
    pub fn error(&self) -> Option<ManagementError> {
        let message = self.properties.status_message.as_ref()?;
        let error = message.get("error").unwrap_or(message);
        serde_json::from_value::<ManagementError>(error.clone())
            .ok()
            .filter(|e| !e.code.is_empty())
    }
}

/// The failed steps among a deployment's operations.
pub fn failed_operations(operations: &[DeploymentOperation]) -> Vec<&DeploymentOperation> {
    operations.iter().filter(|op| op.is_failed()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_validation() {
        let inline = DeploymentProperties::with_template(serde_json::json!({"resources": []}))
            .parameters(serde_json::json!({}))
            .mode(DeploymentMode::Complete);
        assert!(inline.validate().is_ok());

        let mut both = inline.clone();
        both.template_link = Some(ContentLink::new("https://example.com/t.json"));
        assert!(both.validate().is_err());

        assert!(DeploymentProperties::default().validate().is_err());

        let mut params_twice = inline;
        params_twice.parameters_link = Some(ContentLink::new("https://example.com/p.json"));
        assert!(params_twice.validate().is_err());
    }

    #[test]
    fn test_request_wire_shape() {
        let properties = DeploymentProperties::with_template_link(
            ContentLink::new("https://example.com/azuredeploy.json").content_version("1.0.0.0"),
        )
        .parameters_link(ContentLink::new("https://example.com/azuredeploy.parameters.json"))
        .mode(DeploymentMode::Complete);

        let wire = serde_json::to_value(DeploymentRequest { properties: &properties }).unwrap();
        assert_eq!(
            wire,
            serde_json::json!({
                "properties": {
                    "templateLink": {"uri": "https://example.com/azuredeploy.json", "contentVersion": "1.0.0.0"},
                    "parametersLink": {"uri": "https://example.com/azuredeploy.parameters.json"},
                    "mode": "Complete"
                }
            })
        );
    }

    #[test]
    fn test_deployment_from_wire() {
        let body = br#"{
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Resources/deployments/dp",
            "name": "dp",
            "type": "Microsoft.Resources/deployments",
            "properties": {
                "provisioningState": "Failed",
                "correlationId": "c-1",
                "timestamp": "2024-03-01T10:00:00.1234567Z",
                "mode": "Complete",
                "outputResources": [{"id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/VNet1"}],
                "error": {"code": "DeploymentFailed", "message": "At least one resource deployment operation failed."}
            }
        }"#;
        let deployment = Deployment::from_body(body).unwrap().unwrap();

        assert_eq!(deployment.name.as_deref(), Some("dp"));
        assert_eq!(deployment.provisioning_state(), Some("Failed"));
        assert_eq!(deployment.properties.mode, Some(DeploymentMode::Complete));
        assert_eq!(deployment.properties.output_resources.len(), 1);
        assert_eq!(
            deployment.properties.error.as_ref().map(|e| e.code.as_str()),
            Some("DeploymentFailed")
        );
        assert!(Deployment::from_body(b"").unwrap().is_none());
    }

    #[test]
    fn test_deployment_with_null_collections() {
        let body = br#"{"name": "dp", "tags": null, "properties": {"provisioningState": "Running", "outputResources": null}}"#;
        let deployment = Deployment::from_body(body).unwrap().unwrap();

        assert!(deployment.tags.is_empty());
        assert!(deployment.properties.output_resources.is_empty());
        assert_eq!(deployment.provisioning_state(), Some("Running"));
    }

    #[test]
    fn test_what_if_request_wire_shape() {
        let what_if = DeploymentWhatIf::new(
            DeploymentProperties::with_template(serde_json::json!({"resources": []}))
                .mode(DeploymentMode::Complete),
        )
        .location("westus")
        .result_format(WhatIfResultFormat::ResourceIdOnly);

        let wire = serde_json::to_value(WhatIfRequest::from(&what_if)).unwrap();
        assert_eq!(
            wire,
            serde_json::json!({
                "location": "westus",
                "properties": {
                    "template": {"resources": []},
                    "mode": "Complete",
                    "whatIfSettings": {"resultFormat": "ResourceIdOnly"}
                }
            })
        );

        let bare = serde_json::to_value(WhatIfRequest::from(&DeploymentWhatIf::new(
            DeploymentProperties::with_template_link(ContentLink::new("https://example.com/t.json")),
        )))
        .unwrap();
        assert_eq!(
            bare,
            serde_json::json!({"properties": {"templateLink": {"uri": "https://example.com/t.json"}, "mode": "Incremental"}})
        );
    }

    #[test]
    fn test_what_if_result_from_wire() {
        let body = br#"{
            "status": "Succeeded",
            "properties": {"changes": [
                {"resourceId": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/vnet",
                 "changeType": "Modify",
                 "delta": [{"path": "properties.addressSpace.addressPrefixes", "propertyChangeType": "Array",
                            "children": [{"path": "0", "propertyChangeType": "Create", "after": "10.1.0.0/16"}]}]},
                {"resourceId": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/sa",
                 "changeType": "Create", "after": {"sku": {"name": "Standard_LRS"}}, "delta": null}
            ]},
            "error": null
        }"#;
        let result = WhatIfOperationResult::from_body(body).unwrap().unwrap();

        assert_eq!(result.changes().len(), 2);
        let created: Vec<_> = result.changes_of(ChangeType::Create).collect();
        assert_eq!(created.len(), 1);
        assert!(created[0].delta.is_empty());
        let modified = result.changes_of(ChangeType::Modify).next().unwrap();
        assert_eq!(modified.delta[0].property_change_type, PropertyChangeType::Array);
        assert_eq!(modified.delta[0].children[0].after, Some(serde_json::json!("10.1.0.0/16")));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_failed_operations() {
        let operations: Vec<DeploymentOperation> = serde_json::from_value(serde_json::json!([
            {"operationId": "1", "properties": {"provisioningState": "Succeeded", "statusCode": "OK"}},
            {
                "operationId": "2",
                "properties": {
                    "provisioningState": "Failed",
                    "statusCode": "Conflict",
                    "statusMessage": {"error": {"code": "InUseSubnetCannotBeDeleted", "message": "Subnet2 is in use"}},
                    "targetResource": {
                        "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/VNet1/subnets/Subnet2",
                        "resourceName": "VNet1/Subnet2",
                        "resourceType": "Microsoft.Network/virtualNetworks/subnets"
                    }
                }
            },
            {"operationId": "3", "properties": {"provisioningState": "Running"}}
        ]))
        .unwrap();

        let failed = failed_operations(&operations);
        assert_eq!(failed.len(), 1);
        let op = failed[0];
        assert_eq!(op.operation_id, "2");
        assert_eq!(op.status_code(), Some("Conflict"));
        assert_eq!(
            op.target_resource().and_then(|t| t.resource_name.as_deref()),
            Some("VNet1/Subnet2")
        );
        assert_eq!(op.error().map(|e| e.code), Some("InUseSubnetCannotBeDeleted".to_string()));
    }
}
