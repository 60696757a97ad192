//! Resource Manager template deployments.

mod deployments;
mod models;

pub use deployments::DeploymentsClient;
pub use models::{
    ChangeType, ContentLink, Deployment, DeploymentExportResult, DeploymentMode, DeploymentOperation,
    DeploymentOperationProperties, DeploymentProperties, DeploymentPropertiesExtended, DeploymentWhatIf,
    PropertyChangeType, ResourceReference, TargetResource, WhatIfChange, WhatIfOperationProperties,
    WhatIfOperationResult, WhatIfPropertyChange, WhatIfResultFormat, failed_operations,
};
