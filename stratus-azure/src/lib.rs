//! # Stratus Azure
//!
//! Clients for Azure Log Analytics queries, Resource Manager template
//! deployments and PostgreSQL flexible servers, with batch orchestration and
//! long-running-operation polling.
//!
//! ## Features
//!
//! Each service sits behind a feature flag (`logs`, `deployments`,
//! `postgresql`; all on by default) and must also be enabled in
//! [`AzureConfig`] before [`AzureServices`] hands out its client.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stratus_azure::{AzureConfig, AzureServices};
//! use stratus_azure::logs::{LogsBatchQuery, QueryTimeSpan};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AzureConfig::from_env()
//!         .enable_logs()
//!         .enable_deployments()
//!         .build();
//!
//!     let services = AzureServices::new(config)?;
//!
//!     let batch = LogsBatchQuery::new()
//!         .add_query("ws-1", "AppRequests | count", Some(QueryTimeSpan::LAST_DAY))
//!         .add_query("ws-1", "AppExceptions | take 5", Some(QueryTimeSpan::LAST_HOUR));
//!
//!     for result in services.logs()?.query_batch(batch.into_batch()).await? {
//!         println!("{}: {:?}", result.id(), result.status());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Long-running operations
//!
//! ```rust,ignore
//! use stratus_azure::resources::{DeploymentProperties, ContentLink};
//!
//! let deployments = services.deployments()?;
//! let properties = DeploymentProperties::with_template_link(
//!     ContentLink::new("https://example.com/azuredeploy.json"),
//! );
//!
//! let mut accepted = deployments
//!     .begin_create_or_update("rg1", "dp1", &properties)
//!     .await?;
//! let deployment = accepted.final_result().await?;
//! ```

mod config;
mod error;
mod services;

pub mod lro;
pub mod management;

#[cfg(feature = "logs")]
pub mod logs;

#[cfg(feature = "deployments")]
pub mod resources;

#[cfg(feature = "postgresql")]
pub mod postgresql;

pub use config::{
    AzureConfig, AzureConfigBuilder, CredentialsSource, DEFAULT_LOGS_ENDPOINT,
    DEFAULT_MANAGEMENT_ENDPOINT,
};
pub use error::{AzureError, Result};
pub use lro::{Accepted, LongRunningOperationStatus, Poller};
pub use management::ManagementError;
pub use services::AzureServices;

/// Prelude for common imports.
///
/// ```
/// use stratus_azure::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{AzureConfig, CredentialsSource};
    pub use crate::error::{AzureError, Result};
    pub use crate::lro::{Accepted, LongRunningOperationStatus, Poller};
    pub use crate::services::AzureServices;

    #[cfg(feature = "logs")]
    pub use crate::logs::{
        LogsBatchQuery, LogsQueryClient, LogsQueryOptions, LogsQueryResult, QueryTimeSpan,
    };

    #[cfg(feature = "deployments")]
    pub use crate::resources::{Deployment, DeploymentProperties, DeploymentsClient};

    #[cfg(feature = "postgresql")]
    pub use crate::postgresql::{Server, ServerForUpdate, ServersClient};
}
