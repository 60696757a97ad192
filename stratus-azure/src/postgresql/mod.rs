//! PostgreSQL flexible servers.

mod models;
mod servers;

pub use models::{
    Backup, CreateModeForUpdate, HighAvailability, HighAvailabilityMode, MaintenanceWindow, Server,
    ServerForUpdate, ServerProperties, ServerPropertiesForUpdate, Sku, SkuTier, Storage,
};
pub use servers::ServersClient;
