//! PostgreSQL flexible server models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::lro::{PollableResource, decode_json};
use crate::{AzureError, Result};

/// Compute tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkuTier {
    Burstable,
    GeneralPurpose,
    MemoryOptimized,
}

/// Compute size and tier, e.g. `Standard_D4s_v3` / `GeneralPurpose`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    pub name: String,
    pub tier: SkuTier,
}

impl Sku {
    pub fn new(name: impl Into<String>, tier: SkuTier) -> Self {
        Self {
            name: name.into(),
            tier,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    #[serde(rename = "storageSizeGB", default, skip_serializing_if = "Option::is_none")]
    pub storage_size_gb: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_retention_days: Option<u32>,
    /// `Enabled` or `Disabled`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_redundant_backup: Option<String>,
    /// Read only.
    #[serde(default, skip_serializing)]
    pub earliest_restore_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HighAvailabilityMode {
    Disabled,
    ZoneRedundant,
    SameZone,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighAvailability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<HighAvailabilityMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standby_availability_zone: Option<String>,
    /// Read only.
    #[serde(default, skip_serializing)]
    pub state: Option<String>,
}

/// Weekly maintenance slot. `day_of_week` counts from Sunday = 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceWindow {
    /// `Enabled` to use the slot below, `Disabled` for a system-chosen one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_window: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_hour: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_minute: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreateModeForUpdate {
    Default,
    Update,
}

/// Server settings as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProperties {
    #[serde(default)]
    pub administrator_login: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// `Ready`, `Updating`, `Stopped`, ...
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub fully_qualified_domain_name: Option<String>,
    #[serde(default)]
    pub storage: Option<Storage>,
    #[serde(default)]
    pub backup: Option<Backup>,
    #[serde(default)]
    pub high_availability: Option<HighAvailability>,
    #[serde(default)]
    pub maintenance_window: Option<MaintenanceWindow>,
    #[serde(default)]
    pub availability_zone: Option<String>,
}

/// A PostgreSQL flexible server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
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
    #[serde(default)]
    pub sku: Option<Sku>,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub properties: ServerProperties,
}

impl PollableResource for Server {
    fn from_body(body: &[u8]) -> std::result::Result<Option<Self>, serde_json::Error> {
        decode_json(body)
    }
}

/// Settings that can be changed on an existing server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerForUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub properties: ServerPropertiesForUpdate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPropertiesForUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administrator_login_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<Backup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_availability: Option<HighAvailability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_window: Option<MaintenanceWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_mode: Option<CreateModeForUpdate>,
}

impl ServerForUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sku(mut self, sku: Sku) -> Self {
        self.sku = Some(sku);
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn administrator_login_password(mut self, password: impl Into<String>) -> Self {
        self.properties.administrator_login_password = Some(password.into());
        self
    }

    pub fn storage_size_gb(mut self, size: u32) -> Self {
        self.properties.storage = Some(Storage {
            storage_size_gb: Some(size),
        });
        self
    }

    pub fn backup(mut self, backup: Backup) -> Self {
        self.properties.backup = Some(backup);
        self
    }

    pub fn high_availability(mut self, high_availability: HighAvailability) -> Self {
        self.properties.high_availability = Some(high_availability);
        self
    }

    pub fn maintenance_window(mut self, window: MaintenanceWindow) -> Self {
        self.properties.maintenance_window = Some(window);
        self
    }

    pub fn create_mode(mut self, mode: CreateModeForUpdate) -> Self {
        self.properties.create_mode = Some(mode);
        self
    }

    /// Reject values the service would refuse.
    pub fn validate(&self) -> Result<()> {
        if let Some(sku) = &self.sku {
            if sku.name.trim().is_empty() {
                return Err(invalid("sku.name must not be empty"));
            }
        }

        let props = &self.properties;
        if props
            .administrator_login_password
            .as_deref()
            .is_some_and(|p| p.is_empty())
        {
            return Err(invalid("administratorLoginPassword must not be empty"));
        }
        if let Some(days) = props.backup.as_ref().and_then(|b| b.backup_retention_days) {
            if !(7..=35).contains(&days) {
                return Err(invalid("backup.backupRetentionDays must be between 7 and 35"));
            }
        }
        if let Some(window) = &props.maintenance_window {
            if window.start_hour.is_some_and(|h| h > 23) {
                return Err(invalid("maintenanceWindow.startHour must be between 0 and 23"));
            }
            if window.start_minute.is_some_and(|m| m > 59) {
                return Err(invalid("maintenanceWindow.startMinute must be between 0 and 59"));
            }
            if window.day_of_week.is_some_and(|d| d > 6) {
                return Err(invalid("maintenanceWindow.dayOfWeek must be between 0 and 6"));
            }
        }
        Ok(())
    }
}

fn invalid(message: &str) -> AzureError {
    AzureError::Config(format!("invalid server update: {message}"))
}
