//! Server and operating system data consumed by the partition compiler.
//!
//! These are fetched by the surrounding provisioning workflow from the
//! server-inventory and OS-catalog endpoints and handed over as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    config::FileSystemType,
    constants::BOOT_MOUNT_POINT,
    error::{DiskplanError, InvalidInputError, ReportError},
    DriveId,
};

/// Drives of the server keyed by native drive id. Enumeration order, and
/// therefore "first matching drive", is ascending drive id.
pub type LocalDrives = BTreeMap<DriveId, LocalDrive>;

/// A physical drive installed in the server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LocalDrive {
    /// Disk type classification, e.g. `SSD NVMe M.2`.
    #[serde(rename = "type")]
    pub disk_type: String,

    /// Raw capacity in the unit used by the provisioning API.
    pub capacity: i64,

    /// Relative figure of merit used to pick the drive type hosting `/boot`.
    #[serde(default)]
    pub performance_score: f64,
}

/// A default partition suggested by an operating system image.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DefaultPartition {
    pub mount: String,
    pub size: i64,
    pub fs_type: FileSystemType,
}

/// An installable operating system image of the selected server
/// configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OsImage {
    pub name: String,

    /// Whether a partition layout must be sent when installing this image.
    #[serde(default)]
    pub requires_partitioning: bool,

    /// Default layout, in catalog order.
    #[serde(default)]
    pub default_partitions: Vec<DefaultPartition>,
}

impl OsImage {
    /// Returns the catalog entry for `/boot`, if any.
    pub fn default_boot_partition(&self) -> Option<&DefaultPartition> {
        self.default_partitions
            .iter()
            .find(|partition| partition.mount == BOOT_MOUNT_POINT)
    }
}

/// Everything known about the target server before compiling a layout.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Inventory {
    #[serde(default)]
    pub drives: LocalDrives,

    #[serde(default)]
    pub operating_systems: Vec<OsImage>,
}

impl Inventory {
    pub fn operating_system(&self, name: &str) -> Result<&OsImage, DiskplanError> {
        self.operating_systems
            .iter()
            .find(|os| os.name == name)
            .structured(InvalidInputError::UnknownOperatingSystem { name: name.into() })
    }
}
