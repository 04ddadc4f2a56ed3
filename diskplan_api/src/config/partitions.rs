use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{
    constants::{BASE_MOUNT_POINTS, PARTITION_SIZE_REMAINING},
    error::{DiskplanError, ValidationError},
};

/// A named group of drives that will be combined into software RAID arrays.
///
/// The name is only meaningful within one request: mounts refer to the group
/// by it, and it never reaches the provisioning API.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RaidGroupSpec {
    /// Local correlation key referenced by `MountSpec::raid`.
    pub name: String,

    /// RAID level of every array built on this group.
    pub level: RaidLevel,

    /// Disk type classification, matched verbatim against
    /// `LocalDrive::disk_type`.
    pub disk_type: String,
}

#[derive(
    Serialize, Deserialize, Copy, Clone, Debug, Hash, Eq, PartialEq, Display, EnumString,
)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
#[strum(serialize_all = "kebab-case")]
pub enum RaidLevel {
    /// # Striping
    Raid0,

    /// # Mirroring
    Raid1,

    /// # Striping with parity
    Raid5,

    /// # Striping with double parity
    Raid6,

    /// # Stripe of mirrors
    Raid10,
}

/// Filesystem types understood by the provisioning API.
#[derive(
    Serialize, Deserialize, Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Display, EnumString,
)]
#[serde(rename_all = "lowercase", deny_unknown_fields)]
#[strum(serialize_all = "lowercase")]
pub enum FileSystemType {
    Ext2,
    Ext3,
    #[default]
    Ext4,
    Xfs,
    Btrfs,
    Vfat,
    Swap,
}

/// Size of the partitions created for one mount.
///
/// Serialized with the same keys the raw configuration uses, so that a
/// flattened `MountSpec` reads like its input.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub enum PartitionSize {
    /// Absolute size, or `PARTITION_SIZE_REMAINING` to consume the rest of
    /// the drive.
    #[serde(rename = "size")]
    Absolute(i64),

    /// Percentage of the capacity of each matched drive.
    #[serde(rename = "size_percent")]
    Percent(f64),
}

impl PartitionSize {
    /// Resolves the size against the capacity of one drive.
    ///
    /// Percent sizes are rounded half away from zero. Returns `None` when a
    /// percent size is requested on a drive without a usable capacity.
    pub fn resolve(&self, capacity: i64) -> Option<i64> {
        match *self {
            PartitionSize::Absolute(size) => Some(size),
            PartitionSize::Percent(_) if capacity <= 0 => None,
            PartitionSize::Percent(percent) => {
                Some((capacity as f64 * percent / 100.0).round() as i64)
            }
        }
    }

    pub fn is_remaining(&self) -> bool {
        matches!(self, PartitionSize::Absolute(PARTITION_SIZE_REMAINING))
    }
}

/// A mount point carved out of every drive of a RAID group.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MountSpec {
    /// Mount point path, or `swap`.
    pub mount: String,

    #[serde(flatten)]
    pub size: PartitionSize,

    /// Name of the `RaidGroupSpec` hosting this mount.
    pub raid: String,

    /// Explicit filesystem type. Ignored for `/boot` and `swap`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<FileSystemType>,
}

impl MountSpec {
    /// Returns true for `/`, `swap` and `/boot`, which are laid out after
    /// every other mount on the drives they share.
    pub fn is_base(&self) -> bool {
        BASE_MOUNT_POINTS.contains(&self.mount.as_str())
    }

    /// Checks that an absolute size is positive or the remaining-space
    /// sentinel, and that a percent size lies in `(0, 100]`.
    pub fn validate_size(&self) -> Result<(), DiskplanError> {
        match self.size {
            PartitionSize::Absolute(size) if size <= 0 && !self.size.is_remaining() => {
                Err(DiskplanError::new(ValidationError::InvalidAbsoluteSize {
                    mount: self.mount.clone(),
                    size,
                }))
            }
            PartitionSize::Percent(percent) if !(percent > 0.0 && percent <= 100.0) => {
                Err(DiskplanError::new(ValidationError::InvalidSizePercent {
                    mount: self.mount.clone(),
                    percent,
                }))
            }
            _ => Ok(()),
        }
    }
}

/// The storage layout declared by the user for one provisioning request.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct PartitionPlan {
    #[serde(rename = "soft_raid_config")]
    pub raid_groups: Vec<RaidGroupSpec>,

    #[serde(rename = "disk_partitions")]
    pub mounts: Vec<MountSpec>,
}

impl PartitionPlan {
    pub fn is_empty(&self) -> bool {
        self.raid_groups.is_empty() && self.mounts.is_empty()
    }

    pub fn raid_group(&self, name: &str) -> Option<&RaidGroupSpec> {
        self.raid_groups.iter().find(|group| group.name == name)
    }

    pub fn has_mount(&self, mount: &str) -> bool {
        self.mounts.iter().any(|spec| spec.mount == mount)
    }

    /// Checks the plan for internal consistency: RAID group names and mount
    /// points are unique, sizes are in range, and every mount references a
    /// declared group.
    ///
    /// Drive-dependent checks happen when the plan is compiled.
    pub fn validate(&self) -> Result<(), DiskplanError> {
        let mut names = BTreeSet::new();
        for group in &self.raid_groups {
            if !names.insert(group.name.as_str()) {
                return Err(DiskplanError::new(ValidationError::DuplicateRaidGroup {
                    name: group.name.clone(),
                }));
            }
        }

        let mut mounts = BTreeSet::new();
        for spec in &self.mounts {
            if !mounts.insert(spec.mount.as_str()) {
                return Err(DiskplanError::new(ValidationError::DuplicateMountPoint {
                    mount: spec.mount.clone(),
                }));
            }

            spec.validate_size()?;

            if !names.contains(spec.raid.as_str()) {
                return Err(DiskplanError::new(ValidationError::RaidNotFound {
                    mount: spec.mount.clone(),
                    raid: spec.raid.clone(),
                }));
            }
        }

        Ok(())
    }
}
