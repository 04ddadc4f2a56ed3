use log::{debug, info};

use crate::{
    config::{MountSpec, PartitionPlan, PartitionSize, RaidGroupSpec, RaidLevel},
    constants::{DEFAULT_RAID_GROUP_NAME, PARTITION_SIZE_REMAINING, ROOT_MOUNT_POINT},
    error::{DiskplanError, PreconditionError, ReportError},
    inventory::{LocalDrives, OsImage},
};

/// Builds the layout used when the user declared no partitions but the
/// operating system requires a partition layout.
///
/// A single `raid1` group named `first-raid` is created over the default disk
/// type, and every default partition of the OS image is bound to it. The
/// root mount always consumes the remaining space, whatever size the OS
/// catalog suggests for it.
pub fn synthesize_default_plan(
    drives: &LocalDrives,
    os: &OsImage,
) -> Result<PartitionPlan, DiskplanError> {
    let disk_type =
        default_disk_type(drives).structured(PreconditionError::NoLocalDrives)?;
    info!(
        "No partitions configured, using defaults of '{}' on '{}' drives",
        os.name, disk_type
    );

    let mounts = os
        .default_partitions
        .iter()
        .map(|partition| {
            let size = if partition.mount == ROOT_MOUNT_POINT {
                PARTITION_SIZE_REMAINING
            } else {
                partition.size
            };
            debug!("Default mount '{}' with size {}", partition.mount, size);
            MountSpec {
                mount: partition.mount.clone(),
                size: PartitionSize::Absolute(size),
                raid: DEFAULT_RAID_GROUP_NAME.into(),
                fs_type: Some(partition.fs_type),
            }
        })
        .collect();

    Ok(PartitionPlan {
        raid_groups: vec![RaidGroupSpec {
            name: DEFAULT_RAID_GROUP_NAME.into(),
            level: RaidLevel::Raid1,
            disk_type: disk_type.into(),
        }],
        mounts,
    })
}

/// Picks the disk type carried by the most drives, so that the default RAID
/// group spans as many drives as possible. Ties go to the type seen first.
fn default_disk_type(drives: &LocalDrives) -> Option<&str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for drive in drives.values() {
        match counts
            .iter_mut()
            .find(|(disk_type, _)| *disk_type == drive.disk_type)
        {
            Some((_, count)) => *count += 1,
            None => counts.push((drive.disk_type.as_str(), 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (disk_type, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((disk_type, count));
        }
    }
    best.map(|(disk_type, _)| disk_type)
}
