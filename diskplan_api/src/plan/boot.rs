use log::{debug, info};

use crate::{
    config::{MountSpec, PartitionPlan, PartitionSize, RaidGroupSpec},
    constants::BOOT_MOUNT_POINT,
    error::{DiskplanError, PreconditionError, ReportError},
    inventory::{LocalDrives, OsImage},
};

/// Returns the performance score of the first drive whose type matches the
/// group's disk type, or 0 when no drive matches.
fn group_score(group: &RaidGroupSpec, drives: &LocalDrives) -> f64 {
    drives
        .values()
        .find(|drive| drive.disk_type == group.disk_type)
        .map_or(0.0, |drive| drive.performance_score)
}

/// Selects the RAID group that should host `/boot`: the one with the highest
/// drive performance score.
///
/// The scan keeps declaration order and only replaces the candidate on a
/// strictly greater score, so the first declared group wins ties.
pub fn select_boot_raid<'a>(
    groups: &'a [RaidGroupSpec],
    drives: &LocalDrives,
) -> Option<&'a RaidGroupSpec> {
    let mut selected: Option<(&RaidGroupSpec, f64)> = None;
    for group in groups {
        let score = group_score(group, drives);
        debug!("RAID group '{}' has boot score {}", group.name, score);
        if selected.map_or(true, |(_, best)| score > best) {
            selected = Some((group, score));
        }
    }
    selected.map(|(group, _)| group)
}

/// Builds the `/boot` mount for a plan that does not declare one, using the
/// size and filesystem type of the OS catalog entry for `/boot`.
pub fn synthesize_boot_mount(
    plan: &PartitionPlan,
    drives: &LocalDrives,
    os: &OsImage,
) -> Result<MountSpec, DiskplanError> {
    let group = select_boot_raid(&plan.raid_groups, drives)
        .structured(PreconditionError::NoRaidGroupForBoot)?;
    let default = os
        .default_boot_partition()
        .structured(PreconditionError::NoDefaultBootPartition)?;

    info!(
        "No '{}' mount configured, placing it on RAID group '{}'",
        BOOT_MOUNT_POINT, group.name
    );
    Ok(MountSpec {
        mount: BOOT_MOUNT_POINT.into(),
        size: PartitionSize::Absolute(default.size),
        raid: group.name.clone(),
        fs_type: Some(default.fs_type),
    })
}
