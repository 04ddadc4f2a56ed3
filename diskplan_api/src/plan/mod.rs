//! Resolution of a user-declared `PartitionPlan` into the complete plan that
//! is handed to the graph compiler.

use log::info;

use crate::{
    config::PartitionPlan,
    constants::BOOT_MOUNT_POINT,
    error::{DiskplanError, DiskplanResultExt},
    inventory::{LocalDrives, OsImage},
};

mod boot;
mod defaults;

pub use boot::{select_boot_raid, synthesize_boot_mount};
pub use defaults::synthesize_default_plan;

/// Completes a parsed plan for the given drives and operating system.
///
/// An empty plan is replaced by the OS defaults when the OS requires
/// partitioning; when it does not, there is nothing to lay out and `None` is
/// returned. A plan without `/boot` gets one synthesized on the fastest RAID
/// group, placed first in the mount list. The completed plan is validated
/// before it is returned.
pub fn resolve(
    plan: PartitionPlan,
    drives: &LocalDrives,
    os: &OsImage,
) -> Result<Option<PartitionPlan>, DiskplanError> {
    let mut plan = if plan.is_empty() {
        if !os.requires_partitioning {
            info!(
                "No partitions configured and '{}' does not require partitioning",
                os.name
            );
            return Ok(None);
        }
        synthesize_default_plan(drives, os)
            .message("Failed to synthesize default partition layout")?
    } else {
        plan
    };

    if !plan.has_mount(BOOT_MOUNT_POINT) {
        let boot = synthesize_boot_mount(&plan, drives, os)
            .message("Failed to synthesize boot partition")?;
        plan.mounts.insert(0, boot);
    }

    plan.validate().message("Resolved partition plan is invalid")?;
    Ok(Some(plan))
}
