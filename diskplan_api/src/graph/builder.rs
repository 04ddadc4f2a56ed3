//! # Partition graph builder
//!
//! The struct PartitionGraphBuilder collects the RAID groups and mounts of a
//! resolved plan. The build() function then compiles them, against the drive
//! inventory, into a `PartitionGraph`:
//!
//! - One drive node is emitted per local drive, keyed by its native id.
//! - Mounts other than `/`, `swap` and `/boot` are processed first, then
//!   those three, each group in declaration order. This decides which mounts
//!   get the lower priorities on a shared drive.
//! - For each mount, one partition is carved from every drive matching the
//!   RAID group's disk type. A single partition is formatted directly; two or
//!   more are wrapped in a soft RAID node first.
//!
//! The builder owns the node list and the per-drive priority counters, and
//! build() consumes it: a graph is only returned when every mount compiled.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};

use crate::{
    config::{FileSystemType, MountSpec, RaidGroupSpec},
    constants::{BOOT_MOUNT_POINT, SWAP_MOUNT_POINT},
    error::{DiskplanError, InfrastructureError, ReportError, ValidationError},
    inventory::LocalDrives,
    DriveId, NodeId,
};

use super::{ids::IdGenerator, ApiNode, DriveMatch, PartitionGraph};

pub struct PartitionGraphBuilder<'a, G: IdGenerator> {
    drives: &'a LocalDrives,
    ids: G,
    raid_groups: Vec<&'a RaidGroupSpec>,
    mounts: Vec<&'a MountSpec>,

    nodes: Vec<(NodeId, ApiNode)>,
    used_ids: BTreeSet<NodeId>,
    priorities: BTreeMap<&'a str, u32>,
}

impl<'a, G: IdGenerator> PartitionGraphBuilder<'a, G> {
    pub fn new(drives: &'a LocalDrives, ids: G) -> Self {
        Self {
            drives,
            ids,
            raid_groups: Vec::new(),
            mounts: Vec::new(),
            nodes: Vec::new(),
            used_ids: BTreeSet::new(),
            priorities: BTreeMap::new(),
        }
    }

    pub fn add_raid_group(&mut self, group: &'a RaidGroupSpec) {
        self.raid_groups.push(group);
    }

    pub fn add_mount(&mut self, mount: &'a MountSpec) {
        self.mounts.push(mount);
    }

    /// Builds the partition graph.
    pub fn build(mut self) -> Result<PartitionGraph, DiskplanError> {
        debug!(
            "Building partition graph for {} mounts over {} drives",
            self.mounts.len(),
            self.drives.len()
        );

        for (drive_id, drive) in self.drives {
            trace!("Adding drive node '{}'", drive_id);
            self.insert_node(
                drive_id.clone(),
                ApiNode::Drive {
                    drive_match: DriveMatch {
                        capacity: drive.capacity,
                        disk_type: drive.disk_type.clone(),
                    },
                },
            )?;
        }

        let (base, non_base): (Vec<&MountSpec>, Vec<&MountSpec>) =
            self.mounts.iter().copied().partition(|mount| mount.is_base());
        for mount in non_base.into_iter().chain(base) {
            self.compile_mount(mount)?;
        }

        debug!(
            "Partition graph built successfully with {} nodes",
            self.nodes.len()
        );
        Ok(PartitionGraph { nodes: self.nodes })
    }

    fn compile_mount(&mut self, mount: &MountSpec) -> Result<(), DiskplanError> {
        trace!("Compiling mount '{}'", mount.mount);
        let group = self
            .raid_groups
            .iter()
            .copied()
            .find(|group| group.name == mount.raid)
            .structured(ValidationError::RaidNotFound {
                mount: mount.mount.clone(),
                raid: mount.raid.clone(),
            })?;

        let drives = self.drives;
        let mut partitions = Vec::new();
        for (drive_id, drive) in drives
            .iter()
            .filter(|(_, drive)| drive.disk_type == group.disk_type)
        {
            let size = mount.size.resolve(drive.capacity).structured(
                ValidationError::InvalidDriveSize {
                    drive_id: drive_id.clone(),
                    capacity: drive.capacity,
                    mount: mount.mount.clone(),
                },
            )?;
            partitions.push(self.add_partition(drive_id, size)?);
        }

        let device = match partitions.len() {
            0 => {
                return Err(DiskplanError::new(ValidationError::NoDriveForMount {
                    mount: mount.mount.clone(),
                    raid: group.name.clone(),
                    disk_type: group.disk_type.clone(),
                }))
            }
            1 => partitions.remove(0),
            count => {
                let id = self.next_id()?;
                trace!(
                    "Adding {} soft RAID '{}' over {} partitions for '{}'",
                    group.level,
                    id,
                    count,
                    mount.mount
                );
                self.insert_node(
                    id.clone(),
                    ApiNode::SoftRaid {
                        members: partitions,
                        level: group.level,
                    },
                )?;
                id
            }
        };

        let id = self.next_id()?;
        self.insert_node(
            id,
            ApiNode::Filesystem {
                fs_type: filesystem_type(mount),
                device,
                mount: mount.mount.clone(),
            },
        )
    }

    /// Carves a partition from a drive at the drive's next priority.
    fn add_partition(
        &mut self,
        drive_id: &'a DriveId,
        size: i64,
    ) -> Result<NodeId, DiskplanError> {
        let counter = self.priorities.entry(drive_id.as_str()).or_insert(0);
        let priority = *counter;
        *counter += 1;

        let id = self.next_id()?;
        trace!(
            "Adding partition '{}' on drive '{}' with size {} and priority {}",
            id,
            drive_id,
            size,
            priority
        );
        self.insert_node(
            id.clone(),
            ApiNode::Partition {
                device: drive_id.clone(),
                size,
                priority,
            },
        )?;
        Ok(id)
    }

    fn next_id(&mut self) -> Result<NodeId, DiskplanError> {
        self.ids.next_id()
    }

    /// Adds a node, checking that its id is not already taken.
    fn insert_node(&mut self, id: NodeId, node: ApiNode) -> Result<(), DiskplanError> {
        if !self.used_ids.insert(id.clone()) {
            return Err::<(), _>(anyhow::anyhow!("Node id '{id}' is already in use"))
                .structured(InfrastructureError::IdGeneration);
        }
        self.nodes.push((id, node));
        Ok(())
    }
}

/// Returns the filesystem type for a mount. `/boot` is always ext3 and swap
/// is always swap; other mounts use their explicit type, defaulting to ext4.
fn filesystem_type(mount: &MountSpec) -> FileSystemType {
    match mount.mount.as_str() {
        BOOT_MOUNT_POINT => FileSystemType::Ext3,
        SWAP_MOUNT_POINT => FileSystemType::Swap,
        _ => mount.fs_type.unwrap_or_default(),
    }
}
