//! # Partition graph
//!
//! The provisioning API does not understand mount points and RAID groups. It
//! expects a flat graph of nodes wired together by identifiers:
//!
//! - `drive` nodes, keyed by the native drive id, matching a physical drive.
//! - `partition` nodes, carved from a drive at a given priority.
//! - `soft_raid` nodes, combining two or more partitions.
//! - `filesystem` nodes, formatting a partition or a RAID array and mounting
//!   it.
//!
//! This module holds the graph types, the compiler producing them from a
//! resolved `PartitionPlan`, and the encoders translating the graph into the
//! value representation of a given API client.

use serde::{ser::SerializeMap, Deserialize, Serialize};
use strum_macros::IntoStaticStr;

use crate::{
    config::{FileSystemType, PartitionPlan, RaidLevel},
    error::{DiskplanError, DiskplanResultExt},
    inventory::{LocalDrives, OsImage},
    plan, NodeId,
};

mod builder;
mod encoding;
mod ids;


pub use builder::PartitionGraphBuilder;
pub use encoding::{GraphEncoder, JsonEncoder, YamlEncoder};
pub use ids::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};

/// Physical drive properties the API matches a drive node against.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DriveMatch {
    pub capacity: i64,

    #[serde(rename = "type")]
    pub disk_type: String,
}

/// A node of the partition graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, IntoStaticStr)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApiNode {
    Drive {
        #[serde(rename = "match")]
        drive_match: DriveMatch,
    },

    SoftRaid {
        /// Partition ids, in drive enumeration order.
        members: Vec<NodeId>,
        level: RaidLevel,
    },

    Partition {
        /// Id of the drive node the partition is carved from.
        device: NodeId,
        size: i64,
        /// Position of the partition in its drive's partition table.
        priority: u32,
    },

    Filesystem {
        fs_type: FileSystemType,
        /// Id of a soft RAID or partition node.
        device: NodeId,
        mount: String,
    },
}

impl ApiNode {
    /// Returns the API kind name of the node.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// A compiled partition graph. Nodes are kept in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionGraph {
    nodes: Vec<(NodeId, ApiNode)>,
}

impl PartitionGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &ApiNode)> {
        self.nodes.iter().map(|(id, node)| (id, node))
    }

    pub fn get(&self, id: &str) -> Option<&ApiNode> {
        self.nodes
            .iter()
            .find(|(node_id, _)| node_id == id)
            .map(|(_, node)| node)
    }

    /// Returns all nodes of the given API kind, e.g. `soft_raid`.
    pub fn nodes_of_kind<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = (&'a NodeId, &'a ApiNode)> + 'a {
        self.iter().filter(move |(_, node)| node.kind() == kind)
    }

    /// Returns the filesystem node mounted at `mount`.
    pub fn filesystem(&self, mount: &str) -> Option<(&NodeId, &ApiNode)> {
        self.iter().find(|(_, node)| {
            matches!(node, ApiNode::Filesystem { mount: m, .. } if m == mount)
        })
    }
}

impl Serialize for PartitionGraph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.nodes.len()))?;
        for (id, node) in &self.nodes {
            map.serialize_entry(id, node)?;
        }
        map.end()
    }
}

/// Runs the whole pipeline on a plan: default synthesis, boot synthesis,
/// validation and graph compilation.
///
/// Returns `None` when the plan is empty and the OS does not require a
/// partition layout.
pub fn compile_plan(
    plan: PartitionPlan,
    drives: &LocalDrives,
    os: &OsImage,
    ids: impl IdGenerator,
) -> Result<Option<PartitionGraph>, DiskplanError> {
    let Some(plan) = plan::resolve(plan, drives, os)? else {
        return Ok(None);
    };

    let mut builder = PartitionGraphBuilder::new(drives, ids);
    for group in &plan.raid_groups {
        builder.add_raid_group(group);
    }
    for mount in &plan.mounts {
        builder.add_mount(mount);
    }

    builder
        .build()
        .message("Failed to compile partition graph")
        .map(Some)
}
