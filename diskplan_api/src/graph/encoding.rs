use crate::error::{DiskplanError, InfrastructureError, ReportError};

use super::PartitionGraph;

/// Translates a compiled graph into the value representation used by a
/// particular API client. The compiler itself never depends on the target
/// representation.
pub trait GraphEncoder {
    type Output;

    fn encode(&self, graph: &PartitionGraph) -> Result<Self::Output, DiskplanError>;
}

/// Encodes the graph as a JSON object mapping node ids to nodes, in emission
/// order.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEncoder;

impl GraphEncoder for JsonEncoder {
    type Output = serde_json::Value;

    fn encode(&self, graph: &PartitionGraph) -> Result<Self::Output, DiskplanError> {
        serde_json::to_value(graph).structured(InfrastructureError::EncodeGraph {
            format: "JSON".into(),
        })
    }
}

/// Encodes the graph as a YAML mapping of node ids to nodes, in emission
/// order.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlEncoder;

impl GraphEncoder for YamlEncoder {
    type Output = serde_yaml::Value;

    fn encode(&self, graph: &PartitionGraph) -> Result<Self::Output, DiskplanError> {
        serde_yaml::to_value(graph).structured(InfrastructureError::EncodeGraph {
            format: "YAML".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        config::{FileSystemType, RaidLevel},
        graph::{ApiNode, DriveMatch},
    };

    use super::*;

    fn graph() -> PartitionGraph {
        PartitionGraph {
            nodes: vec![
                (
                    "d1".into(),
                    ApiNode::Drive {
                        drive_match: DriveMatch {
                            capacity: 1000,
                            disk_type: "SSD".into(),
                        },
                    },
                ),
                (
                    "p1".into(),
                    ApiNode::Partition {
                        device: "d1".into(),
                        size: -1,
                        priority: 0,
                    },
                ),
                (
                    "r1".into(),
                    ApiNode::SoftRaid {
                        members: vec!["p1".into()],
                        level: RaidLevel::Raid1,
                    },
                ),
                (
                    "f1".into(),
                    ApiNode::Filesystem {
                        fs_type: FileSystemType::Ext4,
                        device: "r1".into(),
                        mount: "/".into(),
                    },
                ),
            ],
        }
    }

    #[test]
    fn test_json_encoding() {
        let value = JsonEncoder.encode(&graph()).unwrap();
        assert_eq!(
            value,
            json!({
                "d1": {"kind": "drive", "match": {"capacity": 1000, "type": "SSD"}},
                "p1": {"kind": "partition", "device": "d1", "size": -1, "priority": 0},
                "r1": {"kind": "soft_raid", "members": ["p1"], "level": "raid1"},
                "f1": {"kind": "filesystem", "fs_type": "ext4", "device": "r1", "mount": "/"},
            })
        );

        let keys = value.as_object().unwrap().keys().collect::<Vec<_>>();
        assert_eq!(keys, vec!["d1", "p1", "r1", "f1"]);
    }

    #[test]
    fn test_yaml_encoding() {
        let value = YamlEncoder.encode(&graph()).unwrap();
        let mapping = value.as_mapping().unwrap();
        assert_eq!(mapping.len(), 4);
        assert_eq!(
            mapping["r1"]["kind"],
            serde_yaml::Value::String("soft_raid".into())
        );
        assert_eq!(
            mapping["f1"]["fs_type"],
            serde_yaml::Value::String("ext4".into())
        );
        assert_eq!(mapping["p1"]["priority"], serde_yaml::Value::from(0));
    }
}
