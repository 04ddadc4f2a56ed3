//! Conversion of the raw, untyped partition configuration into a typed
//! `PartitionPlan`.
//!
//! The raw configuration mirrors the shape of the infrastructure-as-code
//! resource:
//!
//! ```yaml
//! soft_raid_config:
//!   - name: r1
//!     level: raid1
//!     disk_type: SSD
//! disk_partitions:
//!   - mount: /
//!     size: -1
//!     raid: r1
//!   - mount: swap
//!     size_percent: 10
//!     raid: r1
//! ```
//!
//! Unset optional values may be omitted, `null`, or the zero value of their
//! type, since that is how declarative tooling hands unset attributes over.
//! Error paths are relative to the configuration block, e.g.
//! `disk_partitions[1].size`.

use std::str::FromStr;

use log::trace;
use serde::Deserialize;
use serde_yaml::Value;

use crate::{
    constants::PARTITIONS_CONFIG_KEY,
    error::{ConfigParseError, DiskplanError, ValidationError},
};

use super::partitions::{
    FileSystemType, MountSpec, PartitionPlan, PartitionSize, RaidGroupSpec, RaidLevel,
};

/// Path reported for errors on the configuration block itself.
const ROOT_PATH: &str = PARTITIONS_CONFIG_KEY;

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawPartitionsConfig {
    soft_raid_config: Option<Vec<RawRaidGroup>>,
    disk_partitions: Option<Vec<RawMount>>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawRaidGroup {
    name: Option<String>,
    level: Option<String>,
    disk_type: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawMount {
    mount: Option<String>,
    size: Option<i64>,
    size_percent: Option<f64>,
    raid: Option<String>,
    fs_type: Option<String>,
}

impl PartitionPlan {
    /// Parses a request document. The partition configuration may either be
    /// the document itself or sit under a `partitions_config` key, as a
    /// mapping or as a single-element list.
    pub fn from_request(document: &Value) -> Result<Self, DiskplanError> {
        let Value::Mapping(map) = document else {
            return Self::from_value(document);
        };

        match map.get(PARTITIONS_CONFIG_KEY) {
            None => Self::from_value(document),
            Some(Value::Sequence(blocks)) => match blocks.as_slice() {
                [] => Ok(PartitionPlan::default()),
                [block] => Self::from_value(block),
                _ => Err(DiskplanError::new(ConfigParseError::InvalidValue {
                    path: ROOT_PATH.into(),
                    value: format!("{} blocks", blocks.len()),
                    reason: "at most one partitions_config block is allowed".into(),
                })),
            },
            Some(block) => Self::from_value(block),
        }
    }

    /// Parses the raw partition configuration and validates it for internal
    /// consistency.
    pub fn from_value(value: &Value) -> Result<Self, DiskplanError> {
        if value.is_null() {
            return Ok(PartitionPlan::default());
        }

        let raw: RawPartitionsConfig =
            serde_path_to_error::deserialize(value.clone()).map_err(|e| {
                let path = match e.path().iter().next() {
                    Some(_) => e.path().to_string(),
                    None => ROOT_PATH.to_string(),
                };
                DiskplanError::new(ConfigParseError::Deserialize {
                    path,
                    reason: e.into_inner().to_string(),
                })
            })?;

        let raid_groups = raw
            .soft_raid_config
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, group)| group.into_spec(index))
            .collect::<Result<Vec<_>, _>>()?;

        let mounts = raw
            .disk_partitions
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, mount)| mount.into_spec(index))
            .collect::<Result<Vec<_>, _>>()?;

        let plan = PartitionPlan {
            raid_groups,
            mounts,
        };
        trace!(
            "Parsed partition configuration with {} RAID groups and {} mounts",
            plan.raid_groups.len(),
            plan.mounts.len()
        );

        plan.validate()?;
        Ok(plan)
    }
}

impl FromStr for PartitionPlan {
    type Err = DiskplanError;

    /// Parses a YAML or JSON request document.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let document: Value = serde_yaml::from_str(s).map_err(|e| {
            DiskplanError::new(ConfigParseError::Deserialize {
                path: "<document>".into(),
                reason: e.to_string(),
            })
        })?;
        Self::from_request(&document)
    }
}

impl RawRaidGroup {
    fn into_spec(self, index: usize) -> Result<RaidGroupSpec, DiskplanError> {
        let path = |key: &str| format!("soft_raid_config[{index}].{key}");
        Ok(RaidGroupSpec {
            name: required(self.name, || path("name"))?,
            level: parse_enum::<RaidLevel>(required(self.level, || path("level"))?, || {
                path("level")
            })?,
            disk_type: required(self.disk_type, || path("disk_type"))?,
        })
    }
}

impl RawMount {
    fn into_spec(self, index: usize) -> Result<MountSpec, DiskplanError> {
        let path = |key: &str| format!("disk_partitions[{index}].{key}");
        let mount = required(self.mount, || path("mount"))?;
        let raid = required(self.raid, || path("raid"))?;
        let fs_type = match unset_if_empty(self.fs_type) {
            Some(value) => Some(parse_enum::<FileSystemType>(value, || path("fs_type"))?),
            None => None,
        };

        let size = self.size.unwrap_or(0);
        let percent = self.size_percent.unwrap_or(0.0);
        let size = match (size != 0, percent != 0.0) {
            (false, false) => {
                return Err(DiskplanError::new(ValidationError::SizeNotSpecified {
                    index,
                    mount,
                }))
            }
            (true, true) => {
                return Err(DiskplanError::new(ValidationError::ConflictingSizes {
                    index,
                    mount,
                }))
            }
            (true, false) => PartitionSize::Absolute(size),
            (false, true) => PartitionSize::Percent(percent),
        };

        Ok(MountSpec {
            mount,
            size,
            raid,
            fs_type,
        })
    }
}

fn unset_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

fn required(value: Option<String>, path: impl Fn() -> String) -> Result<String, DiskplanError> {
    unset_if_empty(value)
        .ok_or_else(|| DiskplanError::new(ConfigParseError::MissingField { path: path() }))
}

fn parse_enum<T: FromStr>(value: String, path: impl Fn() -> String) -> Result<T, DiskplanError> {
    T::from_str(&value).map_err(|_| {
        let path = path();
        let key = path.rsplit('.').next().unwrap_or_default().replace('_', " ");
        DiskplanError::new(ConfigParseError::InvalidValue {
            reason: format!("not a supported {key}"),
            path,
            value,
        })
    })
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use crate::error::ErrorKind;

    use super::*;

    fn parse(yaml: &str) -> Result<PartitionPlan, DiskplanError> {
        yaml.parse::<PartitionPlan>()
    }

    fn parse_error(yaml: &str) -> ErrorKind {
        match parse(yaml) {
            Ok(plan) => panic!("expected parsing to fail, got {plan:?}"),
            Err(e) => match e.kind() {
                ErrorKind::ConfigParse(e) => ErrorKind::ConfigParse(e.clone()),
                ErrorKind::Validation(e) => ErrorKind::Validation(e.clone()),
                other => panic!("unexpected error kind {other:?}"),
            },
        }
    }

    #[test]
    fn test_parse_full_config() {
        let plan = parse(indoc! {r#"
            partitions_config:
              soft_raid_config:
                - name: fast
                  level: raid1
                  disk_type: SSD NVMe M.2
                - name: bulk
                  level: raid10
                  disk_type: HDD SATA
              disk_partitions:
                - mount: /
                  size: -1
                  raid: fast
                - mount: swap
                  size_percent: 10.5
                  raid: fast
                - mount: /data
                  size: 0
                  size_percent: 50
                  raid: bulk
                  fs_type: xfs
        "#})
        .unwrap();

        assert_eq!(
            plan.raid_groups,
            vec![
                RaidGroupSpec {
                    name: "fast".into(),
                    level: RaidLevel::Raid1,
                    disk_type: "SSD NVMe M.2".into(),
                },
                RaidGroupSpec {
                    name: "bulk".into(),
                    level: RaidLevel::Raid10,
                    disk_type: "HDD SATA".into(),
                },
            ]
        );
        assert_eq!(
            plan.mounts,
            vec![
                MountSpec {
                    mount: "/".into(),
                    size: PartitionSize::Absolute(-1),
                    raid: "fast".into(),
                    fs_type: None,
                },
                MountSpec {
                    mount: "swap".into(),
                    size: PartitionSize::Percent(10.5),
                    raid: "fast".into(),
                    fs_type: None,
                },
                MountSpec {
                    mount: "/data".into(),
                    size: PartitionSize::Percent(50.0),
                    raid: "bulk".into(),
                    fs_type: Some(FileSystemType::Xfs),
                },
            ]
        );
    }

    #[test]
    fn test_parse_unwrapped_and_block_list() {
        let unwrapped = parse(indoc! {r#"
            soft_raid_config:
              - { name: r1, level: raid1, disk_type: SSD }
            disk_partitions:
              - { mount: /, size: -1, raid: r1, fs_type: "" }
        "#})
        .unwrap();

        let block_list = parse(indoc! {r#"
            partitions_config:
              - soft_raid_config:
                  - { name: r1, level: raid1, disk_type: SSD }
                disk_partitions:
                  - { mount: /, size: -1, raid: r1, fs_type: null }
        "#})
        .unwrap();

        assert_eq!(unwrapped, block_list);
        assert_eq!(unwrapped.mounts[0].fs_type, None);
    }

    #[test]
    fn test_parse_json_document() {
        let plan = parse(
            r#"{"partitions_config": {"soft_raid_config": [{"name": "r1", "level": "raid0", "disk_type": "HDD"}], "disk_partitions": [{"mount": "/srv", "size": 2048, "raid": "r1"}]}}"#,
        )
        .unwrap();
        assert_eq!(plan.raid_groups[0].level, RaidLevel::Raid0);
        assert_eq!(plan.mounts[0].size, PartitionSize::Absolute(2048));
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("partitions_config: []").unwrap().is_empty());
        assert!(parse("partitions_config: {}").unwrap().is_empty());
        assert!(parse("soft_raid_config: []\ndisk_partitions: null")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parse_size_exclusivity() {
        assert_eq!(
            parse_error(indoc! {r#"
                soft_raid_config: [{ name: r1, level: raid1, disk_type: SSD }]
                disk_partitions:
                  - { mount: /, size: -1, raid: r1 }
                  - { mount: /var, raid: r1 }
            "#}),
            ErrorKind::Validation(ValidationError::SizeNotSpecified {
                index: 1,
                mount: "/var".into()
            })
        );

        assert_eq!(
            parse_error(indoc! {r#"
                soft_raid_config: [{ name: r1, level: raid1, disk_type: SSD }]
                disk_partitions:
                  - { mount: /var, size: 0, size_percent: 0, raid: r1 }
            "#}),
            ErrorKind::Validation(ValidationError::SizeNotSpecified {
                index: 0,
                mount: "/var".into()
            })
        );

        assert_eq!(
            parse_error(indoc! {r#"
                soft_raid_config: [{ name: r1, level: raid1, disk_type: SSD }]
                disk_partitions:
                  - { mount: /var, size: 100, size_percent: 5, raid: r1 }
            "#}),
            ErrorKind::Validation(ValidationError::ConflictingSizes {
                index: 0,
                mount: "/var".into()
            })
        );
    }

    #[test]
    fn test_parse_size_ranges() {
        assert_eq!(
            parse_error(indoc! {r#"
                soft_raid_config: [{ name: r1, level: raid1, disk_type: SSD }]
                disk_partitions:
                  - { mount: /var, size: -2, raid: r1 }
            "#}),
            ErrorKind::Validation(ValidationError::InvalidAbsoluteSize {
                mount: "/var".into(),
                size: -2,
            })
        );

        assert_eq!(
            parse_error(indoc! {r#"
                soft_raid_config: [{ name: r1, level: raid1, disk_type: SSD }]
                disk_partitions:
                  - { mount: /var, size_percent: 120, raid: r1 }
            "#}),
            ErrorKind::Validation(ValidationError::InvalidSizePercent {
                mount: "/var".into(),
                percent: 120.0,
            })
        );
    }

    fn deserialize_error(yaml: &str) -> (String, String) {
        match parse_error(yaml) {
            ErrorKind::ConfigParse(ConfigParseError::Deserialize { path, reason }) => {
                (path, reason)
            }
            other => panic!("expected a deserialization error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_type_mismatches() {
        let (path, reason) = deserialize_error("soft_raid_config: {}");
        assert_eq!(path, "soft_raid_config");
        assert!(reason.contains("invalid type"), "{reason}");

        let (path, _) = deserialize_error("disk_partitions: [ 42 ]");
        assert_eq!(path, "disk_partitions[0]");

        let (path, reason) = deserialize_error(indoc! {r#"
            soft_raid_config: [{ name: r1, level: raid1, disk_type: SSD }]
            disk_partitions:
              - { mount: /, size: -1, raid: r1 }
              - { mount: /var, size: "10G", raid: r1 }
        "#});
        assert_eq!(path, "disk_partitions[1].size");
        assert!(reason.contains("invalid type"), "{reason}");

        let (path, _) = deserialize_error(indoc! {r#"
            soft_raid_config: [{ name: 7, level: raid1, disk_type: SSD }]
        "#});
        assert_eq!(path, "soft_raid_config[0].name");

        let (path, _) = deserialize_error("42");
        assert_eq!(path, "partitions_config");
    }

    #[test]
    fn test_parse_missing_and_unknown_fields() {
        assert_eq!(
            parse_error("soft_raid_config: [{ name: r1, disk_type: SSD }]"),
            ErrorKind::ConfigParse(ConfigParseError::MissingField {
                path: "soft_raid_config[0].level".into()
            })
        );

        assert_eq!(
            parse_error("disk_partitions: [{ mount: \"\", size: -1, raid: r1 }]"),
            ErrorKind::ConfigParse(ConfigParseError::MissingField {
                path: "disk_partitions[0].mount".into()
            })
        );

        let (path, reason) = deserialize_error(
            "soft_raid_config: [{ name: r1, level: raid1, disk_type: SSD, devices: 2 }]",
        );
        assert!(path.starts_with("soft_raid_config[0]"), "{path}");
        assert!(reason.contains("unknown field `devices`"), "{reason}");

        let (_, reason) = deserialize_error("partitions_config: { raid: [] }");
        assert!(reason.contains("unknown field `raid`"), "{reason}");
    }

    #[test]
    fn test_parse_unknown_enum_values() {
        assert_eq!(
            parse_error("soft_raid_config: [{ name: r1, level: raid4, disk_type: SSD }]"),
            ErrorKind::ConfigParse(ConfigParseError::InvalidValue {
                path: "soft_raid_config[0].level".into(),
                value: "raid4".into(),
                reason: "not a supported level".into(),
            })
        );

        assert_eq!(
            parse_error(indoc! {r#"
                soft_raid_config: [{ name: r1, level: raid1, disk_type: SSD }]
                disk_partitions:
                  - { mount: /, size: -1, raid: r1, fs_type: zfs }
            "#}),
            ErrorKind::ConfigParse(ConfigParseError::InvalidValue {
                path: "disk_partitions[0].fs_type".into(),
                value: "zfs".into(),
                reason: "not a supported fs type".into(),
            })
        );
    }

    #[test]
    fn test_parse_rejects_unresolved_raid() {
        assert_eq!(
            parse_error(indoc! {r#"
                soft_raid_config: [{ name: r1, level: raid1, disk_type: SSD }]
                disk_partitions:
                  - { mount: /, size: -1, raid: r2 }
            "#}),
            ErrorKind::Validation(ValidationError::RaidNotFound {
                mount: "/".into(),
                raid: "r2".into(),
            })
        );
    }

    #[test]
    fn test_parse_rejects_multiple_blocks() {
        assert!(matches!(
            parse_error("partitions_config: [{}, {}]"),
            ErrorKind::ConfigParse(ConfigParseError::InvalidValue { .. })
        ));
    }
}
