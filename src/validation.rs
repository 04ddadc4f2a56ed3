use std::path::Path;

use log::{debug, info};

use diskplan_api::error::{DiskplanError, DiskplanResultExt, InfrastructureError, ReportError};

use crate::input;

/// Parses and validates a partition configuration file on its own.
///
/// Only checks that do not need the server inventory are performed; drive
/// matching happens when the configuration is compiled.
pub fn validate_request_file(path: impl AsRef<Path>) -> Result<(), DiskplanError> {
    info!(
        "Validating partition configuration file: {}",
        path.as_ref().display()
    );

    let plan = input::load_request(path.as_ref()).message("Partition configuration is invalid")?;

    info!("Partition configuration is valid");
    if plan.is_empty() {
        info!("No partitions configured, operating system defaults will be used if required");
    }
    debug!(
        "Parsed contents:\n{}",
        serde_yaml::to_string(&plan).structured(InfrastructureError::Internal(
            "Failed to serialize partition configuration".into()
        ))?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use indoc::indoc;
    use tempfile::NamedTempFile;

    use diskplan_api::error::{ErrorKind, ValidationError};

    use super::*;

    #[test]
    fn test_validate_request_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            indoc! {r#"
                partitions_config:
                  soft_raid_config:
                    - { name: r1, level: raid1, disk_type: SSD }
                  disk_partitions:
                    - { mount: /, size: -1, raid: r1 }
            "#}
            .as_bytes(),
        )
        .unwrap();

        validate_request_file(file.path()).unwrap();
    }

    #[test]
    fn test_validate_invalid_request_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            indoc! {r#"
                soft_raid_config:
                  - { name: r1, level: raid1, disk_type: SSD }
                disk_partitions:
                  - { mount: /, size: 10, size_percent: 10, raid: r1 }
            "#}
            .as_bytes(),
        )
        .unwrap();

        let error = validate_request_file(file.path()).unwrap_err();
        assert_eq!(
            error.kind(),
            &ErrorKind::Validation(ValidationError::ConflictingSizes {
                index: 0,
                mount: "/".into()
            })
        );
    }
}
