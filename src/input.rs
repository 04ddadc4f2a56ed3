use std::{fs, path::Path};

use log::debug;

use diskplan_api::{
    config::PartitionPlan,
    error::{DiskplanError, DiskplanResultExt, InvalidInputError, ReportError},
    inventory::Inventory,
};

/// Reads and parses a partition configuration file.
pub fn load_request(path: &Path) -> Result<PartitionPlan, DiskplanError> {
    debug!("Loading partition configuration from '{}'", path.display());
    let contents = fs::read_to_string(path).structured(InvalidInputError::ReadInputFile {
        path: path.display().to_string(),
    })?;

    contents.parse::<PartitionPlan>().message(format!(
        "Failed to parse partition configuration '{}'",
        path.display()
    ))
}

/// Reads and parses a server inventory file.
pub fn load_inventory(path: &Path) -> Result<Inventory, DiskplanError> {
    debug!("Loading server inventory from '{}'", path.display());
    let contents = fs::read_to_string(path).structured(InvalidInputError::ReadInputFile {
        path: path.display().to_string(),
    })?;

    let inventory: Inventory =
        serde_yaml::from_str(&contents).structured(InvalidInputError::ParseInputFile {
            path: path.display().to_string(),
        })?;
    debug!(
        "Inventory has {} drives and {} operating systems",
        inventory.drives.len(),
        inventory.operating_systems.len()
    );
    Ok(inventory)
}
