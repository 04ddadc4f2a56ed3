use std::{fs, path::Path};

use log::{debug, info, warn};

use diskplan_api::{
    error::{DiskplanError, DiskplanResultExt, InfrastructureError, ReportError},
    graph::{
        self, GraphEncoder, JsonEncoder, PartitionGraph, SequentialIdGenerator,
        UuidIdGenerator, YamlEncoder,
    },
    plan,
};

pub mod cli;
mod input;
pub mod validation;

pub use cli::{Cli, Commands, OutputFormat};
pub use input::{load_inventory, load_request};

/// Diskplan version as provided by the build environment, or the package
/// version otherwise.
pub const DISKPLAN_VERSION: &str = match option_env!("DISKPLAN_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// Prefix of the node ids produced with `--sequential-ids`.
const SEQUENTIAL_ID_PREFIX: &str = "node";

/// Compiles a partition configuration file for the given operating system.
///
/// Returns the rendered partition graph, or `None` when no layout needs to be
/// sent to the provisioning API.
pub fn compile_request(
    request: &Path,
    inventory: &Path,
    os_name: &str,
    format: OutputFormat,
    sequential_ids: bool,
) -> Result<Option<String>, DiskplanError> {
    info!(
        "Compiling partition configuration '{}' for '{}'",
        request.display(),
        os_name
    );
    let plan = load_request(request)?;
    let inventory = load_inventory(inventory)?;
    let os = inventory.operating_system(os_name)?;

    let graph = if sequential_ids {
        let ids = SequentialIdGenerator::new(SEQUENTIAL_ID_PREFIX);
        graph::compile_plan(plan, &inventory.drives, os, ids)?
    } else {
        graph::compile_plan(plan, &inventory.drives, os, UuidIdGenerator)?
    };

    let Some(graph) = graph else {
        info!("Operating system '{os_name}' does not require a partition layout");
        return Ok(None);
    };
    info!("Compiled partition graph with {} nodes", graph.len());
    render_graph(&graph, format).map(Some)
}

/// Resolves a partition configuration file into the plan that would be
/// compiled, with default and boot partitions filled in, rendered as YAML.
pub fn resolve_request(
    request: &Path,
    inventory: &Path,
    os_name: &str,
) -> Result<Option<String>, DiskplanError> {
    let plan = load_request(request)?;
    let inventory = load_inventory(inventory)?;
    let os = inventory.operating_system(os_name)?;

    let Some(resolved) = plan::resolve(plan, &inventory.drives, os)
        .message("Failed to resolve partition plan")?
    else {
        info!("Operating system '{os_name}' does not require a partition layout");
        return Ok(None);
    };

    serde_yaml::to_string(&resolved)
        .structured(InfrastructureError::Internal(
            "Failed to serialize partition plan".into(),
        ))
        .map(Some)
}

/// Renders a compiled graph in the requested output format.
pub fn render_graph(graph: &PartitionGraph, format: OutputFormat) -> Result<String, DiskplanError> {
    debug!("Rendering partition graph as {:?}", format);
    match format {
        OutputFormat::Json => {
            let value = JsonEncoder.encode(graph)?;
            serde_json::to_string_pretty(&value).structured(InfrastructureError::EncodeGraph {
                format: "JSON".into(),
            })
        }
        OutputFormat::Yaml => {
            let value = YamlEncoder.encode(graph)?;
            serde_yaml::to_string(&value).structured(InfrastructureError::EncodeGraph {
                format: "YAML".into(),
            })
        }
    }
}

/// Writes the rendered output to `path`, or to stdout when no path is given.
pub fn write_output(contents: &str, path: Option<&Path>) -> Result<(), DiskplanError> {
    match path {
        Some(path) => {
            info!("Writing output to '{}'", path.display());
            fs::write(path, contents).structured(InfrastructureError::WriteOutput {
                path: path.display().to_string(),
            })
        }
        None => {
            if contents.is_empty() {
                warn!("Nothing to print");
            }
            println!("{contents}");
            Ok(())
        }
    }
}
