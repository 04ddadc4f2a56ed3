pub mod config;
pub mod constants;
pub mod error;
pub mod graph;
pub mod inventory;
pub mod plan;

/// Identifier of a node in the partition graph.
pub type NodeId = String;

/// Native identifier of a physical drive, as reported by the server inventory.
pub type DriveId = String;
