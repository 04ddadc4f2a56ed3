mod parser;
mod partitions;

pub use partitions::{
    FileSystemType, MountSpec, PartitionPlan, PartitionSize, RaidGroupSpec, RaidLevel,
};
