// Partition configuration constants

/// Size of a partition that will consume all remaining space on its drive.
pub const PARTITION_SIZE_REMAINING: i64 = -1;

/// Name of the RAID group fabricated by automatic partitioning.
pub const DEFAULT_RAID_GROUP_NAME: &str = "first-raid";

// Mount point constants

/// Root mount point.
pub const ROOT_MOUNT_POINT: &str = "/";

/// Boot mount point.
pub const BOOT_MOUNT_POINT: &str = "/boot";

/// Swap pseudo mount point.
pub const SWAP_MOUNT_POINT: &str = "swap";

/// Mount points that are laid out after every other mount point on a drive.
pub const BASE_MOUNT_POINTS: [&str; 3] = [ROOT_MOUNT_POINT, SWAP_MOUNT_POINT, BOOT_MOUNT_POINT];

// Raw configuration keys

/// Key wrapping the whole partition configuration in a request file.
pub const PARTITIONS_CONFIG_KEY: &str = "partitions_config";

/// Key of the RAID group list.
pub const SOFT_RAID_CONFIG_KEY: &str = "soft_raid_config";

/// Key of the mount list.
pub const DISK_PARTITIONS_KEY: &str = "disk_partitions";

// Path constants

/// Default location of the server inventory file.
pub const INVENTORY_PATH_DEFAULT: &str = "/etc/diskplan/inventory.yaml";
