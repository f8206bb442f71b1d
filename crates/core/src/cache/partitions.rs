//! Versioned cache partition names.
//!
//! Every logical cache category lives in its own named partition. Names
//! embed the cache version token so that bumping the version lets
//! activation invalidate all old partitions in one sweep. The exact names
//! are an implementation detail, not an external contract.

const PARTITION_PREFIX: &str = "wayfare";

/// The named partition set for one cache version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitions {
    /// Critical pages and static assets.
    pub static_assets: String,
    /// Everything served stale-while-revalidate or network-first by default.
    pub dynamic: String,
    /// Bounded image partition.
    pub images: String,
    /// API responses kept for offline fallback.
    pub api: String,
    /// Font files.
    pub fonts: String,
}

impl Partitions {
    /// Build the partition set for a version token.
    pub fn for_version(version: &str) -> Self {
        Self {
            static_assets: format!("{PARTITION_PREFIX}-static-{version}"),
            dynamic: format!("{PARTITION_PREFIX}-dynamic-{version}"),
            images: format!("{PARTITION_PREFIX}-images-{version}"),
            api: format!("{PARTITION_PREFIX}-api-{version}"),
            fonts: format!("{PARTITION_PREFIX}-fonts-{version}"),
        }
    }

    /// Whether a partition name belongs to the given version.
    pub fn is_current(name: &str, version: &str) -> bool {
        name.contains(version)
    }
}
