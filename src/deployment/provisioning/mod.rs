//! Resource provisioners wrapping remote provider calls.
//!
//! Provisioners raise [`ProvisioningError`]; recovering from idempotent
//! creation conflicts happens here, everything else propagates to the
//! workflows.

mod boot_script;
mod compute;
mod error;
mod storage;

pub use boot_script::render_boot_script;
pub use compute::{
    ComputeProvisioner, LaunchSpec, ReadinessSettings, base_image, instance_monthly_cost,
};
pub use error::{ProvisioningError, ProvisioningResult};
pub use storage::{
    BUILD_OUTPUT_CANDIDATES, DEFAULT_STORAGE_GB, INDEX_DOCUMENT, StorageProvisioner,
    locate_build_output, storage_monthly_cost, website_url,
};

use crate::deployment::ports::ResourceTag;

/// Tag key marking resources created by this crate.
pub const MANAGED_BY_KEY: &str = "ManagedBy";

/// Tag value marking resources created by this crate.
pub const MANAGED_BY_VALUE: &str = "skylift";

/// Returns the management tag applied to every created resource.
#[must_use]
pub fn management_tag() -> ResourceTag {
    ResourceTag::new(MANAGED_BY_KEY, MANAGED_BY_VALUE)
}

/// Returns the `Name` and management tags for a resource.
#[must_use]
pub fn managed_tags(name: &str) -> Vec<ResourceTag> {
    vec![ResourceTag::new("Name", name), management_tag()]
}
