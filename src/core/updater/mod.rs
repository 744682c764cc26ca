pub mod checker;
pub mod manifest;

pub use checker::{AvailableUpdate, UpdateChecker};
pub use manifest::{release_asset_url, Asset, ReleaseChannel, UpdateInfo};
