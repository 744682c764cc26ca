// ─── Release Manifest ───
// `version.json` published with every launcher release.

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};

pub const RELEASE_OWNER: &str = "yyyumeniku";
pub const RELEASE_REPO: &str = "HyPrism";
pub const MANIFEST_ASSET: &str = "version.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseChannel {
    #[default]
    Stable,
    /// Rolling pre-release tagged `nightly`.
    Nightly,
}

/// Download URL of a release asset on the given channel.
pub fn release_asset_url(channel: ReleaseChannel, asset: &str) -> String {
    match channel {
        ReleaseChannel::Stable => format!(
            "https://github.com/{}/{}/releases/latest/download/{}",
            RELEASE_OWNER, RELEASE_REPO, asset
        ),
        ReleaseChannel::Nightly => format!(
            "https://github.com/{}/{}/releases/download/nightly/{}",
            RELEASE_OWNER, RELEASE_REPO, asset
        ),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub sha256: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArchAssets {
    #[serde(default)]
    pub launcher: Asset,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformAssets {
    #[serde(default)]
    pub amd64: ArchAssets,
    #[serde(default)]
    pub arm64: ArchAssets,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInfo {
    pub version: String,
    #[serde(default)]
    pub linux: PlatformAssets,
    #[serde(default)]
    pub windows: PlatformAssets,
    #[serde(default)]
    pub darwin: PlatformAssets,
}

impl UpdateInfo {
    /// Launcher asset for `os`/`arch` (Rust's `std::env::consts` names).
    /// Only macOS ships an arm64 build; everything else gets amd64.
    pub fn launcher_for(&self, os: &str, arch: &str) -> LauncherResult<&Asset> {
        let asset = match os {
            "windows" => &self.windows.amd64.launcher,
            "macos" if arch == "aarch64" => &self.darwin.arm64.launcher,
            "macos" => &self.darwin.amd64.launcher,
            _ => &self.linux.amd64.launcher,
        };

        if asset.url.is_empty() {
            return Err(LauncherError::NoUpdateAsset {
                os: os.to_string(),
                arch: arch.to_string(),
            });
        }
        Ok(asset)
    }
}

/// `" v1.2.3 "` → `"1.2.3"`
pub fn normalize_version(version: &str) -> &str {
    let trimmed = version.trim();
    trimmed.strip_prefix('v').unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "version": "v2.1.0",
        "linux": { "amd64": { "launcher": { "url": "https://example.com/linux", "sha256": "aa" } } },
        "windows": { "amd64": { "launcher": { "url": "https://example.com/win.exe", "sha256": "bb" } } },
        "darwin": {
            "amd64": { "launcher": { "url": "https://example.com/mac-x64", "sha256": "cc" } },
            "arm64": { "launcher": { "url": "", "sha256": "" } }
        }
    }"#;

    #[test]
    fn picks_platform_asset() {
        let info: UpdateInfo = serde_json::from_str(MANIFEST).unwrap();
        assert_eq!(info.launcher_for("linux", "x86_64").unwrap().sha256, "aa");
        assert_eq!(
            info.launcher_for("windows", "x86_64").unwrap().url,
            "https://example.com/win.exe"
        );
        assert_eq!(info.launcher_for("macos", "x86_64").unwrap().sha256, "cc");
        assert!(matches!(
            info.launcher_for("macos", "aarch64"),
            Err(LauncherError::NoUpdateAsset { .. })
        ));
    }

    #[test]
    fn version_prefix_and_whitespace_are_ignored() {
        assert_eq!(normalize_version(" v1.0.4\n"), "1.0.4");
        assert_eq!(normalize_version("1.0.4"), "1.0.4");
    }

    #[test]
    fn channel_urls() {
        assert_eq!(
            release_asset_url(ReleaseChannel::Stable, MANIFEST_ASSET),
            "https://github.com/yyyumeniku/HyPrism/releases/latest/download/version.json"
        );
        assert_eq!(
            release_asset_url(ReleaseChannel::Nightly, MANIFEST_ASSET),
            "https://github.com/yyyumeniku/HyPrism/releases/download/nightly/version.json"
        );
    }
}
