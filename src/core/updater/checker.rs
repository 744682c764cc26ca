use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use super::manifest::{
    normalize_version, release_asset_url, Asset, ReleaseChannel, UpdateInfo, MANIFEST_ASSET,
};
use crate::core::downloader::{temp_path_for, Downloader, ProgressCallback, TransferRequest};
use crate::core::error::{LauncherError, LauncherResult};

/// A newer (or at least different) launcher build for this platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableUpdate {
    pub version: String,
    pub asset: Asset,
}

/// Launcher self-update checks, fetched through the shared downloader.
pub struct UpdateChecker {
    downloader: Arc<Downloader>,
    cache_dir: PathBuf,
    manifest_url: String,
}

impl UpdateChecker {
    pub fn new(downloader: Arc<Downloader>, cache_dir: PathBuf, channel: ReleaseChannel) -> Self {
        Self::with_manifest_url(downloader, cache_dir, release_asset_url(channel, MANIFEST_ASSET))
    }

    pub fn with_manifest_url(
        downloader: Arc<Downloader>,
        cache_dir: PathBuf,
        manifest_url: impl Into<String>,
    ) -> Self {
        Self {
            downloader,
            cache_dir,
            manifest_url: manifest_url.into(),
        }
    }

    /// `None` when `current` already matches the published version.
    pub async fn check_update(&self, current: &str) -> LauncherResult<Option<AvailableUpdate>> {
        let info = self.fetch_update_info().await?;

        info!("Current version: {}, latest version: {}", current, info.version);
        if normalize_version(current) == normalize_version(&info.version) {
            info!("Already on latest version");
            return Ok(None);
        }

        let os = std::env::consts::OS;
        let arch = std::env::consts::ARCH;
        let asset = info.launcher_for(os, arch)?.clone();
        info!("Update available for {}/{}: {} -> {}", os, arch, current, info.version);

        Ok(Some(AvailableUpdate {
            version: info.version,
            asset,
        }))
    }

    async fn fetch_update_info(&self) -> LauncherResult<UpdateInfo> {
        let manifest_path = self.cache_dir.join(MANIFEST_ASSET);
        // A leftover partial manifest may belong to an older release.
        remove_if_present(&temp_path_for(&manifest_path)).await;

        let request = TransferRequest::new(&manifest_path, &self.manifest_url).with_stage("update");
        self.downloader.transfer(&request).await?;

        let raw = tokio::fs::read(&manifest_path)
            .await
            .map_err(|source| LauncherError::Io {
                path: manifest_path.clone(),
                source,
            });
        remove_if_present(&manifest_path).await;

        Ok(serde_json::from_slice(&raw?)?)
    }

    /// Download the launcher binary for `update` to `dest` and check its
    /// SHA-256 when the manifest provides one. A mismatching file is removed.
    pub async fn download_update(
        &self,
        update: &AvailableUpdate,
        dest: &Path,
        on_progress: Option<ProgressCallback>,
    ) -> LauncherResult<()> {
        let mut request = TransferRequest::new(dest, &update.asset.url).with_stage("update");
        request.on_progress = on_progress;
        self.downloader.transfer(&request).await?;

        let expected = update.asset.sha256.trim();
        if expected.is_empty() {
            return Ok(());
        }

        let actual = sha256_file(dest).await?;
        if !actual.eq_ignore_ascii_case(expected) {
            remove_if_present(dest).await;
            return Err(LauncherError::Sha256Mismatch {
                path: dest.to_path_buf(),
                expected: expected.to_string(),
                actual,
            });
        }

        info!("Launcher {} downloaded to {:?}", update.version, dest);
        Ok(())
    }
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            warn!("Could not remove {:?}: {}", path, e);
        }
        _ => {}
    }
}

async fn sha256_file(path: &Path) -> LauncherResult<String> {
    let io_err = |source| LauncherError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::File::open(path).await.map_err(io_err)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).await.map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
