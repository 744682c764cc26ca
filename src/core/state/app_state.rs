use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::downloader::{Downloader, RetryPolicy, TransportPool};
use crate::core::env::LauncherPaths;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{build_http_client, CertVerification};
use crate::core::instance::InstanceManager;
use crate::core::news::NewsService;
use crate::core::updater::{ReleaseChannel, UpdateChecker};

const DEFAULT_NEWS_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub attempt_timeout_secs: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            retry_delay_ms: policy.retry_delay.as_millis() as u64,
            attempt_timeout_secs: policy.attempt_timeout.as_secs(),
        }
    }
}

impl From<&DownloadSettings> for RetryPolicy {
    fn from(settings: &DownloadSettings) -> Self {
        Self {
            // Zero attempts would never try at all.
            max_attempts: settings.max_attempts.max(1),
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
            attempt_timeout: Duration::from_secs(settings.attempt_timeout_secs.max(1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    pub release_channel: ReleaseChannel,
    pub news_limit: usize,
    pub download: DownloadSettings,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            release_channel: ReleaseChannel::default(),
            news_limit: DEFAULT_NEWS_LIMIT,
            download: DownloadSettings::default(),
        }
    }
}

impl LauncherSettings {
    /// Missing or unreadable settings fall back to defaults.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring corrupt settings at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LauncherError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Everything a front end needs, wired once: both HTTP clients, the
/// download engine on top of them, and the services that share it.
pub struct AppState {
    pub paths: LauncherPaths,
    pub settings: LauncherSettings,
    pub http_client: Client,
    pub downloader: Arc<Downloader>,
    pub news: NewsService,
    pub updater: UpdateChecker,
    pub instances: InstanceManager,
}

impl AppState {
    pub fn new() -> LauncherResult<Self> {
        Self::with_root(LauncherPaths::default_root())
    }

    pub fn with_root(root: impl Into<PathBuf>) -> LauncherResult<Self> {
        let paths = LauncherPaths::new(root);
        let settings = LauncherSettings::load(&paths.settings_path());

        let http_client = build_http_client(CertVerification::Verified)?;
        let insecure_client = build_http_client(CertVerification::Disabled)?;

        let downloader = Arc::new(
            Downloader::new(TransportPool::from_clients(
                http_client.clone(),
                insecure_client,
            ))
            .with_policy(RetryPolicy::from(&settings.download)),
        );
        let news = NewsService::new(http_client.clone());
        let updater = UpdateChecker::new(
            downloader.clone(),
            paths.cache_dir(),
            settings.release_channel,
        );
        let instances = InstanceManager::new(paths.instances_dir());

        info!("Launcher state ready at {:?}", paths.root());

        Ok(Self {
            paths,
            settings,
            http_client,
            downloader,
            news,
            updater,
            instances,
        })
    }

    pub fn save_settings(&self) -> LauncherResult<()> {
        self.settings.save(&self.paths.settings_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_corrupt_settings_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher_settings.json");

        assert_eq!(LauncherSettings::load(&path), LauncherSettings::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(LauncherSettings::load(&path), LauncherSettings::default());
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launcher_settings.json");
        std::fs::write(&path, r#"{ "release_channel": "nightly", "download": { "max_attempts": 5 } }"#)
            .unwrap();

        let settings = LauncherSettings::load(&path);
        assert_eq!(settings.release_channel, ReleaseChannel::Nightly);
        assert_eq!(settings.news_limit, 5);
        assert_eq!(settings.download.max_attempts, 5);
        assert_eq!(settings.download.retry_delay_ms, 2000);
        assert_eq!(settings.download.attempt_timeout_secs, 1800);
    }

    #[test]
    fn settings_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("launcher_settings.json");
        let settings = LauncherSettings {
            release_channel: ReleaseChannel::Nightly,
            news_limit: 12,
            download: DownloadSettings {
                max_attempts: 4,
                retry_delay_ms: 250,
                attempt_timeout_secs: 60,
            },
        };

        settings.save(&path).unwrap();
        assert_eq!(LauncherSettings::load(&path), settings);
    }

    #[test]
    fn download_settings_become_retry_policy() {
        let policy = RetryPolicy::from(&DownloadSettings::default());
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.retry_delay, Duration::from_secs(2));
        assert_eq!(policy.attempt_timeout, Duration::from_secs(30 * 60));

        let zero = DownloadSettings {
            max_attempts: 0,
            retry_delay_ms: 0,
            attempt_timeout_secs: 0,
        };
        let policy = RetryPolicy::from(&zero);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.attempt_timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn state_wires_paths_and_policy() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("HyPrism");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(
            root.join("launcher_settings.json"),
            r#"{ "download": { "max_attempts": 7 } }"#,
        )
        .unwrap();

        let state = AppState::with_root(&root).unwrap();
        assert_eq!(state.paths.root(), root.as_path());
        assert_eq!(state.downloader.policy().max_attempts, 7);
        assert!(state.instances.list().await.unwrap().is_empty());

        state.save_settings().unwrap();
        assert_eq!(
            LauncherSettings::load(&state.paths.settings_path()).download.max_attempts,
            7
        );
    }
}
