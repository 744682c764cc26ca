use std::path::{Path, PathBuf};

use tracing::debug;

use super::platform::client_executable;
use crate::core::error::{LauncherError, LauncherResult};

pub const APP_DIR_NAME: &str = "HyPrism";
const VERSION_MARKER: &str = "version.txt";

/// Directory layout of the launcher's data root.
///
/// ```text
/// HyPrism/
///   instances/  jre/  butler/  cache/  logs/  crashes/  UserData/
///   release/package/game/{version}/   (legacy install location)
///   version.txt
///   launcher_settings.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherPaths {
    root: PathBuf,
}

impl LauncherPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `%LOCALAPPDATA%`, `~/Library/Application Support` or
    /// `~/.local/share`, plus the app folder.
    pub fn default_root() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn instances_dir(&self) -> PathBuf {
        self.root.join("instances")
    }

    pub fn jre_dir(&self) -> PathBuf {
        self.root.join("jre")
    }

    pub fn butler_dir(&self) -> PathBuf {
        self.root.join("butler")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn crashes_dir(&self) -> PathBuf {
        self.root.join("crashes")
    }

    /// Legacy, pre-instance user data.
    pub fn user_data_dir(&self) -> PathBuf {
        self.root.join("UserData")
    }

    /// Legacy game install location.
    pub fn game_dir(&self, version: &str) -> PathBuf {
        self.root
            .join("release")
            .join("package")
            .join("game")
            .join(version)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join("launcher_settings.json")
    }

    /// Create the root and every standard folder.
    pub async fn create_folders(&self) -> LauncherResult<()> {
        let folders = [
            self.root.clone(),
            self.instances_dir(),
            self.jre_dir(),
            self.butler_dir(),
            self.cache_dir(),
            self.logs_dir(),
            self.crashes_dir(),
            self.game_dir("latest"),
            self.user_data_dir(),
        ];

        for folder in &folders {
            tokio::fs::create_dir_all(folder)
                .await
                .map_err(|source| LauncherError::Io {
                    path: folder.clone(),
                    source,
                })?;
        }

        debug!("Launcher folders ready under {:?}", self.root);
        Ok(())
    }

    /// Whether a game build is present: a recorded version in
    /// `version.txt`, the client binary, or at least a populated `Client/`.
    pub async fn is_version_installed(&self) -> bool {
        if let Ok(raw) = tokio::fs::read_to_string(self.root.join(VERSION_MARKER)).await {
            let version = raw.trim();
            if !version.is_empty() && version != "0" {
                return true;
            }
        }

        let game_dir = self.game_dir("latest");
        if tokio::fs::metadata(&game_dir).await.is_err() {
            return false;
        }

        if tokio::fs::metadata(client_executable(&game_dir)).await.is_ok() {
            return true;
        }

        match tokio::fs::read_dir(game_dir.join("Client")).await {
            Ok(mut entries) => matches!(entries.next_entry().await, Ok(Some(_))),
            Err(_) => false,
        }
    }
}
