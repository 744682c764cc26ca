use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

/// A game install identified by release branch and build number, stored in
/// `instances/{branch}-v{version}/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId {
    pub branch: String,
    pub version: u32,
}

impl InstanceId {
    pub fn new(branch: impl Into<String>, version: u32) -> Self {
        Self {
            branch: branch.into(),
            version,
        }
    }

    /// Parse a directory name such as `release-v4`.
    pub fn parse(dir_name: &str) -> LauncherResult<Self> {
        let invalid = || LauncherError::InvalidInstanceName(dir_name.to_string());
        let (branch, version) = dir_name.rsplit_once("-v").ok_or_else(invalid)?;
        if branch.is_empty() {
            return Err(invalid());
        }
        let version = version.parse::<u32>().map_err(|_| invalid())?;
        Ok(Self::new(branch, version))
    }

    pub fn dir_name(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-v{}", self.branch, self.version)
    }
}

/// On-disk layout of one instance:
/// - `game/`      — game files
/// - `mods/`      — mods
/// - `saves/`     — worlds
/// - `UserData/`  — client user data, with `UserData/Mods/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceLayout {
    pub id: InstanceId,
    pub path: PathBuf,
}

impl InstanceLayout {
    pub fn new(instances_dir: &Path, id: InstanceId) -> Self {
        let path = instances_dir.join(id.dir_name());
        Self { id, path }
    }

    pub fn game_dir(&self) -> PathBuf {
        self.path.join("game")
    }

    pub fn mods_dir(&self) -> PathBuf {
        self.path.join("mods")
    }

    pub fn saves_dir(&self) -> PathBuf {
        self.path.join("saves")
    }

    pub fn user_data_dir(&self) -> PathBuf {
        self.path.join("UserData")
    }

    pub fn user_mods_dir(&self) -> PathBuf {
        self.user_data_dir().join("Mods")
    }

    /// Every directory `create` has to make, parents first.
    pub fn directories(&self) -> Vec<PathBuf> {
        vec![
            self.path.clone(),
            self.game_dir(),
            self.mods_dir(),
            self.saves_dir(),
            self.user_data_dir(),
            self.user_mods_dir(),
        ]
    }
}
