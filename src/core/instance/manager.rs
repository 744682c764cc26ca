use std::path::PathBuf;

use tracing::info;

use super::model::{InstanceId, InstanceLayout};
use crate::core::error::{LauncherError, LauncherResult};

/// Manages instance directories on disk.
pub struct InstanceManager {
    /// Root directory where all instances live.
    instances_dir: PathBuf,
}

impl InstanceManager {
    pub fn new(instances_dir: PathBuf) -> Self {
        Self { instances_dir }
    }

    pub fn layout(&self, id: InstanceId) -> InstanceLayout {
        InstanceLayout::new(&self.instances_dir, id)
    }

    /// Create the instance folder structure. Existing folders are kept, so
    /// this doubles as a repair step before launching.
    pub async fn create(&self, id: InstanceId) -> LauncherResult<InstanceLayout> {
        let layout = self.layout(id);

        for dir in layout.directories() {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|source| LauncherError::Io { path: dir, source })?;
        }

        info!("Prepared instance {} at {:?}", layout.id, layout.path);
        Ok(layout)
    }

    /// Names of all instance directories. A missing instances dir is empty.
    pub async fn list(&self) -> LauncherResult<Vec<String>> {
        let mut names = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.instances_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(source) => {
                return Err(LauncherError::Io {
                    path: self.instances_dir.clone(),
                    source,
                })
            }
        };

        while let Some(entry) = entries.next_entry().await.map_err(|e| LauncherError::Io {
            path: self.instances_dir.clone(),
            source: e,
        })? {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    /// Installed build numbers of `branch`, ascending.
    pub async fn installed_versions(&self, branch: &str) -> LauncherResult<Vec<u32>> {
        let mut versions: Vec<u32> = self
            .list()
            .await?
            .iter()
            .filter_map(|name| InstanceId::parse(name).ok())
            .filter(|id| id.branch == branch)
            .map(|id| id.version)
            .collect();
        versions.sort_unstable();
        Ok(versions)
    }

    /// Delete an instance and everything in it.
    pub async fn delete(&self, id: &InstanceId) -> LauncherResult<()> {
        let instance_dir = self.layout(id.clone()).path;
        if tokio::fs::metadata(&instance_dir).await.is_err() {
            return Err(LauncherError::InstanceNotFound(id.to_string()));
        }

        tokio::fs::remove_dir_all(&instance_dir)
            .await
            .map_err(|e| LauncherError::Io {
                path: instance_dir,
                source: e,
            })?;

        info!("Deleted instance {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_builds_full_structure() {
        let dir = tempfile::tempdir().unwrap();
        let manager = InstanceManager::new(dir.path().join("instances"));

        let layout = manager.create(InstanceId::new("release", 3)).await.unwrap();

        for path in layout.directories() {
            assert!(path.is_dir(), "{path:?} missing");
        }
        // Second call is a no-op.
        manager.create(InstanceId::new("release", 3)).await.unwrap();
    }

    #[tokio::test]
    async fn list_and_installed_versions() {
        let dir = tempfile::tempdir().unwrap();
        let instances = dir.path().join("instances");
        let manager = InstanceManager::new(instances.clone());

        assert!(manager.list().await.unwrap().is_empty());

        manager.create(InstanceId::new("release", 10)).await.unwrap();
        manager.create(InstanceId::new("release", 2)).await.unwrap();
        manager.create(InstanceId::new("beta", 7)).await.unwrap();
        std::fs::create_dir_all(instances.join("scratch")).unwrap();
        std::fs::write(instances.join("release-v99"), b"not a dir").unwrap();

        assert_eq!(
            manager.list().await.unwrap(),
            vec!["beta-v7", "release-v10", "release-v2", "scratch"]
        );
        assert_eq!(manager.installed_versions("release").await.unwrap(), vec![2, 10]);
        assert_eq!(manager.installed_versions("beta").await.unwrap(), vec![7]);
        assert!(manager.installed_versions("alpha").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_instance() {
        let dir = tempfile::tempdir().unwrap();
        let manager = InstanceManager::new(dir.path().join("instances"));
        let id = InstanceId::new("release", 1);

        let layout = manager.create(id.clone()).await.unwrap();
        manager.delete(&id).await.unwrap();
        assert!(!layout.path.exists());

        assert!(matches!(
            manager.delete(&id).await,
            Err(LauncherError::InstanceNotFound(_))
        ));
    }
}
