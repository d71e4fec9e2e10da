use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::debug;

use super::{BlogStore, StoreError};
use crate::models::{HistoryPhotoColumn, IdolGroup, MemberRecord};

const BLOG_STATUS_FILE: &str = "BlogStatus.JSON";
const HISTORY_FILE: &str = "History.JSON";
const DESIRED_MEMBERS_FILE: &str = "Desired_Member_List.JSON";

type Result<T> = std::result::Result<T, StoreError>;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base path for storage
    pub base_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
        }
    }
}

/// JSON persistence for blog stores, the desired-member list and history columns
#[derive(Debug, Clone)]
pub struct Storage {
    config: StorageConfig,
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage {
    /// Create a new storage with default configuration
    pub fn new() -> Self {
        Self {
            config: StorageConfig::default(),
        }
    }

    /// Create a new storage with custom configuration
    pub fn with_config(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Create a storage rooted at `base_path`
    pub fn at(base_path: impl Into<PathBuf>) -> Self {
        Self::with_config(StorageConfig {
            base_path: base_path.into(),
        })
    }

    /// Root directory of all persisted files
    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    /// Image folder of a group, e.g. `./Hinatazaka46_Images`
    pub fn group_dir(&self, group: IdolGroup) -> PathBuf {
        self.config
            .base_path
            .join(format!("{}_Images", group.as_str()))
    }

    /// Path of a group's persisted blog store
    pub fn blog_status_path(&self, group: IdolGroup) -> PathBuf {
        self.group_dir(group).join(BLOG_STATUS_FILE)
    }

    /// Path of the Hinatazaka46 history column store
    pub fn history_path(&self) -> PathBuf {
        self.group_dir(IdolGroup::Hinatazaka46).join(HISTORY_FILE)
    }

    /// Path of the desired-member list
    pub fn desired_members_path(&self) -> PathBuf {
        self.config.base_path.join(DESIRED_MEMBERS_FILE)
    }

    /// Creates necessary directories for storage
    async fn ensure_directories(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Read a JSON file, yielding the default value when it does not exist
    async fn read_json<T>(&self, path: &Path) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist yet", path.display());
                return Ok(T::default());
            }
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write a value as pretty-printed JSON, creating parent directories
    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        self.ensure_directories(path).await?;
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json).await?;
        Ok(())
    }

    /// Load the persisted member records of a group
    pub async fn load_members(&self, group: IdolGroup) -> Result<Vec<MemberRecord>> {
        self.read_json(&self.blog_status_path(group)).await
    }

    /// Load a group's members flattened into a blog store
    pub async fn load_store(&self, group: IdolGroup) -> Result<BlogStore> {
        Ok(BlogStore::from_members(self.load_members(group).await?))
    }

    /// Persist the member records of a group
    pub async fn save_members(&self, group: IdolGroup, members: &[MemberRecord]) -> Result<()> {
        self.write_json(&self.blog_status_path(group), members).await
    }

    /// Members of every group, in `IdolGroup::ALL` order
    pub async fn all_members(&self) -> Result<Vec<MemberRecord>> {
        let mut members = Vec::new();
        for group in IdolGroup::ALL {
            members.extend(self.load_members(group).await?);
        }
        Ok(members)
    }

    /// Load the desired-member list
    pub async fn load_desired_members(&self) -> Result<Vec<String>> {
        self.read_json(&self.desired_members_path()).await
    }

    /// Add a member to the desired list; `false` if already listed
    pub async fn add_desired_member(&self, name: &str) -> Result<bool> {
        let mut names = self.load_desired_members().await?;
        if names.iter().any(|n| n == name) {
            return Ok(false);
        }
        names.push(name.to_string());
        self.write_json(&self.desired_members_path(), &names).await?;
        Ok(true)
    }

    /// Remove a member from the desired list; `false` if not listed
    pub async fn remove_desired_member(&self, name: &str) -> Result<bool> {
        let mut names = self.load_desired_members().await?;
        let Some(index) = names.iter().position(|n| n == name) else {
            return Ok(false);
        };
        names.remove(index);
        self.write_json(&self.desired_members_path(), &names).await?;
        Ok(true)
    }

    /// Load the history column store
    pub async fn load_history(&self) -> Result<Vec<HistoryPhotoColumn>> {
        self.read_json(&self.history_path()).await
    }

    /// Persist the history column store
    pub async fn save_history(&self, columns: &[HistoryPhotoColumn]) -> Result<()> {
        self.write_json(&self.history_path(), columns).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlogRecord;
    use tempfile::tempdir;

    fn member(name: &str, ids: &[&str]) -> MemberRecord {
        MemberRecord {
            name: name.to_string(),
            group: IdolGroup::Sakurazaka46,
            blog_list: ids
                .iter()
                .map(|id| BlogRecord {
                    id: id.to_string(),
                    name: name.to_string(),
                    title: "t".to_string(),
                    date_time: Some("2023-01-01T00:00:00+08:00".to_string()),
                    image_list: vec![format!("/files/{id}.jpg")],
                    content: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_paths() {
        let storage = Storage::at("/data");
        assert_eq!(
            storage.blog_status_path(IdolGroup::Sakurazaka46),
            Path::new("/data/Sakurazaka46_Images/BlogStatus.JSON")
        );
        assert_eq!(
            storage.history_path(),
            Path::new("/data/Hinatazaka46_Images/History.JSON")
        );
        assert_eq!(
            storage.desired_members_path(),
            Path::new("/data/Desired_Member_List.JSON")
        );
    }

    #[tokio::test]
    async fn test_missing_files_load_empty() {
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path());

        assert!(storage.load_members(IdolGroup::Hinatazaka46).await.unwrap().is_empty());
        assert!(storage.load_desired_members().await.unwrap().is_empty());
        assert!(storage.load_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_members_round_trip() {
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path());
        let members = vec![member("M1", &["1", "2"]), member("M2", &["3"])];

        storage
            .save_members(IdolGroup::Sakurazaka46, &members)
            .await
            .unwrap();
        let loaded = storage.load_members(IdolGroup::Sakurazaka46).await.unwrap();
        assert_eq!(loaded, members);

        let store = storage.load_store(IdolGroup::Sakurazaka46).await.unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(storage.all_members().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_store_is_an_error() {
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path());
        let path = storage.blog_status_path(IdolGroup::Hinatazaka46);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let result = storage.load_members(IdolGroup::Hinatazaka46).await;
        assert!(matches!(result, Err(StoreError::Json { .. })));
    }

    #[tokio::test]
    async fn test_desired_member_list() {
        let dir = tempdir().unwrap();
        let storage = Storage::at(dir.path());

        assert!(storage.add_desired_member("M1").await.unwrap());
        assert!(storage.add_desired_member("M2").await.unwrap());
        assert!(!storage.add_desired_member("M1").await.unwrap());
        assert_eq!(storage.load_desired_members().await.unwrap(), vec!["M1", "M2"]);

        assert!(storage.remove_desired_member("M1").await.unwrap());
        assert!(!storage.remove_desired_member("M1").await.unwrap());
        assert_eq!(storage.load_desired_members().await.unwrap(), vec!["M2"]);
    }
}
