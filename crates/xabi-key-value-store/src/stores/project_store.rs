use xabi_domain::{ChainId, Project};

use crate::{KeyValueStoreError, Table};

pub const PROJECTS_KEY: &str = "user-evm-xAbi-smart-contract-projects-key";

/// Persistent list of saved projects. One project per `(address, chain)` pair.
#[derive(Clone)]
pub struct ProjectStore {
    table: Table<Vec<Project>>,
}

impl ProjectStore {
    pub(crate) fn from_table(table: Table<Vec<Project>>) -> Self {
        Self { table }
    }

    fn key() -> Vec<u8> {
        PROJECTS_KEY.as_bytes().to_vec()
    }

    pub async fn list(&self) -> Result<Vec<Project>, KeyValueStoreError> {
        Ok(self.table.get(Self::key()).await?.unwrap_or_default())
    }

    pub async fn find(
        &self,
        address: &str,
        chain_id: ChainId,
    ) -> Result<Option<Project>, KeyValueStoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|project| project.is_for(address, chain_id)))
    }

    /// Save `project`, replacing any project bound to the same address and chain.
    ///
    /// An empty name becomes `Project-<n>`, `n` being the position the project
    /// takes in the list. Returns the project as stored.
    pub async fn save(&self, project: Project) -> Result<Project, KeyValueStoreError> {
        let saved = self
            .table
            .mutate(Self::key(), Vec::new(), move |projects: &mut Vec<Project>| {
                let mut project = project;
                projects.retain(|existing| !existing.is_for(&project.address, project.chain_id));
                if project.name.trim().is_empty() {
                    project.name = format!("Project-{}", projects.len() + 1);
                }
                projects.push(project.clone());
                Ok::<_, KeyValueStoreError>(project)
            })
            .await??;

        tracing::debug!(
            project_id = %saved.id,
            address = %saved.address,
            chain_id = %saved.chain_id,
            "Saved project"
        );
        Ok(saved)
    }

    /// Delete the project with `id`. Returns false when it did not exist.
    pub async fn delete(&self, id: &str) -> Result<bool, KeyValueStoreError> {
        let id = id.to_string();
        self.table
            .mutate(Self::key(), Vec::new(), move |projects: &mut Vec<Project>| {
                let before = projects.len();
                projects.retain(|project| project.id != id);
                Ok::<_, KeyValueStoreError>(projects.len() != before)
            })
            .await?
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;
    use crate::{KeyValueStoreManager, KeyValueStoreManagerConfig};

    fn project(id: &str, name: &str, address: &str, chain_id: u64) -> Project {
        Project {
            id: id.to_string(),
            name: name.to_string(),
            address: address.to_string(),
            chain_id: ChainId::new(chain_id),
            abi: Vec::new(),
            created_at: Utc::now(),
        }
    }

    async fn open_store(temp_dir: &TempDir) -> ProjectStore {
        let db_path = temp_dir.path().join("test.redb");
        KeyValueStoreManager::connect(&db_path, &KeyValueStoreManagerConfig::default())
            .await
            .unwrap()
            .project_store()
    }

    #[tokio::test]
    async fn test_save_replaces_same_address_and_chain() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;
        let address = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

        store.save(project("1", "first", address, 1)).await.unwrap();
        store
            .save(project("2", "second", &address.to_lowercase(), 1))
            .await
            .unwrap();

        let projects = store.list().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].id, "2");
        assert_eq!(projects[0].name, "second");
    }

    #[tokio::test]
    async fn test_same_address_on_other_chain_is_separate() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;
        let address = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

        store.save(project("1", "main", address, 1)).await.unwrap();
        store.save(project("2", "test", address, 5)).await.unwrap();

        assert_eq!(store.list().await.unwrap().len(), 2);
        let found = store.find(address, ChainId::new(5)).await.unwrap().unwrap();
        assert_eq!(found.id, "2");
    }

    #[tokio::test]
    async fn test_default_name_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir).await;

        let saved = store
            .save(project("1", " ", "0x1111111111111111111111111111111111111111", 1))
            .await
            .unwrap();
        assert_eq!(saved.name, "Project-1");

        let saved = store
            .save(project("2", "", "0x2222222222222222222222222222222222222222", 1))
            .await
            .unwrap();
        assert_eq!(saved.name, "Project-2");

        assert!(store.delete("1").await.unwrap());
        assert!(!store.delete("1").await.unwrap());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
