//! Repository, commit, and remote bookkeeping
//!
//! Holds the repositories the orchestrator validates requests against. When
//! opened with a state file, every mutation is written back as JSON; remotes
//! are stored in their exchange form (URI plus properties) and re-resolved
//! through the registry on load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TitanError};
use crate::models::{Commit, Remote, Repository};
use crate::services::remote::{Properties, RemoteRegistry};
use crate::services::{read_lock, write_lock};

#[derive(Debug, Clone)]
struct RepositoryEntry {
    repository: Repository,
    commits: BTreeMap<String, Commit>,
    remotes: BTreeMap<String, Remote>,
}

/// On-disk layout of the state file
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredState {
    #[serde(default)]
    repositories: Vec<StoredRepository>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRepository {
    repository: Repository,
    #[serde(default)]
    commits: Vec<Commit>,
    #[serde(default)]
    remotes: Vec<StoredRemote>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRemote {
    name: String,
    uri: String,
    #[serde(default)]
    properties: Properties,
}

/// Names may only contain alphanumerics and `-_.:`
pub fn validate_name(what: &str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
    if valid {
        Ok(())
    } else {
        Err(TitanError::config(format!("Invalid {} name '{}'", what, name)))
    }
}

/// Service for repository state
pub struct RepositoryService {
    registry: Arc<RemoteRegistry>,
    repositories: RwLock<BTreeMap<String, RepositoryEntry>>,
    state_file: Option<PathBuf>,
}

impl RepositoryService {
    /// Create an in-memory service
    pub fn new(registry: Arc<RemoteRegistry>) -> Self {
        Self {
            registry,
            repositories: RwLock::new(BTreeMap::new()),
            state_file: None,
        }
    }

    /// Open a service backed by `state_file`, loading it if present
    pub fn open(state_file: &Path, registry: Arc<RemoteRegistry>) -> Result<Self> {
        let mut repositories = BTreeMap::new();

        if state_file.exists() {
            let contents = std::fs::read_to_string(state_file)?;
            let stored: StoredState = serde_json::from_str(&contents)?;

            for repo in stored.repositories {
                let mut remotes = BTreeMap::new();
                for remote in repo.remotes {
                    let parsed = registry.parse_uri(&remote.uri, &remote.name, &remote.properties)?;
                    remotes.insert(remote.name, parsed);
                }
                let commits = repo
                    .commits
                    .into_iter()
                    .map(|c| (c.id.clone(), c))
                    .collect();

                repositories.insert(
                    repo.repository.name.clone(),
                    RepositoryEntry {
                        repository: repo.repository,
                        commits,
                        remotes,
                    },
                );
            }

            tracing::info!(
                "Loaded {} repositories from {}",
                repositories.len(),
                state_file.display()
            );
        }

        Ok(Self {
            registry,
            repositories: RwLock::new(repositories),
            state_file: Some(state_file.to_path_buf()),
        })
    }

    fn persist(&self, repositories: &BTreeMap<String, RepositoryEntry>) -> Result<()> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };

        let mut stored = StoredState::default();
        for entry in repositories.values() {
            let mut remotes = Vec::new();
            for remote in entry.remotes.values() {
                let (uri, properties) = self.registry.to_uri(remote)?;
                remotes.push(StoredRemote {
                    name: remote.name().to_string(),
                    uri,
                    properties,
                });
            }
            stored.repositories.push(StoredRepository {
                repository: entry.repository.clone(),
                commits: entry.commits.values().cloned().collect(),
                remotes,
            });
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }

    fn with_entry<T>(&self, repository: &str, f: impl FnOnce(&RepositoryEntry) -> Result<T>) -> Result<T> {
        let repositories = read_lock(&self.repositories);
        let entry = repositories
            .get(repository)
            .ok_or_else(|| TitanError::RepositoryNotFound(repository.to_string()))?;
        f(entry)
    }

    /// Apply `f` to a copy of the state; it replaces the live state only once persisted
    fn update<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, RepositoryEntry>) -> Result<T>,
    ) -> Result<T> {
        let mut repositories = write_lock(&self.repositories);
        let mut staged = repositories.clone();
        let result = f(&mut staged)?;
        self.persist(&staged)?;
        *repositories = staged;
        Ok(result)
    }

    fn with_entry_mut<T>(
        &self,
        repository: &str,
        f: impl FnOnce(&mut RepositoryEntry) -> Result<T>,
    ) -> Result<T> {
        self.update(|repositories| {
            let entry = repositories
                .get_mut(repository)
                .ok_or_else(|| TitanError::RepositoryNotFound(repository.to_string()))?;
            f(entry)
        })
    }

    pub fn create_repository(&self, repository: Repository) -> Result<Repository> {
        validate_name("repository", &repository.name)?;

        self.update(|repositories| {
            if repositories.contains_key(&repository.name) {
                return Err(TitanError::RepositoryExists(repository.name.clone()));
            }
            repositories.insert(
                repository.name.clone(),
                RepositoryEntry {
                    repository: repository.clone(),
                    commits: BTreeMap::new(),
                    remotes: BTreeMap::new(),
                },
            );
            Ok(())
        })?;

        tracing::info!("Created repository {}", repository.name);
        Ok(repository)
    }

    pub fn get_repository(&self, name: &str) -> Result<Repository> {
        self.with_entry(name, |entry| Ok(entry.repository.clone()))
    }

    pub fn list_repositories(&self) -> Vec<Repository> {
        read_lock(&self.repositories)
            .values()
            .map(|entry| entry.repository.clone())
            .collect()
    }

    pub fn delete_repository(&self, name: &str) -> Result<()> {
        self.update(|repositories| match repositories.remove(name) {
            Some(_) => Ok(()),
            None => Err(TitanError::RepositoryNotFound(name.to_string())),
        })?;

        tracing::info!("Deleted repository {}", name);
        Ok(())
    }

    pub fn create_commit(
        &self,
        repository: &str,
        id: &str,
        properties: BTreeMap<String, String>,
    ) -> Result<Commit> {
        validate_name("commit", id)?;

        self.with_entry_mut(repository, |entry| {
            if entry.commits.contains_key(id) {
                return Err(TitanError::CommitExists(id.to_string()));
            }
            let commit = Commit {
                id: id.to_string(),
                properties,
                timestamp: Utc::now(),
            };
            entry.commits.insert(id.to_string(), commit.clone());
            Ok(commit)
        })
    }

    pub fn get_commit(&self, repository: &str, id: &str) -> Result<Commit> {
        self.with_entry(repository, |entry| {
            entry
                .commits
                .get(id)
                .cloned()
                .ok_or_else(|| TitanError::CommitNotFound(id.to_string()))
        })
    }

    /// Commits, newest first
    pub fn list_commits(&self, repository: &str) -> Result<Vec<Commit>> {
        self.with_entry(repository, |entry| {
            let mut commits: Vec<Commit> = entry.commits.values().cloned().collect();
            commits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            Ok(commits)
        })
    }

    pub fn add_remote(&self, repository: &str, remote: Remote) -> Result<()> {
        validate_name("remote", remote.name())?;

        self.with_entry_mut(repository, |entry| {
            if entry.remotes.contains_key(remote.name()) {
                return Err(TitanError::RemoteExists(remote.name().to_string()));
            }
            entry.remotes.insert(remote.name().to_string(), remote);
            Ok(())
        })
    }

    /// Replace an existing remote of the same name
    pub fn update_remote(&self, repository: &str, remote: Remote) -> Result<()> {
        self.with_entry_mut(repository, |entry| match entry.remotes.get_mut(remote.name()) {
            Some(existing) => {
                *existing = remote;
                Ok(())
            }
            None => Err(TitanError::RemoteNotFound(remote.name().to_string())),
        })
    }

    pub fn get_remote(&self, repository: &str, name: &str) -> Result<Remote> {
        self.with_entry(repository, |entry| {
            entry
                .remotes
                .get(name)
                .cloned()
                .ok_or_else(|| TitanError::RemoteNotFound(name.to_string()))
        })
    }

    pub fn list_remotes(&self, repository: &str) -> Result<Vec<Remote>> {
        self.with_entry(repository, |entry| Ok(entry.remotes.values().cloned().collect()))
    }

    pub fn remove_remote(&self, repository: &str, name: &str) -> Result<()> {
        self.with_entry_mut(repository, |entry| match entry.remotes.remove(name) {
            Some(_) => Ok(()),
            None => Err(TitanError::RemoteNotFound(name.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NopRemote, SshRemote};
    use tempfile::TempDir;

    fn service() -> RepositoryService {
        RepositoryService::new(Arc::new(RemoteRegistry::new()))
    }

    fn repo(name: &str) -> Repository {
        Repository {
            name: name.to_string(),
            properties: BTreeMap::new(),
        }
    }

    fn ssh_remote() -> Remote {
        Remote::Ssh(SshRemote {
            name: "origin".to_string(),
            address: "backup.local".to_string(),
            username: "titan".to_string(),
            password: Some("pw".to_string()),
            port: Some(2222),
            path: "/srv/titan".to_string(),
            key_file: None,
        })
    }

    #[test]
    fn test_create_and_get_repository() {
        let service = service();
        service.create_repository(repo("r1")).unwrap();
        assert_eq!(service.get_repository("r1").unwrap().name, "r1");
        assert_eq!(service.list_repositories().len(), 1);
    }

    #[test]
    fn test_duplicate_repository() {
        let service = service();
        service.create_repository(repo("r1")).unwrap();
        assert!(matches!(
            service.create_repository(repo("r1")),
            Err(TitanError::RepositoryExists(_))
        ));
    }

    #[test]
    fn test_invalid_names() {
        let service = service();
        assert!(service.create_repository(repo("")).unwrap_err().is_configuration());
        assert!(service.create_repository(repo("a/b")).unwrap_err().is_configuration());
    }

    #[test]
    fn test_commits() {
        let service = service();
        service.create_repository(repo("r1")).unwrap();
        service.create_commit("r1", "c1", BTreeMap::new()).unwrap();

        assert_eq!(service.get_commit("r1", "c1").unwrap().id, "c1");
        assert!(matches!(
            service.get_commit("r1", "c2"),
            Err(TitanError::CommitNotFound(_))
        ));
        assert!(matches!(
            service.create_commit("r1", "c1", BTreeMap::new()),
            Err(TitanError::CommitExists(_))
        ));
        assert!(matches!(
            service.get_commit("missing", "c1"),
            Err(TitanError::RepositoryNotFound(_))
        ));
    }

    #[test]
    fn test_remotes() {
        let service = service();
        service.create_repository(repo("r1")).unwrap();
        service
            .add_remote("r1", Remote::Nop(NopRemote { name: "sink".to_string() }))
            .unwrap();

        assert_eq!(service.list_remotes("r1").unwrap().len(), 1);
        assert!(matches!(
            service.add_remote("r1", Remote::Nop(NopRemote { name: "sink".to_string() })),
            Err(TitanError::RemoteExists(_))
        ));

        service.remove_remote("r1", "sink").unwrap();
        assert!(matches!(
            service.get_remote("r1", "sink"),
            Err(TitanError::RemoteNotFound(_))
        ));
    }

    #[test]
    fn test_update_remote_requires_existing() {
        let service = service();
        service.create_repository(repo("r1")).unwrap();
        assert!(matches!(
            service.update_remote("r1", ssh_remote()),
            Err(TitanError::RemoteNotFound(_))
        ));
    }

    #[test]
    fn test_state_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let state_file = temp_dir.path().join("state").join("repositories.json");
        let registry = Arc::new(RemoteRegistry::new());

        {
            let service = RepositoryService::open(&state_file, registry.clone()).unwrap();
            service.create_repository(repo("r1")).unwrap();
            service.create_commit("r1", "c1", BTreeMap::new()).unwrap();
            service.add_remote("r1", ssh_remote()).unwrap();
        }

        let contents = std::fs::read_to_string(&state_file).unwrap();
        assert!(contents.contains("ssh://titan@backup.local:2222/srv/titan"));

        let reopened = RepositoryService::open(&state_file, registry).unwrap();
        assert_eq!(reopened.get_remote("r1", "origin").unwrap(), ssh_remote());
        assert!(reopened.get_commit("r1", "c1").is_ok());
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let service =
            RepositoryService::open(&blocker.join("state.json"), Arc::new(RemoteRegistry::new()))
                .unwrap();
        assert!(matches!(
            service.create_repository(repo("r1")),
            Err(TitanError::Io(_))
        ));
        assert!(matches!(
            service.get_repository("r1"),
            Err(TitanError::RepositoryNotFound(_))
        ));
        assert!(service.list_repositories().is_empty());
    }

    #[test]
    fn test_failed_write_keeps_existing_entries() {
        let temp_dir = TempDir::new().unwrap();
        let state_file = temp_dir.path().join("state.json");
        let service = RepositoryService::open(&state_file, Arc::new(RemoteRegistry::new())).unwrap();
        service.create_repository(repo("r1")).unwrap();

        // A directory in place of the state file makes every write fail
        std::fs::remove_file(&state_file).unwrap();
        std::fs::create_dir(&state_file).unwrap();

        assert!(service.create_commit("r1", "c1", BTreeMap::new()).is_err());
        assert!(matches!(
            service.get_commit("r1", "c1"),
            Err(TitanError::CommitNotFound(_))
        ));

        assert!(service.add_remote("r1", ssh_remote()).is_err());
        assert!(service.list_remotes("r1").unwrap().is_empty());

        assert!(service.delete_repository("r1").is_err());
        assert!(service.get_repository("r1").is_ok());
    }

    #[test]
    fn test_open_missing_state_file() {
        let temp_dir = TempDir::new().unwrap();
        let service =
            RepositoryService::open(&temp_dir.path().join("none.json"), Arc::new(RemoteRegistry::new()))
                .unwrap();
        assert!(service.list_repositories().is_empty());
    }
}
