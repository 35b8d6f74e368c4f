//! In-memory stores counting every call, for finder tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{PackageType, Registry, RegistryType, Repository, Space, UpstreamProxy, UpstreamSource};
use crate::domain::paths::{self, PathTransformation};
use crate::domain::ports::{RegistryStore, RepoStore, SpaceStore, UpstreamProxyStore};

#[derive(Default)]
pub struct MemorySpaceStore {
    spaces: Mutex<HashMap<i64, Space>>,
    next_id: AtomicI64,
    calls: AtomicUsize,
    transformation: PathTransformation,
}

impl MemorySpaceStore {
    pub fn with_transformation(transformation: PathTransformation) -> Self {
        Self {
            transformation,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn insert(&self, parent: Option<&Space>, identifier: &str) -> Space {
        let parent_core = parent.map(Space::core);
        let mut space = Space::new(parent_core.as_ref(), identifier);
        space.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.spaces.lock().unwrap().insert(space.id, space.clone());
        space
    }

    pub fn rename(&self, id: i64, identifier: &str) -> Space {
        let mut spaces = self.spaces.lock().unwrap();
        let old_path = spaces[&id].path.clone();
        let new_path = paths::concat(
            paths::dissect_leaf(&old_path).map(|(parent, _)| parent).unwrap_or_default().as_str(),
            identifier,
        );
        for space in spaces.values_mut() {
            if space.path == old_path {
                space.identifier = identifier.to_string();
                space.path.clone_from(&new_path);
            } else if let Some(rest) = space.path.strip_prefix(&format!("{old_path}/")) {
                space.path = paths::concat(&new_path, rest);
            }
        }
        spaces[&id].clone()
    }

    pub fn path_of(&self, id: i64) -> Option<String> {
        self.spaces.lock().unwrap().get(&id).map(|s| s.path.clone())
    }
}

#[async_trait]
impl SpaceStore for MemorySpaceStore {
    async fn find(&self, id: i64) -> DomainResult<Space> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.spaces
            .lock()
            .unwrap()
            .get(&id)
            .filter(|s| s.deleted.is_none())
            .cloned()
            .ok_or_else(|| DomainError::not_found("space", id))
    }

    async fn find_id_by_path(&self, normalized_path: &str) -> DomainResult<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.spaces
            .lock()
            .unwrap()
            .values()
            .find(|s| s.deleted.is_none() && self.transformation.apply(&s.path) == normalized_path)
            .map(|s| s.id)
            .ok_or_else(|| DomainError::not_found("space", normalized_path))
    }

    async fn create(&self, space: &Space) -> DomainResult<Space> {
        let mut space = space.clone();
        space.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.spaces.lock().unwrap().insert(space.id, space.clone());
        Ok(space)
    }

    async fn rename(&self, id: i64, identifier: &str) -> DomainResult<Space> {
        Ok(Self::rename(self, id, identifier))
    }

    async fn soft_delete(&self, id: i64, deleted_at: i64) -> DomainResult<()> {
        if let Some(space) = self.spaces.lock().unwrap().get_mut(&id) {
            space.deleted = Some(deleted_at);
        }
        Ok(())
    }
}

pub struct MemoryRepoStore {
    spaces: Arc<MemorySpaceStore>,
    repos: Mutex<HashMap<i64, Repository>>,
    next_id: AtomicI64,
    calls: AtomicUsize,
}

impl MemoryRepoStore {
    pub fn new(spaces: Arc<MemorySpaceStore>) -> Self {
        Self {
            spaces,
            repos: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(100),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn insert(&self, space: &Space, identifier: &str) -> Repository {
        let mut repo = Repository::new(space.id, &space.path, identifier);
        repo.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.repos.lock().unwrap().insert(repo.id, repo.clone());
        repo
    }

    pub fn delete(&self, id: i64, deleted_at: i64) {
        if let Some(repo) = self.repos.lock().unwrap().get_mut(&id) {
            repo.deleted = Some(deleted_at);
        }
    }

    fn with_current_path(&self, mut repo: Repository) -> Repository {
        if let Some(space_path) = self.spaces.path_of(repo.parent_id) {
            repo.path = paths::concat(&space_path, &repo.identifier);
        }
        repo
    }

    fn matching(&self, predicate: impl Fn(&Repository) -> bool) -> Option<Repository> {
        let repo = self.repos.lock().unwrap().values().find(|r| predicate(r)).cloned();
        repo.map(|r| self.with_current_path(r))
    }
}

#[async_trait]
impl RepoStore for MemoryRepoStore {
    async fn find(&self, id: i64) -> DomainResult<Repository> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.matching(|r| r.id == id && r.deleted.is_none())
            .ok_or_else(|| DomainError::not_found("repo", id))
    }

    async fn find_id_by_identifier(&self, space_id: i64, identifier: &str) -> DomainResult<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.matching(|r| {
            r.parent_id == space_id && r.deleted.is_none() && r.identifier.eq_ignore_ascii_case(identifier)
        })
        .map(|r| r.id)
        .ok_or_else(|| DomainError::not_found("repo", identifier))
    }

    async fn find_deleted(&self, id: i64, deleted_at: i64) -> DomainResult<Repository> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.matching(|r| r.id == id && r.deleted == Some(deleted_at))
            .ok_or_else(|| DomainError::not_found("repo", id))
    }

    async fn find_deleted_by_identifier(
        &self,
        space_id: i64,
        identifier: &str,
        deleted_at: i64,
    ) -> DomainResult<Repository> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.matching(|r| {
            r.parent_id == space_id
                && r.deleted == Some(deleted_at)
                && r.identifier.eq_ignore_ascii_case(identifier)
        })
        .ok_or_else(|| DomainError::not_found("repo", identifier))
    }

    async fn create(&self, repo: &Repository) -> DomainResult<Repository> {
        let mut repo = repo.clone();
        repo.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.repos.lock().unwrap().insert(repo.id, repo.clone());
        Ok(repo)
    }

    async fn soft_delete(&self, id: i64, deleted_at: i64) -> DomainResult<()> {
        self.delete(id, deleted_at);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRegistryStore {
    registries: Mutex<HashMap<i64, Registry>>,
    next_id: AtomicI64,
    calls: AtomicUsize,
}

impl MemoryRegistryStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn insert(&self, root: &Space, name: &str, registry_type: RegistryType) -> Registry {
        let mut registry = Registry::new(root.id, root.id, name, PackageType::Docker, registry_type);
        registry.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.registries.lock().unwrap().insert(registry.id, registry.clone());
        registry
    }

    pub fn set_description(&self, id: i64, description: &str) {
        if let Some(registry) = self.registries.lock().unwrap().get_mut(&id) {
            registry.description = description.to_string();
        }
    }
}

#[async_trait]
impl RegistryStore for MemoryRegistryStore {
    async fn get(&self, id: i64) -> DomainResult<Registry> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.registries
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("registry", id))
    }

    async fn get_id_by_root_parent_id_and_name(&self, root_parent_id: i64, name: &str) -> DomainResult<i64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.registries
            .lock()
            .unwrap()
            .values()
            .find(|r| r.root_parent_id == root_parent_id && r.name.eq_ignore_ascii_case(name))
            .map(|r| r.id)
            .ok_or_else(|| DomainError::not_found("registry", name))
    }

    async fn create(&self, registry: &Registry) -> DomainResult<Registry> {
        let mut registry = registry.clone();
        registry.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.registries.lock().unwrap().insert(registry.id, registry.clone());
        Ok(registry)
    }

    async fn update(&self, registry: &Registry) -> DomainResult<()> {
        self.registries.lock().unwrap().insert(registry.id, registry.clone());
        Ok(())
    }

    async fn delete(&self, id: i64) -> DomainResult<()> {
        self.registries.lock().unwrap().remove(&id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUpstreamProxyStore {
    proxies: Mutex<HashMap<i64, UpstreamProxy>>,
    calls: AtomicUsize,
}

impl MemoryUpstreamProxyStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn insert(&self, registry: &Registry, url: &str) -> UpstreamProxy {
        let mut proxy = UpstreamProxy::new(registry.id, &registry.name, UpstreamSource::Dockerhub, url);
        proxy.id = registry.id;
        self.proxies.lock().unwrap().insert(registry.id, proxy.clone());
        proxy
    }
}

#[async_trait]
impl UpstreamProxyStore for MemoryUpstreamProxyStore {
    async fn get_by_registry_id(&self, registry_id: i64) -> DomainResult<UpstreamProxy> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.proxies
            .lock()
            .unwrap()
            .get(&registry_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("upstream-proxy", registry_id))
    }

    async fn upsert(&self, proxy: &UpstreamProxy) -> DomainResult<UpstreamProxy> {
        self.proxies.lock().unwrap().insert(proxy.registry_id, proxy.clone());
        Ok(proxy.clone())
    }
}
