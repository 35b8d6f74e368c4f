//! Two processes sharing one database and one bus: a change announced by
//! one must reach the other's caches.

mod common;

use common::TestBackend;
use refcache::domain::models::{PackageType, Registry, RegistryType, Repository, Space, UpstreamProxy, UpstreamSource};
use std::time::Duration;

#[tokio::test]
async fn test_space_rename_reaches_other_process() {
    let backend = TestBackend::new().await;
    let writer = backend.process().await;
    let reader = backend.process().await;

    let acme = writer.stores.spaces.create(&Space::new(None, "acme")).await.unwrap();
    assert_eq!(reader.service.spaces.find_by_ref("acme").await.unwrap().id, acme.id);
    let reader_calls = reader.space_calls.calls();

    let before = writer.service.spaces.find_by_id(acme.id).await.unwrap();
    writer.stores.spaces.rename(acme.id, "acme-corp").await.unwrap();
    writer.service.spaces.mark_changed(&before).await;

    let mut refreshed = false;
    for _ in 0..200 {
        if reader.service.spaces.find_by_id(acme.id).await.unwrap().path == "acme-corp" {
            refreshed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(refreshed, "reader kept serving the old path");
    assert!(reader.space_calls.calls() > reader_calls);
    assert!(reader.service.spaces.find_by_ref("acme").await.is_err());
}

#[tokio::test]
async fn test_repo_delete_reaches_other_process() {
    let backend = TestBackend::new().await;
    let writer = backend.process().await;
    let reader = backend.process().await;

    let acme = writer.stores.spaces.create(&Space::new(None, "acme")).await.unwrap();
    let repo = writer
        .stores
        .repos
        .create(&Repository::new(acme.id, &acme.path, "app"))
        .await
        .unwrap();
    reader.service.repos.find_by_ref("acme/app").await.unwrap();

    let core = writer.service.repos.find_by_id(repo.id).await.unwrap();
    writer.stores.repos.soft_delete(repo.id, 1_000).await.unwrap();
    writer.service.repos.mark_changed(&core).await;

    let mut gone = false;
    for _ in 0..200 {
        if reader.service.repos.find_by_ref("acme/app").await.is_err() {
            gone = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(gone, "reader still resolves the deleted repository");

    let deleted = reader.service.repos.find_deleted_by_ref("acme/app", 1_000).await.unwrap();
    assert_eq!(deleted.id, repo.id);
}

#[tokio::test]
async fn test_registry_change_drops_remote_upstream_proxy() {
    let backend = TestBackend::new().await;
    let writer = backend.process().await;
    let reader = backend.process().await;

    let acme = writer.stores.spaces.create(&Space::new(None, "acme")).await.unwrap();
    let registry = writer
        .stores
        .registries
        .create(&Registry::new(acme.id, acme.id, "hub", PackageType::Docker, RegistryType::Upstream))
        .await
        .unwrap();
    writer
        .stores
        .upstream_proxies
        .upsert(&UpstreamProxy::new(registry.id, "hub", UpstreamSource::Dockerhub, "https://registry-1.docker.io"))
        .await
        .unwrap();

    let cached = reader.service.upstream_proxies.find_by_registry_id(registry.id).await.unwrap();
    assert_eq!(cached.source, UpstreamSource::Dockerhub);

    writer
        .stores
        .upstream_proxies
        .upsert(&UpstreamProxy::new(registry.id, "hub", UpstreamSource::Custom, "https://mirror.example.com"))
        .await
        .unwrap();
    writer.service.registries.mark_changed(&registry).await;

    let proxies = &reader.service.upstream_proxies;
    let mut url = String::new();
    for _ in 0..200 {
        url = proxies.find_by_registry_id(registry.id).await.unwrap().url.clone();
        if url == "https://mirror.example.com" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(url, "https://mirror.example.com");
}

#[tokio::test]
async fn test_flush_is_local() {
    let backend = TestBackend::new().await;
    let first = backend.process().await;
    let second = backend.process().await;

    first.stores.spaces.create(&Space::new(None, "acme")).await.unwrap();
    first.service.spaces.find_by_ref("acme").await.unwrap();
    second.service.spaces.find_by_ref("acme").await.unwrap();
    let second_calls = second.space_calls.calls();

    first.service.flush().await;

    // Give a stray broadcast the chance to arrive before asserting it did not.
    tokio::time::sleep(Duration::from_millis(50)).await;
    second.service.spaces.find_by_ref("acme").await.unwrap();
    assert_eq!(second.space_calls.calls(), second_calls);

    first.service.spaces.find_by_ref("acme").await.unwrap();
    assert!(first.space_calls.calls() > 2);
}
