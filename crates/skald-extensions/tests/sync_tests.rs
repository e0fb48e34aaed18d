//! Gallery sync, auto-update and gallery-facing query tests

mod common;

use common::*;
use skald_core::error::Error;
use skald_core::types::ExtensionsSettings;
use skald_extensions::{ExtensionState, Facets};
use std::time::Duration;

fn auto_update_settings() -> ExtensionsSettings {
    ExtensionsSettings {
        auto_update: true,
        auto_update_delay_ms: 10,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_update_checks_share_one_sync() {
    let h = Harness::builder()
        .installed(vec![LocalBuilder::new("pub.a").gallery_uuid("u-a").build()])
        .gallery(vec![gallery("pub.a", "u-a", "2.0.0")])
        .build()
        .await;
    h.gallery.set_query_delay(Duration::from_millis(50));

    let (first, second) = tokio::join!(
        h.service.check_for_updates(),
        h.service.check_for_updates()
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(h.gallery.query_count(), 1);
    h.service.dispose();
}

#[tokio::test(start_paused = true)]
async fn test_check_during_running_sync_queues_one_follow_up() {
    let h = Harness::builder()
        .installed(vec![LocalBuilder::new("pub.a").gallery_uuid("u-a").build()])
        .gallery(vec![gallery("pub.a", "u-a", "2.0.0")])
        .build()
        .await;
    h.gallery.set_query_delay(Duration::from_millis(50));

    let service = h.service.clone();
    let first = tokio::spawn(async move { service.check_for_updates().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.gallery.query_count(), 1);

    let second =
        tokio::time::timeout(Duration::from_secs(600), h.service.check_for_updates()).await;

    assert!(matches!(second, Ok(Ok(()))));
    assert!(first.await.unwrap().is_ok());
    assert_eq!(h.gallery.query_count(), 2);
    h.service.dispose();
}

#[tokio::test]
async fn test_sync_queries_by_uuid_then_by_name() {
    let h = Harness::builder()
        .installed(vec![
            LocalBuilder::new("pub.a").gallery_uuid("u-a").build(),
            local("pub.b", "1.0.0"),
            LocalBuilder::new("host.core").system().build(),
        ])
        .gallery(vec![
            gallery("pub.a", "u-a", "2.0.0"),
            gallery("pub.b", "u-b", "1.5.0"),
        ])
        .build()
        .await;

    h.service.check_for_updates().await.unwrap();

    let queries = h.gallery.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].ids, vec!["u-a".to_string()]);
    assert_eq!(queries[1].names, vec!["pub.b".to_string()]);

    let a = h.entity("pub.a");
    assert!(matches!(a.facets(), Facets::Both { .. }));
    assert!(a.outdated());
    assert_eq!(a.latest_version(), "2.0.0");

    let b = h.entity("pub.b");
    assert_eq!(b.uuid().as_deref(), Some("u-b"));
    assert!(b.outdated());
    assert!(matches!(h.entity("host.core").facets(), Facets::Local(_)));
    h.service.dispose();
}

#[tokio::test]
async fn test_renamed_extension_is_matched_by_uuid() {
    let h = Harness::builder()
        .installed(vec![LocalBuilder::new("pub.old").gallery_uuid("u-x").build()])
        .gallery(vec![gallery("pub.renamed", "u-x", "1.0.0")])
        .build()
        .await;
    let handle = h.entity("pub.old").handle();

    h.service.check_for_updates().await.unwrap();

    let renamed = h.service.get("pub.renamed").expect("merged entity");
    assert_eq!(renamed.handle(), handle);
    assert_eq!(h.service.installed().len(), 1);
    h.service.dispose();
}

#[tokio::test]
async fn test_gallery_record_without_uuid_matches_installed_by_id() {
    let h = Harness::builder()
        .installed(vec![LocalBuilder::new("pub.a").gallery_uuid("u-a").build()])
        .gallery(vec![GalleryBuilder::new("pub.a", "u-a")
            .without_uuid()
            .version("2.0.0")
            .build()])
        .build()
        .await;
    let handle = h.entity("pub.a").handle();

    let page = h.service.search("pub", 0).await.unwrap();

    assert_eq!(page.items.len(), 1);
    let item = &page.items[0];
    assert_eq!(item.handle(), handle);
    assert_eq!(h.service.state_of(item), ExtensionState::Installed);
    assert!(item.outdated());
    assert_eq!(h.service.installed().len(), 1);
    h.service.dispose();
}

#[tokio::test]
async fn test_incompatible_gallery_version_is_not_attached() {
    let h = Harness::builder()
        .installed(vec![LocalBuilder::new("pub.a").gallery_uuid("u-a").build()])
        .gallery(vec![GalleryBuilder::new("pub.a", "u-a")
            .version("3.0.0")
            .engine("^9.0")
            .build()])
        .build()
        .await;
    h.gallery.set_compatible("pub.a", None);

    h.service.check_for_updates().await.unwrap();

    let a = h.entity("pub.a");
    assert!(matches!(a.facets(), Facets::Local(_)));
    assert!(!a.outdated());
    h.service.dispose();
}

#[tokio::test]
async fn test_newest_compatible_version_is_attached() {
    let h = Harness::builder()
        .installed(vec![LocalBuilder::new("pub.a").gallery_uuid("u-a").build()])
        .gallery(vec![GalleryBuilder::new("pub.a", "u-a")
            .version("3.0.0")
            .engine("^9.0")
            .build()])
        .build()
        .await;
    h.gallery
        .set_compatible("pub.a", Some(gallery("pub.a", "u-a", "1.5.0")));

    h.service.check_for_updates().await.unwrap();

    assert_eq!(h.entity("pub.a").latest_version(), "1.5.0");
    h.service.dispose();
}

#[tokio::test]
async fn test_unreachable_gallery_is_not_an_error() {
    let h = Harness::builder()
        .installed(vec![LocalBuilder::new("pub.a").gallery_uuid("u-a").build()])
        .build()
        .await;
    h.gallery.fail_with(Some(GalleryFailure::Unreachable));

    assert!(h.service.check_for_updates().await.is_ok());

    let page = h.service.search("pub", 0).await.unwrap();
    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());
    h.service.dispose();
}

#[tokio::test]
async fn test_broken_gallery_is_reported() {
    let h = Harness::builder()
        .installed(vec![LocalBuilder::new("pub.a").gallery_uuid("u-a").build()])
        .build()
        .await;
    h.gallery.fail_with(Some(GalleryFailure::Broken));

    let check = h.service.check_for_updates().await;
    assert!(check.unwrap_err().to_string().contains("HTTP 500"));
    assert!(matches!(h.service.search("pub", 0).await, Err(Error::Other(_))));

    // A later successful sync clears the error
    h.gallery.fail_with(None);
    assert!(h.service.check_for_updates().await.is_ok());
    h.service.dispose();
}

#[tokio::test]
async fn test_search_pages_with_configured_size() {
    let records = ["pub.a", "pub.b", "pub.c", "pub.d", "pub.e"]
        .iter()
        .enumerate()
        .map(|(i, id)| gallery(id, &format!("u-{}", i), "1.0.0"))
        .collect();
    let h = Harness::builder()
        .gallery(records)
        .settings(ExtensionsSettings {
            auto_update: false,
            gallery_page_size: 2,
            ..Default::default()
        })
        .build()
        .await;

    let page = h.service.search("pub", 1).await.unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(page.page, 1);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.page_count(), 3);
    assert_eq!(page.items[0].id(), "pub.c");
}

#[tokio::test]
async fn test_auto_update_reinstalls_outdated_extensions() {
    let h = Harness::builder()
        .installed(vec![
            LocalBuilder::new("pub.a").gallery_uuid("u-a").build(),
            LocalBuilder::new("pub.b").gallery_uuid("u-b").version("2.0.0").build(),
        ])
        .gallery(vec![
            gallery("pub.a", "u-a", "2.0.0"),
            gallery("pub.b", "u-b", "2.0.0"),
        ])
        .settings(auto_update_settings())
        .build()
        .await;
    h.service.listen();

    h.service.check_for_updates().await.unwrap();

    assert!(
        h.wait_until(|h| h.entity("pub.a").version() == "2.0.0")
            .await
    );
    assert_eq!(h.inventory.calls(), vec!["install:pub.a@2.0.0".to_string()]);
    assert!(h.wait_until(|h| !h.telemetry.events().is_empty()).await);
    assert_eq!(h.telemetry.names(), vec!["extension_gallery:update"]);
    h.service.dispose();
}

#[tokio::test]
async fn test_auto_update_respects_setting() {
    let h = Harness::builder()
        .installed(vec![LocalBuilder::new("pub.a").gallery_uuid("u-a").build()])
        .gallery(vec![gallery("pub.a", "u-a", "2.0.0")])
        .settings(ExtensionsSettings {
            auto_update: false,
            auto_update_delay_ms: 10,
            ..Default::default()
        })
        .build()
        .await;

    h.service.check_for_updates().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(h.inventory.calls().is_empty());
    assert!(h.entity("pub.a").outdated());
    h.service.dispose();
}

#[tokio::test]
async fn test_turning_auto_update_on_triggers_update() {
    let h = Harness::builder()
        .installed(vec![LocalBuilder::new("pub.a").gallery_uuid("u-a").build()])
        .gallery(vec![gallery("pub.a", "u-a", "2.0.0")])
        .build()
        .await;
    h.service.listen();

    h.settings.send_replace(auto_update_settings());

    assert!(
        h.wait_until(|h| !h.inventory.calls().is_empty())
            .await
    );
    assert_eq!(h.inventory.calls(), vec!["install:pub.a@2.0.0".to_string()]);
    h.service.dispose();
}

#[tokio::test]
async fn test_failed_auto_update_leaves_extension_outdated() {
    let h = Harness::builder()
        .installed(vec![LocalBuilder::new("pub.a").gallery_uuid("u-a").build()])
        .gallery(vec![gallery("pub.a", "u-a", "2.0.0")])
        .settings(auto_update_settings())
        .build()
        .await;
    h.inventory.fail_installs_of("pub.a");
    h.service.listen();

    h.service.check_for_updates().await.unwrap();

    assert!(h.wait_until(|h| !h.telemetry.events().is_empty()).await);
    assert!(!h.telemetry.events()[0].success());
    assert_eq!(h.entity("pub.a").version(), "1.0.0");
    assert!(h.entity("pub.a").outdated());
    h.service.dispose();
}

#[tokio::test]
async fn test_start_runs_initial_sync() {
    let h = Harness::builder()
        .installed(vec![LocalBuilder::new("pub.a").gallery_uuid("u-a").build()])
        .gallery(vec![gallery("pub.a", "u-a", "1.0.0")])
        .build()
        .await;

    h.service.start();

    assert!(h.wait_until(|h| h.gallery.query_count() == 1).await);
    h.service.dispose();
}

#[tokio::test]
async fn test_checks_after_dispose_do_nothing() {
    let h = Harness::builder()
        .installed(vec![LocalBuilder::new("pub.a").gallery_uuid("u-a").build()])
        .gallery(vec![gallery("pub.a", "u-a", "2.0.0")])
        .build()
        .await;

    h.service.dispose();

    assert!(h.service.check_for_updates().await.is_ok());
    assert_eq!(h.gallery.query_count(), 0);
}

#[tokio::test]
async fn test_open_url_resolves_installed_then_gallery() {
    let h = Harness::builder()
        .installed(vec![local("pub.a", "1.0.0")])
        .gallery(vec![gallery("pub.b", "u-b", "1.0.0")])
        .build()
        .await;

    let a = h.service.open_url("skald://extension/Pub.A").await.unwrap();
    assert_eq!(a.id(), "pub.a");
    assert_eq!(h.gallery.query_count(), 0);

    let b = h.service.open_url("skald://extension/pub.b").await.unwrap();
    assert!(matches!(b.facets(), Facets::Gallery(_)));

    assert!(h.service.open_url("skald://extension/pub.ghost").await.is_none());
    assert_eq!(h.notifier.errors(), vec!["Unknown extension: pub.ghost".to_string()]);

    assert!(h.service.open_url("https://example.com/pub.b").await.is_none());
    assert_eq!(h.notifier.errors().len(), 1);
}

#[tokio::test]
async fn test_open_url_surfaces_only_real_failures() {
    let h = Harness::builder().build().await;

    h.gallery.fail_with(Some(GalleryFailure::Unreachable));
    assert!(h.service.open_url("skald://extension/pub.b").await.is_none());
    assert!(h.notifier.errors().is_empty());

    h.gallery.fail_with(Some(GalleryFailure::Broken));
    assert!(h.service.open_url("skald://extension/pub.b").await.is_none());
    assert_eq!(h.notifier.errors().len(), 1);
}

#[tokio::test]
async fn test_companion_recommendations_skip_installed() {
    let h = Harness::builder()
        .installed(vec![local("pub.a", "1.0.0"), local("pub.b", "1.0.0")])
        .companions(StaticCompanions::default().with("pub.a", &["Pub.B", "pub.c"]))
        .build()
        .await;

    assert_eq!(
        h.service.companion_recommendations("PUB.A"),
        vec!["pub.c".to_string()]
    );
    assert!(h.service.companion_recommendations("pub.b").is_empty());
}

#[tokio::test]
async fn test_dependency_tree_stops_at_cycles() {
    let h = Harness::builder()
        .installed(vec![
            LocalBuilder::new("pub.a").depends_on(&["pub.b"]).build(),
            LocalBuilder::new("pub.b").depends_on(&["pub.a", "pub.missing"]).build(),
            local("pub.leaf", "1.0.0"),
        ])
        .build()
        .await;

    let root = h
        .service
        .load_dependencies(&h.entity("pub.a"))
        .await
        .unwrap()
        .expect("pub.a declares dependencies");
    assert!(root.has_dependencies());

    let children = root.dependencies();
    assert_eq!(children.len(), 1);
    let b = &children[0];
    assert_eq!(b.identifier(), "pub.b");
    assert_eq!(b.depth(), 1);

    let grandchildren = b.dependencies();
    assert_eq!(grandchildren.len(), 2);
    assert_eq!(grandchildren[0].identifier(), "pub.a");
    assert!(!grandchildren[0].has_dependencies());
    assert!(grandchildren[0].dependencies().is_empty());
    assert!(grandchildren[1].extension().is_none());

    assert!(h
        .service
        .load_dependencies(&h.entity("pub.leaf"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_dependency_tree_resolves_gallery_dependencies() {
    let h = Harness::builder()
        .gallery(vec![
            GalleryBuilder::new("pub.x", "u-x").depends_on(&["pub.y"]).build(),
            GalleryBuilder::new("pub.y", "u-y").build(),
        ])
        .build()
        .await;

    let x = h.service.search("pub.x", 0).await.unwrap().items[0].clone();
    let root = h.service.load_dependencies(&x).await.unwrap().unwrap();

    let children = root.dependencies();
    assert_eq!(children.len(), 1);
    let y = children[0].extension().expect("resolved from the gallery");
    assert!(matches!(y.facets(), Facets::Gallery(_)));
}
