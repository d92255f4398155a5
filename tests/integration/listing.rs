//! Integration tests for the popularity listing phase

use mockito::Matcher;
use plugin_harvester::fetcher::RegistryClient;
use plugin_harvester::registry::PopularLister;
use serde_json::json;

/// Register a listing mock for one page number.
async fn mock_page(server: &mut mockito::ServerGuard, page: u32, body: String) -> mockito::Mock {
    server
        .mock("GET", "/")
        .match_query(Matcher::Regex(format!(
            r"action=query_plugins.*request\[page\]={page}(&|$)"
        )))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

fn page_body(items: serde_json::Value) -> String {
    json!({ "info": {"results": 2}, "plugins": items }).to_string()
}

#[tokio::test]
async fn duplicate_slugs_keep_the_greatest_install_count() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = [
        mock_page(
            &mut server,
            1,
            page_body(json!([{"slug": "dup", "name": "Dup", "active_installs": 5}])),
        )
        .await,
        mock_page(
            &mut server,
            2,
            page_body(json!([{"slug": "dup", "name": "Dup", "active_installs": 20}])),
        )
        .await,
        mock_page(
            &mut server,
            3,
            page_body(json!([{"slug": "dup", "name": "Dup", "active_installs": 15}])),
        )
        .await,
    ];

    let lister = PopularLister::new(RegistryClient::new()).with_base_url(server.url());
    let plugins = lister.list_popular(1, 3, 100, 3).await;

    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0].active_installs, 20);
    assert_eq!(plugins[0].page, 2);
}

#[tokio::test]
async fn listing_is_ranked_by_install_count_descending() {
    let mut server = mockito::Server::new_async().await;
    let _mocks = [
        mock_page(
            &mut server,
            1,
            page_body(json!([
                {"slug": "mid", "name": "Mid", "active_installs": 50_000},
                {"slug": "small", "name": "Small", "active_installs": 12_000}
            ])),
        )
        .await,
        mock_page(
            &mut server,
            2,
            page_body(json!([
                {"slug": "big", "name": "Big", "active_installs": 900_000},
                {"slug": "tiny", "name": "Tiny", "active_installs": 11_000}
            ])),
        )
        .await,
    ];

    let lister = PopularLister::new(RegistryClient::new()).with_base_url(server.url());
    let plugins = lister.list_popular(10_000, 2, 100, 2).await;

    let counts: Vec<u64> = plugins.iter().map(|p| p.active_installs).collect();
    for pair in counts.windows(2) {
        assert!(pair[0] >= pair[1], "not non-increasing: {counts:?}");
    }
    assert_eq!(plugins[0].slug, "big");
}

#[tokio::test]
async fn threshold_filters_below_minimum_installs() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_page(
        &mut server,
        1,
        page_body(json!([
            {"slug": "kept", "name": "Kept", "active_installs": 10_000},
            {"slug": "dropped", "name": "Dropped", "active_installs": 9_999}
        ])),
    )
    .await;

    let lister = PopularLister::new(RegistryClient::new()).with_base_url(server.url());
    let plugins = lister.list_popular(10_000, 1, 100, 1).await;

    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0].slug, "kept");
}

#[tokio::test]
async fn malformed_page_contributes_nothing_but_does_not_abort_the_run() {
    let mut server = mockito::Server::new_async().await;
    let mut mocks = Vec::new();
    mocks.push(mock_page(&mut server, 1, json!({"error": "server hiccup"}).to_string()).await);
    for page in 2..=5 {
        mocks.push(
            mock_page(
                &mut server,
                page,
                page_body(json!([
                    {"slug": format!("plugin-{page}"), "name": "P", "active_installs": 20_000}
                ])),
            )
            .await,
        );
    }

    let lister = PopularLister::new(RegistryClient::new()).with_base_url(server.url());
    let plugins = lister.list_popular(10_000, 5, 100, 5).await;

    // 4 healthy pages' worth of candidates, the malformed page tolerated.
    assert_eq!(plugins.len(), 4);
    assert!(!plugins.iter().any(|p| p.page == 1));
}

#[tokio::test]
async fn permanently_failing_page_is_tolerated_silently() {
    let mut server = mockito::Server::new_async().await;
    let _failing = server
        .mock("GET", "/")
        .match_query(Matcher::Regex(r"request\[page\]=1(&|$)".to_string()))
        .with_status(500)
        .create_async()
        .await;
    let _healthy = mock_page(
        &mut server,
        2,
        page_body(json!([{"slug": "survivor", "name": "S", "active_installs": 15_000}])),
    )
    .await;

    let client = RegistryClient::new().with_max_attempts(1);
    let lister = PopularLister::new(client).with_base_url(server.url());
    let plugins = lister.list_popular(10_000, 2, 100, 2).await;

    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0].slug, "survivor");
}

#[tokio::test]
async fn missing_identifiers_are_skipped() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_page(
        &mut server,
        1,
        page_body(json!([
            {"name": "No Slug", "active_installs": 99_000},
            {"slug": "named", "name": "Named", "active_installs": 88_000}
        ])),
    )
    .await;

    let lister = PopularLister::new(RegistryClient::new()).with_base_url(server.url());
    let plugins = lister.list_popular(10_000, 1, 100, 1).await;

    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0].slug, "named");
}
