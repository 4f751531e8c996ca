//! The daemon against mocked package manager and Grafana HTTP APIs.

use monsync_daemon::config::{DaemonConfig, StateConfig};
use monsync_daemon::error::InventoryError;
use monsync_daemon::{Daemon, DappmanagerClient, InventorySource};
use monsync_types::Package;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn inventory_client(server: &MockServer) -> DappmanagerClient {
    DappmanagerClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

async fn mount_prysm_inventory(server: &MockServer, manifest_version: &str) {
    Mock::given(method("GET"))
        .and(path("/public-packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "prysm.dnp.dappnode.eth",
                "version": "0.1.0",
                "state": "running",
                "ip": "172.33.0.5"
            }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/package-manifest/prysm.dnp.dappnode.eth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "prysm.dnp.dappnode.eth",
            "version": manifest_version,
            "grafanaDashboards": [{ "title": "Prysm", "panels": [] }],
            "prometheusTargets": [
                { "targets": ["prysm.dappnode:8080"], "labels": { "job": "prysm" } }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn lists_packages_ignoring_extra_fields() {
    let server = MockServer::start().await;
    mount_prysm_inventory(&server, "0.1.0").await;

    let packages = inventory_client(&server).list_packages().await.unwrap();
    assert_eq!(packages, vec![Package::new("prysm.dnp.dappnode.eth", "0.1.0")]);
}

#[tokio::test]
async fn fetches_the_matching_manifest() {
    let server = MockServer::start().await;
    mount_prysm_inventory(&server, "0.1.0").await;

    let manifest = inventory_client(&server)
        .fetch_manifest(&Package::new("prysm.dnp.dappnode.eth", "0.1.0"))
        .await
        .unwrap();
    assert_eq!(manifest
            .grafana_dashboards
            .and_then(|d| d.as_array().map(Vec::len)), Some(1));
}

#[tokio::test]
async fn rejects_a_manifest_for_another_version() {
    let server = MockServer::start().await;
    mount_prysm_inventory(&server, "0.2.0").await;

    let err = inventory_client(&server)
        .fetch_manifest(&Package::new("prysm.dnp.dappnode.eth", "0.1.0"))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::ManifestMismatch(_)));
}

#[tokio::test]
async fn surfaces_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = inventory_client(&server).list_packages().await.unwrap_err();
    match err {
        InventoryError::Api { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "bad gateway");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn sync_once_end_to_end() {
    let inventory = MockServer::start().await;
    mount_prysm_inventory(&inventory, "0.1.0").await;

    let grafana = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/folders/prysm"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&grafana)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/folders"))
        .and(body_partial_json(json!({ "uid": "prysm", "title": "prysm" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "uid": "prysm", "title": "prysm", "url": "/dashboards/f/prysm/prysm"
        })))
        .expect(1)
        .mount(&grafana)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboards/uid/prysm-0"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&grafana)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/dashboards/db"))
        .and(header("authorization", "Bearer token"))
        .and(body_partial_json(json!({
            "dashboard": { "uid": "prysm-0", "title": "Prysm" },
            "folderId": 3,
            "overwrite": true,
            "message": "Automatic update to version 0.1.0"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 11, "uid": "prysm-0", "status": "success", "version": 1, "slug": "prysm"
        })))
        .expect(1)
        .mount(&grafana)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = DaemonConfig::default();
    config.grafana.url = grafana.uri();
    config.grafana.token = Some("token".to_string());
    config.inventory.url = inventory.uri();
    config.targets.dir = dir.path().join("targets");
    config.state = StateConfig::Json {
        path: dir.path().join("db.json"),
    };

    let daemon = Daemon::new(config).unwrap();
    let report = daemon.sync_once().await.unwrap();
    assert_eq!(report.updated, ["prysm.dnp.dappnode.eth"]);
    assert!(report.failed.is_empty());

    let record = daemon
        .state()
        .get("prysm.dnp.dappnode.eth")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.applied_version("prysm-0"), Some(1));

    let targets = daemon.targets().list_targets().await.unwrap();
    assert_eq!(targets[0].targets[0].job(), Some("prysm"));

    // Nothing changed: no further calls to Grafana.
    let report = daemon.sync_once().await.unwrap();
    assert!(report.is_empty());
}
