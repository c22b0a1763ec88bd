//! The reqwest-backed API channel against a mock firewall.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use netbackup::backup::{
    CredentialResolver, DeviceCatalog, DeviceRecord, DeviceStatus, HttpAdapter, HttpGetter,
    HttpSettings, Orchestrator, ReqwestGetter, RunSettings, ShellAdapter, ShellExecutor,
    ShellRequest,
};
use netbackup::error::FetchError;
use netbackup::platform::PlatformRegistry;
use netbackup::secrets::SecretStore;
use netbackup::storage::BackupStore;

const BACKUP_PATH: &str = "/api/v2/monitor/system/config/backup";
const CONFIG: &str = "#config-version=FGT60F-7.2.5\nconfig system global\n    set hostname \"edge-fw\"\nend\n";

struct NoShell;

#[async_trait]
impl ShellExecutor for NoShell {
    async fn execute(&self, _request: ShellRequest<'_>) -> Result<String, FetchError> {
        Err(FetchError::Connection("no shell devices in this test".to_string()))
    }
}

fn plain_http_catalog() -> DeviceCatalog {
    DeviceCatalog::from_yaml(
        r#"
http:
  fortinet:
    scheme: http
    path: /api/v2/monitor/system/config/backup?scope=global&access_token=
"#,
    )
    .unwrap()
}

fn orchestrator(root: &std::path::Path, getter: ReqwestGetter, reject: bool) -> Orchestrator {
    Orchestrator::new(
        Arc::new(plain_http_catalog()),
        CredentialResolver::new(
            Arc::new(SecretStore::from_pairs([("FW_TOKEN", "tok123")])),
            false,
        ),
        ShellAdapter::new(Arc::new(NoShell), Arc::new(PlatformRegistry::with_builtins())),
        HttpAdapter::new(Arc::new(getter), reject),
        BackupStore::new(root, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()),
        RunSettings::default(),
    )
}

#[tokio::test]
async fn test_getter_returns_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BACKUP_PATH))
        .and(query_param("scope", "global"))
        .and(query_param("access_token", "tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CONFIG))
        .expect(1)
        .mount(&server)
        .await;

    let getter = ReqwestGetter::new(&HttpSettings::default()).unwrap();
    let response = getter
        .get(&format!(
            "{}{}?scope=global&access_token=tok123",
            server.uri(),
            BACKUP_PATH
        ))
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.status, 200);
    assert_eq!(response.body, CONFIG);
}

#[tokio::test]
async fn test_getter_passes_error_status_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("{\"status\":\"error\"}"))
        .mount(&server)
        .await;

    let getter = ReqwestGetter::new(&HttpSettings::default()).unwrap();
    let response = getter.get(&format!("{}/anything", server.uri())).await.unwrap();

    assert!(!response.is_success());
    assert_eq!(response.status, 403);
    assert_eq!(response.body, "{\"status\":\"error\"}");
}

#[tokio::test]
async fn test_getter_transport_error_hides_token() {
    let port = closed_port();

    let getter = ReqwestGetter::new(&HttpSettings::default()).unwrap();
    let err = getter
        .get(&format!(
            "http://127.0.0.1:{port}{BACKUP_PATH}?scope=global&access_token=topsecret"
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Transport(_)));
    assert!(!err.to_string().contains("topsecret"));
}

fn closed_port() -> u16 {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_backup_through_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BACKUP_PATH))
        .and(query_param("access_token", "tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CONFIG))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let getter = ReqwestGetter::new(&HttpSettings::default()).unwrap();
    let report = orchestrator(dir.path(), getter, false)
        .run(
            "Example Corp",
            vec![DeviceRecord::new(
                "edge-fw",
                server.address().to_string(),
                "fortinet",
                "FW_TOKEN",
            )],
            CancellationToken::new(),
        )
        .await;

    assert_eq!(report.outcomes[0].status, DeviceStatus::Ok);
    let saved = std::fs::read_to_string(dir.path().join("20240307/edge-fw.txt")).unwrap();
    assert_eq!(saved, CONFIG);
}

#[tokio::test]
async fn test_rejected_status_through_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let getter = ReqwestGetter::new(&HttpSettings::default()).unwrap();
    let report = orchestrator(dir.path(), getter, true)
        .run(
            "Example Corp",
            vec![DeviceRecord::new(
                "edge-fw",
                server.address().to_string(),
                "fortinet",
                "FW_TOKEN",
            )],
            CancellationToken::new(),
        )
        .await;

    assert_eq!(report.outcomes[0].status, DeviceStatus::NotOk);
    assert_eq!(report.outcomes[0].error.as_deref(), Some("HTTP status 401"));
    assert!(!dir.path().join("20240307/edge-fw.txt").exists());
}

#[tokio::test]
async fn test_unreachable_api_is_not_ok() {
    let dir = tempfile::tempdir().unwrap();
    let getter = ReqwestGetter::new(&HttpSettings::default()).unwrap();
    let report = orchestrator(dir.path(), getter, false)
        .run(
            "Example Corp",
            vec![DeviceRecord::new(
                "fw1",
                format!("127.0.0.1:{}", closed_port()),
                "fortinet",
                "FW_TOKEN",
            )],
            CancellationToken::new(),
        )
        .await;

    assert_eq!(report.outcomes.len(), 1);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, DeviceStatus::NotOk);
    assert!(outcome.error.as_deref().unwrap().starts_with("transport error"));
    assert!(!outcome.error.as_deref().unwrap().contains("tok123"));
    assert!(!dir.path().join("20240307/fw1.txt").exists());
}
