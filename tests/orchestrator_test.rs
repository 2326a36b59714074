mod common;

use async_trait::async_trait;
use ccpkg::catalog::{CatalogClient, PackageManifest, PackageSource};
use ccpkg::config::TransportConfig;
use ccpkg::driver::DriverDescriptor;
use ccpkg::error::{Error, Result};
use ccpkg::fetcher::{ResumableFetcher, RetryPolicy};
use ccpkg::http;
use ccpkg::orchestrator::{
    self, DownloadJob, EntryOutcome, FileReport, RunObserver, RunStatus, SilentObserver,
};
use ccpkg::platform::Platform;
use ccpkg::resolver::{self, PlanEntry, ResolvedDownloadPlan};
use httpmock::prelude::*;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// Serves manifests from memory; unknown build references answer 404
struct StaticSource {
    manifests: HashMap<String, String>,
}

impl StaticSource {
    fn new(manifests: &[(&str, String)]) -> Self {
        Self {
            manifests: manifests
                .iter()
                .map(|(guid, json)| (guid.to_string(), json.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl PackageSource for StaticSource {
    async fn fetch_package_manifest(&self, build_guid: &str) -> Result<PackageManifest> {
        match self.manifests.get(build_guid) {
            Some(json) => PackageManifest::from_json(json),
            None => Err(Error::HttpStatus {
                url: format!("manifest/{}", build_guid),
                status: 404,
            }),
        }
    }
}

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<String>>,
}

impl RunObserver for EventLog {
    fn entry_started(&self, entry: &PlanEntry) {
        self.events.lock().unwrap().push(format!("start {}", entry));
    }

    fn file_finished(&self, _entry: &PlanEntry, report: &FileReport) {
        let state = if report.is_success() { "ok" } else { "failed" };
        self.events
            .lock()
            .unwrap()
            .push(format!("{} {}", state, report.name));
    }

    fn entry_failed(&self, entry: &PlanEntry, _error: &Error) {
        self.events.lock().unwrap().push(format!("skip {}", entry));
    }
}

fn entry(sap: &str, version: &str, guid: &str) -> PlanEntry {
    PlanEntry {
        sap_code: sap.to_string(),
        version: version.to_string(),
        build_guid: guid.to_string(),
    }
}

fn plan(entries: Vec<PlanEntry>) -> ResolvedDownloadPlan {
    ResolvedDownloadPlan {
        entries,
        unresolved: Vec::new(),
    }
}

fn fetcher() -> ResumableFetcher {
    ResumableFetcher::new(
        reqwest::Client::new(),
        RetryPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(10),
        },
        1024,
    )
}

fn job(cdn: String, root: &Path) -> DownloadJob {
    DownloadJob {
        cdn,
        destination_root: root.to_path_buf(),
        install_language: "en_US".to_string(),
        concurrency: 1,
    }
}

/// Manifest JSON with `(path, type, condition)` packages
fn manifest(packages: &[(&str, Option<&str>, Option<&str>)]) -> String {
    let list: Vec<Value> = packages
        .iter()
        .map(|(path, package_type, condition)| {
            let mut package = serde_json::json!({ "Path": path });
            if let Some(t) = package_type {
                package["Type"] = Value::from(*t);
            }
            if let Some(c) = condition {
                package["Condition"] = serde_json::json!([c]);
            }
            package
        })
        .collect();
    serde_json::json!({ "Packages": { "Package": list } }).to_string()
}

#[tokio::test]
async fn test_failed_file_does_not_stop_the_rest() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET).path("/PHSP/a.zip");
            then.status(200).body("aaaa");
        })
        .await;
    let broken = server
        .mock_async(|when, then| {
            when.method(GET).path("/PHSP/b.zip");
            then.status(500);
        })
        .await;
    let last = server
        .mock_async(|when, then| {
            when.method(GET).path("/PHSP/c.zip");
            then.status(200).body("cccccc");
        })
        .await;

    let source = StaticSource::new(&[(
        "g1",
        manifest(&[
            ("/PHSP/a.zip", Some("core"), None),
            ("/PHSP/b.zip", Some("core"), None),
            ("/PHSP/c.zip", Some("core"), None),
        ]),
    )]);
    let dir = TempDir::new().unwrap();
    let observer = EventLog::default();

    let report = orchestrator::run(
        &plan(vec![entry("PHSP", "24.0", "g1")]),
        &source,
        &fetcher(),
        &job(server.base_url(), dir.path()),
        &observer,
    )
    .await;

    assert_eq!(report.status(), RunStatus::CompletedWithFailures);
    let names: Vec<&str> = report.entries[0]
        .files()
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, vec!["a.zip", "b.zip", "c.zip"]);
    assert_eq!(report.succeeded().count(), 2);
    assert_eq!(report.failed().count(), 1);

    assert_eq!(first.hits_async().await, 1);
    assert_eq!(broken.hits_async().await, 2);
    assert_eq!(last.hits_async().await, 1);

    let product_dir = dir.path().join("PHSP");
    assert_eq!(std::fs::read(product_dir.join("a.zip")).unwrap(), b"aaaa");
    assert_eq!(std::fs::read(product_dir.join("c.zip")).unwrap(), b"cccccc");
    assert!(product_dir.join("application.json").exists());

    assert_eq!(
        *observer.events.lock().unwrap(),
        vec!["start PHSP_24.0", "ok a.zip", "failed b.zip", "ok c.zip"]
    );
}

#[tokio::test]
async fn test_manifest_failure_skips_only_that_entry() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/PHSP/core.zip");
            then.status(200).body("core");
        })
        .await;

    let source = StaticSource::new(&[("g1", manifest(&[("/PHSP/core.zip", Some("core"), None)]))]);
    let dir = TempDir::new().unwrap();
    let observer = EventLog::default();

    let report = orchestrator::run(
        &plan(vec![entry("PHSP", "24.0", "g1"), entry("COSY", "2.5", "missing")]),
        &source,
        &fetcher(),
        &job(server.base_url(), dir.path()),
        &observer,
    )
    .await;

    assert_eq!(report.status(), RunStatus::CompletedWithFailures);
    assert!(matches!(
        report.entries[0].outcome,
        EntryOutcome::Processed { core_count: 1, .. }
    ));
    assert!(matches!(
        report.entries[1].outcome,
        EntryOutcome::ManifestFailed(_)
    ));
    assert_eq!(report.failed_entries().count(), 1);
    assert_eq!(report.succeeded().count(), 1);
    assert!(dir.path().join("PHSP").join("core.zip").exists());
    assert!(!dir.path().join("COSY").exists());
    assert!(observer.events.lock().unwrap().contains(&"skip COSY_2.5".to_string()));
}

#[tokio::test]
async fn test_only_core_and_matching_language_are_fetched() {
    let server = MockServer::start_async().await;
    let core = server
        .mock_async(|when, then| {
            when.method(GET).path("/ILST/core.zip");
            then.status(200).body("core");
        })
        .await;
    let english = server
        .mock_async(|when, then| {
            when.method(GET).path("/ILST/en_US.zip");
            then.status(200).body("en");
        })
        .await;
    let french = server
        .mock_async(|when, then| {
            when.method(GET).path("/ILST/fr_FR.zip");
            then.status(200).body("fr");
        })
        .await;

    let source = StaticSource::new(&[(
        "g1",
        manifest(&[
            ("/ILST/core.zip", Some("core"), Some("ja_JP")),
            ("/ILST/fr_FR.zip", None, Some("fr_FR")),
            ("/ILST/en_US.zip", None, Some("en_US")),
        ]),
    )]);
    let dir = TempDir::new().unwrap();

    let report = orchestrator::run(
        &plan(vec![entry("ILST", "28.0", "g1")]),
        &source,
        &fetcher(),
        &job(server.base_url(), dir.path()),
        &SilentObserver,
    )
    .await;

    assert_eq!(report.status(), RunStatus::Completed);
    match &report.entries[0].outcome {
        EntryOutcome::Processed {
            core_count,
            noncore_count,
            files,
        } => {
            assert_eq!((*core_count, *noncore_count), (1, 1));
            let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
            assert_eq!(names, vec!["core.zip", "en_US.zip"]);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(core.hits_async().await, 1);
    assert_eq!(english.hits_async().await, 1);
    assert_eq!(french.hits_async().await, 0);
    assert!(!dir.path().join("ILST").join("fr_FR.zip").exists());
}

#[tokio::test]
async fn test_report_keeps_plan_order_with_concurrency() {
    let server = MockServer::start_async().await;
    for sap in ["PHSP", "COSY", "KCCC"] {
        let path = format!("/{}/core.zip", sap);
        server
            .mock_async(|when, then| {
                when.method(GET).path(path.as_str());
                then.status(200).body(sap);
            })
            .await;
    }

    let source = StaticSource::new(&[
        ("g1", manifest(&[("/PHSP/core.zip", Some("core"), None)])),
        ("g2", manifest(&[("/COSY/core.zip", Some("core"), None)])),
        ("g3", manifest(&[("/KCCC/core.zip", Some("core"), None)])),
    ]);
    let dir = TempDir::new().unwrap();
    let mut job = job(server.base_url(), dir.path());
    job.concurrency = 3;

    let report = orchestrator::run(
        &plan(vec![
            entry("PHSP", "24.0", "g1"),
            entry("COSY", "2.5", "g2"),
            entry("KCCC", "1.0", "g3"),
        ]),
        &source,
        &fetcher(),
        &job,
        &SilentObserver,
    )
    .await;

    let order: Vec<&str> = report
        .entries
        .iter()
        .map(|r| r.entry.sap_code.as_str())
        .collect();
    assert_eq!(order, vec!["PHSP", "COSY", "KCCC"]);
    assert_eq!(report.status(), RunStatus::Completed);
    for sap in ["PHSP", "COSY", "KCCC"] {
        let saved = std::fs::read_to_string(dir.path().join(sap).join("core.zip")).unwrap();
        assert_eq!(saved, sap);
    }
}

#[tokio::test]
async fn test_download_product_with_dependency_end_to_end() {
    let server = MockServer::start_async().await;
    let catalog = common::catalog_xml(
        &server.base_url(),
        &[common::product_xml(
            "PHSP",
            "24.0",
            "Photoshop",
            "win64",
            "g-phsp",
            &[("COSY", "2.5"), ("GONE", "1.0")],
        )],
        &[common::product_xml("COSY", "2.5", "CoreSync", "win64", "g-cosy", &[])],
    );
    server
        .mock_async(|when, then| {
            when.method(GET).path("/core/v5/products/all");
            then.status(200).body(catalog);
        })
        .await;

    let phsp_manifest = r#"{
  "Name": "Photoshop",
  "Packages": {
    "Package": [
      {"PackageName": "Core", "Path": "/PHSP/24.0/win64/Core.zip", "Type": "core", "DownloadSize": 4},
      {"PackageName": "en_US", "Path": "/PHSP/24.0/win64/en_US.zip", "Condition": ["en_US"]},
      {"PackageName": "de_DE", "Path": "/PHSP/24.0/win64/de_DE.zip", "Condition": ["de_DE"]}
    ]
  }
}"#;
    let cosy_manifest =
        r#"{"Packages":{"Package":[{"Path":"/COSY/2.5/win64/CoreSync.zip","Type":"core"}]}}"#;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/core/v3/applications")
                .header("x-adobe-build-guid", "g-phsp");
            then.status(200).body(phsp_manifest);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/core/v3/applications")
                .header("x-adobe-build-guid", "g-cosy");
            then.status(200).body(cosy_manifest);
        })
        .await;
    for (path, body) in [
        ("/PHSP/24.0/win64/Core.zip", "core"),
        ("/PHSP/24.0/win64/en_US.zip", "english"),
        ("/COSY/2.5/win64/CoreSync.zip", "sync"),
    ] {
        server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200).body(body);
            })
            .await;
    }

    let http = http::build_client(&TransportConfig::default()).unwrap();
    let client = CatalogClient::with_client(http.clone(), common::endpoints(&server.base_url()));
    let catalog = client.fetch_catalog(Platform::Win64).await.unwrap();
    let plan = resolver::resolve(&catalog, "PHSP", "24.0").unwrap();
    assert_eq!(plan.entries.len(), 2);
    assert_eq!(plan.unresolved.len(), 1);

    let dir = TempDir::new().unwrap();
    let root = dir.path().join("PHSP_24.0_en_US");
    let fetcher = ResumableFetcher::new(http, RetryPolicy::default(), 8192);
    let job = DownloadJob {
        cdn: catalog.cdn.clone(),
        destination_root: root.clone(),
        install_language: "en_US".to_string(),
        concurrency: 2,
    };

    let report = orchestrator::run(&plan, &client, &fetcher, &job, &SilentObserver).await;
    assert_eq!(report.status(), RunStatus::Completed);
    assert_eq!(report.succeeded().count(), 3);

    assert_eq!(std::fs::read_to_string(root.join("PHSP/Core.zip")).unwrap(), "core");
    assert_eq!(std::fs::read_to_string(root.join("PHSP/en_US.zip")).unwrap(), "english");
    assert!(!root.join("PHSP/de_DE.zip").exists());
    assert_eq!(std::fs::read_to_string(root.join("COSY/CoreSync.zip")).unwrap(), "sync");

    let saved = std::fs::read_to_string(root.join("PHSP/application.json")).unwrap();
    assert!(!saved.contains('\n'));
    assert!(saved.starts_with(r#"{"Name":"Photoshop","Packages""#));
    assert_eq!(
        serde_json::from_str::<Value>(&saved).unwrap(),
        serde_json::from_str::<Value>(phsp_manifest).unwrap()
    );
    assert_eq!(
        std::fs::read_to_string(root.join("COSY/application.json")).unwrap(),
        cosy_manifest
    );

    let product = catalog.product("PHSP").unwrap();
    let driver = DriverDescriptor::new(product, &plan, Platform::Win64, "en_US").unwrap();
    let driver_path = driver.write(&root).await.unwrap();
    let xml = std::fs::read_to_string(driver_path).unwrap();
    assert!(xml.contains("<Name>Adobe Photoshop</Name>"));
    assert!(xml.contains("<SAPCode>COSY</SAPCode>"));
    assert!(!xml.contains("GONE"));
}
