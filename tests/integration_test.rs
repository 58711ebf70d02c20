use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use patent_scout::crawler::{PageSource, PortalPage, RevealTarget, SessionLauncher};
use patent_scout::utils::logging;
use patent_scout::{App, AppResult, Config, SearchRequest};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PORTAL_HTML: &str = r#"
    <html><body>
      <h3 class="tab_title">Androgen receptor modulating carboxamides</h3>
      <table class="national-phase-table">
        <tr><th>Date</th><th>Office</th><th>Number</th><th>Status</th></tr>
        <tr><td>27.04.2012</td><td>BR</td><td>BR 11 2012 008823</td><td></td></tr>
        <tr><td>26.04.2012</td><td>US</td><td>13/503,877</td><td></td></tr>
      </table>
    </body></html>
"#;

// ========== 假浏览器会话 ==========

struct StaticPage;

#[async_trait]
impl PortalPage for StaticPage {
    async fn navigate(&self, _url: &str, _timeout: Duration) -> AppResult<u16> {
        Ok(200)
    }

    async fn reveal(&self, _targets: &[RevealTarget]) -> AppResult<Option<String>> {
        Ok(None)
    }

    async fn html(&self) -> AppResult<String> {
        Ok(PORTAL_HTML.to_string())
    }

    async fn close(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct StaticSession {
    opened: AtomicUsize,
}

#[async_trait]
impl PageSource for StaticSession {
    async fn open(&self) -> AppResult<Box<dyn PortalPage>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticPage))
    }

    async fn close(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
struct StaticLauncher {
    sessions: std::sync::Mutex<Vec<Arc<StaticSession>>>,
}

#[async_trait]
impl SessionLauncher for StaticLauncher {
    async fn launch(&self, _index: usize) -> AppResult<Arc<dyn PageSource>> {
        let session = Arc::new(StaticSession::default());
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }
}

// ========== 上游服务 ==========

async fn mount_upstreams(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/pug/compound/name/darolutamide/synonyms/JSON"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "InformationList": {"Information": [{"Synonym": [
                "darolutamide", "ODM-201", "1297538-32-9", "CID 67171867"
            ]}]}
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/pug/compound/name/darolutamide/property/MolecularFormula/JSON"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "PropertyTable": {"Properties": [{"MolecularFormula": "C19H19ClN6O2"}]}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_patents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [
                {"title": "Carboxamides", "snippet": "see WO 2011/051540", "patent_id": "patent/WO2011051540A1/en"}
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"organic_results": []})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_patents_details"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Androgen receptor modulating compounds",
            "assignee": "Orion Corporation",
            "family_id": "43969408",
            "filing_date": "2010-10-27"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/inpi"))
        .and(query_param("medicine", "112012008823"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"status": "Deferido", "processNumber": "BR112012008823-0", "applicant": "ORION"}]
        })))
        .mount(server)
        .await;
}

fn test_config(server: &MockServer, report: &std::path::Path) -> Config {
    Config {
        crawler_pool_size: 2,
        page_settle_ms: 0,
        reveal_settle_ms: 0,
        delay_between_identifiers: 0.0,
        delay_between_queries: 0.0,
        serpapi_base_url: server.uri(),
        pubchem_base_url: format!("{}/rest/pug", server.uri()),
        regional_api_url: format!("{}/inpi", server.uri()),
        serpapi_keys: vec!["test-key".to_string()],
        report_output_file: report.display().to_string(),
        ..Config::default()
    }
}

#[tokio::test]
async fn search_runs_end_to_end_against_fake_upstreams() {
    logging::init("debug");
    let server = MockServer::start().await;
    mount_upstreams(&server).await;

    let report_path = std::env::temp_dir().join(format!(
        "patent_scout_e2e_{}.json",
        std::process::id()
    ));
    let config = test_config(&server, &report_path);
    let launcher = StaticLauncher::default();

    let app = tokio_test::assert_ok!(App::with_launcher(config.clone(), &launcher).await);
    let request = SearchRequest::new("darolutamide", &config);
    let report = app.run(&request).await;
    app.shutdown().await;

    let summary = &report.executive_summary;
    assert_eq!(summary.registry_number.as_deref(), Some("1297538-32-9"));
    assert_eq!(summary.molecular_formula, "C19H19ClN6O2");
    assert_eq!(summary.total_patents, 2);
    assert_eq!(summary.total_families, 1);

    let br = report
        .patents
        .iter()
        .find(|p| p.country_code == "BR")
        .expect("BR 申请");
    assert_eq!(br.publication_number, "BR112012008823");
    assert_eq!(br.title, "Androgen receptor modulating compounds");
    // 门户的申请日优先于详情接口
    assert_eq!(br.filing_date, "27.04.2012");
    assert!(br.regional_enriched);
    assert_eq!(br.regional_status, "Deferido");
    assert_eq!(br.source_identifier, "WO2011051540");

    let meta = &report.search_metadata;
    assert_eq!(meta.identifiers_found, 1);
    assert_eq!(meta.identifiers_processed, 1);
    assert_eq!(meta.errors_count, 0);
    for source in ["PubChem", "WIPO", "Google Patents", "INPI"] {
        assert!(meta.sources_used.contains(source), "缺少数据源 {source}");
    }

    let sessions = launcher.sessions.lock().unwrap();
    assert_eq!(sessions.len(), 2);
    let opened: usize = sessions.iter().map(|s| s.opened.load(Ordering::SeqCst)).sum();
    assert_eq!(opened, 1);

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(written["executive_summary"]["total_patents"], 2);
    let _ = std::fs::remove_file(&report_path);
}

#[tokio::test]
async fn missing_api_keys_degrade_to_empty_report() {
    let server = MockServer::start().await;
    let report_path = std::env::temp_dir().join(format!(
        "patent_scout_nokeys_{}.json",
        std::process::id()
    ));
    let config = Config {
        serpapi_keys: Vec::new(),
        ..test_config(&server, &report_path)
    };

    let app = App::with_launcher(config.clone(), &StaticLauncher::default())
        .await
        .unwrap();
    let report = app
        .run(&SearchRequest::new("unknownium", &config))
        .await;
    app.shutdown().await;

    assert!(report.patents.is_empty());
    assert!(report
        .search_metadata
        .warnings
        .iter()
        .any(|w| w == "No identifiers found"));
    let _ = std::fs::remove_file(&report_path);
}

#[tokio::test]
async fn report_is_returned_when_file_cannot_be_written() {
    let server = MockServer::start().await;
    mount_upstreams(&server).await;
    let unwritable = std::path::Path::new("/nonexistent-patent-scout-dir/x/report.json");
    let config = test_config(&server, unwritable);

    let app = App::with_launcher(config.clone(), &StaticLauncher::default())
        .await
        .unwrap();
    let report = app.run(&SearchRequest::new("darolutamide", &config)).await;
    app.shutdown().await;

    assert_eq!(report.executive_summary.total_patents, 2);
    assert!(!unwritable.exists());
}

#[tokio::test]
#[ignore] // 默认忽略，需要本机 Chrome：cargo test -- --ignored
async fn test_browser_launch() {
    logging::init("info");
    let config = Config::from_env();

    let app = App::initialize(Config {
        crawler_pool_size: 1,
        ..config
    })
    .await;

    assert!(app.is_ok(), "应该能够启动浏览器会话");
    app.unwrap().shutdown().await;
}

#[tokio::test]
#[ignore] // 需要 Chrome、网络和 SERPAPI_KEYS
async fn test_live_search() {
    logging::init("info");
    let config = Config::from_env();

    let app = App::initialize(config.clone()).await.expect("初始化失败");
    let request = SearchRequest::new("darolutamide", &config).with_max_identifiers(2);
    let report = app.run(&request).await;
    app.shutdown().await;

    println!("找到 {} 条专利", report.patents.len());
    assert!(report.search_metadata.sources_used.contains("PubChem"));
}
