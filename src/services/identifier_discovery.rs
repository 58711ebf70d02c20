//! WO 号发现服务 - 业务能力层
//!
//! 三种查询策略：
//! 1. 专利搜索 engine，按分子名
//! 2. 专利搜索 engine，按前 5 个研发代号
//! 3. 通用搜索 engine，按 `"{分子名} patent WO"`
//!
//! 单个查询失败只记录日志，不影响其他查询。结果取并集、按降序排序后截断。

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::clients::SerpApiClient;
use crate::models::{extract_identifiers, Identifier};

const PATENT_ENGINE: &str = "google_patents";
const WEB_ENGINE: &str = "google";
const MAX_DEV_CODE_QUERIES: usize = 5;

pub const SOURCE_MOLECULE: &str = "google_patents_molecule";
pub const SOURCE_DEV_CODES: &str = "google_patents_dev_codes";
pub const SOURCE_WEB: &str = "google_search";

/// 发现结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryOutcome {
    /// 降序排列、已截断
    pub identifiers: Vec<Identifier>,
    /// 至少贡献了一个 WO 号的策略
    pub sources_used: Vec<String>,
    /// 发出的查询次数
    pub queries_made: usize,
}

/// WO 号发现能力
#[async_trait]
pub trait IdentifierDiscovery: Send + Sync {
    async fn discover(&self, molecule: &str, dev_codes: &[String], limit: usize) -> DiscoveryOutcome;
}

/// 基于 SerpApi 的发现服务
pub struct IdentifierDiscoveryService {
    serpapi: SerpApiClient,
    query_delay: Duration,
}

impl IdentifierDiscoveryService {
    pub fn new(serpapi: SerpApiClient, query_delay: Duration) -> Self {
        Self {
            serpapi,
            query_delay,
        }
    }

    /// 执行一次查询，失败时返回空集合
    async fn query(&self, engine: &str, q: &str, num: u32) -> BTreeSet<Identifier> {
        match self.serpapi.search(engine, q, num).await {
            Ok(results) => results
                .iter()
                .flat_map(|r| extract_identifiers(&r.searchable_text()))
                .collect(),
            Err(e) => {
                warn!("    ❌ 查询失败 ({} / {}): {}", engine, q, e);
                BTreeSet::new()
            }
        }
    }
}

#[async_trait]
impl IdentifierDiscovery for IdentifierDiscoveryService {
    async fn discover(&self, molecule: &str, dev_codes: &[String], limit: usize) -> DiscoveryOutcome {
        info!("🔍 开始发现 WO 号: {}", molecule);
        let mut all: BTreeSet<Identifier> = BTreeSet::new();
        let mut outcome = DiscoveryOutcome::default();

        info!("  📚 策略 1: 专利搜索（分子名）");
        let found = self.query(PATENT_ENGINE, molecule, 20).await;
        outcome.queries_made += 1;
        if !found.is_empty() {
            outcome.sources_used.push(SOURCE_MOLECULE.to_string());
        }
        all.extend(found);

        if !dev_codes.is_empty() {
            let codes = &dev_codes[..dev_codes.len().min(MAX_DEV_CODE_QUERIES)];
            info!("  📚 策略 2: 专利搜索（{} 个研发代号）", codes.len());
            let mut contributed = false;
            for code in codes {
                sleep(self.query_delay).await;
                let found = self.query(PATENT_ENGINE, code, 20).await;
                outcome.queries_made += 1;
                contributed |= !found.is_empty();
                all.extend(found);
            }
            if contributed {
                outcome.sources_used.push(SOURCE_DEV_CODES.to_string());
            }
        }

        info!("  📚 策略 3: 通用搜索");
        sleep(self.query_delay).await;
        let found = self
            .query(WEB_ENGINE, &format!("{} patent WO", molecule), 10)
            .await;
        outcome.queries_made += 1;
        if !found.is_empty() {
            outcome.sources_used.push(SOURCE_WEB.to_string());
        }
        all.extend(found);

        outcome.identifiers = all.into_iter().rev().take(limit).collect();
        info!("  ✅ 共发现 {} 个 WO 号", outcome.identifiers.len());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::KeyRotation;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> IdentifierDiscoveryService {
        let keys = Arc::new(KeyRotation::new(vec!["k".to_string()]));
        let serpapi = SerpApiClient::new(&server.uri(), keys, Duration::from_secs(5)).unwrap();
        IdentifierDiscoveryService::new(serpapi, Duration::ZERO)
    }

    fn results(texts: &[&str]) -> ResponseTemplate {
        let organic: Vec<_> = texts.iter().map(|t| json!({"title": t})).collect();
        ResponseTemplate::new(200).set_body_json(json!({ "organic_results": organic }))
    }

    #[tokio::test]
    async fn strategies_are_merged_sorted_and_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("engine", "google_patents"))
            .and(query_param("q", "darolutamide"))
            .respond_with(results(&["WO2011/051540 and WO 2012 143599"]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("engine", "google_patents"))
            .and(query_param("q", "ODM-201"))
            .respond_with(results(&["WO2016162604A1", "WO2011051540"]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("engine", "google"))
            .and(query_param("q", "darolutamide patent WO"))
            .respond_with(results(&["WO-2018-162793"]))
            .mount(&server)
            .await;

        let outcome = service(&server)
            .discover("darolutamide", &["ODM-201".to_string()], 3)
            .await;

        let ids: Vec<&str> = outcome.identifiers.iter().map(Identifier::as_str).collect();
        assert_eq!(ids, vec!["WO2018162793", "WO2016162604", "WO2012143599"]);
        assert_eq!(
            outcome.sources_used,
            vec![SOURCE_MOLECULE, SOURCE_DEV_CODES, SOURCE_WEB]
        );
        assert_eq!(outcome.queries_made, 3);
    }

    #[tokio::test]
    async fn failing_query_contributes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("engine", "google_patents"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("engine", "google"))
            .respond_with(results(&["see WO2011051540"]))
            .mount(&server)
            .await;

        let outcome = service(&server).discover("darolutamide", &[], 10).await;
        assert_eq!(outcome.identifiers.len(), 1);
        assert_eq!(outcome.sources_used, vec![SOURCE_WEB]);
        assert_eq!(outcome.queries_made, 2);
    }

    #[tokio::test]
    async fn only_first_five_dev_codes_are_queried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(results(&[]))
            .expect(1 + 5 + 1)
            .mount(&server)
            .await;

        let codes: Vec<String> = (0..8).map(|i| format!("AB-{}00", i + 1)).collect();
        let outcome = service(&server).discover("x", &codes, 10).await;
        assert!(outcome.identifiers.is_empty());
        assert!(outcome.sources_used.is_empty());
        assert_eq!(outcome.queries_made, 7);
    }
}
