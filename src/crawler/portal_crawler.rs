//! 门户爬虫 - 单个浏览器会话的工作单元
//!
//! 流程：打开页面 → 导航 → 等待渲染 → 抽取书目字段 → 展开国家阶段 → 抽取申请表。
//! 失败按类型处理：
//! - 404：立即返回 `not_found`，不重试
//! - 抽取为空：退避后重试，最终返回 `no_data_extracted`
//! - 导航 / CDP / 超时：退避后重试，最终返回 `navigation_error`

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::crawler::backoff::BackoffPolicy;
use crate::crawler::extraction::{extract_applications, extract_bibliographic};
use crate::crawler::session::{PageSource, PortalPage, NATIONAL_PHASE_TARGETS};
use crate::models::filing::{group_by_year, EmptyReason, ExtractionDiagnostics};
use crate::models::{normalize, FilingResult, Identifier, PortalRecord};

/// 爬虫参数
#[derive(Debug, Clone)]
pub struct CrawlerSettings {
    pub base_url: String,
    pub page_timeout: Duration,
    pub max_retries: u32,
    pub settle_delay: Duration,
    pub reveal_delay: Duration,
    pub backoff: BackoffPolicy,
}

impl CrawlerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.portal_base_url.trim_end_matches('/').to_string(),
            page_timeout: config.page_timeout(),
            max_retries: config.crawler_max_retries.max(1),
            settle_delay: Duration::from_millis(config.page_settle_ms),
            reveal_delay: Duration::from_millis(config.reveal_settle_ms),
            backoff: BackoffPolicy::default(),
        }
    }

    /// WO 号详情页地址
    pub fn detail_url(&self, identifier: &Identifier) -> String {
        format!("{}/search/en/detail.jsf?docId={}", self.base_url, identifier)
    }
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 单次尝试的失败类型
#[derive(Debug)]
enum CrawlFault {
    NotFound,
    ExtractionFailure,
    TransientFault(String),
}

/// 门户爬虫
pub struct PortalCrawler {
    index: usize,
    source: Arc<dyn PageSource>,
    settings: CrawlerSettings,
}

impl PortalCrawler {
    pub fn new(index: usize, source: Arc<dyn PageSource>, settings: CrawlerSettings) -> Self {
        Self {
            index,
            source,
            settings,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// 抓取一个 WO 号，不会返回错误，失败以空结果表示
    pub async fn fetch(&self, raw_identifier: &str) -> FilingResult {
        let Some(identifier) = Identifier::parse(raw_identifier) else {
            warn!("[爬虫 {}] ⚠️ 无法识别的 WO 号: {}", self.index, raw_identifier);
            return FilingResult::empty(normalize(raw_identifier), EmptyReason::NotFound);
        };
        let url = self.settings.detail_url(&identifier);
        let max_retries = self.settings.max_retries.max(1);
        let mut last_fault = None;

        for attempt in 0..max_retries {
            info!(
                "[{}] 🌐 爬虫 {} 第 {}/{} 次尝试",
                identifier,
                self.index,
                attempt + 1,
                max_retries
            );

            match self.attempt(&identifier, &url, attempt).await {
                Ok(record) => {
                    info!(
                        "[{}] ✓ 抓取完成: {} 个申请, {} 个国家",
                        identifier,
                        record.total_applications(),
                        record.countries.len()
                    );
                    return FilingResult::Found(Box::new(record));
                }
                Err(CrawlFault::NotFound) => {
                    warn!("[{}] ⚠️ 门户返回 404", identifier);
                    return FilingResult::empty(identifier.as_str(), EmptyReason::NotFound);
                }
                Err(fault) => {
                    warn!("[{}] ⚠️ 第 {} 次尝试失败: {:?}", identifier, attempt + 1, fault);
                    last_fault = Some(fault);
                }
            }

            if attempt + 1 < max_retries {
                let delay = self.settings.backoff.next_delay(attempt);
                debug!("[{}] 退避 {:?} 后重试", identifier, delay);
                sleep(delay).await;
            }
        }

        let reason = match last_fault {
            Some(CrawlFault::TransientFault(message)) => EmptyReason::NavigationError(message),
            _ => EmptyReason::NoDataExtracted,
        };
        warn!("[{}] ❌ 放弃抓取: {}", identifier, reason.code());
        FilingResult::empty(identifier.as_str(), reason)
    }

    /// 单次尝试，页面在任何路径上都会被关闭
    async fn attempt(
        &self,
        identifier: &Identifier,
        url: &str,
        attempt: u32,
    ) -> Result<PortalRecord, CrawlFault> {
        let page = self
            .source
            .open()
            .await
            .map_err(|e| CrawlFault::TransientFault(e.to_string()))?;

        let outcome = self.scrape(page.as_ref(), identifier, url, attempt).await;

        if let Err(e) = page.close().await {
            debug!("[{}] 关闭页面失败: {}", identifier, e);
        }
        outcome
    }

    async fn scrape(
        &self,
        page: &dyn PortalPage,
        identifier: &Identifier,
        url: &str,
        attempt: u32,
    ) -> Result<PortalRecord, CrawlFault> {
        let status = page
            .navigate(url, self.settings.page_timeout)
            .await
            .map_err(|e| CrawlFault::TransientFault(e.to_string()))?;
        if status == 404 {
            return Err(CrawlFault::NotFound);
        }

        sleep(self.settings.settle_delay).await;

        let html = page
            .html()
            .await
            .map_err(|e| CrawlFault::TransientFault(e.to_string()))?;
        let mut diagnostics = ExtractionDiagnostics {
            attempt: attempt + 1,
            ..Default::default()
        };
        let biblio = {
            let doc = Html::parse_document(&html);
            extract_bibliographic(&doc, &mut diagnostics)
        };

        let revealed = match page.reveal(NATIONAL_PHASE_TARGETS).await {
            Ok(target) => target,
            Err(e) => {
                debug!("[{}] 展开国家阶段失败: {}", identifier, e);
                None
            }
        };
        let table_html = match &revealed {
            Some(target) => {
                debug!("[{}] 已点击 {}", identifier, target);
                sleep(self.settings.reveal_delay).await;
                page.html()
                    .await
                    .map_err(|e| CrawlFault::TransientFault(e.to_string()))?
            }
            None => html,
        };
        diagnostics.reveal_target = revealed;

        let table = {
            let doc = Html::parse_document(&table_html);
            extract_applications(&doc)
        };
        diagnostics.field_failures.extend(table.failures);

        let countries: BTreeSet<String> = table
            .applications
            .iter()
            .map(|app| app.country_code.clone())
            .collect();

        let record = PortalRecord {
            identifier: identifier.clone(),
            url: url.to_string(),
            title: biblio.title,
            abstract_text: biblio.abstract_text,
            applicant: biblio.applicant,
            filing_date: biblio.filing_date,
            publication_date: biblio.publication_date,
            priority_date: biblio.priority_date,
            worldwide_applications: group_by_year(table.applications),
            countries: countries.into_iter().collect(),
            diagnostics,
        };

        if record.is_empty() {
            return Err(CrawlFault::ExtractionFailure);
        }
        Ok(record)
    }

    /// 关闭底层浏览器会话
    pub async fn close(&self) -> crate::error::AppResult<()> {
        self.source.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::test_support::{FakeSource, FakeVisit};

    fn settings() -> CrawlerSettings {
        CrawlerSettings {
            base_url: "https://portal.test".into(),
            page_timeout: Duration::from_secs(1),
            max_retries: 3,
            settle_delay: Duration::ZERO,
            reveal_delay: Duration::ZERO,
            backoff: BackoffPolicy::none(),
        }
    }

    fn crawler(source: Arc<FakeSource>) -> PortalCrawler {
        PortalCrawler::new(0, source, settings())
    }

    #[test]
    fn detail_url_uses_canonical_identifier() {
        let id = Identifier::parse("wo 2011/051540").unwrap();
        assert_eq!(
            settings().detail_url(&id),
            "https://portal.test/search/en/detail.jsf?docId=WO2011051540"
        );
    }

    #[tokio::test]
    async fn record_is_extracted_after_reveal() {
        let source = Arc::new(FakeSource::repeating(FakeVisit::national_phase()));
        let result = crawler(source.clone()).fetch("WO2011/051540").await;

        let record = result.record().expect("found");
        assert_eq!(record.identifier.as_str(), "WO2011051540");
        assert_eq!(record.title, "Androgen receptor modulating carboxamides");
        assert_eq!(record.countries, vec!["BR", "US"]);
        assert_eq!(record.total_applications(), 2);
        assert!(record.worldwide_applications.contains_key("2012"));
        assert_eq!(record.diagnostics.attempt, 1);
        assert_eq!(record.diagnostics.reveal_target.as_deref(), Some("a:National Phase"));
        assert_eq!(source.stats().opened(), 1);
        assert_eq!(source.stats().pages_closed(), 1);
    }

    #[tokio::test]
    async fn empty_pages_are_retried_exactly_max_times() {
        let source = Arc::new(FakeSource::repeating(FakeVisit::blank()));
        let result = crawler(source.clone()).fetch("WO2020000001").await;

        assert_eq!(result.reason().map(EmptyReason::code), Some("no_data_extracted"));
        assert_eq!(source.stats().navigations(), 3);
        assert_eq!(source.stats().pages_closed(), 3);
    }

    #[tokio::test]
    async fn zero_retries_still_attempts_once() {
        let source = Arc::new(FakeSource::repeating(FakeVisit::national_phase()));
        let settings = CrawlerSettings {
            max_retries: 0,
            ..settings()
        };
        let result = PortalCrawler::new(0, source.clone(), settings)
            .fetch("WO2011051540")
            .await;

        assert!(result.is_found());
        assert_eq!(source.stats().navigations(), 1);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let source = Arc::new(FakeSource::repeating(FakeVisit::status(404)));
        let result = crawler(source.clone()).fetch("WO2020000001").await;

        assert_eq!(result.reason(), Some(&EmptyReason::NotFound));
        assert_eq!(source.stats().navigations(), 1);
        assert_eq!(source.stats().pages_closed(), 1);
    }

    #[tokio::test]
    async fn navigation_faults_surface_after_retries() {
        let source = Arc::new(FakeSource::repeating(FakeVisit::failing("net::ERR_TIMED_OUT")));
        let result = crawler(source.clone()).fetch("WO2020000001").await;

        match result.reason() {
            Some(EmptyReason::NavigationError(message)) => {
                assert!(message.contains("net::ERR_TIMED_OUT"))
            }
            other => panic!("unexpected reason: {other:?}"),
        }
        assert_eq!(source.stats().navigations(), 3);
        assert_eq!(source.stats().pages_closed(), 3);
    }

    #[tokio::test]
    async fn transient_fault_then_success() {
        let source = Arc::new(FakeSource::scripted(
            vec![FakeVisit::failing("reset"), FakeVisit::national_phase()],
            FakeVisit::blank(),
        ));
        let result = crawler(source.clone()).fetch("WO2011051540").await;

        assert_eq!(result.record().map(|r| r.diagnostics.attempt), Some(2));
        assert_eq!(source.stats().navigations(), 2);
    }

    #[tokio::test]
    async fn unparseable_identifier_is_not_fetched() {
        let source = Arc::new(FakeSource::repeating(FakeVisit::national_phase()));
        let result = crawler(source.clone()).fetch("US9376391").await;

        assert_eq!(result.reason(), Some(&EmptyReason::NotFound));
        assert_eq!(source.stats().opened(), 0);
    }
}
