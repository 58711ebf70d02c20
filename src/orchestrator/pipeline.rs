//! 检索流水线 - 编排层
//!
//! ## 状态
//!
//! `Resolve → Discover → CrawlPortal → EnrichDetails → EnrichRegional → Summarize → Done`
//!
//! 状态只能向前推进。任何单个数据源的失败都只会增加 `errors_count` 或写入 `warnings`，
//! 流水线一旦开始就一定产出报告。

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Config;
use crate::crawler::PortalCrawlerPool;
use crate::models::{
    ExecutionReport, ExecutiveSummary, FilingApplication, FilingResult, Identifier,
    MoleculeProfile, PatentRecord, SearchReport,
};
use crate::services::{IdentifierDiscovery, MoleculeLookup};
use crate::utils::logging::{log_final_stats, log_phase, log_request, truncate_text};
use crate::workflow::{EnrichmentFlow, SearchRequest};

pub const SOURCE_REFERENCE: &str = "PubChem";
pub const SOURCE_PORTAL: &str = "WIPO";
pub const SOURCE_DETAILS: &str = "Google Patents";
pub const SOURCE_REGIONAL: &str = "INPI";

/// 流水线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Resolve,
    Discover,
    CrawlPortal,
    EnrichDetails,
    EnrichRegional,
    Summarize,
    Done,
}

impl PipelineState {
    /// 下一个状态，`Done` 之后保持 `Done`
    pub fn next(self) -> Self {
        match self {
            PipelineState::Resolve => PipelineState::Discover,
            PipelineState::Discover => PipelineState::CrawlPortal,
            PipelineState::CrawlPortal => PipelineState::EnrichDetails,
            PipelineState::EnrichDetails => PipelineState::EnrichRegional,
            PipelineState::EnrichRegional => PipelineState::Summarize,
            PipelineState::Summarize => PipelineState::Done,
            PipelineState::Done => PipelineState::Done,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PipelineState::Resolve => "分子解析",
            PipelineState::Discover => "WO 号发现",
            PipelineState::CrawlPortal => "门户抓取",
            PipelineState::EnrichDetails => "详情补全",
            PipelineState::EnrichRegional => "区域注册库补全",
            PipelineState::Summarize => "汇总",
            PipelineState::Done => "完成",
        }
    }
}

/// 流水线参数
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub identifier_delay: Duration,
    pub max_applications: usize,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            identifier_delay: config.identifier_delay(),
            max_applications: config.max_applications,
        }
    }
}

/// 单次运行的可变状态（只有流水线自己写）
struct Run {
    started: Instant,
    report: ExecutionReport,
    profile: MoleculeProfile,
    identifiers: Vec<Identifier>,
    applications: Vec<(FilingApplication, Identifier)>,
    patents: Vec<PatentRecord>,
}

/// 检索流水线
pub struct Pipeline {
    resolver: Arc<dyn MoleculeLookup>,
    discovery: Arc<dyn IdentifierDiscovery>,
    pool: Arc<PortalCrawlerPool>,
    flow: EnrichmentFlow,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        resolver: Arc<dyn MoleculeLookup>,
        discovery: Arc<dyn IdentifierDiscovery>,
        pool: Arc<PortalCrawlerPool>,
        flow: EnrichmentFlow,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            resolver,
            discovery,
            pool,
            flow,
            settings,
        }
    }

    /// 运行完整流水线
    pub async fn run(&self, request: &SearchRequest) -> SearchReport {
        log_request(request);
        let mut run = Run {
            started: Instant::now(),
            report: ExecutionReport::start(),
            profile: MoleculeProfile::empty(&request.molecule),
            identifiers: Vec::new(),
            applications: Vec::new(),
            patents: Vec::new(),
        };

        let mut state = PipelineState::Resolve;
        let mut step = 1;
        while state != PipelineState::Done {
            log_phase(step, state.name());
            match state {
                PipelineState::Resolve => self.resolve(&mut run, request).await,
                PipelineState::Discover => self.discover(&mut run, request).await,
                PipelineState::CrawlPortal => self.crawl_portal(&mut run, request).await,
                PipelineState::EnrichDetails => self.enrich_details(&mut run).await,
                PipelineState::EnrichRegional => self.enrich_regional(&mut run, request).await,
                PipelineState::Summarize | PipelineState::Done => {}
            }
            state = state.next();
            step += 1;
        }

        let report = summarize(run, request);
        log_final_stats(&report);
        report
    }

    async fn resolve(&self, run: &mut Run, request: &SearchRequest) {
        let profile = self.resolver.resolve(&request.molecule).await;
        run.report.record_source(SOURCE_REFERENCE);
        run.report.record_calls(profile.lookups.max(1));
        if profile.is_empty() {
            run.report
                .warn(format!("No reference data found for {}", request.molecule));
        }
        info!(
            "  研发代号: {} | CAS: {} | 同义词: {}",
            profile.dev_codes.len(),
            profile.cas_number.as_deref().unwrap_or("N/A"),
            profile.synonyms.len()
        );
        run.profile = profile;
    }

    async fn discover(&self, run: &mut Run, request: &SearchRequest) {
        let outcome = self
            .discovery
            .discover(&request.molecule, &run.profile.dev_codes, request.max_identifiers)
            .await;
        run.report.record_calls(outcome.queries_made);
        for source in outcome.sources_used {
            run.report.record_source(source);
        }

        let mut identifiers = outcome.identifiers;
        identifiers.truncate(request.max_identifiers);
        run.report.identifiers_found = identifiers.len();

        for (i, id) in identifiers.iter().take(5).enumerate() {
            info!("    {}. {}", i + 1, id);
        }
        if identifiers.len() > 5 {
            info!("    ... 以及另外 {} 个", identifiers.len() - 5);
        }
        if identifiers.is_empty() {
            warn!("  ⚠️ 未发现任何 WO 号");
            run.report.warn("No identifiers found");
        }
        run.identifiers = identifiers;
    }

    async fn crawl_portal(&self, run: &mut Run, request: &SearchRequest) {
        if run.identifiers.is_empty() {
            return;
        }
        run.report.record_source(SOURCE_PORTAL);

        let results: Vec<FilingResult> = if request.is_concurrent() {
            info!("  并发抓取 (并发数 {})", request.crawl_concurrency);
            let pool = &self.pool;
            stream::iter(run.identifiers.iter())
                .map(|id| {
                    let crawler = pool.acquire();
                    async move { crawler.fetch(id.as_str()).await }
                })
                .buffered(request.crawl_concurrency)
                .collect()
                .await
        } else {
            let total = run.identifiers.len();
            let mut results = Vec::with_capacity(total);
            for (idx, id) in run.identifiers.iter().enumerate() {
                info!("\n  [{}/{}] 处理 {}", idx + 1, total, id);
                let crawler = self.pool.acquire();
                results.push(crawler.fetch(id.as_str()).await);
                if idx + 1 < total {
                    sleep(self.settings.identifier_delay).await;
                }
            }
            results
        };

        for result in results {
            run.report.record_calls(1);
            run.report.identifiers_processed += 1;
            match result {
                FilingResult::Found(record) => {
                    for application in record.applications() {
                        run.applications
                            .push((application.clone(), record.identifier.clone()));
                    }
                    info!(
                        "    ✅ {}: {} 个申请",
                        record.identifier,
                        record.total_applications()
                    );
                }
                FilingResult::Empty { identifier, reason } => {
                    warn!("    ⚠️ {} 无数据: {}", identifier, reason.code());
                    run.report.record_error();
                }
            }
        }
        info!("\n  共收集 {} 个申请", run.applications.len());
    }

    async fn enrich_details(&self, run: &mut Run) {
        let total = run.applications.len();
        let cap = self.settings.max_applications;
        if total > cap {
            warn!("  ⚠️ 申请数量 {} 超过上限，只处理前 {} 个", total, cap);
            run.report
                .warn(format!("Limited to {} patents (found {})", cap, total));
        }

        let selected = &run.applications[..total.min(cap)];
        let mut calls = 0;
        for (idx, (application, identifier)) in selected.iter().enumerate() {
            let Some(record) = self.flow.build_record(application, identifier).await else {
                continue;
            };
            calls += 1;
            info!(
                "  [{}/{}] {} {}",
                idx + 1,
                selected.len(),
                record.publication_number,
                if record.title.is_empty() {
                    "(无标题)".to_string()
                } else {
                    truncate_text(&record.title, 40)
                }
            );
            run.patents.push(record);
        }

        if calls > 0 {
            run.report.record_source(SOURCE_DETAILS);
            run.report.record_calls(calls);
        }
    }

    async fn enrich_regional(&self, run: &mut Run, request: &SearchRequest) {
        if !request.include_regional {
            info!("  未启用区域注册库，跳过");
            return;
        }
        let mut calls = 0;
        let mut hits = 0;
        for record in run.patents.iter_mut().filter(|r| EnrichmentFlow::is_regional(r)) {
            calls += 1;
            if self.flow.enrich_regional(record).await {
                hits += 1;
            }
        }
        if calls > 0 {
            run.report.record_source(SOURCE_REGIONAL);
            run.report.record_calls(calls);
        }
        info!("  区域注册库: 查询 {} 条，命中 {} 条", calls, hits);
    }
}

fn summarize(mut run: Run, request: &SearchRequest) -> SearchReport {
    let elapsed = run.started.elapsed();
    run.report.finalize(elapsed);
    SearchReport {
        executive_summary: ExecutiveSummary::summarize(
            &request.molecule,
            &run.profile,
            &run.patents,
            elapsed,
        ),
        patents: run.patents,
        search_metadata: run.report,
    }
}
