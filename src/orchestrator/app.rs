//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建 HTTP 客户端、启动浏览器会话池
//! 2. **资源管理**：唯一持有爬虫池，负责最终关闭
//! 3. **运行检索**：委托 `Pipeline` 完成一次检索，并写出报告
//!
//! 初始化阶段的失败（HTTP 客户端、爬虫池）是致命的，直接返回错误；
//! 检索阶段的失败都在流水线内部降级处理。

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::browser::ChromeLauncher;
use crate::clients::{
    DetailsEnrichmentClient, KeyRotation, PubChemClient, RegionalRegistryClient, SerpApiClient,
};
use crate::config::Config;
use crate::crawler::{CrawlerSettings, PortalCrawlerPool, SessionLauncher};
use crate::models::SearchReport;
use crate::orchestrator::pipeline::{Pipeline, PipelineSettings};
use crate::services::{IdentifierDiscoveryService, MoleculeResolver, ReportWriter};
use crate::utils::logging::log_startup;
use crate::workflow::{EnrichmentFlow, SearchRequest};

/// 应用主结构
pub struct App {
    config: Config,
    pipeline: Pipeline,
    pool: Arc<PortalCrawlerPool>,
    writer: ReportWriter,
}

impl App {
    /// 初始化应用（使用 Chrome 启动浏览器会话）
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);
        let launcher = ChromeLauncher::from_config(&config);
        Self::with_launcher(config, &launcher).await
    }

    /// 使用指定的会话启动器初始化
    pub async fn with_launcher(config: Config, launcher: &dyn SessionLauncher) -> Result<Self> {
        // 先建 HTTP 客户端，失败时不用再清理浏览器
        let keys = Arc::new(KeyRotation::new(config.serpapi_keys.clone()));
        let serpapi = SerpApiClient::new(&config.serpapi_base_url, keys, config.http_timeout())?;
        let pubchem = PubChemClient::new(&config.pubchem_base_url, config.http_timeout())?;
        let registry =
            RegionalRegistryClient::new(config.regional_api_url.clone(), config.regional_timeout())?;
        let details = DetailsEnrichmentClient::new(serpapi.clone(), config.details_engine.clone());

        info!("\n🌐 正在启动 {} 个浏览器会话...", config.crawler_pool_size);
        let pool = PortalCrawlerPool::initialize(
            config.crawler_pool_size,
            CrawlerSettings::from_config(&config),
            launcher,
        )
        .await
        .map_err(|e| {
            error!("❌ 爬虫池初始化失败: {}", e);
            e
        })?;
        let pool = Arc::new(pool);
        info!("✅ 爬虫池就绪 ({} 个会话)", pool.size());

        let pipeline = Pipeline::new(
            Arc::new(MoleculeResolver::new(pubchem)),
            Arc::new(IdentifierDiscoveryService::new(serpapi, config.query_delay())),
            pool.clone(),
            EnrichmentFlow::new(Arc::new(details), Arc::new(registry), config.query_delay()),
            PipelineSettings::from_config(&config),
        );
        let writer = ReportWriter::with_path(&config.report_output_file);

        Ok(Self {
            config,
            pipeline,
            pool,
            writer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行一次检索并写出报告
    ///
    /// 报告文件写入失败只记录警告，报告照常返回
    pub async fn run(&self, request: &SearchRequest) -> SearchReport {
        let report = self.pipeline.run(request).await;

        match self.writer.write(&report).await {
            Ok(bytes) => info!("💾 报告已写入 {} ({} 字节)", self.writer.path().display(), bytes),
            Err(e) => warn!("⚠️ 报告写入失败，仅输出到标准输出: {}", e),
        }

        report
    }

    /// 关闭所有浏览器会话
    pub async fn shutdown(&self) {
        info!("\n🧹 正在关闭浏览器会话...");
        self.pool.shutdown().await;
    }
}
