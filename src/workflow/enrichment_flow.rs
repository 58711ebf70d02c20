//! 申请补全流程 - 流程层
//!
//! 核心职责：定义"一个国家阶段申请"如何变成一条专利记录
//!
//! 流程顺序：
//! 1. 门户数据建立记录
//! 2. 详情接口补全（只填空字段）
//! 3. 区域注册库补全（仅 BR，只回填标题和申请人）

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::clients::{DetailsSource, RegistrySource};
use crate::models::jurisdiction::REGIONAL_JURISDICTION;
use crate::models::{FilingApplication, Identifier, PatentRecord};

/// 申请补全流程
///
/// - 不持有浏览器资源
/// - 只依赖补全数据源（details / registry）
/// - 每次外部调用后等待 `query_delay`
pub struct EnrichmentFlow {
    details: Arc<dyn DetailsSource>,
    registry: Arc<dyn RegistrySource>,
    query_delay: Duration,
}

impl EnrichmentFlow {
    pub fn new(
        details: Arc<dyn DetailsSource>,
        registry: Arc<dyn RegistrySource>,
        query_delay: Duration,
    ) -> Self {
        Self {
            details,
            registry,
            query_delay,
        }
    }

    /// 门户 + 详情阶段
    ///
    /// # 返回
    /// 申请号为空时返回 `None`（不发请求）
    pub async fn build_record(
        &self,
        application: &FilingApplication,
        source_identifier: &Identifier,
    ) -> Option<PatentRecord> {
        if application.application_number.trim().is_empty() {
            debug!("[{}] 跳过无申请号的申请 ({})", source_identifier, application.country_code);
            return None;
        }

        let mut record = PatentRecord::from_application(application, Some(source_identifier));
        let details = self.details.get_details(&record.publication_number).await;
        record.apply_details(&details);

        sleep(self.query_delay).await;
        Some(record)
    }

    /// 是否属于区域注册库覆盖范围
    pub fn is_regional(record: &PatentRecord) -> bool {
        record.jurisdiction == REGIONAL_JURISDICTION
    }

    /// 区域注册库阶段，返回是否找到记录
    pub async fn enrich_regional(&self, record: &mut PatentRecord) -> bool {
        let result = self.registry.get_details(&record.publication_number).await;
        let enriched = record.apply_registry(&result);
        if enriched {
            info!(
                "[{}] ✓ 区域注册库状态: {}",
                record.publication_number, record.regional_status
            );
        }
        sleep(self.query_delay).await;
        enriched
    }
}
