//! 检索报告模型

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::molecule::MoleculeProfile;
use super::patent::PatentRecord;

/// 执行统计，每次检索创建一次，由编排器单独写入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub query_timestamp: DateTime<Utc>,
    /// 实际联系过的数据源
    pub sources_used: BTreeSet<String>,
    pub identifiers_found: usize,
    pub identifiers_processed: usize,
    pub external_calls: usize,
    pub errors_count: usize,
    pub warnings: Vec<String>,
    pub duration_seconds: f64,
}

impl ExecutionReport {
    pub fn start() -> Self {
        Self {
            query_timestamp: Utc::now(),
            sources_used: BTreeSet::new(),
            identifiers_found: 0,
            identifiers_processed: 0,
            external_calls: 0,
            errors_count: 0,
            warnings: Vec::new(),
            duration_seconds: 0.0,
        }
    }

    pub fn record_source(&mut self, source: impl Into<String>) {
        self.sources_used.insert(source.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn record_error(&mut self) {
        self.errors_count += 1;
    }

    pub fn record_calls(&mut self, calls: usize) {
        self.external_calls += calls;
    }

    pub fn finalize(&mut self, elapsed: Duration) {
        self.duration_seconds = round2(elapsed.as_secs_f64());
    }
}

/// 执行摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub molecule_name: String,
    pub generic_name: String,
    pub registry_number: Option<String>,
    pub molecular_formula: String,
    pub total_patents: usize,
    pub total_families: usize,
    /// 辖区 → 专利数量
    pub jurisdictions: BTreeMap<String, usize>,
    pub search_duration_seconds: f64,
}

impl ExecutiveSummary {
    /// 根据专利列表生成摘要
    pub fn summarize(
        molecule_name: &str,
        profile: &MoleculeProfile,
        patents: &[PatentRecord],
        elapsed: Duration,
    ) -> Self {
        let mut jurisdictions: BTreeMap<String, usize> = BTreeMap::new();
        for patent in patents {
            *jurisdictions.entry(patent.country_code.clone()).or_default() += 1;
        }
        let families: BTreeSet<&str> = patents
            .iter()
            .map(|p| p.family_id.as_str())
            .filter(|id| !id.is_empty())
            .collect();

        Self {
            molecule_name: molecule_name.to_string(),
            generic_name: profile.molecule_name.clone(),
            registry_number: profile.cas_number.clone(),
            molecular_formula: profile.molecular_formula.clone(),
            total_patents: patents.len(),
            total_families: families.len(),
            jurisdictions,
            search_duration_seconds: round2(elapsed.as_secs_f64()),
        }
    }
}

/// 最终报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub executive_summary: ExecutiveSummary,
    pub patents: Vec<PatentRecord>,
    pub search_metadata: ExecutionReport,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
