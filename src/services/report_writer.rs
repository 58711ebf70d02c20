//! 报告写入服务 - 业务能力层
//!
//! 只负责"把报告写成 JSON 文件"能力，不关心流程

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::SearchReport;

/// 报告写入服务
///
/// 职责：
/// - 将 `SearchReport` 序列化为格式化的 JSON
/// - 写入文件（覆盖旧文件）
pub struct ReportWriter {
    output_path: PathBuf,
}

impl ReportWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.output_path
    }

    /// 序列化为格式化 JSON
    pub fn render(report: &SearchReport) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    /// 写入报告
    ///
    /// # 返回
    /// 返回写入的字节数
    pub async fn write(&self, report: &SearchReport) -> AppResult<usize> {
        let json = Self::render(report)?;
        debug!(
            "写入报告: {} | 专利数: {} | 大小: {} 字节",
            self.output_path.display(),
            report.patents.len(),
            json.len()
        );

        tokio::fs::write(&self.output_path, json.as_bytes())
            .await
            .map_err(|e| AppError::io(self.output_path.display().to_string(), e))?;

        Ok(json.len())
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::with_path("patent_report.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExecutionReport, ExecutiveSummary, MoleculeProfile, PatentRecord};
    use std::time::Duration;

    fn report() -> SearchReport {
        let patents = vec![PatentRecord {
            publication_number: "BR112012008823".into(),
            country_code: "BR".into(),
            ..Default::default()
        }];
        SearchReport {
            executive_summary: ExecutiveSummary::summarize(
                "darolutamide",
                &MoleculeProfile::empty("darolutamide"),
                &patents,
                Duration::from_secs(3),
            ),
            patents,
            search_metadata: ExecutionReport::start(),
        }
    }

    #[tokio::test]
    async fn report_is_written_as_json() {
        let path = std::env::temp_dir().join(format!("patent_scout_report_{}.json", std::process::id()));
        let writer = ReportWriter::with_path(&path);

        let written = writer.write(&report()).await.unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, content.len());

        let parsed: SearchReport = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.patents[0].publication_number, "BR112012008823");
        assert_eq!(parsed.executive_summary.jurisdictions["BR"], 1);

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn unwritable_path_is_an_io_error() {
        let writer = ReportWriter::with_path("/nonexistent-dir/for/sure/report.json");
        let err = writer.write(&report()).await.unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }
}
