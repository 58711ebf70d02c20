//! 门户抓取结果模型

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::identifier::Identifier;

/// 年份无法解析时使用的分组
pub const UNKNOWN_YEAR: &str = "unknown";

/// 一个国家阶段申请（属于某个 WO 号）
///
/// 在门户抓取时创建，之后不再修改。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingApplication {
    pub country_code: String,
    pub application_number: String,
    pub filing_date: String,
    pub status: String,
}

impl FilingApplication {
    /// 按申请日期中的 4 位年份分组
    pub fn year_bucket(&self) -> String {
        parse_year(&self.filing_date).unwrap_or_else(|| UNKNOWN_YEAR.to_string())
    }
}

/// 从日期文本中解析 4 位年份（同时支持 `2012-04-27` 与 `27.04.2012`）
pub fn parse_year(date: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?:^|\D)((?:19|20)\d{2})(?:\D|$)").expect("static regex"));
    re.captures(date).map(|cap| cap[1].to_string())
}

/// 按年份分组
pub fn group_by_year(
    applications: impl IntoIterator<Item = FilingApplication>,
) -> BTreeMap<String, Vec<FilingApplication>> {
    let mut grouped: BTreeMap<String, Vec<FilingApplication>> = BTreeMap::new();
    for app in applications {
        grouped.entry(app.year_bucket()).or_default().push(app);
    }
    grouped
}

/// 单字段抽取失败原因
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ExtractFailure {
    /// 所有策略都没有得到非空文本
    #[error("字段 {field} 未匹配 (已尝试 {tried} 个策略)")]
    NoMatch { field: String, tried: usize },
    /// 选择器本身不合法
    #[error("选择器不合法: {selector}")]
    InvalidSelector { selector: String },
}

/// 抽取诊断信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionDiagnostics {
    /// 命中的策略（`字段:策略名`）
    pub strategies_hit: Vec<String>,
    /// 各字段的失败记录
    pub field_failures: Vec<ExtractFailure>,
    /// 点击展开国家阶段所用的控件
    pub reveal_target: Option<String>,
    /// 第几次尝试成功（从 1 开始）
    pub attempt: u32,
}

/// WO 号的书目信息 + 全球申请表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalRecord {
    pub identifier: Identifier,
    pub url: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub applicant: String,
    pub filing_date: String,
    pub publication_date: String,
    pub priority_date: String,
    /// 按年份分组的国家阶段申请
    pub worldwide_applications: BTreeMap<String, Vec<FilingApplication>>,
    /// 出现过的国家（去重、排序）
    pub countries: Vec<String>,
    pub diagnostics: ExtractionDiagnostics,
}

impl PortalRecord {
    pub fn total_applications(&self) -> usize {
        self.worldwide_applications.values().map(Vec::len).sum()
    }

    /// 书目字段和申请表是否全部为空
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.abstract_text.is_empty()
            && self.applicant.is_empty()
            && self.total_applications() == 0
    }

    /// 按年份顺序展开所有申请
    pub fn applications(&self) -> impl Iterator<Item = &FilingApplication> {
        self.worldwide_applications.values().flatten()
    }
}

/// 空结果原因
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", content = "message", rename_all = "snake_case")]
pub enum EmptyReason {
    /// 门户确认不存在（不重试）
    NotFound,
    /// 页面可达但重试后仍没有抽取到数据
    NoDataExtracted,
    /// 导航或抽取过程中的异常，重试后仍失败
    NavigationError(String),
}

impl EmptyReason {
    pub fn code(&self) -> &'static str {
        match self {
            EmptyReason::NotFound => "not_found",
            EmptyReason::NoDataExtracted => "no_data_extracted",
            EmptyReason::NavigationError(_) => "navigation_error",
        }
    }
}

/// 门户抓取结果：有数据，或带原因的空结果
#[derive(Debug, Clone, PartialEq)]
pub enum FilingResult {
    Found(Box<PortalRecord>),
    Empty {
        identifier: String,
        reason: EmptyReason,
    },
}

impl FilingResult {
    pub fn empty(identifier: impl Into<String>, reason: EmptyReason) -> Self {
        FilingResult::Empty {
            identifier: identifier.into(),
            reason,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, FilingResult::Found(_))
    }

    pub fn record(&self) -> Option<&PortalRecord> {
        match self {
            FilingResult::Found(record) => Some(record.as_ref()),
            FilingResult::Empty { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&EmptyReason> {
        match self {
            FilingResult::Found(_) => None,
            FilingResult::Empty { reason, .. } => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(country: &str, date: &str) -> FilingApplication {
        FilingApplication {
            country_code: country.into(),
            application_number: format!("{country}123"),
            filing_date: date.into(),
            status: String::new(),
        }
    }

    #[test]
    fn year_parsing_handles_portal_formats() {
        assert_eq!(parse_year("2012-04-27").as_deref(), Some("2012"));
        assert_eq!(parse_year("27.04.2012").as_deref(), Some("2012"));
        assert_eq!(parse_year("pending"), None);
        assert_eq!(parse_year("123456"), None);
    }

    #[test]
    fn groups_unknown_years_together() {
        let grouped = group_by_year(vec![
            app("BR", "27.04.2012"),
            app("US", "2012-05-01"),
            app("EP", ""),
            app("JP", "n/a"),
        ]);
        assert_eq!(grouped["2012"].len(), 2);
        assert_eq!(grouped[UNKNOWN_YEAR].len(), 2);
    }

    #[test]
    fn reason_codes() {
        assert_eq!(EmptyReason::NotFound.code(), "not_found");
        assert_eq!(EmptyReason::NoDataExtracted.code(), "no_data_extracted");
        assert_eq!(
            EmptyReason::NavigationError("timeout".into()).code(),
            "navigation_error"
        );
    }
}
