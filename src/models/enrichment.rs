//! 补充数据源的结果模型
//!
//! 两个客户端在失败时都返回"字段齐全但为空"的结果，调用方无需区分"无数据"和"出错"。

use serde::{Deserialize, Serialize};

/// 单个专利的详细书目信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailsResult {
    pub found: bool,
    pub publication_number: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub claims: String,
    pub assignee: String,
    pub inventors: Vec<String>,
    pub priority_date: String,
    pub filing_date: String,
    pub publication_date: String,
    pub grant_date: String,
    pub legal_status: String,
    pub family_id: String,
    pub family_size: Option<u32>,
    pub cpc_classifications: Vec<String>,
    pub ipc_classifications: Vec<String>,
    pub url: String,
    pub pdf_url: String,
}

impl DetailsResult {
    pub fn empty(publication_number: impl Into<String>) -> Self {
        let publication_number = publication_number.into();
        Self {
            url: format!("https://patents.google.com/patent/{publication_number}"),
            publication_number,
            ..Default::default()
        }
    }
}

/// 区域注册库事件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryEvent {
    pub date: String,
    pub event_type: String,
    pub description: String,
}

/// 区域注册库查询结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryResult {
    pub found: bool,
    pub publication_number: String,
    pub status: String,
    pub process_number: String,
    pub title: String,
    pub applicant: String,
    pub deposit_date: String,
    pub publication_date: String,
    pub full_text: String,
    pub events: Vec<RegistryEvent>,
}

impl RegistryResult {
    pub fn empty(publication_number: impl Into<String>) -> Self {
        Self {
            publication_number: publication_number.into(),
            ..Default::default()
        }
    }
}
