//! 专利详情补全客户端
//!
//! 通过 SerpApi 的详情 engine 查询单个公开号的书目信息。
//! 任何失败（非 200、网络错误、解析错误）都返回 `DetailsResult::empty`。

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::clients::json_fields::{count, names, opt_text, text};
use crate::clients::serpapi_client::SerpApiClient;
use crate::models::DetailsResult;

/// 详情数据源
#[async_trait]
pub trait DetailsSource: Send + Sync {
    async fn get_details(&self, publication_number: &str) -> DetailsResult;
}

/// 详情补全客户端
pub struct DetailsEnrichmentClient {
    serpapi: SerpApiClient,
    engine: String,
}

impl DetailsEnrichmentClient {
    pub fn new(serpapi: SerpApiClient, engine: impl Into<String>) -> Self {
        Self {
            serpapi,
            engine: engine.into(),
        }
    }
}

#[async_trait]
impl DetailsSource for DetailsEnrichmentClient {
    async fn get_details(&self, publication_number: &str) -> DetailsResult {
        info!("🔍 查询专利详情: {}", publication_number);

        let body = match self
            .serpapi
            .get(&[
                ("engine", self.engine.as_str()),
                ("patent_id", publication_number),
            ])
            .await
        {
            Ok(body) => body,
            Err(e) => {
                warn!("  ⚠️ 详情查询失败 {}: {}", publication_number, e);
                return DetailsResult::empty(publication_number);
            }
        };

        if !body.is_object() {
            warn!("  ⚠️ 详情响应不是对象 {}", publication_number);
            return DetailsResult::empty(publication_number);
        }
        info!("  ✅ 获取到详情: {}", publication_number);
        into_result(publication_number, &body)
    }
}

fn into_result(publication_number: &str, data: &Value) -> DetailsResult {
    let fallback = DetailsResult::empty(publication_number);
    DetailsResult {
        found: true,
        publication_number: publication_number.to_string(),
        title: text(data, "title"),
        abstract_text: text(data, "abstract"),
        claims: data.get("claims").map(join_claims).unwrap_or_default(),
        assignee: text(data, "assignee"),
        inventors: names(data, "inventors"),
        priority_date: text(data, "priority_date"),
        filing_date: text(data, "filing_date"),
        publication_date: text(data, "publication_date"),
        grant_date: text(data, "grant_date"),
        legal_status: text(data, "legal_status"),
        family_id: text(data, "family_id"),
        family_size: count(data, "family_size"),
        cpc_classifications: names(data, "cpc_classifications"),
        ipc_classifications: names(data, "ipc_classifications"),
        url: opt_text(data, "url").unwrap_or(fallback.url),
        pdf_url: text(data, "pdf_url"),
    }
}

/// 权利要求：对象列表拼接为 `"{num}. {text}"`，字符串原样返回
fn join_claims(claims: &Value) -> String {
    match claims {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|claim| {
                let num = match claim.get("num") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => String::new(),
                };
                let text = claim.get("text").and_then(Value::as_str).unwrap_or_default();
                format!("{}. {}", num, text)
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
        _ => String::new(),
    }
}
