/// SerpApi 客户端
///
/// 封装 `search.json` 调用，所有请求都从共享的 `KeyRotation` 取 Key
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::clients::key_rotation::KeyRotation;
use crate::error::{ApiError, AppError, AppResult, InitError};

/// 搜索结果中的一条自然结果
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrganicResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub patent_id: String,
}

impl OrganicResult {
    /// 用于抽取 WO 号的文本（标题 + 摘要 + 专利号/链接）
    pub fn searchable_text(&self) -> String {
        let tail = if self.patent_id.is_empty() {
            &self.link
        } else {
            &self.patent_id
        };
        format!("{} {} {}", self.title, self.snippet, tail)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    organic_results: Vec<OrganicResult>,
}

/// SerpApi 客户端
#[derive(Clone)]
pub struct SerpApiClient {
    http: Client,
    endpoint: String,
    keys: Arc<KeyRotation>,
}

impl SerpApiClient {
    /// 创建客户端
    ///
    /// # 参数
    /// - `base_url`: SerpApi 根地址（不含 `/search.json`）
    /// - `keys`: 共享的 Key 轮换器
    /// - `timeout`: 单次请求超时
    pub fn new(base_url: &str, keys: Arc<KeyRotation>, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InitError::HttpClient {
                client: "serpapi".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            endpoint: format!("{}/search.json", base_url.trim_end_matches('/')),
            keys,
        })
    }

    /// 调用指定 engine 并返回自然结果
    pub async fn search(&self, engine: &str, query: &str, num: u32) -> AppResult<Vec<OrganicResult>> {
        let num = num.to_string();
        let body = self
            .get(&[("engine", engine), ("q", query), ("num", num.as_str())])
            .await?;
        let parsed: SearchResponse = serde_json::from_value(body)?;
        debug!(
            "SerpApi {} 返回 {} 条结果 (q={})",
            engine,
            parsed.organic_results.len(),
            query
        );
        Ok(parsed.organic_results)
    }

    /// 发送一次 GET 请求，附带轮换得到的 api_key
    ///
    /// # 返回
    /// 非 200 状态返回 `ApiError::BadStatus`
    pub async fn get(&self, params: &[(&str, &str)]) -> AppResult<Value> {
        let api_key = self.keys.next_key()?;
        let response = self
            .http
            .get(&self.endpoint)
            .query(params)
            .query(&[("api_key", api_key.as_str())])
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::BadStatus {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::JsonParseFailed {
                source: Box::new(e),
            })?;
        Ok(body)
    }
}
