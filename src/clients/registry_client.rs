/// 区域注册库（巴西 INPI）客户端
///
/// 查询 `?medicine={号码}`，只读取 `data` 中的第一条记录
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::clients::json_fields::{objects, text};
use crate::error::{ApiError, AppError, AppResult, InitError};
use crate::models::{RegistryEvent, RegistryResult};

/// 区域注册库数据源
#[async_trait]
pub trait RegistrySource: Send + Sync {
    async fn get_details(&self, publication_number: &str) -> RegistryResult;
}

/// 区域注册库客户端
pub struct RegionalRegistryClient {
    http: Client,
    endpoint: String,
}

impl RegionalRegistryClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InitError::HttpClient {
                client: "regional_registry".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    async fn query(&self, medicine: &str) -> AppResult<Value> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("medicine", medicine)])
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

        Ok(response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::JsonParseFailed {
                source: Box::new(e),
            })?)
    }
}

#[async_trait]
impl RegistrySource for RegionalRegistryClient {
    async fn get_details(&self, publication_number: &str) -> RegistryResult {
        let medicine = registry_query(publication_number);
        info!("🔍 查询区域注册库: {}", publication_number);

        let response = match self.query(&medicine).await {
            Ok(response) => response,
            Err(e) => {
                warn!("  ⚠️ 区域注册库查询失败 {}: {}", publication_number, e);
                return RegistryResult::empty(publication_number);
            }
        };

        let Some(entry) = objects(&response, "data").next() else {
            warn!("  ⚠️ 区域注册库无记录: {}", publication_number);
            return RegistryResult::empty(publication_number);
        };

        info!("  ✅ 区域注册库命中: {}", publication_number);
        RegistryResult {
            found: true,
            publication_number: publication_number.to_string(),
            status: text(entry, "status"),
            process_number: text(entry, "processNumber"),
            title: text(entry, "title"),
            applicant: text(entry, "applicant"),
            deposit_date: text(entry, "depositDate"),
            publication_date: text(entry, "publicationDate"),
            full_text: text(entry, "fullText"),
            events: objects(entry, "events")
                .map(|e| RegistryEvent {
                    date: text(e, "date"),
                    event_type: text(e, "type"),
                    description: text(e, "description"),
                })
                .collect(),
        }
    }
}

/// 去掉空格和连字符、转大写、去掉 `BR` 前缀
pub fn registry_query(publication_number: &str) -> String {
    let cleaned: String = publication_number
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect::<String>()
        .to_uppercase();
    match cleaned.strip_prefix("BR") {
        Some(rest) => rest.to_string(),
        None => cleaned,
    }
}
