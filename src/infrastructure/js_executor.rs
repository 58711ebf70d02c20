//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"导航 / 执行 JS / 读取 HTML"的能力

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::crawler::session::{PortalPage, RevealTarget};
use crate::error::{AppError, AppResult, BrowserError};

/// 读取当前文档的 HTTP 状态码（不支持时返回 null）
const RESPONSE_STATUS_SCRIPT: &str = r#"
    (() => {
        const entry = performance.getEntriesByType('navigation')[0];
        return entry && entry.responseStatus ? entry.responseStatus : null;
    })()
"#;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识 WO 号 / 专利
/// - 不处理重试与抽取
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    ///
    /// # 参数
    /// - `js_code`: 要执行的 JavaScript 代码
    ///
    /// # 返回
    /// 返回 JSON 值
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await.map_err(|e| {
            AppError::Browser(BrowserError::ScriptExecutionFailed {
                source: Box::new(e),
            })
        })?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }
}

#[async_trait]
impl PortalPage for JsExecutor {
    async fn navigate(&self, url: &str, timeout: Duration) -> AppResult<u16> {
        debug!("导航到: {}", url);
        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .map_err(|_| BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })?
            .map_err(|e| AppError::navigation_failed(url, e))?;

        // 部分浏览器版本没有 responseStatus，此时按 200 处理
        let status: Option<u16> = self.eval_as(RESPONSE_STATUS_SCRIPT).await.unwrap_or(None);
        Ok(status.unwrap_or(200))
    }

    async fn reveal(&self, targets: &[RevealTarget]) -> AppResult<Option<String>> {
        for target in targets {
            let clicked: bool = self.eval_as(target.click_script()).await?;
            if clicked {
                return Ok(Some(target.describe()));
            }
        }
        Ok(None)
    }

    async fn html(&self) -> AppResult<String> {
        Ok(self.page.content().await?)
    }

    async fn close(self: Box<Self>) -> AppResult<()> {
        self.page.close().await?;
        Ok(())
    }
}
