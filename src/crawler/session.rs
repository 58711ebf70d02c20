//! 浏览器会话抽象
//!
//! 爬虫只依赖这几个 trait；`infrastructure::JsExecutor` 和 `browser::ChromeSession`
//! 是基于 chromiumoxide 的实现，测试中使用内存中的假页面。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AppResult;

/// 单个已打开的页面
#[async_trait]
pub trait PortalPage: Send + Sync {
    /// 导航到 `url`，返回 HTTP 状态码；超过 `timeout` 视为失败
    async fn navigate(&self, url: &str, timeout: Duration) -> AppResult<u16>;

    /// 依次尝试点击候选控件，返回被点击控件的描述
    async fn reveal(&self, targets: &[RevealTarget]) -> AppResult<Option<String>>;

    /// 当前渲染后的 HTML
    async fn html(&self) -> AppResult<String>;

    async fn close(self: Box<Self>) -> AppResult<()>;
}

/// 一个浏览器会话，可以反复打开页面
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn open(&self) -> AppResult<Box<dyn PortalPage>>;

    async fn close(&self) -> AppResult<()>;
}

/// 启动第 `index` 个浏览器会话
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, index: usize) -> AppResult<Arc<dyn PageSource>>;
}

/// 展开国家阶段表时可点击的控件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealTarget {
    /// 标签为 `tag` 且文本包含 `text` 的元素
    Text {
        tag: &'static str,
        text: &'static str,
    },
    /// CSS 选择器
    Css(&'static str),
}

/// 国家阶段标签页的候选控件（按顺序尝试）
pub static NATIONAL_PHASE_TARGETS: &[RevealTarget] = &[
    RevealTarget::Text {
        tag: "a",
        text: "National Phase",
    },
    RevealTarget::Text {
        tag: "button",
        text: "National Phase",
    },
    RevealTarget::Css("#national-phase-tab"),
];

impl RevealTarget {
    pub fn describe(&self) -> String {
        match self {
            RevealTarget::Text { tag, text } => format!("{}:{}", tag, text),
            RevealTarget::Css(css) => css.to_string(),
        }
    }

    /// 在页面中查找并点击控件的脚本，找到返回 `true`
    pub fn click_script(&self) -> String {
        let finder = match self {
            RevealTarget::Text { tag, text } => format!(
                "Array.from(document.querySelectorAll({tag})).find(el => (el.textContent || '').includes({text}))",
                tag = js_string(tag),
                text = js_string(text),
            ),
            RevealTarget::Css(css) => format!("document.querySelector({})", js_string(css)),
        };
        format!(
            r#"
            (() => {{
                const el = {finder};
                if (!el) {{ return false; }}
                el.click();
                return true;
            }})()
            "#
        )
    }
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_are_tried_links_first() {
        let described: Vec<String> = NATIONAL_PHASE_TARGETS.iter().map(|t| t.describe()).collect();
        assert_eq!(
            described,
            vec!["a:National Phase", "button:National Phase", "#national-phase-tab"]
        );
    }

    #[test]
    fn click_script_quotes_arguments() {
        let script = RevealTarget::Css("#national-phase-tab").click_script();
        assert!(script.contains(r##"document.querySelector("#national-phase-tab")"##));
        let script = NATIONAL_PHASE_TARGETS[0].click_script();
        assert!(script.contains(r#"querySelectorAll("a")"#));
        assert!(script.contains(r#"includes("National Phase")"#));
    }
}
