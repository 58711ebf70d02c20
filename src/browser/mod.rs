//! chromiumoxide 浏览器会话
//!
//! `ChromeLauncher` 为爬虫池启动会话：配置了调试端口时连接已有浏览器，
//! 否则为每个会话启动独立的浏览器进程。

pub mod connection;
pub mod headless;

use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::Browser;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::Config;
use crate::crawler::session::{PageSource, PortalPage, SessionLauncher};
use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::JsExecutor;

pub use connection::connect_to_browser;
pub use headless::{launch_browser, LaunchOptions};

/// 一个浏览器会话
pub struct ChromeSession {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    /// 由本程序启动的浏览器在关闭时结束进程；连接的浏览器只断开
    owned: bool,
}

impl ChromeSession {
    pub fn new(browser: Browser, handler: JoinHandle<()>, owned: bool) -> Self {
        Self {
            browser: Mutex::new(browser),
            handler,
            owned,
        }
    }
}

#[async_trait]
impl PageSource for ChromeSession {
    async fn open(&self) -> AppResult<Box<dyn PortalPage>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| {
                AppError::Browser(BrowserError::PageCreationFailed {
                    source: Box::new(e),
                })
            })?;
        Ok(Box::new(JsExecutor::new(page)))
    }

    async fn close(&self) -> AppResult<()> {
        if self.owned {
            let mut browser = self.browser.lock().await;
            browser.close().await?;
            if let Err(e) = browser.wait().await {
                debug!("等待浏览器退出失败: {}", e);
            }
        }
        self.handler.abort();
        Ok(())
    }
}

/// 会话启动器
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    headless: bool,
    executable: Option<String>,
    debug_port: Option<u16>,
}

impl ChromeLauncher {
    pub fn from_config(config: &Config) -> Self {
        Self {
            headless: config.headless,
            executable: config.browser_executable.clone(),
            debug_port: config.browser_debug_port,
        }
    }

    fn launch_options(&self, index: usize) -> LaunchOptions {
        LaunchOptions {
            headless: self.headless,
            executable: self.executable.clone(),
            user_data_dir: std::env::temp_dir()
                .join(format!("patent_scout-{}-{}", std::process::id(), index)),
        }
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn launch(&self, index: usize) -> AppResult<Arc<dyn PageSource>> {
        let session = match self.debug_port {
            Some(port) => {
                let (browser, handler) = connect_to_browser(port).await?;
                ChromeSession::new(browser, handler, false)
            }
            None => {
                let (browser, handler) = launch_browser(&self.launch_options(index)).await?;
                ChromeSession::new(browser, handler, true)
            }
        };
        info!("✓ 浏览器会话 {} 已建立", index);
        Ok(Arc::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_session_gets_its_own_profile_dir() {
        let launcher = ChromeLauncher::from_config(&Config::default());
        let a = launcher.launch_options(0).user_data_dir;
        let b = launcher.launch_options(1).user_data_dir;
        assert_ne!(a, b);
        assert!(launcher.launch_options(0).headless);
    }
}
