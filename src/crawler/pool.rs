//! 门户爬虫池
//!
//! 固定数量的浏览器会话，按轮询方式分配。池拥有所有会话的生命周期：
//! 初始化要么全部成功，要么关闭已启动的会话并返回致命错误。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::crawler::portal_crawler::{CrawlerSettings, PortalCrawler};
use crate::crawler::session::{PageSource, SessionLauncher};
use crate::error::{AppError, AppResult, InitError};
use crate::models::FilingResult;

/// 从池中借出的爬虫
///
/// 同一个爬虫同一时刻只会被一个调用使用（由互斥锁保证）。
#[derive(Clone)]
pub struct PooledCrawler {
    pub index: usize,
    inner: Arc<Mutex<PortalCrawler>>,
}

impl PooledCrawler {
    pub async fn fetch(&self, raw_identifier: &str) -> FilingResult {
        let crawler = self.inner.lock().await;
        crawler.fetch(raw_identifier).await
    }
}

/// 爬虫池
pub struct PortalCrawlerPool {
    crawlers: Vec<Arc<Mutex<PortalCrawler>>>,
    cursor: AtomicUsize,
}

impl PortalCrawlerPool {
    /// 启动 `size` 个浏览器会话
    ///
    /// # 返回
    /// 任意一个会话启动失败时，已启动的会话会被关闭，并返回 `InitError`
    pub async fn initialize(
        size: usize,
        settings: CrawlerSettings,
        launcher: &dyn SessionLauncher,
    ) -> AppResult<Self> {
        if size == 0 {
            return Err(InitError::EmptyPool.into());
        }
        info!("🚀 正在启动 {} 个浏览器会话...", size);

        let mut sessions: Vec<Arc<dyn PageSource>> = Vec::with_capacity(size);
        for index in 0..size {
            match launcher.launch(index).await {
                Ok(session) => {
                    info!("  ✓ 会话 {}/{} 已就绪", index + 1, size);
                    sessions.push(session);
                }
                Err(e) => {
                    error!("  ❌ 会话 {}/{} 启动失败: {}", index + 1, size, e);
                    for session in &sessions {
                        if let Err(close_err) = session.close().await {
                            warn!("关闭会话失败: {}", close_err);
                        }
                    }
                    return Err(AppError::pool_init_failed(index, size, e.to_string()));
                }
            }
        }

        Self::from_sessions(sessions, settings)
    }

    /// 使用已建立的会话组建爬虫池
    pub fn from_sessions(
        sessions: Vec<Arc<dyn PageSource>>,
        settings: CrawlerSettings,
    ) -> AppResult<Self> {
        if sessions.is_empty() {
            return Err(InitError::EmptyPool.into());
        }
        let crawlers = sessions
            .into_iter()
            .enumerate()
            .map(|(index, session)| {
                Arc::new(Mutex::new(PortalCrawler::new(index, session, settings.clone())))
            })
            .collect();
        Ok(Self {
            crawlers,
            cursor: AtomicUsize::new(0),
        })
    }

    /// 轮询借出下一个爬虫
    pub fn acquire(&self) -> PooledCrawler {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.crawlers.len();
        PooledCrawler {
            index,
            inner: self.crawlers[index].clone(),
        }
    }

    pub fn size(&self) -> usize {
        self.crawlers.len()
    }

    /// 关闭所有会话，错误只记录不返回
    pub async fn shutdown(&self) {
        for crawler in &self.crawlers {
            let crawler = crawler.lock().await;
            match crawler.close().await {
                Ok(()) => info!("✓ 已关闭爬虫 {}", crawler.index()),
                Err(e) => warn!("⚠️ 关闭爬虫 {} 失败: {}", crawler.index(), e),
            }
        }
    }
}
