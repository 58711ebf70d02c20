//! 门户爬取层
//!
//! - `session`：浏览器会话抽象（页面、会话、启动器）
//! - `extraction`：纯函数抽取策略
//! - `backoff`：重试退避策略
//! - `portal_crawler`：单个爬虫的重试循环
//! - `pool`：固定大小的爬虫池

pub mod backoff;
pub mod extraction;
pub mod pool;
pub mod portal_crawler;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use backoff::BackoffPolicy;
pub use pool::{PooledCrawler, PortalCrawlerPool};
pub use portal_crawler::{CrawlerSettings, PortalCrawler};
pub use session::{PageSource, PortalPage, RevealTarget, SessionLauncher, NATIONAL_PHASE_TARGETS};
