//! 检索请求上下文
//!
//! 封装"这次要查哪个分子、查多少"这一信息

use std::fmt::Display;

use crate::config::Config;

/// 检索请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// 分子名称
    pub molecule: String,

    /// 最多处理的 WO 号数量
    pub max_identifiers: usize,

    /// 是否查询区域注册库（BR）
    pub include_regional: bool,

    /// 门户抓取并发数（1 为顺序执行）
    pub crawl_concurrency: usize,
}

impl SearchRequest {
    /// 使用配置中的默认值创建请求
    pub fn new(molecule: impl Into<String>, config: &Config) -> Self {
        Self {
            molecule: molecule.into().trim().to_string(),
            max_identifiers: config.max_identifiers_default,
            include_regional: true,
            crawl_concurrency: 1,
        }
    }

    pub fn with_max_identifiers(mut self, max_identifiers: usize) -> Self {
        self.max_identifiers = max_identifiers;
        self
    }

    pub fn with_regional(mut self, include_regional: bool) -> Self {
        self.include_regional = include_regional;
        self
    }

    pub fn with_concurrency(mut self, crawl_concurrency: usize) -> Self {
        self.crawl_concurrency = crawl_concurrency.max(1);
        self
    }

    /// 是否并发抓取门户
    pub fn is_concurrent(&self) -> bool {
        self.crawl_concurrency > 1
    }
}

impl Display for SearchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[分子 {} | 最多 {} 个 WO | 区域注册库 {} | 并发 {}]",
            self.molecule,
            self.max_identifiers,
            if self.include_regional { "开" } else { "关" },
            self.crawl_concurrency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_come_from_config() {
        let request = SearchRequest::new(" darolutamide ", &Config::default());
        assert_eq!(request.molecule, "darolutamide");
        assert_eq!(request.max_identifiers, 10);
        assert!(request.include_regional);
        assert!(!request.is_concurrent());
    }

    #[test]
    fn concurrency_is_at_least_one() {
        let request = SearchRequest::new("x", &Config::default()).with_concurrency(0);
        assert_eq!(request.crawl_concurrency, 1);
        assert!(SearchRequest::new("x", &Config::default())
            .with_concurrency(3)
            .is_concurrent());
    }
}
