use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError};

/// 程序配置
///
/// 所有数值参数都有默认值；环境变量覆盖配置文件，配置文件覆盖默认值。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 爬虫池配置 ---
    /// 浏览器会话数量
    pub crawler_pool_size: usize,
    /// 单次页面导航超时（毫秒）
    pub crawler_timeout_ms: u64,
    /// 单个 WO 号的最大尝试次数
    pub crawler_max_retries: u32,
    /// 页面加载后等待脚本渲染的时间（毫秒）
    pub page_settle_ms: u64,
    /// 点击 National Phase 后等待异步内容的时间（毫秒）
    pub reveal_settle_ms: u64,
    /// 是否无头模式
    pub headless: bool,
    /// 浏览器可执行文件路径（为空时由 chromiumoxide 自动查找）
    pub browser_executable: Option<String>,
    /// 浏览器调试端口（设置后连接已有浏览器而不是启动新浏览器）
    pub browser_debug_port: Option<u16>,

    // --- 限流配置 ---
    /// 两个 WO 号之间的等待时间（秒）
    pub delay_between_identifiers: f64,
    /// 两次 API 查询之间的等待时间（秒）
    pub delay_between_queries: f64,

    // --- 检索配置 ---
    /// 默认最多处理的 WO 号数量
    pub max_identifiers_default: usize,
    /// 详情补全阶段最多处理的申请数量
    pub max_applications: usize,
    /// REST 调用超时（秒）
    pub http_timeout_secs: u64,
    /// 区域注册库调用超时（秒）
    pub regional_timeout_secs: u64,

    // --- 外部服务地址 ---
    pub portal_base_url: String,
    pub serpapi_base_url: String,
    pub pubchem_base_url: String,
    pub regional_api_url: String,
    /// 详情接口使用的 SerpApi engine
    pub details_engine: String,
    /// SerpApi Key 列表（轮换使用）
    pub serpapi_keys: Vec<String>,

    // --- 输出配置 ---
    /// 日志级别（RUST_LOG 未设置时使用）
    pub log_level: String,
    /// 报告输出文件
    pub report_output_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawler_pool_size: 2,
            crawler_timeout_ms: 60_000,
            crawler_max_retries: 3,
            page_settle_ms: 2_000,
            reveal_settle_ms: 3_000,
            headless: true,
            browser_executable: None,
            browser_debug_port: None,
            delay_between_identifiers: 2.0,
            delay_between_queries: 1.0,
            max_identifiers_default: 10,
            max_applications: 50,
            http_timeout_secs: 30,
            regional_timeout_secs: 60,
            portal_base_url: "https://patentscope.wipo.int".to_string(),
            serpapi_base_url: "https://serpapi.com".to_string(),
            pubchem_base_url: "https://pubchem.ncbi.nlm.nih.gov/rest/pug".to_string(),
            regional_api_url: "https://crawler3-production.up.railway.app/api/data/inpi/patents"
                .to_string(),
            details_engine: "google_patents_details".to_string(),
            serpapi_keys: Vec::new(),
            log_level: "info".to_string(),
            report_output_file: "patent_report.json".to_string(),
        }
    }
}

impl Config {
    /// 只从环境变量加载（未设置的字段使用默认值）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，缺失字段使用默认值
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(path.display().to_string(), e))?;
        toml::from_str(&content).map_err(|e| {
            AppError::Config(ConfigError::FileParseFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })
    }

    /// 加载配置：`PATENT_SCOUT_CONFIG` 指向的文件（可选） + 环境变量覆盖
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("PATENT_SCOUT_CONFIG") {
            Ok(path) if !path.is_empty() => Self::from_file(path)?,
            _ => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 检查数值配置：延迟必须是有限值且不超过 1 小时，重试次数至少为 1
    pub fn validate(&self) -> AppResult<()> {
        for (field, value) in [
            ("delay_between_identifiers", self.delay_between_identifiers),
            ("delay_between_queries", self.delay_between_queries),
        ] {
            if !value.is_finite() || !(0.0..=MAX_DELAY_SECS).contains(&value) {
                return Err(invalid(field, value, "必须在 0 到 3600 秒之间"));
            }
        }
        if self.crawler_max_retries == 0 {
            return Err(invalid("crawler_max_retries", 0, "至少为 1"));
        }
        Ok(())
    }

    fn with_env_overrides(self) -> Self {
        let d = self;
        Self {
            crawler_pool_size: env_parse("CRAWLER_POOL_SIZE").unwrap_or(d.crawler_pool_size),
            crawler_timeout_ms: env_parse("CRAWLER_TIMEOUT").unwrap_or(d.crawler_timeout_ms),
            crawler_max_retries: env_parse("CRAWLER_MAX_RETRIES").unwrap_or(d.crawler_max_retries),
            page_settle_ms: env_parse("PAGE_SETTLE_MS").unwrap_or(d.page_settle_ms),
            reveal_settle_ms: env_parse("REVEAL_SETTLE_MS").unwrap_or(d.reveal_settle_ms),
            headless: env_parse("HEADLESS").unwrap_or(d.headless),
            browser_executable: std::env::var("BROWSER_EXECUTABLE").ok().or(d.browser_executable),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").or(d.browser_debug_port),
            delay_between_identifiers: env_parse("DELAY_BETWEEN_WOS").unwrap_or(d.delay_between_identifiers),
            delay_between_queries: env_parse("DELAY_BETWEEN_QUERIES").unwrap_or(d.delay_between_queries),
            max_identifiers_default: env_parse("MAX_WOS_DEFAULT").unwrap_or(d.max_identifiers_default),
            max_applications: env_parse("MAX_APPLICATIONS").unwrap_or(d.max_applications),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS").unwrap_or(d.http_timeout_secs),
            regional_timeout_secs: env_parse("REGIONAL_TIMEOUT_SECS").unwrap_or(d.regional_timeout_secs),
            portal_base_url: std::env::var("PORTAL_BASE_URL").unwrap_or(d.portal_base_url),
            serpapi_base_url: std::env::var("SERPAPI_BASE_URL").unwrap_or(d.serpapi_base_url),
            pubchem_base_url: std::env::var("PUBCHEM_BASE_URL").unwrap_or(d.pubchem_base_url),
            regional_api_url: std::env::var("INPI_API_URL").unwrap_or(d.regional_api_url),
            details_engine: std::env::var("DETAILS_ENGINE").unwrap_or(d.details_engine),
            serpapi_keys: std::env::var("SERPAPI_KEYS")
                .ok()
                .map(|v| parse_key_list(&v))
                .filter(|keys| !keys.is_empty())
                .unwrap_or(d.serpapi_keys),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(d.log_level),
            report_output_file: std::env::var("REPORT_OUTPUT_FILE").unwrap_or(d.report_output_file),
        }
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.crawler_timeout_ms)
    }

    pub fn identifier_delay(&self) -> Duration {
        delay_from_secs(self.delay_between_identifiers)
    }

    pub fn query_delay(&self) -> Duration {
        delay_from_secs(self.delay_between_queries)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn regional_timeout(&self) -> Duration {
        Duration::from_secs(self.regional_timeout_secs)
    }
}

const MAX_DELAY_SECS: f64 = 3600.0;

/// 非有限值按 0 处理，上限 `MAX_DELAY_SECS`
fn delay_from_secs(secs: f64) -> Duration {
    if secs.is_finite() {
        Duration::from_secs_f64(secs.clamp(0.0, MAX_DELAY_SECS))
    } else {
        Duration::ZERO
    }
}

fn invalid(field: &str, value: impl std::fmt::Display, reason: &str) -> AppError {
    AppError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// 解析逗号分隔的 Key 列表，忽略空项
fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
