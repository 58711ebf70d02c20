use thiserror::Error;

/// 应用程序错误类型
///
/// 只有 `Init` 会中断一次检索流程；其余错误在组件边界处被转换为空结果。
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 初始化失败（爬虫池、HTTP 客户端等必需协作者无法启动）
    #[error("初始化失败: {0}")]
    Init(#[from] InitError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件读写错误
    #[error("文件错误 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreationFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 导航超时
    #[error("导航到 {url} 超时 ({timeout_ms} ms)")]
    NavigationTimeout { url: String, timeout_ms: u64 },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 浏览器配置失败
    #[error("浏览器配置失败: {message}")]
    ConfigurationFailed { message: String },
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// API 返回非 200 状态
    #[error("API返回错误状态 ({endpoint}): {status}")]
    BadStatus { endpoint: String, status: u16 },
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 没有可用的 API Key
    #[error("没有可用的 API Key")]
    NoApiKey,
}

/// 初始化错误
#[derive(Debug, Error)]
pub enum InitError {
    /// 爬虫池中某个会话启动失败，整个池初始化失败
    #[error("爬虫池初始化失败 (会话 {index}/{size}): {message}")]
    CrawlerPool {
        index: usize,
        size: usize,
        message: String,
    },
    /// 爬虫池大小非法
    #[error("爬虫池大小必须大于 0")]
    EmptyPool,
    /// HTTP 客户端构建失败
    #[error("HTTP 客户端构建失败 ({client}): {message}")]
    HttpClient { client: String, message: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件解析失败
    #[error("配置文件 {path} 解析失败: {message}")]
    FileParseFailed { path: String, message: String },
    /// 配置值超出允许范围
    #[error("配置项 {field} 的值 {value} 无效: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        AppError::Api(ApiError::RequestFailed {
            endpoint,
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::FileParseFailed {
            path: String::new(),
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io {
            path: String::new(),
            source: err,
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建导航失败错误
    pub fn navigation_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::NavigationFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建爬虫池初始化错误
    pub fn pool_init_failed(index: usize, size: usize, message: impl Into<String>) -> Self {
        AppError::Init(InitError::CrawlerPool {
            index,
            size,
            message: message.into(),
        })
    }

    /// 创建文件错误
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    /// 是否为致命的初始化错误
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Init(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_errors_are_fatal() {
        let err = AppError::pool_init_failed(1, 2, "chrome not found");
        assert!(err.is_fatal());
        assert!(err.to_string().contains("1/2"));

        let err = AppError::Api(ApiError::BadStatus {
            endpoint: "/search.json".into(),
            status: 500,
        });
        assert!(!err.is_fatal());
    }

    #[test]
    fn io_error_keeps_path() {
        let err = AppError::io(
            "report.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("report.json"));
    }
}
