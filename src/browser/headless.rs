use std::path::{Path, PathBuf};

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult, BrowserError};

/// 启动参数
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub executable: Option<String>,
    /// 每个会话独立的用户数据目录
    pub user_data_dir: PathBuf,
}

/// 启动浏览器（无头或有界面），返回浏览器和事件处理任务
pub async fn launch_browser(options: &LaunchOptions) -> AppResult<(Browser, JoinHandle<()>)> {
    info!("🚀 启动浏览器 (无头: {})...", options.headless);
    debug!("用户数据目录: {}", options.user_data_dir.display());

    let mut builder = BrowserConfig::builder();
    builder = if options.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(executable) = &options.executable {
        builder = builder.chrome_executable(Path::new(executable));
    }

    let config = builder
        .user_data_dir(&options.user_data_dir)
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",             // 容器中没有沙盒权限
            "--disable-dev-shm-usage",  // 防止共享内存不足
            "--remote-debugging-port=0",
        ])
        .build()
        .map_err(|message| {
            error!("配置浏览器失败: {}", message);
            BrowserError::ConfigurationFailed { message }
        })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        AppError::Browser(BrowserError::LaunchFailed {
            source: Box::new(e),
        })
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handle = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    Ok((browser, handle))
}
