/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::SearchReport;
use crate::workflow::SearchRequest;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；未设置时使用 `default_level`。重复调用不会报错。
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("patent_scout={default_level},warn")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 程序配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 专利检索模式");
    info!("📊 浏览器会话数: {}", config.crawler_pool_size);
    info!("🔑 SerpApi Key 数量: {}", config.serpapi_keys.len());
    if config.serpapi_keys.is_empty() {
        warn!("⚠️ 未配置 SERPAPI_KEYS，发现与详情查询将全部为空");
    }
    info!("{}", "=".repeat(60));
}

/// 记录检索请求
pub fn log_request(request: &SearchRequest) {
    info!("{}", "=".repeat(60));
    info!("🧪 开始检索 {}", request);
    info!("{}", "=".repeat(60));
}

/// 记录阶段切换
///
/// # 参数
/// - `index`: 阶段序号（从 1 开始）
/// - `name`: 阶段名
pub fn log_phase(index: usize, name: &str) {
    info!("\n📍 阶段 {}: {}", index, name);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn log_final_stats(report: &SearchReport) {
    let summary = &report.executive_summary;
    let meta = &report.search_metadata;
    info!("\n{}", "=".repeat(60));
    info!("📊 检索完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 专利总数: {}", summary.total_patents);
    info!("🌍 辖区数: {}", summary.jurisdictions.len());
    info!("👪 专利族: {}", summary.total_families);
    info!(
        "⏱️ 耗时: {}",
        format_duration(Duration::from_secs_f64(meta.duration_seconds.max(0.0)))
    );
    info!("📡 外部调用: {}", meta.external_calls);
    info!("❌ 错误: {}", meta.errors_count);
    for warning in &meta.warnings {
        warn!("⚠️ {}", warning);
    }
    info!("{}", "=".repeat(60));
}

/// 格式化耗时（`1h 2m 3s` / `2m 5s` / `4.20s`）
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_human_readable() {
        assert_eq!(format_duration(Duration::from_millis(4_200)), "4.20s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3_723)), "1h 2m 3s");
    }

    #[test]
    fn long_text_is_truncated_by_chars() {
        assert_eq!(truncate_text("达罗他胺专利", 3), "达罗他...");
        assert_eq!(truncate_text("short", 10), "short");
    }
}
