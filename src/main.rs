use anyhow::{bail, Context, Result};
use patent_scout::utils::logging;
use patent_scout::{App, Config, SearchRequest};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(&config.log_level);

    let request = parse_request(std::env::args().skip(1), &config)?;

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    let report = app.run(&request).await;
    app.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// `patent_scout <分子名> [最大 WO 数]`
///
/// `INCLUDE_REGIONAL` / `CRAWL_CONCURRENCY` 从环境变量读取
fn parse_request(mut args: impl Iterator<Item = String>, config: &Config) -> Result<SearchRequest> {
    let Some(molecule) = args.next().filter(|m| !m.trim().is_empty()) else {
        bail!("用法: patent_scout <molecule> [max_identifiers]");
    };

    let mut request = SearchRequest::new(&molecule, config);
    if let Some(max) = args.next() {
        let max: usize = max
            .parse()
            .with_context(|| format!("max_identifiers 必须是整数: {max}"))?;
        request = request.with_max_identifiers(max);
    }
    if let Ok(value) = std::env::var("INCLUDE_REGIONAL") {
        request = request.with_regional(!matches!(value.as_str(), "0" | "false" | "no"));
    }
    if let Some(concurrency) = std::env::var("CRAWL_CONCURRENCY")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        request = request.with_concurrency(concurrency);
    }
    Ok(request)
}
