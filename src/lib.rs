//! # Patent Scout
//!
//! 按分子名检索药物专利，并合并多个数据源的结果
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure / Clients）
//! - `infrastructure/` - 持有浏览器页面，只暴露能力
//! - `JsExecutor` - 页面导航、点击、取 HTML
//! - `clients/` - PubChem / SerpApi / 详情接口 / 区域注册库的 HTTP 客户端
//!
//! ### ② 业务能力层（Services / Crawler）
//! - `MoleculeResolver` - 分子名 → 研发代号、CAS 号、同义词
//! - `IdentifierDiscoveryService` - 多策略发现 WO 号
//! - `PortalCrawler` - 抓取门户详情页和国家阶段表格
//! - `PortalCrawlerPool` - 固定大小的浏览器会话池
//!
//! ### ③ 流程层（Workflow）
//! - `SearchRequest` - 一次检索的参数
//! - `EnrichmentFlow` - 单个申请的补全流程（门户 → 详情 → 区域注册库）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/pipeline` - 检索状态机
//! - `orchestrator/app` - 资源管理和报告输出
//!
//! ## 模块结构

pub mod browser;
pub mod clients;
pub mod config;
pub mod crawler;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::JsExecutor;
pub use models::{Identifier, PatentRecord, SearchReport};
pub use orchestrator::{App, Pipeline, PipelineState};
pub use workflow::{EnrichmentFlow, SearchRequest};
