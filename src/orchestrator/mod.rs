//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责资源管理和阶段调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行、清理）
//! - 创建 HTTP 客户端和浏览器爬虫池
//! - 写出最终报告
//!
//! ### `pipeline` - 检索流水线
//! - 按固定顺序推进各阶段（状态只能向前）
//! - 控制门户抓取的并发方式（顺序 / buffered）
//! - 汇总执行统计（数据源、外部调用、错误、警告）
//!
//! ## 层次关系
//!
//! ```text
//! app (资源 + 报告)
//!     ↓
//! pipeline (处理一个分子)
//!     ↓
//! workflow::EnrichmentFlow (处理单个申请)
//!     ↓
//! services / crawler (能力层：解析 / 发现 / 门户抓取)
//!     ↓
//! clients / infrastructure (HTTP 客户端、JsExecutor)
//! ```
//!
//! ## 设计原则
//!
//! 1. **资源隔离**：只有编排层持有爬虫池
//! 2. **向下依赖**：编排层 → workflow → services → clients
//! 3. **单写者**：执行统计只由流水线写入

pub mod app;
pub mod pipeline;

pub use app::App;
pub use pipeline::{Pipeline, PipelineSettings, PipelineState};
