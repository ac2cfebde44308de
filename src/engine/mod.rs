//! 通用分页提取与并发抓取引擎
//!
//! 站点差异全部收敛在提取规则与驱动配置里，引擎本身只关心
//! 分页遍历、并发调度、进度聚合与有序汇总。

pub mod assemble;
pub mod context;
pub mod dispatch;
pub mod pipeline;
pub mod rule;
pub mod simple;
pub mod walker;

pub use context::RunContext;
pub use pipeline::InstallPipeline;
pub use simple::{SimpleDriver, SimpleDriverConfig};
