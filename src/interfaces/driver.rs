//! 驱动定义
//!
//! 定义站点驱动需要实现的核心能力接口，以及引擎消费的抓取传输层接口。

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use crate::core::error::Result;
use crate::core::model::{Chapter, WorkItem};
use crate::engine::context::RunContext;

/// 任务参数 (KEY=VALUE)
pub type TaskArgs = HashMap<String, String>;

/// 抓取传输层接口
///
/// 引擎只依赖"给定 URL 取回文档"这一能力；重试、编码解码与超时
/// 全部由实现方负责。测试中以内存桩替换。
#[async_trait]
pub trait PageSource: Send + Sync {
    /// 抓取文本文档（HTML 或 JSON），按站点编码解码
    async fn fetch_text(&self, url: &str) -> Result<String>;

    /// 抓取二进制资源，返回内容及响应的 Content-Type
    async fn fetch_bytes(&self, url: &str) -> Result<(Bytes, Option<String>)>;
}

/// 站点驱动 Trait
///
/// 每个站点实现两个操作：走完顶层分页产出工作列表 (`list_index`)、
/// 抓取单个工作单元的完整内容 (`fetch_unit`，自动处理子分页)。
/// 变体通过注册表按配置选择，而非继承。
#[async_trait]
pub trait Driver: Send + Sync {
    /// 站点唯一标识
    fn id(&self) -> &str;

    /// 顶层索引：走完章节列表分页，返回发现顺序下的全部记录
    async fn list_index(&self, ctx: &RunContext) -> Result<Vec<Chapter>>;

    /// 抓取一个工作单元的最终内容
    ///
    /// 返回 Err 表示该单元彻底失败，由调度层吸收为占位内容，
    /// 不会影响兄弟单元或整个任务。
    async fn fetch_unit(&self, ctx: &RunContext, item: &WorkItem) -> Result<String>;
}
