//! 引擎运行时上下文 (Runtime Context)
//!
//! 每次安装运行持有一份独立实例，批量任务（如多用户）互不串扰。

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::core::config::EngineConfig;
use crate::core::event::{EventSender, InstallEvent};
use crate::interfaces::driver::{PageSource, TaskArgs};

/// 单次运行的共享上下文
///
/// 聚合传输层句柄、引擎参数、冻结后的任务参数与事件分发句柄。
pub struct RunContext {
    /// 抓取传输层
    pub source: Arc<dyn PageSource>,
    /// 引擎调度参数
    pub engine: EngineConfig,
    /// 冻结后的任务初始化参数
    pub args: Arc<TaskArgs>,
    /// 事件分发句柄
    pub events: Option<EventSender>,
}

impl RunContext {
    pub fn new(
        source: Arc<dyn PageSource>,
        engine: EngineConfig,
        args: Arc<TaskArgs>,
        events: Option<EventSender>,
    ) -> Self {
        Self {
            source,
            engine,
            args,
            events,
        }
    }

    /// 向事件总线推送消息
    pub fn emit(&self, event: InstallEvent) {
        if let Some(ref sender) = self.events {
            sender.emit(event);
        }
    }

    /// 抓取间随机停顿，用于缓解上游限流
    ///
    /// 区间由配置给定，上下界相等时退化为固定停顿，均为 0 时跳过。
    pub async fn pause(&self) {
        let (min, max) = (self.engine.delay_min_ms, self.engine.delay_max_ms);
        if max == 0 {
            return;
        }
        let ms = if min >= max {
            min
        } else {
            rand::rng().random_range(min..=max)
        };
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
