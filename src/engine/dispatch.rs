//! 有界并发调度器
//!
//! 给定有序工作列表与并发上限，为每个条目执行一次异步处理器：
//! 同时在跑的处理器不超过上限，条目按原始序号占有自己的输出槽，
//! 单个条目的崩溃不会波及兄弟条目或整个批次。

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::error;

/// 并发执行处理器，返回与输入等长、按输入顺序排列的结果槽
///
/// 处理器收到 `(index, item)`；崩溃 (panic) 的条目槽保持默认值。
/// 条目级的业务失败应由处理器自行吸收后返回占位结果。
pub async fn dispatch<I, T, F, Fut>(items: Vec<I>, limit: usize, handler: F) -> Vec<T>
where
    I: Send + 'static,
    T: Default + Send + 'static,
    F: Fn(usize, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let total = items.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let handler = Arc::new(handler);

    let mut set = JoinSet::new();
    for (index, item) in items.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        let handler = handler.clone();
        set.spawn(async move {
            // acquire 只在信号量被关闭时失败，本函数从不关闭它
            let _permit = semaphore.acquire().await;
            (index, (*handler)(index, item).await)
        });
    }

    let mut slots: Vec<T> = Vec::with_capacity(total);
    slots.resize_with(total, T::default);

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, value)) => slots[index] = value,
            Err(e) => error!("调度任务崩溃: {}", e),
        }
    }

    slots
}
