//! 安装流程编排 (Install Orchestrator)
//!
//! 状态机：ListingIndex -> Dispatching -> Assembling -> Persisting -> Done。
//! 索引 walk 的网络失败截断列表但流程继续；单元失败被吸收为占位内容；
//! 唯一的真终态失败是汇总内容为空，此时不发生任何写入。

use std::sync::Arc;

use tracing::{error, info};

use crate::core::config::InstallOptions;
use crate::core::error::{GrabError, Result};
use crate::core::event::InstallEvent;
use crate::core::model::{Phase, WorkItem, index_work};
use crate::engine::assemble::assemble;
use crate::engine::context::RunContext;
use crate::engine::dispatch::dispatch;
use crate::interfaces::Driver;
use crate::utils::{append_file, write_file};

/// 一次安装运行
pub struct InstallPipeline {
    driver: Arc<dyn Driver>,
    ctx: Arc<RunContext>,
    options: InstallOptions,
}

impl InstallPipeline {
    pub fn new(driver: Arc<dyn Driver>, ctx: Arc<RunContext>, options: InstallOptions) -> Self {
        Self {
            driver,
            ctx,
            options,
        }
    }

    /// 执行安装流程
    pub async fn run(&self) -> Result<()> {
        match self.execute().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.ctx.emit(InstallEvent::TaskFailed {
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn execute(&self) -> Result<()> {
        let target = self.options.output.display().to_string();
        self.ctx.emit(InstallEvent::TaskStarted {
            site_id: self.driver.id().to_string(),
            target: target.clone(),
        });

        // 1. 顶层索引 (ListingIndex)
        // 配置/参数错误直接上抛；walk 内部已把网络失败吸收为部分列表
        self.ctx.emit(InstallEvent::PhaseChanged {
            phase: Phase::ListingIndex,
        });
        let chapters = self.driver.list_index(&self.ctx).await?;
        let items = index_work(chapters);
        self.ctx.emit(InstallEvent::UnitsDiscovered { total: items.len() });
        info!("共发现 {} 个工作单元", items.len());

        // 2. 有界并发调度 (Dispatching)
        self.ctx.emit(InstallEvent::PhaseChanged {
            phase: Phase::Dispatching,
        });
        let slots = {
            let driver = self.driver.clone();
            let ctx = self.ctx.clone();
            let prefix = self.options.target_name();
            let (start, end) = (self.options.start, self.options.end);
            dispatch(items.clone(), self.options.concurrency, move |_, item| {
                handle_unit(
                    driver.clone(),
                    ctx.clone(),
                    item,
                    start,
                    end,
                    prefix.clone(),
                )
            })
            .await
        };

        // 3. 有序汇总 (Assembling)
        self.ctx.emit(InstallEvent::PhaseChanged {
            phase: Phase::Assembling,
        });
        info!("下载完成, 正在保存");
        let text = assemble(&items, &slots);
        if text.is_empty() {
            error!("【{}】 下载失败，内容为空", target);
            return Err(GrabError::EmptyResult(target));
        }

        // 4. 持久化 (Persisting)
        // start 为 0 视为全新运行并清空目标文件；大于 0 视为续传并追加
        self.ctx.emit(InstallEvent::PhaseChanged {
            phase: Phase::Persisting,
        });
        if self.options.start == 0 {
            write_file(&self.options.output, text.as_bytes()).await?;
        } else {
            append_file(&self.options.output, text.as_bytes()).await?;
        }

        self.ctx.emit(InstallEvent::Saved {
            path: target.clone(),
            bytes: text.len(),
        });
        self.ctx.emit(InstallEvent::PhaseChanged { phase: Phase::Done });
        self.ctx.emit(InstallEvent::TaskCompleted { target });
        info!(
            "已保存: {} ({} 字节)",
            self.options.output.display(),
            text.len()
        );
        Ok(())
    }
}

/// 单个工作单元的处理器
///
/// 范围之外的单元不发起抓取，但仍计入进度；抓取失败被转换为
/// 占位内容写入对应槽位，失败章节在最终产物中保持可见。
async fn handle_unit(
    driver: Arc<dyn Driver>,
    ctx: Arc<RunContext>,
    item: WorkItem,
    start: usize,
    end: usize,
    prefix: String,
) -> String {
    let label = format!("{} {}", prefix, item.page_label());
    let percentage = (item.index + 1) as f64 / item.total as f64;

    if !item.in_range(start, end) {
        ctx.emit(InstallEvent::UnitProgress { percentage, label });
        return String::new();
    }

    ctx.pause().await;

    let content = match driver.fetch_unit(&ctx, &item).await {
        Ok(content) => content,
        Err(e) => {
            let placeholder = format!(
                "章节下载错误: 第 {} 章 {} {}",
                item.page_label(),
                item.chapter.title,
                item.chapter.url
            );
            error!("{} ({})", placeholder, e);
            ctx.emit(InstallEvent::UnitFailed {
                index: item.index,
                title: item.chapter.title.clone(),
                error: e.to_string(),
            });
            placeholder
        }
    };

    ctx.emit(InstallEvent::UnitProgress { percentage, label });
    content
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::model::Chapter;
    use crate::interfaces::driver::PageSource;

    struct NullSource;

    #[async_trait]
    impl PageSource for NullSource {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            Err(GrabError::Custom(format!("unexpected fetch: {}", url)))
        }

        async fn fetch_bytes(&self, url: &str) -> Result<(Bytes, Option<String>)> {
            Err(GrabError::Custom(format!("unexpected fetch: {}", url)))
        }
    }

    /// 固定章节列表的桩驱动，正文为 "body-<i>"，可指定失败章节
    struct StubDriver {
        chapters: Vec<Chapter>,
        failing: Vec<usize>,
        fetched: AtomicUsize,
    }

    impl StubDriver {
        fn new(count: usize, failing: Vec<usize>) -> Self {
            let chapters = (0..count)
                .map(|i| Chapter::new(format!("第{}章", i + 1), format!("http://x/{}", i)))
                .collect();
            Self {
                chapters,
                failing,
                fetched: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Driver for StubDriver {
        fn id(&self) -> &str {
            "stub"
        }

        async fn list_index(&self, _ctx: &RunContext) -> Result<Vec<Chapter>> {
            Ok(self.chapters.clone())
        }

        async fn fetch_unit(&self, _ctx: &RunContext, item: &WorkItem) -> Result<String> {
            self.fetched.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&item.index) {
                return Err(GrabError::extraction("stub failure"));
            }
            Ok(format!("body-{}", item.index))
        }
    }

    fn quiet_ctx() -> Arc<RunContext> {
        let engine = EngineConfig {
            delay_min_ms: 0,
            delay_max_ms: 0,
            ..EngineConfig::default()
        };
        Arc::new(RunContext::new(
            Arc::new(NullSource),
            engine,
            Arc::new(HashMap::new()),
            None,
        ))
    }

    #[tokio::test]
    async fn range_filter_skips_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("book.txt");

        let driver = Arc::new(StubDriver::new(6, vec![]));
        let mut options = InstallOptions::new(&output);
        options.start = 2;
        options.end = 4;

        let pipeline = InstallPipeline::new(driver.clone(), quiet_ctx(), options);
        pipeline.run().await.unwrap();

        assert_eq!(driver.fetched.load(Ordering::SeqCst), 3);
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text, "第3章\nbody-2\n\n第4章\nbody-3\n\n第5章\nbody-4");
    }

    #[tokio::test]
    async fn failed_unit_stays_visible_as_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("book.txt");

        let driver = Arc::new(StubDriver::new(3, vec![1]));
        let pipeline = InstallPipeline::new(driver, quiet_ctx(), InstallOptions::new(&output));
        pipeline.run().await.unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains("第1章\nbody-0"));
        assert!(text.contains("第2章\n章节下载错误: 第 2/3 章 第2章 http://x/1"));
        assert!(text.contains("第3章\nbody-2"));
    }

    #[tokio::test]
    async fn empty_result_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("book.txt");

        let driver = Arc::new(StubDriver::new(0, vec![]));
        let pipeline = InstallPipeline::new(driver, quiet_ctx(), InstallOptions::new(&output));

        match pipeline.run().await {
            Err(GrabError::EmptyResult(_)) => {}
            other => panic!("expected EmptyResult, got {:?}", other.map(|_| ())),
        }
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn resumed_run_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("book.txt");
        std::fs::write(&output, "已有内容\n\n").unwrap();

        let driver = Arc::new(StubDriver::new(3, vec![]));
        let mut options = InstallOptions::new(&output);
        options.start = 2;

        let pipeline = InstallPipeline::new(driver.clone(), quiet_ctx(), options);
        pipeline.run().await.unwrap();

        assert_eq!(driver.fetched.load(Ordering::SeqCst), 1);
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text, "已有内容\n\n第3章\nbody-2");
    }

    #[tokio::test]
    async fn fresh_run_truncates_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("book.txt");
        std::fs::write(&output, "旧的残留").unwrap();

        let driver = Arc::new(StubDriver::new(1, vec![]));
        let pipeline = InstallPipeline::new(driver, quiet_ctx(), InstallOptions::new(&output));
        pipeline.run().await.unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(text, "第1章\nbody-0");
    }
}
