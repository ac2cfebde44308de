//! 端到端安装流程测试
//!
//! 用内存传输桩驱动完整管线：菜单两页、正文分页、失败章节占位、
//! 范围过滤与空结果保护。

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use webgrab::core::config::{EngineConfig, InstallOptions};
use webgrab::core::error::{GrabError, Result};
use webgrab::core::event::{InstallEvent, create_event_channel};
use webgrab::engine::rule::Rule;
use webgrab::engine::{InstallPipeline, RunContext, SimpleDriver, SimpleDriverConfig};
use webgrab::interfaces::driver::PageSource;
use webgrab::ui::ProgressState;

struct MapSource {
    pages: HashMap<String, String>,
    text_hits: AtomicUsize,
}

impl MapSource {
    fn new(pages: HashMap<String, String>) -> Self {
        Self {
            pages,
            text_hits: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PageSource for MapSource {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.text_hits.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| GrabError::Custom(format!("no page: {}", url)))
    }

    async fn fetch_bytes(&self, _url: &str) -> Result<(Bytes, Option<String>)> {
        Err(GrabError::Custom("binary not supported".into()))
    }
}

fn quiet_engine() -> EngineConfig {
    EngineConfig {
        delay_min_ms: 0,
        delay_max_ms: 0,
        ..EngineConfig::default()
    }
}

/// 三章小书：第一章正文跨两页，第二章内容页缺失，第三章单页
fn novel_pages() -> HashMap<String, String> {
    HashMap::from([
        (
            "http://novel.test/list/1.html".to_string(),
            r##"<div class="index">
                  <a href="/c/1.html">第一章</a>
                  <a href="/c/2.html">第二章</a>
                </div>
                <div class="page"><a href="/list/2.html">下一页</a></div>"##
                .to_string(),
        ),
        (
            "http://novel.test/list/2.html".to_string(),
            r##"<div class="index"><a href="/c/3.html">第三章</a></div>
                <div class="page"><a href="#">尾页</a></div>"##
                .to_string(),
        ),
        (
            "http://novel.test/c/1.html".to_string(),
            r##"<div id="content">第一章上</div>
                <div class="page"><a href="/c/1_2.html">下一页</a></div>"##
                .to_string(),
        ),
        (
            "http://novel.test/c/1_2.html".to_string(),
            r##"<div id="content">第一章下</div>"##.to_string(),
        ),
        (
            "http://novel.test/c/3.html".to_string(),
            r##"<div id="content">第三章内容</div>"##.to_string(),
        ),
    ])
}

fn novel_driver() -> SimpleDriver {
    let config = SimpleDriverConfig::new(
        "http://novel.test/list/1.html",
        Rule::selector(".index a"),
        Rule::selector("#content"),
    )
    .next_chapter_page(Rule::selector(".page a"))
    .next_content_page(Rule::selector(".page a"));
    SimpleDriver::new("novel", config).unwrap()
}

#[tokio::test]
async fn full_install_keeps_order_and_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("novel.txt");

    let (sender, receiver) = create_event_channel();
    let source = Arc::new(MapSource::new(novel_pages()));
    let ctx = Arc::new(RunContext::new(
        source,
        quiet_engine(),
        Arc::new(HashMap::new()),
        Some(sender),
    ));

    let pipeline = InstallPipeline::new(
        Arc::new(novel_driver()),
        ctx,
        InstallOptions::new(&output),
    );
    pipeline.run().await.unwrap();
    drop(pipeline);

    let text = std::fs::read_to_string(&output).unwrap();
    let expected = "第一章\n第一章上第一章下\n\n\
                    第二章\n章节下载错误: 第 2/3 章 第二章 http://novel.test/c/2.html\n\n\
                    第三章\n第三章内容";
    assert_eq!(text, expected);

    // 事件流：总数冻结为 3，失败单元有通知，进度经单调聚合后收敛到 1.0
    let mut total = None;
    let mut failed = Vec::new();
    let mut progress = ProgressState::new();
    while let Some(event) = receiver.recv() {
        match event {
            InstallEvent::UnitsDiscovered { total: t } => total = Some(t),
            InstallEvent::UnitFailed { index, .. } => failed.push(index),
            InstallEvent::UnitProgress { percentage, .. } => {
                progress.observe(percentage);
            }
            _ => {}
        }
    }
    assert_eq!(total, Some(3));
    assert_eq!(failed, vec![1]);
    assert!((progress.value() - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn range_install_appends_and_skips_fetches() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("novel.txt");
    std::fs::write(&output, "前两章已存在\n\n").unwrap();

    let source = Arc::new(MapSource::new(novel_pages()));
    let ctx = Arc::new(RunContext::new(
        source.clone(),
        quiet_engine(),
        Arc::new(HashMap::new()),
        None,
    ));

    let mut options = InstallOptions::new(&output);
    options.start = 2;
    options.end = 2;
    let pipeline = InstallPipeline::new(Arc::new(novel_driver()), ctx, options);
    pipeline.run().await.unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(text, "前两章已存在\n\n第三章\n第三章内容");

    // 两次菜单页 + 一次正文页，范围之外的章节没有发起抓取
    assert_eq!(source.text_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn empty_index_reports_empty_result_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("novel.txt");

    let pages = HashMap::from([(
        "http://novel.test/list/1.html".to_string(),
        "<div class=\"index\"></div>".to_string(),
    )]);
    let ctx = Arc::new(RunContext::new(
        Arc::new(MapSource::new(pages)),
        quiet_engine(),
        Arc::new(HashMap::new()),
        None,
    ));

    let pipeline = InstallPipeline::new(
        Arc::new(novel_driver()),
        ctx,
        InstallOptions::new(&output),
    );
    match pipeline.run().await {
        Err(GrabError::EmptyResult(_)) => {}
        other => panic!("expected EmptyResult, got {:?}", other.map(|_| ())),
    }
    assert!(!output.exists());
}

#[tokio::test]
async fn unreachable_menu_behaves_like_empty_index() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("novel.txt");

    let ctx = Arc::new(RunContext::new(
        Arc::new(MapSource::new(HashMap::new())),
        quiet_engine(),
        Arc::new(HashMap::new()),
        None,
    ));

    let pipeline = InstallPipeline::new(
        Arc::new(novel_driver()),
        ctx,
        InstallOptions::new(&output),
    );
    assert!(pipeline.run().await.is_err());
    assert!(!output.exists());
}
