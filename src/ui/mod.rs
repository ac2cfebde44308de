//! 终端进度渲染 (Terminal UI)
//!
//! 基于 `indicatif` 的单行原位刷新：主状态行展示阶段流转，
//! 进度条按运行最大值前进。日志经 `get_multi().println` 输出，
//! 不会撕裂进度条。

pub mod progress;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use parking_lot::RwLock;
use tokio::task::JoinHandle;

use crate::core::event::{EventReceiver, InstallEvent};
use crate::core::model::Phase;

pub use progress::ProgressState;

/// 进度条刻度总数，50 格渲染宽度的 20 倍，保证小步进也可见
const BAR_TICKS: u64 = 1000;

/// 全局 TUI 容器 (Singleton)
static MULTI: OnceLock<MultiProgress> = OnceLock::new();

/// 获取全局进度容器实例
pub fn get_multi() -> &'static MultiProgress {
    MULTI.get_or_init(MultiProgress::new)
}

/// TUI 状态容器
struct UiState {
    /// 阶段主状态行
    main_bar: Option<ProgressBar>,
    /// 单元进度条
    unit_bar: Option<ProgressBar>,
    /// 进度运行最大值
    progress: ProgressState,
}

impl UiState {
    fn new() -> Self {
        Self {
            main_bar: None,
            unit_bar: None,
            progress: ProgressState::new(),
        }
    }
}

static STATE: OnceLock<Arc<RwLock<UiState>>> = OnceLock::new();

fn get_state() -> &'static Arc<RwLock<UiState>> {
    STATE.get_or_init(|| Arc::new(RwLock::new(UiState::new())))
}

/// 进度协调器
pub struct Ui;

impl Ui {
    /// 激活事件监听循环，事件通道关闭后自行退出
    pub fn run(receiver: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = receiver.recv_async().await {
                Self::handle_event(event);
            }
        })
    }

    fn handle_event(event: InstallEvent) {
        let multi = get_multi();
        let state = get_state();
        let mut ui = state.write();

        match event {
            InstallEvent::TaskStarted { target, .. } => {
                let style = ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

                let bar = multi.add(ProgressBar::new_spinner());
                bar.set_style(style);
                bar.set_message(format!("📥 {}", target));
                bar.enable_steady_tick(Duration::from_millis(100));
                ui.main_bar = Some(bar);
                ui.progress.reset();
            }
            InstallEvent::PhaseChanged { phase } => {
                if let Some(ref bar) = ui.main_bar {
                    bar.set_message(format!("{}", phase));
                }
                if phase == Phase::Done {
                    if let Some(ref bar) = ui.unit_bar {
                        bar.finish();
                    }
                }
            }
            InstallEvent::UnitsDiscovered { total } => {
                let style = ProgressStyle::default_bar()
                    .template("{spinner:.cyan} [{bar:50.cyan/blue}] {percent}% {msg}")
                    .unwrap()
                    .progress_chars("█▉▊▋▌▍▎▏  ");

                let bar = multi.add(ProgressBar::new(BAR_TICKS));
                bar.set_style(style);
                bar.set_message(format!("共 {} 个单元", total));
                ui.unit_bar = Some(bar);
            }
            InstallEvent::UnitProgress { percentage, label } => {
                let shown = ui.progress.observe(percentage);
                if let Some(ref bar) = ui.unit_bar {
                    bar.set_position((shown * BAR_TICKS as f64).round() as u64);
                    bar.set_message(truncate_message(&label, 30));
                }
            }
            InstallEvent::UnitFailed { index, title, error } => {
                let _ = multi.println(format!("❌ 单元 {} 失败: {} ({})", index + 1, title, error));
            }
            InstallEvent::Saved { path, bytes } => {
                if let Some(ref bar) = ui.main_bar {
                    bar.set_message(format!("💾 {} ({} 字节)", path, bytes));
                }
            }
            InstallEvent::TaskCompleted { .. } => {
                if let Some(ref bar) = ui.unit_bar {
                    bar.finish_with_message("✅ DOWNLOADED");
                }
                if let Some(ref bar) = ui.main_bar {
                    bar.finish_with_message("✅ TASK FINISHED");
                }
            }
            InstallEvent::TaskFailed { error } => {
                if let Some(ref bar) = ui.main_bar {
                    bar.abandon_with_message(format!("❌ FAILED: {}", error));
                }
            }
        }
    }
}

/// 语义化截断，避免长标题把单行撑出屏幕
fn truncate_message(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
