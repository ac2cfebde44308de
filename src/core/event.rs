//! 事件系统定义
//!
//! 用于 Engine 与 UI 之间的完全解耦通信

use flume::{Receiver, Sender};

use crate::core::model::Phase;

/// 安装流程事件类型
#[derive(Debug, Clone)]
pub enum InstallEvent {
    /// 任务开始
    TaskStarted { site_id: String, target: String },

    /// 状态机阶段切换
    PhaseChanged { phase: Phase },

    /// 索引 walk 结束，工作单元总数冻结
    UnitsDiscovered { total: usize },

    /// 工作单元进度汇报 (percentage ∈ [0,1]，可能乱序到达)
    UnitProgress { percentage: f64, label: String },

    /// 单元抓取失败（已被吸收为占位内容）
    UnitFailed {
        index: usize,
        title: String,
        error: String,
    },

    /// 产物落盘完成
    Saved { path: String, bytes: usize },

    /// 任务完成
    TaskCompleted { target: String },

    /// 任务失败
    TaskFailed { error: String },
}

/// 事件发送器
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<InstallEvent>,
}

impl EventSender {
    pub fn new(tx: Sender<InstallEvent>) -> Self {
        Self { tx }
    }

    /// 发送事件
    pub fn emit(&self, event: InstallEvent) {
        let _ = self.tx.send(event);
    }

    /// 发送阶段切换事件
    pub fn phase(&self, phase: Phase) {
        self.emit(InstallEvent::PhaseChanged { phase });
    }

    /// 发送单元进度事件
    pub fn unit_progress(&self, percentage: f64, label: impl Into<String>) {
        self.emit(InstallEvent::UnitProgress {
            percentage,
            label: label.into(),
        });
    }

    /// 发送单元失败事件
    pub fn unit_failed(&self, index: usize, title: &str, error: impl Into<String>) {
        self.emit(InstallEvent::UnitFailed {
            index,
            title: title.to_string(),
            error: error.into(),
        });
    }
}

/// 事件接收器
pub struct EventReceiver {
    rx: Receiver<InstallEvent>,
}

impl EventReceiver {
    pub fn new(rx: Receiver<InstallEvent>) -> Self {
        Self { rx }
    }

    /// 阻塞接收事件
    pub fn recv(&self) -> Option<InstallEvent> {
        self.rx.recv().ok()
    }

    /// 异步接收事件
    pub async fn recv_async(&self) -> Option<InstallEvent> {
        self.rx.recv_async().await.ok()
    }
}

/// 创建事件通道
pub fn create_event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = flume::unbounded();
    (EventSender::new(tx), EventReceiver::new(rx))
}
