//! 进度聚合
//!
//! 并发单元的完成顺序不定，进度汇报可能乱序到达；对外呈现的
//! 永远是历史最大值，进度条不会回退。

/// 单次运行的进度状态
///
/// 只增不减；大于 1.0 的汇报视为上游 total 尚未就绪，直接忽略。
#[derive(Debug, Default)]
pub struct ProgressState {
    last: f64,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接收一次汇报，返回更新后的运行最大值
    pub fn observe(&mut self, percentage: f64) -> f64 {
        if percentage.is_finite() && (0.0..=1.0).contains(&percentage) && percentage > self.last {
            self.last = percentage;
        }
        self.last
    }

    pub fn value(&self) -> f64 {
        self.last
    }

    /// 归零，供批量任务中的下一次运行复用
    pub fn reset(&mut self) {
        self.last = 0.0;
    }
}
