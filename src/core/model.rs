use serde::{Deserialize, Serialize};
use strum::Display;

/// 章节记录
///
/// 由提取规则从列表页产出，产出后不可变。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub url: String,
}

impl Chapter {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// 工作单元：记录 + 其在批次中的序号
///
/// 索引是 `[0, total)` 的稠密排列，total 在索引walk结束后冻结。
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub index: usize,
    pub total: usize,
    pub chapter: Chapter,
}

impl WorkItem {
    /// 展示用 "第 i/total" 标签 (1-based)
    pub fn page_label(&self) -> String {
        format!("{}/{}", self.index + 1, self.total)
    }

    /// 闭区间范围判定，start/end 均为 0-based 且包含
    pub fn in_range(&self, start: usize, end: usize) -> bool {
        self.index >= start && self.index <= end
    }
}

/// 将章节列表冻结为带索引的工作单元列表
pub fn index_work(chapters: Vec<Chapter>) -> Vec<WorkItem> {
    let total = chapters.len();
    chapters
        .into_iter()
        .enumerate()
        .map(|(index, chapter)| WorkItem {
            index,
            total,
            chapter,
        })
        .collect()
}

/// 安装流程状态机
///
/// 唯一的真终态失败是"汇总内容为空"，它直接跳过 Persisting。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    Idle,
    ListingIndex,
    Dispatching,
    Assembling,
    Persisting,
    Done,
}
