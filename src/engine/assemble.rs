//! 有序输出汇总
//!
//! 调度期各任务乱序填充内容槽，汇总时按原始序号顺序读取：
//! 空槽（被跳过或彻底失败且无占位内容）直接丢弃，非空槽以
//! "标签\n内容" 呈现，槽间以空行分隔。

use crate::core::model::WorkItem;

/// 将内容槽按序拼接为最终产物
///
/// 返回空串表示没有任何可持久化的内容，由调用方转为任务级错误。
pub fn assemble(items: &[WorkItem], slots: &[String]) -> String {
    items
        .iter()
        .zip(slots.iter())
        .filter(|(_, slot)| !slot.is_empty())
        .map(|(item, slot)| format!("{}\n{}", item.chapter.title, slot))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Chapter, index_work};

    fn items(labels: &[&str]) -> Vec<WorkItem> {
        index_work(
            labels
                .iter()
                .map(|label| Chapter::new(*label, "http://x"))
                .collect(),
        )
    }

    #[test]
    fn empty_slots_are_dropped_order_preserved() {
        let items = items(&["A", "B", "C"]);
        let slots = vec!["x".to_string(), String::new(), "y".to_string()];
        assert_eq!(assemble(&items, &slots), "A\nx\n\nC\ny");
    }

    #[test]
    fn all_empty_yields_empty_string() {
        let items = items(&["A", "B"]);
        let slots = vec![String::new(), String::new()];
        assert_eq!(assemble(&items, &slots), "");
    }

    #[test]
    fn single_slot_has_no_separator() {
        let items = items(&["第一章"]);
        let slots = vec!["正文".to_string()];
        assert_eq!(assemble(&items, &slots), "第一章\n正文");
    }
}
