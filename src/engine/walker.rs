//! 分页 Walker
//!
//! 对一条分页链做显式循环遍历：抓取当前游标处的文档、应用提取规则、
//! 追加记录、推进游标，直到游标为空。抓取或提取失败时放弃剩余页面，
//! 保留已收集的部分结果，调用方据此实现"部分索引照常继续"的语义。

use tracing::{debug, warn};

use crate::engine::context::RunContext;
use crate::engine::rule::{PageMeta, PageRule};

/// 遍历一条分页链，返回页序与页内顺序下的全部记录
///
/// 迭代次数只受站点自身分页终止约束；需要硬上限的调用方自行截断。
pub async fn walk<T>(ctx: &RunContext, start: String, rule: &PageRule<T>) -> Vec<T> {
    let mut records: Vec<T> = Vec::new();
    let mut cursor = Some(start);

    while let Some(url) = cursor.take().filter(|u| !u.is_empty()) {
        debug!("正在抓取分页: {}", url);

        let body = match ctx.source.fetch_text(&url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("分页抓取失败, 保留已有 {} 条记录: {} ({})", records.len(), url, e);
                break;
            }
        };

        let meta = PageMeta { url, body };
        match rule.apply(&meta) {
            Ok((mut page_records, next)) => {
                records.append(&mut page_records);
                cursor = next;
            }
            Err(e) => {
                warn!(
                    "分页提取失败, 保留已有 {} 条记录: {} ({})",
                    records.len(),
                    meta.url,
                    e
                );
                break;
            }
        }

        ctx.pause().await;
    }

    records
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::core::config::EngineConfig;
    use crate::core::error::{GrabError, Result};
    use crate::interfaces::driver::PageSource;

    struct MapSource {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageSource for MapSource {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| GrabError::Custom(format!("no page: {}", url)))
        }

        async fn fetch_bytes(&self, _url: &str) -> Result<(Bytes, Option<String>)> {
            Err(GrabError::Custom("binary not supported".into()))
        }
    }

    fn quiet_ctx(pages: HashMap<String, String>) -> RunContext {
        let engine = EngineConfig {
            delay_min_ms: 0,
            delay_max_ms: 0,
            ..EngineConfig::default()
        };
        RunContext::new(
            Arc::new(MapSource { pages }),
            engine,
            Arc::new(HashMap::new()),
            None,
        )
    }

    /// 每页正文形如 "a,b,c|next_url"，规则按该格式切分
    fn piped_rule() -> PageRule<String> {
        PageRule::new(|meta: &PageMeta| {
            let (items, next) = meta.body.split_once('|').unwrap_or((meta.body.as_str(), ""));
            let records = items
                .split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            let next = (!next.is_empty()).then(|| next.to_string());
            Ok((records, next))
        })
    }

    #[tokio::test]
    async fn walk_collects_across_pages_in_order() {
        let pages = HashMap::from([
            ("p1".to_string(), "a,b|p2".to_string()),
            ("p2".to_string(), "c|p3".to_string()),
            ("p3".to_string(), "d,e".to_string()),
        ]);
        let ctx = quiet_ctx(pages);

        let records = walk(&ctx, "p1".to_string(), &piped_rule()).await;
        assert_eq!(records, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn failed_page_keeps_partial_results() {
        let pages = HashMap::from([
            ("p1".to_string(), "a,b|p2".to_string()),
            ("p2".to_string(), "c|missing".to_string()),
        ]);
        let ctx = quiet_ctx(pages);

        let records = walk(&ctx, "p1".to_string(), &piped_rule()).await;
        assert_eq!(records, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn extraction_error_truncates_like_fetch_error() {
        let pages = HashMap::from([
            ("p1".to_string(), "a|p2".to_string()),
            ("p2".to_string(), "boom".to_string()),
        ]);
        let ctx = quiet_ctx(pages);

        let rule = PageRule::new(|meta: &PageMeta| {
            if meta.body.contains("boom") {
                return Err(GrabError::extraction("bad page"));
            }
            let (items, next) = meta.body.split_once('|').unwrap_or((meta.body.as_str(), ""));
            Ok((
                vec![items.to_string()],
                (!next.is_empty()).then(|| next.to_string()),
            ))
        });

        let records = walk(&ctx, "p1".to_string(), &rule).await;
        assert_eq!(records, vec!["a"]);
    }

    #[tokio::test]
    async fn empty_start_cursor_yields_nothing() {
        let ctx = quiet_ctx(HashMap::new());
        let records = walk(&ctx, String::new(), &piped_rule()).await;
        assert!(records.is_empty());
    }
}
