//! Instagram 媒体驱动
//!
//! 顶层分页不是 HTML 而是 GraphQL 游标：每页响应给出若干媒体与
//! `end_cursor`，规则把游标折算为下一次查询的完整 URL，于是
//! 通用分页 Walker 原样适用。单元抓取把图片落盘，清单行作为槽内容。

mod model;

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;
use url::Url;

use crate::core::config::SiteConfig;
use crate::core::error::{GrabError, Result};
use crate::core::model::{Chapter, WorkItem};
use crate::engine::context::RunContext;
use crate::engine::rule::{PageMeta, PageRule};
use crate::engine::walker::walk;
use crate::interfaces::{Driver, TaskArgs};
use crate::utils::{suffix_for, write_file};

pub use model::{DisplayResource, InsResponse};

const DEFAULT_BASE: &str = "https://www.instagram.com";
const DEFAULT_DEST: &str = "download/instagram";
const DEFAULT_PAGE_SIZE: u32 = 12;

pub fn build(config: SiteConfig, args: &TaskArgs) -> Result<Box<dyn Driver>> {
    let lookup = |key: &str| {
        args.get(key)
            .or_else(|| config.extra.get(key))
            .cloned()
    };
    let required = |key: &str| {
        lookup(key).ok_or_else(|| GrabError::Custom(format!("instagram 需要 -p {}=<值> 参数", key)))
    };

    let user = required("user")?;
    let user_id = required("id")?;
    let query_hash = required("query_hash")?;
    let after = lookup("after").unwrap_or_default();
    let first = lookup("first")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let dest_root = lookup("dest").unwrap_or_else(|| DEFAULT_DEST.to_string());

    let base = Url::parse(config.base_url.as_deref().unwrap_or(DEFAULT_BASE))?;
    let start_url = feed_url(&base, &query_hash, &user_id, first, &after)?;

    Ok(Box::new(InstagramDriver {
        dest_dir: PathBuf::from(dest_root).join(&user),
        start_url,
        feed: feed_rule(base, query_hash, user_id, first),
    }))
}

/// 组装一次 GraphQL 查询 URL，variables 以 JSON 注入查询串
fn feed_url(base: &Url, query_hash: &str, user_id: &str, first: u32, after: &str) -> Result<String> {
    let variables = serde_json::json!({
        "id": user_id,
        "first": first,
        "after": after,
    });
    let mut url = base.join("/graphql/query/")?;
    url.query_pairs_mut()
        .append_pair("query_hash", query_hash)
        .append_pair("variables", &variables.to_string());
    Ok(url.to_string())
}

/// feed 页规则：每条边取最宽的尺寸候选，游标折算为下一页 URL
fn feed_rule(base: Url, query_hash: String, user_id: String, first: u32) -> PageRule<Chapter> {
    PageRule::new(move |meta: &PageMeta| {
        let resp: InsResponse = serde_json::from_str(&meta.body)?;
        let media = resp.data.user.timeline();

        let records: Vec<Chapter> = media
            .edges
            .iter()
            .filter_map(|edge| widest(&edge.node.display_resources))
            .map(|res| Chapter::new(String::new(), res.src.clone()))
            .collect();

        let page_info = media.page_info;
        let next = if page_info.has_next_page && !page_info.end_cursor.is_empty() {
            Some(feed_url(
                &base,
                &query_hash,
                &user_id,
                first,
                &page_info.end_cursor,
            )?)
        } else {
            None
        };

        Ok((records, next))
    })
}

fn widest(resources: &[DisplayResource]) -> Option<&DisplayResource> {
    resources.iter().max_by_key(|r| r.config_width)
}

/// Instagram 媒体驱动
pub struct InstagramDriver {
    dest_dir: PathBuf,
    start_url: String,
    feed: PageRule<Chapter>,
}

#[async_trait]
impl Driver for InstagramDriver {
    fn id(&self) -> &str {
        "instagram"
    }

    async fn list_index(&self, ctx: &RunContext) -> Result<Vec<Chapter>> {
        info!("正在查询媒体列表: {}", self.start_url);
        let mut records = walk(ctx, self.start_url.clone(), &self.feed).await;
        // 按发现顺序编号，清单标签与文件名都由此而来
        for (idx, record) in records.iter_mut().enumerate() {
            record.title = format!("photo {:04}", idx + 1);
        }
        Ok(records)
    }

    async fn fetch_unit(&self, ctx: &RunContext, item: &WorkItem) -> Result<String> {
        let (bytes, content_type) = ctx.source.fetch_bytes(&item.chapter.url).await?;
        let suffix = suffix_for(&item.chapter.url, content_type.as_deref());
        let path = self.dest_dir.join(format!("{}{}", item.index + 1, suffix));
        write_file(&path, &bytes).await?;

        info!(
            "【正在下载 {:>4}/{}】: {}",
            item.index + 1,
            item.total,
            item.chapter.url
        );
        Ok(path.display().to_string())
    }
}
