//! Instagram GraphQL 响应结构
//!
//! 只声明游标遍历需要的字段；两个 feed 字段二选一出现。

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct InsResponse {
    pub data: InsData,
}

#[derive(Debug, Deserialize)]
pub struct InsData {
    pub user: InsUser,
}

#[derive(Debug, Default, Deserialize)]
pub struct InsUser {
    pub edge_owner_to_timeline_media: Option<MediaConnection>,
    pub edge_web_feed_timeline: Option<MediaConnection>,
}

impl InsUser {
    /// 取本次响应携带的 feed，两个字段都缺失时视为空页
    pub fn timeline(self) -> MediaConnection {
        self.edge_owner_to_timeline_media
            .or(self.edge_web_feed_timeline)
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaConnection {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub edges: Vec<MediaEdge>,
    #[serde(default)]
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
pub struct MediaEdge {
    pub node: MediaNode,
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaNode {
    /// 同一媒体的多个尺寸候选，越宽质量越高
    #[serde(default)]
    pub display_resources: Vec<DisplayResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayResource {
    pub config_width: u32,
    pub config_height: u32,
    pub src: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: String,
}
