//! liquge.com 驱动
//!
//! 纯 SimpleDriver 配置实例：两条分页链都以 `.page a` + "下一页"
//! 文本消歧取下一页；章节选择器按菜单路径区分书页与列表页。

use url::Url;

use crate::core::config::SiteConfig;
use crate::core::error::{GrabError, Result};
use crate::engine::rule::Rule;
use crate::engine::{SimpleDriver, SimpleDriverConfig};
use crate::interfaces::{Driver, TaskArgs};
use crate::utils::{collapse_newlines, remove_space, to_absolute_url};

const DEFAULT_BASE: &str = "http://www.liquge.com";

pub fn build(config: SiteConfig, args: &TaskArgs) -> Result<Box<dyn Driver>> {
    let base = Url::parse(config.base_url.as_deref().unwrap_or(DEFAULT_BASE))?;
    let menu = args
        .get("menu")
        .or_else(|| config.extra.get("menu"))
        .ok_or_else(|| GrabError::Custom("liquge 需要 -p menu=<列表页路径> 参数".into()))?;
    let menu_url = to_absolute_url(&base, menu);

    let menu_path = Url::parse(&menu_url)?.path().to_string();
    let driver_config = SimpleDriverConfig::new(
        menu_url,
        Rule::selector(chapter_selector(&menu_path)),
        Rule::selector("#acontent"),
    )
    .use_http(config.use_http.unwrap_or(true))
    .next_chapter_page(Rule::selector(".page a"))
    .next_content_page(Rule::selector(".page a"))
    .content_pipe(clean_content);

    Ok(Box::new(SimpleDriver::new("liquge", driver_config)?))
}

/// 书页 (/book/...) 与列表页 (/list/...) 的章节列表结构不同
fn chapter_selector(menu_path: &str) -> &'static str {
    if menu_path.starts_with("/book") {
        ".main .divbox ~ .divbox .infoindex > dd > a"
    } else {
        ".index > dd > a"
    }
}

/// 去站点硬广并收紧排版
fn clean_content(content: String) -> String {
    let cleaned = remove_space(&content)
        .replace("【官方qq群（1）】：65992297（满）", "")
        .replace("【https://m.diyibanhu.in】", "")
        .replace("ps：／／．．", "")
        .replace('*', "");
    collapse_newlines(&cleaned)
}
