//! soxs.cc《盘龙》驱动
//!
//! 索引只有一页，正文也不分页；正文规则用函数形态表达，
//! 以便剔除 `.content` 内嵌 `<p>` 子树（站内推荐位）后再取文本。

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::core::config::SiteConfig;
use crate::core::error::Result;
use crate::engine::rule::{PageMeta, Rule, parse_selector};
use crate::engine::{SimpleDriver, SimpleDriverConfig};
use crate::interfaces::{Driver, TaskArgs};
use crate::utils::{collapse_newlines, remove_space, to_absolute_url};

const DEFAULT_BASE: &str = "https://www.soxs.cc";
const DEFAULT_MENU: &str = "/PanLong/";
const CHAPTER_SELECTOR: &str = "#novel15387 dd > a";

pub fn build(config: SiteConfig, args: &TaskArgs) -> Result<Box<dyn Driver>> {
    let base = Url::parse(config.base_url.as_deref().unwrap_or(DEFAULT_BASE))?;
    let menu = args
        .get("menu")
        .or_else(|| config.extra.get("menu"))
        .map(String::as_str)
        .unwrap_or(DEFAULT_MENU);
    let menu_url = to_absolute_url(&base, menu);

    let content_selector = parse_selector(".content")?;
    let content_rule = Rule::handler(move |meta: &PageMeta| {
        let html = Html::parse_document(&meta.body);
        Ok(extract_content(&html, &content_selector))
    });

    let driver_config = SimpleDriverConfig::new(
        menu_url,
        Rule::selector(CHAPTER_SELECTOR),
        content_rule,
    )
    // 站点全程 https，不做协议降级
    .use_http(config.use_http.unwrap_or(false));

    Ok(Box::new(SimpleDriver::new("panlong", driver_config)?))
}

fn extract_content(html: &Html, selector: &Selector) -> String {
    let text: String = html
        .select(selector)
        .map(|el| text_skipping_paragraphs(&el))
        .collect();
    collapse_newlines(&remove_space(&strip_watermark(text)))
}

/// 取元素全文本，但跳过任意 `<p>` 子树内的文本节点
fn text_skipping_paragraphs(el: &ElementRef) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        if let Some(text) = node.value().as_text() {
            let inside_p = node
                .ancestors()
                .take_while(|n| n.id() != el.id())
                .any(|n| n.value().as_element().is_some_and(|e| e.name() == "p"));
            if !inside_p {
                out.push_str(text);
            }
        }
    }
    out
}

/// 剔除 "您可以在百度…查找最新章节！" 水印句
fn strip_watermark(mut text: String) -> String {
    const HEAD: &str = "您可以在百度";
    const TAIL: &str = "查找最新章节！";
    while let Some(start) = text.find(HEAD) {
        match text[start..].find(TAIL) {
            Some(rel) => {
                let end = start + rel + TAIL.len();
                text.replace_range(start..end, "");
            }
            None => break,
        }
    }
    text
}
