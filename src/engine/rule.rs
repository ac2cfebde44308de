//! 提取规则 (Extraction Rule)
//!
//! 规则是纯函数：给定已抓取的文档与来源 URL，产出零或多条记录及可选的
//! "下一页"游标。声明式选择器与任意函数两种形态在构建期统一归一为
//! `PageRule`，调用处不再做运行时分支。

use scraper::{ElementRef, Html, Selector};

use crate::core::error::{GrabError, Result};

/// 一次抓取的元信息：来源 URL 与解码后的原始文档
pub struct PageMeta {
    pub url: String,
    pub body: String,
}

impl PageMeta {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }
}

/// 配置值：选择器字符串，或自定义提取函数
///
/// 在驱动构建期被解析为统一的处理闭包，解析失败（非法选择器）即报错。
pub enum Rule<T> {
    Selector(String),
    Handler(Box<dyn Fn(&PageMeta) -> Result<T> + Send + Sync>),
}

impl<T> Rule<T> {
    pub fn selector(s: impl Into<String>) -> Self {
        Rule::Selector(s.into())
    }

    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&PageMeta) -> Result<T> + Send + Sync + 'static,
    {
        Rule::Handler(Box::new(f))
    }
}

/// 归一化后的单页提取规则
///
/// `apply` 对一页执行一次：返回该页产出的记录与下一页游标，
/// 空游标表示分页链终止。
pub struct PageRule<T> {
    extract: Box<dyn Fn(&PageMeta) -> Result<(Vec<T>, Option<String>)> + Send + Sync>,
}

impl<T> PageRule<T> {
    pub fn new<F>(extract: F) -> Self
    where
        F: Fn(&PageMeta) -> Result<(Vec<T>, Option<String>)> + Send + Sync + 'static,
    {
        Self {
            extract: Box::new(extract),
        }
    }

    pub fn apply(&self, meta: &PageMeta) -> Result<(Vec<T>, Option<String>)> {
        (self.extract)(meta)
    }
}

/// 解析选择器字符串，非法时转为提取错误
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| GrabError::extraction(format!("Bad selector `{}`: {}", s, e)))
}

/// 元素全文本 (拼接所有文本节点后修剪)
pub fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// 先 filter 后 map 的选择器匹配
///
/// filter 回调收到的 total 是过滤前的匹配总数，map 回调收到的 total
/// 是过滤后的数量。
pub fn query_select<T>(
    html: &Html,
    selector: &Selector,
    filter: Option<&dyn Fn(&ElementRef, usize, usize) -> bool>,
    map: &mut dyn FnMut(&ElementRef, usize, usize) -> T,
) -> Vec<T> {
    let all: Vec<ElementRef> = html.select(selector).collect();
    let total = all.len();

    let picked: Vec<ElementRef> = match filter {
        Some(f) => all
            .into_iter()
            .enumerate()
            .filter(|(idx, el)| f(el, *idx, total))
            .map(|(_, el)| el)
            .collect(),
        None => all,
    };

    let kept = picked.len();
    picked
        .into_iter()
        .enumerate()
        .map(|(idx, el)| map(&el, idx, kept))
        .collect()
}
