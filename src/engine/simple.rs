//! 通用选择器驱动 (SimpleDriver)
//!
//! 把"菜单页 + 内容页"两条分页链的提取规则收拢为一份配置：
//! 规则既可以是选择器字符串，也可以是任意函数，构建期统一归一，
//! 之后整个驱动只是分页 Walker 在两条链上的两次实例化。
//!
//! 常见问题：
//! 1. 乱码通常是编码问题，在站点配置中手动设置 encoding 即可
//! 2. "下载失败, 内容为空"可能是 https 被站点拦截，保持 use_http 默认开启

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{ElementRef, Html};
use url::Url;

use crate::core::error::{GrabError, Result};
use crate::core::model::{Chapter, WorkItem};
use crate::engine::context::RunContext;
use crate::engine::rule::{PageMeta, PageRule, Rule, element_text, parse_selector, query_select};
use crate::engine::walker::walk;
use crate::interfaces::Driver;
use crate::utils::{collapse_newlines, to_absolute_url};

/// 内容后处理管线
pub type ContentPipe = Arc<dyn Fn(String) -> String + Send + Sync>;

/// "下一页"按钮默认文本
const DEFAULT_NEXT_LABEL: &str = "下一页";

/// SimpleDriver 配置
///
/// 选择器形态的 next 规则会以按钮文本做精确匹配来消歧；
/// 函数形态的规则完全自定义，内容管线对其不生效。
pub struct SimpleDriverConfig {
    /// 菜单页（章节列表页）URL
    pub menu_url: String,
    /// 是否将协议强制降级为 http（旧站兼容，默认开启）
    pub use_http: bool,
    /// 如何从菜单页获取章节记录
    pub get_chapters: Rule<Vec<Chapter>>,
    /// 菜单页存在多页时，如何取下一页 URL
    pub next_chapter_page: Option<Rule<Option<String>>>,
    pub next_chapter_button_text: String,
    /// 如何从内容页获取正文
    pub get_content: Rule<String>,
    /// 内容页存在多页时，如何取下一页 URL
    pub next_content_page: Option<Rule<Option<String>>>,
    pub next_content_button_text: String,
    /// 正文的进一步处理
    pub content_pipe: Option<ContentPipe>,
}

impl SimpleDriverConfig {
    pub fn new(
        menu_url: impl Into<String>,
        get_chapters: Rule<Vec<Chapter>>,
        get_content: Rule<String>,
    ) -> Self {
        Self {
            menu_url: menu_url.into(),
            use_http: true,
            get_chapters,
            next_chapter_page: None,
            next_chapter_button_text: DEFAULT_NEXT_LABEL.to_string(),
            get_content,
            next_content_page: None,
            next_content_button_text: DEFAULT_NEXT_LABEL.to_string(),
            content_pipe: None,
        }
    }

    pub fn use_http(mut self, value: bool) -> Self {
        self.use_http = value;
        self
    }

    pub fn next_chapter_page(mut self, rule: Rule<Option<String>>) -> Self {
        self.next_chapter_page = Some(rule);
        self
    }

    pub fn next_chapter_button_text(mut self, text: impl Into<String>) -> Self {
        self.next_chapter_button_text = text.into();
        self
    }

    pub fn next_content_page(mut self, rule: Rule<Option<String>>) -> Self {
        self.next_content_page = Some(rule);
        self
    }

    pub fn next_content_button_text(mut self, text: impl Into<String>) -> Self {
        self.next_content_button_text = text.into();
        self
    }

    pub fn content_pipe<F>(mut self, pipe: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        self.content_pipe = Some(Arc::new(pipe));
        self
    }
}

/// 页内子规则：在同一份解析结果上执行，避免重复解析文档
type BodyFn<T> = Box<dyn Fn(&PageMeta, &Html) -> Result<T> + Send + Sync>;

fn resolve_records(rule: Rule<Vec<Chapter>>, base: Url) -> Result<BodyFn<Vec<Chapter>>> {
    match rule {
        Rule::Handler(f) => Ok(Box::new(move |meta, _| f(meta))),
        Rule::Selector(s) => {
            let selector = parse_selector(&s)?;
            Ok(Box::new(move |_meta, html| {
                let mut records = query_select(html, &selector, None, &mut |el, _, _| {
                    let title = element_text(el);
                    let rel = el.value().attr("href").unwrap_or("").trim();
                    Chapter::new(title, to_absolute_url(&base, rel))
                });
                records.retain(|c| !c.url.is_empty());
                Ok(records)
            }))
        }
    }
}

fn resolve_next(
    rule: Option<Rule<Option<String>>>,
    button: String,
    base: Url,
) -> Result<BodyFn<Option<String>>> {
    match rule {
        None => Ok(Box::new(|_, _| Ok(None))),
        Some(Rule::Handler(f)) => Ok(Box::new(move |meta, _| f(meta))),
        Some(Rule::Selector(s)) => {
            let selector = parse_selector(&s)?;
            Ok(Box::new(move |_meta, html| {
                let filter: &dyn Fn(&ElementRef, usize, usize) -> bool =
                    &|el, _idx, _total| element_text(el) == button;
                let next = query_select(html, &selector, Some(filter), &mut |el, _, _| {
                    let rel = el.value().attr("href").unwrap_or("").trim();
                    to_absolute_url(&base, rel)
                })
                .into_iter()
                .find(|u| !u.is_empty());
                Ok(next)
            }))
        }
    }
}

fn resolve_content(rule: Rule<String>, pipe: Option<ContentPipe>) -> Result<BodyFn<String>> {
    match rule {
        Rule::Handler(f) => Ok(Box::new(move |meta, _| f(meta))),
        Rule::Selector(s) => {
            let selector = parse_selector(&s)?;
            let pipe = pipe.unwrap_or_else(|| Arc::new(|content| content));
            Ok(Box::new(move |_meta, html| {
                let parts = query_select(html, &selector, None, &mut |el, _, _| {
                    (*pipe)(collapse_newlines(&element_text(el)))
                });
                Ok(parts.concat())
            }))
        }
    }
}

/// 通用选择器驱动
pub struct SimpleDriver {
    id: String,
    menu_url: String,
    chapters: PageRule<Chapter>,
    content: PageRule<String>,
}

impl SimpleDriver {
    pub fn new(id: impl Into<String>, config: SimpleDriverConfig) -> Result<Self> {
        let mut menu = Url::parse(config.menu_url.trim())?;
        if config.use_http {
            let _ = menu.set_scheme("http");
        }
        let base = menu.clone();

        let chapters = {
            let records = resolve_records(config.get_chapters, base.clone())?;
            let next = resolve_next(
                config.next_chapter_page,
                config.next_chapter_button_text,
                base.clone(),
            )?;
            PageRule::new(move |meta: &PageMeta| {
                let html = Html::parse_document(&meta.body);
                Ok((records(meta, &html)?, next(meta, &html)?))
            })
        };

        let content = {
            let body = resolve_content(config.get_content, config.content_pipe)?;
            let next = resolve_next(
                config.next_content_page,
                config.next_content_button_text,
                base,
            )?;
            PageRule::new(move |meta: &PageMeta| {
                let html = Html::parse_document(&meta.body);
                Ok((vec![body(meta, &html)?], next(meta, &html)?))
            })
        };

        Ok(Self {
            id: id.into(),
            menu_url: menu.to_string(),
            chapters,
            content,
        })
    }

    pub fn menu_url(&self) -> &str {
        &self.menu_url
    }
}

#[async_trait]
impl Driver for SimpleDriver {
    fn id(&self) -> &str {
        &self.id
    }

    async fn list_index(&self, ctx: &RunContext) -> Result<Vec<Chapter>> {
        tracing::info!("正在下载章节列表: {}", self.menu_url);
        Ok(walk(ctx, self.menu_url.clone(), &self.chapters).await)
    }

    async fn fetch_unit(&self, ctx: &RunContext, item: &WorkItem) -> Result<String> {
        let pages = walk(ctx, item.chapter.url.clone(), &self.content).await;
        if pages.is_empty() {
            return Err(GrabError::extraction(format!(
                "未取得任何内容: {}",
                item.chapter.url
            )));
        }
        Ok(pages.concat())
    }
}
