//! 配置管理系统 (Configuration Management)
//!
//! 负责 `config.toml` 的反序列化及其层级结构映射，缺省文件时回退到默认值。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bon::Builder;
use config::{Config, File};
use serde::Deserialize;

use crate::core::error::{GrabError, Result};

/// 全局应用配置
#[derive(Debug, Deserialize, Builder, Clone, Default)]
pub struct AppConfig {
    /// 调度引擎通用参数
    #[serde(default)]
    pub engine: EngineConfig,

    /// 站点特定配置覆盖映射
    #[serde(default)]
    pub sites: HashMap<String, SiteConfig>,
}

/// 调度引擎参数
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct EngineConfig {
    /// 全局任务并行度上限
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// 传输层重试阈值
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// 重试间隔 (毫秒)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// 连续抓取间随机停顿下界 (毫秒)
    #[serde(default = "default_delay_min_ms")]
    pub delay_min_ms: u64,
    /// 连续抓取间随机停顿上界 (毫秒)
    #[serde(default = "default_delay_max_ms")]
    pub delay_max_ms: u64,
    /// 单次请求超时 (秒)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// 站点特定配置覆盖
#[derive(Debug, Deserialize, Builder, Clone, Default)]
pub struct SiteConfig {
    /// 自定义域名 (用于镜像站点)
    pub base_url: Option<String>,
    /// 页面编码，默认 utf-8，旧站常见 gbk
    pub encoding: Option<String>,
    /// 是否将菜单页协议强制降级为 http
    pub use_http: Option<bool>,
    /// 站点独占任务并行度
    pub concurrent_tasks: Option<usize>,
    /// 会话 Cookie (登录态站点)
    pub cookie: Option<String>,
    /// 站点私有的自由参数
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            retry_count: 3,
            retry_delay_ms: 500,
            delay_min_ms: 200,
            delay_max_ms: 400,
            timeout_secs: 15,
        }
    }
}

fn default_concurrency() -> usize {
    10
}
fn default_retry_count() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_delay_min_ms() -> u64 {
    200
}
fn default_delay_max_ms() -> u64 {
    400
}
fn default_timeout_secs() -> u64 {
    15
}

impl AppConfig {
    /// 从文件系统中加载并解析配置
    pub fn load() -> Result<Self> {
        let config_path = Path::new("config.toml");
        let builder = Config::builder();

        let builder = if config_path.exists() {
            builder.add_source(File::from(config_path))
        } else {
            builder
        };

        let settings = builder.build().map_err(GrabError::Config)?;
        settings.try_deserialize().map_err(GrabError::Config)
    }
}

/// 单次安装任务的运行参数，由 CLI 与配置合并而成
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// 目标文件路径
    pub output: PathBuf,
    /// 起始章节 (0-based, 包含)；为 0 时目标文件先被清空
    pub start: usize,
    /// 结束章节 (0-based, 包含)
    pub end: usize,
    /// 本次任务并行度
    pub concurrency: usize,
}

impl InstallOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            start: 0,
            end: usize::MAX,
            concurrency: default_concurrency(),
        }
    }

    /// 目标文件名 (不含扩展名)，用于进度行前缀
    pub fn target_name(&self) -> String {
        self.output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.output.display().to_string())
    }
}
