//! 错误处理体系 (Error Handling System)
//!
//! 定义领域相关的错误类型及全局 Result 别名。

use thiserror::Error;

/// 全局错误定义
#[derive(Error, Debug)]
pub enum GrabError {
    /// 网络/超时/非 2xx，由传输层重试耗尽后上抛
    #[error("Network error: {0}")]
    Fetch(#[from] reqwest::Error),

    /// 选择器或提取函数失败，传播方式与 Fetch 一致（截断当前分支）
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// 汇总后内容为空，任务级致命错误，不产生任何写入
    #[error("Empty content: {0}")]
    EmptyResult(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Other error: {0}")]
    Custom(String),
}

/// 全局 Result 别名
pub type Result<T> = std::result::Result<T, GrabError>;

impl GrabError {
    /// 构造提取错误
    pub fn extraction(msg: impl Into<String>) -> Self {
        GrabError::Extraction(msg.into())
    }
}
