//! webgrab: 分页内容采集工具集
//!
//! 核心是一台通用的"分页提取 + 有界并发抓取"引擎；小说站与
//! Instagram 媒体流都是它的配置实例。

pub mod core;
pub mod engine;
pub mod interfaces;
pub mod network;
pub mod sites;
pub mod ui;
pub mod utils;
