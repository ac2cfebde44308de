//! 应用程序入口 (Application Entrypoint)
//!
//! 负责 CLI 指令解析、遥测层初始化、依赖注入及任务生命周期管理。

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::MakeWriter;

use webgrab::core::config::{AppConfig, InstallOptions};
use webgrab::core::event::create_event_channel;
use webgrab::engine::{InstallPipeline, RunContext};
use webgrab::interfaces::{Driver, TaskArgs};
use webgrab::network::PageClient;
use webgrab::sites::SiteRegistry;
use webgrab::ui::{Ui, get_multi};

/// 进度条感知的日志写入器
///
/// 确保日志输出不会破坏终端进度条的渲染布局。
struct IndicatifWriter;

impl io::Write for IndicatifWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let _ = get_multi().println(s.trim_end());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for IndicatifWriter {
    type Writer = IndicatifWriter;

    fn make_writer(&self) -> Self::Writer {
        IndicatifWriter
    }
}

/// 命令行界面脚手架
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 执行一次安装任务（下载到目标文件）
    Install {
        /// 目标站点标识符
        #[arg(short, long)]
        site: String,
        /// 目标文件路径
        #[arg(short, long)]
        output: PathBuf,
        /// 起始章节 (0-based, 包含)；为 0 时目标文件先被清空，否则追加
        #[arg(long, default_value_t = 0)]
        start: usize,
        /// 结束章节 (0-based, 包含)，缺省为全量
        #[arg(long)]
        end: Option<usize>,
        /// 并发上限，缺省取站点或全局配置
        #[arg(short, long)]
        concurrency: Option<usize>,
        /// 动态注入的站点参数 (KEY=VALUE)
        #[arg(short, long, value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// 列出已注册的站点
    Sites,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 遥测层初始化
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(IndicatifWriter)
        .with_target(false)
        .with_ansi(true)
        .init();

    let config = AppConfig::load()?;
    let cli = Cli::parse();
    let registry = SiteRegistry::new();

    match cli.command {
        Commands::Install {
            site,
            output,
            start,
            end,
            concurrency,
            params,
        } => {
            let (event_sender, event_receiver) = create_event_channel();
            let ui_handle = Ui::run(event_receiver);

            // 事件发送端随上下文一起析构，UI 循环得以退出
            let run_result = async {
                let site_cfg = config.sites.get(&site).cloned().unwrap_or_default();

                let mut args = TaskArgs::new();
                for (k, v) in params {
                    args.insert(k, v);
                }

                let driver: Arc<dyn Driver> =
                    Arc::from(registry.create(&site, site_cfg.clone(), &args)?);
                let client = Arc::new(PageClient::new(&config.engine, &site_cfg)?);

                let mut options = InstallOptions::new(output);
                options.start = start;
                options.end = end.unwrap_or(usize::MAX);
                options.concurrency = concurrency
                    .or(site_cfg.concurrent_tasks)
                    .unwrap_or(config.engine.concurrency);

                let ctx = Arc::new(RunContext::new(
                    client,
                    config.engine.clone(),
                    Arc::new(args),
                    Some(event_sender),
                ));

                InstallPipeline::new(driver, ctx, options).run().await
            }
            .await;

            if let Err(e) = run_result {
                tracing::error!("安装任务失败: {}", e);
            }

            let _ = ui_handle.await;
        }
        Commands::Sites => {
            for id in registry.list() {
                println!("{}", id);
            }
        }
    }

    Ok(())
}

/// 执行 KEY=VALUE 格式参数解析
fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no = found in {}", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}
