//! AppHub Agent 可执行程序（`apphub://` 协议处理器与常驻代理）。
//!
//! 启动流程：
//! 1) 初始化日志，加载配置（`agent-config.json` + `APPHUB_*` 环境变量）
//! 2) 尝试取得系统级单实例锁
//! 3) 未取得：把启动参数编码后转交给主实例，立即退出
//! 4) 取得但只是一次性动作（如 `apphub://ping`）：直接退出
//! 5) 否则成为主实例：启动 IPC 服务与宿主事件循环，直到收到退出请求
//!
//! 说明：
//! - 启动参数不经过选项解析器：浏览器传入的任何地址都必须被接受
//! - 所有正常退出与转交退出的退出码都是 0
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use apphub_core::config::{AgentConfig, CONFIG_FILE};
use apphub_core::diag::DiagLog;
use apphub_core::dispatch::Dispatcher;
use apphub_core::host::AgentHost;
use apphub_core::message::Message;
use apphub_core::paths::InstallLayout;
use apphub_core::pipe::{PipeClient, PipeServer};
use apphub_core::startup::{plan_startup, StartupPlan};
use apphub_core::toast::ToastCenter;
use apphub_platform::dialog::DesktopSurface;
use apphub_platform::instance::SingleInstanceLock;
use apphub_platform::shell::SystemShell;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()),
        )
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let exe = std::env::current_exe().context("读取当前可执行文件路径失败")?;
    let config = load_config(&exe);
    let layout = match &config.install_root {
        Some(root) => InstallLayout::new(root),
        None => InstallLayout::locate_from_agent_exe(&exe),
    };
    let ipc_log = DiagLog::new(layout.ipc_log_file());
    info!(
        "apphub-agent 启动: env={} root={} args={}",
        config.environment,
        layout.root().display(),
        args.len()
    );

    // 取锁失败按“已有实例”处理，保证不会出现两个主实例
    let lock = match SingleInstanceLock::acquire(&config.instance_lock) {
        Ok(lock) => lock,
        Err(e) => {
            warn!("取得单实例锁失败，按已有实例处理: {e:#}");
            None
        }
    };

    match plan_startup(lock.is_some(), &args) {
        StartupPlan::Forward(message) => {
            let delivered = PipeClient::new(config.channel_name.as_str())
                .with_log(ipc_log)
                .try_send(&message.to_wire());
            info!("已有实例在运行，转交消息: delivered={delivered}");
        }
        StartupPlan::ExitEarly(message) => {
            info!("一次性动作，无需常驻: {}", message.to_wire());
        }
        StartupPlan::Primary { initial, had_args } => {
            run_primary(&config, layout, ipc_log, initial, had_args)?;
        }
    }

    drop(lock);
    Ok(())
}

/// 读取可执行文件同目录下的配置；配置文件损坏时记录警告并使用默认值。
fn load_config(exe: &Path) -> AgentConfig {
    let dir = exe.parent().unwrap_or_else(|| Path::new("."));
    let (config, err) = AgentConfig::load(&dir.join(CONFIG_FILE));
    if let Some(e) = err {
        warn!("配置文件无效，使用默认值: {:#}", anyhow::Error::new(e));
    }
    config
}

/// 以主实例身份运行，直到收到退出请求。
///
/// 异常处理：
/// - 仅异步运行时创建失败会返回错误；IPC 启动失败等由宿主提示后继续运行
fn run_primary(
    config: &AgentConfig,
    layout: InstallLayout,
    ipc_log: DiagLog,
    initial: Message,
    had_args: bool,
) -> Result<()> {
    let toasts = Arc::new(ToastCenter::new(Arc::new(DesktopSurface)));
    let dispatcher = Dispatcher::new(
        config.portal_url.as_str(),
        layout,
        Arc::new(SystemShell),
        toasts,
    );
    let host = AgentHost::new(dispatcher)
        .with_pipe(PipeServer::new(config.channel_name.as_str()).with_log(ipc_log));

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("创建异步运行时失败")?;
    rt.block_on(host.run(initial, had_args));
    Ok(())
}
