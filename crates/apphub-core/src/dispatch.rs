//! 消息分发：把一条 [`Message`] 变成具体动作（打开门户、启动应用、退出等）。
//!
//! 目标：
//! - 所有分发都在主实例的宿主上下文中串行执行
//! - 输入错误只提示用户（toast / 消息框），不会让进程退出
//! - 退出请求不在这里执行，而是通过 [`DispatchOutcome`] 交给宿主统一编排
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::sync::Arc;

use tracing::{info, warn};

use crate::diag::{shorten, timestamp, DiagLog};
use crate::launch::{ensure_log_directory, LaunchError, LaunchSpec, RunRequest, RunRequestError, Shell};
use crate::message::Message;
use crate::paths::InstallLayout;
use crate::protocol::{ParsedUrl, QueryMap, UrlAction};
use crate::toast::ToastCenter;

const LOG_URL_CHARS: usize = 200;

/// 单条消息的处理结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    PortalOpened,
    PortalFailed(String),
    /// 立即退出（命令 `exit`），不显示退出提示。
    ShutdownRequested,
    /// 按退出流程退出（地址 `exit`）：先提示，延迟后关闭。
    ExitRequested,
    /// 无需任何动作（`ping`、命令 `run`）。
    Ignored,
    /// 只显示了提示（地址 `open`）。
    Notified,
    /// 地址非法、协议未知或动作未知；内容为弹出的提示文本。
    Rejected(String),
    /// 安装/更新信息已展示。
    Displayed,
    Launch(LaunchOutcome),
}

/// `run` 动作的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Started { exe_name: String, elevated: bool },
    /// 用户拒绝了提权。
    ElevationDeclined,
    Failed(String),
    /// 目标可执行文件不存在；内容为 `<分类>\<应用>\<exe>`。
    AppNotFound(String),
    InvalidParameters(RunRequestError),
}

/// 命令分发器。
pub struct Dispatcher {
    portal_url: String,
    layout: InstallLayout,
    shell: Arc<dyn Shell>,
    toasts: Arc<ToastCenter>,
    run_log: DiagLog,
}

impl Dispatcher {
    pub fn new(
        portal_url: impl Into<String>,
        layout: InstallLayout,
        shell: Arc<dyn Shell>,
        toasts: Arc<ToastCenter>,
    ) -> Self {
        let run_log = DiagLog::new(layout.run_log_file());
        Self {
            portal_url: portal_url.into(),
            layout,
            shell,
            toasts,
            run_log,
        }
    }

    pub fn toasts(&self) -> &Arc<ToastCenter> {
        &self.toasts
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// 处理一条消息。
    ///
    /// 规则：
    /// - 命令 `open`：打开门户
    /// - 命令 `exit`：立即退出
    /// - 命令 `run`：忽略
    /// - 非空地址：按 `apphub://` 动作路由
    /// - 其他（无内容、未知命令、空地址）：提示“运行中”，然后打开门户
    pub fn handle(&self, message: &Message) -> DispatchOutcome {
        match message {
            Message::Command(text) if text.eq_ignore_ascii_case("open") => {
                return self.open_portal();
            }
            Message::Command(text) if text.eq_ignore_ascii_case("exit") => {
                info!("收到退出命令");
                return DispatchOutcome::ShutdownRequested;
            }
            Message::Command(text) if text.eq_ignore_ascii_case("run") => {
                return DispatchOutcome::Ignored;
            }
            Message::Url(url) if !url.trim().is_empty() => return self.handle_url(url),
            _ => {}
        }

        self.toasts.show_success("运行中");
        self.open_portal()
    }

    /// 用默认浏览器打开门户。
    pub fn open_portal(&self) -> DispatchOutcome {
        match self.shell.open_url(&self.portal_url) {
            Ok(()) => {
                info!("已打开门户: {}", self.portal_url);
                DispatchOutcome::PortalOpened
            }
            Err(e) => {
                warn!("打开门户失败 {}: {e}", self.portal_url);
                self.toasts.show_error(&format!("打开门户失败: {e}"));
                DispatchOutcome::PortalFailed(e.to_string())
            }
        }
    }

    fn handle_url(&self, raw: &str) -> DispatchOutcome {
        info!("处理地址: {}", shorten(raw, LOG_URL_CHARS));
        let parsed = match ParsedUrl::parse(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                let text = format!("{e}");
                self.toasts.alert(&text);
                return DispatchOutcome::Rejected(text);
            }
        };

        match &parsed.action {
            UrlAction::Open => {
                self.toasts.show_success("运行中");
                DispatchOutcome::Notified
            }
            UrlAction::Exit => DispatchOutcome::ExitRequested,
            UrlAction::Ping => DispatchOutcome::Ignored,
            UrlAction::Run => DispatchOutcome::Launch(self.run_app(&parsed.query)),
            UrlAction::Install | UrlAction::Update => {
                let text = format!(
                    "INSTALL/UPDATE\nmsi={}\nurl={}",
                    parsed.query.value_or_empty("msi"),
                    parsed.query.value_or_empty("url")
                );
                self.toasts.alert(&text);
                DispatchOutcome::Displayed
            }
            UrlAction::Unknown(action) => {
                warn!("未知动作: {action}");
                let text = format!("未知动作:\n{raw}");
                self.toasts.alert(&text);
                DispatchOutcome::Rejected(text)
            }
        }
    }

    /// 启动 `Apps\<分类>\<应用>` 下的本地应用。
    ///
    /// 流程：
    /// 1) 提取并清洗参数；参数不足直接提示
    /// 2) 目标不存在：提示“找不到应用”，不启动任何进程
    /// 3) 预建 `-log` 目录，写入启动记录
    /// 4) 通过 [`Shell`] 启动（可请求提权）
    pub fn run_app(&self, query: &QueryMap) -> LaunchOutcome {
        let request = match RunRequest::from_query(query) {
            Ok(request) => request,
            Err(e) => {
                warn!("run 参数无效: {e}");
                self.toasts.show_error(&e.to_string());
                return LaunchOutcome::InvalidParameters(e);
            }
        };

        let app_dir = request.app_dir(&self.layout);
        let target = request.target_exe(&self.layout);
        if !target.is_file() {
            let display = request.display_path();
            warn!("找不到应用: {}", target.display());
            self.toasts.show_error(&format!("找不到应用\n{display}"));
            return LaunchOutcome::AppNotFound(display);
        }

        ensure_log_directory(&request.extra_args, &app_dir);
        self.run_log.append_line(&format!(
            "[{}] admin={} exe=\"{}\" args=\"{}\"",
            timestamp(),
            request.run_as_admin,
            target.display(),
            request.extra_args
        ));

        let spec = LaunchSpec {
            program: target,
            args: request.extra_args.clone(),
            working_dir: app_dir,
            elevate: request.run_as_admin,
        };
        match self.shell.launch(&spec) {
            Ok(()) => {
                info!("已请求启动: {}", spec.program.display());
                let text = if request.run_as_admin {
                    format!("{}（管理员）启动请求已发送", request.exe_name)
                } else {
                    format!("{} 启动请求已发送", request.exe_name)
                };
                self.toasts.show_success(&text);
                LaunchOutcome::Started {
                    exe_name: request.exe_name,
                    elevated: request.run_as_admin,
                }
            }
            Err(LaunchError::ElevationCancelled) => {
                info!("用户取消了管理员权限请求: {}", request.exe_name);
                self.toasts.show_info("管理员权限启动已取消");
                LaunchOutcome::ElevationDeclined
            }
            Err(e) => {
                warn!("启动失败 {}: {e}", spec.program.display());
                self.toasts.show_error(&format!("启动失败: {e}"));
                LaunchOutcome::Failed(e.to_string())
            }
        }
    }
}
