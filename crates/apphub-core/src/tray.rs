//! 托盘菜单动作：“打开”/“退出”不直接执行，而是作为命令经 IPC 通道发回主实例，
//! 与外部调用走同一条分发路径。
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use crate::diag::DiagLog;
use crate::message::Message;
use crate::pipe::PipeClient;

/// 托盘菜单项。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    /// “打开”或双击托盘图标。
    Open,
    /// “退出”（需用户确认）。
    Exit,
}

impl TrayAction {
    pub fn message(self) -> Message {
        match self {
            TrayAction::Open => Message::command("open"),
            TrayAction::Exit => Message::command("exit"),
        }
    }
}

/// 退出确认提示文本。
pub const EXIT_CONFIRM_TEXT: &str = "确定要退出吗？\n（退出后门户将无法启动本地应用）";

/// 托盘命令发送器。
#[derive(Debug, Clone)]
pub struct TrayCommands {
    client: PipeClient,
}

impl TrayCommands {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            client: PipeClient::new(channel),
        }
    }

    pub fn with_log(mut self, log: DiagLog) -> Self {
        self.client = self.client.with_log(log);
        self
    }

    /// 发送菜单命令；返回是否送达。
    ///
    /// 参数：
    /// - `confirm`：仅 [`TrayAction::Exit`] 调用，返回 `false` 时不发送
    pub fn trigger<F>(&self, action: TrayAction, confirm: F) -> bool
    where
        F: FnOnce(&str) -> bool,
    {
        if action == TrayAction::Exit && !confirm(EXIT_CONFIRM_TEXT) {
            return false;
        }
        self.client.try_send(&action.message().to_wire())
    }
}
