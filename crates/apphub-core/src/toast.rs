//! 桌面提示（toast）与消息框。
//!
//! 说明：
//! - 同一时刻只保留一个提示：显示新提示前先强制关闭当前提示
//! - 具体绘制交给 [`ToastSurface`]（平台实现位于 `apphub-platform`），便于测试替换
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::sync::{Arc, Mutex};

use tracing::warn;

/// 所有提示共用的标题。
pub const TOAST_TITLE: &str = "AppHub Agent";

/// 提示类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// 已显示的提示窗口句柄。
pub trait ToastWindow: Send {
    /// 立即关闭（忽略淡出等动画）。
    fn force_close(&mut self);
}

/// 提示的绘制面。
pub trait ToastSurface: Send + Sync {
    fn present(&self, title: &str, message: &str, kind: ToastKind) -> Box<dyn ToastWindow>;

    /// 阻塞式消息框（地址错误、安装信息等需要用户确认的内容）。
    fn message_box(&self, title: &str, text: &str);
}

/// 提示中心：持有“当前提示”槽位。
pub struct ToastCenter {
    surface: Arc<dyn ToastSurface>,
    current: Mutex<Option<Box<dyn ToastWindow>>>,
}

impl ToastCenter {
    pub fn new(surface: Arc<dyn ToastSurface>) -> Self {
        Self {
            surface,
            current: Mutex::new(None),
        }
    }

    /// 显示提示；先关闭当前提示，再显示新提示。
    pub fn show(&self, message: &str, kind: ToastKind) {
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("提示槽位锁已中毒，继续使用");
                poisoned.into_inner()
            }
        };
        if let Some(mut previous) = current.take() {
            previous.force_close();
        }
        *current = Some(self.surface.present(TOAST_TITLE, message, kind));
    }

    pub fn show_info(&self, message: &str) {
        self.show(message, ToastKind::Info);
    }

    pub fn show_success(&self, message: &str) {
        self.show(message, ToastKind::Success);
    }

    pub fn show_error(&self, message: &str) {
        self.show(message, ToastKind::Error);
    }

    /// 弹出消息框（不占用提示槽位）。
    pub fn alert(&self, text: &str) {
        self.surface.message_box(TOAST_TITLE, text);
    }
}
