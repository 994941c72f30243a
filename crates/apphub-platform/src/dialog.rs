//! 桌面提示面：提示写入日志，消息框在 Windows 下使用 `MessageBoxW`。
//!
//! 说明：
//! - 提示窗口的外观与动画不在本程序范围内，这里只负责“显示/关闭”两个时刻
//! - 非 Windows 平台没有消息框，内容写入 `warn` 日志
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use apphub_core::toast::{ToastKind, ToastSurface, ToastWindow};
use tracing::{debug, error, info, warn};

/// 平台默认提示面。
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopSurface;

struct LoggedToast {
    message: String,
}

impl ToastWindow for LoggedToast {
    fn force_close(&mut self) {
        debug!("关闭提示: {}", self.message);
    }
}

impl ToastSurface for DesktopSurface {
    fn present(&self, title: &str, message: &str, kind: ToastKind) -> Box<dyn ToastWindow> {
        match kind {
            ToastKind::Info => info!("[{title}] {message}"),
            ToastKind::Success => info!("[{title}] ✔ {message}"),
            ToastKind::Error => error!("[{title}] {message}"),
        }
        Box::new(LoggedToast {
            message: message.to_string(),
        })
    }

    fn message_box(&self, title: &str, text: &str) {
        warn!("[{title}] {text}");
        imp::message_box(title, text);
    }
}

#[cfg(windows)]
mod imp {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;

    use windows::core::PCWSTR;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONINFORMATION, MB_OK};

    fn to_wide(s: &str) -> Vec<u16> {
        OsStr::new(s)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect()
    }

    pub fn message_box(title: &str, text: &str) {
        let title = to_wide(title);
        let text = to_wide(text);
        unsafe {
            let _ = MessageBoxW(
                HWND::default(),
                PCWSTR(text.as_ptr()),
                PCWSTR(title.as_ptr()),
                MB_OK | MB_ICONINFORMATION,
            );
        }
    }
}

#[cfg(not(windows))]
mod imp {
    pub fn message_box(_title: &str, _text: &str) {}
}
