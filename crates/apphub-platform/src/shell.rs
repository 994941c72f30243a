//! 系统外壳：打开地址、启动进程（Windows 下可请求管理员权限）。
//!
//! 实现方式：
//! - Windows：`ShellExecuteExW`；提权时动词为 `runas`，用户在 UAC 提示中取消时
//!   返回 `ERROR_CANCELLED`（1223），映射为 [`LaunchError::ElevationCancelled`]
//! - 其他平台：`std::process::Command`；地址交给 `xdg-open`（macOS 为 `open`），
//!   不支持提权，按普通权限启动并记录警告
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use apphub_core::launch::{LaunchError, LaunchSpec, Shell};
use tracing::info;

/// 平台默认外壳实现。
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

impl Shell for SystemShell {
    fn open_url(&self, url: &str) -> Result<(), LaunchError> {
        info!("打开地址: {url}");
        imp::open_url(url)
    }

    fn launch(&self, spec: &LaunchSpec) -> Result<(), LaunchError> {
        info!(
            "启动进程: {} (admin={}) cwd={}",
            spec.program.display(),
            spec.elevate,
            spec.working_dir.display()
        );
        imp::launch(spec)
    }
}

/// 按 Windows 命令行习惯拆分参数串：空白分隔，双引号内的空白保留，引号本身去掉。
pub fn split_args(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut pending = false;
    for c in args.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                pending = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if pending {
                    out.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        out.push(current);
    }
    out
}

#[cfg(windows)]
mod imp {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;

    use apphub_core::launch::{LaunchError, LaunchSpec};
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::ERROR_CANCELLED;
    use windows::Win32::UI::Shell::{ShellExecuteExW, SEE_MASK_FLAG_NO_UI, SHELLEXECUTEINFOW};
    use windows::Win32::UI::WindowsAndMessaging::SW_SHOWNORMAL;

    fn to_wide(s: &OsStr) -> Vec<u16> {
        s.encode_wide().chain(std::iter::once(0)).collect()
    }

    fn shell_execute(
        verb: Option<&str>,
        file: &OsStr,
        parameters: &str,
        directory: Option<&Path>,
    ) -> Result<(), LaunchError> {
        let verb = verb.map(|v| to_wide(OsStr::new(v)));
        let file = to_wide(file);
        let parameters = (!parameters.trim().is_empty()).then(|| to_wide(OsStr::new(parameters)));
        let directory = directory.map(|d| to_wide(d.as_os_str()));
        let ptr = |w: &Option<Vec<u16>>| w.as_ref().map_or(PCWSTR::null(), |w| PCWSTR(w.as_ptr()));

        let mut info = SHELLEXECUTEINFOW {
            cbSize: std::mem::size_of::<SHELLEXECUTEINFOW>() as u32,
            // 失败只通过返回值上报，由调用方的提示呈现
            fMask: SEE_MASK_FLAG_NO_UI,
            lpVerb: ptr(&verb),
            lpFile: PCWSTR(file.as_ptr()),
            lpParameters: ptr(&parameters),
            lpDirectory: ptr(&directory),
            nShow: SW_SHOWNORMAL.0,
            ..Default::default()
        };

        unsafe { ShellExecuteExW(&mut info) }.map_err(|e| {
            if e.code() == ERROR_CANCELLED.to_hresult() {
                LaunchError::ElevationCancelled
            } else {
                LaunchError::Failed(e.to_string())
            }
        })
    }

    pub fn open_url(url: &str) -> Result<(), LaunchError> {
        shell_execute(Some("open"), OsStr::new(url), "", None)
    }

    pub fn launch(spec: &LaunchSpec) -> Result<(), LaunchError> {
        let verb = spec.elevate.then_some("runas");
        shell_execute(
            verb,
            spec.program.as_os_str(),
            &spec.args,
            Some(&spec.working_dir),
        )
    }
}

#[cfg(not(windows))]
mod imp {
    use std::process::{Command, Stdio};

    use apphub_core::launch::{LaunchError, LaunchSpec};
    use tracing::warn;

    use super::split_args;

    #[cfg(target_os = "macos")]
    const URL_OPENER: &str = "open";
    #[cfg(not(target_os = "macos"))]
    const URL_OPENER: &str = "xdg-open";

    pub fn open_url(url: &str) -> Result<(), LaunchError> {
        Command::new(URL_OPENER)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }

    pub fn launch(spec: &LaunchSpec) -> Result<(), LaunchError> {
        if spec.elevate {
            warn!("当前平台不支持提权启动，按普通权限启动: {}", spec.program.display());
        }
        Command::new(&spec.program)
            .args(split_args(&spec.args))
            .current_dir(&spec.working_dir)
            .spawn()?;
        Ok(())
    }
}
