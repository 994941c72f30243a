//! 系统级单实例锁。
//!
//! 实现方式：
//! - Windows：命名互斥量（`CreateMutexW`，创建即持有）；`ERROR_ALREADY_EXISTS` 视为已有实例
//! - Unix：临时目录下 `<清洗后的锁名>.lock` 文件上的 `flock(LOCK_EX | LOCK_NB)`
//!
//! 生命周期：
//! - 锁随 [`SingleInstanceLock`] 释放而释放；释放失败忽略
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use anyhow::Result;
use tracing::info;

/// 已持有的单实例锁。
pub struct SingleInstanceLock {
    name: String,
    _inner: imp::Lock,
}

impl SingleInstanceLock {
    /// 尝试取得锁（不等待）。
    ///
    /// 返回值：
    /// - `Ok(Some(lock))`：当前进程成为主实例
    /// - `Ok(None)`：已有其他实例持有该锁
    ///
    /// 异常处理：
    /// - 系统调用失败（权限、路径等）返回错误；调用方按“未取得”处理
    pub fn acquire(name: &str) -> Result<Option<Self>> {
        let acquired = imp::acquire(name)?.map(|inner| Self {
            name: name.to_string(),
            _inner: inner,
        });
        if acquired.is_some() {
            info!("已取得单实例锁: {name}");
        }
        Ok(acquired)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(windows)]
mod imp {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;

    use anyhow::{Context, Result};
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{CloseHandle, GetLastError, ERROR_ALREADY_EXISTS, HANDLE};
    use windows::Win32::System::Threading::{CreateMutexW, ReleaseMutex};

    pub struct Lock(HANDLE);

    pub fn acquire(name: &str) -> Result<Option<Lock>> {
        let wide: Vec<u16> = OsStr::new(name)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();
        unsafe {
            let handle = CreateMutexW(None, true, PCWSTR(wide.as_ptr()))
                .with_context(|| format!("创建互斥量失败: {name}"))?;
            if GetLastError() == ERROR_ALREADY_EXISTS {
                let _ = CloseHandle(handle);
                return Ok(None);
            }
            Ok(Some(Lock(handle)))
        }
    }

    impl Drop for Lock {
        fn drop(&mut self) {
            unsafe {
                let _ = ReleaseMutex(self.0);
                let _ = CloseHandle(self.0);
            }
        }
    }
}

#[cfg(unix)]
mod imp {
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::os::unix::io::AsRawFd;
    use std::path::PathBuf;

    use anyhow::{Context, Result};

    pub struct Lock {
        file: File,
    }

    /// `Global\AppHubAgent_Mutex_v1` → `<tmp>/Global_AppHubAgent_Mutex_v1.lock`
    fn lock_path(name: &str) -> PathBuf {
        let file_name: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        std::env::temp_dir().join(format!("{file_name}.lock"))
    }

    pub fn acquire(name: &str) -> Result<Option<Lock>> {
        let path = lock_path(name);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("打开锁文件失败: {}", path.display()))?;

        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc == 0 {
            return Ok(Some(Lock { file }));
        }
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock {
            return Ok(None);
        }
        Err(err).with_context(|| format!("锁定文件失败: {}", path.display()))
    }

    impl Drop for Lock {
        fn drop(&mut self) {
            unsafe {
                libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
            }
        }
    }
}
