//! 安装目录布局约定。
//!
//! 目录结构（以安装根目录为基准）：
//! - `Agent\apphub-agent.exe`：本程序
//! - `Apps\<分类>\<应用>\<exe>`：可被 `run` 动作启动的本地应用
//! - `Logs\agent-run.log` / `Logs\agent-ipc.log`：追加写入的诊断日志
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::warn;

/// 应用目录名。
pub const APPS_DIR: &str = "Apps";
/// 日志目录名。
pub const LOGS_DIR: &str = "Logs";
/// 启动记录日志文件名。
pub const RUN_LOG_FILE: &str = "agent-run.log";
/// IPC 诊断日志文件名。
pub const IPC_LOG_FILE: &str = "agent-ipc.log";

/// 安装目录布局（只读视图，不负责创建目录）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 根据本程序可执行文件路径推导安装根目录。
    ///
    /// 规则：
    /// - `...\AppHubAgent\Agent\apphub-agent.exe` → `...\AppHubAgent`
    ///
    /// 异常处理：
    /// - 可执行文件没有上两级目录时返回错误
    pub fn from_agent_exe(exe: &Path) -> Result<Self> {
        let agent_dir = exe
            .parent()
            .ok_or_else(|| anyhow!("无法确定程序所在目录: {}", exe.display()))?;
        let root = agent_dir
            .parent()
            .ok_or_else(|| anyhow!("无法确定安装根目录: {}", agent_dir.display()))?;
        Ok(Self::new(root))
    }

    /// 同 [`InstallLayout::from_agent_exe`]，推导失败时退回到程序所在目录（再退回当前目录）。
    pub fn locate_from_agent_exe(exe: &Path) -> Self {
        match Self::from_agent_exe(exe) {
            Ok(layout) => layout,
            Err(e) => {
                let fallback = exe
                    .parent()
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .unwrap_or(Path::new("."));
                warn!("{e:#}，改用 {}", fallback.display());
                Self::new(fallback)
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn apps_dir(&self) -> PathBuf {
        self.root.join(APPS_DIR)
    }

    /// 单个应用的目录：`Apps\<category>\<app_name>`。
    ///
    /// 注意：
    /// - 参数必须是已清洗过的名称，本函数不做校验
    pub fn app_dir(&self, category: &str, app_name: &str) -> PathBuf {
        self.apps_dir().join(category).join(app_name)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    pub fn run_log_file(&self) -> PathBuf {
        self.logs_dir().join(RUN_LOG_FILE)
    }

    pub fn ipc_log_file(&self) -> PathBuf {
        self.logs_dir().join(IPC_LOG_FILE)
    }
}
