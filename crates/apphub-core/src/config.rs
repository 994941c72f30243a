//! 代理配置：门户地址、环境标识、IPC 通道名、单实例锁名与安装根目录覆盖。
//!
//! 来源（后者覆盖前者）：
//! 1) 内置默认值
//! 2) 可执行文件同目录下的 `agent-config.json`（字段均可省略）
//! 3) 环境变量 `APPHUB_*`
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 配置文件名（与可执行文件放在同一目录）。
pub const CONFIG_FILE: &str = "agent-config.json";

pub const DEFAULT_PORTAL_URL: &str = "http://127.0.0.1/";
pub const DEFAULT_ENVIRONMENT: &str = "Dev";
pub const DEFAULT_CHANNEL_NAME: &str = "AppHubAgentPipe_v1";
/// 全部用户共享一个实例，因此使用 `Global\` 前缀。
pub const DEFAULT_INSTANCE_LOCK: &str = r"Global\AppHubAgent_Mutex_v1";

pub const ENV_PORTAL_URL: &str = "APPHUB_PORTAL_URL";
pub const ENV_ENVIRONMENT: &str = "APPHUB_ENVIRONMENT";
pub const ENV_CHANNEL: &str = "APPHUB_CHANNEL";
pub const ENV_INSTANCE_LOCK: &str = "APPHUB_INSTANCE_LOCK";
pub const ENV_INSTALL_ROOT: &str = "APPHUB_INSTALL_ROOT";

/// 配置读取错误。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件失败: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 代理配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// 门户地址（“打开门户”时用默认浏览器打开）。
    pub portal_url: String,
    /// 环境标识（Dev / Prod 等），仅用于日志。
    pub environment: String,
    /// IPC 通道名。
    pub channel_name: String,
    /// 系统级单实例锁名。
    pub instance_lock: String,
    /// 安装根目录覆盖；为空时由可执行文件位置推导。
    pub install_root: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            instance_lock: DEFAULT_INSTANCE_LOCK.to_string(),
            install_root: None,
        }
    }
}

impl AgentConfig {
    /// 读取配置文件；文件不存在时返回默认值。
    ///
    /// 异常处理：
    /// - 文件存在但读取/解析失败时返回 [`ConfigError`]
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 以环境变量覆盖已有配置（空值忽略）。
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// 以任意键值来源覆盖配置；`lookup` 返回空白值时视为未设置。
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_PORTAL_URL) {
            self.portal_url = v;
        }
        if let Some(v) = get(ENV_ENVIRONMENT) {
            self.environment = v;
        }
        if let Some(v) = get(ENV_CHANNEL) {
            self.channel_name = v;
        }
        if let Some(v) = get(ENV_INSTANCE_LOCK) {
            self.instance_lock = v;
        }
        if let Some(v) = get(ENV_INSTALL_ROOT) {
            self.install_root = Some(PathBuf::from(v));
        }
        self
    }

    /// 按“默认值 → 配置文件 → 环境变量”顺序加载。
    ///
    /// 返回值：
    /// - `(配置, 配置文件错误)`：配置文件损坏时仍返回默认值叠加环境变量的结果，
    ///   同时把错误交给调用方记录
    pub fn load(config_file: &Path) -> (Self, Option<ConfigError>) {
        let (base, err) = match Self::from_file(config_file) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        };
        (base.apply_env(), err)
    }
}
