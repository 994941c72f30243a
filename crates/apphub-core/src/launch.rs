//! 本地应用启动请求：参数提取、名称清洗、目标路径解析。
//!
//! 安全注意：
//! - 分类/应用/exe 名称全部来自外部地址，拼接路径前必须清洗，
//!   去掉路径分隔符、`..`、盘符分隔符与文件名非法字符
//! - exe 只允许文件名，不允许携带目录
//! - 本模块不启动进程；实际启动通过 [`Shell`] 完成，便于替换与测试
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::paths::InstallLayout;
use crate::protocol::{decode_if_needed, parse_bool, QueryMap};

const EXE_SUFFIX: &str = ".exe";

/// Windows 文件名中不允许出现的字符（控制字符另行处理）。
const INVALID_NAME_CHARS: &[char] = &['"', '<', '>', '|', ':', '*', '?', '\\', '/'];

/// 启动请求参数错误。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunRequestError {
    #[error("run 参数不足（cat, app）")]
    MissingParameters,
    #[error("参数清洗后为空: {0}")]
    EmptyAfterSanitize(&'static str),
}

/// 进程启动失败原因。
#[derive(Debug, Error)]
pub enum LaunchError {
    /// 用户在 UAC 提示中拒绝了提权（预期内的选择，不是故障）。
    #[error("管理员权限请求已被取消")]
    ElevationCancelled,
    #[error("{0}")]
    Failed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// 从 `apphub://run?...` 提取的启动请求（已清洗）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub category: String,
    pub app_name: String,
    pub exe_name: String,
    pub run_as_admin: bool,
    /// 原样传给子进程的参数串。
    pub extra_args: String,
}

impl RunRequest {
    /// 从查询参数构造启动请求。
    ///
    /// 参数别名（取第一个非空值）：
    /// - 分类：`cat` / `category`
    /// - 应用：`app` / `appName`
    /// - 可执行文件：`exe`（缺省为 `<app>.exe`）
    /// - 管理员：`admin`
    /// - 参数：`args`
    ///
    /// 异常处理：
    /// - 分类或应用为空：[`RunRequestError::MissingParameters`]
    /// - 清洗后名称为空：[`RunRequestError::EmptyAfterSanitize`]
    pub fn from_query(query: &QueryMap) -> Result<Self, RunRequestError> {
        let category = query.first_of(&["cat", "category"]);
        let app_name = query.first_of(&["app", "appName"]);
        let exe_name = query.first_of(&["exe"]);
        let run_as_admin = parse_bool(&query.first_of(&["admin"]), false);
        let extra_args = decode_if_needed(&query.first_of(&["args"]));

        if category.is_empty() || app_name.is_empty() {
            return Err(RunRequestError::MissingParameters);
        }

        let category = non_empty(sanitize_name(&category), "cat")?;
        let app_name = non_empty(sanitize_name(&app_name), "app")?;
        let exe_name = if exe_name.is_empty() {
            format!("{app_name}{EXE_SUFFIX}")
        } else {
            sanitize_exe(&exe_name)
        };
        if exe_name.eq_ignore_ascii_case(EXE_SUFFIX) {
            return Err(RunRequestError::EmptyAfterSanitize("exe"));
        }

        Ok(Self {
            category,
            app_name,
            exe_name,
            run_as_admin,
            extra_args,
        })
    }

    /// 应用目录（同时作为子进程工作目录）。
    pub fn app_dir(&self, layout: &InstallLayout) -> PathBuf {
        layout.app_dir(&self.category, &self.app_name)
    }

    /// 目标可执行文件完整路径。
    pub fn target_exe(&self, layout: &InstallLayout) -> PathBuf {
        self.app_dir(layout).join(&self.exe_name)
    }

    /// 用于提示的相对显示名：`<分类>\<应用>\<exe>`。
    pub fn display_path(&self) -> String {
        format!("{}\\{}\\{}", self.category, self.app_name, self.exe_name)
    }
}

fn non_empty(s: String, field: &'static str) -> Result<String, RunRequestError> {
    if s.is_empty() || s == "." {
        return Err(RunRequestError::EmptyAfterSanitize(field));
    }
    Ok(s)
}

/// 清洗单级目录/文件名。
///
/// 规则：
/// - 去掉首尾空白
/// - 反复去掉 `\`、`/`、`..`、`:`、文件名非法字符与控制字符，直到结果不再变化
///   （去掉某个字符后可能拼出新的 `..`，所以要循环）
pub fn sanitize_name(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    loop {
        let next: String = current
            .replace("..", "")
            .chars()
            .filter(|c| !c.is_control() && !INVALID_NAME_CHARS.contains(c))
            .collect();
        let next = next.trim().to_string();
        if next == current {
            return next;
        }
        current = next;
    }
}

/// 清洗 exe 名称。
///
/// 规则：
/// - 只保留最后一个 `/` 或 `\` 之后的文件名部分
/// - 按 [`sanitize_name`] 清洗
/// - 没有 `.exe` 后缀（忽略大小写）时补上
pub fn sanitize_exe(raw: &str) -> String {
    let file_part = raw.trim().rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let mut name = sanitize_name(file_part);
    if !name.to_ascii_lowercase().ends_with(EXE_SUFFIX) {
        name.push_str(EXE_SUFFIX);
    }
    name
}

/// 交给 [`Shell`] 的进程启动描述。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: String,
    pub working_dir: PathBuf,
    pub elevate: bool,
}

/// 系统外壳能力：打开地址、启动进程（可请求提权）。
///
/// 说明：
/// - 平台实现位于 `apphub-platform`；测试中可替换为记录调用的假实现
pub trait Shell: Send + Sync {
    /// 用系统默认程序打开地址（浏览器）。
    fn open_url(&self, url: &str) -> Result<(), LaunchError>;

    /// 启动进程。
    ///
    /// 异常处理：
    /// - 用户拒绝提权：[`LaunchError::ElevationCancelled`]
    /// - 其他失败：[`LaunchError::Failed`] / [`LaunchError::Io`]
    fn launch(&self, spec: &LaunchSpec) -> Result<(), LaunchError>;
}

/// 从参数串中找出 `-log` 指定的日志路径。
///
/// 支持形式：
/// - `-log=<path>` / `-log <path>` / `-log "<带空格的 path>"`
///
/// 返回值：
/// - 找到非空路径：`Some(path)`
/// - 未找到：`None`
pub fn log_path_from_args(args: &str) -> Option<String> {
    let lower = args.to_ascii_lowercase();
    let mut search_from = 0;
    while let Some(found) = lower[search_from..].find("-log") {
        let start = search_from + found;
        let rest = &args[start + 4..];
        search_from = start + 4;

        // `-logfile` 之类的其他开关不算
        match rest.chars().next() {
            None => return None,
            Some(c) if c == '=' || c.is_whitespace() => {}
            Some(_) => continue,
        }

        let value = rest.trim_start();
        let value = value.strip_prefix('=').unwrap_or(value).trim_start();
        let path = match value.strip_prefix('"') {
            Some(quoted) => quoted.split('"').next().unwrap_or_default(),
            None => value.split_whitespace().next().unwrap_or_default(),
        };
        let path = path.trim();
        return (!path.is_empty()).then(|| path.to_string());
    }
    None
}

/// 确保 `-log` 指定路径的上级目录存在（尽力而为）。
///
/// 参数：
/// - `args`：传给子进程的参数串
/// - `base_dir`：相对路径的基准目录（子进程工作目录）
///
/// 返回值：
/// - 实际尝试创建的目录（便于日志与测试）；没有 `-log` 或无上级目录时为 `None`
///
/// 异常处理：
/// - 创建失败被忽略，只记录 `debug` 日志
pub fn ensure_log_directory(args: &str, base_dir: &Path) -> Option<PathBuf> {
    let path = PathBuf::from(log_path_from_args(args)?);
    let path = if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    };
    let dir = path.parent()?.to_path_buf();
    if dir.as_os_str().is_empty() {
        return None;
    }
    if !dir.exists() {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            debug!("创建 -log 目录失败 {}: {e}", dir.display());
        }
    }
    Some(dir)
}
