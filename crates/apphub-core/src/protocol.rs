//! `apphub://` 自定义协议地址解析。
//!
//! 地址形态：
//! - `apphub://<action>[?query]`，`action` 取自地址的 host 部分
//! - 查询参数的键忽略大小写；重复键以最后一次出现为准
//! - 键与值都做百分号解码（`+` 保持原样，不视为空格）
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

/// 本程序注册的自定义协议名。
pub const SCHEME: &str = "apphub";

/// 地址解析错误。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("地址格式不正确: {0}")]
    Malformed(String),
    #[error("未知协议: {0}")]
    UnknownScheme(String),
}

/// 地址中的动作。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlAction {
    Open,
    Exit,
    Ping,
    Run,
    Install,
    Update,
    Unknown(String),
}

impl UrlAction {
    /// 从 host 文本解析动作（忽略大小写）。
    pub fn parse(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "open" => UrlAction::Open,
            "exit" => UrlAction::Exit,
            "ping" => UrlAction::Ping,
            "run" => UrlAction::Run,
            "install" => UrlAction::Install,
            "update" => UrlAction::Update,
            other => UrlAction::Unknown(other.to_string()),
        }
    }

    /// 是否需要常驻实例（`run` / `open`）。
    ///
    /// 其余动作都是一次性的：首个实例收到后直接退出，不启动常驻服务。
    pub fn keeps_agent_resident(&self) -> bool {
        matches!(self, UrlAction::Run | UrlAction::Open)
    }
}

/// 忽略键大小写的查询参数表。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap {
    entries: HashMap<String, String>,
}

impl QueryMap {
    /// 解析查询串（可带前导 `?`）。
    ///
    /// 说明：
    /// - 以 `&` 分段，空段忽略；每段只在第一个 `=` 处切分
    /// - 没有 `=` 的段视为值为空串
    pub fn parse(query: &str) -> Self {
        let query = query.trim();
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut entries = HashMap::new();
        for part in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            entries.insert(decode_component(key).to_lowercase(), decode_component(value));
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_lowercase()).map(String::as_str)
    }

    /// 按别名顺序取第一个非空值（去掉首尾空白）。
    ///
    /// 返回值：
    /// - 找到：去空白后的值
    /// - 均不存在或均为空白：空串
    pub fn first_of(&self, keys: &[&str]) -> String {
        keys.iter()
            .filter_map(|k| self.get(k))
            .find(|v| !v.trim().is_empty())
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// 按原样取值（不存在时为空串），用于只做展示的参数。
    pub fn value_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 解析后的 `apphub://` 地址。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub scheme: String,
    pub action: UrlAction,
    /// 原始 host 文本（小写），用于错误提示与日志。
    pub action_token: String,
    pub query: QueryMap,
}

impl ParsedUrl {
    /// 解析任意绝对地址，不校验协议名。
    ///
    /// 异常处理：
    /// - 不是合法的绝对地址时返回 [`UrlError::Malformed`]
    pub fn parse_any(raw: &str) -> Result<Self, UrlError> {
        let url = Url::parse(raw.trim()).map_err(|_| UrlError::Malformed(raw.to_string()))?;
        let action_token = url.host_str().unwrap_or_default().to_ascii_lowercase();
        Ok(Self {
            scheme: url.scheme().to_string(),
            action: UrlAction::parse(&action_token),
            action_token,
            query: QueryMap::parse(url.query().unwrap_or_default()),
        })
    }

    /// 解析并要求协议名为 [`SCHEME`]（忽略大小写）。
    ///
    /// 异常处理：
    /// - 非法地址：[`UrlError::Malformed`]
    /// - 协议名不匹配：[`UrlError::UnknownScheme`]
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        let parsed = Self::parse_any(raw)?;
        if !parsed.scheme.eq_ignore_ascii_case(SCHEME) {
            return Err(UrlError::UnknownScheme(raw.to_string()));
        }
        Ok(parsed)
    }
}

/// 百分号解码；结果不是合法 UTF-8 时按有损方式解码。
fn decode_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// 值中仍含 `%` 时再解码一次（兼容前端对参数做了双重编码的情况）。
///
/// 异常处理：
/// - 二次解码结果不是合法 UTF-8 时返回原值
pub fn decode_if_needed(s: &str) -> String {
    if s.trim().is_empty() {
        return String::new();
    }
    if !s.contains('%') {
        return s.to_string();
    }
    match percent_decode_str(s).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => s.to_string(),
    }
}

/// 宽松的布尔解析。
///
/// 规则：
/// - `1/true/yes/y/on` 为真，`0/false/no/n/off` 为假（忽略大小写）
/// - 空白或其他值返回 `default`
pub fn parse_bool(s: &str, default: bool) -> bool {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => true,
        "0" | "false" | "no" | "n" | "off" => false,
        _ => default,
    }
}
