//! 本机 IPC 消息模型与线路编码。
//!
//! 协议形态：
//! - 一条连接只传一条消息，消息为单行 UTF-8 文本
//! - `CMD|<text>`：简单命令（open / exit / run）
//! - `URL|<text>`：完整的 `apphub://` 地址
//! - `NONE|`：没有可识别的参数
//!
//! 约束与注意事项：
//! - 消息构造后不可变；只能通过 [`Message::from_args`]、[`Message::from_wire`] 或具名构造函数得到
//! - 调用方负责保证负载不含换行
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

/// 请求打开门户的命令行开关（兼容旧安装包写入的双连字符形式）。
pub const OPEN_PORTAL_FLAGS: &[&str] = &["--open--portal", "--open-portal"];

/// 请求退出常驻实例的命令行开关。
pub const EXIT_FLAG: &str = "--exit";

const URL_MARKER: &str = "://";
const BOM: char = '\u{feff}';

/// IPC 消息。
///
/// 说明：
/// - 负载随变体携带，`Command` 只有命令文本，`Url` 只有地址
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Message {
    /// 无可识别内容。
    #[default]
    None,
    /// 简单命令（比较时忽略大小写）。
    Command(String),
    /// 自定义协议地址（原样保留）。
    Url(String),
}

/// 消息类别（用于日志与统计）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    None,
    Command,
    Url,
}

impl Message {
    pub fn none() -> Self {
        Message::None
    }

    pub fn command(text: impl Into<String>) -> Self {
        Message::Command(text.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        Message::Url(url.into())
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Message::None => MessageKind::None,
            Message::Command(_) => MessageKind::Command,
            Message::Url(_) => MessageKind::Url,
        }
    }

    /// 命令文本（仅 `Command` 变体有值）。
    pub fn command_text(&self) -> Option<&str> {
        match self {
            Message::Command(text) => Some(text),
            _ => None,
        }
    }

    /// 地址文本（仅 `Url` 变体有值）。
    pub fn url_text(&self) -> Option<&str> {
        match self {
            Message::Url(url) => Some(url),
            _ => None,
        }
    }

    /// 将进程启动参数解析为消息。
    ///
    /// 规则（按优先级）：
    /// 1) 第一个参数包含 `://`：视为完整地址，原样保存
    /// 2) 任一参数等于打开门户开关（忽略大小写）：`Command("open")`
    /// 3) 任一参数等于退出开关（忽略大小写）：`Command("exit")`
    /// 4) 其余情况：`None`
    ///
    /// 异常处理：
    /// - 不会失败；无法识别时降级为 `None`
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let Some(first) = args.first() else {
            return Message::None;
        };
        let first = first.as_ref();
        if !first.trim().is_empty() && first.contains(URL_MARKER) {
            return Message::url(first);
        }

        let has = |flag: &str| args.iter().any(|a| a.as_ref().eq_ignore_ascii_case(flag));
        if OPEN_PORTAL_FLAGS.iter().any(|flag| has(flag)) {
            return Message::command("open");
        }
        if has(EXIT_FLAG) {
            return Message::command("exit");
        }
        Message::None
    }

    /// 编码为线路文本。
    pub fn to_wire(&self) -> String {
        match self {
            Message::None => "NONE|".to_string(),
            Message::Command(text) => format!("CMD|{text}"),
            Message::Url(url) => format!("URL|{url}"),
        }
    }

    /// 从线路文本解码。
    ///
    /// 规则：
    /// - 去掉 BOM 与首尾空白；空串得到 `None`
    /// - 无 `|` 分隔符时，含 `://` 的整串视为裸地址（兼容直接写入地址的旧客户端）
    /// - 头部忽略大小写：`CMD` / `URL`；其他头部得到 `None`
    pub fn from_wire(wire: &str) -> Self {
        let wire = wire.trim_start_matches(BOM).trim();
        if wire.is_empty() {
            return Message::None;
        }

        let Some((head, body)) = wire.split_once('|') else {
            if wire.contains(URL_MARKER) {
                return Message::url(wire);
            }
            return Message::None;
        };

        match head.trim().to_ascii_uppercase().as_str() {
            "CMD" => Message::command(body),
            "URL" => Message::url(body),
            _ => Message::None,
        }
    }
}
