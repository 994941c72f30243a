//! 启动决策：转交给已运行的主实例、直接退出，或成为主实例。
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use crate::message::Message;
use crate::protocol::ParsedUrl;

/// 启动决策结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupPlan {
    /// 已有主实例：把消息转交过去后退出。
    Forward(Message),
    /// 一次性动作（如 `ping`、`exit`），无需常驻，直接退出。
    ExitEarly(Message),
    Primary { initial: Message, had_args: bool },
}

/// 根据单实例锁结果与启动参数决定启动方式。
///
/// 规则：
/// - 未取得锁：`Forward`
/// - 取得锁，且参数是可解析的绝对地址、动作不是 `run` / `open`：`ExitEarly`
/// - 其他：`Primary`
pub fn plan_startup<S: AsRef<str>>(acquired: bool, args: &[S]) -> StartupPlan {
    let message = Message::from_args(args);
    if !acquired {
        return StartupPlan::Forward(message);
    }

    if let Message::Url(raw) = &message {
        if let Ok(parsed) = ParsedUrl::parse_any(raw) {
            if !parsed.action.keeps_agent_resident() {
                return StartupPlan::ExitEarly(message);
            }
        }
    }

    StartupPlan::Primary {
        initial: message,
        had_args: !args.is_empty(),
    }
}
