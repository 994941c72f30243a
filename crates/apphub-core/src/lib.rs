//! AppHub Agent 核心库（平台无关）。
//!
//! 功能：
//! - 定义本机 IPC 消息模型与线路编码，以及基于本地套接字/命名管道的收发
//! - 解析 `apphub://` 自定义协议地址，校验并清洗本地应用启动请求
//! - 分发消息、编排主实例生命周期（事件队列、退出流程）
//! - 提供安装目录约定、诊断日志与配置加载
//!
//! 平台相关能力（单实例锁、进程启动、桌面提示）通过 [`launch::Shell`] 与
//! [`toast::ToastSurface`] 注入，实现在 `apphub-platform`。
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

pub mod config;
pub mod diag;
pub mod dispatch;
pub mod host;
pub mod launch;
pub mod message;
pub mod paths;
pub mod pipe;
pub mod protocol;
pub mod startup;
pub mod toast;
pub mod tray;
