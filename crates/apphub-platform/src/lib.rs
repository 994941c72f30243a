//! AppHub Agent 平台能力封装（单实例锁、进程启动、桌面提示）。
//!
//! 目标：
//! - 将 Win32 细节集中在本 crate，核心库只依赖 [`apphub_core::launch::Shell`] 等抽象
//! - 非 Windows 平台提供可运行的替代实现，便于开发与测试
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

pub mod dialog;
pub mod instance;
pub mod shell;
