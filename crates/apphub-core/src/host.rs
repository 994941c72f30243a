//! 主实例宿主：事件队列、IPC 接入与退出编排。
//!
//! 说明：
//! - 宿主上下文是一个 FIFO 事件队列；所有分发、提示、启动都在这里串行执行
//! - IPC 监听线程只负责把收到的文本投递进队列
//! - 地址 `exit`：先同步显示退出提示，再由同一上下文上的定时器延迟投递 `Shutdown`
//! - 命令 `exit`：跳过提示与延迟，直接关闭
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::message::Message;
use crate::pipe::PipeServer;

/// 退出提示与实际关闭之间的默认间隔。
pub const DEFAULT_EXIT_DELAY: Duration = Duration::from_millis(800);

/// 宿主队列中的事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Message(Message),
    Shutdown,
}

/// 主实例宿主。
pub struct AgentHost {
    dispatcher: Dispatcher,
    pipe: Option<PipeServer>,
    exit_delay: Duration,
    tx: UnboundedSender<HostEvent>,
    rx: UnboundedReceiver<HostEvent>,
    exit_in_progress: bool,
}

impl AgentHost {
    pub fn new(dispatcher: Dispatcher) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            dispatcher,
            pipe: None,
            exit_delay: DEFAULT_EXIT_DELAY,
            tx,
            rx,
            exit_in_progress: false,
        }
    }

    /// 附加 IPC 服务端（在 [`AgentHost::run`] 中启动）。
    pub fn with_pipe(mut self, server: PipeServer) -> Self {
        self.pipe = Some(server);
        self
    }

    /// 设置退出延迟（至少 1ms）。
    pub fn with_exit_delay(mut self, delay: Duration) -> Self {
        self.exit_delay = delay.max(Duration::from_millis(1));
        self
    }

    /// 向宿主队列投递事件的句柄。
    pub fn sender(&self) -> UnboundedSender<HostEvent> {
        self.tx.clone()
    }

    /// 运行宿主直到关闭。
    ///
    /// 参数：
    /// - `initial`：由启动参数解析出的消息
    /// - `had_args`：启动时是否带参数；不带参数时直接打开门户
    ///
    /// 说明：
    /// - 必须在 Tokio Runtime 中运行（退出定时器使用 `tokio::spawn`）
    /// - IPC 启动失败只提示，不影响宿主继续运行
    pub async fn run(mut self, initial: Message, had_args: bool) {
        self.dispatcher.toasts().show_success("准备完成");
        self.start_pipe();

        if had_args {
            let _ = self.tx.send(HostEvent::Message(initial));
        } else {
            self.dispatcher.open_portal();
        }

        while let Some(event) = self.rx.recv().await {
            match event {
                HostEvent::Message(message) => match self.dispatcher.handle(&message) {
                    DispatchOutcome::ShutdownRequested => break,
                    DispatchOutcome::ExitRequested => self.begin_exit(),
                    _ => {}
                },
                HostEvent::Shutdown => break,
            }
        }

        self.teardown();
    }

    fn start_pipe(&mut self) {
        let Some(pipe) = self.pipe.as_mut() else {
            return;
        };
        let tx = self.tx.clone();
        let started = pipe.start(move |wire| {
            let _ = tx.send(HostEvent::Message(Message::from_wire(&wire)));
        });
        if let Err(e) = started {
            warn!("IPC 服务启动失败: {e:#}");
            self.dispatcher.toasts().show_error("IPC 服务启动失败");
        }
    }

    /// 开始退出流程（重复调用无效）。
    fn begin_exit(&mut self) {
        if self.exit_in_progress {
            return;
        }
        self.exit_in_progress = true;
        info!("开始退出，{}ms 后关闭", self.exit_delay.as_millis());

        self.dispatcher.toasts().show_info("已退出");

        let tx = self.tx.clone();
        let delay = self.exit_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(HostEvent::Shutdown);
        });
    }

    fn teardown(&mut self) {
        if let Some(mut pipe) = self.pipe.take() {
            pipe.stop();
        }
        info!("主实例已关闭");
    }
}
