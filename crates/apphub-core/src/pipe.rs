//! 本机 IPC 通道（Windows 命名管道 / Unix 本地套接字）。
//!
//! 协议形态：
//! - 客户端连接 → 写入一条完整消息 → 关闭；服务端读到流结束即为一条消息
//! - 单向、无应答、无长度前缀
//!
//! 服务端：
//! - 在独立线程上运行单线程 Tokio Runtime，整个生命周期只有一个监听循环
//! - 连接逐个串行处理；单次失败记录日志并等待 150ms 后继续，避免空转
//! - 取消信号可立即打断等待连接/读取/退避
//!
//! 客户端：
//! - 连接超时默认 300ms；任何失败都只返回 `false`，不向上抛错
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::io;
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use interprocess::local_socket::tokio::{prelude::*, Listener, Stream};
use interprocess::local_socket::{
    GenericFilePath, GenericNamespaced, ListenerOptions, Name, NameType, ToFsName, ToNsName,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::diag::{shorten, DiagLog};

/// 客户端默认连接超时。
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(300);

/// 连接级失败后的退避时间。
pub const FAILURE_BACKOFF: Duration = Duration::from_millis(150);

/// 单条消息上限；超出上限的消息整条丢弃。
pub const MAX_MESSAGE_BYTES: u64 = 64 * 1024;

const SERVER_TAG: &str = "PIPESERVER";
const CLIENT_TAG: &str = "PIPECLIENT";
const LOG_PAYLOAD_CHARS: usize = 260;

/// 将通道名转换为本机套接字名。
///
/// 规则：
/// - 支持命名空间的平台（Windows 命名管道、Linux 抽象套接字）直接使用通道名
/// - 其他平台退化为临时目录下的 `<通道名>.sock` 文件
fn channel_name(channel: &str) -> io::Result<Name<'static>> {
    if GenericNamespaced::is_supported() {
        channel.to_string().to_ns_name::<GenericNamespaced>()
    } else {
        socket_file(channel).to_fs_name::<GenericFilePath>()
    }
}

fn socket_file(channel: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{channel}.sock"))
}

/// 绑定监听端（必须在 Tokio Runtime 上下文中调用）。
fn bind(channel: &str) -> io::Result<Listener> {
    if !GenericNamespaced::is_supported() {
        // 单实例锁保证只有一个主实例，残留的套接字文件可以直接清理
        let _ = std::fs::remove_file(socket_file(channel));
    }
    ListenerOptions::new().name(channel_name(channel)?).create_tokio()
}

/// 读取一条完整消息（直到对端关闭）。
///
/// 异常处理：
/// - 超过 [`MAX_MESSAGE_BYTES`] 返回 `InvalidData("oversize")`，不交付截断的前缀
async fn read_message(conn: Stream) -> io::Result<String> {
    let mut buf = Vec::new();
    let limited = conn.take(MAX_MESSAGE_BYTES + 1);
    tokio::pin!(limited);
    match limited.read_to_end(&mut buf).await {
        Ok(_) => {}
        // Windows 命名管道在客户端关闭时可能报 BrokenPipe，已读到的数据仍然有效
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe && !buf.is_empty() => {}
        Err(e) => return Err(e),
    }
    if buf.len() as u64 > MAX_MESSAGE_BYTES {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "oversize"));
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

struct Running {
    cancel: watch::Sender<bool>,
    thread: JoinHandle<()>,
}

/// IPC 服务端句柄。
///
/// 状态：
/// - `Stopped`：未启动或已停止
/// - `Listening`：监听线程运行中
///
/// 说明：
/// - `start`/`stop` 都是幂等的；句柄释放时自动停止
pub struct PipeServer {
    channel: String,
    log: Option<DiagLog>,
    running: Option<Running>,
}

impl PipeServer {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            log: None,
            running: None,
        }
    }

    /// 附加 IPC 诊断日志（`agent-ipc.log`）。
    pub fn with_log(mut self, log: DiagLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// 启动监听线程。
    ///
    /// 参数：
    /// - `sink`：收到非空消息时调用（在监听线程上执行，调用方负责转交到主上下文）
    ///
    /// 返回值：
    /// - 绑定成功后返回；已在运行时直接返回 `Ok(())`
    ///
    /// 异常处理：
    /// - 线程创建失败、Runtime 创建失败、通道绑定失败（如通道被占用）会返回错误
    pub fn start<F>(&mut self, sink: F) -> Result<()>
    where
        F: Fn(String) + Send + 'static,
    {
        if self.running.is_some() {
            return Ok(());
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<io::Result<()>>();
        let channel = self.channel.clone();
        let log = self.log.clone();

        let thread = std::thread::Builder::new()
            .name("apphub-pipe".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                rt.block_on(async move {
                    let listener = match bind(&channel) {
                        Ok(listener) => listener,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                    let _ = ready_tx.send(Ok(()));
                    listen_loop(&channel, listener, cancel_rx, sink, log.as_ref()).await;
                });
            })
            .context("创建 IPC 监听线程失败")?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("IPC 通道监听中: {}", self.channel);
                self.running = Some(Running {
                    cancel: cancel_tx,
                    thread,
                });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                if let Some(log) = &self.log {
                    log.log(SERVER_TAG, &format!("Listen FAIL pipe={} err={e}", self.channel));
                }
                Err(anyhow::Error::new(e).context(format!("监听 IPC 通道失败: {}", self.channel)))
            }
            Err(_) => {
                let _ = thread.join();
                Err(anyhow!("IPC 监听线程意外退出: {}", self.channel))
            }
        }
    }

    /// 停止监听并等待线程退出（幂等）。
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let _ = running.cancel.send(true);
        if running.thread.join().is_err() {
            warn!("IPC 监听线程异常退出: {}", self.channel);
        }
        info!("IPC 通道已关闭: {}", self.channel);
    }
}

impl Drop for PipeServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 监听主循环：接收连接 → 读取一条消息 → 交给 `sink`，直到收到取消信号。
async fn listen_loop<F>(
    channel: &str,
    listener: Listener,
    mut cancel: watch::Receiver<bool>,
    sink: F,
    log: Option<&DiagLog>,
) where
    F: Fn(String),
{
    if let Some(log) = log {
        log.log(SERVER_TAG, &format!("Listen BEGIN pipe={channel}"));
    }

    loop {
        if *cancel.borrow() {
            break;
        }

        let accepted = tokio::select! {
            _ = cancel.changed() => break,
            accepted = listener.accept() => accepted,
        };
        let received = match accepted {
            Ok(conn) => tokio::select! {
                _ = cancel.changed() => break,
                read = read_message(conn) => read,
            },
            Err(e) => Err(e),
        };

        match received {
            Ok(text) => {
                let text = text.trim_start_matches('\u{feff}').trim();
                if text.is_empty() {
                    debug!("忽略空 IPC 消息");
                    continue;
                }
                if let Some(log) = log {
                    log.log(
                        SERVER_TAG,
                        &format!("Received payload={}", shorten(text, LOG_PAYLOAD_CHARS)),
                    );
                }
                sink(text.to_string());
            }
            Err(e) => {
                warn!("IPC 连接处理失败: {e}");
                if let Some(log) = log {
                    log.log(SERVER_TAG, &format!("Connection FAIL err={e}"));
                }
                tokio::select! {
                    _ = cancel.changed() => break,
                    _ = tokio::time::sleep(FAILURE_BACKOFF) => {}
                }
            }
        }
    }

    if let Some(log) = log {
        log.log(SERVER_TAG, &format!("Listen END pipe={channel}"));
    }
}

/// IPC 客户端（一次连接发送一条消息）。
#[derive(Debug, Clone)]
pub struct PipeClient {
    channel: String,
    timeout: Duration,
    log: Option<DiagLog>,
}

impl PipeClient {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            timeout: DEFAULT_SEND_TIMEOUT,
            log: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_log(mut self, log: DiagLog) -> Self {
        self.log = Some(log);
        self
    }

    /// 异步发送（供已处于 Runtime 中的调用方使用）。
    ///
    /// 异常处理：
    /// - 连接超时返回 `TimedOut`；连接/写入失败原样返回
    pub async fn send(&self, payload: &str) -> io::Result<()> {
        let name = channel_name(&self.channel)?;
        let conn = tokio::time::timeout(self.timeout, Stream::connect(name))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("连接 IPC 通道超时（{}ms）", self.timeout.as_millis()),
                )
            })??;
        tokio::pin!(conn);
        conn.write_all(payload.as_bytes()).await?;
        conn.flush().await?;
        Ok(())
    }

    /// 同步发送，失败只返回 `false`。
    ///
    /// 说明：
    /// - “没有主实例在运行”是正常结果，调用方不应向用户报错
    /// - 当前线程已处于 Runtime 中时，改在临时线程上执行，避免嵌套 `block_on`
    pub fn try_send(&self, payload: &str) -> bool {
        let short = shorten(payload, LOG_PAYLOAD_CHARS);
        self.log_line(&format!(
            "TrySend BEGIN pipe={} timeoutMs={} payload={short}",
            self.channel,
            self.timeout.as_millis()
        ));

        match self.blocking_send(payload) {
            Ok(()) => {
                debug!("IPC 消息已发送: {}", self.channel);
                self.log_line(&format!("TrySend OK pipe={} payload={short}", self.channel));
                true
            }
            Err(e) => {
                debug!("IPC 消息发送失败 {}: {e}", self.channel);
                self.log_line(&format!(
                    "TrySend FAIL pipe={} err={:?}:{e} payload={short}",
                    self.channel,
                    e.kind()
                ));
                false
            }
        }
    }

    fn blocking_send(&self, payload: &str) -> io::Result<()> {
        let run = || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            rt.block_on(self.send(payload))
        };
        if tokio::runtime::Handle::try_current().is_ok() {
            std::thread::scope(|s| s.spawn(run).join())
                .unwrap_or_else(|_| Err(io::Error::other("IPC 发送线程异常退出")))
        } else {
            run()
        }
    }

    fn log_line(&self, message: &str) {
        if let Some(log) = &self.log {
            log.log(CLIENT_TAG, message);
        }
    }
}

/// 向指定通道发送一条消息；任何失败都只返回 `false`。
pub fn try_send(channel: &str, payload: &str, timeout: Duration) -> bool {
    PipeClient::new(channel).with_timeout(timeout).try_send(payload)
}
