mod support;

use std::time::{Duration, Instant};

use apphub_core::host::{AgentHost, HostEvent};
use apphub_core::message::Message;
use apphub_core::pipe::{try_send, PipeServer};
use apphub_core::toast::ToastKind;
use support::{Fixture, SurfaceEvent, PORTAL};
use uuid::Uuid;

#[tokio::test]
async fn exit_url_shows_toast_before_delayed_teardown() {
    let fx = Fixture::new("apphub-host-exit");
    let delay = Duration::from_millis(150);
    let host = AgentHost::new(fx.dispatcher).with_exit_delay(delay);

    tokio::time::timeout(
        Duration::from_secs(10),
        host.run(Message::url("apphub://exit"), true),
    )
    .await
    .expect("host stopped");
    let finished = Instant::now();

    let kinds: Vec<ToastKind> = fx.surface.toasts().into_iter().map(|t| t.1).collect();
    assert_eq!(kinds, vec![ToastKind::Success, ToastKind::Info]);

    let exit_toast_at = fx
        .surface
        .timed_events()
        .into_iter()
        .filter_map(|(at, event)| match event {
            SurfaceEvent::Toast {
                kind: ToastKind::Info,
                ..
            } => Some(at),
            _ => None,
        })
        .last()
        .expect("exit toast");
    assert!(finished.duration_since(exit_toast_at) >= delay);
}

#[tokio::test]
async fn exit_command_stops_without_exit_toast() {
    let fx = Fixture::new("apphub-host-cmd-exit");
    let host = AgentHost::new(fx.dispatcher).with_exit_delay(Duration::from_secs(30));

    tokio::time::timeout(
        Duration::from_secs(5),
        host.run(Message::command("exit"), true),
    )
    .await
    .expect("host stopped immediately");

    let kinds: Vec<ToastKind> = fx.surface.toasts().into_iter().map(|t| t.1).collect();
    assert_eq!(kinds, vec![ToastKind::Success]);
    assert!(fx.shell.opened().is_empty());
}

#[tokio::test]
async fn queued_events_are_handled_in_order() {
    let fx = Fixture::new("apphub-host-queue");
    let host = AgentHost::new(fx.dispatcher);
    let sender = host.sender();
    sender
        .send(HostEvent::Message(Message::command("open")))
        .expect("queue open");
    sender.send(HostEvent::Shutdown).expect("queue shutdown");
    sender
        .send(HostEvent::Message(Message::command("open")))
        .expect("queue late open");

    tokio::time::timeout(Duration::from_secs(5), host.run(Message::none(), false))
        .await
        .expect("host stopped");

    // 无参数启动直接打开门户，加上队列里的一次；关闭之后的事件不再处理
    assert_eq!(fx.shell.opened(), vec![PORTAL.to_string(), PORTAL.to_string()]);
}

#[tokio::test]
async fn messages_from_the_channel_reach_the_dispatcher() {
    let fx = Fixture::new("apphub-host-pipe");
    let channel = format!("AppHubAgentTest_{}", Uuid::new_v4().simple());
    let host = AgentHost::new(fx.dispatcher).with_pipe(PipeServer::new(channel.clone()));

    let client_channel = channel.clone();
    let client = std::thread::spawn(move || {
        for wire in ["CMD|open", "CMD|exit"] {
            let deadline = Instant::now() + Duration::from_secs(5);
            while !try_send(&client_channel, wire, Duration::from_millis(300)) {
                assert!(Instant::now() < deadline, "channel never became reachable");
                std::thread::sleep(Duration::from_millis(20));
            }
        }
    });

    tokio::time::timeout(Duration::from_secs(10), host.run(Message::none(), false))
        .await
        .expect("host stopped");
    client.join().expect("client thread");

    assert_eq!(fx.shell.opened(), vec![PORTAL.to_string(), PORTAL.to_string()]);
    // 关闭后通道不再可达
    assert!(!try_send(&channel, "NONE|", Duration::from_millis(300)));
}

// 其他平台退化为套接字文件，重新绑定会清理旧文件，不会冲突
#[cfg(any(target_os = "linux", windows))]
#[tokio::test]
async fn occupied_channel_shows_error_and_keeps_dispatching() {
    let fx = Fixture::new("apphub-host-busy");
    let channel = format!("AppHubAgentTest_{}", Uuid::new_v4().simple());
    let mut occupant = PipeServer::new(channel.clone());
    occupant.start(|_| {}).expect("occupy channel");

    let host = AgentHost::new(fx.dispatcher).with_pipe(PipeServer::new(channel));
    let sender = host.sender();
    sender
        .send(HostEvent::Message(Message::command("open")))
        .expect("queue open");
    sender.send(HostEvent::Shutdown).expect("queue shutdown");

    tokio::time::timeout(Duration::from_secs(5), host.run(Message::none(), false))
        .await
        .expect("host stopped");
    occupant.stop();

    let kinds: Vec<ToastKind> = fx.surface.toasts().into_iter().map(|t| t.1).collect();
    assert_eq!(kinds, vec![ToastKind::Success, ToastKind::Error]);
    assert_eq!(fx.shell.opened(), vec![PORTAL.to_string(), PORTAL.to_string()]);
}
