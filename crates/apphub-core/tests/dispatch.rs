mod support;

use apphub_core::dispatch::{DispatchOutcome, LaunchOutcome};
use apphub_core::launch::{LaunchError, RunRequestError};
use apphub_core::message::Message;
use apphub_core::toast::ToastKind;
use support::{Fixture, RecordingShell, PORTAL};

#[test]
fn missing_app_reports_not_found_without_spawning() {
    let fx = Fixture::new("apphub-dispatch-missing");
    let outcome = fx
        .dispatcher
        .handle(&Message::url("apphub://run?cat=Demo&app=Missing"));

    assert_eq!(
        outcome,
        DispatchOutcome::Launch(LaunchOutcome::AppNotFound(r"Demo\Missing\Missing.exe".to_string()))
    );
    assert!(fx.shell.launched().is_empty());
    let toasts = fx.surface.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].1, ToastKind::Error);
    assert!(toasts[0].0.contains(r"Demo\Missing\Missing.exe"));
}

#[test]
fn installed_app_is_launched_from_its_directory() {
    let fx = Fixture::new("apphub-dispatch-run");
    let exe = fx.install_app("Tools", "Notes", "Notes.exe");

    let outcome = fx
        .dispatcher
        .handle(&Message::url("apphub://run?cat=Tools&app=Notes&admin=yes&args=-log%3Dlogs%2Fa.txt"));

    assert_eq!(
        outcome,
        DispatchOutcome::Launch(LaunchOutcome::Started {
            exe_name: "Notes.exe".to_string(),
            elevated: true,
        })
    );
    let launched = fx.shell.launched();
    assert_eq!(launched.len(), 1);
    assert_eq!(launched[0].program, exe);
    assert_eq!(launched[0].working_dir, fx.root.join("Apps").join("Tools").join("Notes"));
    assert_eq!(launched[0].args, "-log=logs/a.txt");
    assert!(launched[0].elevate);

    // -log 目录预先创建在应用目录下
    assert!(launched[0].working_dir.join("logs").is_dir());

    let run_log = std::fs::read_to_string(fx.root.join("Logs").join("agent-run.log"))
        .expect("run log written");
    assert!(run_log.contains("admin=true"), "{run_log}");
    assert!(run_log.contains("args=\"-log=logs/a.txt\""), "{run_log}");

    let toasts = fx.surface.toasts();
    assert_eq!(toasts.last().map(|t| t.1), Some(ToastKind::Success));
}

#[test]
fn declined_elevation_is_reported_as_info() {
    let fx = Fixture::with_shell(
        "apphub-dispatch-uac",
        RecordingShell::with_result(|| Err(LaunchError::ElevationCancelled)),
    );
    fx.install_app("Tools", "Notes", "Notes.exe");

    let outcome = fx
        .dispatcher
        .handle(&Message::url("apphub://run?cat=Tools&app=Notes&admin=1"));

    assert_eq!(
        outcome,
        DispatchOutcome::Launch(LaunchOutcome::ElevationDeclined)
    );
    assert_eq!(fx.surface.toasts().last().map(|t| t.1), Some(ToastKind::Info));
}

#[test]
fn launch_failure_is_reported_as_error() {
    let fx = Fixture::with_shell(
        "apphub-dispatch-fail",
        RecordingShell::with_result(|| Err(LaunchError::Failed("boom".to_string()))),
    );
    fx.install_app("Tools", "Notes", "Notes.exe");

    let outcome = fx
        .dispatcher
        .handle(&Message::url("apphub://run?cat=Tools&app=Notes"));

    assert_eq!(
        outcome,
        DispatchOutcome::Launch(LaunchOutcome::Failed("boom".to_string()))
    );
    let (text, kind) = fx.surface.toasts().pop().expect("toast");
    assert_eq!(kind, ToastKind::Error);
    assert!(text.contains("boom"));
}

#[test]
fn run_without_required_parameters_only_notifies() {
    let fx = Fixture::new("apphub-dispatch-params");
    let outcome = fx.dispatcher.handle(&Message::url("apphub://run?cat=Tools"));
    let recorded = outcome.clone();
    assert_eq!(recorded, outcome);
    assert_eq!(
        outcome,
        DispatchOutcome::Launch(LaunchOutcome::InvalidParameters(
            RunRequestError::MissingParameters
        ))
    );
    assert!(fx.shell.launched().is_empty());
    assert_eq!(fx.surface.toasts().len(), 1);
}

#[test]
fn install_only_displays_details() {
    let fx = Fixture::new("apphub-dispatch-install");
    let before = fx.snapshot();

    let outcome = fx
        .dispatcher
        .handle(&Message::url(r"apphub://install?msi=C:\a.msi"));

    assert_eq!(outcome, DispatchOutcome::Displayed);
    assert!(fx.shell.launched().is_empty());
    assert!(fx.shell.opened().is_empty());
    assert_eq!(fx.snapshot(), before);
    let boxes = fx.surface.message_boxes();
    assert_eq!(boxes.len(), 1);
    assert!(boxes[0].contains(r"msi=C:\a.msi"), "{}", boxes[0]);
}

#[test]
fn commands_map_to_portal_shutdown_and_noop() {
    let fx = Fixture::new("apphub-dispatch-cmd");
    assert_eq!(
        fx.dispatcher.handle(&Message::command("OPEN")),
        DispatchOutcome::PortalOpened
    );
    assert_eq!(fx.shell.opened(), vec![PORTAL.to_string()]);
    assert_eq!(
        fx.dispatcher.handle(&Message::command("exit")),
        DispatchOutcome::ShutdownRequested
    );
    assert_eq!(
        fx.dispatcher.handle(&Message::command("run")),
        DispatchOutcome::Ignored
    );
    assert!(fx.surface.toasts().is_empty());
}

#[test]
fn unrecognized_input_shows_running_then_opens_portal() {
    let fx = Fixture::new("apphub-dispatch-none");
    for message in [Message::none(), Message::command("dance"), Message::url("  ")] {
        assert_eq!(fx.dispatcher.handle(&message), DispatchOutcome::PortalOpened);
    }
    assert_eq!(fx.shell.opened().len(), 3);
    assert!(fx
        .surface
        .toasts()
        .iter()
        .all(|(_, kind)| *kind == ToastKind::Success));
}

#[test]
fn url_actions_route_without_side_effects() {
    let fx = Fixture::new("apphub-dispatch-url");
    assert_eq!(
        fx.dispatcher.handle(&Message::url("apphub://ping")),
        DispatchOutcome::Ignored
    );
    assert_eq!(
        fx.dispatcher.handle(&Message::url("apphub://exit")),
        DispatchOutcome::ExitRequested
    );
    // 地址形式的 open 只提示，不打开门户
    assert_eq!(
        fx.dispatcher.handle(&Message::url("apphub://open")),
        DispatchOutcome::Notified
    );
    assert!(fx.shell.opened().is_empty());
}

#[test]
fn bad_urls_are_rejected_with_a_message_box() {
    let fx = Fixture::new("apphub-dispatch-bad");
    for raw in ["apphub//broken", "https://example.com/", "apphub://teleport"] {
        let outcome = fx.dispatcher.handle(&Message::url(raw));
        assert!(
            matches!(outcome, DispatchOutcome::Rejected(_)),
            "{raw}: {outcome:?}"
        );
    }
    assert_eq!(fx.surface.message_boxes().len(), 3);
    assert!(fx.shell.opened().is_empty());
    assert!(fx.shell.launched().is_empty());
}
