use std::path::{Path, PathBuf};

use apphub_core::paths::InstallLayout;

#[test]
fn root_is_two_levels_above_the_agent_exe() {
    let exe = Path::new("/opt/AppHubAgent/Agent/apphub-agent");
    let layout = InstallLayout::from_agent_exe(exe).expect("layout");
    assert_eq!(layout.root(), Path::new("/opt/AppHubAgent"));
    assert_eq!(
        layout.app_dir("Tools", "Notes"),
        PathBuf::from("/opt/AppHubAgent/Apps/Tools/Notes")
    );
    assert_eq!(
        layout.run_log_file(),
        PathBuf::from("/opt/AppHubAgent/Logs/agent-run.log")
    );
    assert_eq!(
        layout.ipc_log_file(),
        PathBuf::from("/opt/AppHubAgent/Logs/agent-ipc.log")
    );
}

#[test]
fn exe_without_grandparent_is_an_error() {
    assert!(InstallLayout::from_agent_exe(Path::new("apphub-agent")).is_err());
}

#[test]
fn locating_falls_back_to_the_exe_directory() {
    assert_eq!(
        InstallLayout::locate_from_agent_exe(Path::new("apphub-agent")).root(),
        Path::new(".")
    );
    assert_eq!(
        InstallLayout::locate_from_agent_exe(Path::new("/apphub-agent")).root(),
        Path::new("/")
    );
    assert_eq!(
        InstallLayout::locate_from_agent_exe(Path::new("/opt/AppHubAgent/Agent/apphub-agent"))
            .root(),
        Path::new("/opt/AppHubAgent")
    );
}
