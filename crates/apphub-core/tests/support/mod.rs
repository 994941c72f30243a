#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use apphub_core::dispatch::Dispatcher;
use apphub_core::launch::{LaunchError, LaunchSpec, Shell};
use apphub_core::paths::InstallLayout;
use apphub_core::toast::{ToastCenter, ToastKind, ToastSurface, ToastWindow};
use uuid::Uuid;

pub const PORTAL: &str = "http://portal.test/";

pub struct CleanupDir(pub PathBuf);

impl Drop for CleanupDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

pub fn unique_temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// 记录调用的假外壳；`launch_result` 决定启动结果。
pub struct RecordingShell {
    pub opened: Mutex<Vec<String>>,
    pub launched: Mutex<Vec<LaunchSpec>>,
    pub launch_result: fn() -> Result<(), LaunchError>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::with_result(|| Ok(()))
    }

    pub fn with_result(launch_result: fn() -> Result<(), LaunchError>) -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            launched: Mutex::new(Vec::new()),
            launch_result,
        }
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("lock").clone()
    }

    pub fn launched(&self) -> Vec<LaunchSpec> {
        self.launched.lock().expect("lock").clone()
    }
}

impl Shell for RecordingShell {
    fn open_url(&self, url: &str) -> Result<(), LaunchError> {
        self.opened.lock().expect("lock").push(url.to_string());
        Ok(())
    }

    fn launch(&self, spec: &LaunchSpec) -> Result<(), LaunchError> {
        self.launched.lock().expect("lock").push(spec.clone());
        (self.launch_result)()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Toast { message: String, kind: ToastKind },
    Closed,
    MessageBox(String),
}

/// 记录提示与消息框的假绘制面。
#[derive(Default)]
pub struct RecordingSurface {
    pub events: Arc<Mutex<Vec<(Instant, SurfaceEvent)>>>,
}

impl RecordingSurface {
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events
            .lock()
            .expect("lock")
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn timed_events(&self) -> Vec<(Instant, SurfaceEvent)> {
        self.events.lock().expect("lock").clone()
    }

    pub fn toasts(&self) -> Vec<(String, ToastKind)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::Toast { message, kind } => Some((message, kind)),
                _ => None,
            })
            .collect()
    }

    pub fn message_boxes(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SurfaceEvent::MessageBox(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

struct RecordingWindow {
    events: Arc<Mutex<Vec<(Instant, SurfaceEvent)>>>,
}

impl ToastWindow for RecordingWindow {
    fn force_close(&mut self) {
        self.events
            .lock()
            .expect("lock")
            .push((Instant::now(), SurfaceEvent::Closed));
    }
}

impl ToastSurface for RecordingSurface {
    fn present(&self, _title: &str, message: &str, kind: ToastKind) -> Box<dyn ToastWindow> {
        self.events.lock().expect("lock").push((
            Instant::now(),
            SurfaceEvent::Toast {
                message: message.to_string(),
                kind,
            },
        ));
        Box::new(RecordingWindow {
            events: self.events.clone(),
        })
    }

    fn message_box(&self, _title: &str, text: &str) {
        self.events
            .lock()
            .expect("lock")
            .push((Instant::now(), SurfaceEvent::MessageBox(text.to_string())));
    }
}

pub struct Fixture {
    pub root: PathBuf,
    pub shell: Arc<RecordingShell>,
    pub surface: Arc<RecordingSurface>,
    pub dispatcher: Dispatcher,
    _cleanup: CleanupDir,
}

impl Fixture {
    pub fn new(prefix: &str) -> Self {
        Self::with_shell(prefix, RecordingShell::new())
    }

    pub fn with_shell(prefix: &str, shell: RecordingShell) -> Self {
        let root = unique_temp_dir(prefix);
        let shell = Arc::new(shell);
        let surface = Arc::new(RecordingSurface::default());
        let toasts = Arc::new(ToastCenter::new(surface.clone()));
        let dispatcher = Dispatcher::new(
            PORTAL,
            InstallLayout::new(root.clone()),
            shell.clone(),
            toasts,
        );
        Self {
            root: root.clone(),
            shell,
            surface,
            dispatcher,
            _cleanup: CleanupDir(root),
        }
    }

    /// 在 `Apps/<cat>/<app>/` 下放一个假的可执行文件。
    pub fn install_app(&self, category: &str, app: &str, exe: &str) -> PathBuf {
        let dir = self.root.join("Apps").join(category).join(app);
        std::fs::create_dir_all(&dir).expect("create app dir");
        let exe = dir.join(exe);
        std::fs::write(&exe, b"stub").expect("write exe");
        exe
    }

    /// 列出根目录下的全部文件与目录（用于确认没有副作用）。
    pub fn snapshot(&self) -> Vec<PathBuf> {
        fn walk(dir: &std::path::Path, out: &mut Vec<PathBuf>) {
            if let Ok(entries) = std::fs::read_dir(dir) {
                for entry in entries.flatten() {
                    let path = entry.path();
                    out.push(path.clone());
                    if path.is_dir() {
                        walk(&path, out);
                    }
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out.sort();
        out
    }
}
