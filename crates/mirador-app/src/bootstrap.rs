//! Composition root: wires the view service, the workspace controller,
//! and the background pumps together, then runs until shutdown.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use mirador_common::{Event, EventBus, Rect, ViewBridge};
use mirador_config::MiradorConfig;
use mirador_ui::{ChromeInsets, JsonFileStore, LayoutStore, WorkspaceController};
use mirador_view::backend::HeadlessHost;
use mirador_view::service::ViewService;

use crate::cli::Args;

/// Registration-once guard owned by the composition root. Registration is
/// keyed by subsystem name and idempotent, so a double-invoked setup path
/// cannot wire a subsystem twice.
pub struct SubsystemRegistry {
    registered: HashSet<&'static str>,
}

impl SubsystemRegistry {
    pub fn new() -> Self {
        Self {
            registered: HashSet::new(),
        }
    }

    /// Returns `true` on first registration; a repeat is refused.
    pub fn register(&mut self, name: &'static str) -> bool {
        let first = self.registered.insert(name);
        if !first {
            warn!(subsystem = name, "duplicate subsystem registration refused");
        }
        first
    }
}

impl Default for SubsystemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn insets_from(config: &MiradorConfig) -> ChromeInsets {
    ChromeInsets {
        title_bar: config.window.titlebar_height as f64,
        tab_strip: config.window.tab_strip_height as f64,
        sidebar_left: config.window.sidebar_width as f64,
        border: config.window.border_width as f64,
    }
}

fn layout_path(args: &Args) -> PathBuf {
    if let Some(path) = &args.layout {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mirador")
        .join("layout.json")
}

pub async fn run(args: Args, config: MiradorConfig) {
    let mut subsystems = SubsystemRegistry::new();
    let bus = Arc::new(EventBus::new(64));

    // Workspace-level notifications for chrome overlays; headless runs
    // just log them.
    subsystems.register("event-bus");
    let mut bus_rx = bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = bus_rx.recv().await {
            tracing::debug!(?event, "workspace event");
        }
    });

    // View process side (in-process headless host by default; the
    // wry-backend feature of mirador-view provides the real one).
    subsystems.register("view-service");
    let (handle, mut events_rx) = ViewService::spawn(HeadlessHost::new());
    let bridge: Arc<dyn ViewBridge> = Arc::new(handle);

    let layout: Arc<dyn LayoutStore> = Arc::new(JsonFileStore::new(layout_path(&args)));

    let (controller, mut notices) = WorkspaceController::new(
        bridge,
        layout,
        insets_from(&config),
        config.compositor.capture_timeout(),
    );
    let controller = Arc::new(Mutex::new(controller));

    if !args.fresh {
        if let Err(e) = controller.lock().await.restore().await {
            warn!(error = %e, "layout restore failed, starting fresh");
        }
    }

    // Initial window.
    {
        let mut ctrl = controller.lock().await;
        let default_bounds = Rect {
            x: 80.0,
            y: 80.0,
            width: config.window.default_width as f64,
            height: config.window.default_height as f64,
        };
        if let Some(url) = &args.open {
            match ctrl.open_browser_window(default_bounds, url).await {
                Ok(id) => {
                    info!(window_id = %id, url = %url, "opened browser window");
                    bus.publish(Event::WindowOpened(id));
                }
                Err(e) => warn!(url = %url, error = %e, "failed to open browser window"),
            }
        } else if ctrl.store().is_empty() {
            match ctrl.open_browser_window(default_bounds, "about:blank").await {
                Ok(id) => {
                    bus.publish(Event::WindowOpened(id));
                }
                Err(e) => warn!(error = %e, "failed to open initial window"),
            }
        }
    }

    // View event pump: authoritative state flows back into the store.
    subsystems.register("view-event-pump");
    let pump_controller = Arc::clone(&controller);
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            pump_controller.lock().await.apply_view_event(event).await;
        }
    });

    // Freeze notices: without a chrome renderer attached, confirm the
    // snapshot paint immediately so blurred windows settle into Frozen.
    subsystems.register("freeze-notice-pump");
    let notice_controller = Arc::clone(&controller);
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            notice_controller
                .lock()
                .await
                .snapshot_painted(notice.window_id)
                .await;
        }
    });

    // Frame tick: flush coalesced surface geometry.
    subsystems.register("frame-tick");
    let tick_controller = Arc::clone(&controller);
    let flush_interval = config.compositor.bounds_flush_interval();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(flush_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            tick_controller.lock().await.tick().await;
        }
    });

    // Config reload: log changes; compositor tunables apply on restart.
    subsystems.register("config-watcher");
    if let Ok(config_path) = mirador_config::default_config_path() {
        let (_initial, mut reload_rx) = mirador_config::ReloadManager::start(config_path).await;
        tokio::spawn(async move {
            while reload_rx.changed().await.is_ok() {
                let fresh = reload_rx.borrow().clone();
                info!(
                    capture_timeout_ms = fresh.compositor.capture_timeout_ms,
                    "config reloaded; timing changes apply on restart"
                );
            }
        });
    }

    info!("mirador running, ctrl-c to exit");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "signal handler failed, shutting down");
    }
    bus.publish(Event::Shutdown);
    shutdown(&controller).await;
}

async fn shutdown(controller: &Arc<Mutex<WorkspaceController>>) {
    info!("shutting down");
    let ctrl = controller.lock().await;
    let browser_windows: Vec<_> = ctrl
        .store()
        .iter()
        .filter(|w| w.is_browser())
        .map(|w| w.id)
        .collect();
    drop(ctrl);
    // Layout is already persisted; just release the surfaces.
    for id in browser_windows {
        let mut ctrl = controller.lock().await;
        ctrl.close_window(id).await;
    }
}
