//! Config file watching and live reload.
//!
//! [`ConfigWatcher`] bridges `notify` file events into an async channel;
//! [`ReloadManager`] owns the watch loop and republishes freshly parsed
//! configs over a `tokio::sync::watch` channel.

use std::path::PathBuf;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use mirador_common::ConfigError;

use crate::loader;
use crate::schema::MiradorConfig;

/// Debounce window for editor atomic-save (write + rename) bursts.
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches a config file for changes and sends notifications.
pub struct ConfigWatcher {
    path: PathBuf,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!(
                "config file {} does not exist yet, will watch for creation",
                path.display()
            );
        }
        Ok(Self { path })
    }

    /// Watch the config file, sending `()` on the broadcast channel per
    /// debounced change. Runs until the watcher fails or the channel
    /// closes.
    pub async fn watch(&self, tx: broadcast::Sender<()>) -> Result<(), ConfigError> {
        let watch_path = self
            .path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| self.path.clone());
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();

        info!("starting config file watcher for {}", self.path.display());

        // Bridge the sync notify callback into async.
        let (notify_tx, mut notify_rx) = tokio::sync::mpsc::channel::<()>(16);

        let mut watcher = {
            let file_name = file_name.clone();
            RecommendedWatcher::new(
                move |result: Result<Event, notify::Error>| match result {
                    Ok(event) => {
                        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                            return;
                        }
                        let is_our_file = event
                            .paths
                            .iter()
                            .any(|p| p.file_name().map(|n| n == file_name).unwrap_or(false));
                        if is_our_file {
                            debug!("config file change detected");
                            let _ = notify_tx.try_send(());
                        }
                    }
                    Err(e) => error!("file watcher error: {e}"),
                },
                notify::Config::default(),
            )
            .map_err(|e| ConfigError::WatchError(format!("failed to create watcher: {e}")))?
        };

        watcher
            .watch(&watch_path, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::WatchError(format!("failed to watch path: {e}")))?;

        while notify_rx.recv().await.is_some() {
            // Swallow the burst, then signal once.
            tokio::time::sleep(DEBOUNCE).await;
            while notify_rx.try_recv().is_ok() {}
            if tx.send(()).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Manages live config reloading.
pub struct ReloadManager {
    config_path: PathBuf,
}

impl ReloadManager {
    /// Load the initial config from `config_path` and start watching for
    /// changes. Returns the initial config and a watch receiver carrying
    /// every subsequent successfully parsed config.
    pub async fn start(config_path: PathBuf) -> (MiradorConfig, watch::Receiver<MiradorConfig>) {
        let initial = match loader::load_from_path(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("failed to load config: {e}, using defaults");
                MiradorConfig::default()
            }
        };

        let (config_tx, config_rx) = watch::channel(initial.clone());
        let manager = ReloadManager { config_path };
        tokio::spawn(async move {
            manager.run_watch_loop(config_tx).await;
        });

        (initial, config_rx)
    }

    async fn run_watch_loop(&self, config_tx: watch::Sender<MiradorConfig>) {
        let watcher = match ConfigWatcher::new(self.config_path.clone()) {
            Ok(w) => w,
            Err(e) => {
                error!("failed to create config watcher: {e}");
                return;
            }
        };

        let (change_tx, mut change_rx) = broadcast::channel::<()>(16);
        let path = self.config_path.clone();
        tokio::spawn(async move {
            if let Err(e) = watcher.watch(change_tx).await {
                error!("config watcher error: {e}");
            }
        });

        while change_rx.recv().await.is_ok() {
            match loader::load_from_path(&path) {
                Ok(config) => {
                    info!("config reloaded");
                    if config_tx.send(config).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("config reload failed, keeping previous: {e}"),
            }
        }
    }
}
