use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{TabId, WindowId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    ConfigReloaded,
    WindowOpened(WindowId),
    WindowClosed(WindowId),
    WindowFocused(WindowId),
    TabActivated { window_id: WindowId, tab_id: TabId },
    Shutdown,
    #[serde(other)]
    Unknown,
}

pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: Event) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
