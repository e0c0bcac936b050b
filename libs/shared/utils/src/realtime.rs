use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

pub type NotificationSender = broadcast::Sender<String>;
pub type NotificationReceiver = broadcast::Receiver<String>;

const CHANNEL_CAPACITY: usize = 100;

/// Per-conversation broadcast topics. Publishing is best effort: nothing is
/// retried and lagging subscribers skip messages.
#[derive(Clone, Default)]
pub struct ConversationHub {
    channels: Arc<RwLock<HashMap<Uuid, NotificationSender>>>,
}

impl ConversationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic(conversation_id: Uuid) -> String {
        format!("conversation_{}", conversation_id)
    }

    pub async fn subscribe(&self, conversation_id: Uuid) -> NotificationReceiver {
        let mut channels = self.channels.write().await;
        let sender = channels
            .entry(conversation_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);

        debug!("New subscriber on {}", Self::topic(conversation_id));
        sender.subscribe()
    }

    /// Returns how many live subscribers received the event.
    pub async fn publish<T: Serialize>(&self, conversation_id: Uuid, event: &T) -> usize {
        let message = match serde_json::to_string(event) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to serialize notification for {}: {}", Self::topic(conversation_id), e);
                return 0;
            }
        };

        let channels = self.channels.read().await;
        match channels.get(&conversation_id) {
            Some(sender) => match sender.send(message) {
                Ok(receivers) => receivers,
                Err(e) => {
                    debug!("No live subscribers on {}: {}", Self::topic(conversation_id), e);
                    0
                }
            },
            None => 0,
        }
    }

    /// Drops the topic once its last subscriber is gone.
    pub async fn release(&self, conversation_id: Uuid) {
        let mut channels = self.channels.write().await;
        if channels
            .get(&conversation_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(&conversation_id);
            debug!("Removed topic {}", Self::topic(conversation_id));
        }
    }
}
