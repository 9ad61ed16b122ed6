use std::collections::HashSet;
use tokio::sync::RwLock;

/// Chat ids that opted into push alerts. Membership is checked before any
/// outbound notification.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    chats: RwLock<HashSet<i64>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the chat was not subscribed before.
    pub async fn subscribe(&self, chat_id: i64) -> bool {
        self.chats.write().await.insert(chat_id)
    }

    /// Returns true when the chat was subscribed before.
    pub async fn unsubscribe(&self, chat_id: i64) -> bool {
        self.chats.write().await.remove(&chat_id)
    }

    pub async fn is_subscribed(&self, chat_id: i64) -> bool {
        self.chats.read().await.contains(&chat_id)
    }

    /// Stable copy of the current membership for fan-out iteration.
    pub async fn snapshot(&self) -> Vec<i64> {
        let mut chats: Vec<i64> = self.chats.read().await.iter().copied().collect();
        chats.sort_unstable();
        chats
    }

    pub async fn count(&self) -> usize {
        self.chats.read().await.len()
    }
}
