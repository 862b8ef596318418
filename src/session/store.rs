use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::session::Session;

/// Identifier of one conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(Uuid);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sessions keyed by conversation
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<ConversationId, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session for `id`, or an empty one if the conversation is unknown
    pub async fn get(&self, id: ConversationId) -> Session {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn put(&self, id: ConversationId, session: Session) {
        self.sessions.write().await.insert(id, session);
    }

    /// Forget a conversation
    pub async fn reset(&self, id: ConversationId) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
