//! Snapshot persistence boundary.
//!
//! The store persists four independent records — chat list, per-chat message
//! map, unread set, active-chat pointer — each restorable on its own at
//! startup. Writes are best-effort: a failed persist is logged by the
//! dispatcher and never rolls back the in-memory mutation.

use std::collections::BTreeMap;

use tracing::warn;

use crate::{
    error::StoreError,
    store::ChatStore,
    types::{ChatSummary, Message},
    unread::UnreadEntry,
};

/// One of the four independently persisted snapshot records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    /// Ordered chat summary list.
    ChatList,
    /// Per-chat message map.
    Messages,
    /// Unread message set.
    Unread,
    /// Active-chat pointer.
    ActiveChat,
}

/// Durable key/value store for store snapshots.
///
/// Implementations receive already-normalized data; they only encode and
/// store it. Loads return `Ok(None)` when no snapshot exists yet.
pub trait SnapshotStore {
    fn save_chat_list(&mut self, chats: &[ChatSummary]) -> Result<(), StoreError>;
    fn save_messages(&mut self, messages: &BTreeMap<String, Vec<Message>>)
    -> Result<(), StoreError>;
    fn save_unread(&mut self, entries: &[UnreadEntry]) -> Result<(), StoreError>;
    fn save_active_chat(&mut self, chat: Option<&ChatSummary>) -> Result<(), StoreError>;

    fn load_chat_list(&self) -> Result<Option<Vec<ChatSummary>>, StoreError>;
    fn load_messages(&self) -> Result<Option<BTreeMap<String, Vec<Message>>>, StoreError>;
    fn load_unread(&self) -> Result<Option<Vec<UnreadEntry>>, StoreError>;
    fn load_active_chat(&self) -> Result<Option<ChatSummary>, StoreError>;
}

/// What a startup restore managed to rehydrate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Number of restored chat summaries.
    pub chats: usize,
    /// Number of chats with restored history.
    pub chats_with_history: usize,
    /// Number of restored unread entries.
    pub unread: usize,
    /// Whether an active-chat pointer was restored.
    pub active_chat: bool,
}

/// Rehydrate a store from persisted snapshots.
///
/// Each record is restored independently; a record that fails to load is
/// logged and skipped, leaving that part of the store empty.
pub fn restore<S: SnapshotStore>(store: &mut ChatStore, snapshots: &S) -> RestoreReport {
    let mut report = RestoreReport::default();

    match snapshots.load_chat_list() {
        Ok(Some(chats)) => {
            report.chats = chats.len();
            store.hydrate_chats(chats);
        }
        Ok(None) => {}
        Err(err) => warn!(%err, "chat list snapshot failed to load"),
    }

    match snapshots.load_messages() {
        Ok(Some(messages)) => {
            report.chats_with_history = messages.len();
            store.hydrate_messages(messages.into_iter().collect());
        }
        Ok(None) => {}
        Err(err) => warn!(%err, "message snapshot failed to load"),
    }

    match snapshots.load_unread() {
        Ok(Some(entries)) => {
            report.unread = entries.len();
            store.hydrate_unread(entries);
        }
        Ok(None) => {}
        Err(err) => warn!(%err, "unread snapshot failed to load"),
    }

    match snapshots.load_active_chat() {
        Ok(Some(chat)) => {
            report.active_chat = true;
            store.hydrate_active_chat(Some(chat));
        }
        Ok(None) => {}
        Err(err) => warn!(%err, "active chat snapshot failed to load"),
    }

    report
}

/// In-memory snapshot store used by tests and the dispatcher's unit tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    chat_list: Option<Vec<ChatSummary>>,
    messages: Option<BTreeMap<String, Vec<Message>>>,
    unread: Option<Vec<UnreadEntry>>,
    active_chat: Option<Option<ChatSummary>>,
}

impl SnapshotStore for MemorySnapshotStore {
    fn save_chat_list(&mut self, chats: &[ChatSummary]) -> Result<(), StoreError> {
        self.chat_list = Some(chats.to_vec());
        Ok(())
    }

    fn save_messages(
        &mut self,
        messages: &BTreeMap<String, Vec<Message>>,
    ) -> Result<(), StoreError> {
        self.messages = Some(messages.clone());
        Ok(())
    }

    fn save_unread(&mut self, entries: &[UnreadEntry]) -> Result<(), StoreError> {
        self.unread = Some(entries.to_vec());
        Ok(())
    }

    fn save_active_chat(&mut self, chat: Option<&ChatSummary>) -> Result<(), StoreError> {
        self.active_chat = Some(chat.cloned());
        Ok(())
    }

    fn load_chat_list(&self) -> Result<Option<Vec<ChatSummary>>, StoreError> {
        Ok(self.chat_list.clone())
    }

    fn load_messages(&self) -> Result<Option<BTreeMap<String, Vec<Message>>>, StoreError> {
        Ok(self.messages.clone())
    }

    fn load_unread(&self) -> Result<Option<Vec<UnreadEntry>>, StoreError> {
        Ok(self.unread.clone())
    }

    fn load_active_chat(&self) -> Result<Option<ChatSummary>, StoreError> {
        Ok(self.active_chat.clone().flatten())
    }
}
