//! Unread-message tracking scoped per chat.

use serde::{Deserialize, Serialize};

/// Reference to a not-yet-seen message, keyed by its owning chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnreadEntry {
    /// Unseen message identifier.
    pub message_id: String,
    /// Owning chat identifier.
    pub chat_id: String,
}

/// Set of messages the current viewer has not seen yet.
///
/// Entries are removed the instant their owning chat becomes the actively
/// viewed chat, or through an explicit per-chat clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnreadSet {
    entries: Vec<UnreadEntry>,
}

impl UnreadSet {
    /// Current entries in arrival order.
    pub fn entries(&self) -> &[UnreadEntry] {
        &self.entries
    }

    /// Total unread count across all chats.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Track a message as unread. Duplicate message ids are ignored.
    pub fn insert(&mut self, chat_id: impl Into<String>, message_id: impl Into<String>) {
        let message_id = message_id.into();
        if self
            .entries
            .iter()
            .any(|entry| entry.message_id == message_id)
        {
            return;
        }
        self.entries.push(UnreadEntry {
            message_id,
            chat_id: chat_id.into(),
        });
    }

    /// Unread count for one chat.
    pub fn count_for(&self, chat_id: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.chat_id == chat_id)
            .count()
    }

    /// Unseen message ids for one chat, in arrival order.
    pub fn message_ids_for(&self, chat_id: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.chat_id == chat_id)
            .map(|entry| entry.message_id.clone())
            .collect()
    }

    /// Drop every entry belonging to one chat. Returns how many were removed.
    pub fn clear_chat(&mut self, chat_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.chat_id != chat_id);
        before - self.entries.len()
    }

    /// Drop one tracked message. Returns whether an entry was removed.
    pub fn remove_message(&mut self, message_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.message_id != message_id);
        before != self.entries.len()
    }

    /// Replace the whole set from a restored snapshot.
    pub fn replace(&mut self, entries: Vec<UnreadEntry>) {
        self.entries = entries;
    }
}

/// Policy gate applied before the client attempts a mark-seen call.
///
/// Seen receipts are only attempted while the counterpart is known online and
/// there is something unseen to acknowledge. This gates the outbound call; it
/// is not part of the reducer.
pub fn should_attempt_mark_seen(counterpart_online: bool, unread_count: usize) -> bool {
    counterpart_online && unread_count > 0
}
