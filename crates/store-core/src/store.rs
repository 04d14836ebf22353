//! Chat-scoped message store reducer.
//!
//! [`ChatStore::apply`] is the single synchronous entry point for every
//! mutation: direct user actions, REST responses, and push events all arrive
//! as a [`StoreEvent`] and run to completion before the next event is
//! processed. Transitions are total functions over the in-memory state;
//! persistence and user notification are returned as [`StoreEffect`]s and
//! executed by the dispatcher, never inside a transition.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{
    persist::SnapshotKind,
    types::{ChatSummary, Message, MessageStatus, StoreEvent, StoreNotice},
    unread::{UnreadEntry, UnreadSet},
};

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEffect {
    /// One snapshot record needs persisting.
    Persist(SnapshotKind),
    /// A user-facing notice should be surfaced.
    Notify(StoreNotice),
}

#[derive(Debug, Default)]
struct Effects {
    list: Vec<StoreEffect>,
}

impl Effects {
    fn persist(&mut self, kind: SnapshotKind) {
        let effect = StoreEffect::Persist(kind);
        if !self.list.contains(&effect) {
            self.list.push(effect);
        }
    }

    fn notify(&mut self, notice: StoreNotice) {
        self.list.push(StoreEffect::Notify(notice));
    }
}

/// Normalized, chat-scoped client state.
///
/// Owns all mutation of message, chat-summary, and poll state. Other
/// components read snapshots or dispatch [`StoreEvent`]s; they never mutate
/// these collections directly.
#[derive(Debug, Clone, Default)]
pub struct ChatStore {
    /// Chat summaries ordered most-recently-active first.
    chats: Vec<ChatSummary>,
    /// Per-chat message collections in arrival order, no duplicate ids.
    messages: HashMap<String, Vec<Message>>,
    unread: UnreadSet,
    active_chat: Option<ChatSummary>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chat list, most recently active first.
    pub fn chats(&self) -> &[ChatSummary] {
        &self.chats
    }

    /// Full per-chat message map.
    pub fn messages(&self) -> &HashMap<String, Vec<Message>> {
        &self.messages
    }

    /// Messages for one chat in arrival order; empty when history is not
    /// loaded.
    pub fn messages_for(&self, chat_id: &str) -> &[Message] {
        self.messages
            .get(chat_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Currently viewed chat, when any.
    pub fn active_chat(&self) -> Option<&ChatSummary> {
        self.active_chat.as_ref()
    }

    /// Unread tracking set.
    pub fn unread(&self) -> &UnreadSet {
        &self.unread
    }

    /// Unread count for one chat.
    pub fn unread_count_for(&self, chat_id: &str) -> usize {
        self.unread.count_for(chat_id)
    }

    /// Seed the chat list from a restored snapshot.
    pub fn hydrate_chats(&mut self, chats: Vec<ChatSummary>) {
        self.chats = chats;
    }

    /// Seed the message map from a restored snapshot.
    pub fn hydrate_messages(&mut self, messages: HashMap<String, Vec<Message>>) {
        self.messages = messages;
    }

    /// Seed the unread set from a restored snapshot.
    pub fn hydrate_unread(&mut self, entries: Vec<UnreadEntry>) {
        self.unread.replace(entries);
    }

    /// Seed the active-chat pointer from a restored snapshot.
    pub fn hydrate_active_chat(&mut self, chat: Option<ChatSummary>) {
        self.active_chat = chat;
    }

    /// Apply one mutation event and return the effects it requests.
    ///
    /// Total function: unknown chat or message ids degrade to a silent no-op
    /// (history may simply not be loaded locally), never an error.
    pub fn apply(&mut self, event: StoreEvent) -> Vec<StoreEffect> {
        let mut effects = Effects::default();

        match event {
            StoreEvent::ChatCreated { chat } => self.on_chat_created(chat, &mut effects),
            StoreEvent::ChatLeft { chat } => self.on_chat_left(chat, &mut effects),
            StoreEvent::ChatDeleted { chat_id } => self.on_chat_deleted(&chat_id, &mut effects),
            StoreEvent::MessageReceived { message } => {
                self.on_message_received(message, &mut effects)
            }
            StoreEvent::OptimisticReplaced {
                chat_id,
                temp_id,
                message,
            } => self.on_optimistic_replaced(&chat_id, &temp_id, message, &mut effects),
            StoreEvent::OptimisticAbandoned { chat_id, temp_id } => {
                self.on_optimistic_abandoned(&chat_id, &temp_id, &mut effects)
            }
            StoreEvent::ReactionsUpdated {
                chat_id,
                message_id,
                reactions,
            } => {
                if self.edit_message(&chat_id, &message_id, |message| {
                    message.reactions = reactions.clone();
                }) {
                    effects.persist(SnapshotKind::Messages);
                    effects.persist(SnapshotKind::ChatList);
                }
            }
            StoreEvent::DeliveryUpdated {
                chat_id,
                message_id,
                delivered_to,
            } => {
                if self.edit_message(&chat_id, &message_id, |message| {
                    for recipient in &delivered_to {
                        if !message.delivered_to.contains(recipient) {
                            message.delivered_to.push(recipient.clone());
                        }
                    }
                    message.status = message.status.advance_to(MessageStatus::Delivered);
                }) {
                    effects.persist(SnapshotKind::Messages);
                    effects.persist(SnapshotKind::ChatList);
                }
            }
            StoreEvent::MessagesSeen {
                chat_id,
                message_ids,
                seen_by,
            } => {
                let mut changed = false;
                for message_id in &message_ids {
                    changed |= self.edit_message(&chat_id, message_id, |message| {
                        // A sender never appears in their own seen-by list.
                        if message.sender.id == seen_by {
                            return;
                        }
                        if !message.seen_by.contains(&seen_by) {
                            message.seen_by.push(seen_by.clone());
                        }
                        message.status = message.status.advance_to(MessageStatus::Seen);
                    });
                }
                if changed {
                    effects.persist(SnapshotKind::Messages);
                    effects.persist(SnapshotKind::ChatList);
                }
            }
            StoreEvent::MessageDeleted {
                chat_id,
                message_id,
            } => {
                if self.edit_message(&chat_id, &message_id, |message| {
                    // Tombstone: identity and timestamps survive, payload goes.
                    message.is_deleted = true;
                    message.content.clear();
                    message.attachments.clear();
                }) {
                    effects.persist(SnapshotKind::Messages);
                    effects.persist(SnapshotKind::ChatList);
                }
            }
            StoreEvent::PollOptionsUpdated {
                chat_id,
                message_id,
                options,
            } => {
                if self.edit_message(&chat_id, &message_id, |message| {
                    if let Some(poll) = message.poll.as_mut() {
                        poll.options = options.clone();
                    }
                }) {
                    effects.persist(SnapshotKind::Messages);
                    effects.persist(SnapshotKind::ChatList);
                }
            }
            StoreEvent::GroupRenamed { chat_id, name } => {
                self.on_group_renamed(&chat_id, name, &mut effects)
            }
            StoreEvent::ChatSelected { chat } => self.on_chat_selected(chat, &mut effects),
            StoreEvent::UnreadCleared { chat_id } => {
                if self.unread.clear_chat(&chat_id) > 0 {
                    effects.persist(SnapshotKind::Unread);
                }
            }
            StoreEvent::LastMessageUpdated { chat_id, message } => {
                let identity_changed = self
                    .chat_summary(&chat_id)
                    .and_then(|chat| chat.last_message.as_ref())
                    .is_none_or(|last| last.id != message.id);
                if self.set_last_message(&chat_id, &message, identity_changed) {
                    effects.persist(SnapshotKind::ChatList);
                }
            }
            StoreEvent::ChatListLoaded { chats } => self.on_chat_list_loaded(chats, &mut effects),
            StoreEvent::HistoryLoaded { chat_id, messages } => {
                debug!(%chat_id, count = messages.len(), "chat history replaced");
                self.messages.insert(chat_id, messages);
                effects.persist(SnapshotKind::Messages);
            }
        }

        effects.list
    }

    fn on_chat_created(&mut self, chat: ChatSummary, effects: &mut Effects) {
        // Re-announcing an existing chat moves it to the front.
        self.chats.retain(|existing| existing.id != chat.id);
        debug!(chat_id = %chat.id, "chat added to list");
        self.chats.insert(0, chat);
        effects.persist(SnapshotKind::ChatList);
    }

    fn on_chat_left(&mut self, chat: ChatSummary, effects: &mut Effects) {
        self.chats.retain(|existing| existing.id != chat.id);
        if self
            .active_chat
            .as_ref()
            .is_some_and(|active| active.id == chat.id)
        {
            self.active_chat = None;
            effects.persist(SnapshotKind::ActiveChat);
        }
        effects.persist(SnapshotKind::ChatList);
        effects.notify(StoreNotice::ChatLeft {
            chat_id: chat.id,
            chat_name: chat.name,
        });
    }

    fn on_chat_deleted(&mut self, chat_id: &str, effects: &mut Effects) {
        debug!(%chat_id, "chat deleted; discarding derived state");
        self.chats.retain(|existing| existing.id != chat_id);
        self.messages.remove(chat_id);
        self.unread.clear_chat(chat_id);
        if self
            .active_chat
            .as_ref()
            .is_some_and(|active| active.id == chat_id)
        {
            self.active_chat = None;
            effects.persist(SnapshotKind::ActiveChat);
        }
        effects.persist(SnapshotKind::ChatList);
        effects.persist(SnapshotKind::Messages);
        effects.persist(SnapshotKind::Unread);
    }

    /// One arrival path for optimistic inserts, send responses, and pushes.
    /// Ordering matters: the duplicate guard runs before the optimistic
    /// match, and unread bookkeeping only applies to genuinely new entries.
    fn on_message_received(&mut self, message: Message, effects: &mut Effects) {
        let chat_id = message.chat_id.clone();
        let collection = self.messages.entry(chat_id.clone()).or_default();

        // Exact-duplicate guard: same id delivered twice is dropped whole.
        if collection.iter().any(|existing| existing.id == message.id) {
            trace!(message_id = %message.id, "duplicate delivery discarded");
            return;
        }

        // Optimistic-match guard: the sender's own pending entry with the
        // same content is superseded by this confirmed record.
        let optimistic_pos = collection.iter().position(|existing| {
            existing.is_optimistic()
                && existing.content == message.content
                && existing.sender.id == message.sender.id
        });

        let stored = if let Some(pos) = optimistic_pos {
            let mut confirmed = message;
            confirmed.status = confirmed.status.advance_to(MessageStatus::Sent);
            trace!(
                message_id = %confirmed.id,
                superseded = %collection[pos].id,
                "optimistic entry reconciled with server record"
            );
            collection[pos] = confirmed;
            collection[pos].clone()
        } else {
            collection.push(message);
            let stored = collection
                .last()
                .expect("collection cannot be empty after push")
                .clone();
            let viewing_this_chat = self
                .active_chat
                .as_ref()
                .is_some_and(|active| active.id == chat_id);
            if !viewing_this_chat {
                self.unread.insert(chat_id.clone(), stored.id.clone());
                effects.persist(SnapshotKind::Unread);
            }
            stored
        };

        self.set_last_message(&chat_id, &stored, true);
        effects.persist(SnapshotKind::Messages);
        effects.persist(SnapshotKind::ChatList);
    }

    fn on_optimistic_replaced(
        &mut self,
        chat_id: &str,
        temp_id: &str,
        message: Message,
        effects: &mut Effects,
    ) {
        // No tracked collection yet: nothing to reconcile, not an error.
        let Some(collection) = self.messages.get_mut(chat_id) else {
            return;
        };
        let Some(pos) = collection.iter().position(|existing| existing.id == temp_id) else {
            trace!(%temp_id, "reconciliation miss; temp entry already superseded");
            return;
        };

        let mut confirmed = message;
        confirmed.status = confirmed.status.advance_to(MessageStatus::Sent);
        collection[pos] = confirmed.clone();
        debug!(%temp_id, message_id = %confirmed.id, "optimistic send confirmed");

        self.replace_last_message_if(chat_id, temp_id, &confirmed);
        effects.persist(SnapshotKind::Messages);
        effects.persist(SnapshotKind::ChatList);
    }

    fn on_optimistic_abandoned(&mut self, chat_id: &str, temp_id: &str, effects: &mut Effects) {
        let Some(collection) = self.messages.get_mut(chat_id) else {
            return;
        };
        let Some(pos) = collection.iter().position(|existing| existing.id == temp_id) else {
            return;
        };
        collection.remove(pos);
        debug!(%temp_id, "optimistic send rolled back");

        // Fall back to the newest surviving entry for the summary snapshot.
        let fallback = collection.last().cloned();
        if self.unread.remove_message(temp_id) {
            effects.persist(SnapshotKind::Unread);
        }
        let points_at_temp = self
            .chat_summary(chat_id)
            .and_then(|chat| chat.last_message.as_ref())
            .is_some_and(|last| last.id == temp_id);
        if points_at_temp {
            self.overwrite_last_message(chat_id, fallback);
        }
        effects.persist(SnapshotKind::Messages);
        effects.persist(SnapshotKind::ChatList);
    }

    fn on_group_renamed(&mut self, chat_id: &str, name: String, effects: &mut Effects) {
        let mut changed = false;
        if let Some(chat) = self.chats.iter_mut().find(|chat| chat.id == chat_id) {
            chat.name = Some(name.clone());
            changed = true;
        }
        if let Some(active) = self.active_chat.as_mut()
            && active.id == chat_id
        {
            active.name = Some(name);
            changed = true;
        }
        if changed {
            effects.persist(SnapshotKind::ChatList);
            effects.persist(SnapshotKind::ActiveChat);
        }
    }

    fn on_chat_selected(&mut self, chat: Option<ChatSummary>, effects: &mut Effects) {
        if let Some(chat) = &chat {
            debug!(chat_id = %chat.id, "chat selected");
            // Entering a chat consumes its unread backlog immediately.
            self.unread.clear_chat(&chat.id);
        }
        self.active_chat = chat;
        effects.persist(SnapshotKind::ActiveChat);
        effects.persist(SnapshotKind::Unread);
    }

    fn on_chat_list_loaded(&mut self, chats: Vec<ChatSummary>, effects: &mut Effects) {
        debug!(chat_count = chats.len(), "chat list replaced");
        self.chats = chats;
        if let Some(active) = &self.active_chat
            && !self.chats.iter().any(|chat| chat.id == active.id)
        {
            self.active_chat = None;
            effects.persist(SnapshotKind::ActiveChat);
        }
        effects.persist(SnapshotKind::ChatList);
    }

    fn chat_summary(&self, chat_id: &str) -> Option<&ChatSummary> {
        self.chats.iter().find(|chat| chat.id == chat_id)
    }

    /// Apply `edit` to the stored message and to both denormalized
    /// `last_message` copies when they reference the same id. Returns false
    /// when the chat collection or the message is unknown.
    fn edit_message<F>(&mut self, chat_id: &str, message_id: &str, edit: F) -> bool
    where
        F: Fn(&mut Message),
    {
        let Some(collection) = self.messages.get_mut(chat_id) else {
            return false;
        };
        let Some(entry) = collection
            .iter_mut()
            .find(|message| message.id == message_id)
        else {
            return false;
        };
        edit(entry);

        if let Some(chat) = self.chats.iter_mut().find(|chat| chat.id == chat_id)
            && let Some(last) = chat.last_message.as_deref_mut()
            && last.id == message_id
        {
            edit(last);
        }
        if let Some(active) = self.active_chat.as_mut()
            && active.id == chat_id
            && let Some(last) = active.last_message.as_deref_mut()
            && last.id == message_id
        {
            edit(last);
        }
        true
    }

    /// Central writer for the denormalized `last_message` copies. Updates the
    /// chat-list entry and the active-chat pointer together; `promote` moves
    /// the chat to the front of the list.
    fn set_last_message(&mut self, chat_id: &str, message: &Message, promote: bool) -> bool {
        let activity_ms = message.updated_at_ms.max(message.created_at_ms);

        let mut changed = false;
        if let Some(index) = self.chats.iter().position(|chat| chat.id == chat_id) {
            let chat = &mut self.chats[index];
            chat.last_message = Some(Box::new(message.clone()));
            chat.updated_at_ms = activity_ms;
            if promote && index > 0 {
                let chat = self.chats.remove(index);
                self.chats.insert(0, chat);
            }
            changed = true;
        }
        if let Some(active) = self.active_chat.as_mut()
            && active.id == chat_id
        {
            active.last_message = Some(Box::new(message.clone()));
            active.updated_at_ms = activity_ms;
            changed = true;
        }
        changed
    }

    /// Swap the `last_message` copies to `message` when they currently point
    /// at `old_id`. Used by temp-id reconciliation; never reorders the list.
    fn replace_last_message_if(&mut self, chat_id: &str, old_id: &str, message: &Message) {
        if let Some(chat) = self.chats.iter_mut().find(|chat| chat.id == chat_id)
            && let Some(last) = chat.last_message.as_deref_mut()
            && last.id == old_id
        {
            chat.last_message = Some(Box::new(message.clone()));
        }
        if let Some(active) = self.active_chat.as_mut()
            && active.id == chat_id
            && let Some(last) = active.last_message.as_deref_mut()
            && last.id == old_id
        {
            active.last_message = Some(Box::new(message.clone()));
        }
    }

    fn overwrite_last_message(&mut self, chat_id: &str, message: Option<Message>) {
        let boxed = message.map(Box::new);
        if let Some(chat) = self.chats.iter_mut().find(|chat| chat.id == chat_id) {
            chat.last_message = boxed.clone();
        }
        if let Some(active) = self.active_chat.as_mut()
            && active.id == chat_id
        {
            active.last_message = boxed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attachment, AttachmentKind, Poll, PollOption, Reaction, UserRef};

    fn message(id: &str, chat_id: &str, sender: &str, content: &str) -> Message {
        let mut message = Message::new(id, chat_id, UserRef::bare(sender));
        message.content = content.to_owned();
        message.created_at_ms = 1_700_000_000_000;
        message.updated_at_ms = 1_700_000_000_000;
        message
    }

    fn queued(id: &str, chat_id: &str, sender: &str, content: &str) -> Message {
        let mut message = message(id, chat_id, sender, content);
        message.status = MessageStatus::Queued;
        message
    }

    fn chat(id: &str) -> ChatSummary {
        ChatSummary {
            id: id.to_owned(),
            is_group: false,
            name: None,
            admin_id: None,
            participants: vec![UserRef::bare("u1"), UserRef::bare("u2")],
            last_message: None,
            updated_at_ms: 0,
        }
    }

    fn group(id: &str, name: &str) -> ChatSummary {
        let mut chat = chat(id);
        chat.is_group = true;
        chat.name = Some(name.to_owned());
        chat.admin_id = Some("u1".to_owned());
        chat
    }

    fn store_with_chats(ids: &[&str]) -> ChatStore {
        let mut store = ChatStore::new();
        for id in ids.iter().rev() {
            store.apply(StoreEvent::ChatCreated { chat: chat(id) });
        }
        store
    }

    #[test]
    fn duplicate_delivery_is_idempotent() {
        let mut store = store_with_chats(&["c-1"]);
        let incoming = message("m-1", "c-1", "u2", "hello");

        store.apply(StoreEvent::MessageReceived {
            message: incoming.clone(),
        });
        let first = store.clone();
        let effects = store.apply(StoreEvent::MessageReceived { message: incoming });

        assert!(effects.is_empty());
        assert_eq!(store.messages_for("c-1").len(), 1);
        assert_eq!(store.messages_for("c-1"), first.messages_for("c-1"));
        assert_eq!(store.chats(), first.chats());
        assert_eq!(store.unread().len(), first.unread().len());
    }

    #[test]
    fn optimistic_entry_converges_with_server_push() {
        // Optimistic "hi" followed by the server copy of the same send under
        // a different id must leave exactly one message.
        let mut store = store_with_chats(&["c-1"]);
        store.apply(StoreEvent::MessageReceived {
            message: queued("temp-1", "c-1", "u1", "hi"),
        });
        assert_eq!(store.messages_for("c-1").len(), 1);

        store.apply(StoreEvent::MessageReceived {
            message: message("m-99", "c-1", "u1", "hi"),
        });

        let collection = store.messages_for("c-1");
        assert_eq!(collection.len(), 1);
        assert_eq!(collection[0].id, "m-99");
        assert_eq!(collection[0].status, MessageStatus::Sent);
    }

    #[test]
    fn optimistic_match_requires_same_sender_and_content() {
        let mut store = store_with_chats(&["c-1"]);
        store.apply(StoreEvent::MessageReceived {
            message: queued("temp-1", "c-1", "u1", "hi"),
        });

        // Same content from another sender is a genuinely new message.
        store.apply(StoreEvent::MessageReceived {
            message: message("m-2", "c-1", "u2", "hi"),
        });

        assert_eq!(store.messages_for("c-1").len(), 2);
    }

    #[test]
    fn chat_owning_latest_message_moves_to_front() {
        let mut store = store_with_chats(&["c-1", "c-2", "c-3"]);

        store.apply(StoreEvent::MessageReceived {
            message: message("m-1", "c-3", "u2", "one"),
        });
        assert_eq!(store.chats()[0].id, "c-3");

        store.apply(StoreEvent::MessageReceived {
            message: message("m-2", "c-2", "u2", "two"),
        });
        assert_eq!(store.chats()[0].id, "c-2");
        assert_eq!(store.chats()[1].id, "c-3");
        assert_eq!(
            store.chats()[0]
                .last_message
                .as_ref()
                .expect("summary should carry the latest message")
                .id,
            "m-2"
        );
    }

    #[test]
    fn message_for_inactive_chat_becomes_unread() {
        let mut store = store_with_chats(&["c-1", "c-2"]);
        store.apply(StoreEvent::ChatSelected {
            chat: Some(chat("c-1")),
        });

        store.apply(StoreEvent::MessageReceived {
            message: message("m-1", "c-2", "u2", "psst"),
        });
        store.apply(StoreEvent::MessageReceived {
            message: message("m-2", "c-1", "u2", "hello"),
        });

        assert_eq!(store.unread_count_for("c-2"), 1);
        assert_eq!(store.unread_count_for("c-1"), 0);
    }

    #[test]
    fn selecting_a_chat_clears_its_unread_backlog() {
        let mut store = store_with_chats(&["c-1", "c-2"]);
        store.apply(StoreEvent::MessageReceived {
            message: message("m-1", "c-2", "u2", "psst"),
        });
        assert_eq!(store.unread_count_for("c-2"), 1);

        let effects = store.apply(StoreEvent::ChatSelected {
            chat: Some(chat("c-2")),
        });

        assert_eq!(store.unread_count_for("c-2"), 0);
        assert_eq!(store.active_chat().map(|c| c.id.as_str()), Some("c-2"));
        assert!(effects.contains(&StoreEffect::Persist(SnapshotKind::ActiveChat)));
        assert!(effects.contains(&StoreEffect::Persist(SnapshotKind::Unread)));
    }

    #[test]
    fn replace_resolves_temp_entry_and_summary_mirror() {
        let mut store = store_with_chats(&["c-1"]);
        store.apply(StoreEvent::MessageReceived {
            message: queued("temp-7", "c-1", "u1", "draft"),
        });
        assert_eq!(
            store.chats()[0].last_message.as_ref().map(|m| m.id.as_str()),
            Some("temp-7")
        );

        store.apply(StoreEvent::OptimisticReplaced {
            chat_id: "c-1".to_owned(),
            temp_id: "temp-7".to_owned(),
            message: message("m-7", "c-1", "u1", "draft"),
        });

        let collection = store.messages_for("c-1");
        assert_eq!(collection.len(), 1);
        assert_eq!(collection[0].id, "m-7");
        assert_eq!(collection[0].status, MessageStatus::Sent);
        assert_eq!(
            store.chats()[0].last_message.as_ref().map(|m| m.id.as_str()),
            Some("m-7")
        );
    }

    #[test]
    fn replace_without_tracked_collection_is_a_noop() {
        let mut store = store_with_chats(&["c-1"]);
        let effects = store.apply(StoreEvent::OptimisticReplaced {
            chat_id: "c-9".to_owned(),
            temp_id: "temp-1".to_owned(),
            message: message("m-1", "c-9", "u1", "hi"),
        });
        assert!(effects.is_empty());
        assert!(store.messages().get("c-9").is_none());
    }

    #[test]
    fn abandoning_optimistic_send_restores_previous_summary() {
        let mut store = store_with_chats(&["c-1"]);
        store.apply(StoreEvent::MessageReceived {
            message: message("m-1", "c-1", "u2", "before"),
        });
        store.apply(StoreEvent::MessageReceived {
            message: queued("temp-2", "c-1", "u1", "doomed"),
        });
        assert_eq!(
            store.chats()[0].last_message.as_ref().map(|m| m.id.as_str()),
            Some("temp-2")
        );

        store.apply(StoreEvent::OptimisticAbandoned {
            chat_id: "c-1".to_owned(),
            temp_id: "temp-2".to_owned(),
        });

        let collection = store.messages_for("c-1");
        assert_eq!(collection.len(), 1);
        assert_eq!(collection[0].id, "m-1");
        assert_eq!(
            store.chats()[0].last_message.as_ref().map(|m| m.id.as_str()),
            Some("m-1")
        );
    }

    #[test]
    fn reactions_stay_in_sync_across_all_three_copies() {
        let mut store = store_with_chats(&["c-1"]);
        store.apply(StoreEvent::ChatSelected {
            chat: Some(chat("c-1")),
        });
        store.apply(StoreEvent::MessageReceived {
            message: message("m-1", "c-1", "u2", "react to me"),
        });

        let reactions = vec![Reaction {
            emoji: "🔥".to_owned(),
            user_id: "u1".to_owned(),
        }];
        store.apply(StoreEvent::ReactionsUpdated {
            chat_id: "c-1".to_owned(),
            message_id: "m-1".to_owned(),
            reactions: reactions.clone(),
        });

        assert_eq!(store.messages_for("c-1")[0].reactions, reactions);
        assert_eq!(
            store.chats()[0]
                .last_message
                .as_ref()
                .expect("summary mirror should exist")
                .reactions,
            reactions
        );
        assert_eq!(
            store
                .active_chat()
                .and_then(|chat| chat.last_message.as_ref())
                .expect("active mirror should exist")
                .reactions,
            reactions
        );
    }

    #[test]
    fn reaction_for_unknown_chat_is_a_noop() {
        let mut store = store_with_chats(&["c-1"]);
        let effects = store.apply(StoreEvent::ReactionsUpdated {
            chat_id: "c-404".to_owned(),
            message_id: "m-1".to_owned(),
            reactions: Vec::new(),
        });
        assert!(effects.is_empty());
    }

    #[test]
    fn delivery_receipts_deduplicate_recipients() {
        let mut store = store_with_chats(&["c-1"]);
        store.apply(StoreEvent::MessageReceived {
            message: message("m-1", "c-1", "u1", "sent"),
        });

        for _ in 0..3 {
            store.apply(StoreEvent::DeliveryUpdated {
                chat_id: "c-1".to_owned(),
                message_id: "m-1".to_owned(),
                delivered_to: vec!["u2".to_owned()],
            });
        }

        let stored = &store.messages_for("c-1")[0];
        assert_eq!(stored.delivered_to, vec!["u2"]);
        assert_eq!(stored.status, MessageStatus::Delivered);
    }

    #[test]
    fn seen_never_applies_to_the_viewers_own_messages() {
        let mut store = store_with_chats(&["c-1"]);
        store.apply(StoreEvent::MessageReceived {
            message: message("m-1", "c-1", "u2", "from viewer"),
        });
        store.apply(StoreEvent::MessageReceived {
            message: message("m-2", "c-1", "u1", "from other"),
        });

        store.apply(StoreEvent::MessagesSeen {
            chat_id: "c-1".to_owned(),
            message_ids: vec!["m-1".to_owned(), "m-2".to_owned()],
            seen_by: "u2".to_owned(),
        });

        let collection = store.messages_for("c-1");
        let own = collection.iter().find(|m| m.id == "m-1").expect("m-1");
        let other = collection.iter().find(|m| m.id == "m-2").expect("m-2");
        assert!(own.seen_by.is_empty());
        assert_eq!(own.status, MessageStatus::Sent);
        assert_eq!(other.seen_by, vec!["u2"]);
        assert_eq!(other.status, MessageStatus::Seen);
    }

    #[test]
    fn repeated_seen_receipts_do_not_duplicate_viewer() {
        let mut store = store_with_chats(&["c-1"]);
        store.apply(StoreEvent::MessageReceived {
            message: message("m-1", "c-1", "u1", "hello"),
        });

        for _ in 0..2 {
            store.apply(StoreEvent::MessagesSeen {
                chat_id: "c-1".to_owned(),
                message_ids: vec!["m-1".to_owned()],
                seen_by: "u2".to_owned(),
            });
        }

        assert_eq!(store.messages_for("c-1")[0].seen_by, vec!["u2"]);
    }

    #[test]
    fn status_ladder_is_monotonic_under_late_receipts() {
        let mut store = store_with_chats(&["c-1"]);
        store.apply(StoreEvent::MessageReceived {
            message: message("m-1", "c-1", "u1", "hello"),
        });
        store.apply(StoreEvent::MessagesSeen {
            chat_id: "c-1".to_owned(),
            message_ids: vec!["m-1".to_owned()],
            seen_by: "u2".to_owned(),
        });

        // Delivery receipt arriving after the seen receipt must not regress.
        store.apply(StoreEvent::DeliveryUpdated {
            chat_id: "c-1".to_owned(),
            message_id: "m-1".to_owned(),
            delivered_to: vec!["u2".to_owned()],
        });

        assert_eq!(store.messages_for("c-1")[0].status, MessageStatus::Seen);
    }

    #[test]
    fn tombstone_clears_payload_but_keeps_identity() {
        let mut store = store_with_chats(&["c-1"]);
        let mut original = message("m-1", "c-1", "u2", "secret");
        original.attachments = vec![Attachment {
            url: "https://cdn.example.org/x.png".to_owned(),
            kind: AttachmentKind::Image,
            size_bytes: Some(10),
            duration_ms: None,
            local_preview: None,
        }];
        store.apply(StoreEvent::MessageReceived { message: original });

        store.apply(StoreEvent::MessageDeleted {
            chat_id: "c-1".to_owned(),
            message_id: "m-1".to_owned(),
        });

        let stored = &store.messages_for("c-1")[0];
        assert!(stored.is_deleted);
        assert!(stored.content.is_empty());
        assert!(stored.attachments.is_empty());
        assert_eq!(stored.id, "m-1");
        assert_eq!(stored.chat_id, "c-1");
        assert_eq!(stored.created_at_ms, 1_700_000_000_000);
        assert_eq!(stored.updated_at_ms, 1_700_000_000_000);

        let mirror = store.chats()[0]
            .last_message
            .as_ref()
            .expect("summary mirror should exist");
        assert!(mirror.is_deleted);
        assert!(mirror.content.is_empty());
    }

    #[test]
    fn poll_votes_flow_through_the_shared_reducer_path() {
        let mut store = store_with_chats(&["c-1"]);
        let mut poll_message = message("m-1", "c-1", "u2", "");
        poll_message.poll = Some(Poll {
            question: "lunch?".to_owned(),
            allow_multiple_answers: false,
            options: vec![
                PollOption {
                    id: "o1".to_owned(),
                    label: "pizza".to_owned(),
                    voters: Vec::new(),
                },
                PollOption {
                    id: "o2".to_owned(),
                    label: "sushi".to_owned(),
                    voters: Vec::new(),
                },
            ],
        });
        store.apply(StoreEvent::MessageReceived {
            message: poll_message,
        });

        // Optimistic vote and a later authoritative push both arrive as
        // PollOptionsUpdated; applying them in order converges.
        let stored = store.messages_for("c-1")[0].clone();
        let vote = crate::poll::optimistic_vote(&stored, "o1", &UserRef::bare("u1"))
            .expect("vote should compute");
        store.apply(vote.apply);

        let poll = store.messages_for("c-1")[0]
            .poll
            .as_ref()
            .expect("poll should survive");
        assert_eq!(poll.options[0].voters.len(), 1);
        assert_eq!(poll.options[0].voters[0].id, "u1");

        let stored = store.messages_for("c-1")[0].clone();
        let moved = crate::poll::optimistic_vote(&stored, "o2", &UserRef::bare("u1"))
            .expect("vote should compute");
        store.apply(moved.apply);

        let poll = store.messages_for("c-1")[0]
            .poll
            .as_ref()
            .expect("poll should survive");
        assert!(poll.options[0].voters.is_empty());
        assert_eq!(poll.options[1].voters[0].id, "u1");
    }

    #[test]
    fn group_rename_updates_list_and_active_pointer() {
        let mut store = ChatStore::new();
        store.apply(StoreEvent::ChatCreated {
            chat: group("g-1", "old name"),
        });
        store.apply(StoreEvent::ChatSelected {
            chat: Some(group("g-1", "old name")),
        });

        store.apply(StoreEvent::GroupRenamed {
            chat_id: "g-1".to_owned(),
            name: "new name".to_owned(),
        });

        assert_eq!(store.chats()[0].name.as_deref(), Some("new name"));
        assert_eq!(
            store.active_chat().and_then(|c| c.name.as_deref()),
            Some("new name")
        );
    }

    #[test]
    fn leaving_a_chat_clears_active_pointer_and_notifies() {
        let mut store = ChatStore::new();
        store.apply(StoreEvent::ChatCreated {
            chat: group("g-1", "team"),
        });
        store.apply(StoreEvent::ChatSelected {
            chat: Some(group("g-1", "team")),
        });

        let effects = store.apply(StoreEvent::ChatLeft {
            chat: group("g-1", "team"),
        });

        assert!(store.chats().is_empty());
        assert!(store.active_chat().is_none());
        assert!(effects.contains(&StoreEffect::Notify(StoreNotice::ChatLeft {
            chat_id: "g-1".to_owned(),
            chat_name: Some("team".to_owned()),
        })));
    }

    #[test]
    fn deleting_a_chat_discards_all_derived_state() {
        let mut store = store_with_chats(&["c-1", "c-2"]);
        store.apply(StoreEvent::MessageReceived {
            message: message("m-1", "c-1", "u2", "bye"),
        });
        assert_eq!(store.unread_count_for("c-1"), 1);
        store.apply(StoreEvent::ChatSelected {
            chat: Some(chat("c-1")),
        });

        let effects = store.apply(StoreEvent::ChatDeleted {
            chat_id: "c-1".to_owned(),
        });

        assert_eq!(store.chats().len(), 1);
        assert!(store.messages().get("c-1").is_none());
        assert_eq!(store.unread_count_for("c-1"), 0);
        assert!(store.active_chat().is_none());
        assert!(effects.contains(&StoreEffect::Persist(SnapshotKind::ChatList)));
        assert!(effects.contains(&StoreEffect::Persist(SnapshotKind::Messages)));
        assert!(effects.contains(&StoreEffect::Persist(SnapshotKind::Unread)));
        assert!(effects.contains(&StoreEffect::Persist(SnapshotKind::ActiveChat)));
    }

    #[test]
    fn loaded_chat_list_replaces_wholesale_and_drops_vanished_active_chat() {
        let mut store = store_with_chats(&["c-1", "c-2"]);
        store.apply(StoreEvent::ChatSelected {
            chat: Some(chat("c-1")),
        });

        store.apply(StoreEvent::ChatListLoaded {
            chats: vec![chat("c-3")],
        });

        assert_eq!(store.chats().len(), 1);
        assert_eq!(store.chats()[0].id, "c-3");
        assert!(store.active_chat().is_none());
    }

    #[test]
    fn loaded_history_replaces_the_chat_collection() {
        let mut store = store_with_chats(&["c-1"]);
        store.apply(StoreEvent::MessageReceived {
            message: queued("temp-1", "c-1", "u1", "stale"),
        });

        store.apply(StoreEvent::HistoryLoaded {
            chat_id: "c-1".to_owned(),
            messages: vec![
                message("m-1", "c-1", "u2", "one"),
                message("m-2", "c-1", "u1", "two"),
            ],
        });

        let collection = store.messages_for("c-1");
        assert_eq!(collection.len(), 2);
        assert_eq!(collection[0].id, "m-1");
    }

    #[test]
    fn receipt_mirrors_do_not_reorder_the_chat_list() {
        let mut store = store_with_chats(&["c-1", "c-2"]);
        store.apply(StoreEvent::MessageReceived {
            message: message("m-1", "c-2", "u1", "older"),
        });
        store.apply(StoreEvent::MessageReceived {
            message: message("m-2", "c-1", "u1", "newer"),
        });
        assert_eq!(store.chats()[0].id, "c-1");

        store.apply(StoreEvent::MessagesSeen {
            chat_id: "c-2".to_owned(),
            message_ids: vec!["m-1".to_owned()],
            seen_by: "u2".to_owned(),
        });

        assert_eq!(store.chats()[0].id, "c-1");
        assert_eq!(store.chats()[1].id, "c-2");
    }

    #[test]
    fn explicit_unread_clear_targets_one_chat() {
        let mut store = store_with_chats(&["c-1", "c-2"]);
        store.apply(StoreEvent::MessageReceived {
            message: message("m-1", "c-1", "u2", "one"),
        });
        store.apply(StoreEvent::MessageReceived {
            message: message("m-2", "c-2", "u2", "two"),
        });

        store.apply(StoreEvent::UnreadCleared {
            chat_id: "c-1".to_owned(),
        });

        assert_eq!(store.unread_count_for("c-1"), 0);
        assert_eq!(store.unread_count_for("c-2"), 1);
    }

    #[test]
    fn direct_last_message_update_moves_chat_forward_only_on_new_identity() {
        let mut store = store_with_chats(&["c-1", "c-2"]);
        store.apply(StoreEvent::MessageReceived {
            message: message("m-1", "c-2", "u1", "old"),
        });
        store.apply(StoreEvent::MessageReceived {
            message: message("m-2", "c-1", "u1", "new"),
        });
        assert_eq!(store.chats()[0].id, "c-1");

        // Same identity: mirrors refresh in place, order stays.
        store.apply(StoreEvent::LastMessageUpdated {
            chat_id: "c-2".to_owned(),
            message: message("m-1", "c-2", "u1", "old"),
        });
        assert_eq!(store.chats()[0].id, "c-1");

        // New identity: the chat jumps to the front.
        store.apply(StoreEvent::LastMessageUpdated {
            chat_id: "c-2".to_owned(),
            message: message("m-3", "c-2", "u1", "fresh"),
        });
        assert_eq!(store.chats()[0].id, "c-2");
    }
}
