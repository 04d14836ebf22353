//! Snapshot normalization.
//!
//! Converts live store state into the durable forms handed to the snapshot
//! store: session-local attachment previews are stripped and optimistic
//! entries are filtered out, since a temp-identified message is never
//! persisted as authoritative history.

use std::collections::{BTreeMap, HashMap};

use crate::types::{ChatSummary, Message};

/// Snapshot-safe copy of one message.
pub fn normalize_message(message: &Message) -> Message {
    let mut normalized = message.clone();
    for attachment in &mut normalized.attachments {
        attachment.local_preview = None;
    }
    normalized
}

/// Snapshot-safe copy of the per-chat message map.
///
/// Temp-identified entries are dropped; the result is ordered by chat id so
/// repeated persists of unchanged state produce identical bytes.
pub fn normalize_messages(
    messages: &HashMap<String, Vec<Message>>,
) -> BTreeMap<String, Vec<Message>> {
    messages
        .iter()
        .map(|(chat_id, collection)| {
            let durable = collection
                .iter()
                .filter(|message| !message.has_temp_id())
                .map(normalize_message)
                .collect();
            (chat_id.clone(), durable)
        })
        .collect()
}

/// Snapshot-safe copy of one chat summary.
///
/// A `last_message` still carrying a temp id is cleared rather than
/// persisted; it is rebuilt from the confirmed record after reconciliation.
pub fn normalize_chat(chat: &ChatSummary) -> ChatSummary {
    let mut normalized = chat.clone();
    normalized.last_message = normalized
        .last_message
        .filter(|last| !last.has_temp_id())
        .map(|last| Box::new(normalize_message(&last)));
    normalized
}

/// Snapshot-safe copy of the ordered chat list.
pub fn normalize_chats(chats: &[ChatSummary]) -> Vec<ChatSummary> {
    chats.iter().map(normalize_chat).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attachment, AttachmentKind, MessageStatus, UserRef};

    fn attachment_message(id: &str) -> Message {
        let mut message = Message::new(id, "c-1", UserRef::bare("u1"));
        message.attachments = vec![Attachment {
            url: "https://cdn.example.org/a.ogg".to_owned(),
            kind: AttachmentKind::Audio,
            size_bytes: Some(4_096),
            duration_ms: Some(2_500),
            local_preview: Some("blob:session-preview".to_owned()),
        }];
        message
    }

    #[test]
    fn strips_local_previews_but_keeps_descriptors() {
        let normalized = normalize_message(&attachment_message("m-1"));
        let attachment = &normalized.attachments[0];
        assert_eq!(attachment.local_preview, None);
        assert_eq!(attachment.url, "https://cdn.example.org/a.ogg");
        assert_eq!(attachment.duration_ms, Some(2_500));
    }

    #[test]
    fn drops_temp_entries_from_persisted_history() {
        let mut optimistic = Message::new("temp-1-1", "c-1", UserRef::bare("u1"));
        optimistic.status = MessageStatus::Queued;
        let confirmed = Message::new("m-1", "c-1", UserRef::bare("u1"));

        let mut messages = HashMap::new();
        messages.insert("c-1".to_owned(), vec![confirmed, optimistic]);

        let normalized = normalize_messages(&messages);
        let durable = normalized.get("c-1").expect("chat should be present");
        assert_eq!(durable.len(), 1);
        assert_eq!(durable[0].id, "m-1");
    }

    #[test]
    fn clears_temp_last_message_from_chat_summary() {
        let chat = ChatSummary {
            id: "c-1".to_owned(),
            is_group: false,
            name: None,
            admin_id: None,
            participants: vec![UserRef::bare("u1")],
            last_message: Some(Box::new(Message::new(
                "temp-9-9",
                "c-1",
                UserRef::bare("u1"),
            ))),
            updated_at_ms: 7,
        };

        let normalized = normalize_chat(&chat);
        assert_eq!(normalized.last_message, None);
        assert_eq!(normalized.updated_at_ms, 7);
    }

    #[test]
    fn keeps_confirmed_last_message() {
        let chat = ChatSummary {
            id: "c-1".to_owned(),
            is_group: true,
            name: Some("team".to_owned()),
            admin_id: Some("u1".to_owned()),
            participants: Vec::new(),
            last_message: Some(Box::new(attachment_message("m-3"))),
            updated_at_ms: 7,
        };

        let normalized = normalize_chat(&chat);
        let last = normalized.last_message.expect("last message should stay");
        assert_eq!(last.id, "m-3");
        assert_eq!(last.attachments[0].local_preview, None);
    }
}
