use serde::{Deserialize, Serialize};

/// Prefix carried by client-fabricated message identifiers awaiting server
/// confirmation.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Reference to a user embedded in messages, chats, and poll votes.
///
/// Only `id` is required for correctness; the profile fields are display
/// niceties carried through when the backend provides them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    /// Backend user identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar URL when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserRef {
    /// Build a bare reference carrying only the identifier.
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            avatar_url: None,
        }
    }
}

/// Delivery lifecycle of a message.
///
/// The ladder is monotonic: `Queued → Sent → Delivered → Seen`. No transition
/// moves a message backward; soft-deletion is an orthogonal flag.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Locally fabricated, not yet acknowledged by the server.
    Queued,
    /// Acknowledged by the server. Wire payloads that omit a status land here.
    #[default]
    Sent,
    /// Reported delivered to at least one recipient device.
    Delivered,
    /// Seen by at least one recipient.
    Seen,
}

impl MessageStatus {
    /// Advance along the ladder, never backward.
    pub fn advance_to(self, target: MessageStatus) -> MessageStatus {
        self.max(target)
    }
}

/// Kind of an attachment descriptor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    File,
}

/// Attachment descriptor carried by a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Backend URL of the uploaded payload. Empty for optimistic entries
    /// whose upload has not resolved yet.
    pub url: String,
    /// Payload kind.
    pub kind: AttachmentKind,
    /// Payload size in bytes when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Duration in milliseconds for voice/video payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Local blob URL used to preview an optimistic attachment before the
    /// upload resolves. Session-scoped; never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_preview: Option<String>,
}

/// Single emoji reaction on a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    /// Reaction emoji.
    pub emoji: String,
    /// User who reacted.
    pub user_id: String,
}

/// One votable option inside a poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    /// Option identifier, unique within the poll.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display label.
    pub label: String,
    /// Users who currently vote for this option.
    #[serde(default)]
    pub voters: Vec<UserRef>,
}

/// Poll payload embedded in a message.
///
/// When `allow_multiple_answers` is false, a voter appears in at most one
/// option's voter list across the whole poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    /// Question title.
    pub question: String,
    /// Whether a voter may select several options at once.
    #[serde(default)]
    pub allow_multiple_answers: bool,
    /// Ordered option list.
    pub options: Vec<PollOption>,
}

/// Central chat message entity.
///
/// A message belongs to exactly one chat for its entire lifetime and is never
/// reparented. Entries whose id carries [`TEMP_ID_PREFIX`] are optimistic and
/// must be reconciled against a server record before being treated as durable
/// history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned identifier, or a `temp-` prefixed client token.
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning chat identifier.
    #[serde(rename = "chat")]
    pub chat_id: String,
    /// Sender reference.
    pub sender: UserRef,
    /// Textual content. Cleared when the message is tombstoned.
    #[serde(default)]
    pub content: String,
    /// Ordered attachment descriptors. Cleared when tombstoned.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Identifier of the replied-to message, when this is a reply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Embedded poll payload, when this message is a poll.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<Poll>,
    /// Soft-delete flag. Identity and timestamps survive deletion.
    #[serde(default)]
    pub is_deleted: bool,
    /// Current reaction list.
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    /// User ids the message was delivered to.
    #[serde(default)]
    pub delivered_to: Vec<String>,
    /// User ids that have seen the message.
    #[serde(default)]
    pub seen_by: Vec<String>,
    /// Delivery lifecycle status.
    #[serde(default)]
    pub status: MessageStatus,
    /// Creation timestamp in milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at_ms: u64,
    /// Last-update timestamp in milliseconds since the Unix epoch.
    #[serde(default)]
    pub updated_at_ms: u64,
}

impl Message {
    /// Build an empty message skeleton with the given identity.
    pub fn new(id: impl Into<String>, chat_id: impl Into<String>, sender: UserRef) -> Self {
        Self {
            id: id.into(),
            chat_id: chat_id.into(),
            sender,
            content: String::new(),
            attachments: Vec::new(),
            reply_to: None,
            poll: None,
            is_deleted: false,
            reactions: Vec::new(),
            delivered_to: Vec::new(),
            seen_by: Vec::new(),
            status: MessageStatus::Sent,
            created_at_ms: 0,
            updated_at_ms: 0,
        }
    }

    /// Whether this entry still carries a client-fabricated temp identifier.
    pub fn has_temp_id(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }

    /// Whether the entry is still awaiting server confirmation: either a
    /// temp-style id or a `Queued` status marks it optimistic.
    pub fn is_optimistic(&self) -> bool {
        self.has_temp_id() || self.status == MessageStatus::Queued
    }
}

/// Denormalized chat list entry.
///
/// `last_message` is a shallow snapshot of the most recent message, kept in
/// sync with the per-chat collection by the store reducer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    /// Chat identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Whether this is a group chat.
    #[serde(default)]
    pub is_group: bool,
    /// Group name; `None` for direct chats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Group admin user id, when this is a group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
    /// Participant references.
    #[serde(default)]
    pub participants: Vec<UserRef>,
    /// Shallow snapshot of the most recent message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Box<Message>>,
    /// Last-activity timestamp in milliseconds since the Unix epoch.
    #[serde(default)]
    pub updated_at_ms: u64,
}

/// Tagged mutation event consumed by the store reducer.
///
/// Every inbound mutation — direct user action, REST response, or push
/// notification — is expressed as one of these variants and applied through
/// the single synchronous [`crate::ChatStore::apply`] entry point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StoreEvent {
    /// A new chat was initiated (locally or via push).
    ChatCreated { chat: ChatSummary },
    /// The current user left a chat.
    ChatLeft { chat: ChatSummary },
    /// A chat was deleted outright.
    ChatDeleted { chat_id: String },
    /// A message arrived — optimistic local insert, send-response, or push.
    MessageReceived { message: Message },
    /// Server confirmation for an optimistic send; replaces the temp entry.
    OptimisticReplaced {
        chat_id: String,
        temp_id: String,
        message: Message,
    },
    /// Compensating event for a failed optimistic send; removes the temp
    /// entry again.
    OptimisticAbandoned { chat_id: String, temp_id: String },
    /// Authoritative replacement of a message's reaction list.
    ReactionsUpdated {
        chat_id: String,
        message_id: String,
        reactions: Vec<Reaction>,
    },
    /// Delivery receipt carrying newly reached recipients.
    DeliveryUpdated {
        chat_id: String,
        message_id: String,
        delivered_to: Vec<String>,
    },
    /// Seen receipt for a batch of messages from one viewer.
    MessagesSeen {
        chat_id: String,
        message_ids: Vec<String>,
        seen_by: String,
    },
    /// Soft-delete of a message (tombstone).
    MessageDeleted { chat_id: String, message_id: String },
    /// Authoritative replacement of a poll's option/vote state. Shared path
    /// for optimistic votes and server vote pushes.
    PollOptionsUpdated {
        chat_id: String,
        message_id: String,
        options: Vec<PollOption>,
    },
    /// Group chat rename.
    GroupRenamed { chat_id: String, name: String },
    /// The viewer switched chats; `None` deselects.
    ChatSelected { chat: Option<ChatSummary> },
    /// Explicit clear of the unread set for one chat.
    UnreadCleared { chat_id: String },
    /// Direct overwrite of a chat summary's last-message snapshot.
    LastMessageUpdated { chat_id: String, message: Message },
    /// Wholesale chat list replacement from a list fetch.
    ChatListLoaded { chats: Vec<ChatSummary> },
    /// Wholesale history replacement for one chat from a history fetch.
    HistoryLoaded {
        chat_id: String,
        messages: Vec<Message>,
    },
}

/// User-facing notification emitted by a store transition.
///
/// Delivered to subscribers over the notice broadcast; the store never blocks
/// on them being observed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StoreNotice {
    /// The current user left a chat.
    ChatLeft {
        chat_id: String,
        chat_name: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ladder_never_moves_backward() {
        assert_eq!(
            MessageStatus::Seen.advance_to(MessageStatus::Delivered),
            MessageStatus::Seen
        );
        assert_eq!(
            MessageStatus::Queued.advance_to(MessageStatus::Sent),
            MessageStatus::Sent
        );
        assert_eq!(
            MessageStatus::Sent.advance_to(MessageStatus::Seen),
            MessageStatus::Seen
        );
    }

    #[test]
    fn missing_status_defaults_to_sent() {
        let message: Message = serde_json::from_value(serde_json::json!({
            "_id": "m-1",
            "chat": "c-1",
            "sender": { "_id": "u-1" },
            "content": "hello",
        }))
        .expect("payload without status should deserialize");
        assert_eq!(message.status, MessageStatus::Sent);
        assert!(!message.is_optimistic());
    }

    #[test]
    fn temp_prefixed_ids_are_optimistic() {
        let message: Message = serde_json::from_value(serde_json::json!({
            "_id": "temp-1700000000000-1",
            "chat": "c-1",
            "sender": { "_id": "u-1" },
            "status": "queued",
        }))
        .expect("optimistic payload should deserialize");
        assert!(message.has_temp_id());
        assert!(message.is_optimistic());
    }

    #[test]
    fn wire_ids_round_trip_under_underscore_rename() {
        let user = UserRef::bare("u-9");
        let encoded = serde_json::to_value(&user).expect("user should serialize");
        assert_eq!(encoded["_id"], "u-9");
    }
}
