//! Message/poll state reconciliation core for the Palaver chat client.
//!
//! This crate owns the normalized, chat-scoped message store: optimistic
//! sends, out-of-order reconciliation between direct responses and push
//! events, targeted partial mutations (reactions, receipts, poll votes,
//! tombstones), unread tracking, and snapshot persistence.

/// Async event/notice channel primitives.
pub mod channel;
/// Dispatch loop applying events and running their effects.
pub mod dispatch;
/// Boundary error types.
pub mod error;
/// Snapshot normalization (temp-entry filtering, preview stripping).
pub mod normalization;
/// Optimistic message fabrication and rollback pairing.
pub mod optimistic;
/// Snapshot persistence trait and startup restore.
pub mod persist;
/// Optimistic poll-vote computation.
pub mod poll;
/// The chat store reducer.
pub mod store;
/// Core data model and event union.
pub mod types;
/// Unread-message tracking.
pub mod unread;

pub use channel::{NoticeStream, StoreChannelError, StoreChannels};
pub use dispatch::Dispatcher;
pub use error::{StoreError, StoreErrorCategory};
pub use normalization::{normalize_chat, normalize_chats, normalize_message, normalize_messages};
pub use optimistic::{OptimisticComposer, OptimisticSend};
pub use persist::{MemorySnapshotStore, RestoreReport, SnapshotKind, SnapshotStore, restore};
pub use poll::{PollVoteError, VoteUpdate, optimistic_vote, toggle_vote};
pub use store::{ChatStore, StoreEffect};
pub use types::{
    Attachment, AttachmentKind, ChatSummary, Message, MessageStatus, Poll, PollOption, Reaction,
    StoreEvent, StoreNotice, TEMP_ID_PREFIX, UserRef,
};
pub use unread::{UnreadEntry, UnreadSet, should_attempt_mark_seen};
