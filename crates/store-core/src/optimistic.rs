//! Optimistic message fabrication.
//!
//! Sends are materialized locally before the network call resolves: the
//! composer mints a session-unique temp id, the caller dispatches the entry
//! through the normal `MessageReceived` path for instant rendering, then
//! reconciles with `OptimisticReplaced` on success or dispatches the
//! prepared rollback event on failure.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{
    Attachment, Message, MessageStatus, Poll, PollOption, StoreEvent, TEMP_ID_PREFIX, UserRef,
};

/// One optimistic send: the fabricated message plus its compensating event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticSend {
    /// Locally fabricated message with a temp id and `Queued` status.
    pub message: Message,
    /// Compensating event removing the entry again; dispatched by the caller
    /// when the confirming network call fails.
    pub rollback: StoreEvent,
}

impl OptimisticSend {
    /// Event inserting the optimistic entry into the store.
    pub fn apply_event(&self) -> StoreEvent {
        StoreEvent::MessageReceived {
            message: self.message.clone(),
        }
    }

    /// Event reconciling the entry with the server-confirmed record.
    pub fn confirm_event(&self, confirmed: Message) -> StoreEvent {
        StoreEvent::OptimisticReplaced {
            chat_id: self.message.chat_id.clone(),
            temp_id: self.message.id.clone(),
            message: confirmed,
        }
    }
}

/// Factory for optimistic message records.
///
/// Temp ids combine the creation timestamp with a session counter, so they
/// are unique within a client session even when two sends land in the same
/// millisecond.
#[derive(Debug, Default)]
pub struct OptimisticComposer {
    counter: u64,
}

impl OptimisticComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fabricate a text message for `chat_id`.
    pub fn compose_text(
        &mut self,
        chat_id: impl Into<String>,
        content: impl Into<String>,
        sender: UserRef,
    ) -> OptimisticSend {
        let mut message = self.skeleton(chat_id, sender);
        message.content = content.into();
        self.wrap(message)
    }

    /// Fabricate an attachment message. The caller supplies the descriptor,
    /// typically with `local_preview` pointing at a session-local blob.
    pub fn compose_attachment(
        &mut self,
        chat_id: impl Into<String>,
        attachment: Attachment,
        sender: UserRef,
    ) -> OptimisticSend {
        let mut message = self.skeleton(chat_id, sender);
        message.attachments = vec![attachment];
        self.wrap(message)
    }

    /// Fabricate a poll message. Option ids are positional placeholders; the
    /// server-confirmed record carries the authoritative ids.
    pub fn compose_poll(
        &mut self,
        chat_id: impl Into<String>,
        question: impl Into<String>,
        allow_multiple_answers: bool,
        option_labels: Vec<String>,
        sender: UserRef,
    ) -> OptimisticSend {
        let mut message = self.skeleton(chat_id, sender);
        message.poll = Some(Poll {
            question: question.into(),
            allow_multiple_answers,
            options: option_labels
                .into_iter()
                .enumerate()
                .map(|(index, label)| PollOption {
                    id: format!("opt-{index}"),
                    label,
                    voters: Vec::new(),
                })
                .collect(),
        });
        self.wrap(message)
    }

    /// Attach a reply target to an already composed send.
    pub fn with_reply_to(mut send: OptimisticSend, reply_to: impl Into<String>) -> OptimisticSend {
        send.message.reply_to = Some(reply_to.into());
        send
    }

    fn skeleton(&mut self, chat_id: impl Into<String>, sender: UserRef) -> Message {
        let now = now_millis();
        self.counter += 1;
        let mut message = Message::new(
            format!("{TEMP_ID_PREFIX}{now}-{counter}", counter = self.counter),
            chat_id,
            sender,
        );
        message.status = MessageStatus::Queued;
        message.created_at_ms = now;
        message.updated_at_ms = now;
        message
    }

    fn wrap(&self, message: Message) -> OptimisticSend {
        let rollback = StoreEvent::OptimisticAbandoned {
            chat_id: message.chat_id.clone(),
            temp_id: message.id.clone(),
        };
        OptimisticSend { message, rollback }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}
