//! Optimistic poll-vote computation.
//!
//! Votes are applied to the store through the same `PollOptionsUpdated`
//! reducer path used when the authoritative server vote state arrives via
//! push, so optimistic writes and server reconciliation converge on one
//! merge shape.

use thiserror::Error;

use crate::types::{Message, Poll, PollOption, StoreEvent, UserRef};

/// Errors that can occur while computing a vote mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollVoteError {
    /// The poll has no option with the given id.
    #[error("poll option with id '{0}' was not found")]
    UnknownOption(String),
    /// The targeted message does not carry a poll payload.
    #[error("message '{0}' does not carry a poll")]
    NotAPoll(String),
}

/// Compute the option state after `voter` toggles `option_id`.
///
/// Voter lists are deep-copied; the input poll is left untouched. When the
/// poll disallows multiple answers the voter is first removed from every
/// option, so selecting a new option moves the vote in one transition and
/// selecting the already-voted option is a pure retract.
pub fn toggle_vote(
    poll: &Poll,
    option_id: &str,
    voter: &UserRef,
) -> Result<Vec<PollOption>, PollVoteError> {
    let was_voted = poll
        .options
        .iter()
        .find(|option| option.id == option_id)
        .map(|option| option.voters.iter().any(|v| v.id == voter.id))
        .ok_or_else(|| PollVoteError::UnknownOption(option_id.to_owned()))?;

    let mut options = poll.options.clone();

    if poll.allow_multiple_answers {
        let target = options
            .iter_mut()
            .find(|option| option.id == option_id)
            .expect("target option presence checked above");
        if was_voted {
            target.voters.retain(|v| v.id != voter.id);
        } else {
            target.voters.push(voter.clone());
        }
    } else {
        // Single-choice exclusivity sweep; doubles as the retract path.
        for option in &mut options {
            option.voters.retain(|v| v.id != voter.id);
        }
        if !was_voted {
            let target = options
                .iter_mut()
                .find(|option| option.id == option_id)
                .expect("target option presence checked above");
            target.voters.push(voter.clone());
        }
    }

    Ok(options)
}

/// Paired apply/rollback events for one optimistic vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteUpdate {
    /// Event to dispatch immediately, before the vote call resolves.
    pub apply: StoreEvent,
    /// Compensating event restoring the prior vote state; dispatched by the
    /// caller when the vote call fails.
    pub rollback: StoreEvent,
}

/// Build the apply/rollback event pair for a vote on `message`.
pub fn optimistic_vote(
    message: &Message,
    option_id: &str,
    voter: &UserRef,
) -> Result<VoteUpdate, PollVoteError> {
    let poll = message
        .poll
        .as_ref()
        .ok_or_else(|| PollVoteError::NotAPoll(message.id.clone()))?;
    let options = toggle_vote(poll, option_id, voter)?;

    Ok(VoteUpdate {
        apply: StoreEvent::PollOptionsUpdated {
            chat_id: message.chat_id.clone(),
            message_id: message.id.clone(),
            options,
        },
        rollback: StoreEvent::PollOptionsUpdated {
            chat_id: message.chat_id.clone(),
            message_id: message.id.clone(),
            options: poll.options.clone(),
        },
    })
}
