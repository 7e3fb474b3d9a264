use serde::{Deserialize, Serialize};

use super::{Timestamp, UserId, UserRef};

/// Identifier of a message.
pub type MessageId = u64;

/// A single internal message between two users.
///
/// Messages are immutable once received: marking one as read goes through
/// the server and a refetch, never a local flip of `is_read`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique identifier for the message.
    pub id: MessageId,

    /// Author of the message.
    pub sender: UserRef,

    /// Addressee of the message.
    pub recipient: UserRef,

    /// The message body.
    pub content: String,

    /// When the message was sent. `None` if the server value was unparseable;
    /// such messages order before every dated message.
    pub created_at: Option<Timestamp>,

    /// Whether the recipient has read the message.
    pub is_read: bool,
}

impl Message {
    /// The other party of this message from `me`'s point of view.
    #[must_use]
    pub fn counterpart(&self, me: UserId) -> &UserRef {
        if self.sender.id == me {
            &self.recipient
        } else {
            &self.sender
        }
    }

    /// `true` if this message was addressed to `me` and is still unread.
    #[must_use]
    pub fn is_unread_for(&self, me: UserId) -> bool {
        self.recipient.id == me && !self.is_read
    }
}

/// Request structure for sending a new message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    /// Addressee of the message.
    pub recipient_id: UserId,

    /// The content of the message.
    pub content: String,
}
