//! Outbound chat transport seam.
//!
//! The services decide *what* to show; an implementation of [`ChatTransport`]
//! decides how a [`Reply`] becomes a platform message and keyboard.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use names_core::model::{ChatId, MessageId};
use thiserror::Error;

use crate::presenter::Reply;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// The edit would leave the message unchanged. Callers treat this as success.
    #[error("message is not modified")]
    NotModified,
    /// The message was deleted or never existed.
    #[error("message not found")]
    MessageNotFound,
    #[error("transport failure: {0}")]
    Failed(String),
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// # Errors
    ///
    /// Returns `TransportError::Failed` when the platform rejects the message.
    async fn send_message(&self, chat: ChatId, reply: &Reply) -> Result<MessageId, TransportError>;

    /// # Errors
    ///
    /// Returns `TransportError::NotModified` for identical content and
    /// `TransportError::MessageNotFound` when the message is gone.
    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        reply: &Reply,
    ) -> Result<(), TransportError>;

    /// # Errors
    ///
    /// Returns `TransportError::MessageNotFound` when the message is gone.
    async fn delete_message(&self, chat: ChatId, message: MessageId)
    -> Result<(), TransportError>;
}

#[derive(Default)]
struct MemoryChat {
    next_id: i32,
    messages: BTreeMap<(ChatId, MessageId), Reply>,
    deleted: Vec<(ChatId, MessageId)>,
    edits: usize,
}

/// Transport that keeps messages in memory; used by tests and local runs.
#[derive(Default)]
pub struct MemoryTransport {
    state: Mutex<MemoryChat>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages currently visible in a chat, oldest first.
    #[must_use]
    pub fn messages_in(&self, chat: ChatId) -> Vec<(MessageId, Reply)> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .messages
            .iter()
            .filter(|((c, _), _)| *c == chat)
            .map(|((_, id), reply)| (*id, reply.clone()))
            .collect()
    }

    #[must_use]
    pub fn deleted(&self) -> Vec<(ChatId, MessageId)> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.deleted.clone()
    }

    /// Number of successful edits.
    #[must_use]
    pub fn edits(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.edits
    }

    /// Drop a message as if the user deleted it in the client.
    pub fn forget(&self, chat: ChatId, message: MessageId) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.messages.remove(&(chat, message));
    }
}

#[async_trait]
impl ChatTransport for MemoryTransport {
    async fn send_message(&self, chat: ChatId, reply: &Reply) -> Result<MessageId, TransportError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.next_id += 1;
        let id = MessageId::new(state.next_id);
        state.messages.insert((chat, id), reply.clone());
        Ok(id)
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        reply: &Reply,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let current = state
            .messages
            .get_mut(&(chat, message))
            .ok_or(TransportError::MessageNotFound)?;
        if current == reply {
            return Err(TransportError::NotModified);
        }
        *current = reply.clone();
        state.edits += 1;
        Ok(())
    }

    async fn delete_message(
        &self,
        chat: ChatId,
        message: MessageId,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .messages
            .remove(&(chat, message))
            .ok_or(TransportError::MessageNotFound)?;
        state.deleted.push((chat, message));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_edit_reports_not_modified() {
        let transport = MemoryTransport::new();
        let chat = ChatId::new(1);
        let reply = Reply::text("hello");

        let id = transport.send_message(chat, &reply).await.unwrap();
        let err = transport.edit_message(chat, id, &reply).await.unwrap_err();
        assert_eq!(err, TransportError::NotModified);

        transport
            .edit_message(chat, id, &Reply::text("bye"))
            .await
            .unwrap();
        assert_eq!(transport.edits(), 1);
    }

    #[tokio::test]
    async fn forgotten_message_cannot_be_edited_or_deleted() {
        let transport = MemoryTransport::new();
        let chat = ChatId::new(1);
        let id = transport.send_message(chat, &Reply::text("x")).await.unwrap();
        transport.forget(chat, id);

        assert_eq!(
            transport
                .edit_message(chat, id, &Reply::text("y"))
                .await
                .unwrap_err(),
            TransportError::MessageNotFound
        );
        assert_eq!(
            transport.delete_message(chat, id).await.unwrap_err(),
            TransportError::MessageNotFound
        );
    }
}
