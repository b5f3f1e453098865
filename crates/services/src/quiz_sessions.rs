//! In-memory store of active quiz sessions.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use names_core::model::{ChatId, MessageId, Name, NameNumber};

#[derive(Default)]
struct Sessions {
    questions: HashMap<ChatId, Vec<Name>>,
    messages: HashMap<ChatId, MessageId>,
}

/// Maps a chat to its remaining quiz questions and to the message that shows
/// the active question.
///
/// One reader-writer lock covers both maps. It is only held for a single map
/// operation and never across an `.await`, so every call is effectively
/// instantaneous. Nothing here fails: absence means "no active quiz" and a
/// poisoned lock is recovered because each critical section leaves the maps
/// consistent.
#[derive(Default)]
pub struct QuizSessionRegistry {
    inner: RwLock<Sessions>,
}

impl QuizSessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Sessions> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Sessions> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the question set for `chat`. No merge with a previous set.
    pub fn store(&self, chat: ChatId, questions: Vec<Name>) {
        self.write().questions.insert(chat, questions);
    }

    /// Remaining questions, or an empty vector when no quiz is active.
    #[must_use]
    pub fn get(&self, chat: ChatId) -> Vec<Name> {
        self.read().questions.get(&chat).cloned().unwrap_or_default()
    }

    /// The question currently on screen.
    #[must_use]
    pub fn current(&self, chat: ChatId) -> Option<Name> {
        self.read()
            .questions
            .get(&chat)
            .and_then(|questions| questions.first().cloned())
    }

    #[must_use]
    pub fn has_session(&self, chat: ChatId) -> bool {
        self.read()
            .questions
            .get(&chat)
            .is_some_and(|questions| !questions.is_empty())
    }

    /// Remove the current question if it is `expected`, keeping the rest.
    ///
    /// Returns `None` when there is no active quiz or the current question is a
    /// different one, so a repeated button press cannot consume two questions.
    pub fn pop_front_if(&self, chat: ChatId, expected: NameNumber) -> Option<Name> {
        let mut sessions = self.write();
        let questions = sessions.questions.get_mut(&chat)?;
        if questions.first().map(|name| name.number) != Some(expected) {
            return None;
        }
        Some(questions.remove(0))
    }

    /// Drop the questions and the tracked message. No-op when absent.
    pub fn delete_session(&self, chat: ChatId) {
        let mut sessions = self.write();
        sessions.questions.remove(&chat);
        sessions.messages.remove(&chat);
    }

    /// Drop the session only if its last question was consumed. Returns
    /// whether it was removed; a quiz started in the meantime is kept.
    pub fn delete_session_if_finished(&self, chat: ChatId) -> bool {
        let mut sessions = self.write();
        let finished = sessions
            .questions
            .get(&chat)
            .is_some_and(|questions| questions.is_empty());
        if finished {
            sessions.questions.remove(&chat);
            sessions.messages.remove(&chat);
        }
        finished
    }

    pub fn store_message_id(&self, chat: ChatId, message: MessageId) {
        self.write().messages.insert(chat, message);
    }

    /// `None` means there is nothing to edit and a fresh message must be sent.
    #[must_use]
    pub fn get_message_id(&self, chat: ChatId) -> Option<MessageId> {
        self.read().messages.get(&chat).copied()
    }

    /// Forget the message pointer but keep the quiz going.
    pub fn delete_message_id(&self, chat: ChatId) {
        self.write().messages.remove(&chat);
    }

    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.read()
            .questions
            .values()
            .filter(|questions| !questions.is_empty())
            .count()
    }
}
