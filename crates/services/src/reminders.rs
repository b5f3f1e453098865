//! Tracks the latest reminder message per user so it can be replaced instead
//! of piling up in the chat.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use names_core::Clock;
use names_core::model::{ChatId, MessageId, UserId};

/// Where and when the last reminder for a user was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderRecord {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sent_at: DateTime<Utc>,
}

/// One record per user behind a single reader-writer lock.
///
/// [`ReminderTracker::upsert_and_get_prev`] swaps the record inside one
/// critical section. Two overlapping deliveries for the same user therefore
/// each see a distinct predecessor and no reminder message is left behind.
#[derive(Default)]
pub struct ReminderTracker {
    clock: Clock,
    records: RwLock<HashMap<UserId, ReminderRecord>>,
}

impl ReminderTracker {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            records: RwLock::new(HashMap::new()),
        }
    }

    fn record(&self, chat_id: ChatId, message_id: MessageId) -> ReminderRecord {
        ReminderRecord {
            chat_id,
            message_id,
            sent_at: self.clock.now(),
        }
    }

    /// Overwrite the record for `user`, stamped with the current time.
    pub fn store(&self, user: UserId, chat_id: ChatId, message_id: MessageId) {
        let record = self.record(chat_id, message_id);
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user, record);
    }

    #[must_use]
    pub fn get(&self, user: UserId) -> Option<ReminderRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user)
            .copied()
    }

    /// Replace the record and return the one it displaced, atomically.
    pub fn upsert_and_get_prev(
        &self,
        user: UserId,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Option<ReminderRecord> {
        let record = self.record(chat_id, message_id);
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user, record)
    }

    /// Remove the record, e.g. after the user dismissed the reminder.
    pub fn delete(&self, user: UserId) -> Option<ReminderRecord> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
