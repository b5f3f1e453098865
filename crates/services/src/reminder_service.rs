use std::sync::Arc;

use chrono::{DateTime, Duration, Timelike, Utc};
use names_core::Clock;
use names_core::model::{ChatId, MessageId, ReminderHour, UserId};
use storage::repository::SettingsRepository;
use tracing::{debug, info, warn};

use crate::error::ReminderError;
use crate::presenter::Reply;
use crate::reminders::ReminderTracker;
use crate::transport::{ChatTransport, TransportError};

/// Minimum gap between two reminders for the same user.
pub const REMINDER_COOLDOWN_HOURS: i64 = 20;

/// Posts daily reminders and keeps at most one reminder message per user in
/// the chat.
///
/// There is no scheduler here; an external timer calls
/// [`ReminderService::due_targets`] and [`ReminderService::deliver`].
#[derive(Clone)]
pub struct ReminderService {
    clock: Clock,
    tracker: Arc<ReminderTracker>,
    settings: Arc<dyn SettingsRepository>,
}

impl ReminderService {
    #[must_use]
    pub fn new(
        clock: Clock,
        tracker: Arc<ReminderTracker>,
        settings: Arc<dyn SettingsRepository>,
    ) -> Self {
        Self {
            clock,
            tracker,
            settings,
        }
    }

    #[must_use]
    pub fn tracker(&self) -> &ReminderTracker {
        &self.tracker
    }

    /// When the currently posted reminder was sent, if any.
    #[must_use]
    pub fn last_sent(&self, user_id: UserId) -> Option<DateTime<Utc>> {
        self.tracker.get(user_id).map(|record| record.sent_at)
    }

    /// Users whose reminder hour is the hour of `now` and who were not
    /// reminded within the cooldown.
    ///
    /// # Errors
    ///
    /// Returns `ReminderError::Storage` on repository failures.
    pub async fn due_targets(&self, now: DateTime<Utc>) -> Result<Vec<UserId>, ReminderError> {
        let Ok(hour) = ReminderHour::from_i64(i64::from(now.hour())) else {
            return Ok(Vec::new());
        };
        let cooldown = Duration::hours(REMINDER_COOLDOWN_HOURS);
        let targets = self.settings.list_reminder_targets(hour).await?;
        Ok(targets
            .into_iter()
            .filter(|user| {
                self.tracker
                    .get(*user)
                    .is_none_or(|record| now - record.sent_at >= cooldown)
            })
            .collect())
    }

    /// [`ReminderService::due_targets`] at the current time.
    ///
    /// # Errors
    ///
    /// Returns `ReminderError::Storage` on repository failures.
    pub async fn due_now(&self) -> Result<Vec<UserId>, ReminderError> {
        self.due_targets(self.clock.now()).await
    }

    /// Post a reminder, then remove the one it replaces.
    ///
    /// The tracked record is swapped atomically, so overlapping deliveries for
    /// the same user each delete a different predecessor. Failing to delete the
    /// old message is logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns `ReminderError::Transport` if the new message cannot be sent.
    pub async fn deliver(
        &self,
        user_id: UserId,
        chat: ChatId,
        reply: &Reply,
        transport: &dyn ChatTransport,
    ) -> Result<MessageId, ReminderError> {
        let message = transport.send_message(chat, reply).await?;
        let previous = self.tracker.upsert_and_get_prev(user_id, chat, message);
        info!(user = %user_id, chat = %chat, message = %message, "reminder sent");

        if let Some(prev) = previous {
            match transport.delete_message(prev.chat_id, prev.message_id).await {
                Ok(()) => debug!(user = %user_id, message = %prev.message_id, "old reminder removed"),
                Err(TransportError::MessageNotFound) => {}
                Err(err) => warn!(
                    user = %user_id,
                    message = %prev.message_id,
                    error = %err,
                    "failed to remove old reminder"
                ),
            }
        }
        Ok(message)
    }

    /// Forget the user's reminder and delete its message. Returns whether a
    /// reminder was tracked.
    pub async fn dismiss(&self, user_id: UserId, transport: &dyn ChatTransport) -> bool {
        let Some(record) = self.tracker.delete(user_id) else {
            return false;
        };
        match transport.delete_message(record.chat_id, record.message_id).await {
            Ok(()) | Err(TransportError::MessageNotFound) => {}
            Err(err) => warn!(user = %user_id, error = %err, "failed to delete dismissed reminder"),
        }
        info!(user = %user_id, "reminder dismissed");
        true
    }
}
