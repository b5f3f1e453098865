use std::sync::Arc;

use names_core::Clock;
use names_core::model::{NameNumber, NameProgress, NamesPerDay, ProgressSummary, Settings, UserId};
use storage::repository::ProgressRepository;

use crate::error::ProgressServiceError;

/// Records answers and derives progress summaries.
///
/// Owns the time source so callers never pass timestamps for review events.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, progress }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(
            clock,
            Arc::new(storage::repository::InMemoryRepository::new()),
        )
    }

    /// Count one quiz answer for `number`.
    ///
    /// A learned name stays learned whatever the answer.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn record_answer(
        &self,
        user_id: UserId,
        number: NameNumber,
        was_correct: bool,
    ) -> Result<NameProgress, ProgressServiceError> {
        let progress = self
            .progress
            .record_answer(user_id, number, was_correct, self.clock.now())
            .await?;
        Ok(progress)
    }

    /// Manual override that marks a name learned regardless of counters.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn mark_learned(
        &self,
        user_id: UserId,
        number: NameNumber,
    ) -> Result<NameProgress, ProgressServiceError> {
        let progress = self
            .progress
            .mark_learned(user_id, number, self.clock.now())
            .await?;
        Ok(progress)
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn name_progress(
        &self,
        user_id: UserId,
        number: NameNumber,
    ) -> Result<Option<NameProgress>, ProgressServiceError> {
        Ok(self.progress.get_progress(user_id, number).await?)
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn list_progress(
        &self,
        user_id: UserId,
    ) -> Result<Vec<NameProgress>, ProgressServiceError> {
        Ok(self.progress.list_progress(user_id).await?)
    }

    /// Summary over all 99 names at the given daily pace.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::InvalidInput` when `names_per_day` is zero
    /// or above 99, and `ProgressServiceError::Storage` on repository failures.
    pub async fn get_summary(
        &self,
        user_id: UserId,
        names_per_day: u32,
    ) -> Result<ProgressSummary, ProgressServiceError> {
        let pace = NamesPerDay::new(names_per_day).map_err(names_core::Error::from)?;
        self.summary_at_pace(user_id, pace).await
    }

    /// Summary using the pace stored in the user's settings.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on repository failures.
    pub async fn summary_for_settings(
        &self,
        user_id: UserId,
        settings: &Settings,
    ) -> Result<ProgressSummary, ProgressServiceError> {
        self.summary_at_pace(user_id, settings.names_per_day()).await
    }

    async fn summary_at_pace(
        &self,
        user_id: UserId,
        pace: NamesPerDay,
    ) -> Result<ProgressSummary, ProgressServiceError> {
        let entries = self.progress.list_progress(user_id).await?;
        Ok(ProgressSummary::from_progress(&entries, pace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use names_core::model::{MASTERY_THRESHOLD, NameState, SettingsError, TOTAL_NAMES};
    use names_core::time::fixed_clock;

    fn number(n: u8) -> NameNumber {
        NameNumber::new(n).unwrap()
    }

    #[tokio::test]
    async fn summary_counts_always_cover_every_name() {
        let service = ProgressService::in_memory(fixed_clock());
        let user = UserId::new(1);

        service.record_answer(user, number(1), true).await.unwrap();
        service.record_answer(user, number(1), false).await.unwrap();
        service.record_answer(user, number(2), false).await.unwrap();
        service.mark_learned(user, number(3)).await.unwrap();
        service.mark_learned(user, number(3)).await.unwrap();

        let summary = service.get_summary(user, 3).await.unwrap();
        assert_eq!(summary.learned(), 1);
        assert_eq!(summary.in_progress(), 2);
        assert_eq!(
            summary.learned() + summary.in_progress() + summary.not_started(),
            u32::from(TOTAL_NAMES)
        );
    }

    #[tokio::test]
    async fn accuracy_matches_recorded_answers() {
        let service = ProgressService::in_memory(fixed_clock());
        let user = UserId::new(1);

        let empty = service.get_summary(user, 3).await.unwrap();
        assert!(empty.accuracy().abs() < f64::EPSILON);

        service.record_answer(user, number(7), true).await.unwrap();
        service.record_answer(user, number(7), false).await.unwrap();
        service.record_answer(user, number(8), true).await.unwrap();

        let summary = service.get_summary(user, 3).await.unwrap();
        assert_eq!(format!("{:.1}", summary.accuracy_percent()), "66.7");
    }

    #[tokio::test]
    async fn zero_pace_is_rejected() {
        let service = ProgressService::in_memory(fixed_clock());
        let err = service.get_summary(UserId::new(1), 0).await.unwrap_err();
        assert!(matches!(
            err,
            ProgressServiceError::InvalidInput(names_core::Error::Settings(
                SettingsError::InvalidPace(0)
            ))
        ));
    }

    #[tokio::test]
    async fn days_to_complete_follows_pace() {
        let service = ProgressService::in_memory(fixed_clock());
        let user = UserId::new(2);
        for n in 1..=94 {
            service.mark_learned(user, number(n)).await.unwrap();
        }
        assert_eq!(service.get_summary(user, 5).await.unwrap().days_to_complete(), 1);

        for n in 95..=99 {
            service.mark_learned(user, number(n)).await.unwrap();
        }
        let done = service.get_summary(user, 5).await.unwrap();
        assert_eq!(done.days_to_complete(), 0);
        assert!(done.is_complete());
    }

    #[tokio::test]
    async fn learned_name_is_never_demoted() {
        let service = ProgressService::in_memory(fixed_clock());
        let user = UserId::new(1);
        for _ in 0..MASTERY_THRESHOLD {
            service.record_answer(user, number(4), true).await.unwrap();
        }
        let after_wrong = service.record_answer(user, number(4), false).await.unwrap();
        assert_eq!(after_wrong.state(), NameState::Learned);

        let stored = service.name_progress(user, number(4)).await.unwrap().unwrap();
        assert!(stored.is_learned());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_answers_keep_every_increment() {
        let service = ProgressService::in_memory(fixed_clock());
        let user = UserId::new(9);

        let tasks: Vec<_> = (0..50)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .record_answer(user, number(10), i % 5 != 0)
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let progress = service.name_progress(user, number(10)).await.unwrap().unwrap();
        assert_eq!(progress.correct_count(), 40);
        assert_eq!(progress.attempt_count(), 50);
    }
}
