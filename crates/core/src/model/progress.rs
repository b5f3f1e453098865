use chrono::{DateTime, Utc};

use crate::model::ids::{NameNumber, UserId};

/// Cumulative correct answers after which a name counts as learned.
pub const MASTERY_THRESHOLD: u32 = 3;

/// A user's relationship to one name.
///
/// Transitions only move forward: `NotStarted -> InProgress -> Learned`.
/// `NotStarted -> Learned` happens through a manual mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameState {
    NotStarted,
    InProgress,
    Learned,
}

/// Learning state for a single (user, name) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameProgress {
    user_id: UserId,
    number: NameNumber,
    learned: bool,
    last_reviewed_at: Option<DateTime<Utc>>,
    correct_count: u32,
    attempt_count: u32,
}

impl NameProgress {
    /// Fresh progress for a name the user has never seen.
    #[must_use]
    pub fn new(user_id: UserId, number: NameNumber) -> Self {
        Self {
            user_id,
            number,
            learned: false,
            last_reviewed_at: None,
            correct_count: 0,
            attempt_count: 0,
        }
    }

    /// Rehydrate progress from storage.
    ///
    /// Counters are taken as stored; `attempt_count` is raised to at least
    /// `correct_count` so accuracy never exceeds 100%.
    #[must_use]
    pub fn from_persisted(
        user_id: UserId,
        number: NameNumber,
        learned: bool,
        last_reviewed_at: Option<DateTime<Utc>>,
        correct_count: u32,
        attempt_count: u32,
    ) -> Self {
        Self {
            user_id,
            number,
            learned,
            last_reviewed_at,
            correct_count,
            attempt_count: attempt_count.max(correct_count),
        }
    }

    /// Apply one quiz answer.
    ///
    /// Promotes to learned once `correct_count` reaches [`MASTERY_THRESHOLD`];
    /// a learned name is never demoted.
    pub fn record_answer(&mut self, was_correct: bool, at: DateTime<Utc>) {
        self.attempt_count = self.attempt_count.saturating_add(1);
        if was_correct {
            self.correct_count = self.correct_count.saturating_add(1);
        }
        self.last_reviewed_at = Some(at);
        if self.correct_count >= MASTERY_THRESHOLD {
            self.learned = true;
        }
    }

    /// Manual override: the user says they know this name.
    pub fn mark_learned(&mut self, at: DateTime<Utc>) {
        self.learned = true;
        self.last_reviewed_at = Some(at);
    }

    #[must_use]
    pub fn state(&self) -> NameState {
        if self.learned {
            NameState::Learned
        } else if self.last_reviewed_at.is_some() || self.attempt_count > 0 {
            NameState::InProgress
        } else {
            NameState::NotStarted
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn number(&self) -> NameNumber {
        self.number
    }

    #[must_use]
    pub fn is_learned(&self) -> bool {
        self.learned
    }

    #[must_use]
    pub fn last_reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed_at
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn progress() -> NameProgress {
        NameProgress::new(UserId::new(1), NameNumber::new(5).unwrap())
    }

    #[test]
    fn new_progress_is_not_started() {
        let p = progress();
        assert_eq!(p.state(), NameState::NotStarted);
        assert_eq!(p.last_reviewed_at(), None);
    }

    #[test]
    fn wrong_answer_moves_to_in_progress() {
        let mut p = progress();
        p.record_answer(false, fixed_now());
        assert_eq!(p.state(), NameState::InProgress);
        assert_eq!(p.correct_count(), 0);
        assert_eq!(p.attempt_count(), 1);
        assert_eq!(p.last_reviewed_at(), Some(fixed_now()));
    }

    #[test]
    fn promotes_at_mastery_threshold() {
        let mut p = progress();
        for _ in 0..MASTERY_THRESHOLD - 1 {
            p.record_answer(true, fixed_now());
        }
        assert!(!p.is_learned());

        p.record_answer(true, fixed_now());
        assert!(p.is_learned());
        assert_eq!(p.state(), NameState::Learned);
    }

    #[test]
    fn learned_is_never_demoted() {
        let mut p = progress();
        p.mark_learned(fixed_now());
        for _ in 0..10 {
            p.record_answer(false, fixed_now());
        }
        assert!(p.is_learned());
        assert_eq!(p.attempt_count(), 10);
    }

    #[test]
    fn mark_learned_skips_counters() {
        let mut p = progress();
        p.mark_learned(fixed_now());
        assert_eq!(p.state(), NameState::Learned);
        assert_eq!(p.correct_count(), 0);
    }

    #[test]
    fn persisted_attempts_cover_correct_answers() {
        let p = NameProgress::from_persisted(
            UserId::new(1),
            NameNumber::new(2).unwrap(),
            false,
            None,
            4,
            1,
        );
        assert_eq!(p.attempt_count(), 4);
    }
}
