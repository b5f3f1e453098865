use std::collections::BTreeMap;

use crate::model::ids::{NameNumber, TOTAL_NAMES};
use crate::model::progress::{NameProgress, NameState};
use crate::model::settings::NamesPerDay;

/// Aggregate view over a user's progress rows. Derived, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSummary {
    learned: u32,
    in_progress: u32,
    not_started: u32,
    total_correct: u32,
    total_attempts: u32,
    names_per_day: NamesPerDay,
}

impl ProgressSummary {
    /// Build a summary over all 99 names.
    ///
    /// Names without a row count as not started with zero attempts. Duplicate
    /// rows for the same number are collapsed, keeping the last one.
    #[must_use]
    pub fn from_progress(entries: &[NameProgress], names_per_day: NamesPerDay) -> Self {
        let by_number: BTreeMap<NameNumber, &NameProgress> =
            entries.iter().map(|entry| (entry.number(), entry)).collect();

        let mut learned = 0_u32;
        let mut in_progress = 0_u32;
        let mut total_correct = 0_u32;
        let mut total_attempts = 0_u32;

        for entry in by_number.values() {
            match entry.state() {
                NameState::Learned => learned += 1,
                NameState::InProgress => in_progress += 1,
                NameState::NotStarted => {}
            }
            total_correct = total_correct.saturating_add(entry.correct_count());
            total_attempts = total_attempts.saturating_add(entry.attempt_count());
        }

        Self {
            learned,
            in_progress,
            not_started: u32::from(TOTAL_NAMES) - learned - in_progress,
            total_correct,
            total_attempts,
            names_per_day,
        }
    }

    #[must_use]
    pub fn learned(&self) -> u32 {
        self.learned
    }

    #[must_use]
    pub fn in_progress(&self) -> u32 {
        self.in_progress
    }

    #[must_use]
    pub fn not_started(&self) -> u32 {
        self.not_started
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        u32::from(TOTAL_NAMES) - self.learned
    }

    #[must_use]
    pub fn total_correct(&self) -> u32 {
        self.total_correct
    }

    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    #[must_use]
    pub fn names_per_day(&self) -> NamesPerDay {
        self.names_per_day
    }

    /// Share of the catalog learned, in percent (0.0..=100.0).
    #[must_use]
    pub fn completion_percent(&self) -> f64 {
        f64::from(self.learned) / f64::from(TOTAL_NAMES) * 100.0
    }

    /// Correct answers over attempts, as a fraction. Zero before any attempt.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total_attempts == 0 {
            return 0.0;
        }
        f64::from(self.total_correct) / f64::from(self.total_attempts)
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        self.accuracy() * 100.0
    }

    /// Days left at the configured pace, rounded up.
    #[must_use]
    pub fn days_to_complete(&self) -> u32 {
        self.remaining().div_ceil(self.names_per_day.value())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.learned == u32::from(TOTAL_NAMES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::UserId;
    use crate::time::fixed_now;

    fn pace(n: u32) -> NamesPerDay {
        NamesPerDay::new(n).unwrap()
    }

    fn learned_rows(count: u8) -> Vec<NameProgress> {
        (1..=count)
            .map(|n| {
                let mut p = NameProgress::new(UserId::new(1), NameNumber::new(n).unwrap());
                p.mark_learned(fixed_now());
                p
            })
            .collect()
    }

    #[test]
    fn empty_progress_is_all_not_started() {
        let summary = ProgressSummary::from_progress(&[], pace(3));
        assert_eq!(summary.learned(), 0);
        assert_eq!(summary.in_progress(), 0);
        assert_eq!(summary.not_started(), 99);
        assert_eq!(summary.accuracy(), 0.0);
        assert_eq!(summary.days_to_complete(), 33);
    }

    #[test]
    fn counts_always_sum_to_catalog_size() {
        let mut rows = learned_rows(10);
        let mut reviewing = NameProgress::new(UserId::new(1), NameNumber::new(50).unwrap());
        reviewing.record_answer(false, fixed_now());
        rows.push(reviewing);

        let summary = ProgressSummary::from_progress(&rows, pace(3));
        assert_eq!(summary.learned(), 10);
        assert_eq!(summary.in_progress(), 1);
        assert_eq!(
            summary.learned() + summary.in_progress() + summary.not_started(),
            99
        );
    }

    #[test]
    fn accuracy_is_correct_over_attempts() {
        let mut p = NameProgress::new(UserId::new(1), NameNumber::new(1).unwrap());
        p.record_answer(true, fixed_now());
        p.record_answer(true, fixed_now());
        p.record_answer(false, fixed_now());

        let summary = ProgressSummary::from_progress(&[p], pace(1));
        assert_eq!(summary.total_correct(), 2);
        assert_eq!(summary.total_attempts(), 3);
        assert_eq!(format!("{:.1}", summary.accuracy_percent()), "66.7");
    }

    #[test]
    fn days_to_complete_rounds_up() {
        let summary = ProgressSummary::from_progress(&learned_rows(94), pace(5));
        assert_eq!(summary.days_to_complete(), 1);

        let summary = ProgressSummary::from_progress(&learned_rows(93), pace(5));
        assert_eq!(summary.days_to_complete(), 2);

        let summary = ProgressSummary::from_progress(&learned_rows(99), pace(5));
        assert_eq!(summary.days_to_complete(), 0);
        assert!(summary.is_complete());
        assert_eq!(summary.completion_percent(), 100.0);
    }

    #[test]
    fn duplicate_rows_are_counted_once() {
        let rows = [learned_rows(1), learned_rows(1)].concat();
        let summary = ProgressSummary::from_progress(&rows, pace(1));
        assert_eq!(summary.learned(), 1);
        assert_eq!(summary.not_started(), 98);
    }
}
