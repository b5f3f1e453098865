//! Text rendering for chat replies.
//!
//! Everything here is pure: identical input gives byte-identical output, which
//! lets the transport treat an edit to the same content as a no-op.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use names_core::model::{
    Name, NameNumber, NameProgress, ProgressSummary, QuizMode, ReminderHour, Settings, TOTAL_NAMES,
};

use crate::quiz_service::{AnswerOutcome, QuizQuestion};

const FILLED: char = '█';
const EMPTY: char = '░';

/// Default width of the progress bar, in segments.
pub const PROGRESS_BAR_WIDTH: usize = 20;

/// Logical buttons offered with a reply. The transport decides layout and
/// callback encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    Choose(NameNumber),
    Knew,
    DidNotKnow,
    StartQuiz,
    ShowProgress,
    OpenSettings,
    LearnToday,
    DismissReminder,
}

/// A rendered message: text plus the actions offered under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub actions: Vec<MenuAction>,
}

impl Reply {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_actions(mut self, actions: impl IntoIterator<Item = MenuAction>) -> Self {
        self.actions.extend(actions);
        self
    }
}

/// State of a user's daily reminder as shown on the settings screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderStatus {
    Disabled,
    Scheduled {
        hour: ReminderHour,
    },
    /// A reminder is currently posted in the chat.
    Active {
        hour: ReminderHour,
        sent_at: DateTime<Utc>,
    },
}

impl ReminderStatus {
    /// Status derived from settings plus the tracked reminder, if any.
    #[must_use]
    pub fn from_settings(settings: &Settings, last_sent: Option<DateTime<Utc>>) -> Self {
        let hour = settings.reminder_hour();
        match (settings.reminders_enabled(), last_sent) {
            (false, _) => Self::Disabled,
            (true, None) => Self::Scheduled { hour },
            (true, Some(sent_at)) => Self::Active { hour, sent_at },
        }
    }
}

/// Fixed-width bar with `round(learned / total * width)` filled segments.
///
/// `learned` is clamped to `total`; a zero `total` renders an empty bar.
#[must_use]
pub fn build_progress_bar(learned: u32, total: u32, width: usize) -> String {
    let filled = filled_segments(learned, total, width);
    std::iter::repeat_n(FILLED, filled)
        .chain(std::iter::repeat_n(EMPTY, width - filled))
        .collect()
}

fn filled_segments(learned: u32, total: u32, width: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let learned = u128::from(learned.min(total));
    let total = u128::from(total);
    // Integer half-up rounding of learned * width / total; cannot overflow u128.
    u128::try_from(width)
        .ok()
        .map(|width| (2 * learned * width + total) / (2 * total))
        .and_then(|rounded| usize::try_from(rounded).ok())
        .map_or(width, |n| n.min(width))
}

/// Progress screen text.
#[must_use]
pub fn format_progress_message(summary: &ProgressSummary, bar: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📊 Your progress");
    let _ = writeln!(out);
    let _ = writeln!(out, "{bar} {:.1}%", summary.completion_percent());
    let _ = writeln!(out);
    let _ = writeln!(out, "✅ Learned: {}/{TOTAL_NAMES}", summary.learned());
    let _ = writeln!(out, "📖 In progress: {}", summary.in_progress());
    let _ = writeln!(out, "🆕 Not started: {}", summary.not_started());
    let _ = writeln!(
        out,
        "🎯 Accuracy: {:.1}% ({}/{})",
        summary.accuracy_percent(),
        summary.total_correct(),
        summary.total_attempts()
    );
    if summary.is_complete() {
        let _ = write!(out, "🏁 All {TOTAL_NAMES} names learned!");
    } else {
        let _ = write!(
            out,
            "📅 About {} day(s) to finish at {} name(s) per day",
            summary.days_to_complete(),
            summary.names_per_day().value()
        );
    }
    out
}

fn format_hour(hour: ReminderHour) -> String {
    format!("{:02}:00 UTC", hour.value())
}

/// Settings screen text.
#[must_use]
pub fn format_settings_message(settings: &Settings, status: ReminderStatus) -> String {
    let reminder = match status {
        ReminderStatus::Disabled => "off".to_owned(),
        ReminderStatus::Scheduled { hour } => format!("daily at {}", format_hour(hour)),
        ReminderStatus::Active { hour, sent_at } => format!(
            "daily at {} (last sent {})",
            format_hour(hour),
            sent_at.format("%Y-%m-%d %H:%M UTC")
        ),
    };

    format!(
        "⚙️ Settings\n\n\
         Names per day: {}\n\
         Quiz mode: {}\n\
         Learning mode: {}\n\
         Reminder: {reminder}",
        settings.names_per_day().value(),
        settings.quiz_mode(),
        settings.learning_mode(),
    )
}

/// Question text for the current quiz item.
///
/// The meaning is never part of the question; free recall reveals it only in
/// the answer feedback.
#[must_use]
pub fn format_question(question: &QuizQuestion) -> String {
    let name = &question.name;
    let mut out = format!(
        "❓ Question ({} left)\n\n{} ({})\n\n",
        question.remaining, name.arabic, name.transliteration
    );
    match question.mode {
        QuizMode::MultipleChoice => {
            out.push_str("What does this name mean?");
            for (label, option) in ('A'..='Z').zip(&question.options) {
                let _ = write!(out, "\n{label}) {}", option.meaning);
            }
        }
        QuizMode::FreeRecall => out.push_str("Do you remember its meaning?"),
    }
    out
}

/// Question with its answer buttons. Choice buttons follow the option order.
#[must_use]
pub fn question_reply(question: &QuizQuestion) -> Reply {
    let actions: Vec<MenuAction> = match question.mode {
        QuizMode::MultipleChoice => question
            .options
            .iter()
            .map(|option| MenuAction::Choose(option.number))
            .collect(),
        QuizMode::FreeRecall => vec![MenuAction::Knew, MenuAction::DidNotKnow],
    };
    Reply::text(format_question(question)).with_actions(actions)
}

/// Feedback after an answer, including the correct meaning.
#[must_use]
pub fn format_answer_feedback(name: &Name, was_correct: bool, progress: &NameProgress) -> String {
    let verdict = if was_correct { "✅ Correct!" } else { "❌ Not quite." };
    let mut out = format!(
        "{verdict}\n\n{}. {} ({})\n{}",
        name.number, name.arabic, name.transliteration, name.meaning
    );
    if progress.is_learned() {
        out.push_str("\n\n🌟 Learned");
    } else {
        let _ = write!(out, "\n\nCorrect answers: {}", progress.correct_count());
    }
    out
}

/// Feedback followed by the next question, or the end-of-quiz menu.
#[must_use]
pub fn answer_reply(outcome: &AnswerOutcome) -> Reply {
    let feedback = format_answer_feedback(&outcome.name, outcome.was_correct, &outcome.progress);
    match &outcome.next {
        Some(next) => {
            let question = question_reply(next);
            Reply {
                text: format!("{feedback}\n\n{}", question.text),
                actions: question.actions,
            }
        }
        None => Reply::text(format!("{feedback}\n\n🏁 Quiz complete!")).with_actions([
            MenuAction::StartQuiz,
            MenuAction::ShowProgress,
        ]),
    }
}

/// Today's batch of names to study.
#[must_use]
pub fn format_daily_names(names: &[Name]) -> String {
    if names.is_empty() {
        return format!("🏁 You have learned all {TOTAL_NAMES} names. Keep revising with a quiz!");
    }
    let mut out = String::from("📚 Today's names\n");
    for name in names {
        let _ = write!(
            out,
            "\n{}. {} ({})\n{}\n",
            name.number, name.arabic, name.transliteration, name.meaning
        );
    }
    out.truncate(out.trim_end().len());
    out
}

/// Daily reminder with a short progress line.
#[must_use]
pub fn format_reminder(summary: &ProgressSummary) -> String {
    let bar = build_progress_bar(summary.learned(), u32::from(TOTAL_NAMES), PROGRESS_BAR_WIDTH);
    format!(
        "🔔 Time for today's names!\n\n{bar} {}/{TOTAL_NAMES}",
        summary.learned()
    )
}

/// Progress screen with its navigation buttons.
#[must_use]
pub fn progress_reply(summary: &ProgressSummary) -> Reply {
    let bar = build_progress_bar(summary.learned(), u32::from(TOTAL_NAMES), PROGRESS_BAR_WIDTH);
    Reply::text(format_progress_message(summary, &bar)).with_actions([
        MenuAction::StartQuiz,
        MenuAction::LearnToday,
        MenuAction::OpenSettings,
    ])
}

#[must_use]
pub fn settings_reply(settings: &Settings, status: ReminderStatus) -> Reply {
    Reply::text(format_settings_message(settings, status)).with_actions([MenuAction::ShowProgress])
}

#[must_use]
pub fn daily_names_reply(names: &[Name]) -> Reply {
    Reply::text(format_daily_names(names))
        .with_actions([MenuAction::StartQuiz, MenuAction::ShowProgress])
}

#[must_use]
pub fn reminder_reply(summary: &ProgressSummary) -> Reply {
    Reply::text(format_reminder(summary)).with_actions([
        MenuAction::LearnToday,
        MenuAction::StartQuiz,
        MenuAction::DismissReminder,
    ])
}
