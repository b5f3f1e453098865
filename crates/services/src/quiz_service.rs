use std::collections::HashSet;
use std::sync::Arc;

use names_core::model::{ChatId, MessageId, Name, NameNumber, NameProgress, QuizMode, UserId};
use rand::rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::catalog::NameCatalog;
use crate::error::QuizError;
use crate::presenter::{self, Reply};
use crate::progress_service::ProgressService;
use crate::quiz_sessions::QuizSessionRegistry;
use crate::settings_service::SettingsService;
use crate::transport::{ChatTransport, TransportError};

/// Questions per quiz when the caller does not choose.
pub const DEFAULT_QUIZ_LENGTH: usize = 10;

/// Options shown per multiple-choice question, including the correct one.
pub const OPTION_COUNT: usize = 4;

//
// ─── QUESTIONS AND ANSWERS ─────────────────────────────────────────────────────
//

/// The question currently on screen for a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub name: Name,
    pub mode: QuizMode,
    /// Shuffled options for multiple choice; empty for free recall.
    pub options: Vec<Name>,
    /// Questions left in this quiz, including this one.
    pub remaining: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Choice(NameNumber),
    /// Self-assessment in free-recall mode.
    Recalled(bool),
}

/// An answer tagged with the question it was given for, so a late or
/// repeated button press is detected instead of answering the next question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizAnswer {
    pub question: NameNumber,
    pub response: Response,
}

impl QuizAnswer {
    #[must_use]
    pub fn choice(question: NameNumber, chosen: NameNumber) -> Self {
        Self {
            question,
            response: Response::Choice(chosen),
        }
    }

    #[must_use]
    pub fn recalled(question: NameNumber, knew: bool) -> Self {
        Self {
            question,
            response: Response::Recalled(knew),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub name: Name,
    pub was_correct: bool,
    pub progress: NameProgress,
    /// Next question, or `None` when the quiz is over.
    pub next: Option<QuizQuestion>,
}

impl AnswerOutcome {
    #[must_use]
    pub fn finished(&self) -> bool {
        self.next.is_none()
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Runs quizzes on top of the session registry.
///
/// Registry calls never span an `.await`; the session is read, then storage
/// and transport calls follow.
#[derive(Clone)]
pub struct QuizService {
    catalog: Arc<dyn NameCatalog>,
    progress: ProgressService,
    settings: SettingsService,
    sessions: Arc<QuizSessionRegistry>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn NameCatalog>,
        progress: ProgressService,
        settings: SettingsService,
        sessions: Arc<QuizSessionRegistry>,
    ) -> Self {
        Self {
            catalog,
            progress,
            settings,
            sessions,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &QuizSessionRegistry {
        &self.sessions
    }

    /// Start a new quiz for `chat`, replacing any quiz in progress.
    ///
    /// Unlearned names come first in random order, then learned ones for
    /// revision.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidLength` for a zero length, otherwise storage
    /// errors from progress or settings.
    pub async fn start_quiz(
        &self,
        chat: ChatId,
        user_id: UserId,
        length: usize,
    ) -> Result<QuizQuestion, QuizError> {
        if length == 0 {
            return Err(QuizError::InvalidLength);
        }
        let settings = self.settings.get_or_create(user_id).await?;
        let learned: HashSet<NameNumber> = self
            .progress
            .list_progress(user_id)
            .await?
            .iter()
            .filter(|p| p.is_learned())
            .map(|p| p.number())
            .collect();

        let (mut fresh, mut review): (Vec<Name>, Vec<Name>) = self
            .catalog
            .all()
            .into_iter()
            .partition(|name| !learned.contains(&name.number));
        fresh.shuffle(&mut rng());
        review.shuffle(&mut rng());
        let questions: Vec<Name> = fresh.into_iter().chain(review).take(length).collect();

        info!(
            chat = %chat,
            user = %user_id,
            questions = questions.len(),
            "starting quiz"
        );
        self.sessions.delete_session(chat);
        self.sessions.store(chat, questions);
        self.current_question(chat, settings.quiz_mode())
    }

    /// Build the question on screen for `chat`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveQuiz` when the chat has no quiz.
    pub fn current_question(&self, chat: ChatId, mode: QuizMode) -> Result<QuizQuestion, QuizError> {
        let questions = self.sessions.get(chat);
        let name = questions.first().cloned().ok_or(QuizError::NoActiveQuiz)?;
        let options = match mode {
            QuizMode::MultipleChoice => self.options_for(&name),
            QuizMode::FreeRecall => Vec::new(),
        };
        Ok(QuizQuestion {
            name,
            mode,
            options,
            remaining: questions.len(),
        })
    }

    fn options_for(&self, correct: &Name) -> Vec<Name> {
        let mut distractors: Vec<Name> = self
            .catalog
            .all()
            .into_iter()
            .filter(|name| name.number != correct.number)
            .collect();
        distractors.shuffle(&mut rng());
        distractors.truncate(OPTION_COUNT - 1);
        distractors.push(correct.clone());
        distractors.shuffle(&mut rng());
        distractors
    }

    /// Score the current question and advance. The session is deleted after
    /// the last question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveQuiz` without a quiz, `QuizError::StaleAnswer`
    /// when the answer targets another question or its kind does not match the
    /// quiz mode, or storage errors.
    pub async fn answer(
        &self,
        chat: ChatId,
        user_id: UserId,
        answer: QuizAnswer,
    ) -> Result<AnswerOutcome, QuizError> {
        let outcome = self.apply_answer(chat, user_id, answer).await?;
        if outcome.finished() {
            self.sessions.delete_session_if_finished(chat);
        }
        Ok(outcome)
    }

    /// [`QuizService::answer`] followed by rendering the feedback into the
    /// tracked quiz message.
    ///
    /// # Errors
    ///
    /// As [`QuizService::answer`], plus `QuizError::Transport`.
    pub async fn answer_and_show(
        &self,
        chat: ChatId,
        user_id: UserId,
        answer: QuizAnswer,
        transport: &dyn ChatTransport,
    ) -> Result<AnswerOutcome, QuizError> {
        let outcome = self.apply_answer(chat, user_id, answer).await?;
        let shown = self
            .show(chat, &presenter::answer_reply(&outcome), transport)
            .await;
        if outcome.finished() {
            self.sessions.delete_session_if_finished(chat);
        }
        shown?;
        Ok(outcome)
    }

    async fn apply_answer(
        &self,
        chat: ChatId,
        user_id: UserId,
        answer: QuizAnswer,
    ) -> Result<AnswerOutcome, QuizError> {
        let current = self.sessions.current(chat).ok_or(QuizError::NoActiveQuiz)?;
        if current.number != answer.question {
            debug!(chat = %chat, expected = %current.number, got = %answer.question, "stale answer");
            return Err(QuizError::StaleAnswer);
        }
        let mode = self.settings.get_or_create(user_id).await?.quiz_mode();
        let was_correct = match (mode, answer.response) {
            (QuizMode::MultipleChoice, Response::Choice(chosen)) => chosen == current.number,
            (QuizMode::FreeRecall, Response::Recalled(knew)) => knew,
            _ => {
                debug!(chat = %chat, mode = %mode, "answer does not match quiz mode");
                return Err(QuizError::StaleAnswer);
            }
        };
        // Another handler may have consumed the question in the meantime.
        let name = self
            .sessions
            .pop_front_if(chat, answer.question)
            .ok_or(QuizError::StaleAnswer)?;
        let more = self.sessions.has_session(chat);

        let progress = self
            .progress
            .record_answer(user_id, name.number, was_correct)
            .await?;
        debug!(
            chat = %chat,
            user = %user_id,
            name = %name.number,
            was_correct,
            learned = progress.is_learned(),
            "quiz answer recorded"
        );

        let next = if more {
            Some(self.current_question(chat, mode)?)
        } else {
            info!(chat = %chat, user = %user_id, "quiz finished");
            None
        };

        Ok(AnswerOutcome {
            name,
            was_correct,
            progress,
            next,
        })
    }

    /// Start a quiz and post its first question.
    ///
    /// # Errors
    ///
    /// As [`QuizService::start_quiz`], plus `QuizError::Transport`.
    pub async fn start_and_show(
        &self,
        chat: ChatId,
        user_id: UserId,
        length: usize,
        transport: &dyn ChatTransport,
    ) -> Result<QuizQuestion, QuizError> {
        let question = self.start_quiz(chat, user_id, length).await?;
        self.show(chat, &presenter::question_reply(&question), transport)
            .await?;
        Ok(question)
    }

    /// Abandon the quiz in `chat`. Returns whether one was active.
    pub fn abandon(&self, chat: ChatId) -> bool {
        let active = self.sessions.has_session(chat);
        self.sessions.delete_session(chat);
        if active {
            info!(chat = %chat, "quiz abandoned");
        }
        active
    }

    /// Render `reply` into the chat's quiz message.
    ///
    /// Edits the tracked message in place; an unchanged edit counts as
    /// success. When there is no tracked message or it was deleted, a fresh
    /// message is sent and tracked instead.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Transport` for any other transport failure.
    pub async fn show(
        &self,
        chat: ChatId,
        reply: &Reply,
        transport: &dyn ChatTransport,
    ) -> Result<MessageId, QuizError> {
        if let Some(message) = self.sessions.get_message_id(chat) {
            match transport.edit_message(chat, message, reply).await {
                Ok(()) | Err(TransportError::NotModified) => return Ok(message),
                Err(TransportError::MessageNotFound) => {
                    debug!(chat = %chat, message = %message, "quiz message gone, sending a new one");
                    self.sessions.delete_message_id(chat);
                }
                Err(err) => return Err(err.into()),
            }
        }
        let message = transport.send_message(chat, reply).await?;
        self.sessions.store_message_id(chat, message);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample_catalog;
    use crate::transport::MemoryTransport;
    use names_core::model::{MASTERY_THRESHOLD, SettingsPatch};
    use names_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn service(catalog_size: u8) -> QuizService {
        let repo = Arc::new(InMemoryRepository::new());
        QuizService::new(
            Arc::new(sample_catalog(catalog_size)),
            ProgressService::new(fixed_clock(), repo.clone()),
            SettingsService::new(repo),
            Arc::new(QuizSessionRegistry::new()),
        )
    }

    const CHAT: ChatId = ChatId::new(100);
    const USER: UserId = UserId::new(1);

    #[tokio::test]
    async fn start_quiz_builds_multiple_choice_question() {
        let service = service(10);
        let question = service.start_quiz(CHAT, USER, 5).await.unwrap();

        assert_eq!(question.remaining, 5);
        assert_eq!(question.mode, QuizMode::MultipleChoice);
        assert_eq!(question.options.len(), OPTION_COUNT);
        assert!(question.options.contains(&question.name));
        let unique: HashSet<_> = question.options.iter().map(|n| n.number).collect();
        assert_eq!(unique.len(), OPTION_COUNT);
    }

    #[tokio::test]
    async fn zero_length_is_rejected() {
        let err = service(5).start_quiz(CHAT, USER, 0).await.unwrap_err();
        assert!(matches!(err, QuizError::InvalidLength));
    }

    #[tokio::test]
    async fn unlearned_names_come_first() {
        let service = service(4);
        for n in 1..=2 {
            service
                .progress
                .mark_learned(USER, NameNumber::new(n).unwrap())
                .await
                .unwrap();
        }
        service.start_quiz(CHAT, USER, 4).await.unwrap();
        let order: Vec<u8> = service
            .sessions()
            .get(CHAT)
            .iter()
            .map(|n| n.number.value())
            .collect();

        let mut head = order[..2].to_vec();
        head.sort_unstable();
        assert_eq!(head, vec![3, 4]);
    }

    #[tokio::test]
    async fn answering_every_question_finishes_and_clears_session() {
        let service = service(6);
        let mut question = service.start_quiz(CHAT, USER, 3).await.unwrap();
        let mut answered = 0;
        loop {
            let outcome = service
                .answer(
                    CHAT,
                    USER,
                    QuizAnswer::choice(question.name.number, question.name.number),
                )
                .await
                .unwrap();
            answered += 1;
            assert!(outcome.was_correct);
            match outcome.next {
                Some(next) => question = next,
                None => break,
            }
        }
        assert_eq!(answered, 3);
        assert!(service.sessions().get(CHAT).is_empty());
        assert!(matches!(
            service
                .answer(CHAT, USER, QuizAnswer::recalled(question.name.number, true))
                .await,
            Err(QuizError::NoActiveQuiz)
        ));
    }

    #[tokio::test]
    async fn stale_answer_does_not_consume_question() {
        let service = service(6);
        let question = service.start_quiz(CHAT, USER, 3).await.unwrap();
        let other = question
            .options
            .iter()
            .find(|n| n.number != question.name.number)
            .unwrap()
            .number;

        let err = service
            .answer(CHAT, USER, QuizAnswer::choice(other, other))
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::StaleAnswer));
        assert_eq!(service.sessions().get(CHAT).len(), 3);

        let wrong = service
            .answer(CHAT, USER, QuizAnswer::choice(question.name.number, other))
            .await
            .unwrap();
        assert!(!wrong.was_correct);
        assert_eq!(wrong.progress.attempt_count(), 1);
        assert_eq!(wrong.progress.correct_count(), 0);
    }

    #[tokio::test]
    async fn free_recall_uses_self_assessment() {
        let service = service(6);
        service
            .settings
            .update(USER, SettingsPatch::new().with_quiz_mode(QuizMode::FreeRecall))
            .await
            .unwrap();
        let question = service.start_quiz(CHAT, USER, 2).await.unwrap();
        assert!(question.options.is_empty());

        let outcome = service
            .answer(CHAT, USER, QuizAnswer::recalled(question.name.number, true))
            .await
            .unwrap();
        assert!(outcome.was_correct);
        assert_eq!(outcome.next.unwrap().mode, QuizMode::FreeRecall);
    }

    #[tokio::test]
    async fn repeated_correct_answers_promote_to_learned() {
        let service = service(1);
        let mut last = None;
        for _ in 0..MASTERY_THRESHOLD {
            let question = service.start_quiz(CHAT, USER, 1).await.unwrap();
            last = Some(
                service
                    .answer(
                        CHAT,
                        USER,
                        QuizAnswer::choice(question.name.number, question.name.number),
                    )
                    .await
                    .unwrap(),
            );
        }
        assert!(last.unwrap().progress.is_learned());
    }

    #[tokio::test]
    async fn show_edits_in_place_and_recovers_from_deleted_message() {
        let service = service(6);
        let transport = MemoryTransport::new();

        let question = service
            .start_and_show(CHAT, USER, 3, &transport)
            .await
            .unwrap();
        let first = service.sessions().get_message_id(CHAT).unwrap();

        let reply = presenter::question_reply(&question);
        assert_eq!(service.show(CHAT, &reply, &transport).await.unwrap(), first);
        assert_eq!(transport.edits(), 0);

        transport.forget(CHAT, first);
        let replacement = service
            .show(CHAT, &Reply::text("again"), &transport)
            .await
            .unwrap();
        assert_ne!(replacement, first);
        assert_eq!(service.sessions().get_message_id(CHAT), Some(replacement));
        assert_eq!(service.sessions().get(CHAT).len(), 3);
    }

    #[tokio::test]
    async fn answer_kind_must_match_quiz_mode() {
        let service = service(6);
        let question = service.start_quiz(CHAT, USER, 2).await.unwrap();

        let err = service
            .answer(CHAT, USER, QuizAnswer::recalled(question.name.number, true))
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::StaleAnswer));
        assert_eq!(service.sessions().get(CHAT).len(), 2);
        assert!(
            service
                .progress
                .name_progress(USER, question.name.number)
                .await
                .unwrap()
                .is_none()
        );

        service
            .settings
            .update(USER, SettingsPatch::new().with_quiz_mode(QuizMode::FreeRecall))
            .await
            .unwrap();
        let question = service.start_quiz(CHAT, USER, 2).await.unwrap();
        let err = service
            .answer(
                CHAT,
                USER,
                QuizAnswer::choice(question.name.number, question.name.number),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::StaleAnswer));
    }

    /// Starts a new quiz in the same chat while the final feedback is being
    /// rendered.
    struct RestartingTransport {
        inner: MemoryTransport,
        quiz: QuizService,
        restarted: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl ChatTransport for RestartingTransport {
        async fn send_message(&self, chat: ChatId, reply: &Reply) -> Result<MessageId, TransportError> {
            self.inner.send_message(chat, reply).await
        }

        async fn edit_message(
            &self,
            chat: ChatId,
            message: MessageId,
            reply: &Reply,
        ) -> Result<(), TransportError> {
            if !self.restarted.swap(true, std::sync::atomic::Ordering::SeqCst) {
                self.quiz.start_quiz(chat, USER, 5).await.unwrap();
            }
            self.inner.edit_message(chat, message, reply).await
        }

        async fn delete_message(
            &self,
            chat: ChatId,
            message: MessageId,
        ) -> Result<(), TransportError> {
            self.inner.delete_message(chat, message).await
        }
    }

    #[tokio::test]
    async fn finishing_a_quiz_keeps_one_started_meanwhile() {
        let service = service(6);
        let transport = RestartingTransport {
            inner: MemoryTransport::new(),
            quiz: service.clone(),
            restarted: std::sync::atomic::AtomicBool::new(false),
        };
        let question = service.start_and_show(CHAT, USER, 1, &transport).await.unwrap();

        let outcome = service
            .answer_and_show(
                CHAT,
                USER,
                QuizAnswer::choice(question.name.number, question.name.number),
                &transport,
            )
            .await
            .unwrap();

        assert!(outcome.finished());
        assert_eq!(service.sessions().get(CHAT).len(), 5);
    }

    #[tokio::test]
    async fn abandon_clears_session() {
        let service = service(6);
        let transport = MemoryTransport::new();
        service.start_and_show(CHAT, USER, 2, &transport).await.unwrap();

        assert!(service.abandon(CHAT));
        assert!(service.sessions().get(CHAT).is_empty());
        assert_eq!(service.sessions().get_message_id(CHAT), None);
        assert!(!service.abandon(CHAT));
    }
}
