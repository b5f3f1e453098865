use std::sync::Arc;

use names_core::model::{ChatId, NameNumber, QuizMode, SettingsPatch, TOTAL_NAMES, UserId, UserProfile};
use names_core::time::fixed_now;
use services::{
    BotServices, Clock, MemoryTransport, MenuAction, QuizAnswer, QuizError, StaticCatalog,
};

const CATALOG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/names.json");

fn services() -> BotServices {
    let catalog = StaticCatalog::from_path(CATALOG).unwrap();
    BotServices::in_memory(Arc::new(catalog), Clock::fixed(fixed_now()))
}

#[test]
fn bundled_catalog_has_every_name() {
    let catalog = StaticCatalog::from_path(CATALOG).unwrap();
    assert_eq!(catalog.len(), usize::from(TOTAL_NAMES));
}

#[tokio::test]
async fn quiz_runs_in_one_message_and_updates_progress() {
    let services = services();
    let transport = MemoryTransport::new();
    let chat = ChatId::new(77);
    let user = UserId::new(77);
    services
        .users()
        .ensure_user(user, UserProfile::default())
        .await
        .unwrap();

    let quiz = services.quiz();
    let mut question = quiz.start_and_show(chat, user, 5, &transport).await.unwrap();
    loop {
        let outcome = quiz
            .answer_and_show(
                chat,
                user,
                QuizAnswer::choice(question.name.number, question.name.number),
                &transport,
            )
            .await
            .unwrap();
        match outcome.next {
            Some(next) => question = next,
            None => break,
        }
    }

    // Every answer edited the same message.
    let messages = transport.messages_in(chat);
    assert_eq!(messages.len(), 1);
    assert_eq!(transport.edits(), 5);
    let (_, last) = &messages[0];
    assert!(last.text.ends_with("Quiz complete!"));
    assert_eq!(last.actions, vec![MenuAction::StartQuiz, MenuAction::ShowProgress]);
    assert!(quiz.sessions().get(chat).is_empty());
    assert_eq!(quiz.sessions().get_message_id(chat), None);

    let summary = services.progress().get_summary(user, 3).await.unwrap();
    assert_eq!(summary.in_progress(), 5);
    assert_eq!(summary.total_attempts(), 5);
    assert_eq!(summary.total_correct(), 5);
}

#[tokio::test]
async fn duplicate_button_press_is_rejected() {
    let services = services();
    let transport = MemoryTransport::new();
    let chat = ChatId::new(1);
    let user = UserId::new(1);
    let quiz = services.quiz();

    let question = quiz.start_and_show(chat, user, 3, &transport).await.unwrap();
    let press = QuizAnswer::choice(question.name.number, question.name.number);

    quiz.answer_and_show(chat, user, press, &transport).await.unwrap();
    let err = quiz
        .answer_and_show(chat, user, press, &transport)
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::StaleAnswer));
    assert_eq!(quiz.sessions().get(chat).len(), 2);

    let progress = services
        .progress()
        .name_progress(user, question.name.number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(progress.attempt_count(), 1);
}

#[tokio::test]
async fn restarting_a_quiz_posts_a_new_message() {
    let services = services();
    let transport = MemoryTransport::new();
    let chat = ChatId::new(2);
    let user = UserId::new(2);
    let quiz = services.quiz();

    quiz.start_and_show(chat, user, 3, &transport).await.unwrap();
    let first = quiz.sessions().get_message_id(chat).unwrap();
    quiz.start_and_show(chat, user, 2, &transport).await.unwrap();
    let second = quiz.sessions().get_message_id(chat).unwrap();

    assert_ne!(first, second);
    assert_eq!(quiz.sessions().get(chat).len(), 2);
}

#[tokio::test]
async fn free_recall_quiz_and_daily_names() {
    let services = services();
    let transport = MemoryTransport::new();
    let chat = ChatId::new(3);
    let user = UserId::new(3);
    services
        .settings()
        .update(user, SettingsPatch::new().with_quiz_mode(QuizMode::FreeRecall))
        .await
        .unwrap();

    let quiz = services.quiz();
    let question = quiz.start_and_show(chat, user, 1, &transport).await.unwrap();
    let (_, shown) = &transport.messages_in(chat)[0];
    assert_eq!(shown.actions, vec![MenuAction::Knew, MenuAction::DidNotKnow]);
    assert!(!shown.text.contains(&question.name.meaning));

    let outcome = quiz
        .answer_and_show(chat, user, QuizAnswer::recalled(question.name.number, false), &transport)
        .await
        .unwrap();
    assert!(!outcome.was_correct);
    assert!(outcome.finished());

    for n in 1..=2 {
        services
            .progress()
            .mark_learned(user, NameNumber::new(n).unwrap())
            .await
            .unwrap();
    }
    let daily = services.learn_today(user).await.unwrap();
    assert!(daily.text.contains("3. "));
    assert!(!daily.text.contains("\n1. "));
}
