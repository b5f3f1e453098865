//! Transport that renders replies to stdout, for running the bot from a shell.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use names_core::model::{ChatId, MessageId};
use services::{ChatTransport, MenuAction, Reply, TransportError};

#[derive(Default)]
struct Posted {
    next_id: i32,
    live: HashSet<(ChatId, MessageId)>,
}

#[derive(Default)]
pub struct ConsoleTransport {
    posted: Mutex<Posted>,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn print(header: &str, reply: &Reply) {
        println!("── {header} ──");
        println!("{}", reply.text);
        if !reply.actions.is_empty() {
            let buttons: Vec<String> = reply.actions.iter().map(action_label).collect();
            println!("[{}]", buttons.join("] ["));
        }
        println!();
    }
}

fn action_label(action: &MenuAction) -> String {
    match action {
        MenuAction::Choose(number) => format!("#{number}"),
        MenuAction::Knew => "I knew it (y)".to_owned(),
        MenuAction::DidNotKnow => "I didn't (n)".to_owned(),
        MenuAction::StartQuiz => "Quiz".to_owned(),
        MenuAction::ShowProgress => "Progress".to_owned(),
        MenuAction::OpenSettings => "Settings".to_owned(),
        MenuAction::LearnToday => "Learn".to_owned(),
        MenuAction::DismissReminder => "Dismiss".to_owned(),
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send_message(&self, chat: ChatId, reply: &Reply) -> Result<MessageId, TransportError> {
        let id = {
            let mut posted = self.posted.lock().unwrap_or_else(PoisonError::into_inner);
            posted.next_id += 1;
            let id = MessageId::new(posted.next_id);
            posted.live.insert((chat, id));
            id
        };
        Self::print(&format!("chat {chat} · message {id}"), reply);
        Ok(id)
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        reply: &Reply,
    ) -> Result<(), TransportError> {
        let known = self
            .posted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .live
            .contains(&(chat, message));
        if !known {
            return Err(TransportError::MessageNotFound);
        }
        Self::print(&format!("chat {chat} · message {message} (edited)"), reply);
        Ok(())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), TransportError> {
        let removed = self
            .posted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .live
            .remove(&(chat, message));
        if !removed {
            return Err(TransportError::MessageNotFound);
        }
        tracing::debug!(chat = %chat, message = %message, "message deleted");
        Ok(())
    }
}
