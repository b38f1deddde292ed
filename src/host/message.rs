//! Scripted message box and focus handler for the headless host.

use super::demo::Journal;
use crate::message::{FocusHandler, Message, MessageBox, MessageBoxResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Answers message boxes from a queue, falling back to the message's own default.
pub struct ScriptedMessageBox {
    journal: Arc<Journal>,
    answers: Mutex<VecDeque<MessageBoxResult>>,
    shown: Mutex<Vec<Message>>,
}

impl ScriptedMessageBox {
    pub fn new(journal: Arc<Journal>) -> Self {
        Self {
            journal,
            answers: Mutex::new(VecDeque::new()),
            shown: Mutex::new(Vec::new()),
        }
    }

    /// Queue answers for the next message boxes.
    pub fn queue(&self, answers: impl IntoIterator<Item = MessageBoxResult>) {
        self.answers.lock().extend(answers);
    }

    pub fn pending(&self) -> usize {
        self.answers.lock().len()
    }

    /// Every message shown so far.
    pub fn shown(&self) -> Vec<Message> {
        self.shown.lock().clone()
    }
}

#[async_trait]
impl MessageBox for ScriptedMessageBox {
    async fn show(&self, message: Message) -> MessageBoxResult {
        let answer = self
            .answers
            .lock()
            .pop_front()
            .filter(|answer| message.button.accepts(*answer))
            .unwrap_or_else(|| message.fallback());
        self.journal.record(format!(
            "message \"{}\" ({:?}) answered {}",
            message.text, message.icon, answer
        ));
        self.shown.lock().push(message);
        answer
    }
}

/// Records focus requests in the journal; every non-empty name succeeds.
pub struct JournalFocus {
    journal: Arc<Journal>,
}

impl JournalFocus {
    pub fn new(journal: Arc<Journal>) -> Self {
        Self { journal }
    }
}

impl FocusHandler for JournalFocus {
    fn focus(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        self.journal.record(format!("focus {name}"));
        true
    }
}
