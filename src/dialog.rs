//! Message boxes shown to the user. The front end decides how they look.

use parking_lot::Mutex;

pub trait Dialogs: Send + Sync {
    fn info(&self, title: &str, message: &str, detail: &str);
    fn error(&self, title: &str, message: &str);
    /// Yes/No question. Blocks until answered.
    fn confirm(&self, title: &str, message: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Info { title: String, message: String, detail: String },
    Error { title: String, message: String },
    Confirm { title: String, message: String },
}

/// Records every dialog and answers confirmations with a fixed reply.
#[derive(Debug)]
pub struct RecordedDialogs {
    shown: Mutex<Vec<Shown>>,
    answer: bool,
}

impl RecordedDialogs {
    pub fn answering(answer: bool) -> Self {
        Self {
            shown: Mutex::new(Vec::new()),
            answer,
        }
    }

    pub fn shown(&self) -> Vec<Shown> {
        self.shown.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.shown
            .lock()
            .iter()
            .filter_map(|d| match d {
                Shown::Error { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Dialogs for RecordedDialogs {
    fn info(&self, title: &str, message: &str, detail: &str) {
        self.shown.lock().push(Shown::Info {
            title: title.to_string(),
            message: message.to_string(),
            detail: detail.to_string(),
        });
    }

    fn error(&self, title: &str, message: &str) {
        self.shown.lock().push(Shown::Error {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        self.shown.lock().push(Shown::Confirm {
            title: title.to_string(),
            message: message.to_string(),
        });
        self.answer
    }
}
