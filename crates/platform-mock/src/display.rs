use std::sync::Mutex;
use xmlview_core::{DetailView, ErrorView};

/// Records every `(name, text)` pair shown.
#[derive(Debug, Default)]
pub struct MockDetailView {
    log: Mutex<Vec<(String, String)>>,
}

impl MockDetailView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_log(&self) -> Vec<(String, String)> {
        let mut log = self.log.lock().expect("detail log poisoned");
        log.drain(..).collect()
    }

    pub fn last(&self) -> Option<(String, String)> {
        self.log.lock().expect("detail log poisoned").last().cloned()
    }

    pub fn count(&self) -> usize {
        self.log.lock().expect("detail log poisoned").len()
    }
}

impl DetailView for MockDetailView {
    fn show_detail(&self, name: &str, text: &str) {
        self.log.lock().expect("detail log poisoned").push((name.to_owned(), text.to_owned()));
    }
}

/// Records every error message shown.
#[derive(Debug, Default)]
pub struct MockErrorView {
    messages: Mutex<Vec<String>>,
}

impl MockErrorView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_messages(&self) -> Vec<String> {
        let mut messages = self.messages.lock().expect("error log poisoned");
        messages.drain(..).collect()
    }

    pub fn count(&self) -> usize {
        self.messages.lock().expect("error log poisoned").len()
    }
}

impl ErrorView for MockErrorView {
    fn show_error(&self, message: &str) {
        self.messages.lock().expect("error log poisoned").push(message.to_owned());
    }
}
