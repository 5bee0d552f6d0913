use std::sync::Mutex;

/// One-way sink for transient user notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Prints notifications to stderr so stdout stays machine-readable.
pub struct ConsoleNotifier {
    pub quiet: bool,
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, message: &str) {
        if !self.quiet {
            eprintln!("{title} {message}");
        }
    }
}

/// Keeps every notification it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<(String, String)> {
        std::mem::take(&mut *self.seen.lock().unwrap_or_else(std::sync::PoisonError::into_inner))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((title.to_string(), message.to_string()));
    }
}
