//! Operator notifications
//!
//! Notification delivery is an external collaborator; the core only needs a
//! best-effort sink. A failing notification must never abort a backup run,
//! so the trait is infallible and implementations swallow their own errors.

/// Best-effort notification sink
pub trait NotificationSink {
    fn notify(&self, subject: &str, message: &str);
}

/// Sink writing notifications to standard error
pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, subject: &str, message: &str) {
        eprintln!("[sitevault] {}: {}", subject, message);
    }
}

/// Sink discarding every notification
pub struct NullNotifier;

impl NotificationSink for NullNotifier {
    fn notify(&self, _subject: &str, _message: &str) {}
}
