//! Capture `tracing` events so tests can assert on what was logged.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// One captured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    /// Event level.
    pub level: Level,
    /// Module path or explicit target.
    pub target: String,
    /// Rendered `message` field.
    pub message: String,
}

/// Collects events emitted while [`LogCapture::capture`] runs.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl LogCapture {
    /// Empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with this capture installed as the thread's default subscriber.
    pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let subscriber = Registry::default().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    /// All events captured so far.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.lock().clone()
    }

    /// Number of events at exactly `level`.
    pub fn count(&self, level: Level) -> usize {
        self.lock().iter().filter(|event| event.level == level).count()
    }

    /// Messages logged at exactly `level`, oldest first.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|event| event.level == level)
            .map(|event| event.message.clone())
            .collect()
    }

    /// Whether any event at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lock()
            .iter()
            .any(|event| event.level == level && event.message.contains(needle))
    }

    /// Forget everything captured so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CapturedEvent>> {
        // A panicking test thread must not hide the log from the assertions.
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        self.lock().push(CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.finish(),
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else {
            format!("{} {}", self.message, self.fields.join(" "))
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={value}", field.name()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={value:?}", field.name()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_events_by_level() {
        let logs = LogCapture::new();
        logs.capture(|| {
            tracing::warn!("first warning");
            tracing::warn!(attempt = 3, "second warning");
            tracing::error!("Teleport failed for {}", "Alex");
            tracing::info!("noise");
        });
        assert_eq!(logs.count(Level::WARN), 2);
        assert_eq!(logs.count(Level::ERROR), 1);
        assert_eq!(logs.messages(Level::ERROR), vec!["Teleport failed for Alex"]);
        assert!(logs.contains(Level::WARN, "attempt=3"));

        logs.clear();
        assert!(logs.events().is_empty());
    }

    #[test]
    fn nothing_is_captured_outside_the_closure() {
        let logs = LogCapture::new();
        tracing::error!("not captured");
        assert_eq!(logs.count(Level::ERROR), 0);
    }
}
