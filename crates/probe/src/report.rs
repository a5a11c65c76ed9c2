//! Report Observer
//!
//! Steps and attachments (request payloads, response bodies) are pushed
//! to an injected [`ReportSink`]. Sinks never influence control flow: a
//! sink that drops everything yields the same run as one that records.

use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Content type of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// JSON document
    Json,
    /// Plain text
    Text,
}

/// A named blob attached to the current step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// Attachment name
    pub name: String,
    /// Content type
    pub kind: AttachmentKind,
    /// Raw body
    pub body: String,
}

impl Attachment {
    /// JSON attachment
    #[must_use]
    pub fn json(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttachmentKind::Json,
            body: body.into(),
        }
    }

    /// Plain-text attachment
    #[must_use]
    pub fn text(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttachmentKind::Text,
            body: body.into(),
        }
    }
}

/// Observer receiving steps and attachments
pub trait ReportSink: Send + Sync + std::fmt::Debug {
    /// A named step started
    fn step(&self, name: &str);

    /// Attach a blob to the current step
    fn attach(&self, attachment: Attachment);
}

/// Shared sink handle
pub type SharedSink = Arc<dyn ReportSink>;

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn step(&self, _name: &str) {}

    fn attach(&self, _attachment: Attachment) {}
}

/// Emits steps and attachments as tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn step(&self, name: &str) {
        tracing::info!(step = name, "step");
    }

    fn attach(&self, attachment: Attachment) {
        tracing::debug!(
            name = %attachment.name,
            kind = ?attachment.kind,
            body = %attachment.body,
            "attachment"
        );
    }
}

/// A recorded report event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ReportEvent {
    /// Step marker
    Step {
        /// Step name
        name: String,
    },
    /// Attachment
    Attach(Attachment),
}

/// Keeps every event in memory, optionally forwarding to another sink
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ReportEvent>>,
    forward: Option<SharedSink>,
}

impl MemorySink {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also forward every event to `sink`
    #[must_use]
    pub fn forwarding_to(mut self, sink: SharedSink) -> Self {
        self.forward = Some(sink);
        self
    }

    /// Snapshot of recorded events
    #[must_use]
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Recorded attachments only
    #[must_use]
    pub fn attachments(&self) -> Vec<Attachment> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::Attach(a) => Some(a),
                ReportEvent::Step { .. } => None,
            })
            .collect()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<ReportEvent> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }

    fn push(&self, event: ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ReportSink for MemorySink {
    fn step(&self, name: &str) {
        self.push(ReportEvent::Step {
            name: name.to_string(),
        });
        if let Some(ref forward) = self.forward {
            forward.step(name);
        }
    }

    fn attach(&self, attachment: Attachment) {
        if let Some(ref forward) = self.forward {
            forward.attach(attachment.clone());
        }
        self.push(ReportEvent::Attach(attachment));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.step("add product");
        sink.attach(Attachment::json("payload", r#"{"id":1}"#));
        sink.attach(Attachment::text("response", ""));

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            ReportEvent::Step {
                name: "add product".to_string()
            }
        );
        assert_eq!(sink.attachments()[1].kind, AttachmentKind::Text);
    }

    #[test]
    fn test_memory_sink_drain() {
        let sink = MemorySink::new();
        sink.step("one");
        assert_eq!(sink.drain().len(), 1);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_forwarding() {
        let inner = Arc::new(MemorySink::new());
        let outer = MemorySink::new().forwarding_to(inner.clone());
        outer.attach(Attachment::text("body", "ok"));
        assert_eq!(inner.attachments().len(), 1);
        assert_eq!(outer.attachments().len(), 1);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&ReportEvent::Attach(Attachment::json("p", "{}"))).unwrap();
        assert!(json.contains(r#""event":"attach""#));
        assert!(json.contains(r#""kind":"json""#));
    }

    #[test]
    fn test_null_and_tracing_sinks_accept_events() {
        NullSink.step("x");
        NullSink.attach(Attachment::text("a", "b"));
        TracingSink.step("x");
        TracingSink.attach(Attachment::text("a", "b"));
    }
}
