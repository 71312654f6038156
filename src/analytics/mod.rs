//! Fire-and-forget analytics sinks.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::errors::AnalyticsError;

pub type Attributes = BTreeMap<String, String>;

pub const FORM_START: &str = "form_start";
pub const STEP_VIEW: &str = "form_step_view";
pub const STEP_COMPLETE: &str = "form_step_complete";
pub const FORM_SUBMIT: &str = "form_submit";
pub const CONVERSION: &str = "conversion";
pub const EXCEPTION: &str = "exception";

/// Destination for analytics events. Implementations may fail; callers must
/// treat every failure as non-fatal.
pub trait AnalyticsSink {
    fn emit(&self, event: &str, attributes: &Attributes) -> Result<(), AnalyticsError>;
}

/// Logs every event through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn emit(&self, event: &str, attributes: &Attributes) -> Result<(), AnalyticsError> {
        tracing::info!(target: "quote_wizard::analytics", event, ?attributes, "analytics event");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub name: String,
    pub attributes: Attributes,
}

/// Keeps events in memory. Clones share the same buffer, so a host can keep a
/// handle while the wizard owns the sink.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.name == name)
            .count()
    }

    pub fn last(&self, name: &str) -> Option<RecordedEvent> {
        self.events
            .borrow()
            .iter()
            .rev()
            .find(|event| event.name == name)
            .cloned()
    }
}

impl AnalyticsSink for MemorySink {
    fn emit(&self, event: &str, attributes: &Attributes) -> Result<(), AnalyticsError> {
        self.events.borrow_mut().push(RecordedEvent {
            name: event.to_string(),
            attributes: attributes.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_clones_share_events() {
        let sink = MemorySink::new();
        let handle = sink.clone();
        let mut attributes = Attributes::new();
        attributes.insert("step_number".into(), "1".into());

        sink.emit(STEP_COMPLETE, &attributes).unwrap();
        sink.emit(STEP_VIEW, &Attributes::new()).unwrap();

        assert_eq!(handle.count(STEP_COMPLETE), 1);
        assert_eq!(
            handle.last(STEP_COMPLETE).unwrap().attributes["step_number"],
            "1"
        );
        assert_eq!(handle.events().len(), 2);
    }
}
