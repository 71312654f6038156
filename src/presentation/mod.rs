//! Presentation layer contract and an in-memory implementation.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::errors::PresentationError;
use crate::wizard::Phase;

pub type PresentationResult = Result<(), PresentationError>;

/// Rendering surface driven by the wizard. The wizard never reads layout state
/// back except raw widget values through [`Presentation::read_field`].
pub trait Presentation {
    fn show_step(&mut self, index: usize, total: usize) -> PresentationResult;

    fn render_field_error(&mut self, field: &str, message: &str) -> PresentationResult;

    fn render_field_success(&mut self, field: &str) -> PresentationResult;

    fn render_phase(&mut self, phase: Phase) -> PresentationResult;

    /// Current raw value of a widget; empty when nothing was entered.
    fn read_field(&self, field: &str) -> Result<String, PresentationError>;

    /// Reflects a value back into the widget: an as-you-type formatted text or
    /// the option chosen for a choice group.
    fn render_field_value(&mut self, _field: &str, _value: &str) -> PresentationResult {
        Ok(())
    }

    fn announce_progress(&mut self, _message: &str) -> PresentationResult {
        Ok(())
    }

    fn render_retry(&mut self, _message: &str) -> PresentationResult {
        Ok(())
    }

    /// Static contact affordance shown once the form can no longer be driven.
    fn render_fallback(&mut self, contact: &str) -> PresentationResult;
}

/// Everything a [`HeadlessPresentation`] has been asked to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderLog {
    pub steps_shown: Vec<usize>,
    /// Currently displayed error per field.
    pub errors: BTreeMap<String, String>,
    pub successes: Vec<String>,
    pub phases: Vec<Phase>,
    pub progress: Vec<String>,
    pub retry_prompts: Vec<String>,
    pub fallback: Option<String>,
}

/// Map-backed presentation without any UI. Clones share the field buffer and
/// render log, so a host can keep typing into fields while the wizard owns its
/// copy.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPresentation {
    fields: Rc<RefCell<BTreeMap<String, String>>>,
    log: Rc<RefCell<RenderLog>>,
}

impl HeadlessPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the user typing into (or picking) a widget.
    pub fn set_field(&self, field: &str, value: impl Into<String>) {
        self.fields
            .borrow_mut()
            .insert(field.to_string(), value.into());
    }

    pub fn field(&self, field: &str) -> Option<String> {
        self.fields.borrow().get(field).cloned()
    }

    pub fn log(&self) -> RenderLog {
        self.log.borrow().clone()
    }

    pub fn error_for(&self, field: &str) -> Option<String> {
        self.log.borrow().errors.get(field).cloned()
    }
}

impl Presentation for HeadlessPresentation {
    fn show_step(&mut self, index: usize, _total: usize) -> PresentationResult {
        self.log.borrow_mut().steps_shown.push(index);
        Ok(())
    }

    fn render_field_error(&mut self, field: &str, message: &str) -> PresentationResult {
        self.log
            .borrow_mut()
            .errors
            .insert(field.to_string(), message.to_string());
        Ok(())
    }

    fn render_field_success(&mut self, field: &str) -> PresentationResult {
        let mut log = self.log.borrow_mut();
        log.errors.remove(field);
        log.successes.push(field.to_string());
        Ok(())
    }

    fn render_phase(&mut self, phase: Phase) -> PresentationResult {
        self.log.borrow_mut().phases.push(phase);
        Ok(())
    }

    fn read_field(&self, field: &str) -> Result<String, PresentationError> {
        Ok(self.field(field).unwrap_or_default())
    }

    fn render_field_value(&mut self, field: &str, value: &str) -> PresentationResult {
        self.set_field(field, value);
        Ok(())
    }

    fn announce_progress(&mut self, message: &str) -> PresentationResult {
        self.log.borrow_mut().progress.push(message.to_string());
        Ok(())
    }

    fn render_retry(&mut self, message: &str) -> PresentationResult {
        self.log
            .borrow_mut()
            .retry_prompts
            .push(message.to_string());
        Ok(())
    }

    fn render_fallback(&mut self, contact: &str) -> PresentationResult {
        self.log.borrow_mut().fallback = Some(contact.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_fields_and_log() {
        let host = HeadlessPresentation::new();
        let mut owned = host.clone();

        host.set_field("zipcode", "12345");
        assert_eq!(owned.read_field("zipcode").unwrap(), "12345");
        assert_eq!(owned.read_field("email").unwrap(), "");

        owned.render_field_error("zipcode", "bad").unwrap();
        assert_eq!(host.error_for("zipcode").as_deref(), Some("bad"));
        owned.render_field_success("zipcode").unwrap();
        assert!(host.error_for("zipcode").is_none());
    }
}
