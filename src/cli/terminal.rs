//! Presentation layer that prints to the terminal.

use crate::cli::output;
use crate::errors::PresentationError;
use crate::form::FormDescriptor;
use crate::presentation::{HeadlessPresentation, Presentation, PresentationResult};
use crate::wizard::Phase;

/// Prints every render request and keeps widget values in a shared
/// [`HeadlessPresentation`] buffer that the shell commands write into.
pub struct TerminalPresentation {
    buffer: HeadlessPresentation,
    titles: Vec<&'static str>,
    labels: Vec<(&'static str, &'static str)>,
}

impl TerminalPresentation {
    pub fn new(buffer: HeadlessPresentation, form: &FormDescriptor) -> Self {
        Self {
            buffer,
            titles: form.steps.iter().map(|step| step.title).collect(),
            labels: form.fields().map(|field| (field.key, field.label)).collect(),
        }
    }

    fn label_of<'a>(&self, field: &'a str) -> &'a str {
        self.labels
            .iter()
            .find(|(key, _)| *key == field)
            .map(|(_, label)| *label)
            .unwrap_or(field)
    }
}

/// Share of the form reached at step `index`, rounded down.
fn progress_percent(index: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    index.min(total) * 100 / total
}

fn step_heading(index: usize, total: usize, title: &str) -> String {
    format!(
        "Step {} of {} ({}%): {}",
        index,
        total,
        progress_percent(index, total),
        title
    )
}

impl Presentation for TerminalPresentation {
    fn show_step(&mut self, index: usize, total: usize) -> PresentationResult {
        let title = self
            .titles
            .get(index.wrapping_sub(1))
            .ok_or_else(|| PresentationError(format!("no title for step {}", index)))?;
        output::section(step_heading(index, total, title));
        Ok(())
    }

    fn render_field_error(&mut self, field: &str, message: &str) -> PresentationResult {
        output::warning(format!("{}: {}", self.label_of(field), message));
        Ok(())
    }

    fn render_field_success(&mut self, field: &str) -> PresentationResult {
        output::success(format!("{} looks good", self.label_of(field)));
        Ok(())
    }

    fn render_phase(&mut self, phase: Phase) -> PresentationResult {
        match phase {
            Phase::Submitting => output::info("Sending your quote request..."),
            Phase::Completed => output::success("Quote request complete."),
            Phase::Failed => output::error("Quote request failed."),
            Phase::Idle | Phase::Validating => {}
        }
        Ok(())
    }

    fn read_field(&self, field: &str) -> Result<String, PresentationError> {
        self.buffer.read_field(field)
    }

    fn render_field_value(&mut self, field: &str, value: &str) -> PresentationResult {
        self.buffer.render_field_value(field, value)?;
        if !value.is_empty() {
            output::info(format!("{}: {}", self.label_of(field), value));
        }
        Ok(())
    }

    fn announce_progress(&mut self, message: &str) -> PresentationResult {
        output::info(message);
        Ok(())
    }

    fn render_retry(&mut self, message: &str) -> PresentationResult {
        output::warning(message);
        Ok(())
    }

    fn render_fallback(&mut self, contact: &str) -> PresentationResult {
        output::error(format!(
            "We're having trouble with the form. Call us at {} for a quote.",
            contact
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_heading_carries_completion_percentage() {
        assert_eq!(
            step_heading(1, 4, "Where do you live?"),
            "Step 1 of 4 (25%): Where do you live?"
        );
        assert_eq!(step_heading(4, 4, "About you"), "Step 4 of 4 (100%): About you");
    }

    #[test]
    fn percentage_rounds_down_and_tolerates_empty_forms() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(1, 0), 0);
    }
}
