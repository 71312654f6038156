//! Declarative description of a multi-step form: fields, their rules, and the
//! steps that gate them.

pub mod quote;
pub mod rules;

use std::fmt;

pub use quote::quote_form;
pub use rules::FieldRule;

/// Raw value currently held by an input widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Exclusive-choice group: the selected option's value, if any.
    Choice(Option<String>),
}

impl FieldValue {
    /// Trimmed text, or the selected option value (empty when nothing is selected).
    pub fn as_input(&self) -> &str {
        match self {
            FieldValue::Text(value) => value.trim(),
            FieldValue::Choice(selected) => selected.as_deref().unwrap_or(""),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_input().is_empty()
    }
}

/// Single option of an exclusive-choice group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Widget kinds supported by the wizard.
#[derive(Clone)]
pub enum FieldKind {
    Text {
        /// Keystroke validation is coalesced instead of running per input event.
        debounced: bool,
        /// As-you-type formatter reflected back to the widget.
        live_format: Option<fn(&str) -> String>,
    },
    Choice(Vec<ChoiceOption>),
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text {
                debounced,
                live_format,
            } => f
                .debug_struct("Text")
                .field("debounced", debounced)
                .field("live_format", &live_format.is_some())
                .finish(),
            FieldKind::Choice(options) => f.debug_tuple("Choice").field(options).finish(),
        }
    }
}

impl FieldKind {
    pub fn is_choice(&self) -> bool {
        matches!(self, FieldKind::Choice(_))
    }

    pub fn empty_value(&self) -> FieldValue {
        match self {
            FieldKind::Text { .. } => FieldValue::Text(String::new()),
            FieldKind::Choice(_) => FieldValue::Choice(None),
        }
    }

    /// Resolves user input to a declared option, by value or label, ignoring case.
    pub fn resolve_option(&self, input: &str) -> Option<&ChoiceOption> {
        let FieldKind::Choice(options) = self else {
            return None;
        };
        let needle = input.trim();
        options.iter().find(|option| {
            option.value.eq_ignore_ascii_case(needle) || option.label.eq_ignore_ascii_case(needle)
        })
    }
}

/// Declarative description of a single form field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub rule: FieldRule,
    pub help: Option<&'static str>,
}

impl FieldDescriptor {
    pub fn text(key: &'static str, label: &'static str, rule: FieldRule) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Text {
                debounced: true,
                live_format: None,
            },
            rule,
            help: None,
        }
    }

    pub fn choice(
        key: &'static str,
        label: &'static str,
        options: Vec<ChoiceOption>,
        rule: FieldRule,
    ) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Choice(options),
            rule,
            help: None,
        }
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub fn with_live_format(mut self, format: fn(&str) -> String) -> Self {
        if let FieldKind::Text { live_format, .. } = &mut self.kind {
            *live_format = Some(format);
        }
        self
    }

    /// Validates on change rather than through the debouncer.
    pub fn immediate(mut self) -> Self {
        if let FieldKind::Text { debounced, .. } = &mut self.kind {
            *debounced = false;
        }
        self
    }

    pub fn is_debounced(&self) -> bool {
        matches!(self.kind, FieldKind::Text { debounced: true, .. })
    }
}

/// One screen of the form.
#[derive(Debug, Clone)]
pub struct StepDescriptor {
    /// 1-based position.
    pub index: usize,
    pub title: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone)]
pub struct FormDescriptor {
    pub name: &'static str,
    pub steps: Vec<StepDescriptor>,
}

impl FormDescriptor {
    pub fn new(name: &'static str, steps: Vec<StepDescriptor>) -> Self {
        Self { name, steps }
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, index: usize) -> Option<&StepDescriptor> {
        index
            .checked_sub(1)
            .and_then(|position| self.steps.get(position))
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.steps.iter().flat_map(|step| step.fields.iter())
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields().find(|field| field.key == key)
    }

    /// Step index declaring `key`.
    pub fn step_of(&self, key: &str) -> Option<usize> {
        self.steps
            .iter()
            .find(|step| step.fields.iter().any(|field| field.key == key))
            .map(|step| step.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_resolution_matches_value_or_label() {
        let kind = FieldKind::Choice(vec![
            ChoiceOption::new("yes", "Yes, I'm insured"),
            ChoiceOption::new("no", "No"),
        ]);
        assert_eq!(kind.resolve_option("YES").unwrap().value, "yes");
        assert_eq!(kind.resolve_option("no").unwrap().value, "no");
        assert_eq!(
            kind.resolve_option("yes, i'm insured").unwrap().value,
            "yes"
        );
        assert!(kind.resolve_option("maybe").is_none());
    }

    #[test]
    fn choice_value_without_selection_is_empty() {
        assert!(FieldValue::Choice(None).is_empty());
        assert!(FieldValue::Text("   ".into()).is_empty());
        assert_eq!(FieldValue::Text("  Jane ".into()).as_input(), "Jane");
    }
}
