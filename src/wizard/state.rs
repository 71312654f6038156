use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::form::FieldValue;

/// Submission lifecycle, orthogonal to step position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Validating,
    Submitting,
    Completed,
    Failed,
}

impl Phase {
    /// Field edits and step transitions are only honoured while idle.
    pub fn accepts_input(self) -> bool {
        matches!(self, Phase::Idle)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Validating => "validating",
            Phase::Submitting => "submitting",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-field widget state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldState {
    pub value: FieldValue,
    /// Outcome of the last validation of the current value.
    pub valid: bool,
    pub touched: bool,
}

impl FieldState {
    pub fn new(value: FieldValue) -> Self {
        Self {
            value,
            valid: false,
            touched: false,
        }
    }
}

/// Step position and the values collected from validated steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    current_step: usize,
    total_steps: usize,
    collected: BTreeMap<String, String>,
}

impl WizardState {
    pub fn new(total_steps: usize) -> Self {
        Self {
            current_step: 1,
            total_steps: total_steps.max(1),
            collected: BTreeMap::new(),
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn collected(&self) -> &BTreeMap<String, String> {
        &self.collected
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step == 1
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == self.total_steps
    }

    /// Moves one step forward; `false` (and no change) at the last step.
    pub(crate) fn step_forward(&mut self) -> bool {
        if self.is_last_step() {
            return false;
        }
        self.current_step += 1;
        true
    }

    /// Moves one step back; `false` (and no change) at the first step.
    pub(crate) fn step_back(&mut self) -> bool {
        if self.is_first_step() {
            return false;
        }
        self.current_step -= 1;
        true
    }

    /// Replaces the entries of a validated step. Empty values from optional
    /// fields drop any earlier entry.
    pub(crate) fn merge(&mut self, values: BTreeMap<String, String>) {
        for (field, value) in values {
            if value.is_empty() {
                self.collected.remove(&field);
            } else {
                self.collected.insert(field, value);
            }
        }
    }
}
