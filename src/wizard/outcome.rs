use crate::errors::{SubmissionError, ValidationError};
use crate::submission::{Ack, SubmissionPayload};
use crate::wizard::Phase;

/// Result of [`advance`](super::FormWizard::advance) and
/// [`retreat`](super::FormWizard::retreat).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepTransition {
    Advanced { from: usize, to: usize },
    Retreated { from: usize, to: usize },
    /// The current step failed validation; nothing moved.
    Invalid(Vec<ValidationError>),
    /// Already at the first (retreat) or last (advance) step.
    AtBoundary,
    /// The current phase does not accept transitions.
    Rejected(Phase),
}

impl StepTransition {
    pub fn moved(&self) -> bool {
        matches!(
            self,
            StepTransition::Advanced { .. } | StepTransition::Retreated { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Completed(Ack),
    Invalid(Vec<ValidationError>),
    Failed(SubmissionError),
    NotAtFinalStep { current: usize, total: usize },
    /// Duplicate or out-of-phase call; nothing was sent.
    Ignored(Phase),
}

/// A submission that has entered the `Submitting` phase and awaits the
/// backend's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub(crate) ticket: u64,
    pub payload: SubmissionPayload,
}
