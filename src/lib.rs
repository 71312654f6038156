#![doc(test(attr(deny(warnings))))]

//! Quote Wizard drives a multi-step lead-capture form: per-field validation,
//! gated step navigation, and a single guarded submission, with presentation,
//! analytics and the submission backend behind traits.

pub mod analytics;
pub mod cli;
pub mod config;
pub mod errors;
pub mod form;
pub mod presentation;
pub mod storage;
pub mod submission;
pub mod utils;
pub mod wizard;

pub use config::{ConfigManager, WizardConfig};
pub use errors::{SubmissionError, ValidationError, WizardError};
pub use wizard::{Collaborators, FormWizard, Phase, StepTransition, SubmissionOutcome};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Quote Wizard tracing initialized.");
    });
}
