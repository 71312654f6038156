#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use quote_wizard::{
    analytics::{AnalyticsSink, Attributes, MemorySink},
    errors::{AnalyticsError, PresentationError, SubmissionError},
    presentation::{HeadlessPresentation, Presentation, PresentationResult},
    storage::SnapshotStore,
    submission::{Ack, SubmissionBackend, SubmissionPayload},
    wizard::{Collaborators, FormWizard, Phase},
    WizardConfig,
};
use tempfile::TempDir;

pub const STEP_ONE: [(&str, &str); 2] = [("zipcode", "90210"), ("currently_insured", "yes")];
pub const STEP_TWO: [(&str, &str); 2] = [("vehicle_year", "2020"), ("vehicle_make", "Toyota")];
pub const STEP_THREE: [(&str, &str); 3] = [
    ("dob", "1985-03-02"),
    ("gender", "male"),
    ("marital_status", "married"),
];
pub const STEP_FOUR: [(&str, &str); 3] = [
    ("full_name", "John Smith"),
    ("phone", "555.123.4567"),
    ("email", "john@example.com"),
];

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date")
}

/// Wizard wired to in-memory collaborators, with handles the test keeps.
pub struct Harness {
    pub wizard: FormWizard,
    pub ui: HeadlessPresentation,
    pub sink: MemorySink,
    pub snapshots: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(WizardConfig::default())
    }

    pub fn with_config(config: WizardConfig) -> Self {
        let ui = HeadlessPresentation::new();
        let sink = MemorySink::new();
        let snapshots = TempDir::new().expect("create snapshot dir");
        let wizard = FormWizard::new(
            config,
            today(),
            Collaborators {
                presentation: Box::new(ui.clone()),
                analytics: Box::new(sink.clone()),
                snapshot: Some(SnapshotStore::new(snapshots.path().to_path_buf())),
            },
        )
        .expect("mount wizard");
        Self {
            wizard,
            ui,
            sink,
            snapshots,
        }
    }

    /// Types each value into its widget, fires the change event and leaves
    /// the field.
    pub fn fill(&mut self, values: &[(&str, &str)]) {
        for (field, value) in values {
            self.ui.set_field(field, *value);
            self.wizard
                .input(field, Instant::now())
                .expect("known field");
            self.wizard.blur(field).expect("known field");
        }
    }

    /// Pastes `raw` into a text widget and leaves it without any change event,
    /// returning whether the field validated.
    pub fn paste_and_leave(&mut self, field: &str, raw: &str) -> bool {
        self.ui.set_field(field, raw);
        self.wizard.blur(field).expect("known field")
    }

    /// Fills and advances through the first three steps.
    pub fn reach_final_step(&mut self) {
        for step in [&STEP_ONE[..], &STEP_TWO[..], &STEP_THREE[..]] {
            self.fill(step);
            assert!(self.wizard.advance().moved(), "step should advance");
        }
        assert_eq!(self.wizard.phase(), Phase::Idle);
    }

    pub fn ready_to_submit(mut self) -> Self {
        self.reach_final_step();
        self.fill(&STEP_FOUR);
        self
    }

    pub fn snapshot_path(&self) -> std::path::PathBuf {
        SnapshotStore::new(self.snapshots.path().to_path_buf())
            .path_for(&self.wizard.config().snapshot_key)
    }
}

/// Backend that answers from a queue of scripted results and records every
/// payload it receives.
#[derive(Default)]
pub struct ScriptedBackend {
    answers: Mutex<Vec<Result<(), String>>>,
    received: Mutex<Vec<SubmissionPayload>>,
}

impl ScriptedBackend {
    /// Accepts every call.
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Rejects the first call with `cause`, then accepts.
    pub fn rejecting_once(cause: &str) -> Self {
        Self {
            answers: Mutex::new(vec![Err(cause.to_string())]),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn received(&self) -> Vec<SubmissionPayload> {
        self.received.lock().expect("lock payloads").clone()
    }
}

#[async_trait]
impl SubmissionBackend for ScriptedBackend {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<Ack, SubmissionError> {
        self.received
            .lock()
            .expect("lock payloads")
            .push(payload.clone());
        let answer = {
            let mut answers = self.answers.lock().expect("lock answers");
            if answers.is_empty() {
                Ok(())
            } else {
                answers.remove(0)
            }
        };
        answer
            .map(|_| Ack {
                reference: format!("TEST-{}", self.received.lock().expect("lock payloads").len()),
                received_at: Utc::now(),
            })
            .map_err(SubmissionError::new)
    }
}

/// Sink that fails on every event.
pub struct BrokenSink;

impl AnalyticsSink for BrokenSink {
    fn emit(&self, event: &str, _attributes: &Attributes) -> Result<(), AnalyticsError> {
        Err(AnalyticsError(format!("tracker unavailable for {event}")))
    }
}

/// Presentation that delegates to a headless buffer until `broken` is set,
/// after which every step render and widget read fails.
#[derive(Clone)]
pub struct FlakyPresentation {
    pub inner: HeadlessPresentation,
    pub broken: Rc<Cell<bool>>,
}

impl FlakyPresentation {
    pub fn new() -> Self {
        Self {
            inner: HeadlessPresentation::new(),
            broken: Rc::new(Cell::new(false)),
        }
    }
}

impl Presentation for FlakyPresentation {
    fn show_step(&mut self, index: usize, total: usize) -> PresentationResult {
        if self.broken.get() {
            return Err(PresentationError("step container missing".into()));
        }
        self.inner.show_step(index, total)
    }

    fn render_field_error(&mut self, field: &str, message: &str) -> PresentationResult {
        self.inner.render_field_error(field, message)
    }

    fn render_field_success(&mut self, field: &str) -> PresentationResult {
        self.inner.render_field_success(field)
    }

    fn render_phase(&mut self, phase: Phase) -> PresentationResult {
        self.inner.render_phase(phase)
    }

    fn read_field(&self, field: &str) -> Result<String, PresentationError> {
        if self.broken.get() {
            return Err(PresentationError(format!("widget `{}` missing", field)));
        }
        self.inner.read_field(field)
    }

    fn render_field_value(&mut self, field: &str, value: &str) -> PresentationResult {
        self.inner.render_field_value(field, value)
    }

    fn render_fallback(&mut self, contact: &str) -> PresentationResult {
        self.inner.render_fallback(contact)
    }
}
