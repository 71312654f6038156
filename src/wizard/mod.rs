//! Multi-step form state machine.
//!
//! [`FormWizard`] owns the step position, per-field state, and the submission
//! phase. Collaborators are reached only through the [`Presentation`],
//! [`AnalyticsSink`] and [`SubmissionBackend`] traits. Every mutating
//! operation takes `&mut self`, so events are processed strictly one at a time;
//! while a submission is in flight the phase is `Submitting` and every other
//! mutation is a no-op.

mod debounce;
mod outcome;
mod state;

pub use debounce::Debouncer;
pub use outcome::{PendingSubmission, StepTransition, SubmissionOutcome};
pub use state::{FieldState, Phase, WizardState};

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::analytics::{self, AnalyticsSink, Attributes};
use crate::config::WizardConfig;
use crate::errors::{PresentationError, SubmissionError, ValidationError, WizardError};
use crate::form::{quote, quote_form, FieldKind, FieldValue, FormDescriptor};
use crate::presentation::Presentation;
use crate::storage::SnapshotStore;
use crate::submission::{
    Ack, Milestone, SubmissionBackend, SubmissionMetadata, SubmissionPayload,
};

/// External collaborators handed to the wizard at mount time.
pub struct Collaborators {
    pub presentation: Box<dyn Presentation>,
    pub analytics: Box<dyn AnalyticsSink>,
    pub snapshot: Option<SnapshotStore>,
}

#[derive(Clone, Copy)]
struct FieldTraits {
    key: &'static str,
    choice: bool,
    debounced: bool,
    live_format: Option<fn(&str) -> String>,
}

pub struct FormWizard {
    config: WizardConfig,
    form: FormDescriptor,
    state: WizardState,
    fields: BTreeMap<&'static str, FieldState>,
    phase: Phase,
    debouncer: Debouncer,
    presentation: Box<dyn Presentation>,
    analytics: Box<dyn AnalyticsSink>,
    snapshot: Option<SnapshotStore>,
    started_at: DateTime<Utc>,
    started: Instant,
    in_flight: Option<u64>,
    next_ticket: u64,
    failed_payload: Option<SubmissionPayload>,
    conversion_emitted: bool,
    snapshot_written: bool,
    fallback_active: bool,
}

impl FormWizard {
    /// Mounts the auto-insurance quote form. `today` anchors the age check.
    pub fn new(
        config: WizardConfig,
        today: NaiveDate,
        collaborators: Collaborators,
    ) -> Result<Self, WizardError> {
        let form = quote_form(&config, today);
        Self::with_form(config, form, collaborators)
    }

    pub fn with_form(
        config: WizardConfig,
        form: FormDescriptor,
        collaborators: Collaborators,
    ) -> Result<Self, WizardError> {
        config.validate()?;
        if form.steps.is_empty() {
            return Err(WizardError::Config(format!(
                "form `{}` declares no steps",
                form.name
            )));
        }

        let fields = form
            .fields()
            .map(|field| (field.key, FieldState::new(field.kind.empty_value())))
            .collect();
        let debouncer = Debouncer::new(Duration::from_millis(config.debounce_ms));

        Ok(Self {
            state: WizardState::new(form.total_steps()),
            config,
            form,
            fields,
            phase: Phase::Idle,
            debouncer,
            presentation: collaborators.presentation,
            analytics: collaborators.analytics,
            snapshot: collaborators.snapshot,
            started_at: Utc::now(),
            started: Instant::now(),
            in_flight: None,
            next_ticket: 0,
            failed_payload: None,
            conversion_emitted: false,
            snapshot_written: false,
            fallback_active: false,
        })
    }

    /// Shows the first step and records the form start.
    pub fn start(&mut self) {
        let (index, total) = (self.state.current_step(), self.state.total_steps());
        self.present(|p| p.show_step(index, total));
        self.present(|p| p.render_phase(Phase::Idle));
        self.emit(analytics::FORM_START, Attributes::new());
        self.emit_step_view(index);
        info!(form = self.form.name, "form started");
    }

    pub fn form(&self) -> &FormDescriptor {
        &self.form
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Values from every step validated so far.
    pub fn collected(&self) -> &BTreeMap<String, String> {
        self.state.collected()
    }

    pub fn field_state(&self, field: &str) -> Option<&FieldState> {
        self.fields.get(field)
    }

    pub fn fallback_active(&self) -> bool {
        self.fallback_active
    }

    pub fn has_pending_validation(&self, field: &str) -> bool {
        self.debouncer.is_pending(field)
    }

    pub fn next_debounce_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    /// Validates `raw` against the rule of `field`. Pure; no rendering.
    pub fn validate_field(&self, field: &str, raw: &FieldValue) -> Result<String, ValidationError> {
        match self.form.field(field) {
            Some(descriptor) => descriptor.rule.check(raw),
            None => Err(ValidationError::new(field, "unknown field")),
        }
    }

    /// Validates every field of `step` against its current value, collecting
    /// all failures.
    pub fn validate_step(
        &self,
        step: usize,
    ) -> Result<BTreeMap<String, String>, Vec<ValidationError>> {
        let Some(descriptor) = self.form.step(step) else {
            return Err(vec![ValidationError::new(
                "step",
                format!("unknown step {}", step),
            )]);
        };

        let mut values = BTreeMap::new();
        let mut errors = Vec::new();
        for field in &descriptor.fields {
            let raw = self
                .fields
                .get(field.key)
                .map(|state| state.value.clone())
                .unwrap_or_else(|| field.kind.empty_value());
            match field.rule.check(&raw) {
                Ok(value) => {
                    values.insert(field.key.to_string(), value);
                }
                Err(err) => errors.push(err),
            }
        }

        if errors.is_empty() {
            Ok(values)
        } else {
            Err(errors)
        }
    }

    /// Validates the current step and, on success, moves to the next one.
    pub fn advance(&mut self) -> StepTransition {
        if !self.phase.accepts_input() {
            return StepTransition::Rejected(self.phase);
        }
        if self.state.is_last_step() {
            return StepTransition::AtBoundary;
        }

        let from = self.state.current_step();
        match self.validate_step_and_render(from) {
            Ok(values) => {
                self.state.merge(values);
                self.state.step_forward();
                let to = self.state.current_step();
                let total = self.state.total_steps();
                self.present(|p| p.show_step(to, total));
                self.emit(
                    analytics::STEP_COMPLETE,
                    Attributes::from([("step_number".to_string(), from.to_string())]),
                );
                self.emit_step_view(to);
                info!(from, to, "step completed");
                StepTransition::Advanced { from, to }
            }
            Err(errors) => {
                debug!(step = from, failures = errors.len(), "step validation failed");
                StepTransition::Invalid(errors)
            }
        }
    }

    /// Moves back one step without re-validating or discarding collected values.
    pub fn retreat(&mut self) -> StepTransition {
        if !self.phase.accepts_input() {
            return StepTransition::Rejected(self.phase);
        }
        let from = self.state.current_step();
        if !self.state.step_back() {
            return StepTransition::AtBoundary;
        }
        let to = self.state.current_step();
        let total = self.state.total_steps();
        self.present(|p| p.show_step(to, total));
        self.emit_step_view(to);
        StepTransition::Retreated { from, to }
    }

    /// Handles a change event on `field`. Text values are read back from the
    /// presentation; debounced fields are validated once the window elapses.
    pub fn input(&mut self, field: &str, now: Instant) -> Result<(), WizardError> {
        if !self.phase.accepts_input() {
            return Ok(());
        }
        let traits = self.traits(field)?;
        if traits.choice {
            return self.select_from_widget(traits.key);
        }

        let Some(value) = self.capture_text(traits) else {
            return Ok(());
        };
        if let Some(state) = self.fields.get_mut(traits.key) {
            state.value = FieldValue::Text(value);
            state.valid = false;
        }

        if traits.debounced {
            self.debouncer.schedule(traits.key, now);
        } else {
            self.validate_and_render(traits.key);
        }
        Ok(())
    }

    /// Sets an exclusive-choice group. `None` clears the selection.
    pub fn select(&mut self, field: &str, option: Option<&str>) -> Result<(), WizardError> {
        if !self.phase.accepts_input() {
            return Ok(());
        }
        let descriptor = self
            .form
            .field(field)
            .ok_or_else(|| WizardError::UnknownField(field.to_string()))?;
        let key = descriptor.key;

        let selection = match option {
            None => None,
            Some(raw) => {
                let resolved = descriptor.kind.resolve_option(raw).ok_or_else(|| {
                    WizardError::UnknownOption {
                        field: field.to_string(),
                        option: raw.to_string(),
                    }
                })?;
                Some(resolved.value.clone())
            }
        };

        let shown = selection.clone().unwrap_or_default();
        if let Some(state) = self.fields.get_mut(key) {
            state.value = FieldValue::Choice(selection);
            state.touched = true;
        }
        self.present(|p| p.render_field_value(key, &shown));
        self.validate_and_render(key);
        Ok(())
    }

    /// Handles focus leaving `field`: cancels any pending debounced check and
    /// validates the current value immediately. Text is taken from the widget
    /// as typed, without the as-you-type formatter.
    pub fn blur(&mut self, field: &str) -> Result<bool, WizardError> {
        let traits = self.traits(field)?;
        if !self.phase.accepts_input() {
            return Ok(self
                .fields
                .get(traits.key)
                .map(|state| state.valid)
                .unwrap_or(false));
        }
        self.debouncer.cancel(traits.key);

        // Choice groups only change through `select`; text is re-read unformatted
        // so the rule sees exactly what the widget holds.
        if !traits.choice {
            if let Some(raw) = self.read_raw(traits.key) {
                if let Some(state) = self.fields.get_mut(traits.key) {
                    state.value = FieldValue::Text(raw);
                }
            }
        }
        if let Some(state) = self.fields.get_mut(traits.key) {
            state.touched = true;
        }
        Ok(self.validate_and_render(traits.key))
    }

    /// Runs every debounced validation whose window has elapsed. Returns the
    /// number of fields validated.
    pub fn poll_debounced(&mut self, now: Instant) -> usize {
        let due = self.debouncer.take_due(now);
        if !self.phase.accepts_input() {
            return 0;
        }
        let count = due.len();
        for key in due {
            self.validate_and_render(key);
        }
        count
    }

    /// Validates the final step and sends the collected data to `backend`.
    pub async fn submit(&mut self, backend: &dyn SubmissionBackend) -> SubmissionOutcome {
        let pending = match self.begin_submission() {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };
        let result = backend.submit(&pending.payload).await;
        self.finish_submission(pending, result)
    }

    /// Re-sends the payload of a failed submission, unchanged.
    pub async fn retry(&mut self, backend: &dyn SubmissionBackend) -> SubmissionOutcome {
        let pending = match self.begin_retry() {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };
        let result = backend.submit(&pending.payload).await;
        self.finish_submission(pending, result)
    }

    /// First half of [`submit`](Self::submit): validates the final step and
    /// enters `Submitting`. Any later call returns `Ignored` until the pending
    /// submission is finished.
    pub fn begin_submission(&mut self) -> Result<PendingSubmission, SubmissionOutcome> {
        if matches!(
            self.phase,
            Phase::Submitting | Phase::Completed | Phase::Failed
        ) {
            debug!(phase = %self.phase, "duplicate submission ignored");
            return Err(SubmissionOutcome::Ignored(self.phase));
        }
        if !self.state.is_last_step() {
            return Err(SubmissionOutcome::NotAtFinalStep {
                current: self.state.current_step(),
                total: self.state.total_steps(),
            });
        }

        let step = self.state.current_step();
        let values = match self.validate_step_and_render(step) {
            Ok(values) => values,
            Err(errors) => return Err(SubmissionOutcome::Invalid(errors)),
        };
        self.state.merge(values);

        let payload = self.build_payload();
        self.emit(analytics::FORM_SUBMIT, self.submit_attributes());
        info!(
            submission_id = %payload.metadata.submission_id,
            fields = payload.fields.len(),
            "submitting quote request"
        );
        Ok(self.dispatch(payload))
    }

    /// First half of [`retry`](Self::retry).
    pub fn begin_retry(&mut self) -> Result<PendingSubmission, SubmissionOutcome> {
        if self.phase != Phase::Failed {
            return Err(SubmissionOutcome::Ignored(self.phase));
        }
        let Some(payload) = self.failed_payload.take() else {
            return Err(SubmissionOutcome::Ignored(self.phase));
        };
        info!(submission_id = %payload.metadata.submission_id, "retrying submission");
        Ok(self.dispatch(payload))
    }

    /// Second half of a submission: applies the backend's answer.
    pub fn finish_submission(
        &mut self,
        pending: PendingSubmission,
        result: Result<Ack, SubmissionError>,
    ) -> SubmissionOutcome {
        if self.phase != Phase::Submitting || self.in_flight != Some(pending.ticket) {
            return SubmissionOutcome::Ignored(self.phase);
        }
        self.in_flight = None;

        match result {
            Ok(ack) => {
                self.set_phase(Phase::Completed);
                self.announce(Milestone::Acknowledged);
                if !self.conversion_emitted {
                    self.conversion_emitted = true;
                    self.emit(
                        analytics::CONVERSION,
                        Attributes::from([("event_label".to_string(), "Lead Generated".to_string())]),
                    );
                }
                self.write_snapshot(&pending.payload);
                info!(reference = %ack.reference, "quote request acknowledged");
                SubmissionOutcome::Completed(ack)
            }
            Err(err) => {
                warn!(cause = %err.cause, "quote request rejected");
                self.failed_payload = Some(pending.payload);
                self.set_phase(Phase::Failed);
                self.announce(Milestone::Rejected);
                let prompt = format!("Your request was not sent ({}). Retry to send it again.", err.cause);
                self.present(|p| p.render_retry(&prompt));
                SubmissionOutcome::Failed(err)
            }
        }
    }

    fn dispatch(&mut self, payload: SubmissionPayload) -> PendingSubmission {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.in_flight = Some(ticket);
        self.debouncer.cancel_all();
        self.set_phase(Phase::Submitting);
        self.announce(Milestone::Dispatched);
        PendingSubmission { ticket, payload }
    }

    fn build_payload(&self) -> SubmissionPayload {
        let elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        SubmissionPayload {
            fields: self.state.collected().clone(),
            metadata: SubmissionMetadata {
                submission_id: Uuid::new_v4(),
                submitted_at: Utc::now(),
                started_at: self.started_at,
                elapsed_ms,
            },
        }
    }

    fn submit_attributes(&self) -> Attributes {
        [quote::VEHICLE_YEAR, quote::VEHICLE_MAKE, quote::CURRENTLY_INSURED]
            .into_iter()
            .filter_map(|key| {
                self.state
                    .collected()
                    .get(key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect()
    }

    fn write_snapshot(&mut self, payload: &SubmissionPayload) {
        if self.snapshot_written {
            return;
        }
        let Some(store) = &self.snapshot else {
            return;
        };
        match store.write(&self.config.snapshot_key, payload) {
            Ok(_) => self.snapshot_written = true,
            Err(err) => warn!(error = %err, "failed to write form snapshot"),
        }
    }

    fn validate_step_and_render(
        &mut self,
        step: usize,
    ) -> Result<BTreeMap<String, String>, Vec<ValidationError>> {
        self.set_phase(Phase::Validating);
        let keys: Vec<&'static str> = self
            .form
            .step(step)
            .map(|descriptor| descriptor.fields.iter().map(|field| field.key).collect())
            .unwrap_or_default();
        for key in &keys {
            self.debouncer.cancel(key);
        }

        let result = self.validate_step(step);
        let failed: Vec<(String, String)> = match &result {
            Ok(_) => Vec::new(),
            Err(errors) => errors
                .iter()
                .map(|err| (err.field.clone(), err.reason.clone()))
                .collect(),
        };
        for key in keys {
            let message = failed
                .iter()
                .find(|(field, _)| field == key)
                .map(|(_, reason)| reason.clone());
            self.render_validation(key, message);
        }

        self.set_phase(Phase::Idle);
        result
    }

    fn validate_and_render(&mut self, key: &'static str) -> bool {
        let Some(value) = self.fields.get(key).map(|state| state.value.clone()) else {
            return false;
        };
        let message = self.validate_field(key, &value).err().map(|err| err.reason);
        let valid = message.is_none();
        debug!(field = key, valid, "field validated");
        self.render_validation(key, message);
        valid
    }

    fn render_validation(&mut self, key: &'static str, message: Option<String>) {
        if let Some(state) = self.fields.get_mut(key) {
            state.valid = message.is_none();
        }
        match message {
            Some(message) => self.present(|p| p.render_field_error(key, &message)),
            None => self.present(|p| p.render_field_success(key)),
        }
    }

    fn traits(&self, field: &str) -> Result<FieldTraits, WizardError> {
        let descriptor = self
            .form
            .field(field)
            .ok_or_else(|| WizardError::UnknownField(field.to_string()))?;
        let live_format = match &descriptor.kind {
            FieldKind::Text { live_format, .. } => *live_format,
            FieldKind::Choice(_) => None,
        };
        Ok(FieldTraits {
            key: descriptor.key,
            choice: descriptor.kind.is_choice(),
            debounced: descriptor.is_debounced(),
            live_format,
        })
    }

    /// Reads a text widget and applies its as-you-type formatter, reflecting
    /// the formatted value back when it changed.
    fn capture_text(&mut self, traits: FieldTraits) -> Option<String> {
        let raw = self.read_raw(traits.key)?;
        let Some(format) = traits.live_format else {
            return Some(raw);
        };
        let formatted = format(&raw);
        if formatted != raw {
            self.present(|p| p.render_field_value(traits.key, &formatted));
        }
        Some(formatted)
    }

    fn select_from_widget(&mut self, key: &'static str) -> Result<(), WizardError> {
        let Some(raw) = self.read_raw(key) else {
            return Ok(());
        };
        let selection = Some(raw.trim()).filter(|value| !value.is_empty());
        self.select(key, selection)
    }

    fn read_raw(&mut self, key: &'static str) -> Option<String> {
        match self.presentation.read_field(key) {
            Ok(raw) => Some(raw),
            Err(err) => {
                self.on_presentation_fault(err);
                None
            }
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase == phase {
            return;
        }
        debug!(from = %self.phase, to = %phase, "phase change");
        self.phase = phase;
        if !matches!(phase, Phase::Validating) {
            self.present(|p| p.render_phase(phase));
        }
    }

    fn announce(&mut self, milestone: Milestone) {
        let messages: Vec<String> = self
            .config
            .progress
            .messages_for(milestone)
            .map(str::to_string)
            .collect();
        for message in messages {
            self.present(|p| p.announce_progress(&message));
        }
    }

    fn emit_step_view(&self, step: usize) {
        self.emit(
            analytics::STEP_VIEW,
            Attributes::from([
                ("step_number".to_string(), step.to_string()),
                ("event_label".to_string(), format!("Step {}", step)),
            ]),
        );
    }

    fn emit(&self, event: &str, mut attributes: Attributes) {
        attributes.insert("event_category".into(), self.config.event_category.clone());
        if let Err(err) = self.analytics.emit(event, &attributes) {
            debug!(event, error = %err, "analytics event dropped");
        }
    }

    fn present<F>(&mut self, action: F)
    where
        F: FnOnce(&mut dyn Presentation) -> Result<(), PresentationError>,
    {
        if let Err(err) = action(self.presentation.as_mut()) {
            self.on_presentation_fault(err);
        }
    }

    /// Collaborator faults never escape: they are logged, reported, and switch
    /// the form to its static fallback contact.
    fn on_presentation_fault(&mut self, err: PresentationError) {
        error!(error = %err, "presentation layer fault");
        self.emit(
            analytics::EXCEPTION,
            Attributes::from([
                ("description".to_string(), err.to_string()),
                ("fatal".to_string(), "false".to_string()),
            ]),
        );
        if self.fallback_active {
            return;
        }
        self.fallback_active = true;
        let contact = self.config.fallback_phone.clone();
        if let Err(fallback_err) = self.presentation.render_fallback(&contact) {
            error!(error = %fallback_err, "fallback contact could not be rendered");
        }
    }
}
