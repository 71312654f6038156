use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use dialoguer::theme::ColorfulTheme;
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use tokio::runtime::{Builder, Runtime};

use crate::analytics::TracingSink;
use crate::cli::commands::{self, CommandRegistry};
use crate::cli::io as cli_io;
use crate::cli::terminal::TerminalPresentation;
use crate::config::{ConfigManager, WizardConfig};
use crate::errors::WizardError;
use crate::form::quote_form;
use crate::presentation::HeadlessPresentation;
use crate::storage::SnapshotStore;
use crate::submission::SimulatedBackend;
use crate::utils;
use crate::wizard::{Collaborators, FormWizard};

/// Environment variable that makes the simulated backend reject its first
/// `n` calls.
pub const FAIL_SUBMISSIONS_ENV: &str = "QUOTE_WIZARD_FAIL_SUBMISSIONS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Command(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

pub type CommandResult = Result<(), CommandError>;

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Wizard(inner) => CliError::Wizard(inner),
            other => CliError::Command(other.to_string()),
        }
    }
}

/// Startup options collected from the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub config_path: Option<PathBuf>,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub wizard: FormWizard,
    /// Widget buffer shared with the wizard's presentation layer.
    pub fields: HeadlessPresentation,
    pub backend: SimulatedBackend,
    pub theme: ColorfulTheme,
    pub last_command: Option<String>,
    pub running: bool,
    pub(crate) runtime: Runtime,
}

impl ShellContext {
    pub fn new(mode: CliMode, options: &CliOptions) -> Result<Self, CliError> {
        let data_dir = utils::app_data_dir();
        let config_manager = match &options.config_path {
            Some(path) => ConfigManager::with_path(path.clone()),
            None => ConfigManager::with_base_dir(data_dir.clone()),
        };
        let config = config_manager.load()?;
        tracing::debug!(path = %config_manager.path().display(), "configuration loaded");

        let backend = simulated_backend(&config, mode);
        let fields = HeadlessPresentation::new();
        let today = Local::now().date_naive();
        let form = quote_form(&config, today);
        let presentation = TerminalPresentation::new(fields.clone(), &form);
        let wizard = FormWizard::with_form(
            config,
            form,
            Collaborators {
                presentation: Box::new(presentation),
                analytics: Box::new(TracingSink),
                snapshot: Some(SnapshotStore::new(utils::snapshot_dir_in(&data_dir))),
            },
        )?;

        let runtime = Builder::new_current_thread().enable_time().build()?;

        Ok(Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            wizard,
            fields,
            backend,
            theme: ColorfulTheme::default(),
            last_command: None,
            running: true,
            runtime,
        })
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub fn prompt(&self) -> String {
        format!(
            "quote [{}/{}]> ",
            self.wizard.current_step(),
            self.wizard.state().total_steps()
        )
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(definition) = self.registry.get(command) {
            let handler = definition.handler;
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, input), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, "Leave the quote form?", false).map_err(CliError::from)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(message);
                cli_io::print_info("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Wizard(err) => {
                cli_io::print_error(err);
                Ok(())
            }
            CommandError::Dialoguer(err) => Err(CliError::Command(err.to_string())),
        }
    }
}

fn simulated_backend(config: &WizardConfig, mode: CliMode) -> SimulatedBackend {
    let latency = match mode {
        CliMode::Interactive => Duration::from_millis(config.simulated_latency_ms),
        CliMode::Script => Duration::ZERO,
    };
    let failures = std::env::var(FAIL_SUBMISSIONS_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(0);
    SimulatedBackend::new(latency).failing_first(failures)
}
