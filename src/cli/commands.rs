use std::collections::HashMap;

use crate::cli::context::{CliMode, CommandError, CommandResult, ShellContext};
use crate::cli::io as cli_io;
use crate::cli::output;
use crate::form::FieldKind;
use crate::utils::build_info;
use crate::wizard::{StepTransition, SubmissionOutcome};

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }
}

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "set",
            "Enter a value for a field",
            "set <field> <value...>   (or <field>=<value>)",
            cmd_set,
        ),
        CommandDefinition::new(
            "fill",
            "Answer every question of the current step",
            "fill",
            cmd_fill,
        ),
        CommandDefinition::new("next", "Validate this step and continue", "next", cmd_next),
        CommandDefinition::new("back", "Return to the previous step", "back", cmd_back),
        CommandDefinition::new("submit", "Send the quote request", "submit", cmd_submit),
        CommandDefinition::new("retry", "Resend a failed quote request", "retry", cmd_retry),
        CommandDefinition::new("status", "Show the current step and answers", "status", cmd_status),
        CommandDefinition::new("version", "Show build metadata", "version", cmd_version),
        CommandDefinition::new("help", "List commands or describe one", "help [command]", cmd_help),
        CommandDefinition::new("exit", "Leave the quote form", "exit", cmd_exit),
    ]
}

fn cmd_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (field, value) = match args {
        [field, rest @ ..] => (*field, rest.join(" ")),
        [] => {
            return Err(CommandError::InvalidArguments(
                "usage: set <field> <value...>".into(),
            ))
        }
    };
    enter_value(context, field, &value)
}

/// Choice answers go through `select`; text answers are written into the
/// widget buffer. Either way the field is then left, which validates it.
pub(crate) fn enter_value(context: &mut ShellContext, field: &str, value: &str) -> CommandResult {
    let (key, choice) = context
        .wizard
        .form()
        .field(field)
        .map(|descriptor| (descriptor.key, descriptor.kind.is_choice()))
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!(
                "Unknown field `{}`. Use `status` to list the fields of this step.",
                field
            ))
        })?;
    if choice {
        let option = Some(value.trim()).filter(|option| !option.is_empty());
        context.wizard.select(key, option)?;
    } else {
        context.fields.set_field(key, value);
    }
    context.wizard.blur(key)?;
    Ok(())
}

fn cmd_fill(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.mode == CliMode::Script {
        return Err(CommandError::InvalidArguments(
            "`fill` needs an interactive terminal; use `set` in scripts".into(),
        ));
    }

    let step = context.wizard.current_step();
    let fields = context
        .wizard
        .form()
        .step(step)
        .map(|descriptor| descriptor.fields.clone())
        .unwrap_or_default();

    for field in fields {
        if let Some(help) = field.help {
            cli_io::print_info(help);
        }
        let answer = match &field.kind {
            FieldKind::Text { .. } => {
                let current = context.fields.field(field.key).unwrap_or_default();
                Some(cli_io::prompt_text(&context.theme, field.label, &current)?)
            }
            FieldKind::Choice(options) => {
                let labels: Vec<String> = options.iter().map(|option| option.label.clone()).collect();
                let current = context.fields.field(field.key).unwrap_or_default();
                let default = options
                    .iter()
                    .position(|option| option.value == current)
                    .unwrap_or(0);
                cli_io::prompt_select(&context.theme, field.label, &labels, default)?
                    .and_then(|index| options.get(index))
                    .map(|option| option.value.clone())
            }
        };
        match answer {
            Some(value) => enter_value(context, field.key, &value)?,
            None => break,
        }
    }
    Ok(())
}

fn cmd_next(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.wizard.advance() {
        StepTransition::Invalid(errors) => cli_io::print_warning(format!(
            "Please fix {} field(s) before continuing.",
            errors.len()
        )),
        StepTransition::AtBoundary => {
            cli_io::print_info("This is the last step. Use `submit` to get your quotes.")
        }
        StepTransition::Rejected(phase) => {
            cli_io::print_warning(format!("The form is {} and cannot change steps.", phase))
        }
        StepTransition::Advanced { .. } | StepTransition::Retreated { .. } => {}
    }
    Ok(())
}

fn cmd_back(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.wizard.retreat() {
        StepTransition::AtBoundary => cli_io::print_info("Already at the first step."),
        StepTransition::Rejected(phase) => {
            cli_io::print_warning(format!("The form is {} and cannot change steps.", phase))
        }
        _ => {}
    }
    Ok(())
}

fn cmd_submit(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let ShellContext {
        wizard,
        backend,
        runtime,
        ..
    } = context;
    let outcome = runtime.block_on(wizard.submit(&*backend));
    report_outcome(outcome);
    Ok(())
}

fn cmd_retry(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let ShellContext {
        wizard,
        backend,
        runtime,
        ..
    } = context;
    let outcome = runtime.block_on(wizard.retry(&*backend));
    report_outcome(outcome);
    Ok(())
}

fn report_outcome(outcome: SubmissionOutcome) {
    match outcome {
        SubmissionOutcome::Completed(ack) => {
            cli_io::print_success(format!("Quote request received. Reference {}.", ack.reference))
        }
        SubmissionOutcome::Invalid(errors) => cli_io::print_warning(format!(
            "Please fix {} field(s) before submitting.",
            errors.len()
        )),
        SubmissionOutcome::Failed(_) => {}
        SubmissionOutcome::NotAtFinalStep { current, total } => cli_io::print_warning(format!(
            "You are on step {} of {}. Finish every step before submitting.",
            current, total
        )),
        SubmissionOutcome::Ignored(phase) => {
            cli_io::print_info(format!("Nothing to send: the form is {}.", phase))
        }
    }
}

fn cmd_status(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let wizard = &context.wizard;
    let step = wizard.current_step();
    output::section(format!(
        "Step {} of {} ({})",
        step,
        wizard.state().total_steps(),
        wizard.phase()
    ));
    if let Some(descriptor) = wizard.form().step(step) {
        for field in &descriptor.fields {
            let value = context.fields.field(field.key).unwrap_or_default();
            let mark = match wizard.field_state(field.key) {
                Some(state) if state.valid => "ok",
                Some(state) if state.touched => "invalid",
                _ => "pending",
            };
            cli_io::print_info(format!("  {:<16} {:<8} {}", field.key, mark, value));
        }
    }
    cli_io::print_info(format!(
        "{} answer(s) collected from completed steps.",
        wizard.collected().len()
    ));
    if wizard.fallback_active() {
        cli_io::print_warning(format!(
            "Call {} to finish your quote by phone.",
            wizard.config().fallback_phone
        ));
    }
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::section(format!("Quote Wizard {}", meta.version));
    cli_io::print_info(format!(
        "  Build hash : {} ({})",
        meta.git_hash, meta.git_status
    ));
    cli_io::print_info(format!("  Built at   : {}", meta.timestamp));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        let name = name.to_ascii_lowercase();
        let entry = context.registry.get(&name).ok_or_else(|| {
            CommandError::InvalidArguments(format!("No help available for `{}`.", name))
        })?;
        output::section(format!("Help: {}", entry.name));
        cli_io::print_info(format!("  Description: {}", entry.description));
        cli_io::print_info(format!("  Usage: {}", entry.usage));
        return Ok(());
    }

    output::section("Available commands");
    for entry in context.registry.iter() {
        cli_io::print_info(format!("  {:<8} {}", entry.name, entry.description));
    }
    cli_io::print_info("Use `help <command>` for details.");
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
