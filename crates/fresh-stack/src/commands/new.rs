//! New command: the interactive project scaffolder.
//!
//! Each question can be answered up front with a flag; whatever is left is
//! asked with `inquire` prompts.

use std::path::Path;

use anyhow::Context;
use clap::Args;
use inquire::error::CustomUserError;
use inquire::validator::Validation;
use inquire::{Confirm, InquireError, Select, Text};
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use fresh_stack_core::config::{Config, DEFAULT_EDITOR};
use fresh_stack_core::deps::PathLookup;
use fresh_stack_core::generate::SystemRunner;
use fresh_stack_core::name::{APP_NAME_HINT, AppName};
use fresh_stack_core::stack::{Registry, StackDefinition};
use fresh_stack_core::workflow::{Event, Interaction, Outcome, PromptError, Workflow};

/// Arguments for the `new` subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct NewArgs {
    /// Stack to create (skips the menu; see `fresh-stack list`)
    #[arg(long, value_name = "ID")]
    pub stack: Option<String>,

    /// App name, also the directory name (skips the prompt)
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Back up and replace an existing directory without asking
    #[arg(long, conflicts_with = "no_overwrite")]
    pub overwrite: bool,

    /// Leave an existing directory alone without asking
    #[arg(long)]
    pub no_overwrite: bool,

    /// Open the project in the editor without asking
    #[arg(long, conflicts_with = "no_open")]
    pub open: bool,

    /// Do not open the editor
    #[arg(long)]
    pub no_open: bool,
}

impl NewArgs {
    /// Pre-answered overwrite question, if any.
    pub const fn overwrite(&self) -> Option<bool> {
        flag_pair(self.overwrite, self.no_overwrite)
    }

    /// Pre-answered editor question, if any.
    pub const fn open(&self) -> Option<bool> {
        flag_pair(self.open, self.no_open)
    }
}

const fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Terminal side of the workflow: flags first, prompts for the rest.
struct TerminalInteraction {
    stack: Option<String>,
    name: Option<String>,
    overwrite: Option<bool>,
    open: Option<bool>,
    editor: String,
}

impl TerminalInteraction {
    fn new(args: NewArgs, editor: &str) -> Self {
        Self {
            overwrite: args.overwrite(),
            open: args.open(),
            stack: args.stack,
            name: args.name,
            editor: editor.to_string(),
        }
    }

    fn editor_label(&self) -> &str {
        if self.editor == DEFAULT_EDITOR {
            "VS Code"
        } else {
            &self.editor
        }
    }
}

fn prompt_error(err: InquireError) -> PromptError {
    PromptError(err.to_string())
}

fn validate_app_name(input: &str) -> Result<Validation, CustomUserError> {
    Ok(match AppName::parse(input) {
        Ok(_) => Validation::Valid,
        Err(_) => Validation::Invalid(APP_NAME_HINT.into()),
    })
}

impl Interaction for TerminalInteraction {
    fn select_stack(&mut self, stacks: &[StackDefinition]) -> Result<String, PromptError> {
        if let Some(stack) = self.stack.take() {
            return Ok(stack);
        }
        Select::new("🛠 Choose a tech stack:", stacks.to_vec())
            .prompt()
            .map(|stack| stack.id.to_string())
            .map_err(prompt_error)
    }

    fn app_name(&mut self) -> Result<String, PromptError> {
        if let Some(name) = self.name.take() {
            return Ok(name);
        }
        Text::new("📛 Enter your app name:")
            .with_validator(validate_app_name)
            .prompt()
            .map_err(prompt_error)
    }

    fn confirm_overwrite(&mut self, app_name: &AppName, _target: &Path) -> Result<bool, PromptError> {
        if let Some(answer) = self.overwrite {
            return Ok(answer);
        }
        Confirm::new(&format!(
            "⚠️ Directory '{app_name}' exists. Backup and overwrite?"
        ))
        .with_default(false)
        .prompt()
        .map_err(prompt_error)
    }

    fn confirm_open_editor(&mut self, _app_name: &AppName) -> Result<bool, PromptError> {
        if let Some(answer) = self.open {
            return Ok(answer);
        }
        Confirm::new(&format!("💻 Open in {}?", self.editor_label()))
            .with_default(true)
            .prompt()
            .map_err(prompt_error)
    }

    fn notify(&mut self, event: Event<'_>) {
        match event {
            Event::Welcome => {
                println!("{}", "🌟 Welcome to Fresh Stack CLI".cyan().bold());
            }
            Event::MissingDependency { dependency, .. } => {
                eprintln!("{}", format!("❌ Missing dependency: {dependency}").red());
                println!(
                    "{}",
                    "❌ Please install the missing tools above and try again.".red()
                );
            }
            Event::InvalidAppName(_) => {
                eprintln!("{}", APP_NAME_HINT.yellow());
            }
            Event::Aborted { .. } => {
                println!("{}", "💥 Aborted.".red());
            }
            Event::BackedUp { backup } => {
                println!(
                    "{}",
                    format!("✅ Backup saved to {}", backup.display()).yellow()
                );
            }
            Event::Creating { stack, app_name } => {
                println!(
                    "{}",
                    format!("📦 Creating {} app: {app_name}", stack.title).blue()
                );
            }
            Event::EditorFailed(err) => {
                eprintln!(
                    "{}",
                    format!("⚠️ Could not open {}: {err}", self.editor_label()).yellow()
                );
            }
            Event::Done { app_name } => {
                println!(
                    "{}",
                    format!("✅ Done! {app_name} is ready to build. Happy hacking! 🔥")
                        .green()
                        .bold()
                );
            }
        }
    }
}

/// Run the scaffolding workflow in `cwd`.
///
/// Flag answers are checked before anything is printed, since a bad one
/// cannot be asked again.
#[instrument(name = "cmd_new", skip_all, fields(stack = args.stack.as_deref(), name = args.name.as_deref()))]
pub fn cmd_new(args: NewArgs, config: &Config, cwd: &camino::Utf8Path) -> anyhow::Result<Outcome> {
    let registry = Registry::builtin();
    if let Some(ref stack) = args.stack {
        registry.lookup(stack)?;
    }
    if let Some(ref name) = args.name {
        AppName::parse(name)?;
    }

    let editor = config.editor_command();
    debug!(editor, backup_root = %config.backup_root().display(), "executing new command");

    let mut ui = TerminalInteraction::new(args, editor);
    let outcome = Workflow::new(&registry, &SystemRunner, &PathLookup, cwd.as_std_path())
        .with_backup_root(config.backup_root())
        .with_editor(editor)
        .run(&mut ui)
        .context("project creation failed")?;

    debug!(exit_code = outcome.exit_code(), "new command finished");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_pairs_map_to_answers() {
        assert_eq!(flag_pair(false, false), None);
        assert_eq!(flag_pair(true, false), Some(true));
        assert_eq!(flag_pair(false, true), Some(false));
    }

    #[test]
    fn preset_answers_skip_prompts() {
        let args = NewArgs {
            stack: Some("python".into()),
            name: Some("demo".into()),
            overwrite: true,
            no_open: true,
            ..NewArgs::default()
        };
        let mut ui = TerminalInteraction::new(args, "code");
        let name = AppName::parse("demo").unwrap();

        assert_eq!(ui.select_stack(&[]).unwrap(), "python");
        assert_eq!(ui.app_name().unwrap(), "demo");
        assert!(ui.confirm_overwrite(&name, Path::new("demo")).unwrap());
        assert!(!ui.confirm_open_editor(&name).unwrap());
    }

    #[test]
    fn editor_label_names_vs_code_only_for_default() {
        let ui = TerminalInteraction::new(NewArgs::default(), "code");
        assert_eq!(ui.editor_label(), "VS Code");
        let ui = TerminalInteraction::new(NewArgs::default(), "zed");
        assert_eq!(ui.editor_label(), "zed");
    }

    #[test]
    fn invalid_preset_name_is_rejected_before_running() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cwd = camino::Utf8Path::from_path(tmp.path()).unwrap();
        let args = NewArgs {
            stack: Some("python".into()),
            name: Some("bad name".into()),
            ..NewArgs::default()
        };

        let err = cmd_new(args, &Config::default(), cwd).unwrap_err();
        assert!(err.to_string().contains(APP_NAME_HINT));
    }

    #[test]
    fn unknown_preset_stack_is_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cwd = camino::Utf8Path::from_path(tmp.path()).unwrap();
        let args = NewArgs {
            stack: Some("cobol".into()),
            ..NewArgs::default()
        };

        let err = cmd_new(args, &Config::default(), cwd).unwrap_err();
        assert!(err.to_string().contains("cobol"));
    }
}
