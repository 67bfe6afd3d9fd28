//! The scaffolding workflow.
//!
//! [`Workflow::run`] drives one project creation end to end:
//!
//! 1. ask for a stack
//! 2. check the stack's dependencies (abort if one is missing)
//! 3. ask for an app name until it validates
//! 4. if the directory exists, ask whether to back it up and overwrite
//! 5. run the stack's recipe
//! 6. ask whether to open the result in an editor
//!
//! Every question and status message goes through [`Interaction`], so the
//! CLI can back it with terminal prompts and tests with scripted answers.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::backup;
use crate::deps::{self, DependencyStatus, ExecutableLookup};
use crate::error::FileSystemError;
use crate::generate::{self, CommandRunner, GenerateError, GenerationReport, GenerationRequest, Invocation};
use crate::name::{AppName, InvalidAppName};
use crate::stack::{Registry, StackDefinition, UnknownStack};

/// A prompt could not be answered (e.g. interrupted, or no terminal).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("prompt failed: {0}")]
pub struct PromptError(pub String);

/// Progress notifications emitted while the workflow runs.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// The workflow is starting.
    Welcome,
    /// A required executable was not found.
    MissingDependency {
        /// Stack that needed it.
        stack: &'a StackDefinition,
        /// The executable name.
        dependency: &'a str,
    },
    /// The entered app name was rejected; the name will be asked again.
    InvalidAppName(&'a InvalidAppName),
    /// The user kept the existing directory.
    Aborted {
        /// The directory that already existed.
        target: &'a Path,
    },
    /// The existing directory was moved aside.
    BackedUp {
        /// Where it went.
        backup: &'a Path,
    },
    /// Generation is about to start.
    Creating {
        /// Stack being generated.
        stack: &'a StackDefinition,
        /// App name.
        app_name: &'a AppName,
    },
    /// The editor could not be launched.
    EditorFailed(&'a GenerateError),
    /// The project is ready.
    Done {
        /// App name.
        app_name: &'a AppName,
    },
}

/// User-facing side of the workflow.
pub trait Interaction {
    /// Pick one of `stacks`, returning its id.
    fn select_stack(&mut self, stacks: &[StackDefinition]) -> Result<String, PromptError>;

    /// Ask for the app name. The answer is validated by the workflow.
    fn app_name(&mut self) -> Result<String, PromptError>;

    /// The target directory exists; back it up and overwrite?
    fn confirm_overwrite(&mut self, app_name: &AppName, target: &Path) -> Result<bool, PromptError>;

    /// Open the new project in the editor?
    fn confirm_open_editor(&mut self, app_name: &AppName) -> Result<bool, PromptError>;

    /// Show a progress event.
    fn notify(&mut self, event: Event<'_>);
}

/// Fatal workflow errors.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A prompt failed.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// The selected stack id is not registered.
    #[error(transparent)]
    UnknownStack(#[from] UnknownStack),

    /// Moving the existing directory aside failed.
    #[error("backup failed: {0}")]
    Backup(#[source] FileSystemError),

    /// The recipe failed.
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// How a run ended (when it did not fail).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case", tag = "outcome")]
pub enum Outcome {
    /// The project was generated.
    Created {
        /// Stack id.
        stack: String,
        /// The new project directory.
        target: PathBuf,
        /// Where a pre-existing directory was moved, if any.
        backup: Option<PathBuf>,
        /// What the recipe did.
        report: GenerationReport,
        /// Whether the editor was launched.
        editor_opened: bool,
    },
    /// The user declined to overwrite an existing directory.
    Declined {
        /// The directory that was left alone.
        target: PathBuf,
    },
    /// A dependency was missing; nothing was touched.
    MissingDependency {
        /// Stack id.
        stack: String,
        /// The first executable that did not resolve.
        dependency: String,
    },
}

impl Outcome {
    /// Process exit code for this outcome: 1 for a missing dependency,
    /// 0 otherwise.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::MissingDependency { .. } => 1,
            Self::Created { .. } | Self::Declined { .. } => 0,
        }
    }
}

/// One scaffolding run's collaborators.
pub struct Workflow<'a, R: ?Sized, L: ?Sized> {
    registry: &'a Registry,
    runner: &'a R,
    lookup: &'a L,
    cwd: PathBuf,
    backup_root: PathBuf,
    editor: String,
}

impl<'a, R, L> Workflow<'a, R, L>
where
    R: CommandRunner + ?Sized,
    L: ExecutableLookup + ?Sized,
{
    /// Workflow creating projects under `cwd`.
    pub fn new(registry: &'a Registry, runner: &'a R, lookup: &'a L, cwd: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            runner,
            lookup,
            cwd: cwd.into(),
            backup_root: backup::default_backup_root(),
            editor: crate::config::DEFAULT_EDITOR.to_string(),
        }
    }

    /// Move existing directories under `root` instead of the temp directory.
    pub fn with_backup_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.backup_root = root.into();
        self
    }

    /// Launch `editor` instead of the default.
    pub fn with_editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = editor.into();
        self
    }

    /// Run the workflow to completion.
    #[instrument(skip_all, fields(cwd = %self.cwd.display()))]
    pub fn run<I>(&self, ui: &mut I) -> Result<Outcome, WorkflowError>
    where
        I: Interaction + ?Sized,
    {
        ui.notify(Event::Welcome);

        let stack_id = ui.select_stack(self.registry.list_all())?;
        let stack = self.registry.lookup(&stack_id)?;
        debug!(stack = stack.id, "stack selected");

        if let DependencyStatus::Missing(dependency) =
            deps::check_dependencies(stack.dependencies, self.lookup)
        {
            warn!(stack = stack.id, %dependency, "missing dependency");
            ui.notify(Event::MissingDependency {
                stack,
                dependency: &dependency,
            });
            return Ok(Outcome::MissingDependency {
                stack: stack.id.to_string(),
                dependency,
            });
        }

        let app_name = Self::ask_app_name(ui)?;
        let request = GenerationRequest::new(stack.id, app_name, &self.cwd);
        let target = request.target_dir.clone();

        let mut backup = None;
        if target.exists() {
            if !ui.confirm_overwrite(&request.app_name, &target)? {
                info!(target = %target.display(), "overwrite declined");
                ui.notify(Event::Aborted { target: &target });
                return Ok(Outcome::Declined { target });
            }
            let moved = backup::backup_directory(&target, &self.backup_root)
                .map_err(WorkflowError::Backup)?;
            ui.notify(Event::BackedUp { backup: &moved });
            backup = Some(moved);
        }

        ui.notify(Event::Creating {
            stack,
            app_name: &request.app_name,
        });
        let report = generate::generate(stack, &request, self.runner)?;

        let mut editor_opened = false;
        if ui.confirm_open_editor(&request.app_name)? {
            let invocation = Invocation::new(
                self.editor.as_str(),
                [target.to_string_lossy().into_owned()],
                &self.cwd,
            );
            match self.runner.run(&invocation) {
                Ok(()) => editor_opened = true,
                Err(err) => {
                    warn!(error = %err, "editor launch failed");
                    ui.notify(Event::EditorFailed(&err));
                }
            }
        }

        ui.notify(Event::Done {
            app_name: &request.app_name,
        });
        Ok(Outcome::Created {
            stack: stack.id.to_string(),
            target,
            backup,
            report,
            editor_opened,
        })
    }

    fn ask_app_name<I>(ui: &mut I) -> Result<AppName, PromptError>
    where
        I: Interaction + ?Sized,
    {
        loop {
            let input = ui.app_name()?;
            match AppName::parse(&input) {
                Ok(name) => return Ok(name),
                Err(err) => {
                    debug!(%err, "app name rejected");
                    ui.notify(Event::InvalidAppName(&err));
                }
            }
        }
    }
}
