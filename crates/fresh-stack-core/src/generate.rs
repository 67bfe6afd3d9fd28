//! Project generation: run a stack's recipe.
//!
//! [`generate`] interprets the [`Step`]s of a [`StackDefinition`] in order.
//! External programs go through a [`CommandRunner`] so the dispatch can be
//! tested without `npx` or `flutter` on the machine; [`SystemRunner`] is
//! the real implementation and passes the terminal straight through to the
//! child process.
//!
//! The first failing step aborts the recipe. Nothing is rolled back.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::deps::{ExecutableLookup, PathLookup};
use crate::error::{FileSystemError, FsOperation};
use crate::gradle::{self, GradleError, GradlePatchContext};
use crate::name::AppName;
use crate::stack::{StackDefinition, Step, WorkDir};

/// Errors from running a generation recipe.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// An external program exited unsuccessfully.
    #[error("`{command}` failed{}", exit_suffix(.exit_code))]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Exit code, if the process exited normally.
        exit_code: Option<i32>,
    },

    /// An external program could not be started.
    #[error("failed to run `{command}`: {source}")]
    CommandSpawn {
        /// The command line that was attempted.
        command: String,
        /// Why the spawn failed.
        #[source]
        source: std::io::Error,
    },

    /// A directory or file step failed.
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    /// The Gradle fix-up failed.
    #[error(transparent)]
    Gradle(#[from] GradleError),
}

fn exit_suffix(code: &Option<i32>) -> String {
    code.map_or_else(
        || " (terminated by signal)".to_string(),
        |code| format!(" with exit code {code}"),
    )
}

/// Result alias for generation.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Everything needed to generate one project.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// Stack being generated.
    pub stack_id: String,
    /// Validated app name.
    pub app_name: AppName,
    /// Absolute project directory (`<parent>/<app_name>`).
    pub target_dir: PathBuf,
}

impl GenerationRequest {
    /// Request for `app_name` created inside `parent`.
    pub fn new(stack_id: impl Into<String>, app_name: AppName, parent: &Path) -> Self {
        let target_dir = parent.join(app_name.as_str());
        Self {
            stack_id: stack_id.into(),
            app_name,
            target_dir,
        }
    }

    /// Directory the project is created in.
    pub fn parent_dir(&self) -> &Path {
        self.target_dir.parent().unwrap_or(&self.target_dir)
    }

    fn resolve_dir(&self, dir: WorkDir) -> &Path {
        match dir {
            WorkDir::Parent => self.parent_dir(),
            WorkDir::Project => &self.target_dir,
        }
    }
}

/// A fully-rendered external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// Executable name.
    pub program: String,
    /// Rendered arguments.
    pub args: Vec<String>,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Invocation {
    /// Invocation of `program` with `args` in `cwd`.
    pub fn new<I, S>(program: impl Into<String>, args: I, cwd: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.into(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs external commands to completion.
pub trait CommandRunner {
    /// Run `invocation`, returning once the child exits.
    ///
    /// A non-zero exit must be reported as [`GenerateError::CommandFailed`].
    fn run(&self, invocation: &Invocation) -> GenerateResult<()>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> GenerateResult<()> {
        (**self).run(invocation)
    }
}

/// Spawns real processes with inherited stdin/stdout/stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    #[instrument(skip_all, fields(command = %invocation, cwd = %invocation.cwd.display()))]
    fn run(&self, invocation: &Invocation) -> GenerateResult<()> {
        // Resolve through PATH first so `.cmd` shims (npx, npm) work on Windows.
        let program = PathLookup
            .resolve(&invocation.program)
            .unwrap_or_else(|| PathBuf::from(&invocation.program));

        let status = Command::new(&program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .status()
            .map_err(|source| GenerateError::CommandSpawn {
                command: invocation.to_string(),
                source,
            })?;

        debug!(%status, "command exited");
        if status.success() {
            Ok(())
        } else {
            Err(GenerateError::CommandFailed {
                command: invocation.to_string(),
                exit_code: status.code(),
            })
        }
    }
}

/// Record of an executed recipe.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    /// External commands that ran, in order.
    pub commands: Vec<String>,
    /// Files and directories created directly.
    pub created: Vec<PathBuf>,
    /// Files removed.
    pub removed: Vec<PathBuf>,
    /// Gradle fix-up result, for Flutter.
    pub gradle: Option<gradle::PatchReport>,
}

/// Execute `stack`'s recipe for `request`.
#[instrument(skip_all, fields(stack = stack.id, app = %request.app_name))]
pub fn generate<R>(
    stack: &StackDefinition,
    request: &GenerationRequest,
    runner: &R,
) -> GenerateResult<GenerationReport>
where
    R: CommandRunner + ?Sized,
{
    let mut report = GenerationReport::default();

    for (index, step) in stack.recipe.iter().enumerate() {
        debug!(index, ?step, "running step");
        match *step {
            Step::Run { program, args, dir } => {
                let invocation = Invocation::new(
                    program,
                    args.iter().map(|arg| arg.render(request.app_name.as_str())),
                    request.resolve_dir(dir),
                );
                runner.run(&invocation)?;
                report.commands.push(invocation.to_string());
            }
            Step::CreateDir => {
                let dir = &request.target_dir;
                fs::create_dir(dir)
                    .map_err(|e| FileSystemError::new(FsOperation::CreateDir, dir, e))?;
                report.created.push(dir.clone());
            }
            Step::WriteFile { path, contents } => {
                let file = request.target_dir.join(path);
                fs::write(&file, contents)
                    .map_err(|e| FileSystemError::new(FsOperation::Write, &file, e))?;
                report.created.push(file);
            }
            Step::RemoveFile { path } => {
                let file = request.target_dir.join(path);
                fs::remove_file(&file)
                    .map_err(|e| FileSystemError::new(FsOperation::Remove, &file, e))?;
                report.removed.push(file);
            }
            Step::PatchGradle { organization } => {
                let context = GradlePatchContext::new(&request.target_dir, organization);
                report.gradle = Some(gradle::patch(&context)?);
            }
        }
    }

    info!(
        commands = report.commands.len(),
        created = report.created.len(),
        "project generated"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{Arg, Registry};
    use std::cell::RefCell;
    use tempfile::TempDir;

    type SideEffect = Box<dyn Fn(&Invocation)>;

    /// Records invocations; optionally fails a program or mimics its output.
    #[derive(Default)]
    struct RecordingRunner {
        calls: RefCell<Vec<Invocation>>,
        fail: Option<(&'static str, i32)>,
        effects: Vec<(&'static str, SideEffect)>,
    }

    impl RecordingRunner {
        fn failing(program: &'static str, code: i32) -> Self {
            Self {
                fail: Some((program, code)),
                ..Self::default()
            }
        }

        fn with_effect(
            mut self,
            program: &'static str,
            effect: impl Fn(&Invocation) + 'static,
        ) -> Self {
            self.effects.push((program, Box::new(effect)));
            self
        }

        fn lines(&self) -> Vec<String> {
            self.calls.borrow().iter().map(ToString::to_string).collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, invocation: &Invocation) -> GenerateResult<()> {
            self.calls.borrow_mut().push(invocation.clone());
            if let Some((program, code)) = self.fail
                && invocation.program == program
            {
                return Err(GenerateError::CommandFailed {
                    command: invocation.to_string(),
                    exit_code: Some(code),
                });
            }
            for (program, effect) in &self.effects {
                if invocation.program == *program {
                    effect(invocation);
                }
            }
            Ok(())
        }
    }

    fn request(stack: &str, name: &str, parent: &Path) -> GenerationRequest {
        GenerationRequest::new(stack, AppName::parse(name).unwrap(), parent)
    }

    fn stack(id: &str) -> StackDefinition {
        *Registry::builtin().lookup(id).unwrap()
    }

    #[test]
    fn single_command_stacks_render_expected_invocations() {
        let cases = [
            ("react", "npx create-react-app demo"),
            ("react-native", "npx react-native init demo"),
            ("nest", "npx @nestjs/cli new demo"),
        ];
        let tmp = TempDir::new().unwrap();

        for (id, expected) in cases {
            let runner = RecordingRunner::default();
            let req = request(id, "demo", tmp.path());
            generate(&stack(id), &req, &runner).unwrap();

            assert_eq!(runner.lines(), [expected], "recipe for {id}");
            assert_eq!(runner.calls.borrow()[0].cwd, tmp.path());
        }
    }

    #[test]
    fn node_creates_dir_then_inits_inside_it() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::default().with_effect("npm", |inv| {
            fs::write(inv.cwd.join("package.json"), r#"{"name":"demo1"}"#).unwrap();
        });
        let req = request("node", "demo1", tmp.path());

        let report = generate(&stack("node"), &req, &runner).unwrap();

        assert_eq!(runner.lines(), ["npm init -y"]);
        assert_eq!(runner.calls.borrow()[0].cwd, tmp.path().join("demo1"));
        assert!(tmp.path().join("demo1").join("package.json").is_file());
        assert_eq!(report.created, [tmp.path().join("demo1")]);
    }

    #[test]
    fn python_writes_placeholder_without_processes() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::default();
        let req = request("python", "app", tmp.path());

        generate(&stack("python"), &req, &runner).unwrap();

        assert!(runner.calls.borrow().is_empty());
        assert_eq!(
            fs::read_to_string(tmp.path().join("app").join("main.py")).unwrap(),
            "# Start your Python app here\n"
        );
    }

    #[test]
    fn springboot_downloads_extracts_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::default()
            .with_effect("curl", |inv| {
                fs::write(inv.cwd.join("starter.zip"), b"PK").unwrap();
            })
            .with_effect("unzip", |inv| {
                fs::write(inv.cwd.join("pom.xml"), "<project/>").unwrap();
            });
        let req = request("springboot", "svc", tmp.path());

        let report = generate(&stack("springboot"), &req, &runner).unwrap();

        assert_eq!(
            runner.lines(),
            [
                "curl https://start.spring.io/starter.zip -o starter.zip",
                "unzip starter.zip",
            ]
        );
        let project = tmp.path().join("svc");
        assert!(runner.calls.borrow().iter().all(|c| c.cwd == project));
        assert!(project.join("pom.xml").is_file());
        assert!(!project.join("starter.zip").exists());
        assert_eq!(report.removed, [project.join("starter.zip")]);
    }

    #[test]
    fn flutter_creates_then_patches_gradle() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::default().with_effect("flutter", |inv| {
            let android = inv.cwd.join(&inv.args[1]).join("android");
            fs::create_dir_all(android.join("app")).unwrap();
            fs::write(android.join("settings.gradle.kts"), "").unwrap();
            fs::write(android.join("build.gradle.kts"), "").unwrap();
        });
        let req = request("flutter", "demo2", tmp.path());

        let report = generate(&stack("flutter"), &req, &runner).unwrap();

        assert_eq!(
            runner.lines(),
            ["flutter create demo2 --org com.example -a kotlin -i swift"]
        );
        let android = tmp.path().join("demo2").join("android");
        assert!(android.join("settings.gradle").is_file());
        assert!(!android.join("settings.gradle.kts").exists());
        let app_build = fs::read_to_string(android.join("app").join("build.gradle")).unwrap();
        assert!(app_build.contains("namespace \"com.example.demo2\""));
        assert!(app_build.contains("applicationId \"com.example.demo2\""));
        assert_eq!(report.gradle.unwrap().written.len(), 3);
    }

    #[test]
    fn flutter_without_android_output_fails() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::default();
        let req = request("flutter", "demo2", tmp.path());

        let err = generate(&stack("flutter"), &req, &runner).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Gradle(GradleError::MissingAndroidProject(_))
        ));
    }

    #[test]
    fn failing_command_aborts_remaining_steps() {
        let tmp = TempDir::new().unwrap();
        let runner = RecordingRunner::failing("curl", 6);
        let req = request("springboot", "svc", tmp.path());

        let err = generate(&stack("springboot"), &req, &runner).unwrap_err();

        match err {
            GenerateError::CommandFailed { command, exit_code } => {
                assert!(command.starts_with("curl "));
                assert_eq!(exit_code, Some(6));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.calls.borrow().len(), 1, "unzip must not run");
        // The half-created directory is left in place.
        assert!(tmp.path().join("svc").is_dir());
    }

    #[test]
    fn create_dir_conflict_is_a_file_system_error() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("taken")).unwrap();
        let runner = RecordingRunner::default();
        let req = request("python", "taken", tmp.path());

        let err = generate(&stack("python"), &req, &runner).unwrap_err();
        match err {
            GenerateError::FileSystem(fs_err) => {
                assert_eq!(fs_err.operation, FsOperation::CreateDir);
                assert_eq!(fs_err.path, tmp.path().join("taken"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn custom_recipe_needs_no_dispatch_changes() {
        let tmp = TempDir::new().unwrap();
        let deno = StackDefinition {
            id: "deno",
            title: "Deno",
            dependencies: &["deno"],
            recipe: &[
                Step::CreateDir,
                Step::Run {
                    program: "deno",
                    args: &[Arg::Literal("init"), Arg::Literal("--lib")],
                    dir: WorkDir::Project,
                },
                Step::WriteFile {
                    path: "README.md",
                    contents: "# app\n",
                },
            ],
        };
        let runner = RecordingRunner::default();
        let req = request("deno", "lib", tmp.path());

        let report = generate(&deno, &req, &runner).unwrap();

        assert_eq!(report.commands, ["deno init --lib"]);
        assert!(tmp.path().join("lib").join("README.md").is_file());
    }

    #[test]
    fn system_runner_reports_spawn_failure() {
        let tmp = TempDir::new().unwrap();
        let inv = Invocation::new(
            "fresh-stack-no-such-program-xyz",
            ["--help"],
            tmp.path(),
        );
        let err = SystemRunner.run(&inv).unwrap_err();
        assert!(matches!(err, GenerateError::CommandSpawn { .. }));
    }

    #[test]
    fn command_failed_message_includes_exit_code() {
        let err = GenerateError::CommandFailed {
            command: "npm init -y".into(),
            exit_code: Some(1),
        };
        assert_eq!(err.to_string(), "`npm init -y` failed with exit code 1");
    }
}
