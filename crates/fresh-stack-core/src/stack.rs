//! Stack registry and generation recipes.
//!
//! Each [`StackDefinition`] pairs the executables a stack needs with the
//! [`Step`]s that produce a new project. The dispatch in
//! [`generate`](crate::generate) only interprets steps, so adding a stack
//! is a matter of adding an entry to [`BUILTIN_STACKS`].

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Organization id passed to `flutter create` and the Gradle patcher.
pub const FLUTTER_ORG: &str = "com.example";

/// Where Spring Initializr serves the default starter archive.
pub const SPRING_STARTER_URL: &str = "https://start.spring.io/starter.zip";

/// One argument of an external invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "value")]
pub enum Arg {
    /// Passed through as written.
    Literal(&'static str),
    /// Replaced by the app name at dispatch time.
    AppName,
}

impl Arg {
    /// Render the argument for a concrete app name.
    pub fn render(self, app_name: &str) -> String {
        match self {
            Self::Literal(value) => value.to_string(),
            Self::AppName => app_name.to_string(),
        }
    }
}

/// Working directory for an external invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkDir {
    /// The directory the project is created in.
    Parent,
    /// The project directory itself.
    Project,
}

/// A single action in a generation recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "step")]
pub enum Step {
    /// Run an external program with inherited stdio.
    Run {
        /// Executable name, resolved on `PATH`.
        program: &'static str,
        /// Argument list.
        args: &'static [Arg],
        /// Directory to run in.
        dir: WorkDir,
    },
    /// Create the project directory.
    CreateDir,
    /// Write a file relative to the project directory.
    WriteFile {
        /// Relative path.
        path: &'static str,
        /// Literal file content.
        contents: &'static str,
    },
    /// Remove a file relative to the project directory.
    RemoveFile {
        /// Relative path.
        path: &'static str,
    },
    /// Rewrite the generated Android build files to the Groovy dialect.
    PatchGradle {
        /// Organization id used for the application id.
        organization: &'static str,
    },
}

/// A named stack and how to generate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StackDefinition {
    /// Key used for selection (e.g. `"react-native"`).
    pub id: &'static str,
    /// Human-readable name.
    pub title: &'static str,
    /// Executables that must resolve on `PATH`, in check order.
    pub dependencies: &'static [&'static str],
    /// Ordered generation steps.
    pub recipe: &'static [Step],
}

impl fmt::Display for StackDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.id)
    }
}

const fn npx(args: &'static [Arg]) -> Step {
    Step::Run {
        program: "npx",
        args,
        dir: WorkDir::Parent,
    }
}

/// The stacks shipped with fresh-stack, in menu order.
pub const BUILTIN_STACKS: &[StackDefinition] = &[
    StackDefinition {
        id: "react",
        title: "ReactJS",
        dependencies: &["node", "npx"],
        recipe: &[npx(&[Arg::Literal("create-react-app"), Arg::AppName])],
    },
    StackDefinition {
        id: "react-native",
        title: "React Native",
        dependencies: &["node", "npx"],
        recipe: &[npx(&[
            Arg::Literal("react-native"),
            Arg::Literal("init"),
            Arg::AppName,
        ])],
    },
    StackDefinition {
        id: "flutter",
        title: "Flutter",
        dependencies: &["flutter"],
        recipe: &[
            Step::Run {
                program: "flutter",
                args: &[
                    Arg::Literal("create"),
                    Arg::AppName,
                    Arg::Literal("--org"),
                    Arg::Literal(FLUTTER_ORG),
                    Arg::Literal("-a"),
                    Arg::Literal("kotlin"),
                    Arg::Literal("-i"),
                    Arg::Literal("swift"),
                ],
                dir: WorkDir::Parent,
            },
            Step::PatchGradle {
                organization: FLUTTER_ORG,
            },
        ],
    },
    StackDefinition {
        id: "springboot",
        title: "Spring Boot (Java)",
        dependencies: &["java", "curl", "unzip"],
        recipe: &[
            Step::CreateDir,
            Step::Run {
                program: "curl",
                args: &[
                    Arg::Literal(SPRING_STARTER_URL),
                    Arg::Literal("-o"),
                    Arg::Literal("starter.zip"),
                ],
                dir: WorkDir::Project,
            },
            Step::Run {
                program: "unzip",
                args: &[Arg::Literal("starter.zip")],
                dir: WorkDir::Project,
            },
            Step::RemoveFile {
                path: "starter.zip",
            },
        ],
    },
    StackDefinition {
        id: "nest",
        title: "NestJS",
        dependencies: &["node", "npx"],
        recipe: &[npx(&[
            Arg::Literal("@nestjs/cli"),
            Arg::Literal("new"),
            Arg::AppName,
        ])],
    },
    StackDefinition {
        id: "node",
        title: "Node.js",
        dependencies: &["node"],
        recipe: &[
            Step::CreateDir,
            Step::Run {
                program: "npm",
                args: &[Arg::Literal("init"), Arg::Literal("-y")],
                dir: WorkDir::Project,
            },
        ],
    },
    StackDefinition {
        id: "python",
        title: "Python",
        dependencies: &["python3"],
        recipe: &[
            Step::CreateDir,
            Step::WriteFile {
                path: "main.py",
                contents: "# Start your Python app here\n",
            },
        ],
    },
];

/// The requested stack id is not registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown stack '{0}'")]
pub struct UnknownStack(pub String);

/// Read-only lookup over a set of stacks.
#[derive(Debug, Clone)]
pub struct Registry {
    stacks: Vec<StackDefinition>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// Registry holding [`BUILTIN_STACKS`].
    pub fn builtin() -> Self {
        Self::new(BUILTIN_STACKS.to_vec())
    }

    /// Registry over an arbitrary stack list.
    pub const fn new(stacks: Vec<StackDefinition>) -> Self {
        Self { stacks }
    }

    /// Find a stack by id.
    pub fn lookup(&self, id: &str) -> Result<&StackDefinition, UnknownStack> {
        self.stacks
            .iter()
            .find(|stack| stack.id == id)
            .ok_or_else(|| UnknownStack(id.to_string()))
    }

    /// All stacks in menu order.
    pub fn list_all(&self) -> &[StackDefinition] {
        &self.stacks
    }
}
