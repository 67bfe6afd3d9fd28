//! Core library for fresh-stack.
//!
//! This crate holds everything the `fresh-stack` CLI does that does not
//! touch a terminal: the stack catalogue, dependency checks, recipe
//! execution, the Flutter Gradle fix-up, directory backups, and the
//! workflow that ties them together.
//!
//! # Modules
//!
//! - [`backup`] - Move an existing directory aside before overwriting
//! - [`config`] - Configuration loading and management
//! - [`deps`] - Executable lookup on `PATH`
//! - [`error`] - Error types and result aliases
//! - [`generate`] - Recipe execution and command running
//! - [`gradle`] - Flutter Android build file templates
//! - [`name`] - App name validation
//! - [`stack`] - Stack definitions and the registry
//! - [`workflow`] - The interactive scaffolding sequence
//!
//! # Quick Start
//!
//! ```no_run
//! use fresh_stack_core::deps::PathLookup;
//! use fresh_stack_core::generate::{self, GenerationRequest, SystemRunner};
//! use fresh_stack_core::name::AppName;
//! use fresh_stack_core::stack::Registry;
//!
//! let registry = Registry::builtin();
//! let stack = registry.lookup("python").expect("builtin stack");
//! let name = AppName::parse("my_app").expect("valid name");
//! let request = GenerationRequest::new(stack.id, name, std::path::Path::new("."));
//!
//! generate::generate(stack, &request, &SystemRunner).expect("generation failed");
//! # let _ = PathLookup;
//! ```
#![deny(unsafe_code)]

pub mod backup;

pub mod config;

pub mod deps;

pub mod error;

pub mod generate;

pub mod gradle;

pub mod name;

pub mod stack;

pub mod workflow;

pub use config::{Config, ConfigLoader, LogLevel};

pub use error::{ConfigError, ConfigResult, FileSystemError};

pub use name::AppName;

pub use stack::{Registry, StackDefinition};

pub use workflow::{Event, Interaction, Outcome, Workflow, WorkflowError};
