//! A tiny shell with a fixed set of filesystem built-ins.
//!
//! This crate implements `touch`, `ls`, `pwd`, `cd` and `mkdir` in Rust and
//! dispatches them by name. Each [`Interpreter`] owns its working directory and
//! talks to the disk only through the [`fs::Filesystem`] trait, so the same
//! command logic runs against the real filesystem ([`fs::OsFs`]) or an
//! in-memory tree ([`fs::MemFs`]).
//!
//! The public modules [`command`], [`registry`] and [`env`] expose command
//! descriptors, the dispatch table and the working-directory state.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod fs;
mod interpreter;
pub mod lexer;
pub mod logging;
pub mod registry;

pub use builtin::Builtin;
pub use error::{Result, ShellError};

/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::{Interpreter, report};
