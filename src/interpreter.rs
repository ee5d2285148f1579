use crate::env::Environment;
use crate::error::{Result, ShellError};
use crate::fs::{Filesystem, OsFs};
use crate::lexer;
use crate::registry::Registry;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::Path;
use tracing::{debug, warn};

/// A minimal shell-like interpreter for the built-in filesystem commands.
///
/// The interpreter owns the working directory, the [`Registry`] used to look up
/// commands by name, and the [`Filesystem`] the commands operate on. Independent
/// instances share nothing, so tests can run several side by side.
///
/// Example
/// ```
/// use fsh::Interpreter;
/// use fsh::fs::MemFs;
///
/// let mut sh = Interpreter::with_fs(MemFs::new().with_cwd("/tmp/work")).unwrap();
/// sh.run("mkdir", &["sub"]).unwrap();
/// sh.run("cd", &["sub"]).unwrap();
/// assert_eq!(sh.run("pwd", &[]).unwrap(), "/tmp/work/sub\n");
/// ```
pub struct Interpreter<F = OsFs> {
    env: Environment,
    registry: Registry,
    fs: F,
}

impl Interpreter<OsFs> {
    /// Interpreter over the real filesystem, starting in the process's
    /// current directory. `cd` also moves the process.
    pub fn from_process() -> Result<Self> {
        Self::with_fs(OsFs::process())
    }
}

impl<F: Filesystem> Interpreter<F> {
    /// Create an interpreter with the built-in commands and an explicit start directory.
    pub fn new(fs: F, env: Environment) -> Self {
        Self {
            env,
            registry: Registry::with_builtins(),
            fs,
        }
    }

    /// Create an interpreter starting in the filesystem's current directory.
    pub fn with_fs(fs: F) -> Result<Self> {
        let env = Environment::from_fs(&fs)?;
        Ok(Self::new(fs, env))
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Returns the command's output. On failure no output is returned; the
    /// working directory is only ever changed by a successful `cd`.
    pub fn run(&mut self, name: &str, args: &[&str]) -> Result<String> {
        let handler = self.registry.resolve(name)?.handler;
        debug!(command = name, ?args, "dispatching");

        let mut out = Vec::new();
        match handler.run(name, args, &mut out, &mut self.env, &mut self.fs) {
            Ok(()) => Ok(String::from_utf8_lossy(&out).into_owned()),
            Err(e) => {
                warn!(command = name, error = %e, "command failed");
                Err(e)
            }
        }
    }

    /// Split `line` into words, honouring quotes, and run it. A blank line
    /// produces no output.
    pub fn run_line(&mut self, line: &str) -> Result<String> {
        let words = lexer::split_into_words(line)?;
        let Some((name, rest)) = words.split_first() else {
            return Ok(String::new());
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        self.run(name, &args)
    }

    pub fn current_dir(&self) -> &Path {
        self.env.current_dir()
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// One line per registered command: usage and summary.
    pub fn help(&self) -> String {
        let mut out = String::new();
        for descriptor in self.registry.descriptors() {
            out.push_str(&format!("{:<40} {}\n", descriptor.to_string(), descriptor.summary));
        }
        out.push_str(&format!("{:<40} {}\n", "exit", "leave the shell"));
        out
    }

    /// Read-eval-print loop on the terminal.
    ///
    /// Errors are reported and the loop continues; `exit` or end of input stops it.
    pub fn repl(&mut self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            let prompt = format!("{} $ ", self.current_dir().display());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;
                    match trimmed {
                        "exit" => break,
                        "help" => print!("{}", self.help()),
                        _ => match self.run_line(trimmed) {
                            Ok(output) => print!("{}", output),
                            Err(e) => eprintln!("{}", report(trimmed, &e)),
                        },
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

/// Render an error the way the front end shows it: `<command>: <message>`.
pub fn report(line: &str, err: &ShellError) -> String {
    match err {
        ShellError::UnknownCommand(_) => err.to_string(),
        _ => {
            let name = err
                .command()
                .or_else(|| line.split_whitespace().next())
                .unwrap_or_default();
            format!("{}: {}", name, err)
        }
    }
}
