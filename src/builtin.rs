use crate::command::{CommandDescriptor, OptionSpec};
use crate::env::Environment;
use crate::error::{Result, ShellError};
use crate::fs::{EntryKind, Filesystem};
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use tracing::{debug, info};

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process against the shell's [`Environment`] and [`Filesystem`].
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "ls" or "cd".
    fn name() -> &'static str;

    /// What the command accepts, for registration and help output.
    fn descriptor() -> CommandDescriptor;

    /// Executes the command, writing any output to `stdout`.
    ///
    /// On error nothing written to `stdout` is shown to the user.
    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        fs: &mut dyn Filesystem,
    ) -> Result<()>;
}

/// Closed set of built-ins. The registry maps names to these tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Touch,
    Ls,
    Pwd,
    Cd,
    Mkdir,
}

impl Builtin {
    pub const ALL: [Builtin; 5] = [
        Builtin::Touch,
        Builtin::Ls,
        Builtin::Pwd,
        Builtin::Cd,
        Builtin::Mkdir,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Touch => Touch::name(),
            Builtin::Ls => Ls::name(),
            Builtin::Pwd => Pwd::name(),
            Builtin::Cd => Cd::name(),
            Builtin::Mkdir => Mkdir::name(),
        }
    }

    pub fn descriptor(self) -> CommandDescriptor {
        match self {
            Builtin::Touch => Touch::descriptor(),
            Builtin::Ls => Ls::descriptor(),
            Builtin::Pwd => Pwd::descriptor(),
            Builtin::Cd => Cd::descriptor(),
            Builtin::Mkdir => Mkdir::descriptor(),
        }
    }

    /// Parse `args` as registered under `name` and run the command.
    pub(crate) fn run(
        self,
        name: &str,
        args: &[&str],
        stdout: &mut dyn Write,
        env: &mut Environment,
        fs: &mut dyn Filesystem,
    ) -> Result<()> {
        match self {
            Builtin::Touch => parse_and_execute::<Touch>(name, args, stdout, env, fs),
            Builtin::Ls => parse_and_execute::<Ls>(name, args, stdout, env, fs),
            Builtin::Pwd => parse_and_execute::<Pwd>(name, args, stdout, env, fs),
            Builtin::Cd => parse_and_execute::<Cd>(name, args, stdout, env, fs),
            Builtin::Mkdir => parse_and_execute::<Mkdir>(name, args, stdout, env, fs),
        }
    }
}

fn parse_and_execute<T: BuiltinCommand>(
    name: &str,
    args: &[&str],
    stdout: &mut dyn Write,
    env: &mut Environment,
    fs: &mut dyn Filesystem,
) -> Result<()> {
    match T::from_args(&[name], args) {
        Ok(cmd) => cmd.execute(stdout, env, fs),
        // --help
        Err(EarlyExit {
            output,
            status: Ok(()),
        }) => write_out(stdout, &output),
        Err(EarlyExit {
            output,
            status: Err(()),
        }) => Err(ShellError::InvalidArguments(
            name.to_string(),
            output.trim().to_string(),
        )),
    }
}

fn write_out(stdout: &mut dyn Write, text: &str) -> Result<()> {
    stdout.write_all(text.as_bytes()).map_err(|e| ShellError::Io {
        path: "<stdout>".into(),
        source: e,
    })
}

#[derive(FromArgs)]
/// create an empty file, or update the modification time of an existing one.
pub struct Touch {
    #[argh(positional)]
    /// file to create or touch; relative paths start at the current directory.
    pub path: Option<String>,
}

impl BuiltinCommand for Touch {
    fn name() -> &'static str {
        "touch"
    }

    fn descriptor() -> CommandDescriptor {
        CommandDescriptor::new(Self::name(), "create a file or update its timestamp")
            .arg("path", true)
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        fs: &mut dyn Filesystem,
    ) -> Result<()> {
        let path = self.path.ok_or(ShellError::MissingArgument {
            command: "touch",
            argument: "path",
        })?;
        let target = env.resolve(&path);

        match fs.metadata(&target) {
            Ok(EntryKind::Directory) => Err(ShellError::IsADirectory(target)),
            Ok(EntryKind::File) => fs
                .touch(&target)
                .map_err(|e| ShellError::from_io(e, &target)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                fs.create_file(&target)
                    .map_err(|e| ShellError::from_io(e, &target))?;
                debug!(path = %target.display(), "created file");
                Ok(())
            }
            Err(e) => Err(ShellError::from_io(e, &target)),
        }
    }
}

#[derive(FromArgs)]
/// list the entries of a directory, one name per line, sorted.
pub struct Ls {
    #[argh(positional)]
    /// directory to list. Defaults to the current directory.
    pub target: Option<String>,

    #[argh(option, short = 'd')]
    /// directory to list; takes precedence over the positional argument.
    pub directory: Option<String>,
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn descriptor() -> CommandDescriptor {
        CommandDescriptor::new(Self::name(), "list directory contents")
            .arg("directory", false)
            .option("directory", OptionSpec::string(Some('d')))
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        fs: &mut dyn Filesystem,
    ) -> Result<()> {
        let target = match self.directory.or(self.target) {
            Some(dir) => env.resolve(dir),
            None => env.current_dir().to_path_buf(),
        };

        match fs.metadata(&target) {
            Ok(EntryKind::Directory) => {}
            Ok(EntryKind::File) => return Err(ShellError::NotADirectory(target)),
            Err(e) => return Err(ShellError::from_io(e, &target)),
        }

        let mut names: Vec<String> = fs
            .read_dir(&target)
            .map_err(|e| ShellError::from_io(e, &target))?
            .into_iter()
            .map(|entry| entry.name)
            .filter(|name| name != "." && name != "..")
            .collect();
        names.sort();

        let mut listing = String::new();
        for name in names {
            listing.push_str(&name);
            listing.push('\n');
        }
        write_out(stdout, &listing)
    }
}

#[derive(FromArgs)]
/// print the current working directory.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn descriptor() -> CommandDescriptor {
        CommandDescriptor::new(Self::name(), "print the working directory")
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        fs: &mut dyn Filesystem,
    ) -> Result<()> {
        let cwd = env.current_dir();
        match fs.metadata(cwd) {
            Ok(EntryKind::Directory) => {}
            _ => return Err(ShellError::InvalidWorkingDirectory(cwd.to_path_buf())),
        }
        write_out(stdout, &format!("{}\n", cwd.display()))
    }
}

#[derive(FromArgs)]
/// change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn descriptor() -> CommandDescriptor {
        CommandDescriptor::new(Self::name(), "change the working directory").arg("path", true)
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        fs: &mut dyn Filesystem,
    ) -> Result<()> {
        let target = self.target.ok_or(ShellError::MissingArgument {
            command: "cd",
            argument: "path",
        })?;
        let new_dir = env.resolve(&target);

        let canonical = fs
            .canonicalize(&new_dir)
            .map_err(|e| ShellError::from_io(e, &new_dir))?;
        match fs.metadata(&canonical) {
            Ok(EntryKind::Directory) => {}
            Ok(EntryKind::File) => return Err(ShellError::NotADirectory(canonical)),
            Err(e) => return Err(ShellError::from_io(e, &canonical)),
        }

        fs.set_current_dir(&canonical)
            .map_err(|e| ShellError::from_io(e, &canonical))?;
        info!(from = %env.current_dir().display(), to = %canonical.display(), "changed directory");
        env.set_current_dir(canonical);
        Ok(())
    }
}

#[derive(FromArgs)]
/// create a directory.
pub struct Mkdir {
    #[argh(positional)]
    /// directory to create; relative paths start at the current directory.
    pub path: Option<String>,

    #[argh(switch, short = 'p')]
    /// create missing parent directories; an existing directory is not an error.
    pub parents: bool,
}

impl BuiltinCommand for Mkdir {
    fn name() -> &'static str {
        "mkdir"
    }

    fn descriptor() -> CommandDescriptor {
        CommandDescriptor::new(Self::name(), "create a directory")
            .arg("path", true)
            .option("parents", OptionSpec::switch(Some('p')))
    }

    fn execute(
        self,
        _stdout: &mut dyn Write,
        env: &mut Environment,
        fs: &mut dyn Filesystem,
    ) -> Result<()> {
        let path = self.path.ok_or(ShellError::MissingArgument {
            command: "mkdir",
            argument: "path",
        })?;
        let target = env.resolve(&path);

        match fs.metadata(&target) {
            Ok(EntryKind::Directory) if self.parents => return Ok(()),
            Ok(_) => return Err(ShellError::AlreadyExists(target)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ShellError::from_io(e, &target)),
        }

        let created = if self.parents {
            fs.create_dir_all(&target)
        } else {
            fs.create_dir(&target)
        };
        created.map_err(|e| ShellError::from_io(e, &target))?;
        info!(path = %target.display(), parents = self.parents, "created directory");
        Ok(())
    }
}
