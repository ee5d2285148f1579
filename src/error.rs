use std::io;
use std::path::{Path, PathBuf};

/// Result alias used throughout the engine.
pub type Result<T, E = ShellError> = std::result::Result<T, E>;

/// Every way a built-in can fail.
///
/// Handlers never recover locally: an OS failure is mapped to the nearest
/// variant with [`ShellError::from_io`] and handed straight back to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("missing operand: {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("command already registered: {0}")]
    DuplicateCommand(String),

    #[error("command not found: {0}")]
    UnknownCommand(String),

    #[error("invalid arguments: {1}")]
    InvalidArguments(String, String),

    #[error("syntax error: {0}")]
    Syntax(#[from] crate::lexer::LexingError),

    #[error("{}: no such file or directory", .0.display())]
    PathNotFound(PathBuf),

    #[error("{}: not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("{}: is a directory", .0.display())]
    IsADirectory(PathBuf),

    #[error("{}: already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("{}: permission denied", .0.display())]
    PermissionDenied(PathBuf),

    #[error("{}: working directory no longer exists", .0.display())]
    InvalidWorkingDirectory(PathBuf),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ShellError {
    /// Translate an OS error raised while operating on `path`.
    pub fn from_io(err: io::Error, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => ShellError::PathNotFound(path),
            io::ErrorKind::NotADirectory => ShellError::NotADirectory(path),
            io::ErrorKind::IsADirectory => ShellError::IsADirectory(path),
            io::ErrorKind::AlreadyExists => ShellError::AlreadyExists(path),
            io::ErrorKind::PermissionDenied => ShellError::PermissionDenied(path),
            _ => ShellError::Io { path, source: err },
        }
    }

    /// Name of the command this error is attributed to, when it carries one.
    pub fn command(&self) -> Option<&str> {
        match self {
            ShellError::MissingArgument { command, .. } => Some(*command),
            ShellError::InvalidArguments(command, _) => Some(command.as_str()),
            ShellError::UnknownCommand(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_maps_error_kinds() {
        let p = Path::new("/x");
        let cases = [
            (io::ErrorKind::NotFound, "PathNotFound"),
            (io::ErrorKind::NotADirectory, "NotADirectory"),
            (io::ErrorKind::IsADirectory, "IsADirectory"),
            (io::ErrorKind::AlreadyExists, "AlreadyExists"),
            (io::ErrorKind::PermissionDenied, "PermissionDenied"),
            (io::ErrorKind::Other, "Io"),
        ];
        for (kind, expected) in cases {
            let err = ShellError::from_io(io::Error::from(kind), p);
            let debug = format!("{:?}", err);
            assert!(
                debug.starts_with(expected),
                "{:?} mapped to {}",
                kind,
                debug
            );
        }
    }

    #[test]
    fn test_display_includes_path() {
        let err = ShellError::PathNotFound(PathBuf::from("/tmp/nope"));
        assert_eq!(err.to_string(), "/tmp/nope: no such file or directory");

        let err = ShellError::MissingArgument {
            command: "cd",
            argument: "path",
        };
        assert_eq!(err.to_string(), "missing operand: path");
        assert_eq!(err.command(), Some("cd"));
    }
}
