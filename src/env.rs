use std::path::{Path, PathBuf};

use crate::error::{Result, ShellError};
use crate::fs::Filesystem;

/// The shell's working directory.
///
/// Each interpreter owns exactly one of these. It always holds an absolute
/// path, and only `cd` writes it, through [`Environment::set_current_dir`]
/// after the target has been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    current_dir: PathBuf,
}

impl Environment {
    /// Start in `dir`, which must be absolute.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let current_dir = dir.into();
        if !current_dir.is_absolute() {
            return Err(ShellError::InvalidWorkingDirectory(current_dir));
        }
        Ok(Self { current_dir })
    }

    /// Capture the filesystem's current directory in canonical form.
    pub fn from_fs(fs: &dyn Filesystem) -> Result<Self> {
        let dir = fs
            .current_dir()
            .map_err(|e| ShellError::from_io(e, "."))?;
        let dir = fs.canonicalize(&dir).map_err(|e| ShellError::from_io(e, &dir))?;
        Self::new(dir)
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// Resolve user input against the working directory.
    ///
    /// Absolute input is returned as is; `.` and `..` are left for the
    /// filesystem to interpret.
    pub fn resolve(&self, input: impl AsRef<Path>) -> PathBuf {
        let input = input.as_ref();
        if input.is_absolute() {
            input.to_path_buf()
        } else {
            self.current_dir.join(input)
        }
    }

    pub(crate) fn set_current_dir(&mut self, dir: PathBuf) {
        debug_assert!(dir.is_absolute());
        self.current_dir = dir;
    }
}
