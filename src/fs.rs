//! Filesystem access used by the built-ins.
//!
//! Handlers only ever talk to a [`Filesystem`]. [`OsFs`] forwards to the
//! operating system, [`MemFs`] keeps a tree in memory so command logic can be
//! tested without touching the disk.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Kind of a filesystem entry as seen by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One immediate child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Narrow capability interface over the filesystem primitives the shell needs.
///
/// All paths passed in are absolute; resolving relative input against the
/// working directory is the caller's job.
pub trait Filesystem {
    /// Kind of the entry at `path`, following symlinks.
    fn metadata(&self, path: &Path) -> io::Result<EntryKind>;

    /// Create a new empty regular file. Fails if anything exists at `path`.
    fn create_file(&mut self, path: &Path) -> io::Result<()>;

    /// Set the modification time of an existing file to now.
    fn touch(&mut self, path: &Path) -> io::Result<()>;

    /// Immediate children of a directory, without `.` and `..`, in no
    /// particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Create exactly one directory; its parent must exist.
    fn create_dir(&mut self, path: &Path) -> io::Result<()>;

    /// Create a directory and every missing ancestor.
    fn create_dir_all(&mut self, path: &Path) -> io::Result<()>;

    /// Absolute canonical form of an existing path.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    fn current_dir(&self) -> io::Result<PathBuf>;

    fn set_current_dir(&mut self, path: &Path) -> io::Result<()>;
}

/// The real filesystem.
///
/// A detached instance never touches the process working directory: the
/// shell's own state is the only notion of "current directory". The
/// process-bound instance returned by [`OsFs::process`] mirrors every
/// successful `cd` into the process as well.
#[derive(Debug, Clone, Default)]
pub struct OsFs {
    sync_process_cwd: bool,
}

impl OsFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filesystem whose `set_current_dir` also moves the process.
    pub fn process() -> Self {
        Self {
            sync_process_cwd: true,
        }
    }
}

impl Filesystem for OsFs {
    fn metadata(&self, path: &Path) -> io::Result<EntryKind> {
        let meta = fs::metadata(path)?;
        Ok(if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        })
    }

    fn create_file(&mut self, path: &Path) -> io::Result<()> {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(drop)
    }

    #[cfg(unix)]
    fn touch(&mut self, path: &Path) -> io::Result<()> {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // Null times mean "now", which needs write access rather than ownership.
        let rc = unsafe { libc::utimensat(libc::AT_FDCWD, c_path.as_ptr(), std::ptr::null(), 0) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(unix))]
    fn touch(&mut self, path: &Path) -> io::Result<()> {
        filetime::set_file_mtime(path, filetime::FileTime::now())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let kind = if entry.file_type()?.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        Ok(entries)
    }

    fn create_dir(&mut self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn set_current_dir(&mut self, path: &Path) -> io::Result<()> {
        if self.sync_process_cwd {
            std::env::set_current_dir(path)?;
        }
        Ok(())
    }
}

/// Lexically normalize an absolute path: drop `.`, fold `..` into its parent.
///
/// `..` at the root stays at the root, as it does on a real filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out = PathBuf::from(prefix.as_os_str()),
            Component::RootDir => out.push("/"),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

#[derive(Debug, Clone)]
struct MemNode {
    kind: EntryKind,
    contents: Vec<u8>,
    modified: u64,
}

/// In-memory filesystem rooted at `/`.
///
/// Modification times come from a logical clock that advances on every
/// write, so tests can observe `touch` deterministically. Paths marked with
/// [`MemFs::deny`] reject reads and writes with `PermissionDenied`.
#[derive(Debug, Clone)]
pub struct MemFs {
    nodes: BTreeMap<PathBuf, MemNode>,
    denied: BTreeSet<PathBuf>,
    cwd: PathBuf,
    clock: u64,
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemFs {
    /// An empty tree containing only `/`, which is also the working directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            PathBuf::from("/"),
            MemNode {
                kind: EntryKind::Directory,
                contents: Vec::new(),
                modified: 0,
            },
        );
        Self {
            nodes,
            denied: BTreeSet::new(),
            cwd: PathBuf::from("/"),
            clock: 0,
        }
    }

    /// Builder: create `path` and its ancestors as directories.
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        let path = normalize(path.as_ref());
        for ancestor in path.ancestors().collect::<Vec<_>>().into_iter().rev() {
            self.insert(ancestor, EntryKind::Directory, Vec::new());
        }
        self
    }

    /// Builder: create a file with `contents`, creating missing ancestors.
    pub fn with_file(self, path: impl AsRef<Path>, contents: &[u8]) -> Self {
        let path = normalize(path.as_ref());
        let mut fs = match path.parent() {
            Some(parent) => self.with_dir(parent),
            None => self,
        };
        fs.insert(&path, EntryKind::File, contents.to_vec());
        fs
    }

    /// Builder: start in `path`, creating it if needed.
    pub fn with_cwd(self, path: impl AsRef<Path>) -> Self {
        let path = normalize(path.as_ref());
        let mut fs = self.with_dir(&path);
        fs.cwd = path;
        fs
    }

    /// Make `path` unreadable and unwritable.
    pub fn deny(&mut self, path: impl AsRef<Path>) {
        self.denied.insert(normalize(path.as_ref()));
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<&[u8]> {
        self.nodes
            .get(&normalize(path.as_ref()))
            .filter(|node| node.kind == EntryKind::File)
            .map(|node| node.contents.as_slice())
    }

    /// Logical modification time of `path`.
    pub fn modified(&self, path: impl AsRef<Path>) -> Option<u64> {
        self.nodes
            .get(&normalize(path.as_ref()))
            .map(|node| node.modified)
    }

    /// Remove `path` and everything below it.
    pub fn remove(&mut self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        self.nodes.retain(|p, _| !p.starts_with(&path));
    }

    fn insert(&mut self, path: &Path, kind: EntryKind, contents: Vec<u8>) {
        if self.nodes.contains_key(path) {
            return;
        }
        self.clock += 1;
        self.nodes.insert(
            path.to_path_buf(),
            MemNode {
                kind,
                contents,
                modified: self.clock,
            },
        );
    }

    /// Resolve `path` the way the kernel does: every component before the
    /// last must be an existing directory, so `missing/..` does not resolve.
    fn walk(&self, path: &Path) -> io::Result<PathBuf> {
        let mut out = PathBuf::from("/");
        for component in path.components() {
            if matches!(component, Component::Prefix(_) | Component::RootDir) {
                continue;
            }
            match self.nodes.get(&out) {
                None => return Err(io::Error::from(io::ErrorKind::NotFound)),
                Some(node) if node.kind != EntryKind::Directory => {
                    return Err(io::Error::from(io::ErrorKind::NotADirectory));
                }
                Some(_) => {}
            }
            match component {
                Component::ParentDir => {
                    out.pop();
                }
                Component::Normal(part) => out.push(part),
                _ => {}
            }
        }
        Ok(out)
    }

    fn check_access(&self, path: &Path) -> io::Result<()> {
        if self.denied.contains(path) {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        } else {
            Ok(())
        }
    }

    /// Ensure `path` can be created: parent exists, is a directory and is
    /// writable, and nothing is at `path` yet.
    fn check_creatable(&self, path: &Path) -> io::Result<()> {
        if self.nodes.contains_key(path) {
            return Err(io::Error::from(io::ErrorKind::AlreadyExists));
        }
        let parent = path.parent().unwrap_or(Path::new("/"));
        match self.nodes.get(parent) {
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
            Some(node) if node.kind != EntryKind::Directory => {
                Err(io::Error::from(io::ErrorKind::NotADirectory))
            }
            Some(_) => self.check_access(parent),
        }
    }
}

impl Filesystem for MemFs {
    fn metadata(&self, path: &Path) -> io::Result<EntryKind> {
        self.nodes
            .get(&self.walk(path)?)
            .map(|node| node.kind)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn create_file(&mut self, path: &Path) -> io::Result<()> {
        let path = self.walk(path)?;
        self.check_creatable(&path)?;
        self.insert(&path, EntryKind::File, Vec::new());
        Ok(())
    }

    fn touch(&mut self, path: &Path) -> io::Result<()> {
        let path = self.walk(path)?;
        self.check_access(&path)?;
        self.clock += 1;
        let clock = self.clock;
        let node = self
            .nodes
            .get_mut(&path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        node.modified = clock;
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let path = self.walk(path)?;
        match self.nodes.get(&path) {
            None => return Err(io::Error::from(io::ErrorKind::NotFound)),
            Some(node) if node.kind != EntryKind::Directory => {
                return Err(io::Error::from(io::ErrorKind::NotADirectory));
            }
            Some(_) => {}
        }
        self.check_access(&path)?;
        Ok(self
            .nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(path.as_path()))
            .filter_map(|(p, node)| {
                p.file_name().map(|name| DirEntry {
                    name: name.to_string_lossy().into_owned(),
                    kind: node.kind,
                })
            })
            .collect())
    }

    fn create_dir(&mut self, path: &Path) -> io::Result<()> {
        let path = self.walk(path)?;
        self.check_creatable(&path)?;
        self.insert(&path, EntryKind::Directory, Vec::new());
        Ok(())
    }

    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        let ancestors: Vec<PathBuf> = path.ancestors().map(Path::to_path_buf).collect();
        for dir in ancestors.iter().rev() {
            match self.nodes.get(dir) {
                Some(node) if node.kind == EntryKind::Directory => continue,
                Some(_) => return Err(io::Error::from(io::ErrorKind::NotADirectory)),
                None => self.create_dir(dir)?,
            }
        }
        Ok(())
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let path = self.walk(path)?;
        self.metadata(&path)?;
        Ok(path)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        Ok(self.cwd.clone())
    }

    fn set_current_dir(&mut self, path: &Path) -> io::Result<()> {
        let path = self.walk(path)?;
        match self.metadata(&path)? {
            EntryKind::Directory => {
                self.cwd = path;
                Ok(())
            }
            EntryKind::File => Err(io::Error::from(io::ErrorKind::NotADirectory)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_dot_segments() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../..")), PathBuf::from("/"));
        assert_eq!(normalize(Path::new("/a/b/")), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_memfs_read_dir_lists_immediate_children_only() {
        let fs = MemFs::new()
            .with_file("/w/a.txt", b"a")
            .with_dir("/w/sub/deep");
        let mut names: Vec<String> = fs
            .read_dir(Path::new("/w"))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "sub"]);
    }

    #[test]
    fn test_memfs_create_requires_parent() {
        let mut fs = MemFs::new();
        let err = fs.create_dir(Path::new("/missing/child")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        fs.create_dir_all(Path::new("/missing/child")).unwrap();
        assert_eq!(
            fs.metadata(Path::new("/missing/child")).unwrap(),
            EntryKind::Directory
        );
    }

    #[test]
    fn test_memfs_create_file_twice_fails() {
        let mut fs = MemFs::new();
        fs.create_file(Path::new("/f")).unwrap();
        let err = fs.create_file(Path::new("/f")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_memfs_touch_advances_clock() {
        let mut fs = MemFs::new().with_file("/f", b"keep");
        let before = fs.modified("/f").unwrap();
        fs.touch(Path::new("/f")).unwrap();
        assert!(fs.modified("/f").unwrap() > before);
        assert_eq!(fs.contents("/f"), Some(&b"keep"[..]));
    }

    #[test]
    fn test_memfs_denied_directory() {
        let mut fs = MemFs::new().with_dir("/locked");
        fs.deny("/locked");
        assert_eq!(
            fs.read_dir(Path::new("/locked")).unwrap_err().kind(),
            io::ErrorKind::PermissionDenied
        );
        assert_eq!(
            fs.create_file(Path::new("/locked/f")).unwrap_err().kind(),
            io::ErrorKind::PermissionDenied
        );
    }

    #[test]
    fn test_memfs_set_current_dir_rejects_files() {
        let mut fs = MemFs::new().with_file("/f", b"");
        let err = fs.set_current_dir(Path::new("/f")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotADirectory);
        assert_eq!(fs.current_dir().unwrap(), PathBuf::from("/"));
    }

    #[test]
    fn test_osfs_create_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut fs = OsFs::new();
        fs.create_file(&dir.path().join("one")).unwrap();
        fs.create_dir(&dir.path().join("two")).unwrap();

        let mut entries = fs.read_dir(dir.path()).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            entries,
            vec![
                DirEntry {
                    name: "one".to_string(),
                    kind: EntryKind::File
                },
                DirEntry {
                    name: "two".to_string(),
                    kind: EntryKind::Directory
                },
            ]
        );
    }

    #[test]
    fn test_detached_osfs_leaves_process_cwd_alone() {
        let dir = tempfile::tempdir().unwrap();
        let before = std::env::current_dir().unwrap();
        let mut fs = OsFs::new();
        fs.set_current_dir(dir.path()).unwrap();
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_memfs_parent_of_missing_component_does_not_resolve() {
        let fs = MemFs::new().with_dir("/w").with_file("/w/f", b"");
        assert_eq!(
            fs.canonicalize(Path::new("/w/missing/..")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(
            fs.canonicalize(Path::new("/w/f/..")).unwrap_err().kind(),
            io::ErrorKind::NotADirectory
        );
        assert_eq!(
            fs.canonicalize(Path::new("/w/./../w")).unwrap(),
            PathBuf::from("/w")
        );
    }

    #[test]
    fn test_osfs_touch_sets_mtime_to_now() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old");
        std::fs::write(&path, "kept").unwrap();
        let old = filetime::FileTime::from_unix_time(1_000_000, 0);
        filetime::set_file_mtime(&path, old).unwrap();

        let mut fs = OsFs::new();
        fs.touch(&path).unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        let now = filetime::FileTime::now().unix_seconds();
        let touched = filetime::FileTime::from_last_modification_time(&meta).unix_seconds();
        assert!(touched > old.unix_seconds());
        assert!((now - touched).abs() < 60);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "kept");
    }

    #[test]
    fn test_osfs_touch_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = OsFs::new().touch(&dir.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
