use std::fmt;
use std::path::{Path, PathBuf};

use crate::BoxedIncludeProviderError;

/// Identity of a source file, as understood by the `IncludeProvider`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileId(pub PathBuf);

impl FileId {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileId(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Directory containing this file, used for quoted includes.
    pub fn dir(&self) -> Option<&Path> {
        self.0.parent()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&str> for FileId {
    fn from(path: &str) -> Self {
        FileId(PathBuf::from(path))
    }
}

/// Host-supplied file access used by the include crawler.
pub trait IncludeProvider {
    /// Ordered list of directories to search for includes found in `file`.
    fn search_paths(&self, file: &FileId) -> Vec<PathBuf>;

    fn file_exists(&self, dir: &Path, relative: &str) -> bool;

    fn read_file(&self, file: &FileId) -> Result<String, BoxedIncludeProviderError>;
}

/// `IncludeProvider` backed by the local file system and a fixed list of include directories.
#[derive(Clone, Debug, Default)]
pub struct FsIncludeProvider {
    include_dirs: Vec<PathBuf>,
}

impl FsIncludeProvider {
    pub fn new(include_dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        FsIncludeProvider {
            include_dirs: include_dirs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }
}

impl IncludeProvider for FsIncludeProvider {
    fn search_paths(&self, _file: &FileId) -> Vec<PathBuf> {
        self.include_dirs.clone()
    }

    fn file_exists(&self, dir: &Path, relative: &str) -> bool {
        dir.join(relative).is_file()
    }

    fn read_file(&self, file: &FileId) -> Result<String, BoxedIncludeProviderError> {
        Ok(std::fs::read_to_string(file.path())?)
    }
}
