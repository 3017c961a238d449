use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// The filesystem step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    List,
    Metadata,
    Read,
    Rename,
    Create,
    Remove,
    Copy,
    Move,
}

impl fmt::Display for FsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            FsOp::List => "list",
            FsOp::Metadata => "read metadata of",
            FsOp::Read => "read",
            FsOp::Rename => "rename",
            FsOp::Create => "create",
            FsOp::Remove => "remove",
            FsOp::Copy => "copy",
            FsOp::Move => "move",
        };
        f.write_str(verb)
    }
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// A filesystem read or mutation failed on a specific path.
    #[error("cannot {op} {}: {source}", .path.display())]
    Filesystem {
        op: FsOp,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tree root is not a directory.
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// The tree root has no entries to browse.
    #[error("can't initialize on empty directory '{}'", .0.display())]
    EmptyDirectory(PathBuf),

    /// A user-supplied entry name was rejected before touching disk.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// I/O errors from terminal handling.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl AppError {
    /// Wrap an `io::Error` with the operation and path it failed on.
    pub fn fs(op: FsOp, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Filesystem {
            op,
            path: path.into(),
            source,
        }
    }

    /// The underlying `io::ErrorKind`, if this is a filesystem failure.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            AppError::Filesystem { source, .. } | AppError::Io(source) => Some(source.kind()),
            _ => None,
        }
    }
}
