use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{AppError, FsOp, Result};

/// Prefix prepended to a name until it no longer collides in the target directory.
pub const COPY_PREFIX: &str = "copy_";

/// Filesystem mutations consumed by the tree.
///
/// Each call either succeeds or fails as a whole from the caller's point of
/// view; partial effects of a failed recursive copy or removal are not reported.
pub trait FileOps {
    /// Rename (move within a filesystem) `from` to `to`.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    /// Create an empty file. Fails if `path` already exists.
    fn create_file(&self, path: &Path) -> Result<()>;
    /// Create a single directory.
    fn create_dir(&self, path: &Path) -> Result<()>;
    /// Remove a file, or a directory and everything below it.
    fn remove_all(&self, path: &Path) -> Result<()>;
    /// Copy a file or a directory tree to `dest` (the full destination path).
    fn copy_all(&self, src: &Path, dest: &Path) -> Result<()>;
    /// Move a file or directory to `dest` (the full destination path).
    fn move_to(&self, src: &Path, dest: &Path) -> Result<()>;
}

/// Which `FileOps` implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpsBackend {
    /// Pure `std::fs` implementation.
    #[default]
    Native,
    /// Shell out to `rm`, `cp` and `mv`.
    Shell,
}

impl OpsBackend {
    /// Parse from a config string; anything but `"shell"` is native.
    pub fn from_config(s: &str) -> Self {
        match s {
            "shell" => OpsBackend::Shell,
            _ => OpsBackend::Native,
        }
    }

    /// Build the boxed implementation.
    pub fn build(self) -> Box<dyn FileOps> {
        match self {
            OpsBackend::Native => Box::new(NativeOps),
            OpsBackend::Shell => Box::new(ShellOps),
        }
    }
}

/// `FileOps` backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeOps;

impl FileOps for NativeOps {
    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).map_err(|e| AppError::fs(FsOp::Rename, from, e))
    }

    fn create_file(&self, path: &Path) -> Result<()> {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| AppError::fs(FsOp::Create, path, e))?;
        Ok(())
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir(path).map_err(|e| AppError::fs(FsOp::Create, path, e))
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        let meta = fs::symlink_metadata(path).map_err(|e| AppError::fs(FsOp::Remove, path, e))?;
        let result = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|e| AppError::fs(FsOp::Remove, path, e))
    }

    fn copy_all(&self, src: &Path, dest: &Path) -> Result<()> {
        copy_recursive(src, dest)
    }

    fn move_to(&self, src: &Path, dest: &Path) -> Result<()> {
        // Try rename first (same filesystem, instant)
        match fs::rename(src, dest) {
            Ok(()) => Ok(()),
            Err(e) if is_cross_device(&e) => {
                tracing::debug!(src = %src.display(), error = %e, "rename crosses devices, falling back to copy+remove");
                copy_recursive(src, dest).map_err(|err| relabel(err, FsOp::Move))?;
                self.remove_all(src).map_err(|err| relabel(err, FsOp::Move))
            }
            Err(e) => Err(AppError::fs(FsOp::Move, src, e)),
        }
    }
}

#[cfg(unix)]
const CROSS_DEVICE_ERROR: i32 = 18; // EXDEV
#[cfg(windows)]
const CROSS_DEVICE_ERROR: i32 = 17; // ERROR_NOT_SAME_DEVICE
#[cfg(not(any(unix, windows)))]
const CROSS_DEVICE_ERROR: i32 = -1;

/// Whether a failed rename only failed because source and destination are
/// on different filesystems.
fn is_cross_device(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(CROSS_DEVICE_ERROR)
}

fn relabel(err: AppError, op: FsOp) -> AppError {
    match err {
        AppError::Filesystem { path, source, .. } => AppError::Filesystem { op, path, source },
        other => other,
    }
}

/// Copy `src` to `dest`, descending into directories. Symlinks are recreated, not followed.
fn copy_recursive(src: &Path, dest: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(src).map_err(|e| AppError::fs(FsOp::Copy, src, e))?;
    if meta.is_dir() {
        fs::create_dir(dest).map_err(|e| AppError::fs(FsOp::Copy, dest, e))?;
        for entry in fs::read_dir(src).map_err(|e| AppError::fs(FsOp::List, src, e))? {
            let entry = entry.map_err(|e| AppError::fs(FsOp::List, src, e))?;
            copy_recursive(&entry.path(), &dest.join(entry.file_name()))?;
        }
        Ok(())
    } else if meta.file_type().is_symlink() {
        copy_symlink(src, dest)
    } else {
        fs::copy(src, dest).map_err(|e| AppError::fs(FsOp::Copy, src, e))?;
        Ok(())
    }
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    let target = fs::read_link(src).map_err(|e| AppError::fs(FsOp::Copy, src, e))?;
    std::os::unix::fs::symlink(target, dest).map_err(|e| AppError::fs(FsOp::Copy, dest, e))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    fs::copy(src, dest).map_err(|e| AppError::fs(FsOp::Copy, src, e))?;
    Ok(())
}

/// `FileOps` that runs the system `rm`, `cp` and `mv` utilities.
///
/// Rename and creation have no shell equivalent worth spawning for and go
/// through `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellOps;

impl ShellOps {
    fn run(op: FsOp, path: &Path, program: &str, flags: &[&str], paths: &[&Path]) -> Result<()> {
        let mut cmd = Command::new(program);
        cmd.args(flags).args(paths);
        tracing::debug!(?cmd, "running external file operation");
        let output = cmd.output().map_err(|e| AppError::fs(op, path, e))?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("`{}` exited with {}", program, output.status)
        } else {
            format!("`{}` exited with {}: {}", program, output.status, stderr)
        };
        Err(AppError::fs(op, path, std::io::Error::other(message)))
    }
}

impl FileOps for ShellOps {
    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        NativeOps.rename(from, to)
    }

    fn create_file(&self, path: &Path) -> Result<()> {
        NativeOps.create_file(path)
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        NativeOps.create_dir(path)
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        Self::run(FsOp::Remove, path, "rm", &["-r"], &[path])
    }

    fn copy_all(&self, src: &Path, dest: &Path) -> Result<()> {
        Self::run(FsOp::Copy, src, "cp", &["-r"], &[src, dest])
    }

    fn move_to(&self, src: &Path, dest: &Path) -> Result<()> {
        Self::run(FsOp::Move, src, "mv", &[], &[src, dest])
    }
}

/// Make `name` unique inside `target_dir` by prepending [`COPY_PREFIX`].
///
/// The directory is listed once; repeated collisions stack the prefix
/// (`a` -> `copy_a` -> `copy_copy_a`).
pub fn collision_free_name(name: &str, target_dir: &Path) -> Result<String> {
    let existing = fs::read_dir(target_dir)
        .map_err(|e| AppError::fs(FsOp::List, target_dir, e))?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<Vec<String>>>()
        .map_err(|e| AppError::fs(FsOp::List, target_dir, e))?;

    let mut candidate = name.to_string();
    while existing.iter().any(|e| *e == candidate) {
        candidate = format!("{}{}", COPY_PREFIX, candidate);
    }
    Ok(candidate)
}

/// Reject names that would escape the target directory or are empty.
pub fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidName("name is empty".into()));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(AppError::InvalidName(format!("'{}' is reserved", trimmed)));
    }
    if trimmed.contains('/') || trimmed.contains(std::path::MAIN_SEPARATOR) {
        return Err(AppError::InvalidName(format!(
            "'{}' contains a path separator",
            trimmed
        )));
    }
    Ok(trimmed)
}

/// Join a validated child name onto a directory.
pub fn child_path(dir: &Path, name: &str) -> Result<PathBuf> {
    Ok(dir.join(validate_name(name)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_file() {
        let tmp = TempDir::new().unwrap();
        let file_path = tmp.path().join("test.txt");
        NativeOps.create_file(&file_path).unwrap();
        assert!(file_path.exists());
    }

    #[test]
    fn test_create_file_existing_fails() {
        let tmp = TempDir::new().unwrap();
        let file_path = tmp.path().join("existing.txt");
        fs::write(&file_path, "keep me").unwrap();
        let err = NativeOps.create_file(&file_path).unwrap_err();
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::AlreadyExists));
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "keep me");
    }

    #[test]
    fn test_create_dir_already_exists_fails() {
        let tmp = TempDir::new().unwrap();
        let dir_path = tmp.path().join("dup");
        NativeOps.create_dir(&dir_path).unwrap();
        assert!(dir_path.is_dir());
        assert!(NativeOps.create_dir(&dir_path).is_err());
    }

    #[test]
    fn test_rename_nonexistent_fails() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("no_such_file.txt");
        let to = tmp.path().join("dest.txt");
        let err = NativeOps.rename(&from, &to).unwrap_err();
        match err {
            AppError::Filesystem { op, path, .. } => {
                assert_eq!(op, FsOp::Rename);
                assert_eq!(path, from);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_remove_all_directory_recursively() {
        let tmp = TempDir::new().unwrap();
        let dir_path = tmp.path().join("parent");
        let nested_dir = dir_path.join("child");
        fs::create_dir_all(&nested_dir).unwrap();
        fs::File::create(nested_dir.join("file.txt")).unwrap();
        fs::File::create(dir_path.join("root_file.txt")).unwrap();

        NativeOps.remove_all(&dir_path).unwrap();
        assert!(!dir_path.exists());
    }

    #[test]
    fn test_remove_all_nonexistent_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("no_such_file.txt");
        assert!(NativeOps.remove_all(&path).is_err());
    }

    #[test]
    fn test_copy_all_directory() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src_dir");
        fs::create_dir_all(src.join("inner")).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("inner").join("b.txt"), "b").unwrap();

        let dest = tmp.path().join("dest_dir");
        NativeOps.copy_all(&src, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "a");
        assert_eq!(
            fs::read_to_string(dest.join("inner").join("b.txt")).unwrap(),
            "b"
        );
        assert!(src.exists());
    }

    #[test]
    fn test_move_to_file() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("target")).unwrap();
        let src = tmp.path().join("moving.txt");
        fs::write(&src, "payload").unwrap();
        let dest = tmp.path().join("target").join("moving.txt");

        NativeOps.move_to(&src, &dest).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "payload");
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_ops_copy_move_remove() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("dir");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("f.txt"), "x").unwrap();

        let copied = tmp.path().join("dir_copy");
        ShellOps.copy_all(&src, &copied).unwrap();
        assert!(copied.join("f.txt").exists());

        let moved = tmp.path().join("dir_moved");
        ShellOps.move_to(&copied, &moved).unwrap();
        assert!(!copied.exists());
        assert!(moved.join("f.txt").exists());

        ShellOps.remove_all(&moved).unwrap();
        assert!(!moved.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_ops_failure_is_filesystem_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");
        let err = ShellOps.remove_all(&missing).unwrap_err();
        assert!(matches!(
            err,
            AppError::Filesystem {
                op: FsOp::Remove,
                ..
            }
        ));
    }

    #[test]
    fn collision_free_name_without_collision() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("other"), "").unwrap();
        assert_eq!(collision_free_name("a", tmp.path()).unwrap(), "a");
    }

    #[test]
    fn collision_free_name_stacks_prefix() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a"), "").unwrap();
        fs::write(tmp.path().join("copy_a"), "").unwrap();
        assert_eq!(collision_free_name("a", tmp.path()).unwrap(), "copy_copy_a");
    }

    #[test]
    fn collision_free_name_missing_dir_fails() {
        let tmp = TempDir::new().unwrap();
        let err = collision_free_name("a", &tmp.path().join("nope")).unwrap_err();
        assert_eq!(err.io_kind(), Some(std::io::ErrorKind::NotFound));
    }

    #[test]
    fn validate_name_rejects_bad_input() {
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
        assert_eq!(validate_name(" notes.md ").unwrap(), "notes.md");
    }

    #[test]
    fn ops_backend_from_config() {
        assert_eq!(OpsBackend::from_config("shell"), OpsBackend::Shell);
        assert_eq!(OpsBackend::from_config("native"), OpsBackend::Native);
        assert_eq!(OpsBackend::from_config("bogus"), OpsBackend::Native);
    }

    #[test]
    fn only_cross_device_errors_allow_copy_fallback() {
        assert!(is_cross_device(&std::io::Error::from_raw_os_error(
            CROSS_DEVICE_ERROR
        )));
        assert!(!is_cross_device(&std::io::Error::from(
            std::io::ErrorKind::PermissionDenied
        )));
    }

    #[test]
    fn failed_same_device_move_leaves_no_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("project");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("notes.md"), "x").unwrap();
        let dest = src.join("nested");

        let err = NativeOps.move_to(&src, &dest).unwrap_err();
        assert!(matches!(err, AppError::Filesystem { op: FsOp::Move, .. }));
        assert!(!dest.exists());
        assert!(src.join("notes.md").exists());
    }
}
