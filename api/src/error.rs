//! The reusable error catalogue of the filesystem.
//!
//! Every failing operation surfaces an [`FsError`] carrying one code out of
//! the closed [`ErrorCode`] set, its numeric `errno` value, and the list of
//! paths involved in the call. The codes follow their POSIX meaning; the
//! catalogue is deliberately small and fixed, so callers can match on it
//! exhaustively.
//!
//! Failures that are *not* filesystem state, such as an open-mode string
//! outside the supported table, get their own type ([`InvalidMode`])
//! instead of an errno, the same way the standard library distinguishes
//! parse errors from I/O errors.

use std::fmt;
use thiserror::Error;

/// POSIX-style error codes raised by the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Missing path component or target; empty path; dangling symlink target.
    ENOENT,
    /// Creating over an existing name; `O_CREAT | O_EXCL` collision.
    EEXIST,
    /// A file was required but a directory was found.
    EISDIR,
    /// A directory was required but something else was found.
    ENOTDIR,
    /// Removing or overwriting a directory that still has children.
    ENOTEMPTY,
    /// The root directory cannot be removed or renamed.
    EBUSY,
    /// Hard-linking a directory.
    EPERM,
    /// Argument outside the operation's domain (negative position,
    /// `readlink` on a non-symlink, truncating a read-only descriptor).
    EINVAL,
    /// Symlink loop detected, or `O_NOFOLLOW` hit a symlink.
    ELOOP,
    /// Unknown descriptor, or one with the wrong access mode.
    EBADF,
    /// Permission check failed.
    EACCES,
    /// A write would push a file past the maximum supported size.
    ENOSPC,
}

impl ErrorCode {
    /// The conventional numeric `errno` value of this code.
    pub fn errno(self) -> i32 {
        match self {
            ErrorCode::EPERM => 1,
            ErrorCode::ENOENT => 2,
            ErrorCode::EBADF => 9,
            ErrorCode::EACCES => 13,
            ErrorCode::EBUSY => 16,
            ErrorCode::EEXIST => 17,
            ErrorCode::ENOTDIR => 20,
            ErrorCode::EISDIR => 21,
            ErrorCode::EINVAL => 22,
            ErrorCode::ENOSPC => 28,
            ErrorCode::ENOTEMPTY => 39,
            ErrorCode::ELOOP => 40,
        }
    }

    /// The code's name, as it appears in `strerror`-style output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ENOENT => "ENOENT",
            ErrorCode::EEXIST => "EEXIST",
            ErrorCode::EISDIR => "EISDIR",
            ErrorCode::ENOTDIR => "ENOTDIR",
            ErrorCode::ENOTEMPTY => "ENOTEMPTY",
            ErrorCode::EBUSY => "EBUSY",
            ErrorCode::EPERM => "EPERM",
            ErrorCode::EINVAL => "EINVAL",
            ErrorCode::ELOOP => "ELOOP",
            ErrorCode::EBADF => "EBADF",
            ErrorCode::EACCES => "EACCES",
            ErrorCode::ENOSPC => "ENOSPC",
        }
    }

    /// Human-readable message for this code.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::ENOENT => "no such file or directory",
            ErrorCode::EEXIST => "file already exists",
            ErrorCode::EISDIR => "illegal operation on a directory",
            ErrorCode::ENOTDIR => "not a directory",
            ErrorCode::ENOTEMPTY => "directory not empty",
            ErrorCode::EBUSY => "resource busy or locked",
            ErrorCode::EPERM => "operation not permitted",
            ErrorCode::EINVAL => "invalid argument",
            ErrorCode::ELOOP => "too many symbolic links encountered",
            ErrorCode::EBADF => "bad file descriptor",
            ErrorCode::EACCES => "permission denied",
            ErrorCode::ENOSPC => "no space left on device",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed filesystem operation: one code, the paths involved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}: {} ({}), paths: {:?}", .code, .code.message(), .code.errno(), .paths)]
pub struct FsError {
    /// The code classifying the failure.
    pub code: ErrorCode,
    /// The paths the failing call was working on, in argument order.
    /// Descriptor-only operations leave this empty.
    pub paths: Vec<String>,
}

impl FsError {
    /// Build an error from a code and the paths of the failing call.
    pub fn new(code: ErrorCode, paths: &[&str]) -> FsError {
        FsError {
            code,
            paths: paths.iter().map(|p| (*p).to_string()).collect(),
        }
    }

    /// The numeric `errno` of the carried code.
    pub fn errno(&self) -> i32 {
        self.code.errno()
    }
}

/// An open-mode string outside the supported table (`r`, `r+`, `w`, `wx`,
/// `w+`, `wx+`, `a`, `ax`, `a+`, `ax+`). This is a usage error, not a
/// filesystem error, so it carries no `errno`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid file open mode `{0}`")]
pub struct InvalidMode(pub String);

/// Shorthand for results carrying the catalogue error.
pub type Result<T> = std::result::Result<T, FsError>;
