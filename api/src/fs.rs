//! The trait stack describing the filesystem call surface.
//!
//! The traits build on each other the way the subsystems do: construction
//! ([`FileSysSupport`]), metadata ([`MetadataSupport`]), directories
//! ([`DirectorySupport`]), links ([`LinkSupport`]), descriptors
//! ([`DescriptorSupport`]) and whole-file convenience operations
//! ([`FileSupport`]). Each trait takes the previous one as a supertrait, so
//! a bound on the last one grants the whole surface.
//!
//! Paths are POSIX-style `/`-separated strings. A leading `/` is absolute;
//! runs of `/` collapse; a trailing `/` is tolerated; backslashes are
//! ordinary name characters. Every operation either completes or raises
//! exactly one error, leaving no partial mutation behind.

use super::types::{Fd, FsOptions, OpenFlags, PathOrFd, Stat};
use std::error;

/// General trait every filesystem implements: construction, plus the error
/// type used by the rest of the trait stack.
pub trait FileSysSupport: Sized {
    /// The type of the errors of the implementation.
    ///
    /// Note the supertrait any error type must implement:
    /// [`error::Error`](https://doc.rust-lang.org/std/error/trait.Error.html),
    /// the base trait of all Rust errors.
    type Error: error::Error;

    /// Static method to check whether the given options describe a valid
    /// filesystem configuration: the allocator block size must be a nonzero
    /// multiple of 32.
    fn options_valid(opts: &FsOptions) -> bool;

    /// Create an empty filesystem from the given options: a root directory
    /// that is its own parent, no other objects, no open descriptors.
    /// Errors if the options are not valid.
    fn with_options(opts: &FsOptions) -> Result<Self, Self::Error>;

    /// Create an empty filesystem with default options.
    fn new() -> Self;
}

/// Metadata operations addressed by path.
///
/// The filesystem has no users or groups: `mode`, `uid` and `gid` arguments
/// are accepted everywhere and ignored, and every object reports mode
/// `0o777` with uid/gid 0. The `ch*` family therefore only validates that
/// its target exists.
pub trait MetadataSupport: FileSysSupport {
    /// Metadata snapshot of the object at `path`, following a terminating
    /// symlink. Errors with `ENOENT` if any component is missing.
    fn stat(&self, path: &str) -> Result<Stat, Self::Error>;

    /// Like `stat`, but a terminating symlink is described itself rather
    /// than followed.
    fn lstat(&self, path: &str) -> Result<Stat, Self::Error>;

    /// Does `path` resolve to an object? Never errors: unresolvable paths
    /// (including symlink loops) simply report `false`.
    fn exists(&self, path: &str) -> bool;

    /// Check accessibility of `path` for the requested permission bits
    /// (an `rwx` triple in the low three bits; 0 checks bare existence).
    /// Since every object carries mode `0o777`, this fails only when the
    /// path does not resolve.
    fn access(&self, path: &str, mode: u32) -> Result<(), Self::Error>;

    /// Accepted and ignored; validates that `path` resolves.
    fn chmod(&mut self, path: &str, mode: u32) -> Result<(), Self::Error>;

    /// Accepted and ignored; validates that `path` resolves.
    fn chown(&mut self, path: &str, uid: u32, gid: u32) -> Result<(), Self::Error>;

    /// `chmod` variant that does not follow a terminating symlink.
    fn lchmod(&mut self, path: &str, mode: u32) -> Result<(), Self::Error>;

    /// `chown` variant that does not follow a terminating symlink.
    fn lchown(&mut self, path: &str, uid: u32, gid: u32) -> Result<(), Self::Error>;

    /// Set access and modification times (milliseconds since the epoch) of
    /// the object at `path`, refreshing its status-change time.
    fn utimes(&mut self, path: &str, atime: u64, mtime: u64) -> Result<(), Self::Error>;
}

/// Directory creation, removal, listing and renaming.
pub trait DirectorySupport: MetadataSupport {
    /// Create a directory at `path`. The final path component must name a
    /// free slot in an existing directory: an occupied name (including
    /// `"/"` itself) is `EEXIST`, a missing intermediate component is
    /// `ENOENT`. `mode` is accepted and ignored.
    fn mkdir(&mut self, path: &str, mode: u32) -> Result<(), Self::Error>;

    /// Create a directory and any missing ancestors, walking segment by
    /// segment from the closest existing one. An existing component that is
    /// not a directory is `ENOTDIR`. Creating `"/"` is a no-op, and the
    /// whole operation is idempotent.
    fn mkdirp(&mut self, path: &str) -> Result<(), Self::Error>;

    /// Remove the empty directory at `path`. Errors: `ENOENT` if missing,
    /// `ENOTDIR` if not a directory (a terminating symlink is not
    /// followed), `EBUSY` for the root, `EINVAL` for a `.`/`..` endpoint,
    /// `ENOTEMPTY` if any entry besides `.` and `..` remains.
    fn rmdir(&mut self, path: &str) -> Result<(), Self::Error>;

    /// List the names in the directory at `path`, in insertion order,
    /// without `.` and `..`. A terminating symlink is not followed and
    /// reports `ENOTDIR`, as does a file.
    fn readdir(&self, path: &str) -> Result<Vec<String>, Self::Error>;

    /// Move the object at `old` to `new`, atomically replacing a
    /// replaceable target. Neither endpoint may be the root (`EBUSY`) or a
    /// `.`/`..` entry (`EINVAL`). A file cannot replace a directory
    /// (`EISDIR`), a directory cannot replace a non-directory (`ENOTDIR`)
    /// or a non-empty directory (`ENOTEMPTY`). Renaming an object onto
    /// itself (via any pair of names) is a no-op. A failed rename moves
    /// nothing.
    fn rename(&mut self, old: &str, new: &str) -> Result<(), Self::Error>;
}

/// Hard links and symbolic links.
pub trait LinkSupport: DirectorySupport {
    /// Create a symbolic link at `path` holding `target` verbatim. The
    /// target may be absolute or relative and may dangle; it is never
    /// inspected at creation beyond rejecting the empty string (`ENOENT`).
    fn symlink(&mut self, target: &str, path: &str) -> Result<(), Self::Error>;

    /// Create a hard link at `new` to the object at `existing`. Directories
    /// cannot be hard-linked (`EPERM`); the new name must be free
    /// (`EEXIST`) in an existing parent (`ENOENT`). Terminating symlinks
    /// are linked themselves, not followed.
    fn link(&mut self, existing: &str, new: &str) -> Result<(), Self::Error>;

    /// Remove the directory entry at `path`. Directories are refused with
    /// `EISDIR`; a symlink is removed itself, never its target. The
    /// underlying inode survives for as long as open descriptors hold it.
    fn unlink(&mut self, path: &str) -> Result<(), Self::Error>;

    /// The target string of the symlink at `path`; `EINVAL` if the object
    /// is not a symlink.
    fn readlink(&self, path: &str) -> Result<String, Self::Error>;
}

/// Descriptor-based I/O: open, positional read/write, and the fd-scoped
/// metadata operations.
pub trait DescriptorSupport: LinkSupport {
    /// Open the object at `path` per `flags`, returning a descriptor with
    /// position 0.
    ///
    /// A terminating symlink errors with `ELOOP` under
    /// [`NOFOLLOW`](../types/struct.OpenFlags.html#associatedconstant.NOFOLLOW)
    /// and with `EEXIST` under `CREAT | EXCL`, and is otherwise followed.
    /// With `CREAT`, a free final name creates an empty file; without it
    /// the miss is `ENOENT`. An existing target under `CREAT | EXCL` is
    /// `EEXIST`; a directory opened for writing is `EISDIR`; a
    /// non-directory under `DIRECTORY` is `ENOTDIR`; `TRUNC` with write
    /// access clears the file. `mode` is accepted and ignored.
    fn open(&mut self, path: &str, flags: OpenFlags, mode: u32) -> Result<Fd, Self::Error>;

    /// `open` with a short mode string out of the closed table
    /// (`r r+ w wx w+ wx+ a ax a+ ax+`). Unknown strings are a usage
    /// error, not a filesystem error.
    fn open_str(&mut self, path: &str, mode: &str) -> Result<Fd, Self::Error>;

    /// Close a descriptor, releasing its hold on the inode. The inode is
    /// destroyed once no directory entry and no descriptor refers to it.
    fn close(&mut self, fd: Fd) -> Result<(), Self::Error>;

    /// Read up to `length` bytes into `buf` at `offset`, from `position`
    /// when given, else from the descriptor position. Returns the number of
    /// bytes read (0 at end of file) and advances the descriptor position
    /// only when `position` was `None`. Errors: `EBADF` for an unknown or
    /// write-only descriptor, `EISDIR` for a directory, `EINVAL` for a
    /// negative position, and a buffer-range usage error when
    /// `offset + length` exceeds `buf`.
    fn read(
        &mut self,
        fd: Fd,
        buf: &mut [u8],
        offset: usize,
        length: usize,
        position: Option<i64>,
    ) -> Result<usize, Self::Error>;

    /// Write `data` at `position` when given, else at the descriptor
    /// position. Under `APPEND`, every write lands at the current end of
    /// file instead. Grows the file as needed, zero-filling any gap;
    /// crossing [`MAX_FILE_SIZE`](../types/constant.MAX_FILE_SIZE.html) is
    /// `ENOSPC`. The descriptor position moves to the new end under
    /// `APPEND`, stays put for an explicit `position`, and otherwise
    /// advances by the bytes written. Errors: `EBADF` for an unknown or
    /// read-only descriptor, `EINVAL` for a negative position.
    fn write(&mut self, fd: Fd, data: &[u8], position: Option<i64>)
        -> Result<usize, Self::Error>;

    /// Resize the file behind `fd` to `len` bytes, zero-extending growth.
    /// `EINVAL` unless the descriptor is writable.
    fn ftruncate(&mut self, fd: Fd, len: u64) -> Result<(), Self::Error>;

    /// Metadata snapshot of the inode behind `fd`. Works on unlinked
    /// inodes for as long as the descriptor holds them.
    fn fstat(&self, fd: Fd) -> Result<Stat, Self::Error>;

    /// Accepted and ignored; validates the descriptor.
    fn fchmod(&mut self, fd: Fd, mode: u32) -> Result<(), Self::Error>;

    /// Accepted and ignored; validates the descriptor.
    fn fchown(&mut self, fd: Fd, uid: u32, gid: u32) -> Result<(), Self::Error>;

    /// Set access and modification times through a descriptor.
    fn futimes(&mut self, fd: Fd, atime: u64, mtime: u64) -> Result<(), Self::Error>;

    /// Nothing to flush in a memory-resident filesystem; validates the
    /// descriptor.
    fn fsync(&self, fd: Fd) -> Result<(), Self::Error>;

    /// Nothing to flush in a memory-resident filesystem; validates the
    /// descriptor.
    fn fdatasync(&self, fd: Fd) -> Result<(), Self::Error>;
}

/// Whole-file convenience operations, composing onto `open`/`read`/`write`.
pub trait FileSupport: DescriptorSupport {
    /// Read the entire contents of `file`. By path this opens with `"r"`
    /// and closes again; by descriptor it reads from the current position
    /// to the end, advancing it. The returned buffer is an independent
    /// copy.
    fn read_file(&mut self, file: PathOrFd<'_>) -> Result<Vec<u8>, Self::Error>;

    /// Replace the contents of `file` with `data`. By path this opens with
    /// `"w"` (create, truncate) and closes again; by descriptor it writes
    /// at the descriptor position.
    fn write_file(&mut self, file: PathOrFd<'_>, data: &[u8]) -> Result<(), Self::Error>;

    /// Append `data` to `file`. By path this opens with `"a"` and closes
    /// again; by descriptor it writes at the descriptor position, which
    /// under an `"a"`-family descriptor is pinned to the end of file.
    fn append_file(&mut self, file: PathOrFd<'_>, data: &[u8]) -> Result<(), Self::Error>;

    /// Resize the file at `path` to `len` bytes, following symlinks;
    /// `EISDIR` for directories.
    fn truncate(&mut self, path: &str, len: u64) -> Result<(), Self::Error>;
}
