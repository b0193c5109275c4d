//! Module containing the types used in this project.
//!
//! Everything here is plain data: identifiers, the stat snapshot, the open
//! flag word with its mode-string table, and the construction options for a
//! filesystem. The behavior behind these types lives in the trait stack of
//! [`fs`](../fs/index.html).

use crate::error::InvalidMode;
use bitflags::bitflags;
use std::str::FromStr;

/// Inode number. Allocated densely starting at 1; 0 is never handed out,
/// to avoid confusion with sentinel values in foreign interfaces.
pub type Ino = u64;

/// File descriptor. A small, densely packed integer starting at 0, reused
/// after close.
pub type Fd = u64;

/// Upper bound on a single file's byte size. A write whose end would cross
/// this bound fails with `ENOSPC` before any data moves.
pub const MAX_FILE_SIZE: u64 = u32::MAX as u64;

/// Enum describing file types.
/// Either a regular file `TFile`, a directory `TDir` or a symbolic link
/// `TSymlink`.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum FType {
    /// Regular file type
    TFile,
    /// Directory file type
    TDir,
    /// Symbolic link file type
    TSymlink,
}

bitflags! {
    /// Open flags, in their conventional octal encoding.
    ///
    /// The access mode occupies the low two bits: `O_RDONLY` is the absence
    /// of both `WRONLY` and `RDWR`, so it has no flag of its own. Use
    /// [`readable`](#method.readable) and [`writable`](#method.writable)
    /// instead of testing bits directly.
    pub struct OpenFlags: u32 {
        /// Write-only access mode.
        const WRONLY = 0o1;
        /// Read-write access mode.
        const RDWR = 0o2;
        /// Create the file if the path names a free slot.
        const CREAT = 0o100;
        /// With `CREAT`: fail instead of opening an existing file.
        const EXCL = 0o200;
        /// With write access: clear the file's contents on open.
        const TRUNC = 0o1000;
        /// Every write lands at the current end of the file.
        const APPEND = 0o2000;
        /// Fail unless the target is a directory.
        const DIRECTORY = 0o200000;
        /// Fail instead of following a terminating symlink.
        const NOFOLLOW = 0o400000;
    }
}

impl OpenFlags {
    /// Does this flag word grant read access?
    pub fn readable(self) -> bool {
        self.bits() & 0o3 != OpenFlags::WRONLY.bits()
    }

    /// Does this flag word grant write access?
    pub fn writable(self) -> bool {
        self.bits() & 0o3 != 0
    }
}

/// The closed table of short open-mode strings, mapped to flag words per
/// the usual conventions (`"r"` reads, `"w"` creates and truncates, `"a"`
/// appends; `+` adds the other access direction, `x` demands exclusive
/// creation). Anything else is an [`InvalidMode`] usage error.
impl FromStr for OpenFlags {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<OpenFlags, InvalidMode> {
        let flags = match s {
            "r" => OpenFlags::empty(),
            "r+" => OpenFlags::RDWR,
            "w" => OpenFlags::WRONLY | OpenFlags::CREAT | OpenFlags::TRUNC,
            "wx" => OpenFlags::WRONLY | OpenFlags::CREAT | OpenFlags::TRUNC | OpenFlags::EXCL,
            "w+" => OpenFlags::RDWR | OpenFlags::CREAT | OpenFlags::TRUNC,
            "wx+" => OpenFlags::RDWR | OpenFlags::CREAT | OpenFlags::TRUNC | OpenFlags::EXCL,
            "a" => OpenFlags::WRONLY | OpenFlags::CREAT | OpenFlags::APPEND,
            "ax" => OpenFlags::WRONLY | OpenFlags::CREAT | OpenFlags::APPEND | OpenFlags::EXCL,
            "a+" => OpenFlags::RDWR | OpenFlags::CREAT | OpenFlags::APPEND,
            "ax+" => OpenFlags::RDWR | OpenFlags::CREAT | OpenFlags::APPEND | OpenFlags::EXCL,
            _ => return Err(InvalidMode(s.to_string())),
        };
        Ok(flags)
    }
}

/// Snapshot of an inode's metadata, as returned by the `stat` family.
///
/// Timestamps have millisecond resolution. `mode` is always `0o777` and
/// `uid`/`gid` are always 0: the filesystem has no users and accepts but
/// ignores caller-requested values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// Inode number.
    pub ino: Ino,
    /// File type tag.
    pub ftype: FType,
    /// Permission bits; fixed at `0o777`.
    pub mode: u32,
    /// Number of directory entries referring to the inode.
    pub nlink: u32,
    /// Owning user; fixed at 0.
    pub uid: u32,
    /// Owning group; fixed at 0.
    pub gid: u32,
    /// Byte size: data length for files, 4096 for directories, target
    /// length for symlinks.
    pub size: u64,
    /// Preferred I/O block size.
    pub blksize: u64,
    /// Number of 512-byte blocks the size rounds up to.
    pub blocks: u64,
    /// Last access, in milliseconds since the epoch.
    pub atime: u64,
    /// Last data modification, in milliseconds since the epoch.
    pub mtime: u64,
    /// Last status change, in milliseconds since the epoch.
    pub ctime: u64,
    /// Creation time, in milliseconds since the epoch.
    pub birthtime: u64,
}

impl Stat {
    /// Does this snapshot describe a regular file?
    pub fn is_file(&self) -> bool {
        self.ftype == FType::TFile
    }

    /// Does this snapshot describe a directory?
    pub fn is_directory(&self) -> bool {
        self.ftype == FType::TDir
    }

    /// Does this snapshot describe a symbolic link?
    pub fn is_symbolic_link(&self) -> bool {
        self.ftype == FType::TSymlink
    }
}

/// Construction parameters of a filesystem.
///
/// The options only tune the internal id allocators; defaults are right for
/// nearly every use. Validate with
/// [`FileSysSupport::options_valid`](../fs/trait.FileSysSupport.html#tymethod.options_valid)
/// before passing to `with_options`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsOptions {
    /// Width of the allocator bitmap blocks. Must be a nonzero multiple
    /// of 32.
    pub alloc_block_size: u64,
    /// Release whole allocator subtrees once they empty out, trading a
    /// little deallocation work for a smaller resident tree.
    pub shrink_ids: bool,
}

impl Default for FsOptions {
    fn default() -> FsOptions {
        FsOptions {
            alloc_block_size: 32,
            shrink_ids: false,
        }
    }
}

/// Target of a whole-file operation: either a path to open (and close
/// again), or a descriptor that is already open and stays open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOrFd<'a> {
    /// Operate on the object named by this path.
    Path(&'a str),
    /// Operate through this open descriptor.
    Fd(Fd),
}

impl<'a> From<&'a str> for PathOrFd<'a> {
    fn from(path: &'a str) -> PathOrFd<'a> {
        PathOrFd::Path(path)
    }
}

impl<'a> From<Fd> for PathOrFd<'a> {
    fn from(fd: Fd) -> PathOrFd<'a> {
        PathOrFd::Fd(fd)
    }
}
