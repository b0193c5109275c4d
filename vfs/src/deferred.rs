//! The callback form of the call surface.
//!
//! [`DeferredFS`] wraps a [`FileSystem`] and exposes every operation a
//! second time, taking a completion callback instead of returning the
//! result. The operation itself still runs synchronously (the filesystem
//! is single-threaded and never suspends mid-operation), but the callback
//! is parked on a queue and only fires from [`run_pending`], so it can
//! never run before the originating call has returned. That is the whole
//! contract a cooperative scheduler needs to drive this filesystem.
//!
//! The synchronous form of every operation stays reachable through
//! [`fs`](struct.DeferredFS.html#method.fs).
//!
//! [`run_pending`]: struct.DeferredFS.html#method.run_pending

use crate::error_fs::VfsError;
use crate::fs::FileSystem;
use std::collections::VecDeque;
use virtualfs_api::fs::{
    DescriptorSupport, DirectorySupport, FileSupport, FileSysSupport, LinkSupport, MetadataSupport,
};
use virtualfs_api::types::{Fd, OpenFlags, PathOrFd, Stat};

type Thunk = Box<dyn FnOnce()>;

/// A filesystem plus the queue of parked completion callbacks.
pub struct DeferredFS {
    fs: FileSystem,
    pending: VecDeque<Thunk>,
}

impl DeferredFS {
    /// Wrap a filesystem.
    pub fn new(fs: FileSystem) -> DeferredFS {
        DeferredFS {
            fs,
            pending: VecDeque::new(),
        }
    }

    /// Fresh empty filesystem behind the façade.
    pub fn empty() -> DeferredFS {
        DeferredFS::new(FileSystem::new())
    }

    /// The synchronous form of every operation.
    pub fn fs(&mut self) -> &mut FileSystem {
        &mut self.fs
    }

    /// Release the wrapped filesystem, dropping any still-parked
    /// callbacks.
    pub fn into_inner(self) -> FileSystem {
        self.fs
    }

    /// Number of callbacks waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Fire every parked callback in completion order and return how many
    /// ran. Callbacks queued *by* callbacks stay parked for the next call.
    pub fn run_pending(&mut self) -> usize {
        let mut batch: VecDeque<Thunk> = std::mem::take(&mut self.pending);
        let ran = batch.len();
        for thunk in batch.drain(..) {
            thunk();
        }
        ran
    }

    fn defer(&mut self, thunk: Thunk) {
        self.pending.push_back(thunk);
    }

    /// `stat`, delivered on the next tick.
    pub fn stat<F>(&mut self, path: &str, cb: F)
    where
        F: FnOnce(Result<Stat, VfsError>) + 'static,
    {
        let res = self.fs.stat(path);
        self.defer(Box::new(move || cb(res)));
    }

    /// `lstat`, delivered on the next tick.
    pub fn lstat<F>(&mut self, path: &str, cb: F)
    where
        F: FnOnce(Result<Stat, VfsError>) + 'static,
    {
        let res = self.fs.lstat(path);
        self.defer(Box::new(move || cb(res)));
    }

    /// `exists`, delivered on the next tick.
    pub fn exists<F>(&mut self, path: &str, cb: F)
    where
        F: FnOnce(bool) + 'static,
    {
        let res = self.fs.exists(path);
        self.defer(Box::new(move || cb(res)));
    }

    /// `access`, delivered on the next tick.
    pub fn access<F>(&mut self, path: &str, mode: u32, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.access(path, mode);
        self.defer(Box::new(move || cb(res)));
    }

    /// `chmod`, delivered on the next tick.
    pub fn chmod<F>(&mut self, path: &str, mode: u32, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.chmod(path, mode);
        self.defer(Box::new(move || cb(res)));
    }

    /// `chown`, delivered on the next tick.
    pub fn chown<F>(&mut self, path: &str, uid: u32, gid: u32, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.chown(path, uid, gid);
        self.defer(Box::new(move || cb(res)));
    }

    /// `lchmod`, delivered on the next tick.
    pub fn lchmod<F>(&mut self, path: &str, mode: u32, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.lchmod(path, mode);
        self.defer(Box::new(move || cb(res)));
    }

    /// `lchown`, delivered on the next tick.
    pub fn lchown<F>(&mut self, path: &str, uid: u32, gid: u32, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.lchown(path, uid, gid);
        self.defer(Box::new(move || cb(res)));
    }

    /// `utimes`, delivered on the next tick.
    pub fn utimes<F>(&mut self, path: &str, atime: u64, mtime: u64, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.utimes(path, atime, mtime);
        self.defer(Box::new(move || cb(res)));
    }

    /// `mkdir`, delivered on the next tick.
    pub fn mkdir<F>(&mut self, path: &str, mode: u32, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.mkdir(path, mode);
        self.defer(Box::new(move || cb(res)));
    }

    /// `mkdirp`, delivered on the next tick.
    pub fn mkdirp<F>(&mut self, path: &str, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.mkdirp(path);
        self.defer(Box::new(move || cb(res)));
    }

    /// `rmdir`, delivered on the next tick.
    pub fn rmdir<F>(&mut self, path: &str, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.rmdir(path);
        self.defer(Box::new(move || cb(res)));
    }

    /// `readdir`, delivered on the next tick.
    pub fn readdir<F>(&mut self, path: &str, cb: F)
    where
        F: FnOnce(Result<Vec<String>, VfsError>) + 'static,
    {
        let res = self.fs.readdir(path);
        self.defer(Box::new(move || cb(res)));
    }

    /// `rename`, delivered on the next tick.
    pub fn rename<F>(&mut self, old: &str, new: &str, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.rename(old, new);
        self.defer(Box::new(move || cb(res)));
    }

    /// `symlink`, delivered on the next tick.
    pub fn symlink<F>(&mut self, target: &str, path: &str, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.symlink(target, path);
        self.defer(Box::new(move || cb(res)));
    }

    /// `link`, delivered on the next tick.
    pub fn link<F>(&mut self, existing: &str, new: &str, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.link(existing, new);
        self.defer(Box::new(move || cb(res)));
    }

    /// `unlink`, delivered on the next tick.
    pub fn unlink<F>(&mut self, path: &str, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.unlink(path);
        self.defer(Box::new(move || cb(res)));
    }

    /// `readlink`, delivered on the next tick.
    pub fn readlink<F>(&mut self, path: &str, cb: F)
    where
        F: FnOnce(Result<String, VfsError>) + 'static,
    {
        let res = self.fs.readlink(path);
        self.defer(Box::new(move || cb(res)));
    }

    /// `open`, delivered on the next tick.
    pub fn open<F>(&mut self, path: &str, flags: OpenFlags, mode: u32, cb: F)
    where
        F: FnOnce(Result<Fd, VfsError>) + 'static,
    {
        let res = self.fs.open(path, flags, mode);
        self.defer(Box::new(move || cb(res)));
    }

    /// `open_str`, delivered on the next tick.
    pub fn open_str<F>(&mut self, path: &str, mode: &str, cb: F)
    where
        F: FnOnce(Result<Fd, VfsError>) + 'static,
    {
        let res = self.fs.open_str(path, mode);
        self.defer(Box::new(move || cb(res)));
    }

    /// `close`, delivered on the next tick.
    pub fn close<F>(&mut self, fd: Fd, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.close(fd);
        self.defer(Box::new(move || cb(res)));
    }

    /// `read`, delivered on the next tick. Takes the buffer by value and
    /// hands it back through the callback along with the count.
    pub fn read<F>(
        &mut self,
        fd: Fd,
        mut buf: Vec<u8>,
        offset: usize,
        length: usize,
        position: Option<i64>,
        cb: F,
    ) where
        F: FnOnce(Result<(usize, Vec<u8>), VfsError>) + 'static,
    {
        let res = self
            .fs
            .read(fd, &mut buf, offset, length, position)
            .map(|n| (n, buf));
        self.defer(Box::new(move || cb(res)));
    }

    /// `write`, delivered on the next tick.
    pub fn write<F>(&mut self, fd: Fd, data: &[u8], position: Option<i64>, cb: F)
    where
        F: FnOnce(Result<usize, VfsError>) + 'static,
    {
        let res = self.fs.write(fd, data, position);
        self.defer(Box::new(move || cb(res)));
    }

    /// `ftruncate`, delivered on the next tick.
    pub fn ftruncate<F>(&mut self, fd: Fd, len: u64, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.ftruncate(fd, len);
        self.defer(Box::new(move || cb(res)));
    }

    /// `fstat`, delivered on the next tick.
    pub fn fstat<F>(&mut self, fd: Fd, cb: F)
    where
        F: FnOnce(Result<Stat, VfsError>) + 'static,
    {
        let res = self.fs.fstat(fd);
        self.defer(Box::new(move || cb(res)));
    }

    /// `fchmod`, delivered on the next tick.
    pub fn fchmod<F>(&mut self, fd: Fd, mode: u32, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.fchmod(fd, mode);
        self.defer(Box::new(move || cb(res)));
    }

    /// `fchown`, delivered on the next tick.
    pub fn fchown<F>(&mut self, fd: Fd, uid: u32, gid: u32, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.fchown(fd, uid, gid);
        self.defer(Box::new(move || cb(res)));
    }

    /// `futimes`, delivered on the next tick.
    pub fn futimes<F>(&mut self, fd: Fd, atime: u64, mtime: u64, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.futimes(fd, atime, mtime);
        self.defer(Box::new(move || cb(res)));
    }

    /// `fsync`, delivered on the next tick.
    pub fn fsync<F>(&mut self, fd: Fd, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.fsync(fd);
        self.defer(Box::new(move || cb(res)));
    }

    /// `fdatasync`, delivered on the next tick.
    pub fn fdatasync<F>(&mut self, fd: Fd, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.fdatasync(fd);
        self.defer(Box::new(move || cb(res)));
    }

    /// `read_file`, delivered on the next tick.
    pub fn read_file<F>(&mut self, file: PathOrFd<'_>, cb: F)
    where
        F: FnOnce(Result<Vec<u8>, VfsError>) + 'static,
    {
        let res = self.fs.read_file(file);
        self.defer(Box::new(move || cb(res)));
    }

    /// `write_file`, delivered on the next tick.
    pub fn write_file<F>(&mut self, file: PathOrFd<'_>, data: &[u8], cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.write_file(file, data);
        self.defer(Box::new(move || cb(res)));
    }

    /// `append_file`, delivered on the next tick.
    pub fn append_file<F>(&mut self, file: PathOrFd<'_>, data: &[u8], cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.append_file(file, data);
        self.defer(Box::new(move || cb(res)));
    }

    /// `truncate`, delivered on the next tick.
    pub fn truncate<F>(&mut self, path: &str, len: u64, cb: F)
    where
        F: FnOnce(Result<(), VfsError>) + 'static,
    {
        let res = self.fs.truncate(path, len);
        self.defer(Box::new(move || cb(res)));
    }
}

impl std::fmt::Debug for DeferredFS {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("DeferredFS")
            .field("fs", &self.fs)
            .field("pending", &self.pending.len())
            .finish()
    }
}
