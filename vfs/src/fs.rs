//! The filesystem itself: the glue over the inode store, the resolver and
//! the descriptor table.
//!
//! [`FileSystem`] implements the whole trait stack of the api crate. Every
//! operation runs to completion synchronously and either succeeds or
//! raises exactly one error with no partial mutation left behind:
//! validation happens before the first state change.

use crate::error_fs::{errno, VfsError};
use crate::fd::{FdTable, FileDesc};
use crate::inode::{now_ms, InodeKind, InodeStore};
use crate::path::{canonicalize, navigate, navigate_from, split_first, Resolved};
use std::collections::HashSet;
use std::str::FromStr;
use virtualfs_api::error::ErrorCode::{
    EACCES, EBADF, EBUSY, EEXIST, EINVAL, EISDIR, ELOOP, ENOENT, ENOSPC, ENOTDIR, ENOTEMPTY, EPERM,
};
use virtualfs_api::fs::{
    DescriptorSupport, DirectorySupport, FileSupport, FileSysSupport, LinkSupport, MetadataSupport,
};
use virtualfs_api::types::{Fd, FsOptions, Ino, OpenFlags, PathOrFd, Stat, MAX_FILE_SIZE};

/// Name under which the shared test-suites address the filesystem type.
pub type FSName = FileSystem;

/// An in-memory POSIX-like filesystem.
#[derive(Debug)]
pub struct FileSystem {
    store: InodeStore,
    fds: FdTable,
    root: Ino,
}

impl FileSystem {
    fn nav(&self, path: &str, resolve_last: bool) -> Result<Resolved, VfsError> {
        Ok(navigate(&self.store, self.root, path, resolve_last)?)
    }

    // Resolve to a bound inode or ENOENT.
    fn nav_target(&self, path: &str, resolve_last: bool) -> Result<Ino, VfsError> {
        let hit = self.nav(path, resolve_last)?;
        hit.target.ok_or_else(|| errno(ENOENT, &[path]))
    }

    fn node(&self, ino: Ino, path: &str) -> Result<&crate::inode::Inode, VfsError> {
        self.store.get(ino).ok_or_else(|| errno(ENOENT, &[path]))
    }

    fn node_mut(&mut self, ino: Ino, path: &str) -> Result<&mut crate::inode::Inode, VfsError> {
        self.store
            .get_mut(ino)
            .ok_or_else(|| errno(ENOENT, &[path]))
    }

    // Flags, inode and position of an open descriptor, copied out so the
    // table borrow ends before the store is touched.
    fn desc(&self, fd: Fd) -> Result<(OpenFlags, Ino, u64), VfsError> {
        let desc = self.fds.get(fd).ok_or_else(|| errno(EBADF, &[]))?;
        Ok((desc.flags, desc.ino, desc.pos))
    }

    // Drain a descriptor from its current position to the end of file.
    fn read_to_end(&mut self, fd: Fd) -> Result<Vec<u8>, VfsError> {
        let mut out = Vec::new();
        let mut chunk = [0u8; 4096];
        let want = chunk.len();
        loop {
            let n = self.read(fd, &mut chunk, 0, want, None)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&chunk[..n]);
        }
    }

    // open-write-close with the close error preserved even on success.
    fn with_fd<T>(
        &mut self,
        path: &str,
        mode: &str,
        op: impl FnOnce(&mut Self, Fd) -> Result<T, VfsError>,
    ) -> Result<T, VfsError> {
        let fd = self.open_str(path, mode)?;
        let res = op(self, fd);
        let closed = self.close(fd);
        let out = res?;
        closed?;
        Ok(out)
    }
}

impl FileSysSupport for FileSystem {
    type Error = VfsError;

    fn options_valid(opts: &FsOptions) -> bool {
        opts.alloc_block_size >= 32 && opts.alloc_block_size % 32 == 0
    }

    fn with_options(opts: &FsOptions) -> Result<Self, VfsError> {
        if !Self::options_valid(opts) {
            return Err(errno(EINVAL, &[]));
        }
        let mut store = InodeStore::with_options(opts);
        let root = store.create_dir(None);
        Ok(FileSystem {
            store,
            fds: FdTable::with_options(opts),
            root,
        })
    }

    fn new() -> Self {
        match Self::with_options(&FsOptions::default()) {
            Ok(fs) => fs,
            Err(_) => unreachable!("default options are valid"),
        }
    }
}

impl MetadataSupport for FileSystem {
    fn stat(&self, path: &str) -> Result<Stat, VfsError> {
        let ino = self.nav_target(path, true)?;
        Ok(self.node(ino, path)?.stat())
    }

    fn lstat(&self, path: &str) -> Result<Stat, VfsError> {
        let ino = self.nav_target(path, false)?;
        Ok(self.node(ino, path)?.stat())
    }

    fn exists(&self, path: &str) -> bool {
        match self.nav(path, true) {
            Ok(hit) => hit.target.is_some(),
            Err(_) => false,
        }
    }

    fn access(&self, path: &str, mode: u32) -> Result<(), VfsError> {
        let ino = self.nav_target(path, true)?;
        let granted = (self.node(ino, path)?.mode >> 6) & 0o7;
        if mode & 0o7 & !granted != 0 {
            return Err(errno(EACCES, &[path]));
        }
        Ok(())
    }

    fn chmod(&mut self, path: &str, _mode: u32) -> Result<(), VfsError> {
        self.nav_target(path, true).map(|_| ())
    }

    fn chown(&mut self, path: &str, _uid: u32, _gid: u32) -> Result<(), VfsError> {
        self.nav_target(path, true).map(|_| ())
    }

    fn lchmod(&mut self, path: &str, _mode: u32) -> Result<(), VfsError> {
        self.nav_target(path, false).map(|_| ())
    }

    fn lchown(&mut self, path: &str, _uid: u32, _gid: u32) -> Result<(), VfsError> {
        self.nav_target(path, false).map(|_| ())
    }

    fn utimes(&mut self, path: &str, atime: u64, mtime: u64) -> Result<(), VfsError> {
        let ino = self.nav_target(path, true)?;
        let node = self.node_mut(ino, path)?;
        node.atime = atime;
        node.mtime = mtime;
        node.ctime = now_ms();
        Ok(())
    }
}

impl DirectorySupport for FileSystem {
    fn mkdir(&mut self, path: &str, _mode: u32) -> Result<(), VfsError> {
        let hit = self.nav(path, false)?;
        if hit.target.is_some() {
            return Err(errno(EEXIST, &[path]));
        }
        let name = match hit.name {
            Some(name) => name,
            None => return Err(errno(ENOENT, &[path])),
        };
        let dir = self.store.create_dir(Some(hit.dir));
        self.store.add_entry(hit.dir, &name, dir);
        Ok(())
    }

    fn mkdirp(&mut self, path: &str) -> Result<(), VfsError> {
        if path.is_empty() {
            return Err(errno(ENOENT, &[path]));
        }
        let mut cur = self.root;
        let mut rest = canonicalize(path).to_string();
        while !rest.is_empty() {
            let (segment, after) = split_first(&rest);
            let segment = segment.to_string();
            let after = after.to_string();
            match self.store.dir_entry(cur, &segment) {
                None => {
                    let dir = self.store.create_dir(Some(cur));
                    self.store.add_entry(cur, &segment, dir);
                    cur = dir;
                }
                Some(ino) => match &self.node(ino, path)?.kind {
                    InodeKind::Dir(_) => cur = ino,
                    InodeKind::File(_) => return Err(errno(ENOTDIR, &[path])),
                    InodeKind::Symlink(_) => {
                        // walk through the link; whatever it reaches must be
                        // an existing directory
                        let mut active = HashSet::new();
                        let hit = navigate_from(
                            &self.store,
                            self.root,
                            cur,
                            segment,
                            true,
                            &mut active,
                            path,
                        )?;
                        match hit.target {
                            Some(target) => {
                                if !self.node(target, path)?.is_dir() {
                                    return Err(errno(ENOTDIR, &[path]));
                                }
                                cur = target;
                            }
                            None => return Err(errno(ENOENT, &[path])),
                        }
                    }
                },
            }
            rest = after;
        }
        Ok(())
    }

    fn rmdir(&mut self, path: &str) -> Result<(), VfsError> {
        let hit = self.nav(path, false)?;
        let ino = match hit.target {
            Some(ino) => ino,
            None => return Err(errno(ENOENT, &[path])),
        };
        if !self.node(ino, path)?.is_dir() {
            return Err(errno(ENOTDIR, &[path]));
        }
        if ino == self.root {
            return Err(errno(EBUSY, &[path]));
        }
        let name = match hit.name {
            Some(name) => name,
            None => return Err(errno(EBUSY, &[path])),
        };
        if name == "." || name == ".." {
            return Err(errno(EINVAL, &[path]));
        }
        match self.node(ino, path)?.dir() {
            Some(entries) if !entries.is_empty() => return Err(errno(ENOTEMPTY, &[path])),
            _ => {}
        }
        self.store.remove_dir(hit.dir, &name, ino);
        Ok(())
    }

    fn readdir(&self, path: &str) -> Result<Vec<String>, VfsError> {
        let hit = self.nav(path, false)?;
        let ino = match hit.target {
            Some(ino) => ino,
            None => return Err(errno(ENOENT, &[path])),
        };
        match self.node(ino, path)?.dir() {
            Some(entries) => Ok(entries.names()),
            None => Err(errno(ENOTDIR, &[path])),
        }
    }

    fn rename(&mut self, old: &str, new: &str) -> Result<(), VfsError> {
        let src = self.nav(old, false)?;
        let src_ino = match src.target {
            Some(ino) => ino,
            None => return Err(errno(ENOENT, &[old, new])),
        };
        if src_ino == self.root {
            return Err(errno(EBUSY, &[old, new]));
        }
        let src_name = match src.name {
            Some(name) => name,
            None => return Err(errno(EBUSY, &[old, new])),
        };
        if src_name == "." || src_name == ".." {
            return Err(errno(EINVAL, &[old, new]));
        }

        let dst = self.nav(new, false)?;
        if dst.target == Some(self.root) {
            return Err(errno(EBUSY, &[old, new]));
        }
        let dst_name = match dst.name {
            Some(ref name) => name.clone(),
            None => return Err(errno(ENOENT, &[old, new])),
        };
        if dst_name == "." || dst_name == ".." {
            return Err(errno(EINVAL, &[old, new]));
        }
        if dst.target == Some(src_ino) {
            // both names already point at the same object
            return Ok(());
        }

        let src_is_dir = self.node(src_ino, old)?.is_dir();
        if src_is_dir {
            // a directory must not move under itself; climb the `..` chain
            // from the destination parent
            let mut probe = dst.dir;
            loop {
                if probe == src_ino {
                    return Err(errno(EINVAL, &[old, new]));
                }
                match self.store.dir_entry(probe, "..") {
                    Some(up) if up != probe => probe = up,
                    _ => break,
                }
            }
        }
        if let Some(existing) = dst.target {
            let target = self.node(existing, new)?;
            match (src_is_dir, target.is_dir()) {
                (true, false) => return Err(errno(ENOTDIR, &[old, new])),
                (false, true) => return Err(errno(EISDIR, &[old, new])),
                (true, true) => {
                    match target.dir() {
                        Some(entries) if !entries.is_empty() => {
                            return Err(errno(ENOTEMPTY, &[old, new]))
                        }
                        _ => {}
                    }
                    self.store.remove_dir(dst.dir, &dst_name, existing);
                }
                (false, false) => {
                    self.store.delete_entry(dst.dir, &dst_name);
                }
            }
        }

        self.store
            .move_entry(src.dir, &src_name, dst.dir, &dst_name);
        if src_is_dir && src.dir != dst.dir {
            // the moved directory's `..` follows it to the new parent
            if let Some(node) = self.store.get_mut(src_ino) {
                if let Some(entries) = node.dir_mut() {
                    entries.repoint("..", dst.dir);
                }
            }
            self.store.unlink(src.dir);
            self.store.link(dst.dir);
        }
        Ok(())
    }
}

impl LinkSupport for FileSystem {
    fn symlink(&mut self, target: &str, path: &str) -> Result<(), VfsError> {
        if target.is_empty() {
            return Err(errno(ENOENT, &[target, path]));
        }
        let hit = self.nav(path, false)?;
        if hit.target.is_some() {
            return Err(errno(EEXIST, &[target, path]));
        }
        let name = match hit.name {
            Some(name) => name,
            None => return Err(errno(ENOENT, &[target, path])),
        };
        let ino = self.store.create_symlink(target.to_string());
        self.store.add_entry(hit.dir, &name, ino);
        Ok(())
    }

    fn link(&mut self, existing: &str, new: &str) -> Result<(), VfsError> {
        let src = self.nav(existing, false)?;
        let ino = match src.target {
            Some(ino) => ino,
            None => return Err(errno(ENOENT, &[existing, new])),
        };
        if self.node(ino, existing)?.is_dir() {
            return Err(errno(EPERM, &[existing, new]));
        }
        let dst = self.nav(new, false)?;
        if dst.target.is_some() {
            return Err(errno(EEXIST, &[existing, new]));
        }
        let name = match dst.name {
            Some(name) => name,
            None => return Err(errno(ENOENT, &[existing, new])),
        };
        self.store.add_entry(dst.dir, &name, ino);
        Ok(())
    }

    fn unlink(&mut self, path: &str) -> Result<(), VfsError> {
        let hit = self.nav(path, false)?;
        let ino = match hit.target {
            Some(ino) => ino,
            None => return Err(errno(ENOENT, &[path])),
        };
        if self.node(ino, path)?.is_dir() {
            return Err(errno(EISDIR, &[path]));
        }
        let name = match hit.name {
            Some(name) => name,
            None => return Err(errno(ENOENT, &[path])),
        };
        self.store.delete_entry(hit.dir, &name);
        Ok(())
    }

    fn readlink(&self, path: &str) -> Result<String, VfsError> {
        let ino = self.nav_target(path, false)?;
        match &self.node(ino, path)?.kind {
            InodeKind::Symlink(target) => Ok(target.clone()),
            _ => Err(errno(EINVAL, &[path])),
        }
    }
}

impl DescriptorSupport for FileSystem {
    fn open(&mut self, path: &str, flags: OpenFlags, _mode: u32) -> Result<Fd, VfsError> {
        let mut hit = self.nav(path, false)?;
        if let Some(ino) = hit.target {
            if self.node(ino, path)?.is_symlink() {
                if flags.contains(OpenFlags::NOFOLLOW) {
                    return Err(errno(ELOOP, &[path]));
                }
                if flags.contains(OpenFlags::CREAT) && flags.contains(OpenFlags::EXCL) {
                    return Err(errno(EEXIST, &[path]));
                }
                hit = self.nav(path, true)?;
            }
        }

        let ino = match hit.target {
            Some(ino) => {
                if flags.contains(OpenFlags::CREAT) && flags.contains(OpenFlags::EXCL) {
                    return Err(errno(EEXIST, &[path]));
                }
                let (is_dir, is_file) = {
                    let node = self.node(ino, path)?;
                    (node.is_dir(), node.is_file())
                };
                if is_dir && flags.writable() {
                    return Err(errno(EISDIR, &[path]));
                }
                if flags.contains(OpenFlags::DIRECTORY) && !is_dir {
                    return Err(errno(ENOTDIR, &[path]));
                }
                if flags.contains(OpenFlags::TRUNC) && flags.writable() && is_file {
                    let now = now_ms();
                    let node = self.node_mut(ino, path)?;
                    if let InodeKind::File(data) = &mut node.kind {
                        data.clear();
                    }
                    node.mtime = now;
                    node.ctime = now;
                }
                ino
            }
            None => {
                let name = match hit.name {
                    Some(name) => name,
                    None => return Err(errno(ENOENT, &[path])),
                };
                if !flags.contains(OpenFlags::CREAT) {
                    return Err(errno(ENOENT, &[path]));
                }
                let ino = self.store.create_file(Vec::new());
                self.store.add_entry(hit.dir, &name, ino);
                ino
            }
        };

        self.store.acquire(ino);
        Ok(self.fds.insert(FileDesc {
            ino,
            flags,
            pos: 0,
        }))
    }

    fn open_str(&mut self, path: &str, mode: &str) -> Result<Fd, VfsError> {
        let flags = OpenFlags::from_str(mode)?;
        self.open(path, flags, 0o666)
    }

    fn close(&mut self, fd: Fd) -> Result<(), VfsError> {
        let desc = self.fds.remove(fd).ok_or_else(|| errno(EBADF, &[]))?;
        self.store.release(desc.ino);
        Ok(())
    }

    fn read(
        &mut self,
        fd: Fd,
        buf: &mut [u8],
        offset: usize,
        length: usize,
        position: Option<i64>,
    ) -> Result<usize, VfsError> {
        let (flags, ino, pos) = self.desc(fd)?;
        if !flags.readable() {
            return Err(errno(EBADF, &[]));
        }
        if let Some(p) = position {
            if p < 0 {
                return Err(errno(EINVAL, &[]));
            }
        }
        match offset.checked_add(length) {
            Some(end) if end <= buf.len() => {}
            _ => return Err(VfsError::Range("offset + length exceeds the buffer")),
        }

        let node = self
            .store
            .get_mut(ino)
            .ok_or_else(|| errno(EBADF, &[]))?;
        let read;
        {
            let data = match &node.kind {
                InodeKind::File(data) => data,
                InodeKind::Dir(_) => return Err(errno(EISDIR, &[])),
                InodeKind::Symlink(_) => return Err(errno(EINVAL, &[])),
            };
            let from = position.map(|p| p as u64).unwrap_or(pos);
            read = if from >= data.len() as u64 {
                (from, 0)
            } else {
                let from_us = from as usize;
                let n = length.min(data.len() - from_us);
                buf[offset..offset + n].copy_from_slice(&data[from_us..from_us + n]);
                (from, n)
            };
        }
        node.atime = now_ms();

        let (from, n) = read;
        if position.is_none() {
            if let Some(desc) = self.fds.get_mut(fd) {
                desc.pos = from + n as u64;
            }
        }
        Ok(n)
    }

    fn write(&mut self, fd: Fd, data: &[u8], position: Option<i64>) -> Result<usize, VfsError> {
        let (flags, ino, pos) = self.desc(fd)?;
        if !flags.writable() {
            return Err(errno(EBADF, &[]));
        }
        if let Some(p) = position {
            if p < 0 {
                return Err(errno(EINVAL, &[]));
            }
        }

        let node = self
            .store
            .get_mut(ino)
            .ok_or_else(|| errno(EBADF, &[]))?;
        let end;
        {
            let buf = match &mut node.kind {
                InodeKind::File(buf) => buf,
                _ => return Err(errno(EBADF, &[])),
            };
            let from = if flags.contains(OpenFlags::APPEND) {
                buf.len() as u64
            } else {
                position.map(|p| p as u64).unwrap_or(pos)
            };
            end = match from.checked_add(data.len() as u64) {
                Some(end) if end <= MAX_FILE_SIZE => end,
                _ => return Err(errno(ENOSPC, &[])),
            };
            let from_us = from as usize;
            if from_us + data.len() > buf.len() {
                buf.resize(from_us + data.len(), 0);
            }
            buf[from_us..from_us + data.len()].copy_from_slice(data);
        }
        let now = now_ms();
        node.mtime = now;
        node.ctime = now;

        if flags.contains(OpenFlags::APPEND) || position.is_none() {
            if let Some(desc) = self.fds.get_mut(fd) {
                desc.pos = end;
            }
        }
        Ok(data.len())
    }

    fn ftruncate(&mut self, fd: Fd, len: u64) -> Result<(), VfsError> {
        let (flags, ino, _) = self.desc(fd)?;
        if !flags.writable() {
            return Err(errno(EINVAL, &[]));
        }
        let node = self
            .store
            .get_mut(ino)
            .ok_or_else(|| errno(EBADF, &[]))?;
        match &mut node.kind {
            InodeKind::File(data) => data.resize(len as usize, 0),
            _ => return Err(errno(EINVAL, &[])),
        }
        let now = now_ms();
        node.mtime = now;
        node.ctime = now;
        Ok(())
    }

    fn fstat(&self, fd: Fd) -> Result<Stat, VfsError> {
        let (_, ino, _) = self.desc(fd)?;
        let node = self.store.get(ino).ok_or_else(|| errno(EBADF, &[]))?;
        Ok(node.stat())
    }

    fn fchmod(&mut self, fd: Fd, _mode: u32) -> Result<(), VfsError> {
        self.desc(fd).map(|_| ())
    }

    fn fchown(&mut self, fd: Fd, _uid: u32, _gid: u32) -> Result<(), VfsError> {
        self.desc(fd).map(|_| ())
    }

    fn futimes(&mut self, fd: Fd, atime: u64, mtime: u64) -> Result<(), VfsError> {
        let (_, ino, _) = self.desc(fd)?;
        let node = self
            .store
            .get_mut(ino)
            .ok_or_else(|| errno(EBADF, &[]))?;
        node.atime = atime;
        node.mtime = mtime;
        node.ctime = now_ms();
        Ok(())
    }

    fn fsync(&self, fd: Fd) -> Result<(), VfsError> {
        self.desc(fd).map(|_| ())
    }

    fn fdatasync(&self, fd: Fd) -> Result<(), VfsError> {
        self.desc(fd).map(|_| ())
    }
}

impl FileSupport for FileSystem {
    fn read_file(&mut self, file: PathOrFd<'_>) -> Result<Vec<u8>, VfsError> {
        match file {
            PathOrFd::Path(path) => self.with_fd(path, "r", |fs, fd| fs.read_to_end(fd)),
            PathOrFd::Fd(fd) => self.read_to_end(fd),
        }
    }

    fn write_file(&mut self, file: PathOrFd<'_>, data: &[u8]) -> Result<(), VfsError> {
        match file {
            PathOrFd::Path(path) => {
                self.with_fd(path, "w", |fs, fd| fs.write(fd, data, None).map(|_| ()))
            }
            PathOrFd::Fd(fd) => self.write(fd, data, None).map(|_| ()),
        }
    }

    fn append_file(&mut self, file: PathOrFd<'_>, data: &[u8]) -> Result<(), VfsError> {
        match file {
            PathOrFd::Path(path) => {
                self.with_fd(path, "a", |fs, fd| fs.write(fd, data, None).map(|_| ()))
            }
            PathOrFd::Fd(fd) => self.write(fd, data, None).map(|_| ()),
        }
    }

    fn truncate(&mut self, path: &str, len: u64) -> Result<(), VfsError> {
        let ino = self.nav_target(path, true)?;
        let node = self.node_mut(ino, path)?;
        match &mut node.kind {
            InodeKind::File(data) => data.resize(len as usize, 0),
            InodeKind::Dir(_) => return Err(errno(EISDIR, &[path])),
            InodeKind::Symlink(_) => return Err(errno(EINVAL, &[path])),
        }
        let now = now_ms();
        node.mtime = now;
        node.ctime = now;
        Ok(())
    }
}

// The shared suites exercise the whole call surface; they live with the api
// crate so an alternative backend can run them unchanged.
#[cfg(test)]
#[path = "../../api/fs-tests/metadata_test.rs"]
mod metadata_tests;

#[cfg(test)]
#[path = "../../api/fs-tests/dir_test.rs"]
mod dir_tests;

#[cfg(test)]
#[path = "../../api/fs-tests/link_test.rs"]
mod link_tests;

#[cfg(test)]
#[path = "../../api/fs-tests/open_test.rs"]
mod open_tests;

#[cfg(test)]
#[path = "../../api/fs-tests/rw_test.rs"]
mod rw_tests;
