//! The file-descriptor table.
//!
//! Descriptors are opaque small integers, handed out lowest-first by the
//! same allocator that numbers inodes, so closing one frees its number for
//! the very next open. The table stores the per-descriptor state; the
//! semantics of reading and writing through it live in
//! [`fs`](../fs/index.html).

use crate::allocator::IdAllocator;
use std::collections::HashMap;
use virtualfs_api::types::{Fd, FsOptions, Ino, OpenFlags};

/// State behind one open descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDesc {
    /// The inode held open.
    pub ino: Ino,
    /// Access and status flags, fixed at open time.
    pub flags: OpenFlags,
    /// Seek position for non-positional reads and writes.
    pub pos: u64,
}

/// Densely numbered table of open descriptors.
#[derive(Debug)]
pub struct FdTable {
    table: HashMap<Fd, FileDesc>,
    ids: IdAllocator,
}

impl FdTable {
    /// Empty table with default layout. Descriptor numbers start at 0.
    pub fn new() -> FdTable {
        FdTable::with_options(&FsOptions::default())
    }

    /// Empty table with the allocator laid out per `opts`.
    pub fn with_options(opts: &FsOptions) -> FdTable {
        FdTable {
            table: HashMap::new(),
            ids: IdAllocator::with_layout(0, opts.alloc_block_size, opts.shrink_ids),
        }
    }

    /// Register a descriptor, returning its number.
    pub fn insert(&mut self, desc: FileDesc) -> Fd {
        let fd = self.ids.allocate();
        self.table.insert(fd, desc);
        fd
    }

    /// The descriptor behind `fd`, if open.
    pub fn get(&self, fd: Fd) -> Option<&FileDesc> {
        self.table.get(&fd)
    }

    /// Mutable access to the descriptor behind `fd`.
    pub fn get_mut(&mut self, fd: Fd) -> Option<&mut FileDesc> {
        self.table.get_mut(&fd)
    }

    /// Drop `fd`, releasing its number for reuse.
    pub fn remove(&mut self, fd: Fd) -> Option<FileDesc> {
        let desc = self.table.remove(&fd);
        if desc.is_some() {
            self.ids.deallocate(fd);
        }
        desc
    }

    /// Number of open descriptors.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for FdTable {
    fn default() -> FdTable {
        FdTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{FdTable, FileDesc};
    use virtualfs_api::types::OpenFlags;

    #[test]
    fn numbers_are_dense_and_reused() {
        let mut fds = FdTable::new();
        let desc = FileDesc {
            ino: 1,
            flags: OpenFlags::empty(),
            pos: 0,
        };
        assert_eq!(fds.insert(desc), 0);
        assert_eq!(fds.insert(desc), 1);
        assert_eq!(fds.insert(desc), 2);
        assert!(fds.remove(1).is_some());
        assert_eq!(fds.insert(desc), 1);
        // unknown descriptors are left alone
        assert!(fds.remove(17).is_none());
        assert_eq!(fds.len(), 3);
    }
}
