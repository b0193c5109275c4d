//! Inodes, their three variants, and the store that owns them.
//!
//! Directories do not hold other inodes, only their numbers; the store owns
//! every object and everything else refers to it by `Ino`. That breaks the
//! `.`/`..` cycles and makes hard links and the descriptor-keeps-alive rule
//! a matter of two counters per inode: `nlink` (directory entries) and
//! `opens` (descriptors). An inode is destroyed, and its number released,
//! exactly when both reach zero.

use crate::allocator::IdAllocator;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use virtualfs_api::types::{FType, FsOptions, Ino, Stat};

/// Byte size reported for every directory.
pub const DIR_SIZE: u64 = 4096;

/// Preferred I/O block size reported by `stat`.
pub const BLKSIZE: u64 = 4096;

// Milliseconds since the epoch, the resolution of every timestamp here.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// An insertion-ordered directory entry table.
///
/// Every directory holds `.` and `..` from birth; those two never show up
/// in listings. Names are nonempty and contain no `/`; the resolver's
/// segmentation guarantees it, so the table does not re-check.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Directory {
    entries: Vec<(String, Ino)>,
}

impl Directory {
    /// Number the entry `name` points at, if present.
    pub fn get(&self, name: &str) -> Option<Ino> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ino)| *ino)
    }

    /// Entry names in insertion order, without `.` and `..`.
    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(n, _)| n != "." && n != "..")
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Does the directory hold anything besides `.` and `..`?
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(n, _)| n == "." || n == "..")
    }

    // Callers check for collisions first; a duplicate name would shadow.
    pub(crate) fn insert(&mut self, name: &str, ino: Ino) {
        debug_assert!(self.get(name).is_none(), "duplicate entry {:?}", name);
        self.entries.push((name.to_string(), ino));
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Ino> {
        let at = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(at).1)
    }

    // Repoint an existing entry, keeping its slot. Used for `..` when a
    // directory moves to a new parent.
    pub(crate) fn repoint(&mut self, name: &str, ino: Ino) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = ino;
        }
    }
}

/// Variant-specific state of an inode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InodeKind {
    /// Regular file: the byte contents.
    File(Vec<u8>),
    /// Directory: named children.
    Dir(Directory),
    /// Symbolic link: the target path, fixed at creation.
    Symlink(String),
}

impl InodeKind {
    /// The stat-visible type tag.
    pub fn ftype(&self) -> FType {
        match self {
            InodeKind::File(_) => FType::TFile,
            InodeKind::Dir(_) => FType::TDir,
            InodeKind::Symlink(_) => FType::TSymlink,
        }
    }
}

/// One file, directory or symlink, plus the metadata they share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    /// Inode number.
    pub ino: Ino,
    /// Directory entries referring to this inode, `.` and `..` included.
    pub nlink: u32,
    // Descriptors holding the inode open. Kept apart from nlink so an
    // unlinked-but-open inode stays reachable through its descriptors.
    pub(crate) opens: u32,
    /// Permission bits; fixed at `0o777`.
    pub mode: u32,
    /// Owning user; fixed at 0.
    pub uid: u32,
    /// Owning group; fixed at 0.
    pub gid: u32,
    /// Last access, milliseconds since the epoch.
    pub atime: u64,
    /// Last data modification, milliseconds since the epoch.
    pub mtime: u64,
    /// Last status change, milliseconds since the epoch.
    pub ctime: u64,
    /// Creation time, milliseconds since the epoch.
    pub birthtime: u64,
    /// Variant state.
    pub kind: InodeKind,
}

impl Inode {
    fn new(ino: Ino, kind: InodeKind) -> Inode {
        let now = now_ms();
        Inode {
            ino,
            nlink: 0,
            opens: 0,
            mode: 0o777,
            uid: 0,
            gid: 0,
            atime: now,
            mtime: now,
            ctime: now,
            birthtime: now,
            kind,
        }
    }

    /// Byte size: data length for files, [`DIR_SIZE`] for directories,
    /// target length for symlinks.
    pub fn size(&self) -> u64 {
        match &self.kind {
            InodeKind::File(data) => data.len() as u64,
            InodeKind::Dir(_) => DIR_SIZE,
            InodeKind::Symlink(target) => target.len() as u64,
        }
    }

    /// Is this a directory?
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, InodeKind::Dir(_))
    }

    /// Is this a regular file?
    pub fn is_file(&self) -> bool {
        matches!(self.kind, InodeKind::File(_))
    }

    /// Is this a symbolic link?
    pub fn is_symlink(&self) -> bool {
        matches!(self.kind, InodeKind::Symlink(_))
    }

    /// Metadata snapshot.
    pub fn stat(&self) -> Stat {
        let size = self.size();
        Stat {
            ino: self.ino,
            ftype: self.kind.ftype(),
            mode: self.mode,
            nlink: self.nlink,
            uid: self.uid,
            gid: self.gid,
            size,
            blksize: BLKSIZE,
            blocks: (size + 511) / 512,
            atime: self.atime,
            mtime: self.mtime,
            ctime: self.ctime,
            birthtime: self.birthtime,
        }
    }

    pub(crate) fn dir(&self) -> Option<&Directory> {
        match &self.kind {
            InodeKind::Dir(d) => Some(d),
            _ => None,
        }
    }

    pub(crate) fn dir_mut(&mut self) -> Option<&mut Directory> {
        match &mut self.kind {
            InodeKind::Dir(d) => Some(d),
            _ => None,
        }
    }
}

/// Owns every live inode and the allocator behind their numbers.
#[derive(Debug)]
pub struct InodeStore {
    table: HashMap<Ino, Inode>,
    ids: IdAllocator,
}

impl InodeStore {
    /// Empty store with default layout. Inode numbers start at 1; 0 is
    /// never handed out.
    pub fn new() -> InodeStore {
        InodeStore::with_options(&FsOptions::default())
    }

    /// Empty store with the allocator laid out per `opts`.
    pub fn with_options(opts: &FsOptions) -> InodeStore {
        InodeStore {
            table: HashMap::new(),
            ids: IdAllocator::with_layout(1, opts.alloc_block_size, opts.shrink_ids),
        }
    }

    fn create(&mut self, kind: InodeKind) -> Ino {
        let ino = self.ids.allocate();
        self.table.insert(ino, Inode::new(ino, kind));
        ino
    }

    /// New regular file holding `data`. No directory refers to it yet
    /// (`nlink` 0); the caller adds the naming entry.
    pub fn create_file(&mut self, data: Vec<u8>) -> Ino {
        self.create(InodeKind::File(data))
    }

    /// New symbolic link to `target`, stored verbatim.
    pub fn create_symlink(&mut self, target: String) -> Ino {
        self.create(InodeKind::Symlink(target))
    }

    /// New directory under `parent`; `None` makes it its own parent, which
    /// is how the root comes to be. `.` and `..` go through the normal
    /// entry path, so the self-link and the parent's extra link fall out of
    /// the ordinary accounting.
    pub fn create_dir(&mut self, parent: Option<Ino>) -> Ino {
        let ino = self.create(InodeKind::Dir(Directory::default()));
        let parent = parent.unwrap_or(ino);
        self.add_entry(ino, ".", ino);
        self.add_entry(ino, "..", parent);
        ino
    }

    /// The inode behind `ino`, if it is alive.
    pub fn get(&self, ino: Ino) -> Option<&Inode> {
        self.table.get(&ino)
    }

    /// Mutable access to the inode behind `ino`.
    pub fn get_mut(&mut self, ino: Ino) -> Option<&mut Inode> {
        self.table.get_mut(&ino)
    }

    /// Number of live inodes.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Is the store empty?
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Count one more directory entry referring to `ino`.
    pub fn link(&mut self, ino: Ino) {
        if let Some(node) = self.table.get_mut(&ino) {
            node.nlink += 1;
            node.ctime = now_ms();
        }
    }

    /// Drop one directory entry referring to `ino`; the inode is destroyed
    /// once no entry and no descriptor holds it.
    pub fn unlink(&mut self, ino: Ino) {
        let gone = match self.table.get_mut(&ino) {
            Some(node) => {
                node.nlink = node.nlink.saturating_sub(1);
                node.ctime = now_ms();
                node.nlink == 0 && node.opens == 0
            }
            None => false,
        };
        if gone {
            self.destroy(ino);
        }
    }

    /// A descriptor took hold of `ino`.
    pub fn acquire(&mut self, ino: Ino) {
        if let Some(node) = self.table.get_mut(&ino) {
            node.opens += 1;
        }
    }

    /// A descriptor let go of `ino`; destroys it at zero entries and zero
    /// descriptors.
    pub fn release(&mut self, ino: Ino) {
        let gone = match self.table.get_mut(&ino) {
            Some(node) => {
                node.opens = node.opens.saturating_sub(1);
                node.nlink == 0 && node.opens == 0
            }
            None => false,
        };
        if gone {
            self.destroy(ino);
        }
    }

    fn destroy(&mut self, ino: Ino) {
        self.table.remove(&ino);
        self.ids.deallocate(ino);
    }

    /// Look `name` up in the directory `dir`.
    pub fn dir_entry(&self, dir: Ino, name: &str) -> Option<Ino> {
        self.get(dir)?.dir()?.get(name)
    }

    /// Add the entry `name -> child` to `dir`, counting the link and
    /// touching the directory's times.
    pub fn add_entry(&mut self, dir: Ino, name: &str, child: Ino) {
        let now = now_ms();
        if let Some(node) = self.table.get_mut(&dir) {
            if let Some(entries) = node.dir_mut() {
                entries.insert(name, child);
            }
            node.mtime = now;
            node.ctime = now;
        }
        self.link(child);
    }

    /// Remove the entry `name` from `dir`, dropping the child's link.
    pub fn delete_entry(&mut self, dir: Ino, name: &str) -> Option<Ino> {
        let now = now_ms();
        let removed = match self.table.get_mut(&dir) {
            Some(node) => {
                let removed = node.dir_mut().and_then(|entries| entries.remove(name));
                if removed.is_some() {
                    node.mtime = now;
                    node.ctime = now;
                }
                removed
            }
            None => None,
        };
        if let Some(child) = removed {
            self.unlink(child);
        }
        removed
    }

    /// Move the entry `name` from `from` to `to` under `new_name`. The
    /// entry count of the child does not change, so no link accounting
    /// happens. This is the primitive behind `rename`.
    pub fn move_entry(&mut self, from: Ino, name: &str, to: Ino, new_name: &str) {
        let now = now_ms();
        let child = match self.table.get_mut(&from) {
            Some(node) => match node.dir_mut().and_then(|entries| entries.remove(name)) {
                Some(child) => {
                    node.mtime = now;
                    node.ctime = now;
                    child
                }
                None => return,
            },
            None => return,
        };
        if let Some(node) = self.table.get_mut(&to) {
            if let Some(entries) = node.dir_mut() {
                entries.insert(new_name, child);
            }
            node.mtime = now;
            node.ctime = now;
        }
    }

    /// Tear the empty directory `dir` (named `name` under `parent`) out of
    /// the tree: `..` first, then `.`, then the parent's entry. The last
    /// removal brings `nlink` to zero and destroys the inode, unless a
    /// descriptor still holds it open.
    pub fn remove_dir(&mut self, parent: Ino, name: &str, dir: Ino) {
        self.delete_entry(dir, "..");
        self.delete_entry(dir, ".");
        self.delete_entry(parent, name);
    }

    /// Listing of `dir` in insertion order, without `.` and `..`.
    pub fn list(&self, dir: Ino) -> Option<Vec<String>> {
        Some(self.get(dir)?.dir()?.names())
    }
}

impl Default for InodeStore {
    fn default() -> InodeStore {
        InodeStore::new()
    }
}
