//! An in-memory, POSIX-like filesystem.
//!
//! Everything lives on the heap of the owning process: regular files,
//! directories and symbolic links, identified by densely allocated inode
//! numbers and reached either by `/`-separated path strings or through
//! small integer file descriptors. Nothing is persisted and nothing is
//! shared across threads; all operations are synchronous and atomic with
//! respect to each other.
//!
//! The crate implements the trait stack of
//! [`virtualfs_api`](../virtualfs_api/index.html). Start at
//! [`fs::FileSystem`](fs/struct.FileSystem.html) for the call surface, or
//! at the building blocks:
//!
//! * [`allocator`](allocator/index.html): lowest-free-integer allocation
//!   for inode and descriptor numbers
//! * [`inode`](inode/index.html): the inode store and its three variants
//! * [`path`](path/index.html): path resolution with symlink traversal
//! * [`fd`](fd/index.html): the descriptor table
//! * [`stream`](stream/index.html): chunked readers/writers over
//!   descriptors
//! * [`deferred`](deferred/index.html): the callback form of every
//!   operation

#![deny(missing_docs)]

pub mod allocator;
pub mod deferred;
pub mod error_fs;
pub mod fd;
pub mod fs;
pub mod inode;
pub mod path;
pub mod stream;
