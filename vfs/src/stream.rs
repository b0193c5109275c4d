//! Chunked streaming over descriptors.
//!
//! [`ReadStream`] and [`WriteStream`] compose onto the positional
//! `read`/`write` of the descriptor layer and plug into the standard
//! [`io::Read`]/[`io::Write`] ecosystem. Each stream owns its descriptor
//! and closes it on drop, so a stream left mid-way never leaks an open
//! file.

use crate::error_fs::VfsError;
use crate::fs::FileSystem;
use std::io;
use virtualfs_api::fs::DescriptorSupport;
use virtualfs_api::types::{Fd, OpenFlags};

/// Byte range options of a [`ReadStream`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStreamOptions {
    /// First byte offset to read (default 0).
    pub start: Option<u64>,
    /// Last byte offset to read, inclusive (default: through the end).
    pub end: Option<u64>,
}

/// Chunked reader over the file at a path.
#[derive(Debug)]
pub struct ReadStream<'a> {
    fs: &'a mut FileSystem,
    fd: Fd,
    pos: u64,
    end: Option<u64>,
    closed: bool,
}

/// Chunked writer over the file at a path, created empty.
#[derive(Debug)]
pub struct WriteStream<'a> {
    fs: &'a mut FileSystem,
    fd: Fd,
    pos: u64,
    closed: bool,
}

impl FileSystem {
    /// Open a read stream over `path`, optionally bounded to a byte range.
    pub fn create_read_stream<'a>(
        &'a mut self,
        path: &str,
        opts: ReadStreamOptions,
    ) -> Result<ReadStream<'a>, VfsError> {
        let fd = self.open(path, OpenFlags::empty(), 0o666)?;
        Ok(ReadStream {
            fs: self,
            fd,
            pos: opts.start.unwrap_or(0),
            end: opts.end,
            closed: false,
        })
    }

    /// Open a write stream over `path`, creating the file and truncating
    /// any previous contents.
    pub fn create_write_stream<'a>(&'a mut self, path: &str) -> Result<WriteStream<'a>, VfsError> {
        let fd = self.open(
            path,
            OpenFlags::WRONLY | OpenFlags::CREAT | OpenFlags::TRUNC,
            0o666,
        )?;
        Ok(WriteStream {
            fs: self,
            fd,
            pos: 0,
            closed: false,
        })
    }
}

fn to_io(err: VfsError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

impl<'a> ReadStream<'a> {
    /// Close the underlying descriptor now, surfacing any error that a
    /// silent drop would swallow.
    pub fn close(mut self) -> Result<(), VfsError> {
        self.closed = true;
        self.fs.close(self.fd)
    }
}

impl<'a> io::Read for ReadStream<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut want = buf.len();
        if let Some(end) = self.end {
            if self.pos > end {
                return Ok(0);
            }
            want = want.min((end - self.pos + 1) as usize);
        }
        if want == 0 {
            return Ok(0);
        }
        let n = self
            .fs
            .read(self.fd, buf, 0, want, Some(self.pos as i64))
            .map_err(to_io)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<'a> Drop for ReadStream<'a> {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.fs.close(self.fd);
        }
    }
}

impl<'a> WriteStream<'a> {
    /// Close the underlying descriptor now, surfacing any error that a
    /// silent drop would swallow.
    pub fn close(mut self) -> Result<(), VfsError> {
        self.closed = true;
        self.fs.close(self.fd)
    }
}

impl<'a> io::Write for WriteStream<'a> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self
            .fs
            .write(self.fd, buf, Some(self.pos as i64))
            .map_err(to_io)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        // everything is already in memory
        Ok(())
    }
}

impl<'a> Drop for WriteStream<'a> {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.fs.close(self.fd);
        }
    }
}
